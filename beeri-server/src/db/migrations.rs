//! Schema migrations
//!
//! Every statement is idempotent, so `run` is safe on every start.

use sqlx::PgPool;

use super::DbError;

/// Tables in dependency order (parents first). Backups restore in this order.
pub const TABLES: &[&str] = &[
    "committees",
    "events",
    "tags",
    "tasks",
    "task_tags",
    "protocols",
    "vendors",
    "tickets",
    "prom_events",
    "prom_vendor_quotes",
    "prom_votes",
    "prom_budget_items",
    "grocery_events",
    "grocery_items",
    "anonymous_feedback",
    "ideas",
    "highlights",
    "push_subscriptions",
    "push_notifications",
    "parent_skill_responses",
    "audit_log",
];

const SCHEMA: &[(&str, &str)] = &[
    (
        "committees",
        r#"
        CREATE TABLE IF NOT EXISTS committees (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            color TEXT,
            chair_name TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "events",
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            description TEXT,
            start_datetime TIMESTAMPTZ NOT NULL,
            end_datetime TIMESTAMPTZ,
            location TEXT,
            event_type TEXT NOT NULL DEFAULT 'general',
            status TEXT NOT NULL DEFAULT 'draft'
                CHECK (status IN ('draft', 'published', 'cancelled', 'completed')),
            visibility TEXT NOT NULL DEFAULT 'public'
                CHECK (visibility IN ('public', 'private')),
            committee_id UUID REFERENCES committees(id) ON DELETE SET NULL,
            budget_allocated DOUBLE PRECISION,
            budget_spent DOUBLE PRECISION NOT NULL DEFAULT 0,
            max_attendees INTEGER,
            registration_enabled BOOLEAN NOT NULL DEFAULT FALSE,
            edit_token TEXT UNIQUE,
            archived_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT events_end_after_start
                CHECK (end_datetime IS NULL OR end_datetime >= start_datetime)
        )
        "#,
    ),
    (
        "tags",
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL UNIQUE,
            color TEXT NOT NULL DEFAULT '#6366f1',
            emoji TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "tasks",
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'todo'
                CHECK (status IN ('todo', 'in_progress', 'blocked', 'done', 'cancelled')),
            priority TEXT NOT NULL DEFAULT 'normal'
                CHECK (priority IN ('low', 'normal', 'high', 'critical')),
            due_date DATE,
            owner_name TEXT,
            owner_phone TEXT,
            event_id UUID REFERENCES events(id) ON DELETE SET NULL,
            committee_id UUID REFERENCES committees(id) ON DELETE SET NULL,
            completed_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "task_tags",
        r#"
        CREATE TABLE IF NOT EXISTS task_tags (
            task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (task_id, tag_id)
        )
        "#,
    ),
    (
        "protocols",
        r#"
        CREATE TABLE IF NOT EXISTS protocols (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            protocol_date DATE NOT NULL,
            content TEXT,
            attendees TEXT[] NOT NULL DEFAULT '{}',
            decisions TEXT[] NOT NULL DEFAULT '{}',
            document_url TEXT,
            committee_id UUID REFERENCES committees(id) ON DELETE SET NULL,
            is_public BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "vendors",
        r#"
        CREATE TABLE IF NOT EXISTS vendors (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL,
            category TEXT,
            contact_name TEXT,
            phone TEXT,
            email TEXT,
            website TEXT,
            notes TEXT,
            rating SMALLINT CHECK (rating BETWEEN 1 AND 5),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "tickets",
        r#"
        CREATE TABLE IF NOT EXISTS tickets (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            description TEXT,
            event_date TIMESTAMPTZ,
            venue TEXT,
            price DOUBLE PRECISION,
            quantity_available INTEGER,
            purchase_url TEXT,
            image_url TEXT,
            status TEXT NOT NULL DEFAULT 'available'
                CHECK (status IN ('available', 'sold_out', 'archived')),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "prom_events",
        r#"
        CREATE TABLE IF NOT EXISTS prom_events (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            event_date DATE,
            venue TEXT,
            description TEXT,
            budget_total DOUBLE PRECISION,
            student_count INTEGER,
            status TEXT NOT NULL DEFAULT 'planning'
                CHECK (status IN ('planning', 'voting', 'booked', 'completed')),
            voting_enabled BOOLEAN NOT NULL DEFAULT FALSE,
            voting_ends_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "prom_vendor_quotes",
        r#"
        CREATE TABLE IF NOT EXISTS prom_vendor_quotes (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            prom_id UUID NOT NULL REFERENCES prom_events(id) ON DELETE CASCADE,
            vendor_id UUID REFERENCES vendors(id) ON DELETE SET NULL,
            category TEXT NOT NULL,
            vendor_name TEXT NOT NULL,
            price_total DOUBLE PRECISION,
            price_per_student DOUBLE PRECISION,
            description TEXT,
            contact_info TEXT,
            document_url TEXT,
            is_finalist BOOLEAN NOT NULL DEFAULT FALSE,
            is_selected BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "prom_votes",
        r#"
        CREATE TABLE IF NOT EXISTS prom_votes (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            prom_id UUID NOT NULL REFERENCES prom_events(id) ON DELETE CASCADE,
            quote_id UUID NOT NULL REFERENCES prom_vendor_quotes(id) ON DELETE CASCADE,
            voter_hash TEXT NOT NULL,
            rating SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
            comment TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT prom_votes_quote_voter_key UNIQUE (quote_id, voter_hash)
        )
        "#,
    ),
    (
        "prom_budget_items",
        r#"
        CREATE TABLE IF NOT EXISTS prom_budget_items (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            prom_id UUID NOT NULL REFERENCES prom_events(id) ON DELETE CASCADE,
            quote_id UUID REFERENCES prom_vendor_quotes(id) ON DELETE SET NULL,
            category TEXT NOT NULL,
            description TEXT,
            estimated_amount DOUBLE PRECISION NOT NULL DEFAULT 0,
            actual_amount DOUBLE PRECISION,
            is_paid BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "grocery_events",
        r#"
        CREATE TABLE IF NOT EXISTS grocery_events (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            event_name TEXT NOT NULL,
            event_date DATE,
            event_time TEXT,
            event_address TEXT,
            class_name TEXT,
            creator_name TEXT,
            notes TEXT,
            share_token TEXT UNIQUE,
            status TEXT NOT NULL DEFAULT 'active'
                CHECK (status IN ('active', 'completed', 'cancelled')),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "grocery_items",
        r#"
        CREATE TABLE IF NOT EXISTS grocery_items (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            grocery_event_id UUID NOT NULL REFERENCES grocery_events(id) ON DELETE CASCADE,
            item_name TEXT NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity > 0),
            notes TEXT,
            display_order INTEGER NOT NULL DEFAULT 0,
            claimed_by TEXT,
            claimed_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "anonymous_feedback",
        r#"
        CREATE TABLE IF NOT EXISTS anonymous_feedback (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            message TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'general',
            rating SMALLINT CHECK (rating BETWEEN 1 AND 5),
            status TEXT NOT NULL DEFAULT 'new'
                CHECK (status IN ('new', 'reviewed', 'archived')),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "ideas",
        r#"
        CREATE TABLE IF NOT EXISTS ideas (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            description TEXT,
            category TEXT,
            submitter_name TEXT,
            status TEXT NOT NULL DEFAULT 'new'
                CHECK (status IN ('new', 'under_review', 'approved', 'rejected', 'implemented')),
            admin_notes TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "highlights",
        r#"
        CREATE TABLE IF NOT EXISTS highlights (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            description TEXT,
            icon TEXT,
            category TEXT,
            event_date DATE,
            cta_text TEXT,
            cta_link TEXT,
            display_order INTEGER NOT NULL DEFAULT 0,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "push_subscriptions",
        r#"
        CREATE TABLE IF NOT EXISTS push_subscriptions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            endpoint TEXT NOT NULL UNIQUE,
            p256dh TEXT NOT NULL,
            auth TEXT NOT NULL,
            user_agent TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            last_used_at TIMESTAMPTZ
        )
        "#,
    ),
    (
        "push_notifications",
        r#"
        CREATE TABLE IF NOT EXISTS push_notifications (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            url TEXT,
            sent_count INTEGER NOT NULL DEFAULT 0,
            failed_count INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "parent_skill_responses",
        r#"
        CREATE TABLE IF NOT EXISTS parent_skill_responses (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            parent_name TEXT,
            child_name TEXT,
            phone TEXT,
            skills TEXT[] NOT NULL DEFAULT '{}',
            other_skill TEXT,
            preferred_contact TEXT NOT NULL DEFAULT 'whatsapp',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "audit_log",
        r#"
        CREATE TABLE IF NOT EXISTS audit_log (
            id BIGSERIAL PRIMARY KEY,
            table_name TEXT NOT NULL,
            row_id UUID,
            action TEXT NOT NULL,
            old_row JSONB,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
];

const AUDIT_FUNCTION: &str = r#"
    CREATE OR REPLACE FUNCTION audit_row_delete() RETURNS trigger AS $$
    BEGIN
        INSERT INTO audit_log (table_name, row_id, action, old_row)
        VALUES (TG_TABLE_NAME, OLD.id, 'delete', to_jsonb(OLD));
        RETURN OLD;
    END;
    $$ LANGUAGE plpgsql
"#;

/// Tables whose deletes are recorded in `audit_log`
pub const AUDITED_TABLES: &[&str] = &["tasks", "protocols", "vendors"];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_events_start ON events(start_datetime) WHERE archived_at IS NULL",
    "CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_due ON tasks(due_date) WHERE due_date IS NOT NULL",
    "CREATE INDEX IF NOT EXISTS idx_task_tags_tag ON task_tags(tag_id)",
    "CREATE INDEX IF NOT EXISTS idx_protocols_date ON protocols(protocol_date DESC)",
    "CREATE INDEX IF NOT EXISTS idx_quotes_prom ON prom_vendor_quotes(prom_id)",
    "CREATE INDEX IF NOT EXISTS idx_votes_prom ON prom_votes(prom_id)",
    "CREATE INDEX IF NOT EXISTS idx_budget_prom ON prom_budget_items(prom_id)",
    "CREATE INDEX IF NOT EXISTS idx_grocery_items_event ON grocery_items(grocery_event_id)",
    "CREATE INDEX IF NOT EXISTS idx_feedback_created ON anonymous_feedback(created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_notifications_created ON push_notifications(created_at DESC)",
];

/// Run all migrations
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running migrations...");

    for (table, ddl) in SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
        tracing::debug!(table, "table ready");
    }

    sqlx::query(AUDIT_FUNCTION).execute(pool).await?;
    for table in AUDITED_TABLES {
        let trigger = format!("audit_{table}_delete");
        sqlx::query(&format!("DROP TRIGGER IF EXISTS {trigger} ON {table}"))
            .execute(pool)
            .await?;
        sqlx::query(&format!(
            "CREATE TRIGGER {trigger} AFTER DELETE ON {table} \
             FOR EACH ROW EXECUTE FUNCTION audit_row_delete()"
        ))
        .execute(pool)
        .await?;
    }

    for index in INDEXES {
        sqlx::query(index).execute(pool).await?;
    }

    tracing::info!(tables = SCHEMA.len(), "Migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_schema_table_is_listed_for_backup() {
        let schema: Vec<&str> = SCHEMA.iter().map(|(t, _)| *t).collect();
        assert_eq!(schema, TABLES);
    }

    #[test]
    fn audited_tables_exist() {
        for table in AUDITED_TABLES {
            assert!(TABLES.contains(table), "{table}");
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn migrations_are_idempotent() {
        let pool = crate::db::test_pool().await;
        run(&pool).await.unwrap();
    }
}
