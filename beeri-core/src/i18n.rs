//! Hebrew/Russian message catalogue
//!
//! Hebrew is the default locale. Every user-facing string the API returns
//! goes through [`Message::text`] or [`FieldRule::text`].

use std::fmt;

/// Supported UI locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    He,
    Ru,
}

impl Locale {
    /// Parse a locale tag such as `he`, `ru-RU` or `he-IL`.
    pub fn parse(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "he" | "iw" => Some(Self::He),
            "ru" => Some(Self::Ru),
            _ => None,
        }
    }

    /// Pick a locale from an explicit cookie value, falling back to the
    /// first supported entry of an `Accept-Language` header.
    pub fn negotiate(cookie: Option<&str>, accept_language: Option<&str>) -> Self {
        if let Some(locale) = cookie.and_then(Self::parse) {
            return locale;
        }

        let Some(header) = accept_language else {
            return Self::default();
        };

        let mut ranked: Vec<(f32, Self)> = header
            .split(',')
            .filter_map(|entry| {
                let mut parts = entry.split(';');
                let locale = Self::parse(parts.next()?)?;
                let quality = parts
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                Some((quality, locale))
            })
            .collect();

        // stable sort keeps header order for equal weights
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        ranked.first().map(|(_, l)| *l).unwrap_or_default()
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::He => "he",
            Self::Ru => "ru",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Domain resources named in messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Event,
    Task,
    Tag,
    Protocol,
    Committee,
    Vendor,
    Ticket,
    PromEvent,
    PromQuote,
    PromBudgetItem,
    GroceryList,
    GroceryItem,
    Feedback,
    Idea,
    Highlight,
    Subscription,
    Notification,
    SkillResponse,
}

impl Resource {
    /// Stable identifier for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Task => "task",
            Self::Tag => "tag",
            Self::Protocol => "protocol",
            Self::Committee => "committee",
            Self::Vendor => "vendor",
            Self::Ticket => "ticket",
            Self::PromEvent => "prom_event",
            Self::PromQuote => "prom_quote",
            Self::PromBudgetItem => "prom_budget_item",
            Self::GroceryList => "grocery_list",
            Self::GroceryItem => "grocery_item",
            Self::Feedback => "feedback",
            Self::Idea => "idea",
            Self::Highlight => "highlight",
            Self::Subscription => "push_subscription",
            Self::Notification => "notification",
            Self::SkillResponse => "skill_response",
        }
    }

    fn noun(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::Event, Locale::He) => "האירוע",
            (Self::Event, Locale::Ru) => "Мероприятие",
            (Self::Task, Locale::He) => "המשימה",
            (Self::Task, Locale::Ru) => "Задача",
            (Self::Tag, Locale::He) => "התגית",
            (Self::Tag, Locale::Ru) => "Тег",
            (Self::Protocol, Locale::He) => "הפרוטוקול",
            (Self::Protocol, Locale::Ru) => "Протокол",
            (Self::Committee, Locale::He) => "הוועדה",
            (Self::Committee, Locale::Ru) => "Комитет",
            (Self::Vendor, Locale::He) => "הספק",
            (Self::Vendor, Locale::Ru) => "Поставщик",
            (Self::Ticket, Locale::He) => "הכרטיס",
            (Self::Ticket, Locale::Ru) => "Билет",
            (Self::PromEvent, Locale::He) => "אירוע הסיום",
            (Self::PromEvent, Locale::Ru) => "Выпускной",
            (Self::PromQuote, Locale::He) => "הצעת המחיר",
            (Self::PromQuote, Locale::Ru) => "Коммерческое предложение",
            (Self::PromBudgetItem, Locale::He) => "סעיף התקציב",
            (Self::PromBudgetItem, Locale::Ru) => "Статья бюджета",
            (Self::GroceryList, Locale::He) => "רשימת הקניות",
            (Self::GroceryList, Locale::Ru) => "Список покупок",
            (Self::GroceryItem, Locale::He) => "הפריט",
            (Self::GroceryItem, Locale::Ru) => "Товар",
            (Self::Feedback, Locale::He) => "המשוב",
            (Self::Feedback, Locale::Ru) => "Отзыв",
            (Self::Idea, Locale::He) => "הרעיון",
            (Self::Idea, Locale::Ru) => "Идея",
            (Self::Highlight, Locale::He) => "ההדגשה",
            (Self::Highlight, Locale::Ru) => "Объявление",
            (Self::Subscription, Locale::He) => "המינוי להתראות",
            (Self::Subscription, Locale::Ru) => "Подписка на уведомления",
            (Self::Notification, Locale::He) => "ההתראה",
            (Self::Notification, Locale::Ru) => "Уведомление",
            (Self::SkillResponse, Locale::He) => "תשובת הסקר",
            (Self::SkillResponse, Locale::Ru) => "Ответ на опрос",
        }
    }
}

/// User-facing API messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Unauthorized,
    InvalidCredentials,
    LoggedOut,
    NotFound(Resource),
    DuplicateName(Resource),
    ValidationFailed,
    InvalidJson,
    InvalidPathParameter,
    InternalError,
    ItemAlreadyClaimed,
    ItemNotClaimed,
    ClaimExceedsAvailable,
    ListNotActive,
    VotingClosed,
    QuoteNotFinalist,
    AssistantUnavailable,
    UpstreamFailed,
    MissingFile,
    FileTooLarge,
    UnsupportedFileType,
    PushNotConfigured,
}

impl Message {
    pub fn text(&self, locale: Locale) -> String {
        match locale {
            Locale::He => self.hebrew(),
            Locale::Ru => self.russian(),
        }
    }

    fn hebrew(&self) -> String {
        match self {
            Self::Unauthorized => "נדרשת התחברות כמנהל".into(),
            Self::InvalidCredentials => "סיסמה שגויה".into(),
            Self::LoggedOut => "התנתקת בהצלחה".into(),
            Self::NotFound(r) => format!("{} לא נמצא", r.noun(Locale::He)),
            Self::DuplicateName(Resource::Tag) => "תגית עם שם זה כבר קיימת".into(),
            Self::DuplicateName(Resource::Committee) => "ועדה עם שם זה כבר קיימת".into(),
            Self::DuplicateName(r) => format!("{} עם שם זה כבר קיים", r.noun(Locale::He)),
            Self::ValidationFailed => "הנתונים שנשלחו אינם תקינים".into(),
            Self::InvalidJson => "גוף הבקשה אינו JSON תקין".into(),
            Self::InvalidPathParameter => "מזהה לא תקין בכתובת".into(),
            Self::InternalError => "אירעה שגיאה בשרת, נסו שוב מאוחר יותר".into(),
            Self::ItemAlreadyClaimed => "מישהו כבר לקח את הפריט הזה".into(),
            Self::ItemNotClaimed => "הפריט לא נלקח על ידי אף אחד".into(),
            Self::ClaimExceedsAvailable => "הכמות המבוקשת גדולה מהכמות הזמינה".into(),
            Self::ListNotActive => "רשימת הקניות אינה פעילה".into(),
            Self::VotingClosed => "ההצבעה סגורה".into(),
            Self::QuoteNotFinalist => "ניתן להצביע רק על הצעות שעלו לשלב הגמר".into(),
            Self::AssistantUnavailable => "העוזר החכם אינו זמין כרגע".into(),
            Self::UpstreamFailed => "שירות חיצוני לא הגיב כמצופה".into(),
            Self::MissingFile => "לא נבחר קובץ להעלאה".into(),
            Self::FileTooLarge => "הקובץ גדול מדי".into(),
            Self::UnsupportedFileType => "סוג הקובץ אינו נתמך".into(),
            Self::PushNotConfigured => "שליחת התראות אינה מוגדרת בשרת".into(),
        }
    }

    fn russian(&self) -> String {
        match self {
            Self::Unauthorized => "Требуется вход администратора".into(),
            Self::InvalidCredentials => "Неверный пароль".into(),
            Self::LoggedOut => "Вы вышли из системы".into(),
            Self::NotFound(r) => format!("{}: не найдено", r.noun(Locale::Ru)),
            Self::DuplicateName(r) => {
                format!("{}: запись с таким названием уже существует", r.noun(Locale::Ru))
            }
            Self::ValidationFailed => "Некорректные данные".into(),
            Self::InvalidJson => "Тело запроса не является корректным JSON".into(),
            Self::InvalidPathParameter => "Некорректный идентификатор в адресе".into(),
            Self::InternalError => "Ошибка сервера, попробуйте позже".into(),
            Self::ItemAlreadyClaimed => "Этот товар уже кто-то взял".into(),
            Self::ItemNotClaimed => "Этот товар никто не брал".into(),
            Self::ClaimExceedsAvailable => "Запрошенное количество больше доступного".into(),
            Self::ListNotActive => "Список покупок неактивен".into(),
            Self::VotingClosed => "Голосование закрыто".into(),
            Self::QuoteNotFinalist => "Голосовать можно только за предложения-финалисты".into(),
            Self::AssistantUnavailable => "Ассистент сейчас недоступен".into(),
            Self::UpstreamFailed => "Внешний сервис ответил с ошибкой".into(),
            Self::MissingFile => "Файл для загрузки не выбран".into(),
            Self::FileTooLarge => "Файл слишком большой".into(),
            Self::UnsupportedFileType => "Тип файла не поддерживается".into(),
            Self::PushNotConfigured => "Отправка уведомлений не настроена".into(),
        }
    }
}

/// Per-field validation rules, rendered as `field: message`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    Required,
    TooLong { max: usize },
    InvalidFormat,
    NotAllowed { value: String },
    OutOfRange { min: i64, max: i64 },
    EndsBeforeStart,
}

impl FieldRule {
    pub fn text(&self, locale: Locale) -> String {
        match (self, locale) {
            (Self::Required, Locale::He) => "שדה חובה".into(),
            (Self::Required, Locale::Ru) => "обязательное поле".into(),
            (Self::TooLong { max }, Locale::He) => format!("ארוך מדי (עד {max} תווים)"),
            (Self::TooLong { max }, Locale::Ru) => format!("слишком длинно (до {max} символов)"),
            (Self::InvalidFormat, Locale::He) => "פורמט לא תקין".into(),
            (Self::InvalidFormat, Locale::Ru) => "неверный формат".into(),
            (Self::NotAllowed { value }, Locale::He) => format!("ערך לא מוכר: '{value}'"),
            (Self::NotAllowed { value }, Locale::Ru) => format!("недопустимое значение: '{value}'"),
            (Self::OutOfRange { min, max }, Locale::He) => format!("חייב להיות בין {min} ל-{max}"),
            (Self::OutOfRange { min, max }, Locale::Ru) => format!("должно быть от {min} до {max}"),
            (Self::EndsBeforeStart, Locale::He) => "מועד הסיום לפני מועד ההתחלה".into(),
            (Self::EndsBeforeStart, Locale::Ru) => "окончание раньше начала".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_locale_tags() {
        assert_eq!(Locale::parse("he"), Some(Locale::He));
        assert_eq!(Locale::parse("he-IL"), Some(Locale::He));
        assert_eq!(Locale::parse("ru_RU"), Some(Locale::Ru));
        assert_eq!(Locale::parse("en-US"), None);
    }

    #[test]
    fn cookie_wins_over_header() {
        assert_eq!(Locale::negotiate(Some("ru"), Some("he-IL")), Locale::Ru);
    }

    #[test]
    fn header_quality_ordering() {
        let header = "en-US,en;q=0.9,he;q=0.5,ru;q=0.8";
        assert_eq!(Locale::negotiate(None, Some(header)), Locale::Ru);
    }

    #[test]
    fn unsupported_falls_back_to_hebrew() {
        assert_eq!(Locale::negotiate(None, Some("fr-FR,en")), Locale::He);
        assert_eq!(Locale::negotiate(Some("xx"), None), Locale::He);
        assert_eq!(Locale::negotiate(None, None), Locale::He);
    }

    #[test]
    fn duplicate_tag_message() {
        let msg = Message::DuplicateName(Resource::Tag);
        assert_eq!(msg.text(Locale::He), "תגית עם שם זה כבר קיימת");
        assert!(msg.text(Locale::Ru).contains("уже существует"));
    }

    #[test]
    fn not_found_names_resource() {
        let msg = Message::NotFound(Resource::Event);
        assert!(msg.text(Locale::He).starts_with("האירוע"));
        assert!(msg.text(Locale::Ru).starts_with("Мероприятие"));
    }

    #[test]
    fn field_rules_render() {
        assert_eq!(FieldRule::TooLong { max: 50 }.text(Locale::He), "ארוך מדי (עד 50 תווים)");
        assert_eq!(
            FieldRule::OutOfRange { min: 1, max: 5 }.text(Locale::Ru),
            "должно быть от 1 до 5"
        );
    }
}
