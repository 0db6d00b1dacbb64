//! Vote statistics and budget totals for a prom event
//!
//! Both are computed in memory from the fetched rows in a single pass.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Quote fields needed for tallying
#[derive(Debug, Clone, FromRow)]
pub struct QuoteInfo {
    pub id: Uuid,
    pub category: String,
    pub vendor_name: String,
    pub is_finalist: bool,
}

/// One stored vote
#[derive(Debug, Clone, FromRow)]
pub struct VoteSample {
    pub quote_id: Uuid,
    pub voter_hash: String,
    pub rating: i16,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuoteTally {
    pub quote_id: Uuid,
    pub category: String,
    pub vendor_name: String,
    pub vote_count: u32,
    pub average_rating: Option<f64>,
    /// Counts for ratings 1..=5
    pub histogram: [u32; 5],
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteStats {
    pub total_votes: u32,
    pub unique_voters: u32,
    pub quotes: Vec<QuoteTally>,
    /// Best quote per category: highest average, ties broken by vote count
    pub leaders: BTreeMap<String, Uuid>,
}

pub fn compute_vote_stats(quotes: &[QuoteInfo], votes: &[VoteSample]) -> VoteStats {
    let mut sums: HashMap<Uuid, (u32, i64, [u32; 5])> = HashMap::new();
    let mut voters: HashSet<&str> = HashSet::new();
    let mut total_votes = 0u32;

    for vote in votes {
        if !(1..=5).contains(&vote.rating) {
            continue;
        }
        let entry = sums.entry(vote.quote_id).or_insert((0, 0, [0; 5]));
        entry.0 += 1;
        entry.1 += i64::from(vote.rating);
        entry.2[(vote.rating - 1) as usize] += 1;
        voters.insert(vote.voter_hash.as_str());
        total_votes += 1;
    }

    let mut tallies: Vec<QuoteTally> = quotes
        .iter()
        .filter(|q| q.is_finalist || sums.contains_key(&q.id))
        .map(|q| {
            let (count, sum, histogram) = sums.get(&q.id).copied().unwrap_or((0, 0, [0; 5]));
            QuoteTally {
                quote_id: q.id,
                category: q.category.clone(),
                vendor_name: q.vendor_name.clone(),
                vote_count: count,
                average_rating: (count > 0).then(|| round2(sum as f64 / f64::from(count))),
                histogram,
            }
        })
        .collect();

    tallies.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| rank(b).partial_cmp(&rank(a)).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut leaders = BTreeMap::new();
    for tally in tallies.iter().filter(|t| t.vote_count > 0) {
        // sorted best-first within each category
        leaders.entry(tally.category.clone()).or_insert(tally.quote_id);
    }

    VoteStats {
        total_votes,
        unique_voters: voters.len() as u32,
        quotes: tallies,
        leaders,
    }
}

fn rank(t: &QuoteTally) -> (f64, u32) {
    (t.average_rating.unwrap_or(0.0), t.vote_count)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Budget line fields needed for totals
#[derive(Debug, Clone, FromRow)]
pub struct BudgetLine {
    pub category: String,
    pub estimated_amount: f64,
    pub actual_amount: Option<f64>,
    pub is_paid: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub estimated: f64,
    pub committed: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BudgetSummary {
    pub budget_total: Option<f64>,
    pub estimated_total: f64,
    /// Actual amount where known, estimate otherwise
    pub committed_total: f64,
    pub paid_total: f64,
    pub remaining: Option<f64>,
    pub over_budget: bool,
    pub cost_per_student: Option<f64>,
    pub by_category: Vec<CategoryTotal>,
}

pub fn summarize_budget(
    budget_total: Option<f64>,
    student_count: Option<i32>,
    lines: &[BudgetLine],
) -> BudgetSummary {
    let mut estimated_total = 0.0;
    let mut committed_total = 0.0;
    let mut paid_total = 0.0;
    let mut categories: BTreeMap<&str, (f64, f64)> = BTreeMap::new();

    for line in lines {
        let committed = line.actual_amount.unwrap_or(line.estimated_amount);
        estimated_total += line.estimated_amount;
        committed_total += committed;
        if line.is_paid {
            paid_total += committed;
        }
        let entry = categories.entry(line.category.as_str()).or_insert((0.0, 0.0));
        entry.0 += line.estimated_amount;
        entry.1 += committed;
    }

    let remaining = budget_total.map(|total| round2(total - committed_total));
    let cost_per_student = student_count
        .filter(|n| *n > 0)
        .map(|n| round2(committed_total / f64::from(n)));

    BudgetSummary {
        budget_total,
        estimated_total: round2(estimated_total),
        committed_total: round2(committed_total),
        paid_total: round2(paid_total),
        remaining,
        over_budget: remaining.is_some_and(|r| r < 0.0),
        cost_per_student,
        by_category: categories
            .into_iter()
            .map(|(category, (estimated, committed))| CategoryTotal {
                category: category.to_string(),
                estimated: round2(estimated),
                committed: round2(committed),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(category: &str, name: &str, finalist: bool) -> QuoteInfo {
        QuoteInfo {
            id: Uuid::new_v4(),
            category: category.into(),
            vendor_name: name.into(),
            is_finalist: finalist,
        }
    }

    fn vote(quote: &QuoteInfo, voter: &str, rating: i16) -> VoteSample {
        VoteSample {
            quote_id: quote.id,
            voter_hash: voter.into(),
            rating,
        }
    }

    #[test]
    fn tallies_and_leaders() {
        let dj_a = quote("dj", "DJ A", true);
        let dj_b = quote("dj", "DJ B", true);
        let hall = quote("venue", "אולם", true);
        let votes = vec![
            vote(&dj_a, "v1", 5),
            vote(&dj_a, "v2", 4),
            vote(&dj_b, "v1", 3),
            vote(&hall, "v3", 2),
        ];

        let stats = compute_vote_stats(&[dj_a.clone(), dj_b.clone(), hall.clone()], &votes);
        assert_eq!(stats.total_votes, 4);
        assert_eq!(stats.unique_voters, 3);
        assert_eq!(stats.leaders["dj"], dj_a.id);
        assert_eq!(stats.leaders["venue"], hall.id);

        let a = stats.quotes.iter().find(|t| t.quote_id == dj_a.id).unwrap();
        assert_eq!(a.vote_count, 2);
        assert_eq!(a.average_rating, Some(4.5));
        assert_eq!(a.histogram, [0, 0, 0, 1, 1]);
    }

    #[test]
    fn finalists_without_votes_are_listed() {
        let q = quote("photo", "צלם", true);
        let not_finalist = quote("photo", "צלם 2", false);
        let stats = compute_vote_stats(&[q.clone(), not_finalist], &[]);
        assert_eq!(stats.quotes.len(), 1);
        assert_eq!(stats.quotes[0].average_rating, None);
        assert!(stats.leaders.is_empty());
    }

    #[test]
    fn tie_on_average_broken_by_count() {
        let a = quote("dj", "A", true);
        let b = quote("dj", "B", true);
        let votes = vec![vote(&a, "v1", 4), vote(&b, "v2", 4), vote(&b, "v3", 4)];
        let stats = compute_vote_stats(&[a, b.clone()], &votes);
        assert_eq!(stats.leaders["dj"], b.id);
    }

    #[test]
    fn budget_summary_uses_actual_when_known() {
        let lines = vec![
            BudgetLine {
                category: "venue".into(),
                estimated_amount: 10_000.0,
                actual_amount: Some(12_000.0),
                is_paid: true,
            },
            BudgetLine {
                category: "dj".into(),
                estimated_amount: 3_000.0,
                actual_amount: None,
                is_paid: false,
            },
        ];
        let summary = summarize_budget(Some(14_000.0), Some(100), &lines);
        assert_eq!(summary.estimated_total, 13_000.0);
        assert_eq!(summary.committed_total, 15_000.0);
        assert_eq!(summary.paid_total, 12_000.0);
        assert_eq!(summary.remaining, Some(-1_000.0));
        assert!(summary.over_budget);
        assert_eq!(summary.cost_per_student, Some(150.0));
        assert_eq!(summary.by_category[0].category, "dj");
    }

    #[test]
    fn budget_without_total() {
        let summary = summarize_budget(None, None, &[]);
        assert_eq!(summary.remaining, None);
        assert!(!summary.over_budget);
        assert_eq!(summary.cost_per_student, None);
    }
}
