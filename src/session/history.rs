use crate::session::result::StoredResult;

/// How a stored result compares with the student's earlier attempts at the
/// same subject.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryComparison {
    /// Earlier attempts considered, excluding the current one.
    pub attempts: usize,
    pub best_score: Option<f64>,
    pub average_score: Option<f64>,
    pub previous_score: Option<f64>,
}

impl HistoryComparison {
    pub fn compute(current: &StoredResult, history: &[StoredResult]) -> Self {
        let mut earlier: Vec<&StoredResult> = history
            .iter()
            .filter(|r| r.id != current.id)
            .filter(|r| r.result.subject_id == current.result.subject_id)
            .filter(|r| r.created_at < current.created_at)
            .collect();
        earlier.sort_by_key(|r| r.created_at);

        let scores: Vec<f64> = earlier.iter().map(|r| r.result.score_percent).collect();
        let best_score = scores.iter().copied().reduce(f64::max);
        let average_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };

        Self {
            attempts: earlier.len(),
            best_score,
            average_score,
            previous_score: scores.last().copied(),
        }
    }

    /// Change versus the most recent earlier attempt, in percentage points.
    pub fn delta_from_previous(&self, current_score: f64) -> Option<f64> {
        self.previous_score.map(|prev| current_score - prev)
    }

    pub fn is_personal_best(&self, current_score: f64) -> bool {
        self.best_score.is_none_or(|best| current_score > best)
    }
}

/// Newest first, as shown on the history screen.
pub fn sort_newest_first(results: &mut [StoredResult]) {
    results.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::session::question::Difficulty;
    use crate::session::result::TestResult;

    fn stored(id: u64, subject_id: u32, score: f64, minutes: i64) -> StoredResult {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes);
        StoredResult {
            id,
            created_at: at,
            result: TestResult {
                student_id: 1,
                subject_id,
                difficulty: Difficulty::Beginner,
                correct_count: 0,
                total_count: 5,
                score_percent: score,
                time_spent_secs: 60,
                created_at: at,
            },
        }
    }

    #[test]
    fn test_first_attempt_has_nothing_to_compare() {
        let current = stored(1, 1, 60.0, 0);
        let cmp = HistoryComparison::compute(&current, std::slice::from_ref(&current));
        assert_eq!(cmp.attempts, 0);
        assert_eq!(cmp.best_score, None);
        assert_eq!(cmp.delta_from_previous(60.0), None);
        assert!(cmp.is_personal_best(60.0));
    }

    #[test]
    fn test_compares_only_same_subject_earlier_attempts() {
        let history = vec![
            stored(1, 1, 40.0, 0),
            stored(2, 2, 100.0, 5),
            stored(3, 1, 80.0, 10),
            stored(5, 1, 20.0, 30),
        ];
        let current = stored(4, 1, 60.0, 20);
        let cmp = HistoryComparison::compute(&current, &history);
        assert_eq!(cmp.attempts, 2);
        assert_eq!(cmp.best_score, Some(80.0));
        assert_eq!(cmp.average_score, Some(60.0));
        assert_eq!(cmp.previous_score, Some(80.0));
        assert_eq!(cmp.delta_from_previous(60.0), Some(-20.0));
        assert!(!cmp.is_personal_best(60.0));
    }

    #[test]
    fn test_same_timestamp_is_not_an_earlier_attempt() {
        let history = vec![stored(1, 1, 40.0, 0), stored(2, 1, 90.0, 10)];
        let current = stored(3, 1, 70.0, 10);
        let cmp = HistoryComparison::compute(&current, &history);
        assert_eq!(cmp.attempts, 1);
        assert_eq!(cmp.best_score, Some(40.0));
        assert_eq!(cmp.previous_score, Some(40.0));
        assert!(cmp.is_personal_best(70.0));
    }

    #[test]
    fn test_sort_newest_first() {
        let mut results = vec![stored(1, 1, 0.0, 0), stored(2, 1, 0.0, 10), stored(3, 1, 0.0, 5)];
        sort_newest_first(&mut results);
        let ids: Vec<u64> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
