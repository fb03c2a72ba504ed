// streak.rs — Current and best streaks from a habit's completion log.
//
// A streak is a run of consecutive calendar days whose entry is completed.
// A day without an entry breaks a run exactly like an incomplete entry.
// When a date has several entries the latest one (by `logged_at`, then by
// position in the input) wins.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::habit::HabitLog;

/// Streak lengths in days.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Streaks {
    /// Run ending on the most recent logged day (0 if that day is incomplete).
    pub current: u32,
    /// Longest run anywhere in the history.
    pub best: u32,
}

/// Collapse same-day duplicates, keeping the latest entry per date.
fn completion_by_date(logs: &[HabitLog]) -> BTreeMap<NaiveDate, bool> {
    let mut latest: BTreeMap<NaiveDate, &HabitLog> = BTreeMap::new();
    for log in logs {
        let replace = latest
            .get(&log.date)
            .map_or(true, |existing| existing.logged_at <= log.logged_at);
        if replace {
            latest.insert(log.date, log);
        }
    }
    latest
        .into_iter()
        .map(|(date, log)| (date, log.completed))
        .collect()
}

/// Compute streaks for one habit's log. The input may be in any order.
///
/// The current streak starts from the most recent day that has an entry and
/// walks backward while each previous calendar day is completed. The best
/// streak is the longest such run found scanning the whole history.
pub fn compute_streaks(logs: &[HabitLog]) -> Streaks {
    let days = completion_by_date(logs);

    let mut current = 0u32;
    let mut expected: Option<NaiveDate> = None;
    for (&date, &completed) in days.iter().rev() {
        if let Some(want) = expected {
            if date != want {
                break;
            }
        }
        if !completed {
            break;
        }
        current += 1;
        expected = date.pred_opt();
        if expected.is_none() {
            break;
        }
    }

    let mut best = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;
    for (&date, &completed) in &days {
        let consecutive = previous.and_then(|p| p.succ_opt()) == Some(date);
        run = match (completed, consecutive) {
            (false, _) => 0,
            (true, true) => run + 1,
            (true, false) => 1,
        };
        best = best.max(run);
        previous = Some(date);
    }

    tracing::debug!(entries = logs.len(), current, best, "computed streaks");
    Streaks { current, best }
}

/// Current streak as seen on `today`.
///
/// Unlike [`compute_streaks`], a run only counts if it reaches today or
/// yesterday: a habit not yet logged today keeps yesterday's streak, but a
/// run that ended earlier has lapsed.
pub fn current_streak_as_of(logs: &[HabitLog], today: NaiveDate) -> u32 {
    let days = completion_by_date(logs);
    let start = match days.get(&today) {
        Some(true) => Some(today),
        Some(false) => None,
        None => today.pred_opt(),
    };

    let mut count = 0u32;
    let mut cursor = start;
    while let Some(date) = cursor {
        if days.get(&date) != Some(&true) {
            break;
        }
        count += 1;
        cursor = date.pred_opt();
    }
    count
}

/// Streaks for each habit present in `logs`.
pub fn streaks_by_habit(logs: &[HabitLog]) -> HashMap<Uuid, Streaks> {
    let mut grouped: HashMap<Uuid, Vec<HabitLog>> = HashMap::new();
    for log in logs {
        grouped.entry(log.habit_id).or_default().push(log.clone());
    }
    grouped
        .into_iter()
        .map(|(habit_id, entries)| (habit_id, compute_streaks(&entries)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    fn t() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn entry(habit: Uuid, days_ago: i64, completed: bool) -> HabitLog {
        HabitLog {
            habit_id: habit,
            date: t() - Duration::days(days_ago),
            completed,
            logged_at: Utc::now(),
        }
    }

    fn run(habit: Uuid, from_days_ago: i64, len: i64) -> Vec<HabitLog> {
        (0..len)
            .map(|i| entry(habit, from_days_ago - i, true))
            .collect()
    }

    #[test]
    fn empty_log_has_no_streaks() {
        assert_eq!(compute_streaks(&[]), Streaks::default());
    }

    #[test]
    fn three_days_then_gap() {
        let h = Uuid::new_v4();
        // T, T-1, T-2 completed; nothing on T-3; older history before that.
        let mut logs = vec![entry(h, 0, true), entry(h, 2, true), entry(h, 1, true)];
        logs.push(entry(h, 4, true));
        logs.push(entry(h, 5, true));
        let streaks = compute_streaks(&logs);
        assert_eq!(streaks.current, 3);
        assert_eq!(streaks.best, 3);
    }

    #[test]
    fn explicit_incomplete_breaks_like_missing_day() {
        let h = Uuid::new_v4();
        let missing = vec![entry(h, 0, true), entry(h, 2, true)];
        let incomplete = vec![entry(h, 0, true), entry(h, 1, false), entry(h, 2, true)];
        assert_eq!(compute_streaks(&missing), compute_streaks(&incomplete));
        assert_eq!(compute_streaks(&incomplete).current, 1);
    }

    #[test]
    fn incomplete_latest_day_means_no_current_streak() {
        let h = Uuid::new_v4();
        let logs = vec![entry(h, 0, false), entry(h, 1, true), entry(h, 2, true)];
        let streaks = compute_streaks(&logs);
        assert_eq!(streaks.current, 0);
        assert_eq!(streaks.best, 2);
    }

    #[test]
    fn best_streak_ignores_recency() {
        let h = Uuid::new_v4();
        // Older run of 9, gap, recent run of 5.
        let mut logs = run(h, 20, 9);
        logs.extend(run(h, 4, 5));
        assert_eq!(compute_streaks(&logs).best, 9);
        assert_eq!(compute_streaks(&logs).current, 5);

        // Older run of 5, gap, recent run of 9.
        let mut logs = run(h, 20, 5);
        logs.extend(run(h, 8, 9));
        assert_eq!(compute_streaks(&logs).best, 9);
    }

    #[test]
    fn latest_entry_for_a_date_wins() {
        let h = Uuid::new_v4();
        let mut early = entry(h, 0, false);
        early.logged_at = Utc::now() - Duration::hours(3);
        let late = entry(h, 0, true);
        let logs = vec![late.clone(), early.clone(), entry(h, 1, true)];
        assert_eq!(compute_streaks(&logs).current, 2);

        // Same timestamp: the later position in the input wins.
        let mut undo = late.clone();
        undo.completed = false;
        assert_eq!(compute_streaks(&[late, undo]).current, 0);
    }

    #[test]
    fn as_of_today_tolerates_unlogged_today() {
        let h = Uuid::new_v4();
        let logs = run(h, 3, 3); // T-3, T-2, T-1
        assert_eq!(current_streak_as_of(&logs, t()), 3);
        assert_eq!(current_streak_as_of(&logs, t() + Duration::days(1)), 0);

        let mut with_today = logs.clone();
        with_today.push(entry(h, 0, true));
        assert_eq!(current_streak_as_of(&with_today, t()), 4);

        let mut failed_today = logs;
        failed_today.push(entry(h, 0, false));
        assert_eq!(current_streak_as_of(&failed_today, t()), 0);
    }

    #[test]
    fn streaks_are_grouped_per_habit() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut logs = run(a, 2, 3);
        logs.extend(run(b, 0, 1));
        let by_habit = streaks_by_habit(&logs);
        assert_eq!(by_habit[&a].best, 3);
        assert_eq!(by_habit[&b].best, 1);
    }

    proptest! {
        #[test]
        fn current_never_exceeds_best(
            pattern in proptest::collection::vec(any::<Option<bool>>(), 0..60)
        ) {
            let h = Uuid::new_v4();
            let logs: Vec<HabitLog> = pattern
                .iter()
                .enumerate()
                .filter_map(|(i, day)| day.map(|done| entry(h, i as i64, done)))
                .collect();
            let streaks = compute_streaks(&logs);
            prop_assert!(streaks.current <= streaks.best);
            prop_assert!(streaks.best as usize <= logs.len());
        }

        #[test]
        fn input_order_does_not_matter(
            pattern in proptest::collection::vec(any::<bool>(), 1..40)
        ) {
            let h = Uuid::new_v4();
            let logs: Vec<HabitLog> = pattern
                .iter()
                .enumerate()
                .map(|(i, &done)| entry(h, i as i64, done))
                .collect();
            let mut reversed = logs.clone();
            reversed.reverse();
            prop_assert_eq!(compute_streaks(&logs), compute_streaks(&reversed));
        }
    }
}
