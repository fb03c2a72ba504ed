// achievement.rs — Achievement unlocks from progress metrics.
//
// Each achievement type has a fixed threshold on one metric. Evaluation is a
// pure function of the current metrics and the set already unlocked, so it
// can be re-run after every habit log or goal update without emitting the
// same unlock twice.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HabitError;
use crate::habit::{Habit, HabitLog};

/// The metric an achievement threshold is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    BestStreak,
    ActiveHabits,
    Goals,
    CompletedGoals,
}

/// Every achievement a user can unlock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AchievementType {
    #[serde(rename = "first_habit")]
    FirstHabit,
    #[serde(rename = "habit_builder")]
    HabitBuilder,
    #[serde(rename = "streak_7")]
    Streak7,
    #[serde(rename = "streak_30")]
    Streak30,
    #[serde(rename = "streak_100")]
    Streak100,
    #[serde(rename = "first_goal")]
    FirstGoal,
    #[serde(rename = "goal_setter")]
    GoalSetter,
    #[serde(rename = "first_goal_completed")]
    FirstGoalCompleted,
    #[serde(rename = "goal_crusher")]
    GoalCrusher,
}

impl AchievementType {
    /// Evaluation order; also the order results are reported in.
    pub const ALL: [AchievementType; 9] = [
        AchievementType::FirstHabit,
        AchievementType::HabitBuilder,
        AchievementType::Streak7,
        AchievementType::Streak30,
        AchievementType::Streak100,
        AchievementType::FirstGoal,
        AchievementType::GoalSetter,
        AchievementType::FirstGoalCompleted,
        AchievementType::GoalCrusher,
    ];

    pub fn metric(self) -> Metric {
        match self {
            AchievementType::FirstHabit | AchievementType::HabitBuilder => Metric::ActiveHabits,
            AchievementType::Streak7 | AchievementType::Streak30 | AchievementType::Streak100 => {
                Metric::BestStreak
            }
            AchievementType::FirstGoal | AchievementType::GoalSetter => Metric::Goals,
            AchievementType::FirstGoalCompleted | AchievementType::GoalCrusher => {
                Metric::CompletedGoals
            }
        }
    }

    pub fn threshold(self) -> u32 {
        match self {
            AchievementType::FirstHabit => 1,
            AchievementType::HabitBuilder => 5,
            AchievementType::Streak7 => 7,
            AchievementType::Streak30 => 30,
            AchievementType::Streak100 => 100,
            AchievementType::FirstGoal => 1,
            AchievementType::GoalSetter => 5,
            AchievementType::FirstGoalCompleted => 1,
            AchievementType::GoalCrusher => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AchievementType::FirstHabit => "first_habit",
            AchievementType::HabitBuilder => "habit_builder",
            AchievementType::Streak7 => "streak_7",
            AchievementType::Streak30 => "streak_30",
            AchievementType::Streak100 => "streak_100",
            AchievementType::FirstGoal => "first_goal",
            AchievementType::GoalSetter => "goal_setter",
            AchievementType::FirstGoalCompleted => "first_goal_completed",
            AchievementType::GoalCrusher => "goal_crusher",
        }
    }
}

impl fmt::Display for AchievementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AchievementType {
    type Err = HabitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AchievementType::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| HabitError::UnknownAchievement(s.to_string()))
    }
}

/// A user's progress metrics at evaluation time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AchievementMetrics {
    /// Longest streak of any single habit.
    #[serde(default)]
    pub best_streak: u32,
    #[serde(default)]
    pub active_habits: u32,
    #[serde(default)]
    pub goal_count: u32,
    #[serde(default)]
    pub completed_goal_count: u32,
}

impl AchievementMetrics {
    /// Derive habit metrics from a user's habits and logs.
    ///
    /// `best_streak` is the largest per-habit best streak. Streaks are never
    /// merged across habits, and archived habits still count towards it.
    pub fn from_habits(
        habits: &[Habit],
        logs: &[HabitLog],
        goal_count: u32,
        completed_goal_count: u32,
    ) -> Self {
        let best_streak = habits
            .iter()
            .map(|habit| habit.streaks(logs).best)
            .max()
            .unwrap_or(0);
        let active_habits = habits.iter().filter(|h| h.active).count() as u32;
        Self {
            best_streak,
            active_habits,
            goal_count,
            completed_goal_count,
        }
    }

    pub fn value(&self, metric: Metric) -> u32 {
        match metric {
            Metric::BestStreak => self.best_streak,
            Metric::ActiveHabits => self.active_habits,
            Metric::Goals => self.goal_count,
            Metric::CompletedGoals => self.completed_goal_count,
        }
    }
}

/// An immutable unlock record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Achievement {
    pub user_id: Uuid,
    pub achievement_type: AchievementType,
    pub unlocked_at: DateTime<Utc>,
}

/// Achievement types whose threshold `metrics` meets and that are not in
/// `already_unlocked`, in [`AchievementType::ALL`] order.
pub fn evaluate_achievements(
    metrics: &AchievementMetrics,
    already_unlocked: &[AchievementType],
) -> Vec<AchievementType> {
    let unlocked: HashSet<AchievementType> = already_unlocked.iter().copied().collect();
    AchievementType::ALL
        .into_iter()
        .filter(|a| !unlocked.contains(a))
        .filter(|a| metrics.value(a.metric()) >= a.threshold())
        .collect()
}

/// Build unlock records for everything newly earned by `user_id`.
pub fn unlock(
    user_id: Uuid,
    metrics: &AchievementMetrics,
    existing: &[Achievement],
) -> Vec<Achievement> {
    let already: Vec<AchievementType> = existing
        .iter()
        .filter(|a| a.user_id == user_id)
        .map(|a| a.achievement_type)
        .collect();
    let now = Utc::now();
    let fresh: Vec<Achievement> = evaluate_achievements(metrics, &already)
        .into_iter()
        .map(|achievement_type| Achievement {
            user_id,
            achievement_type,
            unlocked_at: now,
        })
        .collect();
    for a in &fresh {
        tracing::info!(user_id = %user_id, achievement = %a.achievement_type, "achievement unlocked");
    }
    fresh
}
