//! Mutable record of one user's task completion for a single numbered day.
//!
//! Each task slot is an independently-settable sub-record carrying a `done`
//! flag, task-specific payload, and a logged-at timestamp. Day logs are
//! created lazily, never deleted, and keep their day number forever: a reset
//! opens a new attempt with a fresh Day 1 rather than rewriting history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One workout slot (outdoor or indoor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutLog {
    pub done: bool,
    pub description: Option<String>,
    pub duration_mins: Option<u32>,
    /// Burned calories feed the deficit budget when present.
    pub calories_burned: Option<u32>,
    pub photo_id: Option<String>,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingLog {
    pub done: bool,
    pub pages: u32,
    pub book: String,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterLog {
    pub done: bool,
    pub amount_oz: u32,
    pub logged_at: DateTime<Utc>,
}

/// Aggregate diet totals, always recomputed from the full meal list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietTotals {
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressPicLog {
    pub done: bool,
    pub file_id: Option<String>,
    pub logged_at: DateTime<Utc>,
}

/// One logged meal. Append-only; the only corrections are tail delete,
/// tail replace, and full clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub description: String,
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
    pub logged_at: DateTime<Utc>,
}

/// The day log itself, one per (user, attempt, day number).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayLog {
    pub id: i64,
    pub user_id: i64,
    /// Which run at the challenge this belongs to; bumped on every reset.
    pub attempt: u32,
    pub day_number: u32,
    /// Calendar date the log was opened, in the user's timezone.
    pub date: NaiveDate,
    pub outdoor_workout: Option<WorkoutLog>,
    pub indoor_workout: Option<WorkoutLog>,
    pub reading: Option<ReadingLog>,
    pub water: Option<WaterLog>,
    pub diet: Option<DietTotals>,
    pub diet_confirmed: bool,
    pub progress_pic: Option<ProgressPicLog>,
    pub meals: Vec<Meal>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DayLog {
    /// Total calories burned across both workouts.
    pub fn workout_burn(&self) -> u32 {
        let outdoor = self
            .outdoor_workout
            .as_ref()
            .and_then(|w| w.calories_burned)
            .unwrap_or(0);
        let indoor = self
            .indoor_workout
            .as_ref()
            .and_then(|w| w.calories_burned)
            .unwrap_or(0);
        outdoor.saturating_add(indoor)
    }

    /// Calories consumed so far today.
    pub fn calories_consumed(&self) -> u32 {
        self.diet.as_ref().map(|d| d.calories).unwrap_or(0)
    }

    /// Ounces of water logged so far today.
    pub fn water_oz(&self) -> u32 {
        self.water.as_ref().map(|w| w.amount_oz).unwrap_or(0)
    }
}

/// Recompute aggregate totals from the full meal list. Summing the list each
/// time keeps the aggregate from drifting after tail edits.
pub fn diet_totals_of(meals: &[Meal], at: DateTime<Utc>) -> DietTotals {
    DietTotals {
        calories: meals.iter().map(|m| m.calories).sum(),
        protein: meals.iter().map(|m| m.protein).sum(),
        carbs: meals.iter().map(|m| m.carbs).sum(),
        fat: meals.iter().map(|m| m.fat).sum(),
        logged_at: at,
    }
}
