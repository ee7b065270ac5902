//! Pure day-completion evaluator.
//!
//! `evaluate` maps the current aggregate state of a day log plus the program
//! targets to a verdict. It never mutates anything; committing the
//! `completed` flag is the caller's job, guarded by the log's existing flag.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::daylog::DayLog;
use crate::program::{DietMode, DEFAULT_BASE_CALORIES};

/// A requirement the day is still missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingTask {
    OutdoorWorkout,
    IndoorWorkout,
    Reading,
    Water,
    ProgressPic,
    /// Confirm mode: the explicit "followed my diet" flag.
    ConfirmDiet,
    /// Track mode: no meal logged yet.
    LogFood,
    /// Deficit mode: calories over budget (by this many).
    OverBudget(u32),
}

impl fmt::Display for MissingTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingTask::OutdoorWorkout => write!(f, "Outdoor workout"),
            MissingTask::IndoorWorkout => write!(f, "Indoor workout"),
            MissingTask::Reading => write!(f, "Read 10 pages"),
            MissingTask::Water => write!(f, "Water"),
            MissingTask::ProgressPic => write!(f, "Progress pic"),
            MissingTask::ConfirmDiet => write!(f, "Confirm diet"),
            MissingTask::LogFood => write!(f, "Log food"),
            MissingTask::OverBudget(over) => write!(f, "{over} cal over budget"),
        }
    }
}

/// Verdict for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayStatus {
    pub complete: bool,
    pub missing: Vec<MissingTask>,
}

impl DayStatus {
    pub fn missing_summary(&self) -> String {
        self.missing
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Evaluate a day log against the program targets.
///
/// Four universal tasks are checked by their `done` flags, water by amount
/// against target, and the diet requirement branches on mode. In deficit mode
/// a missing base-calorie setting defaults to 2000 rather than erroring.
pub fn evaluate(
    log: &DayLog,
    water_target_oz: u32,
    diet_mode: DietMode,
    base_calories: Option<u32>,
) -> DayStatus {
    let mut missing = Vec::new();

    if !log.outdoor_workout.as_ref().is_some_and(|w| w.done) {
        missing.push(MissingTask::OutdoorWorkout);
    }
    if !log.indoor_workout.as_ref().is_some_and(|w| w.done) {
        missing.push(MissingTask::IndoorWorkout);
    }
    if !log.reading.as_ref().is_some_and(|r| r.done) {
        missing.push(MissingTask::Reading);
    }
    if log.water_oz() < water_target_oz {
        missing.push(MissingTask::Water);
    }
    if !log.progress_pic.as_ref().is_some_and(|p| p.done) {
        missing.push(MissingTask::ProgressPic);
    }

    match diet_mode {
        DietMode::Confirm => {
            if !log.diet_confirmed {
                missing.push(MissingTask::ConfirmDiet);
            }
        }
        DietMode::Track => {
            if log.meals.is_empty() {
                missing.push(MissingTask::LogFood);
            }
        }
        DietMode::Deficit => {
            let base = base_calories.unwrap_or(DEFAULT_BASE_CALORIES);
            let budget = base.saturating_add(log.workout_burn());
            let eaten = log.calories_consumed();
            if eaten > budget {
                missing.push(MissingTask::OverBudget(eaten - budget));
            }
        }
    }

    DayStatus {
        complete: missing.is_empty(),
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daylog::{DietTotals, Meal, ProgressPicLog, ReadingLog, WaterLog, WorkoutLog};
    use chrono::Utc;

    fn empty_log() -> DayLog {
        DayLog {
            id: 1,
            user_id: 1,
            attempt: 1,
            day_number: 1,
            date: Utc::now().date_naive(),
            outdoor_workout: None,
            indoor_workout: None,
            reading: None,
            water: None,
            diet: None,
            diet_confirmed: false,
            progress_pic: None,
            meals: Vec::new(),
            completed: false,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    fn workout(burn: u32) -> WorkoutLog {
        WorkoutLog {
            done: true,
            description: None,
            duration_mins: Some(45),
            calories_burned: Some(burn),
            photo_id: None,
            logged_at: Utc::now(),
        }
    }

    fn filled_log() -> DayLog {
        let mut log = empty_log();
        log.outdoor_workout = Some(workout(0));
        log.indoor_workout = Some(workout(0));
        log.reading = Some(ReadingLog {
            done: true,
            pages: 10,
            book: "Atomic Habits".to_string(),
            logged_at: Utc::now(),
        });
        log.water = Some(WaterLog {
            done: true,
            amount_oz: 128,
            logged_at: Utc::now(),
        });
        log.progress_pic = Some(ProgressPicLog {
            done: true,
            file_id: None,
            logged_at: Utc::now(),
        });
        log
    }

    fn with_consumed(log: &mut DayLog, calories: u32) {
        log.meals = vec![Meal {
            description: "food".to_string(),
            calories,
            protein: 0,
            carbs: 0,
            fat: 0,
            logged_at: Utc::now(),
        }];
        log.diet = Some(DietTotals {
            calories,
            protein: 0,
            carbs: 0,
            fat: 0,
            logged_at: Utc::now(),
        });
    }

    #[test]
    fn empty_day_is_missing_everything() {
        let status = evaluate(&empty_log(), 128, DietMode::Confirm, None);
        assert!(!status.complete);
        assert_eq!(status.missing.len(), 6);
    }

    #[test]
    fn confirm_mode_requires_explicit_flag() {
        let mut log = filled_log();
        let status = evaluate(&log, 128, DietMode::Confirm, None);
        assert_eq!(status.missing, vec![MissingTask::ConfirmDiet]);

        log.diet_confirmed = true;
        assert!(evaluate(&log, 128, DietMode::Confirm, None).complete);
    }

    #[test]
    fn track_mode_requires_one_meal_without_judgment() {
        let mut log = filled_log();
        assert_eq!(
            evaluate(&log, 128, DietMode::Track, None).missing,
            vec![MissingTask::LogFood]
        );
        // Any meal satisfies track mode, however large.
        with_consumed(&mut log, 9000);
        assert!(evaluate(&log, 128, DietMode::Track, None).complete);
    }

    #[test]
    fn deficit_mode_budget_arithmetic() {
        let mut log = filled_log();
        log.outdoor_workout = Some(workout(500));

        // 2600 consumed vs 2000 + 500 budget: 100 over.
        with_consumed(&mut log, 2600);
        let status = evaluate(&log, 128, DietMode::Deficit, Some(2000));
        assert!(!status.complete);
        assert_eq!(status.missing, vec![MissingTask::OverBudget(100)]);
        assert_eq!(status.missing_summary(), "100 cal over budget");

        // 2400 consumed fits the 2500 budget.
        with_consumed(&mut log, 2400);
        assert!(evaluate(&log, 128, DietMode::Deficit, Some(2000)).complete);
    }

    #[test]
    fn deficit_mode_defaults_missing_base_to_2000() {
        let mut log = filled_log();
        with_consumed(&mut log, 2100);
        let status = evaluate(&log, 128, DietMode::Deficit, None);
        assert_eq!(status.missing, vec![MissingTask::OverBudget(100)]);
    }

    #[test]
    fn water_checked_by_amount_not_flag() {
        let mut log = filled_log();
        log.diet_confirmed = true;
        log.water = Some(WaterLog {
            done: true, // stale flag; amount is what counts
            amount_oz: 64,
            logged_at: Utc::now(),
        });
        let status = evaluate(&log, 128, DietMode::Confirm, None);
        assert_eq!(status.missing, vec![MissingTask::Water]);
    }

    #[test]
    fn deficit_budget_saturates_on_garbage_burn() {
        let mut log = filled_log();
        log.outdoor_workout = Some(workout(u32::MAX));
        log.indoor_workout = Some(workout(u32::MAX));
        with_consumed(&mut log, 2600);
        let status = evaluate(&log, 128, DietMode::Deficit, Some(2000));
        assert!(status.complete);
    }

    #[test]
    fn evaluate_is_pure() {
        let mut log = filled_log();
        with_consumed(&mut log, 2600);
        let a = evaluate(&log, 128, DietMode::Deficit, Some(2000));
        let b = evaluate(&log, 128, DietMode::Deficit, Some(2000));
        assert_eq!(a, b);
    }
}
