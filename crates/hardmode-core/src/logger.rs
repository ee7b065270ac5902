//! Task logging operations against the current day's log.
//!
//! Every operation is a read-modify-write against the freshest fetched
//! record and lazily creates the day log if absent. Workout, reading,
//! diet-confirm and progress-pic logging are idempotent overwrites; water
//! and meals are accumulative by design, so callers must not resubmit the
//! same utterance twice. Nothing here ever reopens a completed day.

use chrono::Utc;

use crate::completion::{self, DayStatus};
use crate::daylog::{
    diet_totals_of, DayLog, Meal, ProgressPicLog, ReadingLog, WaterLog, WorkoutLog,
};
use crate::error::Result;
use crate::program::ProgramConfig;
use crate::storage::Database;
use crate::user::User;

/// Structured payload for a workout event (from the intent extractor or the
/// photo pipeline).
#[derive(Debug, Clone, Default)]
pub struct WorkoutInput {
    pub description: Option<String>,
    pub duration_mins: Option<u32>,
    pub calories_burned: Option<u32>,
    pub photo_id: Option<String>,
}

/// Result of a post-mutation completion check.
#[derive(Debug, Clone)]
pub struct CompletionCommit {
    pub status: DayStatus,
    /// True only on the transition from incomplete to complete; the caller
    /// sends the one-time "day complete" message on this.
    pub newly_completed: bool,
}

/// Mutation operations on the current day's log.
pub struct TaskLogger<'a> {
    db: &'a Database,
}

impl<'a> TaskLogger<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Fetch the current day's log, creating it lazily.
    pub fn open_log(&self, user: &User) -> Result<DayLog> {
        let date = user.local_date(Utc::now());
        self.db
            .get_or_create_day_log(user.id, user.attempt, user.current_day, date)
    }

    pub fn log_outdoor_workout(&self, user: &User, input: WorkoutInput) -> Result<DayLog> {
        let mut log = self.open_log(user)?;
        log.outdoor_workout = Some(workout_from(input));
        self.db.update_day_log(&log)?;
        Ok(log)
    }

    pub fn log_indoor_workout(&self, user: &User, input: WorkoutInput) -> Result<DayLog> {
        let mut log = self.open_log(user)?;
        log.indoor_workout = Some(workout_from(input));
        self.db.update_day_log(&log)?;
        Ok(log)
    }

    pub fn log_reading(&self, user: &User, pages: u32, book: &str) -> Result<DayLog> {
        let mut log = self.open_log(user)?;
        log.reading = Some(ReadingLog {
            done: true,
            pages,
            book: book.to_string(),
            logged_at: Utc::now(),
        });
        self.db.update_day_log(&log)?;
        Ok(log)
    }

    pub fn log_progress_pic(&self, user: &User, file_id: Option<String>) -> Result<DayLog> {
        let mut log = self.open_log(user)?;
        log.progress_pic = Some(ProgressPicLog {
            done: true,
            file_id,
            logged_at: Utc::now(),
        });
        self.db.update_day_log(&log)?;
        Ok(log)
    }

    pub fn confirm_diet(&self, user: &User) -> Result<DayLog> {
        let mut log = self.open_log(user)?;
        log.diet_confirmed = true;
        self.db.update_day_log(&log)?;
        Ok(log)
    }

    /// Accumulate water. `done` tracks the running total against the target.
    pub fn add_water(&self, user: &User, amount_oz: u32, target_oz: u32) -> Result<DayLog> {
        let mut log = self.open_log(user)?;
        let total = log.water_oz() + amount_oz;
        log.water = Some(WaterLog {
            done: total >= target_oz,
            amount_oz: total,
            logged_at: Utc::now(),
        });
        self.db.update_day_log(&log)?;
        Ok(log)
    }

    /// Remove water (a correction), floored at zero.
    pub fn delete_water(&self, user: &User, amount_oz: u32, target_oz: u32) -> Result<DayLog> {
        let mut log = self.open_log(user)?;
        let total = log.water_oz().saturating_sub(amount_oz);
        log.water = Some(WaterLog {
            done: total >= target_oz,
            amount_oz: total,
            logged_at: Utc::now(),
        });
        self.db.update_day_log(&log)?;
        Ok(log)
    }

    /// Append a meal and recompute aggregates from the full list.
    pub fn add_meal(&self, user: &User, meal: Meal) -> Result<DayLog> {
        let mut log = self.open_log(user)?;
        log.meals.push(meal);
        log.diet = Some(diet_totals_of(&log.meals, Utc::now()));
        self.db.update_day_log(&log)?;
        Ok(log)
    }

    /// Remove up to `count` meals from the tail.
    pub fn delete_last_meals(&self, user: &User, count: usize) -> Result<DayLog> {
        let mut log = self.open_log(user)?;
        let keep = log.meals.len().saturating_sub(count);
        log.meals.truncate(keep);
        log.diet = Some(diet_totals_of(&log.meals, Utc::now()));
        self.db.update_day_log(&log)?;
        Ok(log)
    }

    /// Replace the tail meal with a corrected entry. A no-op when no meal
    /// has been logged yet.
    pub fn update_last_meal(&self, user: &User, corrected: Meal) -> Result<DayLog> {
        let mut log = self.open_log(user)?;
        if let Some(last) = log.meals.last_mut() {
            *last = corrected;
            log.diet = Some(diet_totals_of(&log.meals, Utc::now()));
            self.db.update_day_log(&log)?;
        }
        Ok(log)
    }

    /// Empty the meal list and zero the aggregates.
    pub fn clear_meals(&self, user: &User) -> Result<DayLog> {
        let mut log = self.open_log(user)?;
        log.meals.clear();
        log.diet = Some(diet_totals_of(&log.meals, Utc::now()));
        self.db.update_day_log(&log)?;
        Ok(log)
    }

    /// Evaluate the day and commit `completed` exactly once.
    ///
    /// The guard is the log's own flag: a duplicate trigger sees
    /// `completed = true` and becomes a no-op instead of a second commit.
    pub fn try_commit_completion(
        &self,
        user: &User,
        program: &ProgramConfig,
    ) -> Result<CompletionCommit> {
        let mut log = self.open_log(user)?;
        let status = completion::evaluate(
            &log,
            program.water_target_oz,
            program.diet_mode,
            program.base_calories,
        );
        let newly_completed = status.complete && !log.completed;
        if newly_completed {
            log.completed = true;
            log.completed_at = Some(Utc::now());
            self.db.update_day_log(&log)?;
        }
        Ok(CompletionCommit {
            status,
            newly_completed,
        })
    }
}

fn workout_from(input: WorkoutInput) -> WorkoutLog {
    WorkoutLog {
        done: true,
        description: input.description,
        duration_mins: input.duration_mins.or(Some(45)),
        calories_burned: input.calories_burned,
        photo_id: input.photo_id,
        logged_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::DietMode;
    use proptest::prelude::*;

    fn setup() -> (Database, User, ProgramConfig) {
        let db = Database::open_memory().unwrap();
        let user = db.create_user("tester", None).unwrap();
        db.complete_onboarding(user.id, Utc::now().date_naive())
            .unwrap();
        let user = db.get_user_by_id(user.id).unwrap().unwrap();
        let program = db.get_program(user.id).unwrap().unwrap();
        (db, user, program)
    }

    fn meal(description: &str, calories: u32, protein: u32) -> Meal {
        Meal {
            description: description.to_string(),
            calories,
            protein,
            carbs: 20,
            fat: 10,
            logged_at: Utc::now(),
        }
    }

    #[test]
    fn water_accumulates_rather_than_overwrites() {
        let (db, user, _) = setup();
        let logger = TaskLogger::new(&db);

        logger.add_water(&user, 30, 128).unwrap();
        let log = logger.add_water(&user, 30, 128).unwrap();
        assert_eq!(log.water_oz(), 60);
        assert!(!log.water.as_ref().unwrap().done);

        let log = logger.add_water(&user, 68, 128).unwrap();
        assert_eq!(log.water_oz(), 128);
        assert!(log.water.as_ref().unwrap().done);
    }

    #[test]
    fn delete_water_floors_at_zero() {
        let (db, user, _) = setup();
        let logger = TaskLogger::new(&db);
        logger.add_water(&user, 30, 128).unwrap();
        let log = logger.delete_water(&user, 100, 128).unwrap();
        assert_eq!(log.water_oz(), 0);
    }

    #[test]
    fn meal_add_then_delete_restores_aggregates() {
        let (db, user, _) = setup();
        let logger = TaskLogger::new(&db);

        logger.add_meal(&user, meal("eggs", 300, 24)).unwrap();
        let before = logger.open_log(&user).unwrap();
        let totals_before = before.diet.clone().unwrap();

        logger.add_meal(&user, meal("burger", 900, 40)).unwrap();
        let log = logger.delete_last_meals(&user, 1).unwrap();
        let totals_after = log.diet.unwrap();

        assert_eq!(totals_after.calories, totals_before.calories);
        assert_eq!(totals_after.protein, totals_before.protein);
        assert_eq!(totals_after.carbs, totals_before.carbs);
        assert_eq!(totals_after.fat, totals_before.fat);
        assert_eq!(log.meals.len(), 1);
    }

    #[test]
    fn update_last_meal_replaces_tail_and_recomputes() {
        let (db, user, _) = setup();
        let logger = TaskLogger::new(&db);
        logger.add_meal(&user, meal("eggs", 300, 24)).unwrap();
        logger.add_meal(&user, meal("guess", 900, 40)).unwrap();
        let log = logger
            .update_last_meal(&user, meal("measured", 700, 40))
            .unwrap();
        assert_eq!(log.meals[1].description, "measured");
        assert_eq!(log.diet.unwrap().calories, 1000);
    }

    #[test]
    fn update_last_meal_without_meals_is_a_noop() {
        let (db, user, _) = setup();
        let logger = TaskLogger::new(&db);
        let log = logger.update_last_meal(&user, meal("ghost", 1, 1)).unwrap();
        assert!(log.meals.is_empty());
    }

    #[test]
    fn clear_meals_zeroes_aggregates() {
        let (db, user, _) = setup();
        let logger = TaskLogger::new(&db);
        logger.add_meal(&user, meal("eggs", 300, 24)).unwrap();
        let log = logger.clear_meals(&user).unwrap();
        assert!(log.meals.is_empty());
        assert_eq!(log.diet.unwrap().calories, 0);
    }

    #[test]
    fn workout_logging_is_an_idempotent_overwrite() {
        let (db, user, _) = setup();
        let logger = TaskLogger::new(&db);
        let input = WorkoutInput {
            description: Some("morning run".to_string()),
            duration_mins: Some(50),
            calories_burned: Some(480),
            photo_id: None,
        };
        logger.log_outdoor_workout(&user, input.clone()).unwrap();
        let log = logger.log_outdoor_workout(&user, input).unwrap();
        assert_eq!(log.workout_burn(), 480); // not doubled
        assert!(log.indoor_workout.is_none());
    }

    #[test]
    fn completion_commits_exactly_once() {
        let (db, user, program) = setup();
        assert_eq!(program.diet_mode, DietMode::Confirm);
        let logger = TaskLogger::new(&db);

        logger
            .log_outdoor_workout(&user, WorkoutInput::default())
            .unwrap();
        logger
            .log_indoor_workout(&user, WorkoutInput::default())
            .unwrap();
        logger.log_reading(&user, 10, "Atomic Habits").unwrap();
        logger.log_progress_pic(&user, None).unwrap();
        logger.confirm_diet(&user).unwrap();

        let partial = logger.try_commit_completion(&user, &program).unwrap();
        assert!(!partial.status.complete); // water still short

        logger.add_water(&user, 128, program.water_target_oz).unwrap();
        let first = logger.try_commit_completion(&user, &program).unwrap();
        assert!(first.status.complete);
        assert!(first.newly_completed);

        let second = logger.try_commit_completion(&user, &program).unwrap();
        assert!(second.status.complete);
        assert!(!second.newly_completed);

        let log = logger.open_log(&user).unwrap();
        assert!(log.completed);
        assert!(log.completed_at.is_some());
    }

    #[test]
    fn logging_after_completion_never_reopens_the_day() {
        let (db, user, program) = setup();
        let logger = TaskLogger::new(&db);
        logger
            .log_outdoor_workout(&user, WorkoutInput::default())
            .unwrap();
        logger
            .log_indoor_workout(&user, WorkoutInput::default())
            .unwrap();
        logger.log_reading(&user, 10, "book").unwrap();
        logger.log_progress_pic(&user, None).unwrap();
        logger.confirm_diet(&user).unwrap();
        logger.add_water(&user, 128, 128).unwrap();
        logger.try_commit_completion(&user, &program).unwrap();

        let log = logger.add_water(&user, 16, 128).unwrap();
        assert_eq!(log.water_oz(), 144);
        assert!(log.completed);
    }

    proptest! {
        #[test]
        fn water_total_is_order_independent(amounts in prop::collection::vec(1u32..64, 1..6)) {
            let (db, user, _) = setup();
            let logger = TaskLogger::new(&db);
            for &oz in &amounts {
                logger.add_water(&user, oz, 128).unwrap();
            }
            let log = logger.open_log(&user).unwrap();
            prop_assert_eq!(log.water_oz(), amounts.iter().sum::<u32>());
        }

        #[test]
        fn meal_round_trip_law(cal in 1u32..2000, protein in 0u32..200) {
            let (db, user, _) = setup();
            let logger = TaskLogger::new(&db);
            logger.add_meal(&user, meal("base", 400, 30)).unwrap();
            let before = logger.open_log(&user).unwrap().diet.unwrap();

            logger.add_meal(&user, meal("extra", cal, protein)).unwrap();
            let after = logger.delete_last_meals(&user, 1).unwrap().diet.unwrap();

            prop_assert_eq!(before.calories, after.calories);
            prop_assert_eq!(before.protein, after.protein);
        }
    }
}
