//! Day rollover: the once-per-local-day advance-or-reset transition.
//!
//! The scheduler is tick driven. A caller (the CLI daemon, a cron job, a
//! test) passes `now` in and the scheduler decides per user whether the
//! rollover boundary has been crossed in that user's own timezone. Running
//! ticks more often than the boundary hour is safe: `last_rollover_date` on
//! the user row makes every repeat a no-op.

use chrono::{DateTime, Timelike, Utc};

use crate::completion::{self, DayStatus};
use crate::intent::NotificationSink;
#[cfg(test)]
use crate::program::ProgramConfig;
use crate::report;
use crate::storage::{Database, EngineConfig};
use crate::user::User;

/// What one rollover tick did, for logs and tests.
#[derive(Debug, Default)]
pub struct TickReport {
    pub users_checked: usize,
    pub advanced: Vec<i64>,
    pub reset: Vec<i64>,
    pub finished: Vec<i64>,
    pub errors: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct RolloverScheduler {
    pub rollover_hour: u32,
    pub challenge_days: u32,
}

impl RolloverScheduler {
    pub fn new(rollover_hour: u32, challenge_days: u32) -> Self {
        Self {
            rollover_hour,
            challenge_days,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.rollover_hour, config.challenge_days)
    }

    /// Check every active user against the rollover boundary. Per-user
    /// failures are logged and skipped so one bad row never stalls the rest.
    pub fn run_tick(
        &self,
        db: &Database,
        sink: &dyn NotificationSink,
        now: DateTime<Utc>,
    ) -> TickReport {
        let users = match db.active_users() {
            Ok(users) => users,
            Err(err) => {
                tracing::warn!(%err, "rollover tick could not list users");
                let mut report = TickReport::default();
                report.errors = 1;
                return report;
            }
        };

        let mut report = TickReport::default();
        for user in users {
            report.users_checked += 1;
            match self.roll_user(db, sink, &user, now) {
                Ok(Some(Outcome::Advanced)) => report.advanced.push(user.id),
                Ok(Some(Outcome::Reset)) => report.reset.push(user.id),
                Ok(Some(Outcome::Finished)) => report.finished.push(user.id),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(handle = %user.handle, %err, "rollover failed for user");
                    report.errors += 1;
                }
            }
        }
        report
    }

    fn roll_user(
        &self,
        db: &Database,
        sink: &dyn NotificationSink,
        user: &User,
        now: DateTime<Utc>,
    ) -> crate::error::Result<Option<Outcome>> {
        let local = user.local_time(now);
        if local.hour() != self.rollover_hour {
            return Ok(None);
        }
        let local_date = local.date_naive();
        if user.last_rollover_date == Some(local_date) {
            return Ok(None);
        }

        let Some(program) = db.get_program(user.id)? else {
            tracing::warn!(handle = %user.handle, "active user without a program, skipping");
            return Ok(None);
        };

        let status = match db.get_day_log(user.id, user.attempt, user.current_day)? {
            Some(log) => completion::evaluate(
                &log,
                program.water_target_oz,
                program.diet_mode,
                program.base_calories,
            ),
            // Never even started the day
            None => DayStatus {
                complete: false,
                missing: Vec::new(),
            },
        };

        // The guard and the transition commit together: an error mid-way
        // rolls both back so the next tick in the hour can retry, while a
        // repeat tick after commit sees the guard and no-ops.
        let tx = db.conn().unchecked_transaction()?;
        db.set_last_rollover_date(user.id, local_date)?;

        let (outcome, message) = if !status.complete {
            let previous_day = user.current_day;
            db.reset_to_day_one(user.id, local_date)?;
            db.get_or_create_day_log(user.id, user.attempt + 1, 1, local_date)?;
            (Outcome::Reset, report::format_reset(previous_day, &status))
        } else if user.current_day >= self.challenge_days {
            db.mark_finished(user.id, now)?;
            (
                Outcome::Finished,
                report::format_day_complete(user.current_day, self.challenge_days),
            )
        } else {
            let next_day = user.current_day + 1;
            db.advance_day(user.id)?;
            db.get_or_create_day_log(user.id, user.attempt, next_day, local_date)?;
            (
                Outcome::Advanced,
                report::format_new_day(next_day, &program, self.challenge_days),
            )
        };
        tx.commit()?;

        sink.send(&user.handle, &message);
        match outcome {
            Outcome::Reset => {
                tracing::info!(handle = %user.handle, previous_day = user.current_day, "reset to day 1");
            }
            Outcome::Finished => tracing::info!(handle = %user.handle, "challenge finished"),
            Outcome::Advanced => {
                tracing::info!(handle = %user.handle, next_day = user.current_day + 1, "advanced to next day");
            }
        }
        Ok(Some(outcome))
    }
}

#[derive(Clone, Copy)]
enum Outcome {
    Advanced,
    Reset,
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{TaskLogger, WorkoutInput};
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct RecordingSink(Mutex<Vec<(String, String)>>);

    impl RecordingSink {
        fn new() -> Self {
            Self(Mutex::new(Vec::new()))
        }

        fn messages(&self) -> Vec<(String, String)> {
            self.0.lock().unwrap().clone()
        }
    }

    impl NotificationSink for RecordingSink {
        fn send(&self, handle: &str, message: &str) {
            self.0
                .lock()
                .unwrap()
                .push((handle.to_string(), message.to_string()));
        }
    }

    fn setup() -> (Database, User, ProgramConfig) {
        let db = Database::open_memory().unwrap();
        let user = db.create_user("tester", Some("UTC")).unwrap();
        db.complete_onboarding(user.id, Utc::now().date_naive())
            .unwrap();
        let user = db.get_user_by_id(user.id).unwrap().unwrap();
        let program = db.get_program(user.id).unwrap().unwrap();
        (db, user, program)
    }

    fn boundary(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 5, 10, 0).unwrap()
    }

    fn complete_day(db: &Database, user: &User, program: &ProgramConfig) {
        let logger = TaskLogger::new(db);
        logger
            .log_outdoor_workout(user, WorkoutInput::default())
            .unwrap();
        logger
            .log_indoor_workout(user, WorkoutInput::default())
            .unwrap();
        logger.log_reading(user, 10, "book").unwrap();
        logger.log_progress_pic(user, None).unwrap();
        logger.confirm_diet(user).unwrap();
        logger
            .add_water(user, program.water_target_oz, program.water_target_oz)
            .unwrap();
        logger.try_commit_completion(user, program).unwrap();
    }

    #[test]
    fn complete_day_advances_and_notifies() {
        let (db, user, program) = setup();
        complete_day(&db, &user, &program);

        let sink = RecordingSink::new();
        let scheduler = RolloverScheduler::new(5, 75);
        let report = scheduler.run_tick(&db, &sink, boundary(2026, 3, 15));

        assert_eq!(report.advanced, vec![user.id]);
        let fresh = db.get_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(fresh.current_day, 2);
        assert!(db.get_day_log(user.id, 1, 2).unwrap().is_some());

        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].1.contains("Day 2 of 75"));
        assert!(messages[0].1.contains("Streak: 1 days"));
    }

    #[test]
    fn incomplete_day_resets_to_day_one() {
        let (db, user, _) = setup();
        TaskLogger::new(&db)
            .add_water(&user, 30, 128)
            .unwrap();

        let sink = RecordingSink::new();
        let scheduler = RolloverScheduler::new(5, 75);
        let report = scheduler.run_tick(&db, &sink, boundary(2026, 3, 15));

        assert_eq!(report.reset, vec![user.id]);
        let fresh = db.get_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(fresh.current_day, 1);
        assert_eq!(fresh.attempt, 2);
        assert!(sink.messages()[0].1.contains("Day 1 incomplete"));
    }

    #[test]
    fn double_tick_in_boundary_hour_runs_once() {
        let (db, user, _) = setup();
        let sink = RecordingSink::new();
        let scheduler = RolloverScheduler::new(5, 75);

        let first = scheduler.run_tick(&db, &sink, boundary(2026, 3, 15));
        let second = scheduler.run_tick(
            &db,
            &sink,
            Utc.with_ymd_and_hms(2026, 3, 15, 5, 40, 0).unwrap(),
        );

        assert_eq!(first.reset.len(), 1);
        assert!(second.reset.is_empty());
        assert_eq!(sink.messages().len(), 1);

        let fresh = db.get_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(fresh.attempt, 2);
        let fresh_log = db.get_day_log(user.id, 2, 1).unwrap().unwrap();
        assert_eq!(
            fresh_log.date,
            boundary(2026, 3, 15).date_naive()
        );
    }

    #[test]
    fn missing_log_resets_with_no_activity_notice() {
        let (db, user, _) = setup();
        assert!(db.get_day_log(user.id, 1, 1).unwrap().is_none());

        let sink = RecordingSink::new();
        let scheduler = RolloverScheduler::new(5, 75);
        let report = scheduler.run_tick(&db, &sink, boundary(2026, 3, 15));

        assert_eq!(report.reset, vec![user.id]);
        assert!(sink.messages()[0].1.contains("No activity logged"));
    }

    #[test]
    fn nothing_happens_outside_the_rollover_hour() {
        let (db, _, _) = setup();
        let sink = RecordingSink::new();
        let scheduler = RolloverScheduler::new(5, 75);
        let report = scheduler.run_tick(
            &db,
            &sink,
            Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap(),
        );
        assert!(report.advanced.is_empty());
        assert!(report.reset.is_empty());
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn failure_on_day_twelve_keeps_the_old_log_retrievable() {
        let (db, user, program) = setup();
        for day in 1..12 {
            let fresh = db.get_user_by_id(user.id).unwrap().unwrap();
            assert_eq!(fresh.current_day, day);
            complete_day(&db, &fresh, &program);
            db.advance_day(user.id).unwrap();
            db.get_or_create_day_log(user.id, 1, day + 1, Utc::now().date_naive())
                .unwrap();
        }
        let fresh = db.get_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(fresh.current_day, 12);

        let sink = RecordingSink::new();
        let scheduler = RolloverScheduler::new(5, 75);
        scheduler.run_tick(&db, &sink, boundary(2026, 3, 26));

        let after = db.get_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(after.current_day, 1);
        assert_eq!(after.attempt, 2);
        assert!(sink.messages()[0].1.contains("Day 12 incomplete"));

        // The failed day stays on record, incomplete, under attempt 1
        let old = db.get_day_log(user.id, 1, 12).unwrap().unwrap();
        assert!(!old.completed);
        let history = db.day_logs_for_attempt(user.id, 1).unwrap();
        assert_eq!(history.len(), 12);
    }

    #[test]
    fn final_day_complete_finishes_instead_of_advancing() {
        let (db, user, program) = setup();
        let scheduler = RolloverScheduler::new(5, 3);
        let sink = RecordingSink::new();

        for day in 1..=3 {
            let fresh = db.get_user_by_id(user.id).unwrap().unwrap();
            assert_eq!(fresh.current_day, day);
            complete_day(&db, &fresh, &program);
            scheduler.run_tick(&db, &sink, boundary(2026, 3, 14 + day as u32));
        }

        let after = db.get_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(after.current_day, 3);
        assert!(after.finished_at.is_some());
        let messages = sink.messages();
        assert!(messages.last().unwrap().1.contains("YOU DID IT"));
    }

    #[test]
    fn finished_user_leaves_the_scheduler_rotation() {
        let (db, user, program) = setup();
        let scheduler = RolloverScheduler::new(5, 1);
        let sink = RecordingSink::new();
        complete_day(&db, &user, &program);

        let first = scheduler.run_tick(&db, &sink, boundary(2026, 3, 15));
        assert_eq!(first.finished, vec![user.id]);
        assert_eq!(sink.messages().len(), 1);

        // Subsequent days: no re-evaluation, no repeat finish notice.
        let next = scheduler.run_tick(&db, &sink, boundary(2026, 3, 16));
        let later = scheduler.run_tick(&db, &sink, boundary(2026, 3, 17));
        assert_eq!(next.users_checked, 0);
        assert_eq!(later.users_checked, 0);
        assert!(next.finished.is_empty());
        assert_eq!(sink.messages().len(), 1);
        assert!(db.active_users().unwrap().is_empty());
    }

    #[test]
    fn failed_transition_rolls_back_the_guard_and_retries() {
        let (db, user, program) = setup();
        complete_day(&db, &user, &program);
        db.conn()
            .execute_batch(
                "CREATE TRIGGER block_inserts BEFORE INSERT ON day_logs
                 BEGIN SELECT RAISE(ABORT, 'storage offline'); END;",
            )
            .unwrap();

        let sink = RecordingSink::new();
        let scheduler = RolloverScheduler::new(5, 75);
        let report = scheduler.run_tick(&db, &sink, boundary(2026, 3, 15));
        assert_eq!(report.errors, 1);
        assert!(report.advanced.is_empty());
        assert!(sink.messages().is_empty());

        // Both the advance and the once-per-day guard rolled back.
        let fresh = db.get_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(fresh.current_day, 1);
        assert!(fresh.last_rollover_date.is_none());

        db.conn().execute_batch("DROP TRIGGER block_inserts").unwrap();
        let retry = scheduler.run_tick(
            &db,
            &sink,
            Utc.with_ymd_and_hms(2026, 3, 15, 5, 30, 0).unwrap(),
        );
        assert_eq!(retry.advanced, vec![user.id]);
        assert_eq!(
            db.get_user_by_id(user.id).unwrap().unwrap().current_day,
            2
        );
    }
}
