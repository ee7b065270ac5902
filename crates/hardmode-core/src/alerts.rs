//! Reminder alerts for incomplete days.
//!
//! Same tick discipline as the rollover scheduler: the caller passes `now`,
//! each user is checked in their own timezone, and per-user failures are
//! logged and skipped. A kv marker per (user, date, window) keeps a
//! finer-grained tick cadence from double-sending inside one window.

use chrono::{DateTime, Timelike, Utc};

use crate::completion;
use crate::intent::NotificationSink;
use crate::storage::{Database, EngineConfig};
use crate::user::User;

/// What one alert tick did.
#[derive(Debug, Default)]
pub struct AlertReport {
    pub users_checked: usize,
    pub sent: Vec<i64>,
    pub errors: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct AlertScheduler {
    pub tolerance_min: u32,
    pub deadline_hour: u32,
    /// Named in the deadline warning so the user knows when the reset lands.
    pub rollover_hour: u32,
}

impl AlertScheduler {
    pub fn new(tolerance_min: u32, deadline_hour: u32, rollover_hour: u32) -> Self {
        Self {
            tolerance_min,
            deadline_hour,
            rollover_hour,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.alert_tolerance_min,
            config.deadline_hour,
            config.rollover_hour,
        )
    }

    /// Send reminders to users inside one of their configured alert windows
    /// whose day is still incomplete.
    pub fn run_tick(
        &self,
        db: &Database,
        sink: &dyn NotificationSink,
        now: DateTime<Utc>,
    ) -> AlertReport {
        self.for_each_user(db, |db, user| {
            let local = user.local_time(now);
            let Some(program) = db.get_program(user.id)? else {
                return Ok(false);
            };

            let Some(window) = program.alert_times.iter().find_map(|t| {
                let (hour, minute) = parse_hhmm(t)?;
                let in_window =
                    local.hour() == hour && local.minute().abs_diff(minute) < self.tolerance_min;
                in_window.then(|| format!("{hour:02}:{minute:02}"))
            }) else {
                return Ok(false);
            };

            // Day not started: nothing to nag about yet
            let Some(log) = db.get_day_log(user.id, user.attempt, user.current_day)? else {
                return Ok(false);
            };
            let status = completion::evaluate(
                &log,
                program.water_target_oz,
                program.diet_mode,
                program.base_calories,
            );
            if status.complete {
                return Ok(false);
            }

            let marker = format!("alert:{}:{}:{}", user.id, local.date_naive(), window);
            if db.kv_get(&marker)?.is_some() {
                return Ok(false);
            }
            db.kv_set(&marker, "sent")?;

            sink.send(
                &user.handle,
                &format!(
                    "Day {} reminder: still need to complete {}. You've got this.",
                    user.current_day,
                    status.missing_summary(),
                ),
            );
            Ok(true)
        })
    }

    /// Final warning at the local deadline hour for users whose day is still
    /// incomplete.
    pub fn run_deadline_tick(
        &self,
        db: &Database,
        sink: &dyn NotificationSink,
        now: DateTime<Utc>,
    ) -> AlertReport {
        self.for_each_user(db, |db, user| {
            let local = user.local_time(now);
            if local.hour() != self.deadline_hour {
                return Ok(false);
            }
            let Some(program) = db.get_program(user.id)? else {
                return Ok(false);
            };
            let Some(log) = db.get_day_log(user.id, user.attempt, user.current_day)? else {
                return Ok(false);
            };
            let status = completion::evaluate(
                &log,
                program.water_target_oz,
                program.diet_mode,
                program.base_calories,
            );
            if status.complete {
                return Ok(false);
            }

            let marker = format!("deadline:{}:{}", user.id, local.date_naive());
            if db.kv_get(&marker)?.is_some() {
                return Ok(false);
            }
            db.kv_set(&marker, "sent")?;

            sink.send(
                &user.handle,
                &format!(
                    "Day {} is incomplete. Missing: {}.\n\n\
                     At {}am, if this isn't resolved, you'll reset to Day 1. That's the rule.",
                    user.current_day,
                    status.missing_summary(),
                    self.rollover_hour,
                ),
            );
            Ok(true)
        })
    }

    fn for_each_user<F>(&self, db: &Database, mut check: F) -> AlertReport
    where
        F: FnMut(&Database, &User) -> crate::error::Result<bool>,
    {
        let users = match db.active_users() {
            Ok(users) => users,
            Err(err) => {
                tracing::warn!(%err, "alert tick could not list users");
                let mut report = AlertReport::default();
                report.errors = 1;
                return report;
            }
        };

        let mut report = AlertReport::default();
        for user in users {
            report.users_checked += 1;
            match check(db, &user) {
                Ok(true) => report.sent.push(user.id),
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(handle = %user.handle, %err, "alert check failed for user");
                    report.errors += 1;
                }
            }
        }
        report
    }
}

fn parse_hhmm(value: &str) -> Option<(u32, u32)> {
    let (hour, minute) = value.split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}
