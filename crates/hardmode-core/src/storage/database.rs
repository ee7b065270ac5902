//! SQLite-backed record store.
//!
//! Three record families: users, per-user program configs, and day logs.
//! Sub-records (task slots, meals, wizard state) are JSON columns, mirroring
//! their in-memory types one-to-one. Day logs are keyed
//! `(user_id, attempt, day_number)` so a reset opens a fresh attempt and
//! never rewrites history.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::data_dir;
use crate::daylog::DayLog;
use crate::error::{DatabaseError, Result};
use crate::onboarding::OnboardingState;
use crate::program::ProgramConfig;
use crate::user::{User, DEFAULT_TIMEZONE};

/// SQLite database holding all engine state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/hardmode/hardmode.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("hardmode.db");
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path,
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                    handle              TEXT NOT NULL UNIQUE,
                    current_day         INTEGER NOT NULL DEFAULT 0,
                    start_date          TEXT,
                    timezone            TEXT NOT NULL,
                    onboarding_complete INTEGER NOT NULL DEFAULT 0,
                    onboarding_state    TEXT,
                    attempt             INTEGER NOT NULL DEFAULT 1,
                    last_rollover_date  TEXT,
                    finished_at         TEXT,
                    created_at          TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS programs (
                    user_id     INTEGER PRIMARY KEY REFERENCES users(id),
                    config      TEXT NOT NULL,
                    updated_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS day_logs (
                    id              INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id         INTEGER NOT NULL REFERENCES users(id),
                    attempt         INTEGER NOT NULL,
                    day_number      INTEGER NOT NULL,
                    date            TEXT NOT NULL,
                    outdoor_workout TEXT,
                    indoor_workout  TEXT,
                    reading         TEXT,
                    water           TEXT,
                    diet            TEXT,
                    diet_confirmed  INTEGER NOT NULL DEFAULT 0,
                    progress_pic    TEXT,
                    meals           TEXT NOT NULL DEFAULT '[]',
                    completed       INTEGER NOT NULL DEFAULT 0,
                    completed_at    TEXT,
                    created_at      TEXT NOT NULL,
                    UNIQUE(user_id, attempt, day_number)
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_day_logs_user ON day_logs(user_id, attempt);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // ── Users ────────────────────────────────────────────────────────

    /// Create a user on first contact, with the wizard at its first step and
    /// an empty program config.
    pub fn create_user(&self, handle: &str, timezone: Option<&str>) -> Result<User> {
        let now = Utc::now();
        let state = OnboardingState::initial();
        self.conn.execute(
            "INSERT INTO users (handle, timezone, onboarding_state, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                handle,
                timezone.unwrap_or(DEFAULT_TIMEZONE),
                serde_json::to_string(&state)?,
                now.to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn.execute(
            "INSERT INTO programs (user_id, config, updated_at) VALUES (?1, ?2, ?3)",
            params![
                id,
                serde_json::to_string(&ProgramConfig::default())?,
                now.to_rfc3339()
            ],
        )?;
        self.get_user_by_id(id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {id}")).into())
    }

    pub fn get_user(&self, handle: &str) -> Result<Option<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, handle, current_day, start_date, timezone, onboarding_complete,
                    onboarding_state, attempt, last_rollover_date, created_at, finished_at
             FROM users WHERE handle = ?1",
        )?;
        let user = stmt
            .query_row(params![handle], map_user)
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(user)
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, handle, current_day, start_date, timezone, onboarding_complete,
                    onboarding_state, attempt, last_rollover_date, created_at, finished_at
             FROM users WHERE id = ?1",
        )?;
        let user = stmt
            .query_row(params![id], map_user)
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(user)
    }

    /// Fetch a user, creating them (plus empty program) on first contact.
    pub fn get_or_create_user(&self, handle: &str, timezone: Option<&str>) -> Result<User> {
        match self.get_user(handle)? {
            Some(user) => Ok(user),
            None => self.create_user(handle, timezone),
        }
    }

    /// All users with a finished onboarding who haven't completed the
    /// challenge, for scheduler scans.
    pub fn active_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, handle, current_day, start_date, timezone, onboarding_complete,
                    onboarding_state, attempt, last_rollover_date, created_at, finished_at
             FROM users WHERE onboarding_complete = 1 AND finished_at IS NULL ORDER BY id",
        )?;
        let users = stmt
            .query_map([], map_user)
            .map_err(DatabaseError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(DatabaseError::from)?;
        Ok(users)
    }

    /// Persist the wizard position. `None` clears it (post-commit).
    pub fn update_onboarding_state(
        &self,
        user_id: i64,
        state: Option<&OnboardingState>,
    ) -> Result<()> {
        let json = state.map(serde_json::to_string).transpose()?;
        self.conn.execute(
            "UPDATE users SET onboarding_state = ?2 WHERE id = ?1",
            params![user_id, json],
        )?;
        Ok(())
    }

    /// Activate the program: wizard cleared, day 1, fresh start date.
    pub fn complete_onboarding(&self, user_id: i64, start_date: NaiveDate) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET onboarding_complete = 1, onboarding_state = NULL,
                    current_day = 1, start_date = ?2
             WHERE id = ?1",
            params![user_id, start_date.to_string()],
        )?;
        Ok(())
    }

    pub fn set_timezone(&self, user_id: i64, timezone: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET timezone = ?2 WHERE id = ?1",
            params![user_id, timezone],
        )?;
        Ok(())
    }

    /// Reset to Day 1 on a new attempt. The old attempt's logs stay put.
    pub fn reset_to_day_one(&self, user_id: i64, start_date: NaiveDate) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET current_day = 1, attempt = attempt + 1, start_date = ?2
             WHERE id = ?1",
            params![user_id, start_date.to_string()],
        )?;
        Ok(())
    }

    pub fn advance_day(&self, user_id: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET current_day = current_day + 1 WHERE id = ?1",
            params![user_id],
        )?;
        Ok(())
    }

    /// Mark a user as having completed the whole challenge. Finished users
    /// drop out of scheduler scans; their logs stay on record.
    pub fn mark_finished(&self, user_id: i64, at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET finished_at = ?2 WHERE id = ?1",
            params![user_id, at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Record the local date of the last rollover transition (the
    /// once-per-local-day guard).
    pub fn set_last_rollover_date(&self, user_id: i64, date: NaiveDate) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET last_rollover_date = ?2 WHERE id = ?1",
            params![user_id, date.to_string()],
        )?;
        Ok(())
    }

    // ── Programs ─────────────────────────────────────────────────────

    pub fn get_program(&self, user_id: i64) -> Result<Option<ProgramConfig>> {
        let mut stmt = self
            .conn
            .prepare("SELECT config FROM programs WHERE user_id = ?1")?;
        let raw: Option<String> = stmt
            .query_row(params![user_id], |row| row.get(0))
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(raw.map(|r| serde_json::from_str(&r)).transpose()?)
    }

    pub fn update_program(&self, user_id: i64, config: &ProgramConfig) -> Result<()> {
        self.conn.execute(
            "INSERT INTO programs (user_id, config, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET config = ?2, updated_at = ?3",
            params![
                user_id,
                serde_json::to_string(config)?,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    // ── Day logs ─────────────────────────────────────────────────────

    pub fn get_day_log(&self, user_id: i64, attempt: u32, day_number: u32) -> Result<Option<DayLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, attempt, day_number, date, outdoor_workout, indoor_workout,
                    reading, water, diet, diet_confirmed, progress_pic, meals, completed,
                    completed_at, created_at
             FROM day_logs WHERE user_id = ?1 AND attempt = ?2 AND day_number = ?3",
        )?;
        let log = stmt
            .query_row(params![user_id, attempt, day_number], map_day_log)
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(log)
    }

    /// Fetch or lazily create the log for a (user, attempt, day).
    pub fn get_or_create_day_log(
        &self,
        user_id: i64,
        attempt: u32,
        day_number: u32,
        date: NaiveDate,
    ) -> Result<DayLog> {
        if let Some(log) = self.get_day_log(user_id, attempt, day_number)? {
            return Ok(log);
        }
        self.conn.execute(
            "INSERT INTO day_logs (user_id, attempt, day_number, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id,
                attempt,
                day_number,
                date.to_string(),
                Utc::now().to_rfc3339()
            ],
        )?;
        self.get_day_log(user_id, attempt, day_number)?
            .ok_or_else(|| {
                DatabaseError::NotFound(format!("day log {user_id}/{attempt}/{day_number}")).into()
            })
    }

    /// Write back every mutable field of a day log, keyed by row id.
    pub fn update_day_log(&self, log: &DayLog) -> Result<()> {
        self.conn.execute(
            "UPDATE day_logs SET
                outdoor_workout = ?2, indoor_workout = ?3, reading = ?4, water = ?5,
                diet = ?6, diet_confirmed = ?7, progress_pic = ?8, meals = ?9,
                completed = ?10, completed_at = ?11
             WHERE id = ?1",
            params![
                log.id,
                to_json_opt(&log.outdoor_workout)?,
                to_json_opt(&log.indoor_workout)?,
                to_json_opt(&log.reading)?,
                to_json_opt(&log.water)?,
                to_json_opt(&log.diet)?,
                log.diet_confirmed,
                to_json_opt(&log.progress_pic)?,
                serde_json::to_string(&log.meals)?,
                log.completed,
                log.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Every log for one attempt, in day order (historical reconstruction).
    pub fn day_logs_for_attempt(&self, user_id: i64, attempt: u32) -> Result<Vec<DayLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, attempt, day_number, date, outdoor_workout, indoor_workout,
                    reading, water, diet, diet_confirmed, progress_pic, meals, completed,
                    completed_at, created_at
             FROM day_logs WHERE user_id = ?1 AND attempt = ?2 ORDER BY day_number",
        )?;
        let logs = stmt
            .query_map(params![user_id, attempt], map_day_log)
            .map_err(DatabaseError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(DatabaseError::from)?;
        Ok(logs)
    }

    // ── KV (scheduler bookkeeping) ──────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let value = stmt
            .query_row(params![key], |row| row.get::<_, String>(0))
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn to_json_opt<T: serde::Serialize>(value: &Option<T>) -> Result<Option<String>> {
    Ok(value.as_ref().map(serde_json::to_string).transpose()?)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        handle: row.get(1)?,
        current_day: row.get(2)?,
        start_date: row
            .get::<_, Option<String>>(3)?
            .and_then(|s| s.parse().ok()),
        timezone: row.get(4)?,
        onboarding_complete: row.get(5)?,
        onboarding_state: row
            .get::<_, Option<String>>(6)?
            .and_then(|s| serde_json::from_str(&s).ok()),
        attempt: row.get(7)?,
        last_rollover_date: row
            .get::<_, Option<String>>(8)?
            .and_then(|s| s.parse().ok()),
        created_at: parse_ts(row.get::<_, String>(9)?),
        finished_at: row.get::<_, Option<String>>(10)?.map(parse_ts),
    })
}

fn map_day_log(row: &Row<'_>) -> rusqlite::Result<DayLog> {
    Ok(DayLog {
        id: row.get(0)?,
        user_id: row.get(1)?,
        attempt: row.get(2)?,
        day_number: row.get(3)?,
        date: row
            .get::<_, String>(4)?
            .parse()
            .unwrap_or_else(|_| Utc::now().date_naive()),
        outdoor_workout: from_json_opt(row.get::<_, Option<String>>(5)?),
        indoor_workout: from_json_opt(row.get::<_, Option<String>>(6)?),
        reading: from_json_opt(row.get::<_, Option<String>>(7)?),
        water: from_json_opt(row.get::<_, Option<String>>(8)?),
        diet: from_json_opt(row.get::<_, Option<String>>(9)?),
        diet_confirmed: row.get(10)?,
        progress_pic: from_json_opt(row.get::<_, Option<String>>(11)?),
        meals: serde_json::from_str(&row.get::<_, String>(12)?).unwrap_or_default(),
        completed: row.get(13)?,
        completed_at: row
            .get::<_, Option<String>>(14)?
            .map(parse_ts),
        created_at: parse_ts(row.get::<_, String>(15)?),
    })
}

fn from_json_opt<T: serde::de::DeserializeOwned>(raw: Option<String>) -> Option<T> {
    raw.and_then(|r| serde_json::from_str(&r).ok())
}

fn parse_ts(raw: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::Step;

    #[test]
    fn create_user_starts_wizard_and_empty_program() {
        let db = Database::open_memory().unwrap();
        let user = db.create_user("alice", None).unwrap();
        assert_eq!(user.current_day, 0);
        assert!(!user.onboarding_complete);
        assert_eq!(user.onboarding_state.as_ref().unwrap().step, Step::Gender);
        assert_eq!(user.attempt, 1);

        let program = db.get_program(user.id).unwrap().unwrap();
        assert_eq!(program.water_target_oz, 128);
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let db = Database::open_memory().unwrap();
        let a = db.get_or_create_user("bob", None).unwrap();
        let b = db.get_or_create_user("bob", None).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn onboarding_completion_activates_day_one() {
        let db = Database::open_memory().unwrap();
        let user = db.create_user("carol", Some("America/Chicago")).unwrap();
        let today = Utc::now().date_naive();
        db.complete_onboarding(user.id, today).unwrap();

        let user = db.get_user_by_id(user.id).unwrap().unwrap();
        assert!(user.onboarding_complete);
        assert!(user.onboarding_state.is_none());
        assert_eq!(user.current_day, 1);
        assert_eq!(user.start_date, Some(today));
        assert_eq!(db.active_users().unwrap().len(), 1);
    }

    #[test]
    fn day_logs_are_lazily_created_and_unique_per_attempt() {
        let db = Database::open_memory().unwrap();
        let user = db.create_user("dave", None).unwrap();
        let today = Utc::now().date_naive();

        let log = db.get_or_create_day_log(user.id, 1, 3, today).unwrap();
        let again = db.get_or_create_day_log(user.id, 1, 3, today).unwrap();
        assert_eq!(log.id, again.id);

        // A new attempt gets its own Day-3 row.
        let other = db.get_or_create_day_log(user.id, 2, 3, today).unwrap();
        assert_ne!(log.id, other.id);
    }

    #[test]
    fn reset_bumps_attempt_and_preserves_old_logs() {
        let db = Database::open_memory().unwrap();
        let user = db.create_user("erin", None).unwrap();
        let today = Utc::now().date_naive();
        db.complete_onboarding(user.id, today).unwrap();
        db.get_or_create_day_log(user.id, 1, 12, today).unwrap();

        db.reset_to_day_one(user.id, today).unwrap();
        let user = db.get_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(user.current_day, 1);
        assert_eq!(user.attempt, 2);

        // Old attempt's day 12 is still retrievable.
        assert!(db.get_day_log(user.id, 1, 12).unwrap().is_some());
        assert!(db.get_day_log(user.id, 2, 12).unwrap().is_none());
    }

    #[test]
    fn day_log_round_trips_sub_records() {
        let db = Database::open_memory().unwrap();
        let user = db.create_user("frank", None).unwrap();
        let today = Utc::now().date_naive();
        let mut log = db.get_or_create_day_log(user.id, 1, 1, today).unwrap();

        log.water = Some(crate::daylog::WaterLog {
            done: false,
            amount_oz: 64,
            logged_at: Utc::now(),
        });
        log.diet_confirmed = true;
        log.meals.push(crate::daylog::Meal {
            description: "chicken and rice".to_string(),
            calories: 650,
            protein: 45,
            carbs: 70,
            fat: 12,
            logged_at: Utc::now(),
        });
        db.update_day_log(&log).unwrap();

        let back = db.get_day_log(user.id, 1, 1).unwrap().unwrap();
        assert_eq!(back.water_oz(), 64);
        assert!(back.diet_confirmed);
        assert_eq!(back.meals.len(), 1);
        assert_eq!(back.meals[0].calories, 650);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("missing").unwrap().is_none());
        db.kv_set("alert:1:2026-01-15:19:00", "sent").unwrap();
        assert_eq!(
            db.kv_get("alert:1:2026-01-15:19:00").unwrap().as_deref(),
            Some("sent")
        );
    }
}
