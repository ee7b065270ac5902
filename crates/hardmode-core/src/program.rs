//! Per-user program configuration.
//!
//! Created empty at first contact, populated field-by-field by the onboarding
//! wizard, and mutated rarely afterwards. Exactly one per user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default water target: one gallon in ounces.
pub const DEFAULT_WATER_TARGET_OZ: u32 = 128;

/// Fallback maintenance calories when deficit mode has no base configured.
pub const DEFAULT_BASE_CALORIES: u32 = 2000;

/// How the daily diet requirement is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DietMode {
    /// A single explicit "I followed my diet today" confirmation.
    #[default]
    Confirm,
    /// Meals must be logged; no over/under judgment.
    Track,
    /// Calories consumed must stay within base + workout burn.
    Deficit,
}

impl FromStr for DietMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "confirm" => Ok(DietMode::Confirm),
            "track" => Ok(DietMode::Track),
            "deficit" => Ok(DietMode::Deficit),
            other => Err(format!("unknown diet mode: {other}")),
        }
    }
}

impl fmt::Display for DietMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DietMode::Confirm => write!(f, "confirm"),
            DietMode::Track => write!(f, "track"),
            DietMode::Deficit => write!(f, "deficit"),
        }
    }
}

/// A reading-list entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub total_pages: Option<u32>,
    pub current_page: u32,
    pub started_day: u32,
    pub finished_day: Option<u32>,
}

impl Book {
    pub fn new(title: impl Into<String>, total_pages: Option<u32>) -> Self {
        Self {
            title: title.into(),
            total_pages,
            current_page: 0,
            started_day: 1,
            finished_day: None,
        }
    }
}

/// A goal learned in conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserGoal {
    /// 'weight', 'fitness', 'habit', 'other'
    pub kind: String,
    pub description: String,
    pub mentioned_at: DateTime<Utc>,
}

/// A free-form note about the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserNote {
    pub note: String,
    pub mentioned_at: DateTime<Utc>,
}

/// Accumulated goals, motivation, and struggles used to personalize replies.
/// Append-only: entries are added over time and never deleted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub goals: Vec<UserGoal>,
    #[serde(default)]
    pub why: Option<String>,
    #[serde(default)]
    pub struggles: Vec<String>,
    #[serde(default)]
    pub notes: Vec<UserNote>,
}

impl UserContext {
    pub fn add_goal(&mut self, goal: UserGoal) {
        self.goals.push(goal);
    }

    pub fn set_why(&mut self, why: impl Into<String>) {
        self.why = Some(why.into());
    }

    pub fn add_struggle(&mut self, struggle: impl Into<String>) {
        let struggle = struggle.into();
        if !self.struggles.contains(&struggle) {
            self.struggles.push(struggle);
        }
    }

    pub fn add_note(&mut self, note: UserNote) {
        self.notes.push(note);
    }
}

/// Static-per-user program settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramConfig {
    /// Free-form diet description ("keto", "clean eating", ...).
    #[serde(default)]
    pub diet_type: Option<String>,
    #[serde(default)]
    pub diet_mode: DietMode,
    /// Maintenance calories for deficit accounting.
    #[serde(default)]
    pub base_calories: Option<u32>,
    #[serde(default)]
    pub calorie_target: Option<u32>,
    #[serde(default)]
    pub protein_target: Option<u32>,
    #[serde(default)]
    pub carb_target: Option<u32>,
    #[serde(default)]
    pub fat_target: Option<u32>,
    #[serde(default = "default_water_target")]
    pub water_target_oz: u32,
    #[serde(default)]
    pub books: Vec<Book>,
    /// Typical outdoor workout ("Running", "Cycling", ...).
    #[serde(default)]
    pub workout_outdoor: Option<String>,
    /// Typical indoor/second workout.
    #[serde(default)]
    pub workout_indoor: Option<String>,
    /// When the user plans to take the daily progress photo.
    #[serde(default)]
    pub progress_pic_time: Option<String>,
    /// Reminder times as local "HH:MM" strings.
    #[serde(default = "default_alert_times")]
    pub alert_times: Vec<String>,
    #[serde(default)]
    pub context: UserContext,
}

fn default_water_target() -> u32 {
    DEFAULT_WATER_TARGET_OZ
}

fn default_alert_times() -> Vec<String> {
    vec![
        "19:00".to_string(),
        "20:00".to_string(),
        "21:00".to_string(),
        "22:00".to_string(),
    ]
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            diet_type: None,
            diet_mode: DietMode::default(),
            base_calories: None,
            calorie_target: None,
            protein_target: None,
            carb_target: None,
            fat_target: None,
            water_target_oz: default_water_target(),
            books: Vec::new(),
            workout_outdoor: None,
            workout_indoor: None,
            progress_pic_time: None,
            alert_times: default_alert_times(),
            context: UserContext::default(),
        }
    }
}

impl ProgramConfig {
    /// Base calories with the documented fallback applied.
    pub fn base_calories_or_default(&self) -> u32 {
        self.base_calories.unwrap_or(DEFAULT_BASE_CALORIES)
    }

    /// Title of the book currently being read, if any.
    pub fn current_book(&self) -> Option<&str> {
        self.books
            .iter()
            .find(|b| b.finished_day.is_none())
            .or_else(|| self.books.first())
            .map(|b| b.title.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diet_mode_round_trips_through_str() {
        for mode in [DietMode::Confirm, DietMode::Track, DietMode::Deficit] {
            assert_eq!(mode.to_string().parse::<DietMode>().unwrap(), mode);
        }
        assert!("cheat".parse::<DietMode>().is_err());
    }

    #[test]
    fn default_config_matches_program_rules() {
        let config = ProgramConfig::default();
        assert_eq!(config.water_target_oz, 128);
        assert_eq!(config.alert_times.len(), 4);
        assert_eq!(config.diet_mode, DietMode::Confirm);
        assert_eq!(config.base_calories_or_default(), 2000);
    }

    #[test]
    fn struggles_are_deduplicated() {
        let mut ctx = UserContext::default();
        ctx.add_struggle("late-night snacking");
        ctx.add_struggle("late-night snacking");
        assert_eq!(ctx.struggles.len(), 1);
    }

    #[test]
    fn current_book_prefers_unfinished() {
        let mut config = ProgramConfig::default();
        let mut first = Book::new("Atomic Habits", Some(320));
        first.finished_day = Some(12);
        config.books = vec![first, Book::new("Deep Work", None)];
        assert_eq!(config.current_book(), Some("Deep Work"));
    }
}
