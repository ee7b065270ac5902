//! # Hardmode Core Library
//!
//! Core engine for a 75-day discipline challenge tracker: every day the user
//! must finish two workouts, read ten pages, hit a water target, satisfy a
//! diet requirement, and take a progress photo. One total miss resets the
//! whole run to Day 1.
//!
//! The library is CLI-first: all operations are available through the
//! standalone `hardmode` binary, and any chat frontend is a thin layer over
//! the same engine.
//!
//! ## Architecture
//!
//! - **Onboarding wizard**: a resumable step machine that turns free-text
//!   answers into a [`ProgramConfig`]
//! - **Task logger**: read-modify-write mutations on the current day's log,
//!   each followed by a once-only completion commit
//! - **Schedulers**: tick-driven rollover and alert checks that take `now`
//!   from the caller, so a clock never hides inside the engine
//! - **Storage**: SQLite day-log and user persistence plus TOML engine
//!   configuration
//!
//! ## Key Components
//!
//! - [`TaskLogger`]: day-log mutations
//! - [`RolloverScheduler`] / [`AlertScheduler`]: lifecycle transitions
//! - [`Database`]: user, program and day-log persistence
//! - [`IntentDispatcher`]: structured-intent to engine dispatch

pub mod alerts;
pub mod completion;
pub mod daylog;
pub mod error;
pub mod intent;
pub mod lifecycle;
pub mod logger;
pub mod nutrition;
pub mod onboarding;
pub mod program;
pub mod report;
pub mod storage;
pub mod user;

pub use alerts::{AlertReport, AlertScheduler};
pub use completion::{DayStatus, MissingTask};
pub use daylog::{DayLog, DietTotals, Meal, ProgressPicLog, ReadingLog, WaterLog, WorkoutLog};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use intent::{
    ContextUpdate, Intent, IntentDispatcher, IntentExtractor, IntentKind, NotificationSink,
    NutritionEstimator, PhotoAnalysis, PhotoClassifier, PhotoKind,
};
pub use lifecycle::{RolloverScheduler, TickReport};
pub use logger::{CompletionCommit, TaskLogger, WorkoutInput};
pub use nutrition::{FoodItem, ParsedFood};
pub use onboarding::{OnboardingData, OnboardingState, Step, StepOutcome};
pub use program::{Book, DietMode, ProgramConfig, UserContext};
pub use storage::{Database, EngineConfig};
pub use user::User;
