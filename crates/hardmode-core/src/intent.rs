//! Collaborator contracts and intent dispatch.
//!
//! The engine never talks to a chat transport or a model directly. Callers
//! implement [`IntentExtractor`], [`NutritionEstimator`] and
//! [`PhotoClassifier`] over whatever backend they have; the dispatcher here
//! turns their structured output into task-log mutations and reply text.
//! Estimator failures degrade to a fallback reply so one broken collaborator
//! never blocks the rest of the day's logging.

use serde::{Deserialize, Serialize};

use crate::daylog::DayLog;
use crate::error::Result;
use crate::logger::{TaskLogger, WorkoutInput};
use crate::nutrition::{format_daily_summary, format_meal_table, meal_from_parsed, ParsedFood};
use crate::program::{ProgramConfig, UserGoal, UserNote};
use crate::report;
use crate::storage::Database;
use crate::user::User;

/// Recognized message intents. Anything an extractor emits that we do not
/// know folds into `Unknown` instead of failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    LogWorkout,
    LogFood,
    LogWater,
    DeleteWater,
    DeleteMeals,
    EditMeal,
    ClearMeals,
    LogReading,
    LogProgressPic,
    ConfirmDiet,
    Status,
    Conversation,
    #[serde(other)]
    Unknown,
}

/// Structured interpretation of a free-text message. Payload fields are all
/// optional; each kind reads only the ones it needs and falls back to the
/// documented defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    #[serde(rename = "type")]
    pub kind: IntentKind,
    #[serde(default)]
    pub workout_number: Option<u8>,
    #[serde(default)]
    pub is_outdoor: Option<bool>,
    #[serde(default)]
    pub duration_mins: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub food_description: Option<String>,
    #[serde(default)]
    pub water_amount_oz: Option<u32>,
    #[serde(default)]
    pub meal_count: Option<u32>,
    #[serde(default)]
    pub pages_read: Option<u32>,
    #[serde(default)]
    pub response_text: Option<String>,
    /// Personalization facts picked up in passing, whatever the main intent.
    #[serde(default)]
    pub context_update: Option<ContextUpdate>,
}

impl Intent {
    pub fn conversation(text: impl Into<String>) -> Self {
        Self {
            kind: IntentKind::Conversation,
            workout_number: None,
            is_outdoor: None,
            duration_mins: None,
            notes: None,
            food_description: None,
            water_amount_oz: None,
            meal_count: None,
            pages_read: None,
            response_text: Some(text.into()),
            context_update: None,
        }
    }
}

/// Goals, motivation, and struggles the extractor spotted in a message.
/// Applied to the user's program context before the intent itself runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextUpdate {
    #[serde(default)]
    pub goal: Option<String>,
    /// 'weight', 'fitness', 'habit', 'other'
    #[serde(default)]
    pub goal_kind: Option<String>,
    #[serde(default)]
    pub why: Option<String>,
    #[serde(default)]
    pub struggle: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// What a photo turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoKind {
    WorkoutScreenshot,
    ProgressPic,
}

/// Classifier output for an uploaded photo. Tracker-screenshot fields are
/// present only when the classifier could read them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoAnalysis {
    #[serde(rename = "type")]
    pub kind: PhotoKind,
    #[serde(default)]
    pub duration_mins: Option<u32>,
    #[serde(default)]
    pub calories_burned: Option<u32>,
    #[serde(default)]
    pub hr_avg: Option<u32>,
    #[serde(default)]
    pub hr_max: Option<u32>,
    #[serde(default)]
    pub workout_type: Option<String>,
}

/// Turns a free-text message plus current-day context into an [`Intent`].
pub trait IntentExtractor {
    fn extract(
        &self,
        message: &str,
        user: &User,
        program: &ProgramConfig,
        log: &DayLog,
    ) -> Result<Intent>;
}

/// Estimates macros for a free-text food description.
pub trait NutritionEstimator {
    fn estimate(&self, description: &str, diet_type: Option<&str>) -> Result<ParsedFood>;
}

/// Classifies an uploaded photo as a tracker screenshot or a progress pic.
pub trait PhotoClassifier {
    fn classify(&self, image: &[u8], media_type: &str) -> Result<PhotoAnalysis>;
}

/// Fire-and-forget outbound notification channel. Errors are the sink's
/// problem; the schedulers log and move on.
pub trait NotificationSink {
    fn send(&self, handle: &str, message: &str);
}

/// Applies interpreted intents to the day log and produces reply text.
pub struct IntentDispatcher<'a> {
    db: &'a Database,
    challenge_days: u32,
}

impl<'a> IntentDispatcher<'a> {
    pub fn new(db: &'a Database, challenge_days: u32) -> Self {
        Self { db, challenge_days }
    }

    /// Dispatch one intent. The returned string is the full reply to send.
    pub fn apply_intent(
        &self,
        user: &User,
        program: &ProgramConfig,
        estimator: &dyn NutritionEstimator,
        intent: Intent,
    ) -> Result<String> {
        if let Some(update) = intent.context_update.as_ref() {
            self.record_context(user, update)?;
        }
        let logger = TaskLogger::new(self.db);
        match intent.kind {
            IntentKind::LogWorkout => {
                let input = WorkoutInput {
                    description: intent.notes.clone(),
                    duration_mins: intent.duration_mins,
                    calories_burned: None,
                    photo_id: None,
                };
                let outdoor = intent
                    .is_outdoor
                    .unwrap_or(intent.workout_number == Some(1));
                if outdoor {
                    logger.log_outdoor_workout(user, input)?;
                } else {
                    logger.log_indoor_workout(user, input)?;
                }
                let reply = intent
                    .response_text
                    .unwrap_or_else(|| "Workout logged.".to_string());
                self.with_completion(user, program, reply)
            }
            IntentKind::LogFood => {
                let Some(description) = intent.food_description.as_deref() else {
                    return Ok(
                        "I couldn't parse that food entry. Try being more specific.".to_string()
                    );
                };
                match estimator.estimate(description, program.diet_type.as_deref()) {
                    Ok(parsed) => {
                        let meal =
                            meal_from_parsed(&parsed, description, chrono::Utc::now());
                        let log = logger.add_meal(user, meal)?;
                        let reply = format!(
                            "{}\n\n{}",
                            format_meal_table(&parsed),
                            format_daily_summary(
                                &log.meals,
                                report::calorie_budget(program, &log),
                                program.protein_target.unwrap_or(150),
                            ),
                        );
                        self.with_completion(user, program, reply)
                    }
                    Err(err) => {
                        tracing::warn!(handle = %user.handle, %err, "food estimation failed");
                        Ok("I had trouble parsing that. Try describing your food differently."
                            .to_string())
                    }
                }
            }
            IntentKind::LogWater => {
                let amount = intent.water_amount_oz.unwrap_or(program.water_target_oz);
                let log = logger.add_water(user, amount, program.water_target_oz)?;
                let reply = intent.response_text.unwrap_or_else(|| {
                    format!("Water logged: {}/{} oz.", log.water_oz(), program.water_target_oz)
                });
                self.with_completion(user, program, reply)
            }
            IntentKind::DeleteWater => {
                let amount = intent.water_amount_oz.unwrap_or(0);
                let log = logger.delete_water(user, amount, program.water_target_oz)?;
                Ok(format!(
                    "Removed {amount} oz. Water is now {}/{} oz.",
                    log.water_oz(),
                    program.water_target_oz
                ))
            }
            IntentKind::DeleteMeals => {
                let count = intent.meal_count.unwrap_or(1) as usize;
                let log = logger.delete_last_meals(user, count)?;
                Ok(format!(
                    "Removed {count} meal(s). {}",
                    format_daily_summary(
                        &log.meals,
                        report::calorie_budget(program, &log),
                        program.protein_target.unwrap_or(150),
                    )
                ))
            }
            IntentKind::EditMeal => {
                let Some(description) = intent.food_description.as_deref() else {
                    return Ok("Tell me what the meal actually was and I'll correct it."
                        .to_string());
                };
                match estimator.estimate(description, program.diet_type.as_deref()) {
                    Ok(parsed) => {
                        let meal =
                            meal_from_parsed(&parsed, description, chrono::Utc::now());
                        let log = logger.update_last_meal(user, meal)?;
                        Ok(format!(
                            "Updated your last meal.\n\n{}",
                            format_daily_summary(
                                &log.meals,
                                report::calorie_budget(program, &log),
                                program.protein_target.unwrap_or(150),
                            )
                        ))
                    }
                    Err(err) => {
                        tracing::warn!(handle = %user.handle, %err, "food estimation failed");
                        Ok("I had trouble parsing that. Try describing your food differently."
                            .to_string())
                    }
                }
            }
            IntentKind::ClearMeals => {
                logger.clear_meals(user)?;
                Ok("Cleared today's food log.".to_string())
            }
            IntentKind::LogReading => {
                let pages = intent.pages_read.unwrap_or(10);
                let book = program.current_book().unwrap_or("Unknown").to_string();
                logger.log_reading(user, pages, &book)?;
                let reply = intent
                    .response_text
                    .unwrap_or_else(|| format!("Reading logged: {pages} pages of {book}."));
                self.with_completion(user, program, reply)
            }
            IntentKind::LogProgressPic => {
                logger.log_progress_pic(user, None)?;
                let reply = intent
                    .response_text
                    .unwrap_or_else(|| format!("Progress pic logged for Day {}.", user.current_day));
                self.with_completion(user, program, reply)
            }
            IntentKind::ConfirmDiet => {
                logger.confirm_diet(user)?;
                let reply = intent
                    .response_text
                    .unwrap_or_else(|| "Diet confirmed for today.".to_string());
                self.with_completion(user, program, reply)
            }
            IntentKind::Status => {
                let log = logger.open_log(user)?;
                Ok(report::format_status(user, program, &log, self.challenge_days))
            }
            IntentKind::Conversation | IntentKind::Unknown => Ok(intent
                .response_text
                .unwrap_or_else(|| "I didn't understand that. Try again?".to_string())),
        }
    }

    /// Dispatch an uploaded photo. `analysis` is `None` when classification
    /// failed; the fallback is to count it as the progress pic, which is the
    /// safer direction for the user.
    pub fn apply_photo(
        &self,
        user: &User,
        program: &ProgramConfig,
        analysis: Option<PhotoAnalysis>,
        file_id: Option<String>,
    ) -> Result<String> {
        let logger = TaskLogger::new(self.db);
        match analysis {
            Some(a) if a.kind == PhotoKind::WorkoutScreenshot => {
                let log = logger.open_log(user)?;
                let outdoor_done = log.outdoor_workout.as_ref().is_some_and(|w| w.done);
                let workout_number = if outdoor_done { 2 } else { 1 };
                let input = WorkoutInput {
                    description: a.workout_type.clone(),
                    duration_mins: a.duration_mins,
                    calories_burned: a.calories_burned,
                    photo_id: file_id,
                };
                let log = if workout_number == 1 {
                    logger.log_outdoor_workout(user, input)?
                } else {
                    logger.log_indoor_workout(user, input)?
                };

                let base = program.base_calories_or_default();
                let burned = log.workout_burn();
                let consumed = log.calories_consumed();
                let budget = base.saturating_add(burned);
                let mut reply = format!(
                    "Workout {workout_number} logged!\n\n\
                     Duration: {} min\n\
                     Calories burned: {}\n",
                    a.duration_mins.unwrap_or(45),
                    a.calories_burned.unwrap_or(0),
                );
                if let Some(hr) = a.hr_avg {
                    reply.push_str(&format!("Avg HR: {hr} bpm\n"));
                }
                if let Some(hr) = a.hr_max {
                    reply.push_str(&format!("Max HR: {hr} bpm\n"));
                }
                reply.push_str(&format!(
                    "\nToday's calorie budget:\n\
                     Base: {base} + Burned: {burned} = {budget} cal\n\
                     Consumed: {consumed} | Remaining: {}",
                    budget.saturating_sub(consumed),
                ));
                self.with_completion(user, program, reply)
            }
            _ => {
                logger.log_progress_pic(user, file_id)?;
                let reply = format!("Progress pic logged for Day {}!", user.current_day);
                self.with_completion(user, program, reply)
            }
        }
    }

    /// Fold extracted personalization facts into the stored program context.
    fn record_context(&self, user: &User, update: &ContextUpdate) -> Result<()> {
        let Some(mut program) = self.db.get_program(user.id)? else {
            return Ok(());
        };
        let now = chrono::Utc::now();
        if let Some(description) = &update.goal {
            program.context.add_goal(UserGoal {
                kind: update
                    .goal_kind
                    .clone()
                    .unwrap_or_else(|| "other".to_string()),
                description: description.clone(),
                mentioned_at: now,
            });
        }
        if let Some(why) = &update.why {
            program.context.set_why(why.clone());
        }
        if let Some(struggle) = &update.struggle {
            program.context.add_struggle(struggle.clone());
        }
        if let Some(note) = &update.note {
            program.context.add_note(UserNote {
                note: note.clone(),
                mentioned_at: now,
            });
        }
        self.db.update_program(user.id, &program)
    }

    /// Run the completion check and append the one-time completion notice.
    fn with_completion(
        &self,
        user: &User,
        program: &ProgramConfig,
        reply: String,
    ) -> Result<String> {
        let logger = TaskLogger::new(self.db);
        let commit = logger.try_commit_completion(user, program)?;
        if commit.newly_completed {
            Ok(format!(
                "{reply}\n\n{}",
                report::format_day_complete(user.current_day, self.challenge_days)
            ))
        } else {
            Ok(reply)
        }
    }
}
