use clap::Subcommand;
use hardmode_core::error::Result as CoreResult;
use hardmode_core::intent::{Intent, IntentDispatcher, IntentKind, NutritionEstimator};
use hardmode_core::logger::{TaskLogger, WorkoutInput};
use hardmode_core::nutrition::{FoodItem, ParsedFood};
use hardmode_core::program::ProgramConfig;
use hardmode_core::storage::Database;
use hardmode_core::user::User;

use super::{load_engine_config, open_database, CommandResult};

#[derive(Subcommand)]
pub enum LogAction {
    /// Add water in ounces
    Water { oz: u32 },
    /// Remove water (a correction)
    UnlogWater { oz: u32 },
    /// Log a meal with explicit macros
    Meal {
        /// Free-text description
        description: String,
        #[arg(long)]
        calories: u32,
        #[arg(long, default_value = "0")]
        protein: u32,
        #[arg(long, default_value = "0")]
        carbs: u32,
        #[arg(long, default_value = "0")]
        fat: u32,
    },
    /// Remove the last N meals
    DeleteMeals {
        #[arg(default_value = "1")]
        count: u32,
    },
    /// Replace the last meal with corrected macros
    EditMeal {
        description: String,
        #[arg(long)]
        calories: u32,
        #[arg(long, default_value = "0")]
        protein: u32,
        #[arg(long, default_value = "0")]
        carbs: u32,
        #[arg(long, default_value = "0")]
        fat: u32,
    },
    /// Clear today's food log
    ClearMeals,
    /// Log a workout (1 = outdoor, 2 = indoor/second)
    Workout {
        which: u8,
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        calories: Option<u32>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Log today's reading
    Reading {
        #[arg(default_value = "10")]
        pages: u32,
    },
    /// Log the daily progress pic
    Picture {
        #[arg(long)]
        file_id: Option<String>,
    },
    /// Confirm you followed your diet today
    Diet,
}

/// Macros typed straight on the command line stand in for an estimation
/// backend, so the dispatch path stays the same one a chat frontend uses.
struct ManualEstimator(ParsedFood);

impl NutritionEstimator for ManualEstimator {
    fn estimate(&self, _description: &str, _diet_type: Option<&str>) -> CoreResult<ParsedFood> {
        Ok(self.0.clone())
    }
}

fn manual(description: &str, calories: u32, protein: u32, carbs: u32, fat: u32) -> ManualEstimator {
    ManualEstimator(ParsedFood::from_items(vec![FoodItem {
        description: description.to_string(),
        calories,
        protein,
        carbs,
        fat,
    }]))
}

fn blank_intent(kind: IntentKind) -> Intent {
    Intent {
        kind,
        workout_number: None,
        is_outdoor: None,
        duration_mins: None,
        notes: None,
        food_description: None,
        water_amount_oz: None,
        meal_count: None,
        pages_read: None,
        response_text: None,
        context_update: None,
    }
}

pub fn run(handle: &str, action: LogAction) -> CommandResult {
    let db = open_database()?;
    let (user, program) = load_user(&db, handle)?;
    let dispatcher = IntentDispatcher::new(&db, load_engine_config().challenge_days);

    let idle = manual("", 0, 0, 0, 0);
    let reply = match action {
        LogAction::Water { oz } => {
            let mut intent = blank_intent(IntentKind::LogWater);
            intent.water_amount_oz = Some(oz);
            dispatcher.apply_intent(&user, &program, &idle, intent)?
        }
        LogAction::UnlogWater { oz } => {
            let mut intent = blank_intent(IntentKind::DeleteWater);
            intent.water_amount_oz = Some(oz);
            dispatcher.apply_intent(&user, &program, &idle, intent)?
        }
        LogAction::Meal {
            description,
            calories,
            protein,
            carbs,
            fat,
        } => {
            let estimator = manual(&description, calories, protein, carbs, fat);
            let mut intent = blank_intent(IntentKind::LogFood);
            intent.food_description = Some(description);
            dispatcher.apply_intent(&user, &program, &estimator, intent)?
        }
        LogAction::DeleteMeals { count } => {
            let mut intent = blank_intent(IntentKind::DeleteMeals);
            intent.meal_count = Some(count);
            dispatcher.apply_intent(&user, &program, &idle, intent)?
        }
        LogAction::EditMeal {
            description,
            calories,
            protein,
            carbs,
            fat,
        } => {
            let estimator = manual(&description, calories, protein, carbs, fat);
            let mut intent = blank_intent(IntentKind::EditMeal);
            intent.food_description = Some(description);
            dispatcher.apply_intent(&user, &program, &estimator, intent)?
        }
        LogAction::ClearMeals => {
            dispatcher.apply_intent(&user, &program, &idle, blank_intent(IntentKind::ClearMeals))?
        }
        LogAction::Workout {
            which,
            duration,
            calories,
            notes,
        } => {
            if !(1..=2).contains(&which) {
                return Err("workout number must be 1 (outdoor) or 2 (indoor)".into());
            }
            let logger = TaskLogger::new(&db);
            let input = WorkoutInput {
                description: notes,
                duration_mins: duration,
                calories_burned: calories,
                photo_id: None,
            };
            let log = if which == 1 {
                logger.log_outdoor_workout(&user, input)?
            } else {
                logger.log_indoor_workout(&user, input)?
            };
            let commit = logger.try_commit_completion(&user, &program)?;
            let mut reply = format!(
                "Workout {which} logged. Burned so far today: {} cal.",
                log.workout_burn()
            );
            if commit.newly_completed {
                reply.push_str(&format!(
                    "\n\n{}",
                    hardmode_core::report::format_day_complete(
                        user.current_day,
                        load_engine_config().challenge_days,
                    )
                ));
            }
            reply
        }
        LogAction::Reading { pages } => {
            let mut intent = blank_intent(IntentKind::LogReading);
            intent.pages_read = Some(pages);
            dispatcher.apply_intent(&user, &program, &idle, intent)?
        }
        LogAction::Picture { file_id } => {
            dispatcher.apply_photo(&user, &program, None, file_id)?
        }
        LogAction::Diet => {
            dispatcher.apply_intent(&user, &program, &idle, blank_intent(IntentKind::ConfirmDiet))?
        }
    };

    println!("{reply}");
    Ok(())
}

pub fn load_user(db: &Database, handle: &str) -> Result<(User, ProgramConfig), Box<dyn std::error::Error>> {
    let user = db
        .get_user(handle)?
        .ok_or_else(|| format!("unknown user: {handle}"))?;
    if !user.onboarding_complete {
        return Err(format!("{handle} hasn't finished setup; run `onboard start {handle}`").into());
    }
    let program = db
        .get_program(user.id)?
        .ok_or_else(|| format!("no program found for {handle}"))?;
    Ok((user, program))
}
