use chrono::Utc;
use clap::Subcommand;
use hardmode_core::onboarding::{self, OnboardingState, StepOutcome};
use hardmode_core::storage::Database;
use hardmode_core::user::User;

use super::{load_engine_config, open_database, CommandResult};

#[derive(Subcommand)]
pub enum OnboardAction {
    /// Create the user (or resume) and print the pending question
    Start {
        /// User handle
        user: String,
        /// IANA timezone, e.g. "America/Chicago"
        #[arg(long)]
        timezone: Option<String>,
    },
    /// Answer the pending wizard question
    Answer {
        /// User handle
        user: String,
        /// The reply, as the user would have typed it
        reply: String,
    },
}

pub fn run(action: OnboardAction) -> CommandResult {
    let db = open_database()?;
    match action {
        OnboardAction::Start { user, timezone } => {
            let user = db.get_or_create_user(&user, timezone.as_deref())?;
            if user.onboarding_complete {
                let days = load_engine_config().challenge_days;
                println!(
                    "Welcome back! You're on Day {} of {days}.\n\n\
                     Run `status` to see today's progress, or `log` what you've done.",
                    user.current_day
                );
                return Ok(());
            }
            match &user.onboarding_state {
                Some(state) => println!("{}", onboarding::prompt_for(state.step, &state.data)),
                None => {
                    let state = OnboardingState::initial();
                    db.update_onboarding_state(user.id, Some(&state))?;
                    println!("{}", OnboardingState::initial_prompt());
                }
            }
            Ok(())
        }
        OnboardAction::Answer { user, reply } => {
            let Some(user) = db.get_user(&user)? else {
                eprintln!("unknown user: {user} (run `onboard start` first)");
                std::process::exit(1);
            };
            if user.onboarding_complete {
                println!("Setup is already done. You're on Day {}.", user.current_day);
                return Ok(());
            }
            let state = user
                .onboarding_state
                .clone()
                .unwrap_or_else(OnboardingState::initial);

            match onboarding::advance(&state, &reply) {
                StepOutcome::Advanced { state, prompt } => {
                    // State lands before the prompt is shown, so a crash
                    // here never repeats a consumed answer.
                    db.update_onboarding_state(user.id, Some(&state))?;
                    println!("{prompt}");
                }
                StepOutcome::Retry { message } => println!("{message}"),
                StepOutcome::Commit { config, message } => {
                    activate(&db, &user, &config)?;
                    println!("{message}");
                }
            }
            Ok(())
        }
    }
}

/// Terminal wizard step: write the program, flip the user live, open Day 1.
fn activate(
    db: &Database,
    user: &User,
    config: &hardmode_core::program::ProgramConfig,
) -> CommandResult {
    let today = user.local_date(Utc::now());
    db.update_program(user.id, config)?;
    db.complete_onboarding(user.id, today)?;
    let fresh = db
        .get_user_by_id(user.id)?
        .ok_or("user vanished during activation")?;
    db.get_or_create_day_log(fresh.id, fresh.attempt, 1, today)?;
    tracing::info!(handle = %user.handle, "onboarding complete, day 1 started");
    Ok(())
}
