//! Human-readable progress reports and lifecycle notices.
//!
//! All builders are pure string formatters over already-fetched records, so
//! the CLI, the schedulers, and tests share identical wording.

use crate::completion::{self, DayStatus};
use crate::daylog::DayLog;
use crate::program::{DietMode, ProgramConfig};
use crate::user::User;

/// Day count behind each milestone notice.
const MILESTONES: &[(u32, &str)] = &[
    (25, "1/3 of the way there!"),
    (38, "Halfway point!"),
    (50, "2/3 complete. The final stretch begins."),
    (60, "15 days left. You can see the finish line."),
    (70, "5 days left. Don't let up now."),
];

/// Today's calorie budget: base plus everything burned in logged workouts.
pub fn calorie_budget(program: &ProgramConfig, log: &DayLog) -> u32 {
    program.base_calories_or_default().saturating_add(log.workout_burn())
}

pub fn milestone_line(day: u32) -> Option<&'static str> {
    MILESTONES
        .iter()
        .find(|(d, _)| *d == day)
        .map(|(_, line)| *line)
}

fn mark(done: bool) -> &'static str {
    if done {
        "[x]"
    } else {
        "[ ]"
    }
}

fn diet_line(program: &ProgramConfig, log: &DayLog, budget: u32) -> String {
    match program.diet_mode {
        DietMode::Confirm => format!("{} Follow diet ({})", mark(log.diet_confirmed),
            program.diet_type.as_deref().unwrap_or("your diet")),
        DietMode::Track => format!(
            "{} Log food ({} cal so far)",
            mark(!log.meals.is_empty()),
            log.calories_consumed()
        ),
        DietMode::Deficit => format!(
            "{} Diet ({}/{} cal)",
            mark(log.calories_consumed() <= budget),
            log.calories_consumed(),
            budget
        ),
    }
}

/// Full checklist for an in-progress day, with a missing-task footer.
pub fn format_status(
    user: &User,
    program: &ProgramConfig,
    log: &DayLog,
    challenge_days: u32,
) -> String {
    let budget = calorie_budget(program, log);
    let status = completion::evaluate(
        log,
        program.water_target_oz,
        program.diet_mode,
        program.base_calories,
    );

    let mut out = format!("Day {} of {}\n\n", user.current_day, challenge_days);
    out.push_str(&format!(
        "{} Workout 1 (outdoor{})\n",
        mark(log.outdoor_workout.as_ref().is_some_and(|w| w.done)),
        log.outdoor_workout
            .as_ref()
            .and_then(|w| w.calories_burned)
            .map(|c| format!(", {c} cal"))
            .unwrap_or_default(),
    ));
    out.push_str(&format!(
        "{} Workout 2{}\n",
        mark(log.indoor_workout.as_ref().is_some_and(|w| w.done)),
        log.indoor_workout
            .as_ref()
            .and_then(|w| w.calories_burned)
            .map(|c| format!(" ({c} cal)"))
            .unwrap_or_default(),
    ));
    out.push_str(&format!(
        "{} Read 10 pages{}\n",
        mark(log.reading.as_ref().is_some_and(|r| r.done)),
        program
            .current_book()
            .map(|b| format!(" ({b})"))
            .unwrap_or_default(),
    ));
    out.push_str(&format!(
        "{} Water ({}/{} oz)\n",
        mark(log.water_oz() >= program.water_target_oz),
        log.water_oz(),
        program.water_target_oz,
    ));
    out.push_str(&format!(
        "{} Progress pic\n",
        mark(log.progress_pic.as_ref().is_some_and(|p| p.done)),
    ));
    out.push_str(&diet_line(program, log, budget));
    out.push('\n');

    if program.diet_mode == DietMode::Deficit {
        out.push_str(&format!(
            "\nCalorie budget: {} base + {} burned\n",
            program.base_calories_or_default(),
            log.workout_burn(),
        ));
    }

    if status.complete {
        out.push_str("\nDay complete. Great work.");
    } else {
        out.push_str(&format!("\nStill need: {}", status.missing_summary()));
    }
    out
}

/// Blank checklist for a freshly started day.
pub fn format_checklist(program: &ProgramConfig, budget: u32) -> String {
    let diet = match program.diet_mode {
        DietMode::Confirm => format!(
            "- [ ] Follow diet ({})",
            program.diet_type.as_deref().unwrap_or("your diet")
        ),
        DietMode::Track => "- [ ] Log food".to_string(),
        DietMode::Deficit => format!("- [ ] Diet ({budget} cal budget)"),
    };
    format!(
        "Today's checklist:\n\
         - [ ] Workout 1 (outdoor)\n\
         - [ ] Workout 2\n\
         {diet}\n\
         - [ ] Water ({} oz)\n\
         - [ ] Read 10 pages\n\
         - [ ] Progress pic",
        program.water_target_oz,
    )
}

/// Morning notice on day advance. `next_day` is the day just started.
pub fn format_new_day(next_day: u32, program: &ProgramConfig, challenge_days: u32) -> String {
    let streak = next_day - 1;
    let milestone = milestone_line(next_day)
        .map(|m| format!("\n\n{m}"))
        .unwrap_or_default();
    format!(
        "Day {next_day} of {challenge_days}\n\n\
         Yesterday: complete\n\
         Streak: {streak} days\n\
         Remaining: {} days{milestone}\n\n{}",
        challenge_days - next_day,
        format_checklist(program, program.base_calories_or_default()),
    )
}

/// Reset notice. Day 1 failures restart in place, so the wording softens.
/// An empty missing list means no log existed at all for the day.
pub fn format_reset(previous_day: u32, status: &DayStatus) -> String {
    let missing = if status.missing.is_empty() {
        "No activity logged".to_string()
    } else {
        status.missing_summary()
    };
    if previous_day == 1 {
        format!(
            "Day 1 incomplete. Missing: {missing}.\n\n\
             You're still on Day 1. Today is a fresh start. Let's go."
        )
    } else {
        format!(
            "Day {previous_day} incomplete. Missing: {missing}.\n\n\
             Resetting to Day 1. That's the rule. No exceptions, no modifications.\n\n\
             This is what builds mental toughness. You've got this. Day 1 starts now."
        )
    }
}

/// One-time notice when a day's last task lands.
pub fn format_day_complete(day: u32, challenge_days: u32) -> String {
    if day >= challenge_days {
        format!(
            "YOU DID IT! {challenge_days} days complete!\n\n\
             Incredible discipline. You've proven to yourself what you're capable of."
        )
    } else {
        format!("Day {day} complete!\n\nSee you tomorrow for Day {}.", day + 1)
    }
}
