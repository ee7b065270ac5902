//! Linear, resumable onboarding wizard.
//!
//! The wizard is a pure state machine: the caller feeds it the persisted
//! `OnboardingState` plus the user's free-text reply and gets back either an
//! advanced state with the next prompt, a corrective re-prompt (state
//! untouched), or a commit carrying the finished `ProgramConfig`. Persisting
//! the returned state before sending the prompt is the caller's job; that
//! ordering is what makes a crash between persist and send harmless.

use serde::{Deserialize, Serialize};

use crate::program::{Book, DietMode, ProgramConfig};

/// Wizard steps in their fixed total order. Each step names the question it
/// asks; `next()` is the only way to move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Gender,
    Height,
    Weight,
    Age,
    BaseCalories,
    DietType,
    DietMode,
    ProteinTarget,
    WaterTarget,
    FirstBook,
    WorkoutOutdoor,
    WorkoutIndoor,
    ProgressPicTime,
    AlertTimes,
    Confirm,
}

impl Step {
    fn next(self) -> Option<Step> {
        use Step::*;
        Some(match self {
            Gender => Height,
            Height => Weight,
            Weight => Age,
            Age => BaseCalories,
            BaseCalories => DietType,
            DietType => DietMode,
            DietMode => ProteinTarget,
            ProteinTarget => WaterTarget,
            WaterTarget => FirstBook,
            FirstBook => WorkoutOutdoor,
            WorkoutOutdoor => WorkoutIndoor,
            WorkoutIndoor => ProgressPicTime,
            ProgressPicTime => AlertTimes,
            AlertTimes => Confirm,
            Confirm => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Typed partial-builder for the answers accumulated so far. Fields are only
/// ever filled in, never cleared, until the terminal commit copies them into
/// an immutable `ProgramConfig`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnboardingData {
    pub gender: Option<Gender>,
    pub height_inches: Option<u32>,
    pub weight_lbs: Option<u32>,
    pub age: Option<u32>,
    /// Mifflin-St Jeor estimate, computed once from height/weight/age.
    pub bmr: Option<u32>,
    pub base_calories: Option<u32>,
    pub diet_type: Option<String>,
    pub diet_mode: Option<DietMode>,
    pub protein_target: Option<u32>,
    pub water_target_oz: Option<u32>,
    pub books: Vec<Book>,
    pub workout_outdoor: Option<String>,
    pub workout_indoor: Option<String>,
    pub progress_pic_time: Option<String>,
    pub alert_times: Option<Vec<String>>,
}

impl OnboardingData {
    /// Assemble the final configuration at commit time.
    fn into_config(self) -> ProgramConfig {
        ProgramConfig {
            diet_type: self.diet_type,
            diet_mode: self.diet_mode.unwrap_or_default(),
            base_calories: self.base_calories.or(self.bmr),
            protein_target: self.protein_target,
            water_target_oz: self
                .water_target_oz
                .unwrap_or(crate::program::DEFAULT_WATER_TARGET_OZ),
            books: self.books,
            workout_outdoor: self.workout_outdoor,
            workout_indoor: self.workout_indoor,
            progress_pic_time: self.progress_pic_time,
            alert_times: self.alert_times.unwrap_or_else(default_alert_times),
            ..ProgramConfig::default()
        }
    }
}

/// Transient wizard position, held inline on the user record and cleared at
/// commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingState {
    pub step: Step,
    pub data: OnboardingData,
}

impl OnboardingState {
    pub fn initial() -> Self {
        Self {
            step: Step::Gender,
            data: OnboardingData::default(),
        }
    }

    /// The greeting + first question, sent when a user first appears.
    pub fn initial_prompt() -> String {
        "Ready to take on 75 days of zero excuses? Let's set up your program.\n\n\
         Are you male or female? (used for the calorie estimate)"
            .to_string()
    }
}

/// Result of feeding one reply to the wizard.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// Reply parsed; persist `state`, then send `prompt`.
    Advanced {
        state: OnboardingState,
        prompt: String,
    },
    /// Reply rejected; state unchanged, re-prompt with `message`.
    Retry { message: String },
    /// Terminal confirmation received. The caller activates the program:
    /// write the config, set day 1, clear the wizard state, open the log.
    Commit {
        config: ProgramConfig,
        message: String,
    },
}

/// Advance the wizard by one reply.
pub fn advance(state: &OnboardingState, reply: &str) -> StepOutcome {
    let reply = reply.trim();
    let mut data = state.data.clone();

    match state.step {
        Step::Gender => match parse_gender(reply) {
            Some(g) => {
                data.gender = Some(g);
                advanced(state.step, data)
            }
            None => retry("Please say \"male\" or \"female\"."),
        },
        Step::Height => match parse_height_inches(reply) {
            Some(inches) => {
                data.height_inches = Some(inches);
                advanced(state.step, data)
            }
            None => retry("I didn't catch that. Enter your height like \"5'10\" or \"178 cm\"."),
        },
        Step::Weight => match parse_weight_lbs(reply) {
            Some(lbs) => {
                data.weight_lbs = Some(lbs);
                advanced(state.step, data)
            }
            None => retry("Enter your weight like \"185 lbs\" or \"84 kg\"."),
        },
        Step::Age => match reply.parse::<u32>() {
            Ok(age) if (1..120).contains(&age) => {
                data.age = Some(age);
                let bmr = mifflin_st_jeor(
                    data.gender.unwrap_or(Gender::Male),
                    data.height_inches.unwrap_or(0),
                    data.weight_lbs.unwrap_or(0),
                    age,
                );
                data.bmr = Some(bmr);
                data.base_calories = Some(bmr);
                advanced(state.step, data)
            }
            _ => retry("Please enter a valid age."),
        },
        Step::BaseCalories => {
            let lower = reply.to_lowercase();
            if matches!(lower.as_str(), "yes" | "y" | "ok" | "sure" | "use this") {
                advanced(state.step, data)
            } else {
                match reply.parse::<u32>() {
                    Ok(base) if (1000..5000).contains(&base) => {
                        data.base_calories = Some(base);
                        advanced(state.step, data)
                    }
                    _ => retry(&format!(
                        "Enter \"yes\" to use {} cal, or a different number (e.g. \"2200\").",
                        data.bmr.unwrap_or(2000)
                    )),
                }
            }
        }
        Step::DietType => {
            if reply.is_empty() {
                return retry("Tell me your diet approach, e.g. \"keto\" or \"flexible\".");
            }
            data.diet_type = Some(normalize_diet_type(reply));
            advanced(state.step, data)
        }
        Step::DietMode => match parse_diet_mode(reply) {
            Some(mode) => {
                data.diet_mode = Some(mode);
                advanced(state.step, data)
            }
            None => retry(
                "Choose how I should hold you to it: \"confirm\", \"track\", or \"deficit\".",
            ),
        },
        Step::ProteinTarget => {
            if reply.eq_ignore_ascii_case("auto") {
                data.protein_target = Some(data.weight_lbs.unwrap_or(180));
                advanced(state.step, data)
            } else {
                match reply.parse::<u32>() {
                    Ok(g) if (1..500).contains(&g) => {
                        data.protein_target = Some(g);
                        advanced(state.step, data)
                    }
                    _ => retry("Enter a protein target in grams (e.g. \"180\") or \"auto\"."),
                }
            }
        }
        Step::WaterTarget => match reply.parse::<u32>() {
            Ok(oz) if (1..300).contains(&oz) => {
                data.water_target_oz = Some(oz);
                advanced(state.step, data)
            }
            _ => retry("Enter your water target in ounces (e.g. \"128\")."),
        },
        Step::FirstBook => match parse_book(reply) {
            Some(book) => {
                data.books = vec![book];
                advanced(state.step, data)
            }
            None => retry("Please enter a book title."),
        },
        Step::WorkoutOutdoor => {
            if reply.is_empty() {
                return retry("What outdoor workout will you typically do?");
            }
            data.workout_outdoor = Some(reply.to_string());
            advanced(state.step, data)
        }
        Step::WorkoutIndoor => {
            if reply.is_empty() {
                return retry("And your indoor/second workout?");
            }
            data.workout_indoor = Some(reply.to_string());
            advanced(state.step, data)
        }
        Step::ProgressPicTime => {
            if reply.is_empty() {
                return retry("When will you take the daily progress pic?");
            }
            data.progress_pic_time = Some(reply.to_string());
            advanced(state.step, data)
        }
        Step::AlertTimes => {
            let times = if reply.eq_ignore_ascii_case("default") {
                default_alert_times()
            } else {
                let parsed = parse_clock_times(reply);
                if parsed.is_empty() {
                    default_alert_times()
                } else {
                    parsed
                }
            };
            data.alert_times = Some(times);
            advanced(state.step, data)
        }
        Step::Confirm => {
            if reply.eq_ignore_ascii_case("start") {
                let message = commit_message(&data);
                StepOutcome::Commit {
                    config: data.into_config(),
                    message,
                }
            } else {
                retry(
                    "Send \"START\" when you're ready to begin, or tell me what you want to change.",
                )
            }
        }
    }
}

fn advanced(current: Step, data: OnboardingData) -> StepOutcome {
    // `next()` is only None for Confirm, and Confirm never lands here.
    let step = current.next().unwrap_or(Step::Confirm);
    let prompt = prompt_for(step, &data);
    StepOutcome::Advanced {
        state: OnboardingState { step, data },
        prompt,
    }
}

fn retry(message: &str) -> StepOutcome {
    StepOutcome::Retry {
        message: message.to_string(),
    }
}

/// Prompt for a step, interpolating previously collected data. Also used to
/// re-show the pending question when a user resumes a half-finished wizard.
pub fn prompt_for(step: Step, data: &OnboardingData) -> String {
    match step {
        Step::Gender => OnboardingState::initial_prompt(),
        Step::Height => "What's your height? (e.g. \"5'10\" or \"178 cm\")".to_string(),
        Step::Weight => "Got it. What's your current weight? (e.g. \"185 lbs\" or \"84 kg\")"
            .to_string(),
        Step::Age => "Perfect. How old are you?".to_string(),
        Step::BaseCalories => {
            let bmr = data.bmr.unwrap_or(2000);
            format!(
                "Based on your stats, your base metabolic rate is about {bmr} calories.\n\n\
                 That's what you burn just existing; workout calories get added on top.\n\
                 Example: {bmr} base + 800 burned = {} cal budget for the day.\n\n\
                 Use this as your base? Or send a different number to adjust.",
                bmr + 800
            )
        }
        Step::DietType => "What's your diet approach?\n\n\
             - Flexible - just hit your macros\n\
             - High protein - prioritize protein\n\
             - Keto - low carb, high fat\n\
             - Paleo - whole foods only\n\
             - Or type your own"
            .to_string(),
        Step::DietMode => "How strict should the diet accounting be?\n\n\
             - \"confirm\" - you just confirm you stuck to it each day\n\
             - \"track\" - log your meals, no calorie judgment\n\
             - \"deficit\" - log meals and stay under base + workout burn"
            .to_string(),
        Step::ProteinTarget => {
            let weight = data.weight_lbs.unwrap_or(180);
            let rec = (weight as f64 * 0.9).round() as u32;
            format!(
                "What's your daily protein target in grams?\n\n\
                 Recommendation: 0.8-1g per pound of body weight. For {weight} lbs that's {rec}g.\n\n\
                 Send a number, or \"auto\" to use 1g per lb."
            )
        }
        Step::WaterTarget => "What's your daily water target in ounces?\n\n\
             The original challenge requires a gallon (128 oz), but you can set your own goal.\n\n\
             Send a number like \"128\" or \"100\"."
            .to_string(),
        Step::FirstBook => "What book are you starting with? Send the title, optionally with the \
             total pages.\n\nExample: \"Atomic Habits, 320 pages\" or just \"Atomic Habits\""
            .to_string(),
        Step::WorkoutOutdoor => "What type of outdoor workout will you typically do?\n\n\
             Examples: Running, Walking, Cycling, Hiking"
            .to_string(),
        Step::WorkoutIndoor => "And for your indoor/second workout?\n\n\
             Examples: Gym/weights, Home workout, Yoga, Swimming"
            .to_string(),
        Step::ProgressPicTime => "When will you take your daily progress pic? Send a time.\n\n\
             Examples: \"7am\", \"after workout 1\", \"8:30pm\""
            .to_string(),
        Step::AlertTimes => "Last thing: when should I remind you if your day isn't complete?\n\n\
             Default is 7pm, 8pm, 9pm, 10pm. Customize or just say \"default\"."
            .to_string(),
        Step::Confirm => summary_prompt(data),
    }
}

/// The pre-commit program summary shown at the terminal step.
fn summary_prompt(data: &OnboardingData) -> String {
    let height = data
        .height_inches
        .map(|i| format!("{}'{}\"", i / 12, i % 12))
        .unwrap_or_else(|| "?".to_string());
    let book = data
        .books
        .first()
        .map(|b| b.title.as_str())
        .unwrap_or("Not set");
    let base = data.base_calories.or(data.bmr).unwrap_or(2000);
    format!(
        "Here's your program:\n\n\
         Stats\n\
         - Height: {height}\n\
         - Weight: {} lbs\n\
         - Base calories: {base} cal\n\n\
         Nutrition\n\
         - Diet: {} ({} mode)\n\
         - Daily budget: base ({base}) + workout burn\n\
         - Protein: {}g\n\
         - Water: {} oz\n\n\
         Reading: {book}\n\n\
         Workouts\n\
         - Outdoor: {}\n\
         - Indoor: {}\n\n\
         Progress pic: {}\n\
         Alerts: {}\n\n\
         Ready to start? Send \"START\" to begin Day 1!",
        data.weight_lbs.unwrap_or(0),
        data.diet_type.as_deref().unwrap_or("flexible"),
        data.diet_mode.unwrap_or_default(),
        data.protein_target.unwrap_or(0),
        data.water_target_oz.unwrap_or(128),
        data.workout_outdoor.as_deref().unwrap_or("?"),
        data.workout_indoor.as_deref().unwrap_or("?"),
        data.progress_pic_time.as_deref().unwrap_or("?"),
        data.alert_times
            .as_deref()
            .unwrap_or(&[])
            .join(", "),
    )
}

fn commit_message(data: &OnboardingData) -> String {
    format!(
        "You're all set! Day 1 starts now. Let's go!\n\n\
         Today's tasks:\n\
         - Workout 1 (45 min, outdoor)\n\
         - Workout 2 (45 min, any)\n\
         - Follow your diet (base {} + workout burn)\n\
         - Water ({} oz)\n\
         - Read 10 pages\n\
         - Progress pic",
        data.base_calories.or(data.bmr).unwrap_or(2000),
        data.water_target_oz.unwrap_or(128),
    )
}

// ── Parsers ──────────────────────────────────────────────────────────

fn parse_gender(reply: &str) -> Option<Gender> {
    match reply.to_lowercase().as_str() {
        "male" | "m" | "man" => Some(Gender::Male),
        "female" | "f" | "woman" => Some(Gender::Female),
        _ => None,
    }
}

/// Accepts "5'10", "5' 10", "5 10", "70", or metric "178 cm".
fn parse_height_inches(reply: &str) -> Option<u32> {
    let lower = reply.to_lowercase();
    let numbers = number_groups(&lower);
    if numbers.is_empty() {
        return None;
    }
    if lower.contains("cm") {
        let cm = numbers[0];
        let inches = (cm as f64 / 2.54).round() as u32;
        return (36..=96).contains(&inches).then_some(inches);
    }
    let inches = match numbers.as_slice() {
        [feet] if *feet <= 8 => feet * 12,
        [whole] => *whole, // already in inches
        [feet, rest, ..] => feet * 12 + rest,
        [] => return None,
    };
    (36..=96).contains(&inches).then_some(inches)
}

/// Accepts "185", "185 lbs", "84 kg".
fn parse_weight_lbs(reply: &str) -> Option<u32> {
    let lower = reply.to_lowercase();
    let numbers = number_groups(&lower);
    let value = *numbers.first()?;
    let lbs = if lower.contains("kg") {
        (value as f64 * 2.205).round() as u32
    } else {
        value
    };
    (50..=700).contains(&lbs).then_some(lbs)
}

/// "Atomic Habits, 320 pages" or just "Atomic Habits".
fn parse_book(reply: &str) -> Option<Book> {
    if reply.is_empty() {
        return None;
    }
    if let Some((title, tail)) = reply.rsplit_once(',') {
        let tail_lower = tail.to_lowercase();
        if tail_lower.contains("page") {
            let pages = number_groups(&tail_lower).first().copied();
            let title = title.trim();
            if !title.is_empty() {
                return Some(Book::new(title, pages));
            }
        }
    }
    Some(Book::new(reply, None))
}

fn parse_diet_mode(reply: &str) -> Option<DietMode> {
    let lower = reply.to_lowercase();
    if lower.contains("deficit") || lower.contains("cut") {
        Some(DietMode::Deficit)
    } else if lower.contains("track") || lower.contains("log") {
        Some(DietMode::Track)
    } else if lower.contains("confirm") || lower.contains("honor") {
        Some(DietMode::Confirm)
    } else {
        None
    }
}

fn normalize_diet_type(reply: &str) -> String {
    match reply.to_lowercase().as_str() {
        "high protein" | "highprotein" => "high_protein".to_string(),
        known @ ("flexible" | "keto" | "paleo" | "carnivore" | "vegan" | "vegetarian") => {
            known.to_string()
        }
        _ => reply.to_string(),
    }
}

/// Extract "7pm", "8:30pm", "19:00"-style times as zero-padded "HH:MM".
fn parse_clock_times(text: &str) -> Vec<String> {
    let mut times = Vec::new();
    for token in text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        if let Some(time) = parse_clock_token(token) {
            times.push(time);
        }
    }
    times
}

fn parse_clock_token(token: &str) -> Option<String> {
    let lower = token.to_lowercase();
    let (clock, meridiem) = if let Some(stripped) = lower.strip_suffix("pm") {
        (stripped, Some("pm"))
    } else if let Some(stripped) = lower.strip_suffix("am") {
        (stripped, Some("am"))
    } else {
        (lower.as_str(), None)
    };
    let (hour_str, minute_str) = match clock.split_once(':') {
        Some((h, m)) => (h, m),
        None => (clock, "00"),
    };
    let mut hour: u32 = hour_str.parse().ok()?;
    let minute: u32 = minute_str.parse().ok()?;
    if minute > 59 {
        return None;
    }
    match meridiem {
        Some("pm") if hour < 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }
    if hour > 23 {
        return None;
    }
    Some(format!("{hour:02}:{minute:02}"))
}

fn default_alert_times() -> Vec<String> {
    vec![
        "19:00".to_string(),
        "20:00".to_string(),
        "21:00".to_string(),
        "22:00".to_string(),
    ]
}

/// Mifflin-St Jeor resting metabolic estimate.
fn mifflin_st_jeor(gender: Gender, height_inches: u32, weight_lbs: u32, age: u32) -> u32 {
    let weight_kg = weight_lbs as f64 / 2.205;
    let height_cm = height_inches as f64 * 2.54;
    let offset = match gender {
        Gender::Male => 5.0,
        Gender::Female => -161.0,
    };
    (10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64 + offset).round() as u32
}

/// Leading runs of digits in a string, in order.
fn number_groups(text: &str) -> Vec<u32> {
    let mut groups = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if !current.is_empty() {
            if let Ok(n) = current.parse() {
                groups.push(n);
            }
            current.clear();
        }
    }
    if let Ok(n) = current.parse() {
        groups.push(n);
    }
    groups
}
