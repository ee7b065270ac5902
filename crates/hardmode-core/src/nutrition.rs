//! Nutrition estimation types and text formatting.
//!
//! [`ParsedFood`] is the wire contract returned by a
//! [`NutritionEstimator`](crate::intent::NutritionEstimator). The formatting
//! helpers here are pure and take every input explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::daylog::Meal;

/// One recognized food item with estimated macros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    pub description: String,
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
}

/// Estimator output for a single free-text food entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFood {
    pub items: Vec<FoodItem>,
    pub total_calories: u32,
    pub total_protein: u32,
    pub total_carbs: u32,
    pub total_fat: u32,
}

impl ParsedFood {
    /// Build from items, computing the totals.
    pub fn from_items(items: Vec<FoodItem>) -> Self {
        let total_calories = items.iter().map(|i| i.calories).sum();
        let total_protein = items.iter().map(|i| i.protein).sum();
        let total_carbs = items.iter().map(|i| i.carbs).sum();
        let total_fat = items.iter().map(|i| i.fat).sum();
        Self {
            items,
            total_calories,
            total_protein,
            total_carbs,
            total_fat,
        }
    }
}

/// Collapse an estimate into one [`Meal`] entry keyed by the user's own
/// description, so corrections target what the user actually said.
pub fn meal_from_parsed(parsed: &ParsedFood, description: &str, at: DateTime<Utc>) -> Meal {
    Meal {
        description: description.to_string(),
        calories: parsed.total_calories,
        protein: parsed.total_protein,
        carbs: parsed.total_carbs,
        fat: parsed.total_fat,
        logged_at: at,
    }
}

/// Monospace per-item breakdown with a TOTAL row when there is more than one
/// item.
pub fn format_meal_table(parsed: &ParsedFood) -> String {
    let mut lines = Vec::new();
    lines.push(format!("{:<28} {:>5} {:>4} {:>4} {:>4}", "Food", "Cal", "P", "C", "F"));
    lines.push("-".repeat(50));

    for item in &parsed.items {
        let name: String = item.description.chars().take(28).collect();
        lines.push(format!(
            "{:<28} {:>5} {:>4} {:>4} {:>4}",
            name,
            item.calories,
            format!("{}g", item.protein),
            format!("{}g", item.carbs),
            format!("{}g", item.fat),
        ));
    }

    if parsed.items.len() > 1 {
        lines.push("-".repeat(50));
        lines.push(format!(
            "{:<28} {:>5} {:>4} {:>4} {:>4}",
            "TOTAL",
            parsed.total_calories,
            format!("{}g", parsed.total_protein),
            format!("{}g", parsed.total_carbs),
            format!("{}g", parsed.total_fat),
        ));
    }

    lines.join("\n")
}

/// Running daily summary against the day's calorie budget, with a note when
/// intake is far under target.
pub fn format_daily_summary(meals: &[Meal], calorie_target: u32, protein_target: u32) -> String {
    let total_cals: u32 = meals.iter().map(|m| m.calories).sum();
    let total_protein: u32 = meals.iter().map(|m| m.protein).sum();

    let mut lines = Vec::new();
    lines.push(format!("Today: {total_cals} / {calorie_target} cal"));

    if total_cals < calorie_target {
        lines.push(format!(
            "Remaining: {} cal | Protein: {total_protein} / {protein_target}g",
            calorie_target - total_cals
        ));
    } else if total_cals == calorie_target {
        lines.push(format!(
            "Status: at calorie target | Protein: {total_protein} / {protein_target}g"
        ));
    } else {
        lines.push(format!(
            "OVER by {} cal | Protein: {total_protein} / {protein_target}g",
            total_cals - calorie_target
        ));
    }

    // 70 percent of target is the under-eating threshold
    if total_cals > 0 && total_cals * 10 < calorie_target * 7 {
        lines.push(
            "Note: you're quite a bit under target. Make sure you're eating enough to sustain your workouts."
                .to_string(),
        );
    }

    lines.join("\n")
}
