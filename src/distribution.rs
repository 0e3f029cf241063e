use crate::formulas::round_half_up;
use crate::models::{ActivityRecord, DistributionBucket, MealRecord};

pub const PLANT_PROTEIN: &str = "Plant";
pub const ANIMAL_PROTEIN: &str = "Animal";

/// Groups amounts by label and reports each group's share of the grand total.
///
/// Buckets come back in first-seen label order so chart colors stay stable.
/// Each percentage is rounded on its own, so the sum may drift from 100 by up
/// to `bucket_count - 1`.
pub fn distribute<'a, I>(items: I) -> Vec<DistributionBucket>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut totals: Vec<(String, f64)> = Vec::new();

    for (label, amount) in items {
        match totals.iter_mut().find(|(existing, _)| existing.as_str() == label) {
            Some((_, total)) => *total += amount,
            None => totals.push((label.to_string(), amount)),
        }
    }

    let grand_total: f64 = totals.iter().map(|(_, total)| total).sum();
    if totals.is_empty() || grand_total == 0.0 {
        return Vec::new();
    }

    totals
        .into_iter()
        .map(|(label, raw_total)| DistributionBucket {
            percentage: round_half_up(raw_total / grand_total * 100.0).clamp(0.0, 100.0) as u8,
            label,
            raw_total,
        })
        .collect()
}

/// Calories burnt per activity type.
pub fn activities_by_type(activities: &[ActivityRecord]) -> Vec<DistributionBucket> {
    distribute(
        activities
            .iter()
            .map(|activity| (activity.activity_type.as_str(), activity.calories_burnt)),
    )
}

/// Calories per meal slot.
pub fn meals_by_slot(meals: &[MealRecord]) -> Vec<DistributionBucket> {
    distribute(meals.iter().map(|meal| (meal.slot.label(), meal.calories)))
}

/// Protein grams split into plant (vegetarian dishes) and animal sources.
pub fn protein_by_source(meals: &[MealRecord]) -> Vec<DistributionBucket> {
    distribute(meals.iter().map(|meal| {
        let source = if meal.is_vegetarian {
            PLANT_PROTEIN
        } else {
            ANIMAL_PROTEIN
        };
        (source, meal.protein)
    }))
}
