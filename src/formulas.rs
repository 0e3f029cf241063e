use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, MetricsResult};
use crate::models::{Profile, Sex};

pub const MAX_WEIGHT_KG: f64 = 550.0;
pub const MAX_HEIGHT_CM: f64 = 250.0;
pub const MAX_AGE_YEARS: u32 = 110;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn label(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroSplit {
    pub protein: u8,
    pub carbs: u8,
    pub fat: u8,
}

/// Rounds half toward positive infinity, matching how display percentages
/// were historically rounded (-2.5 becomes -2, 2.5 becomes 3).
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Body mass index from kilograms and centimeters, two decimals.
pub fn bmi(weight_kg: f64, height_cm: f64) -> MetricsResult<f64> {
    if !(weight_kg > 0.0) {
        return Err(MetricsError::InvalidInput(format!(
            "weight must be positive, got {weight_kg}"
        )));
    }
    if !(height_cm > 0.0) {
        return Err(MetricsError::InvalidInput(format!(
            "height must be positive, got {height_cm}"
        )));
    }

    let height_m = height_cm / 100.0;
    Ok(round2(weight_kg / (height_m * height_m)))
}

/// Basal metabolic rate (Mifflin-St Jeor), kcal/day, two decimals.
pub fn bmr(weight_kg: f64, height_cm: f64, age_years: u32, sex: Sex) -> MetricsResult<f64> {
    if !(weight_kg > 0.0) || !(height_cm > 0.0) || age_years == 0 {
        return Err(MetricsError::InvalidInput(format!(
            "inputs must be positive, got {weight_kg} kg, {height_cm} cm, {age_years} y"
        )));
    }

    let offset = match sex {
        Sex::Male => 5.0,
        Sex::Female => -161.0,
    };
    Ok(round2(
        10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age_years) + offset,
    ))
}

/// The Normal and Overweight upper bounds are exclusive at 24.9 and 29.9, so
/// `[24.9, 25)` and `[29.9, 30)` fall through to Obese.
pub fn bmi_category(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 24.9 {
        BmiCategory::Normal
    } else if (25.0..29.9).contains(&bmi) {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

/// Progress toward `goal` as a whole percentage clamped to `0..=100`.
pub fn percent_of_goal(current: f64, goal: f64) -> MetricsResult<u8> {
    if goal == 0.0 {
        return Err(MetricsError::DivisionUndefined);
    }
    let percent = round_half_up(current / goal * 100.0).clamp(0.0, 100.0);
    Ok(percent as u8)
}

/// Same as [`percent_of_goal`], with an undefined goal shown as 0%.
pub fn percent_of_goal_or_zero(current: f64, goal: f64) -> u8 {
    percent_of_goal(current, goal).unwrap_or(0)
}

pub fn macro_split(protein_g: f64, carbs_g: f64, fat_g: f64) -> MacroSplit {
    let total = protein_g + carbs_g + fat_g;
    if total <= 0.0 {
        return MacroSplit {
            protein: 0,
            carbs: 0,
            fat: 0,
        };
    }

    let share = |grams: f64| round_half_up(grams / total * 100.0).clamp(0.0, 100.0) as u8;
    MacroSplit {
        protein: share(protein_g),
        carbs: share(carbs_g),
        fat: share(fat_g),
    }
}

pub fn validate_profile(profile: &Profile) -> MetricsResult<()> {
    if !(profile.weight_kg > 0.0 && profile.weight_kg <= MAX_WEIGHT_KG) {
        return Err(MetricsError::InvalidInput(format!(
            "weight must be within (0, {MAX_WEIGHT_KG}] kg, got {}",
            profile.weight_kg
        )));
    }
    if !(profile.height_cm > 0.0 && profile.height_cm <= MAX_HEIGHT_CM) {
        return Err(MetricsError::InvalidInput(format!(
            "height must be within (0, {MAX_HEIGHT_CM}] cm, got {}",
            profile.height_cm
        )));
    }
    if profile.age_years == 0 || profile.age_years > MAX_AGE_YEARS {
        return Err(MetricsError::InvalidInput(format!(
            "age must be within (0, {MAX_AGE_YEARS}] years, got {}",
            profile.age_years
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn profile(weight_kg: f64, height_cm: f64, age_years: u32) -> Profile {
        Profile {
            user_id: Uuid::new_v4(),
            full_name: "Maya Chen".to_string(),
            email: "maya@example.com".to_string(),
            height_cm,
            weight_kg,
            age_years,
            sex: Sex::Female,
        }
    }

    #[test]
    fn bmi_rounds_to_two_decimals() {
        let value = bmi(70.0, 175.0).unwrap();
        assert_eq!(value, 22.86);
        assert_eq!(bmi_category(value), BmiCategory::Normal);
    }

    #[test]
    fn bmi_rejects_non_positive_inputs() {
        assert!(matches!(bmi(70.0, 0.0), Err(MetricsError::InvalidInput(_))));
        assert!(matches!(bmi(-1.0, 175.0), Err(MetricsError::InvalidInput(_))));
    }

    #[test]
    fn bmr_follows_mifflin_st_jeor() {
        assert_eq!(bmr(70.0, 175.0, 28, Sex::Male).unwrap(), 1658.75);
        assert_eq!(bmr(70.0, 175.0, 28, Sex::Female).unwrap(), 1492.75);
        let gap = bmr(70.0, 175.0, 28, Sex::Male).unwrap()
            - bmr(70.0, 175.0, 28, Sex::Female).unwrap();
        assert_eq!(gap, 166.0);
        assert!(bmr(70.0, 175.0, 0, Sex::Male).is_err());
    }

    #[test]
    fn bmi_categories_keep_the_exclusive_upper_bounds() {
        assert_eq!(bmi_category(18.49), BmiCategory::Underweight);
        assert_eq!(bmi_category(18.5), BmiCategory::Normal);
        assert_eq!(bmi_category(24.89), BmiCategory::Normal);
        assert_eq!(bmi_category(25.0), BmiCategory::Overweight);
        assert_eq!(bmi_category(29.89), BmiCategory::Overweight);
        assert_eq!(bmi_category(29.9), BmiCategory::Obese);
        assert_eq!(bmi_category(30.0), BmiCategory::Obese);
    }

    #[test]
    fn percent_of_goal_clamps() {
        assert_eq!(percent_of_goal(0.0, 2500.0).unwrap(), 0);
        assert_eq!(percent_of_goal(2500.0, 2500.0).unwrap(), 100);
        assert_eq!(percent_of_goal(3000.0, 2500.0).unwrap(), 100);
        assert_eq!(percent_of_goal(1700.0, 2500.0).unwrap(), 68);
        assert_eq!(percent_of_goal(-50.0, 2500.0).unwrap(), 0);
    }

    #[test]
    fn zero_goal_is_undefined_and_shown_as_zero() {
        assert!(matches!(
            percent_of_goal(100.0, 0.0),
            Err(MetricsError::DivisionUndefined)
        ));
        assert_eq!(percent_of_goal_or_zero(100.0, 0.0), 0);
    }

    #[test]
    fn macro_split_rounds_each_share() {
        let split = macro_split(120.0, 280.0, 75.0);
        assert_eq!(split.protein, 25);
        assert_eq!(split.carbs, 59);
        assert_eq!(split.fat, 16);
        assert_eq!(macro_split(0.0, 0.0, 0.0).protein, 0);
    }

    #[test]
    fn round_half_up_breaks_ties_upward() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
    }

    #[test]
    fn profile_validation_enforces_limits() {
        assert!(validate_profile(&profile(70.0, 175.0, 28)).is_ok());
        assert!(validate_profile(&profile(600.0, 175.0, 28)).is_err());
        assert!(validate_profile(&profile(70.0, 260.0, 28)).is_err());
        assert!(validate_profile(&profile(70.0, 175.0, 111)).is_err());
        assert!(validate_profile(&profile(70.0, 175.0, 0)).is_err());
    }
}
