use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MetricsError;

/// One dated sample feeding an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatedEntry {
    pub date: NaiveDate,
    pub value: f64,
}

impl DatedEntry {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    Calories,
    Water,
    ActivityMinutes,
    Weight,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Calories,
        MetricKind::Water,
        MetricKind::ActivityMinutes,
        MetricKind::Weight,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MetricKind::Calories => "Calories",
            MetricKind::Water => "Water",
            MetricKind::ActivityMinutes => "Activity",
            MetricKind::Weight => "Weight",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            MetricKind::Calories => "kcal",
            MetricKind::Water => "ml",
            MetricKind::ActivityMinutes => "min",
            MetricKind::Weight => "kg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalSpec {
    pub target: f64,
    pub metric: MetricKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub average_calories: f64,
    pub average_water: f64,
    pub average_activity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionBucket {
    pub label: String,
    pub raw_total: f64,
    pub percentage: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub average: f64,
    pub streak_days: u32,
    pub percent_change: i64,
}

/// One row of the daily metrics log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetric {
    pub date: NaiveDate,
    pub calories: f64,
    pub water: f64,
    pub activity: f64,
    pub weight: f64,
}

impl DailyMetric {
    pub fn value(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Calories => self.calories,
            MetricKind::Water => self.water,
            MetricKind::ActivityMinutes => self.activity,
            MetricKind::Weight => self.weight,
        }
    }

    pub fn entry(&self, kind: MetricKind) -> DatedEntry {
        DatedEntry::new(self.date, self.value(kind))
    }
}

pub fn channel(records: &[DailyMetric], kind: MetricKind) -> Vec<DatedEntry> {
    records.iter().map(|record| record.entry(kind)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub date: NaiveDate,
    pub activity_type: String,
    pub duration_minutes: f64,
    pub calories_burnt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrationRecord {
    pub date: NaiveDate,
    pub water_consumed: f64,
    pub water_goal: f64,
}

impl HydrationRecord {
    pub fn entry(&self) -> DatedEntry {
        DatedEntry::new(self.date, self.water_consumed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealSlot {
    pub fn label(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
            MealSlot::Snack => "Snack",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label().to_lowercase())
    }
}

impl FromStr for MealSlot {
    type Err = MetricsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealSlot::Breakfast),
            "lunch" => Ok(MealSlot::Lunch),
            "dinner" => Ok(MealSlot::Dinner),
            "snack" => Ok(MealSlot::Snack),
            other => Err(MetricsError::InvalidInput(format!("unknown meal slot '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    pub date: NaiveDate,
    pub slot: MealSlot,
    pub dish: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub is_vegetarian: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => f.write_str("male"),
            Sex::Female => f.write_str("female"),
        }
    }
}

impl FromStr for Sex {
    type Err = MetricsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            other => Err(MetricsError::InvalidInput(format!("unknown sex '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age_years: u32,
    pub sex: Sex,
}

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The `days` calendar days ending at `end`, inclusive.
    pub fn last_days(end: NaiveDate, days: i64) -> Self {
        Self {
            start: end - Duration::days(days.max(1) - 1),
            end,
        }
    }

    pub fn week_from(start: NaiveDate) -> Self {
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangePreset {
    Week,
    Month,
    Year,
}

impl RangePreset {
    pub fn days(self) -> i64 {
        match self {
            RangePreset::Week => 7,
            RangePreset::Month => 30,
            RangePreset::Year => 365,
        }
    }

    pub fn ending(self, today: NaiveDate) -> DateRange {
        DateRange::last_days(today, self.days())
    }
}
