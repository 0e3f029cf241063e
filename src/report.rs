use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::distribution::{activities_by_type, meals_by_slot, protein_by_source};
use crate::error::MetricsResult;
use crate::formulas::{bmi, bmi_category, bmr, macro_split, BmiCategory, MacroSplit};
use crate::goals::{evaluate, GoalProgress, GoalSet};
use crate::models::{
    channel, DateRange, DatedEntry, DistributionBucket, HydrationRecord, MetricKind, Profile,
    RangePreset, TrendResult, WeeklySummary,
};
use crate::rollup::{aggregate, RangeAggregate};
use crate::store::MetricsStore;
use crate::trend::{analyze, consistency_score, format_change, hydration_consistency};

const WEEKLY_SUMMARY_LIMIT: i64 = 8;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub bmi: f64,
    pub category: BmiCategory,
    pub bmr: f64,
}

impl HealthSnapshot {
    pub fn from_profile(profile: &Profile) -> MetricsResult<Self> {
        let value = bmi(profile.weight_kg, profile.height_cm)?;
        Ok(Self {
            bmi: value,
            category: bmi_category(value),
            bmr: bmr(profile.weight_kg, profile.height_cm, profile.age_years, profile.sex)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricView {
    pub metric: MetricKind,
    pub today: f64,
    pub goal: f64,
    pub progress: GoalProgress,
    pub trend: TrendResult,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub user_id: Uuid,
    pub today: NaiveDate,
    pub range: DateRange,
    pub health: Option<HealthSnapshot>,
    pub goals: GoalSet,
    pub metrics: Vec<MetricView>,
    pub hydration_score: u8,
    pub aggregate: RangeAggregate,
    pub activity_mix: Vec<DistributionBucket>,
    pub meal_mix: Vec<DistributionBucket>,
    pub protein_sources: Vec<DistributionBucket>,
    pub macros: MacroSplit,
    pub weekly: Vec<WeeklySummary>,
}

fn total_on(entries: &[DatedEntry], day: NaiveDate) -> f64 {
    entries
        .iter()
        .filter(|entry| entry.date == day)
        .map(|entry| entry.value)
        .sum()
}

fn metric_view(
    metric: MetricKind,
    entries: &[DatedEntry],
    goal: f64,
    today: NaiveDate,
) -> MetricView {
    let today_total = total_on(entries, today);
    MetricView {
        metric,
        today: today_total,
        goal,
        progress: evaluate(today_total, goal),
        trend: analyze(entries, goal, today),
    }
}

/// Reads everything the dashboard shows for one user and derives its views.
pub async fn build_dashboard<S>(
    store: &S,
    user_id: Uuid,
    today: NaiveDate,
    preset: RangePreset,
) -> MetricsResult<Dashboard>
where
    S: MetricsStore + ?Sized,
{
    let range = preset.ending(today);
    // Trends compare two whole weeks regardless of the chosen range.
    let trend_range = DateRange::last_days(today, 14);
    let read_range = DateRange::new(range.start.min(trend_range.start), today);

    let daily = store.fetch_daily_metrics(user_id, read_range).await?;
    let hydration = store.fetch_hydration(user_id, read_range).await?;
    let activities = store.fetch_activities(user_id, range).await?;
    let meals = store.fetch_meals(user_id, range).await?;
    let goals = store.fetch_goals(user_id).await?;
    let weekly = store.fetch_weekly_summaries(user_id, WEEKLY_SUMMARY_LIMIT).await?;

    let health = match store.fetch_profile(user_id).await? {
        Some(profile) => Some(HealthSnapshot::from_profile(&profile)?),
        None => None,
    };

    debug!(
        %user_id,
        daily = daily.len(),
        hydration = hydration.len(),
        activities = activities.len(),
        meals = meals.len(),
        "dashboard inputs loaded"
    );

    // Hydration logs are the primary water source; daily metrics fill in when absent.
    let water: Vec<DatedEntry> = if hydration.is_empty() {
        channel(&daily, MetricKind::Water)
    } else {
        hydration.iter().map(|record| record.entry()).collect()
    };

    let metrics = vec![
        metric_view(
            MetricKind::Calories,
            &channel(&daily, MetricKind::Calories),
            goals.calorie_goal,
            today,
        ),
        metric_view(MetricKind::Water, &water, goals.water_goal, today),
        metric_view(
            MetricKind::ActivityMinutes,
            &channel(&daily, MetricKind::ActivityMinutes),
            goals.activity_goal,
            today,
        ),
    ];

    let last_week = DateRange::last_days(today, 7);
    let hydration_score = if hydration.is_empty() {
        let week_water: Vec<DatedEntry> = water
            .iter()
            .filter(|entry| last_week.contains(entry.date))
            .copied()
            .collect();
        consistency_score(&week_water, goals.water_goal)
    } else {
        let week_hydration: Vec<HydrationRecord> = hydration
            .iter()
            .filter(|record| last_week.contains(record.date))
            .cloned()
            .collect();
        hydration_consistency(&week_hydration)
    };

    let in_range: Vec<_> = daily
        .iter()
        .filter(|record| range.contains(record.date))
        .cloned()
        .collect();

    let (protein, carbs, fat) = meals.iter().fold((0.0, 0.0, 0.0), |(p, c, f), meal| {
        (p + meal.protein, c + meal.carbs, f + meal.fat)
    });

    Ok(Dashboard {
        user_id,
        today,
        range,
        health,
        goals,
        metrics,
        hydration_score,
        aggregate: aggregate(&in_range),
        activity_mix: activities_by_type(&activities),
        meal_mix: meals_by_slot(&meals),
        protein_sources: protein_by_source(&meals),
        macros: macro_split(protein, carbs, fat),
        weekly,
    })
}

fn write_distribution(
    output: &mut String,
    title: &str,
    unit: &str,
    buckets: &[DistributionBucket],
) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {title}");

    if buckets.is_empty() {
        let _ = writeln!(output, "Nothing logged for this window.");
    } else {
        for bucket in buckets {
            let _ = writeln!(
                output,
                "- {}: {:.0} {} ({}%)",
                bucket.label, bucket.raw_total, unit, bucket.percentage
            );
        }
    }
}

fn optional(value: Option<f64>, unit: &str) -> String {
    value
        .map(|value| format!("{value:.1} {unit}"))
        .unwrap_or_else(|| "n/a".to_string())
}

pub fn build_report(label: &str, dashboard: &Dashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Health Dashboard");
    let _ = writeln!(
        output,
        "Generated for {} on {} (data since {})",
        label, dashboard.today, dashboard.range.start
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Body Metrics");

    match &dashboard.health {
        Some(health) => {
            let _ = writeln!(
                output,
                "- BMI {:.2} ({})",
                health.bmi,
                health.category.label()
            );
            let _ = writeln!(output, "- BMR {:.2} kcal/day", health.bmr);
        }
        None => {
            let _ = writeln!(output, "No profile recorded.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Today");

    for view in &dashboard.metrics {
        let unit = view.metric.unit();
        let _ = writeln!(
            output,
            "- {}: {:.0}/{:.0} {} ({}%, {})",
            view.metric.label(),
            view.today,
            view.goal,
            unit,
            view.progress.percent,
            view.progress.status.label()
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Trends");

    for view in &dashboard.metrics {
        let _ = writeln!(
            output,
            "- {}: avg {:.0} {} this week, {} vs last week, {}-day streak",
            view.metric.label(),
            view.trend.average,
            view.metric.unit(),
            format_change(&Ok(view.trend.percent_change)),
            view.trend.streak_days
        );
    }
    let _ = writeln!(output, "- Hydration score: {}/10", dashboard.hydration_score);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Range Averages");
    let stats = &dashboard.aggregate;

    if stats.total_days == 0 {
        let _ = writeln!(output, "No daily metrics recorded for this window.");
    } else {
        let _ = writeln!(output, "- Days logged: {}", stats.total_days);
        let _ = writeln!(output, "- Calories: {}", optional(stats.avg_calories, "kcal"));
        let _ = writeln!(output, "- Water: {}", optional(stats.avg_water, "ml"));
        let _ = writeln!(output, "- Activity: {}", optional(stats.avg_activity, "min"));
        let _ = writeln!(
            output,
            "- Weight: {} (min {}, max {})",
            optional(stats.avg_weight, "kg"),
            optional(stats.min_weight, "kg"),
            optional(stats.max_weight, "kg")
        );
    }

    write_distribution(&mut output, "Activity Mix", "kcal", &dashboard.activity_mix);
    write_distribution(&mut output, "Calories by Meal", "kcal", &dashboard.meal_mix);
    write_distribution(&mut output, "Protein Sources", "g", &dashboard.protein_sources);

    let _ = writeln!(
        output,
        "- Macros: protein {}%, carbs {}%, fat {}%",
        dashboard.macros.protein, dashboard.macros.carbs, dashboard.macros.fat
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Summaries");

    if dashboard.weekly.is_empty() {
        let _ = writeln!(output, "No weekly summaries yet.");
    } else {
        for week in &dashboard.weekly {
            let _ = writeln!(
                output,
                "- Week of {}: {:.0} kcal, {:.0} ml water, {:.0} min activity",
                week.week_start, week.average_calories, week.average_water, week.average_activity
            );
        }
    }

    output
}
