use anyhow::Context;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{MetricsError, MetricsResult};
use crate::formulas::validate_profile;
use crate::goals::GoalSet;
use crate::models::{
    ActivityRecord, DailyMetric, DateRange, HydrationRecord, MealRecord, Profile, WeeklySummary,
};
use crate::store::MetricsStore;

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres-backed [`MetricsStore`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub async fn find_user_id(pool: &PgPool, email: &str) -> anyhow::Result<Uuid> {
    let row = sqlx::query("SELECT id FROM healthtrack.users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("no user registered with email {email}"))?;
    Ok(row.get("id"))
}

pub async fn upsert_profile(pool: &PgPool, profile: &Profile) -> anyhow::Result<Uuid> {
    validate_profile(profile)?;
    let age = i32::try_from(profile.age_years).context("age out of range")?;

    let user_id: Uuid = sqlx::query(
        r#"
        INSERT INTO healthtrack.users (id, full_name, email, height_cm, weight_kg, age_years, sex)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name,
            height_cm = EXCLUDED.height_cm,
            weight_kg = EXCLUDED.weight_kg,
            age_years = EXCLUDED.age_years,
            sex = EXCLUDED.sex
        RETURNING id
        "#,
    )
    .bind(profile.user_id)
    .bind(&profile.full_name)
    .bind(&profile.email)
    .bind(profile.height_cm)
    .bind(profile.weight_kg)
    .bind(age)
    .bind(profile.sex.to_string())
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(user_id)
}

pub async fn upsert_goals(pool: &PgPool, user_id: Uuid, goals: &GoalSet) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO healthtrack.goals
        (user_id, calorie_goal, water_goal, weight_goal, activity_goal)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE
        SET calorie_goal = EXCLUDED.calorie_goal,
            water_goal = EXCLUDED.water_goal,
            weight_goal = EXCLUDED.weight_goal,
            activity_goal = EXCLUDED.activity_goal,
            updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(goals.calorie_goal)
    .bind(goals.water_goal)
    .bind(goals.weight_goal)
    .bind(goals.activity_goal)
    .execute(pool)
    .await?;
    Ok(())
}

/// Returns whether a new row was written; a repeated `source_key` is skipped.
pub async fn insert_daily_metric(
    pool: &PgPool,
    user_id: Uuid,
    metric: &DailyMetric,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO healthtrack.daily_metrics
        (id, user_id, date, calories, water, activity, weight, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(metric.date)
    .bind(metric.calories)
    .bind(metric.water)
    .bind(metric.activity)
    .bind(metric.weight)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn upsert_hydration(
    pool: &PgPool,
    user_id: Uuid,
    record: &HydrationRecord,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO healthtrack.hydration (user_id, date, water_consumed, water_goal)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, date) DO UPDATE
        SET water_consumed = EXCLUDED.water_consumed, water_goal = EXCLUDED.water_goal
        "#,
    )
    .bind(user_id)
    .bind(record.date)
    .bind(record.water_consumed)
    .bind(record.water_goal)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn insert_activity(
    pool: &PgPool,
    user_id: Uuid,
    activity: &ActivityRecord,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO healthtrack.activities
        (id, user_id, date, activity_type, duration_minutes, calories_burnt, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(activity.date)
    .bind(&activity.activity_type)
    .bind(activity.duration_minutes)
    .bind(activity.calories_burnt)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn insert_meal(
    pool: &PgPool,
    user_id: Uuid,
    meal: &MealRecord,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO healthtrack.meal_logs
        (id, user_id, date, slot, dish, calories, protein, carbs, fat, is_vegetarian, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(meal.date)
    .bind(meal.slot.to_string())
    .bind(&meal.dish)
    .bind(meal.calories)
    .bind(meal.protein)
    .bind(meal.carbs)
    .bind(meal.fat)
    .bind(meal.is_vegetarian)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let profiles = vec![
        Profile {
            user_id: Uuid::parse_str("6f1c2a4e-8d3b-4f5a-9c7e-1b2d3e4f5a6b")?,
            full_name: "Maya Chen".to_string(),
            email: "maya.chen@example.com".to_string(),
            height_cm: 168.0,
            weight_kg: 61.5,
            age_years: 31,
            sex: crate::models::Sex::Female,
        },
        Profile {
            user_id: Uuid::parse_str("a3e9b7c1-52d4-4e86-b0f2-7c1d9e3a5b84")?,
            full_name: "Jordan Alvarez".to_string(),
            email: "jordan.alvarez@example.com".to_string(),
            height_cm: 175.0,
            weight_kg: 70.0,
            age_years: 28,
            sex: crate::models::Sex::Male,
        },
    ];

    let first_day = NaiveDate::from_ymd_opt(2026, 1, 26).context("invalid date")?;

    for (index, profile) in profiles.iter().enumerate() {
        let user_id = upsert_profile(pool, profile).await?;
        let offset = index as f64;

        if index == 0 {
            upsert_goals(
                pool,
                user_id,
                &GoalSet {
                    calorie_goal: 2100.0,
                    water_goal: 2200.0,
                    weight_goal: 60.0,
                    activity_goal: 45.0,
                },
            )
            .await?;
        }

        for day in 0..14i64 {
            let date = first_day + Duration::days(day);
            let step = day as f64;
            let metric = DailyMetric {
                date,
                calories: 1900.0 + 40.0 * (step % 5.0) + 150.0 * offset,
                water: 1800.0 + 90.0 * (step % 7.0),
                activity: 20.0 + 5.0 * (step % 4.0) + 10.0 * offset,
                weight: profile.weight_kg - 0.05 * step,
            };
            let key = format!("seed-daily-{}-{}", profile.email, date);
            insert_daily_metric(pool, user_id, &metric, &key).await?;

            upsert_hydration(
                pool,
                user_id,
                &HydrationRecord {
                    date,
                    water_consumed: metric.water,
                    water_goal: 2500.0,
                },
            )
            .await?;
        }

        let activities = [
            ("Running", 30.0, 310.0, 1),
            ("Cycling", 45.0, 390.0, 3),
            ("Swimming", 40.0, 350.0, 6),
            ("Running", 25.0, 260.0, 9),
            ("Yoga", 60.0, 180.0, 12),
        ];
        for (activity_type, duration, calories, day) in activities {
            let date = first_day + Duration::days(day);
            let key = format!("seed-activity-{}-{}-{}", profile.email, date, activity_type);
            insert_activity(
                pool,
                user_id,
                &ActivityRecord {
                    date,
                    activity_type: activity_type.to_string(),
                    duration_minutes: duration,
                    calories_burnt: calories,
                },
                &key,
            )
            .await?;
        }

        let meals = [
            ("breakfast", "Overnight oats", 380.0, 14.0, 58.0, 9.0, true),
            ("lunch", "Grilled chicken wrap", 620.0, 42.0, 55.0, 22.0, false),
            ("dinner", "Lentil curry", 540.0, 24.0, 70.0, 14.0, true),
            ("snack", "Greek yogurt", 160.0, 15.0, 12.0, 4.0, false),
        ];
        for day in [11i64, 12, 13] {
            let date = first_day + Duration::days(day);
            for (slot, dish, calories, protein, carbs, fat, is_vegetarian) in meals {
                let key = format!("seed-meal-{}-{}-{}", profile.email, date, slot);
                insert_meal(
                    pool,
                    user_id,
                    &MealRecord {
                        date,
                        slot: slot.parse()?,
                        dish: dish.to_string(),
                        calories,
                        protein,
                        carbs,
                        fat,
                        is_vegetarian,
                    },
                    &key,
                )
                .await?;
            }
        }
    }

    info!(users = profiles.len(), "seed data inserted");
    Ok(())
}

/// Imports daily metrics for already registered users; returns the number of new rows.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        email: String,
        date: NaiveDate,
        calories: f64,
        water: f64,
        activity: f64,
        weight: f64,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("malformed CSV record {}", line + 1))?;
        let user_id = find_user_id(pool, &row.email).await?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let metric = DailyMetric {
            date: row.date,
            calories: row.calories,
            water: row.water,
            activity: row.activity,
            weight: row.weight,
        };

        if insert_daily_metric(pool, user_id, &metric, &source_key).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}

fn daily_from_row(row: &PgRow) -> MetricsResult<DailyMetric> {
    Ok(DailyMetric {
        date: row.try_get("date")?,
        calories: row.try_get("calories")?,
        water: row.try_get("water")?,
        activity: row.try_get("activity")?,
        weight: row.try_get("weight")?,
    })
}

fn weekly_from_row(row: &PgRow) -> MetricsResult<WeeklySummary> {
    Ok(WeeklySummary {
        week_start: row.try_get("week_start")?,
        average_calories: row.try_get("average_calories")?,
        average_water: row.try_get("average_water")?,
        average_activity: row.try_get("average_activity")?,
    })
}

/// Profile columns as stored, before range checks.
struct StoredProfile {
    id: Uuid,
    full_name: String,
    email: String,
    height_cm: f64,
    weight_kg: f64,
    age_years: i32,
    sex: String,
}

impl TryFrom<StoredProfile> for Profile {
    type Error = MetricsError;

    fn try_from(stored: StoredProfile) -> MetricsResult<Self> {
        let age = u32::try_from(stored.age_years).map_err(|_| {
            MetricsError::InvalidInput(format!("stored age {} is negative", stored.age_years))
        })?;
        let profile = Profile {
            user_id: stored.id,
            full_name: stored.full_name,
            email: stored.email,
            height_cm: stored.height_cm,
            weight_kg: stored.weight_kg,
            age_years: age,
            sex: stored.sex.parse()?,
        };
        validate_profile(&profile)?;
        Ok(profile)
    }
}

fn profile_from_row(row: &PgRow) -> MetricsResult<Profile> {
    StoredProfile {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        height_cm: row.try_get("height_cm")?,
        weight_kg: row.try_get("weight_kg")?,
        age_years: row.try_get("age_years")?,
        sex: row.try_get("sex")?,
    }
    .try_into()
}

#[async_trait]
impl MetricsStore for PgStore {
    async fn fetch_daily_metrics(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> MetricsResult<Vec<DailyMetric>> {
        let rows = sqlx::query(
            "SELECT date, calories, water, activity, weight \
             FROM healthtrack.daily_metrics \
             WHERE user_id = $1 AND date BETWEEN $2 AND $3",
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        debug!(%user_id, rows = rows.len(), "daily metrics fetched");
        rows.iter().map(daily_from_row).collect()
    }

    async fn fetch_hydration(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> MetricsResult<Vec<HydrationRecord>> {
        let rows = sqlx::query(
            "SELECT date, water_consumed, water_goal \
             FROM healthtrack.hydration \
             WHERE user_id = $1 AND date BETWEEN $2 AND $3",
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> MetricsResult<HydrationRecord> {
                Ok(HydrationRecord {
                    date: row.try_get("date")?,
                    water_consumed: row.try_get("water_consumed")?,
                    water_goal: row.try_get("water_goal")?,
                })
            })
            .collect()
    }

    async fn fetch_activities(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> MetricsResult<Vec<ActivityRecord>> {
        let rows = sqlx::query(
            "SELECT date, activity_type, duration_minutes, calories_burnt \
             FROM healthtrack.activities \
             WHERE user_id = $1 AND date BETWEEN $2 AND $3",
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> MetricsResult<ActivityRecord> {
                Ok(ActivityRecord {
                    date: row.try_get("date")?,
                    activity_type: row.try_get("activity_type")?,
                    duration_minutes: row.try_get("duration_minutes")?,
                    calories_burnt: row.try_get("calories_burnt")?,
                })
            })
            .collect()
    }

    async fn fetch_meals(&self, user_id: Uuid, range: DateRange) -> MetricsResult<Vec<MealRecord>> {
        let rows = sqlx::query(
            "SELECT date, slot, dish, calories, protein, carbs, fat, is_vegetarian \
             FROM healthtrack.meal_logs \
             WHERE user_id = $1 AND date BETWEEN $2 AND $3 \
             ORDER BY date, slot",
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> MetricsResult<MealRecord> {
                let slot: String = row.try_get("slot")?;
                Ok(MealRecord {
                    date: row.try_get("date")?,
                    slot: slot.parse()?,
                    dish: row.try_get("dish")?,
                    calories: row.try_get("calories")?,
                    protein: row.try_get("protein")?,
                    carbs: row.try_get("carbs")?,
                    fat: row.try_get("fat")?,
                    is_vegetarian: row.try_get("is_vegetarian")?,
                })
            })
            .collect()
    }

    async fn fetch_profile(&self, user_id: Uuid) -> MetricsResult<Option<Profile>> {
        let row = sqlx::query(
            "SELECT id, full_name, email, height_cm, weight_kg, age_years, sex \
             FROM healthtrack.users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn fetch_goals(&self, user_id: Uuid) -> MetricsResult<GoalSet> {
        let row = sqlx::query(
            "SELECT calorie_goal, water_goal, weight_goal, activity_goal \
             FROM healthtrack.goals WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(GoalSet {
                calorie_goal: row.try_get("calorie_goal")?,
                water_goal: row.try_get("water_goal")?,
                weight_goal: row.try_get("weight_goal")?,
                activity_goal: row.try_get("activity_goal")?,
            }),
            None => Ok(GoalSet::default()),
        }
    }

    async fn upsert_weekly_summary(
        &self,
        user_id: Uuid,
        summary: &WeeklySummary,
    ) -> MetricsResult<()> {
        sqlx::query(
            r#"
            INSERT INTO healthtrack.weekly_metrics
            (user_id, week_start, average_calories, average_water, average_activity)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, week_start) DO UPDATE
            SET average_calories = EXCLUDED.average_calories,
                average_water = EXCLUDED.average_water,
                average_activity = EXCLUDED.average_activity,
                updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(summary.week_start)
        .bind(summary.average_calories)
        .bind(summary.average_water)
        .bind(summary.average_activity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_weekly_summaries(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> MetricsResult<Vec<WeeklySummary>> {
        let rows = sqlx::query(
            "SELECT week_start, average_calories, average_water, average_activity \
             FROM healthtrack.weekly_metrics \
             WHERE user_id = $1 \
             ORDER BY week_start DESC \
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(weekly_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sex;

    fn stored(weight_kg: f64, height_cm: f64, age_years: i32, sex: &str) -> StoredProfile {
        StoredProfile {
            id: Uuid::new_v4(),
            full_name: "Jordan Alvarez".to_string(),
            email: "jordan.alvarez@example.com".to_string(),
            height_cm,
            weight_kg,
            age_years,
            sex: sex.to_string(),
        }
    }

    #[test]
    fn stored_profile_converts_when_in_range() {
        let profile = Profile::try_from(stored(70.0, 175.0, 28, "male")).unwrap();
        assert_eq!(profile.age_years, 28);
        assert_eq!(profile.sex, Sex::Male);
    }

    #[test]
    fn out_of_range_stored_profile_is_rejected() {
        for row in [
            stored(600.0, 175.0, 28, "male"),
            stored(70.0, 300.0, 28, "male"),
            stored(70.0, 175.0, 140, "male"),
            stored(70.0, 175.0, -3, "male"),
            stored(70.0, 175.0, 28, "other"),
        ] {
            assert!(matches!(Profile::try_from(row), Err(MetricsError::InvalidInput(_))));
        }
    }
}
