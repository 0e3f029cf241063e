use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use healthtrack_metrics::config::{parse_weekday, AppConfig};
use healthtrack_metrics::db::{self, PgStore};
use healthtrack_metrics::goals::GoalSet;
use healthtrack_metrics::logging;
use healthtrack_metrics::models::{
    ActivityRecord, DailyMetric, HydrationRecord, MealRecord, MealSlot, Profile, RangePreset, Sex,
};
use healthtrack_metrics::report::{self, HealthSnapshot};
use healthtrack_metrics::rollup;
use healthtrack_metrics::store::MetricsStore;

#[derive(Parser)]
#[command(name = "healthtrack")]
#[command(
    about = "Nutrition, hydration and activity tracking with derived health metrics",
    long_about = None
)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Weekday that starts a week (overrides HEALTHTRACK_WEEK_START)
    #[arg(long, global = true)]
    week_start: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import daily metrics from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Create or update a user profile
    Profile {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        height_cm: f64,
        #[arg(long)]
        weight_kg: f64,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        sex: Sex,
    },
    /// Record a day's calories, water, activity and weight
    LogMetric {
        #[arg(long)]
        email: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        calories: f64,
        #[arg(long)]
        water: f64,
        #[arg(long)]
        activity: f64,
        #[arg(long)]
        weight: f64,
    },
    /// Set the water consumed on a day
    LogHydration {
        #[arg(long)]
        email: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        ml: f64,
        #[arg(long, default_value_t = healthtrack_metrics::goals::DEFAULT_WATER_GOAL)]
        goal: f64,
    },
    /// Record a workout
    LogActivity {
        #[arg(long)]
        email: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long = "type")]
        activity_type: String,
        #[arg(long)]
        minutes: f64,
        #[arg(long)]
        calories: f64,
    },
    /// Record a meal
    LogMeal {
        #[arg(long)]
        email: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        slot: MealSlot,
        #[arg(long)]
        dish: String,
        #[arg(long)]
        calories: f64,
        #[arg(long, default_value_t = 0.0)]
        protein: f64,
        #[arg(long, default_value_t = 0.0)]
        carbs: f64,
        #[arg(long, default_value_t = 0.0)]
        fat: f64,
        #[arg(long)]
        vegetarian: bool,
    },
    /// Roll up one week of daily metrics into a weekly summary
    Rollup {
        #[arg(long)]
        email: String,
        /// Any date inside the week; defaults to the last completed week
        #[arg(long)]
        week_of: Option<NaiveDate>,
    },
    /// Show or update goals
    Goals {
        #[arg(long)]
        email: String,
        #[arg(long)]
        calories: Option<f64>,
        #[arg(long)]
        water: Option<f64>,
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        activity: Option<f64>,
    },
    /// Show BMI and BMR for a profile
    Health {
        #[arg(long)]
        email: String,
    },
    /// Build the dashboard as a markdown report or JSON
    Dashboard {
        #[arg(long)]
        email: String,
        #[arg(long, value_enum, default_value_t = RangePreset::Month)]
        range: RangePreset,
        /// Reference day; defaults to today (UTC)
        #[arg(long)]
        today: Option<NaiveDate>,
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
        /// Print JSON to stdout instead of writing markdown
        #[arg(long)]
        json: bool,
    },
}

fn cli_source_key() -> String {
    format!("cli-{}", Uuid::new_v4())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = AppConfig::from_env()?;
    if let Some(raw) = cli.week_start.as_deref() {
        config.week_start = parse_weekday(raw)?;
    }

    let pool = db::connect(&config).await?;
    let store = PgStore::new(pool.clone());
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} daily metrics from {}.", csv.display());
        }
        Commands::Profile {
            email,
            name,
            height_cm,
            weight_kg,
            age,
            sex,
        } => {
            let profile = Profile {
                user_id: Uuid::new_v4(),
                full_name: name,
                email,
                height_cm,
                weight_kg,
                age_years: age,
                sex,
            };
            let user_id = db::upsert_profile(&pool, &profile).await?;
            println!("Profile saved for {} ({user_id}).", profile.email);
        }
        Commands::LogMetric {
            email,
            date,
            calories,
            water,
            activity,
            weight,
        } => {
            let user_id = db::find_user_id(&pool, &email).await?;
            let metric = DailyMetric {
                date: date.unwrap_or(today),
                calories,
                water,
                activity,
                weight,
            };
            db::insert_daily_metric(&pool, user_id, &metric, &cli_source_key()).await?;
            println!("Daily metrics recorded for {}.", metric.date);

            let refreshed =
                rollup::maybe_roll_up(&store, user_id, today, config.week_start).await?;
            if let Some(summary) = refreshed {
                println!("Weekly summary refreshed for the week of {}.", summary.week_start);
            }
        }
        Commands::LogHydration {
            email,
            date,
            ml,
            goal,
        } => {
            let user_id = db::find_user_id(&pool, &email).await?;
            let record = HydrationRecord {
                date: date.unwrap_or(today),
                water_consumed: ml,
                water_goal: goal,
            };
            db::upsert_hydration(&pool, user_id, &record).await?;
            println!("Hydration set to {ml:.0} ml for {}.", record.date);
        }
        Commands::LogActivity {
            email,
            date,
            activity_type,
            minutes,
            calories,
        } => {
            let user_id = db::find_user_id(&pool, &email).await?;
            let activity = ActivityRecord {
                date: date.unwrap_or(today),
                activity_type,
                duration_minutes: minutes,
                calories_burnt: calories,
            };
            db::insert_activity(&pool, user_id, &activity, &cli_source_key()).await?;
            println!("{} logged for {}.", activity.activity_type, activity.date);
        }
        Commands::LogMeal {
            email,
            date,
            slot,
            dish,
            calories,
            protein,
            carbs,
            fat,
            vegetarian,
        } => {
            let user_id = db::find_user_id(&pool, &email).await?;
            let meal = MealRecord {
                date: date.unwrap_or(today),
                slot,
                dish,
                calories,
                protein,
                carbs,
                fat,
                is_vegetarian: vegetarian,
            };
            db::insert_meal(&pool, user_id, &meal, &cli_source_key()).await?;
            println!("{} logged as {} on {}.", meal.dish, meal.slot, meal.date);
        }
        Commands::Rollup { email, week_of } => {
            let user_id = db::find_user_id(&pool, &email).await?;
            let week_start = match week_of {
                Some(date) => rollup::week_start_for(date, config.week_start),
                None => rollup::previous_week_start(today, config.week_start),
            };

            match rollup::run_weekly_rollup(&store, user_id, week_start).await? {
                Some(summary) => println!(
                    "Week of {}: {:.0} kcal, {:.0} ml water, {:.0} min activity.",
                    summary.week_start,
                    summary.average_calories,
                    summary.average_water,
                    summary.average_activity
                ),
                None => println!("No daily metrics logged for the week of {week_start}."),
            }
        }
        Commands::Goals {
            email,
            calories,
            water,
            weight,
            activity,
        } => {
            let user_id = db::find_user_id(&pool, &email).await?;
            let current = store.fetch_goals(user_id).await?;

            let updated = GoalSet {
                calorie_goal: calories.unwrap_or(current.calorie_goal),
                water_goal: water.unwrap_or(current.water_goal),
                weight_goal: weight.unwrap_or(current.weight_goal),
                activity_goal: activity.unwrap_or(current.activity_goal),
            };
            if updated != current {
                db::upsert_goals(&pool, user_id, &updated).await?;
                info!(%user_id, "goals updated");
            }

            for spec in updated.specs() {
                println!(
                    "- {}: {:.0} {}",
                    spec.metric.label(),
                    spec.target,
                    spec.metric.unit()
                );
            }
        }
        Commands::Health { email } => {
            let user_id = db::find_user_id(&pool, &email).await?;
            let profile = store
                .fetch_profile(user_id)
                .await?
                .with_context(|| format!("no profile stored for {email}"))?;
            let health = HealthSnapshot::from_profile(&profile)?;
            println!(
                "BMI {:.2} ({}), BMR {:.2} kcal/day",
                health.bmi,
                health.category.label(),
                health.bmr
            );
        }
        Commands::Dashboard {
            email,
            range,
            today: reference,
            out,
            json,
        } => {
            let user_id = db::find_user_id(&pool, &email).await?;
            let dashboard =
                report::build_dashboard(&store, user_id, reference.unwrap_or(today), range).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                let markdown = report::build_report(&email, &dashboard);
                std::fs::write(&out, markdown)
                    .with_context(|| format!("failed to write {}", out.display()))?;
                println!("Dashboard written to {}.", out.display());
            }
        }
    }

    Ok(())
}
