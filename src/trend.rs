use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::error::{MetricsError, MetricsResult};
use crate::formulas::round_half_up;
use crate::models::{DateRange, DatedEntry, HydrationRecord, TrendResult};

/// Arithmetic mean of the entry values, 0 for no entries.
pub fn average(entries: &[DatedEntry]) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    entries.iter().map(|entry| entry.value).sum::<f64>() / entries.len() as f64
}

/// Consecutive qualifying days ending at the most recent entry.
///
/// Entries on the same date are summed into one daily total first. A day
/// qualifies when its total meets `goal` or it is `reference_date`, which is
/// the in-progress day. Counting stops at the first shortfall or at a missing
/// calendar day between two logged days.
pub fn streak(entries: &[DatedEntry], goal: f64, reference_date: NaiveDate) -> u32 {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.date).or_insert(0.0) += entry.value;
    }

    let mut count = 0u32;
    let mut previous: Option<NaiveDate> = None;

    for (&date, &total) in totals.iter().rev() {
        if let Some(prev) = previous {
            if (prev - date).num_days() > 1 {
                break;
            }
        }

        if total >= goal || date == reference_date {
            count += 1;
            previous = Some(date);
        } else {
            break;
        }
    }

    count
}

/// Week-over-week change of the averages in percent, rounded.
pub fn percent_change(
    prior_window: &[DatedEntry],
    current_window: &[DatedEntry],
) -> MetricsResult<i64> {
    let baseline = average(prior_window);
    if baseline == 0.0 {
        return Err(MetricsError::BaselineUndefined);
    }
    let change = (average(current_window) - baseline) / baseline * 100.0;
    Ok(round_half_up(change) as i64)
}

/// Signed display form of a change; an undefined baseline shows as "+0%".
pub fn format_change(change: &MetricsResult<i64>) -> String {
    match change {
        Ok(value) if *value < 0 => format!("{value}%"),
        Ok(value) => format!("+{value}%"),
        Err(_) => "+0%".to_string(),
    }
}

/// Entries dated within `[week_start, week_end]`.
pub fn weekly_bucket(
    entries: &[DatedEntry],
    week_start: NaiveDate,
    week_end: NaiveDate,
) -> Vec<DatedEntry> {
    let range = DateRange::new(week_start, week_end);
    entries
        .iter()
        .filter(|entry| range.contains(entry.date))
        .copied()
        .collect()
}

/// Hydration-style consistency score: share of days meeting the goal, on a 0-10 scale.
pub fn consistency_score(entries: &[DatedEntry], goal: f64) -> u8 {
    let met = entries.iter().filter(|entry| entry.value >= goal).count();
    score_out_of_ten(met, entries.len())
}

/// Same scale as [`consistency_score`], each day judged against its own logged goal.
pub fn hydration_consistency(records: &[HydrationRecord]) -> u8 {
    let met = records
        .iter()
        .filter(|record| record.water_consumed >= record.water_goal)
        .count();
    score_out_of_ten(met, records.len())
}

fn score_out_of_ten(met: usize, days: usize) -> u8 {
    if days == 0 {
        return 0;
    }
    let percentage = met as f64 / days as f64 * 100.0;
    round_half_up(percentage / 10.0).min(10.0) as u8
}

/// Average, streak and week-over-week change for the week ending at `reference_date`.
pub fn analyze(entries: &[DatedEntry], goal: f64, reference_date: NaiveDate) -> TrendResult {
    let current_start = reference_date - Duration::days(6);
    let prior_end = current_start - Duration::days(1);
    let prior_start = prior_end - Duration::days(6);

    let current = weekly_bucket(entries, current_start, reference_date);
    let prior = weekly_bucket(entries, prior_start, prior_end);

    TrendResult {
        average: average(&current),
        streak_days: streak(entries, goal, reference_date),
        percent_change: percent_change(&prior, &current).unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(day: u32, value: f64) -> DatedEntry {
        DatedEntry::new(date(2023, 5, day), value)
    }

    #[test]
    fn average_of_sample_week() {
        let entries = vec![entry(1, 350.0), entry(2, 400.0), entry(3, 450.0)];
        assert_eq!(average(&entries), 400.0);
        assert_eq!(average(&[]), 0.0);
    }

    #[test]
    fn average_stays_within_bounds() {
        let samples = [
            vec![entry(1, 3.0)],
            vec![entry(1, 0.1), entry(2, 0.2), entry(3, 0.7)],
            vec![entry(1, -40.0), entry(2, 2500.0), entry(3, 1.5), entry(4, 999.9)],
        ];
        for entries in samples {
            let min = entries.iter().map(|e| e.value).fold(f64::INFINITY, f64::min);
            let max = entries.iter().map(|e| e.value).fold(f64::NEG_INFINITY, f64::max);
            let avg = average(&entries);
            assert!(avg >= min && avg <= max, "{avg} outside [{min}, {max}]");
        }
    }

    #[test]
    fn streak_counts_from_most_recent() {
        let entries = vec![
            entry(3, 2600.0),
            entry(5, 2500.0),
            entry(4, 2700.0),
            entry(1, 2600.0),
        ];
        // 5, 4, 3 qualify; 2 is missing.
        assert_eq!(streak(&entries, 2500.0, date(2023, 5, 20)), 3);
    }

    #[test]
    fn streak_counts_today_even_when_short() {
        let entries = vec![entry(10, 300.0), entry(9, 2500.0), entry(8, 2400.0)];
        assert_eq!(streak(&entries, 2500.0, date(2023, 5, 10)), 2);
    }

    #[test]
    fn streak_is_zero_when_latest_fails() {
        let entries = vec![entry(10, 300.0), entry(9, 2500.0)];
        assert_eq!(streak(&entries, 2500.0, date(2023, 5, 11)), 0);
        assert_eq!(streak(&[], 2500.0, date(2023, 5, 11)), 0);
    }

    #[test]
    fn streak_is_deterministic() {
        let entries = vec![entry(2, 2600.0), entry(1, 2600.0)];
        let first = streak(&entries, 2500.0, date(2023, 5, 2));
        let second = streak(&entries, 2500.0, date(2023, 5, 2));
        assert_eq!(first, second);
        assert_eq!(first, 2);
    }

    #[test]
    fn same_day_rows_are_totalled_regardless_of_order() {
        let short_first = vec![entry(10, 300.0), entry(10, 2600.0)];
        let short_last = vec![entry(10, 2600.0), entry(10, 300.0)];
        assert_eq!(streak(&short_first, 2500.0, date(2023, 5, 11)), 1);
        assert_eq!(streak(&short_last, 2500.0, date(2023, 5, 11)), 1);

        // Neither row meets the goal alone, their sum does.
        let split_day = vec![entry(10, 1500.0), entry(9, 2500.0), entry(10, 1400.0)];
        assert_eq!(streak(&split_day, 2500.0, date(2023, 5, 11)), 2);
    }

    #[test]
    fn percent_change_rounds_and_signs() {
        let prior = vec![entry(1, 2000.0)];
        let current = vec![entry(8, 2100.0)];
        assert_eq!(percent_change(&prior, &current).unwrap(), 5);
        assert_eq!(percent_change(&current, &prior).unwrap(), -5);
        assert_eq!(format_change(&percent_change(&prior, &current)), "+5%");
        assert_eq!(format_change(&percent_change(&current, &prior)), "-5%");
    }

    #[test]
    fn zero_baseline_displays_flat() {
        let change = percent_change(&[], &[entry(8, 2100.0)]);
        assert!(matches!(change, Err(MetricsError::BaselineUndefined)));
        assert_eq!(format_change(&change), "+0%");
    }

    #[test]
    fn weekly_bucket_is_inclusive() {
        let entries = vec![entry(1, 1.0), entry(4, 2.0), entry(7, 3.0), entry(8, 4.0)];
        let bucket = weekly_bucket(&entries, date(2023, 5, 1), date(2023, 5, 7));
        assert_eq!(bucket.len(), 3);
        assert_eq!(bucket[2].value, 3.0);
    }

    #[test]
    fn consistency_score_scales_to_ten() {
        let entries = vec![
            entry(1, 2500.0),
            entry(2, 2000.0),
            entry(3, 2600.0),
            entry(4, 100.0),
        ];
        assert_eq!(consistency_score(&entries, 2500.0), 5);
        assert_eq!(consistency_score(&[], 2500.0), 0);
    }

    #[test]
    fn hydration_consistency_uses_each_days_goal() {
        let record = |day, water_consumed, water_goal| HydrationRecord {
            date: date(2023, 5, day),
            water_consumed,
            water_goal,
        };
        let records = vec![
            record(1, 2000.0, 2000.0),
            record(2, 2000.0, 3000.0),
            record(3, 1800.0, 1500.0),
            record(4, 2600.0, 2500.0),
        ];
        assert_eq!(hydration_consistency(&records), 8);
        assert_eq!(hydration_consistency(&[]), 0);
    }

    #[test]
    fn analyze_combines_windows() {
        let mut entries = Vec::new();
        for day in 1..=7 {
            entries.push(entry(day, 2000.0));
        }
        for day in 8..=14 {
            entries.push(entry(day, 2500.0));
        }
        let result = analyze(&entries, 2500.0, date(2023, 5, 14));
        assert_eq!(result.average, 2500.0);
        assert_eq!(result.streak_days, 7);
        assert_eq!(result.percent_change, 25);
    }
}
