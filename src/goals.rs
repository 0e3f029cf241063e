use serde::{Deserialize, Serialize};

use crate::formulas::percent_of_goal_or_zero;
use crate::models::{GoalSpec, MetricKind};

pub const DEFAULT_CALORIE_GOAL: f64 = 2500.0;
pub const DEFAULT_WATER_GOAL: f64 = 2500.0;
pub const DEFAULT_WEIGHT_GOAL: f64 = 68.0;
pub const DEFAULT_ACTIVITY_GOAL: f64 = 150.0;

const MET_PERCENT: u8 = 100;
const ON_TRACK_PERCENT: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalStatus {
    Behind,
    OnTrack,
    Met,
}

impl GoalStatus {
    pub fn label(self) -> &'static str {
        match self {
            GoalStatus::Behind => "behind",
            GoalStatus::OnTrack => "on track",
            GoalStatus::Met => "met",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub percent: u8,
    pub status: GoalStatus,
}

/// A user's goals, one target per metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSet {
    pub calorie_goal: f64,
    pub water_goal: f64,
    pub weight_goal: f64,
    pub activity_goal: f64,
}

impl Default for GoalSet {
    fn default() -> Self {
        Self {
            calorie_goal: DEFAULT_CALORIE_GOAL,
            water_goal: DEFAULT_WATER_GOAL,
            weight_goal: DEFAULT_WEIGHT_GOAL,
            activity_goal: DEFAULT_ACTIVITY_GOAL,
        }
    }
}

impl GoalSet {
    pub fn target(&self, metric: MetricKind) -> f64 {
        match metric {
            MetricKind::Calories => self.calorie_goal,
            MetricKind::Water => self.water_goal,
            MetricKind::ActivityMinutes => self.activity_goal,
            MetricKind::Weight => self.weight_goal,
        }
    }

    pub fn specs(&self) -> Vec<GoalSpec> {
        MetricKind::ALL
            .iter()
            .map(|&metric| GoalSpec {
                target: self.target(metric),
                metric,
            })
            .collect()
    }

    /// Builds a set from stored specs; metrics without a spec keep their default.
    pub fn from_specs(specs: &[GoalSpec]) -> Self {
        let mut goals = Self::default();
        for spec in specs {
            match spec.metric {
                MetricKind::Calories => goals.calorie_goal = spec.target,
                MetricKind::Water => goals.water_goal = spec.target,
                MetricKind::ActivityMinutes => goals.activity_goal = spec.target,
                MetricKind::Weight => goals.weight_goal = spec.target,
            }
        }
        goals
    }
}

/// Progress of `current` toward `goal` with a fixed three-level status.
pub fn evaluate(current: f64, goal: f64) -> GoalProgress {
    let percent = percent_of_goal_or_zero(current, goal);
    let status = if percent >= MET_PERCENT {
        GoalStatus::Met
    } else if percent >= ON_TRACK_PERCENT {
        GoalStatus::OnTrack
    } else {
        GoalStatus::Behind
    };
    GoalProgress { percent, status }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_fixed_thresholds() {
        assert_eq!(evaluate(0.0, 2500.0).status, GoalStatus::Behind);
        assert_eq!(evaluate(1224.0, 2500.0).status, GoalStatus::Behind);
        assert_eq!(evaluate(1250.0, 2500.0).status, GoalStatus::OnTrack);
        assert_eq!(
            evaluate(1700.0, 2500.0),
            GoalProgress {
                percent: 68,
                status: GoalStatus::OnTrack
            }
        );
        assert_eq!(evaluate(2500.0, 2500.0).status, GoalStatus::Met);
        assert_eq!(evaluate(4000.0, 2500.0).percent, 100);
    }

    #[test]
    fn zero_goal_is_behind_at_zero_percent() {
        assert_eq!(
            evaluate(500.0, 0.0),
            GoalProgress {
                percent: 0,
                status: GoalStatus::Behind
            }
        );
    }

    #[test]
    fn defaults_fill_missing_specs() {
        let goals = GoalSet::from_specs(&[GoalSpec {
            target: 3000.0,
            metric: MetricKind::Water,
        }]);
        assert_eq!(goals.water_goal, 3000.0);
        assert_eq!(goals.calorie_goal, DEFAULT_CALORIE_GOAL);
        assert_eq!(goals.target(MetricKind::Weight), 68.0);
        assert_eq!(goals.target(MetricKind::ActivityMinutes), 150.0);
        assert_eq!(GoalSet::from_specs(&goals.specs()), goals);
    }
}
