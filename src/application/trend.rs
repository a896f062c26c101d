//! History trends: how a user's risk moves between assessments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Assessment, ConditionRisk, RiskLevel};

/// Overall changes smaller than this are treated as no change. Scores are
/// displayed at two decimals, so anything below half a hundredth is invisible.
pub const UNCHANGED_EPSILON: f64 = 0.005;

/// Direction of the overall score relative to the previous assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Improved,
    Worsened,
    Unchanged,
}

impl TrendDirection {
    #[must_use]
    pub fn from_delta(delta: f64) -> Self {
        if delta.abs() < UNCHANGED_EPSILON {
            Self::Unchanged
        } else if delta < 0.0 {
            Self::Improved
        } else {
            Self::Worsened
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Improved => "improved",
            Self::Worsened => "worsened",
            Self::Unchanged => "unchanged",
        })
    }
}

/// Score changes since the previous assessment (`current - previous`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendDelta {
    pub diabetes: f64,
    pub cvd: f64,
    pub overall: f64,
    pub direction: TrendDirection,
}

/// One assessment on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub assessment_id: String,
    pub date: DateTime<Utc>,
    pub diabetes: ConditionRisk,
    pub cvd: ConditionRisk,
    pub overall: ConditionRisk,
    /// `None` for the first point.
    pub delta: Option<TrendDelta>,
}

/// Headline figures for a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub latest_score: f64,
    pub latest_level: RiskLevel,
    pub assessments: usize,
    /// Overall score change from the first to the latest point.
    pub net_change: f64,
    pub direction: TrendDirection,
}

/// Build a timeline ordered oldest to newest, whatever order the
/// assessments are given in.
#[must_use]
pub fn build_trend(assessments: &[Assessment]) -> Vec<TrendPoint> {
    let mut ordered: Vec<&Assessment> = assessments.iter().collect();
    ordered.sort_by_key(|a| a.date);

    let mut points: Vec<TrendPoint> = Vec::with_capacity(ordered.len());
    for assessment in ordered {
        let result = &assessment.result;
        let delta = points.last().map(|prev| {
            let overall = result.overall.score - prev.overall.score;
            TrendDelta {
                diabetes: result.diabetes.score - prev.diabetes.score,
                cvd: result.cvd.score - prev.cvd.score,
                overall,
                direction: TrendDirection::from_delta(overall),
            }
        });

        points.push(TrendPoint {
            assessment_id: assessment.id.clone(),
            date: assessment.date,
            diabetes: result.diabetes,
            cvd: result.cvd,
            overall: result.overall,
            delta,
        });
    }
    points
}

/// Summarize a timeline from [`build_trend`]. `None` when it is empty.
#[must_use]
pub fn summarize(points: &[TrendPoint]) -> Option<TrendSummary> {
    let first = points.first()?;
    let latest = points.last()?;
    let net_change = latest.overall.score - first.overall.score;

    Some(TrendSummary {
        latest_score: latest.overall.score,
        latest_level: latest.overall.level,
        assessments: points.len(),
        net_change,
        direction: TrendDirection::from_delta(net_change),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RiskAssessmentInput, RiskResult};
    use chrono::Duration;

    fn at(days_ago: i64, diabetes: f64, cvd: f64) -> Assessment {
        Assessment::new(
            "alice",
            RiskAssessmentInput::default(),
            RiskResult::from_scores(diabetes, cvd),
            "fp",
        )
        .with_date(Utc::now() - Duration::days(days_ago))
    }

    #[test]
    fn test_empty_history() {
        assert!(build_trend(&[]).is_empty());
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn test_points_ordered_oldest_first_with_deltas() {
        // newest first, the way storage returns them
        let history = vec![at(1, 10.0, 35.0), at(5, 12.0, 50.0), at(9, 8.0, 40.0)];
        let points = build_trend(&history);

        assert_eq!(points.len(), 3);
        assert!(points[0].date < points[1].date && points[1].date < points[2].date);
        assert!(points[0].delta.is_none());

        let second = points[1].delta.expect("Has delta");
        assert!((second.diabetes - 4.0).abs() < 1e-9);
        assert!((second.cvd - 10.0).abs() < 1e-9);
        assert!((second.overall - 10.0).abs() < 1e-9);
        assert_eq!(second.direction, TrendDirection::Worsened);

        let third = points[2].delta.expect("Has delta");
        assert!((third.overall + 15.0).abs() < 1e-9);
        assert_eq!(third.direction, TrendDirection::Improved);
    }

    #[test]
    fn test_tiny_changes_are_unchanged() {
        assert_eq!(TrendDirection::from_delta(0.004), TrendDirection::Unchanged);
        assert_eq!(TrendDirection::from_delta(-0.004), TrendDirection::Unchanged);
        assert_eq!(TrendDirection::from_delta(0.01), TrendDirection::Worsened);
        assert_eq!(TrendDirection::from_delta(-0.01), TrendDirection::Improved);
    }

    #[test]
    fn test_summary() {
        let points = build_trend(&[at(3, 5.0, 62.0), at(2, 5.0, 40.0), at(1, 5.0, 28.0)]);
        let summary = summarize(&points).expect("Non-empty");

        assert_eq!(summary.assessments, 3);
        assert!((summary.latest_score - 28.0).abs() < 1e-9);
        assert_eq!(summary.latest_level, RiskLevel::Low);
        assert!((summary.net_change + 34.0).abs() < 1e-9);
        assert_eq!(summary.direction, TrendDirection::Improved);
    }
}
