//! Health score: a bounded summary of scan risk.

use serde::{Deserialize, Serialize};

/// Points deducted per detected threat.
pub const PENALTY_PER_THREAT: usize = 5;

/// Scores strictly above this value are healthy.
pub const HEALTHY_ABOVE: u8 = 80;

/// `max(0, 100 - 5 * threat_count)`.
pub fn score(threat_count: usize) -> u8 {
    let penalty = threat_count.saturating_mul(PENALTY_PER_THREAT);
    100usize.saturating_sub(penalty) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    AtRisk,
}

impl HealthStatus {
    pub fn classify(score: u8) -> Self {
        if score > HEALTHY_ABOVE {
            Self::Healthy
        } else {
            Self::AtRisk
        }
    }

    /// Operator-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "Excellent",
            Self::AtRisk => "Risk Detected",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::AtRisk => write!(f, "at risk"),
        }
    }
}

/// A score together with its classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthScore {
    pub value: u8,
    pub status: HealthStatus,
}

impl HealthScore {
    pub fn from_threat_count(threat_count: usize) -> Self {
        let value = score(threat_count);
        Self {
            value,
            status: HealthStatus::classify(value),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

impl std::fmt::Display for HealthScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fixed_points() {
        assert_eq!(score(0), 100);
        assert_eq!(score(3), 85);
        assert_eq!(score(19), 5);
        assert_eq!(score(20), 0);
        assert_eq!(score(25), 0);
        assert_eq!(score(usize::MAX), 0);
    }

    #[test]
    fn threshold_is_exclusive() {
        assert_eq!(HealthStatus::classify(85), HealthStatus::Healthy);
        assert_eq!(HealthStatus::classify(81), HealthStatus::Healthy);
        assert_eq!(HealthStatus::classify(80), HealthStatus::AtRisk);
        assert_eq!(HealthStatus::classify(0), HealthStatus::AtRisk);
    }

    #[test]
    fn four_threats_is_the_first_at_risk_count() {
        assert!(HealthScore::from_threat_count(3).is_healthy());
        assert!(!HealthScore::from_threat_count(4).is_healthy());
        assert_eq!(HealthScore::from_threat_count(4).status.label(), "Risk Detected");
    }

    proptest! {
        #[test]
        fn matches_closed_form(n in 0usize..10_000) {
            let expected = (100i64 - 5 * n as i64).max(0);
            prop_assert_eq!(score(n) as i64, expected);
        }

        #[test]
        fn never_increases(n in 0usize..10_000) {
            prop_assert!(score(n + 1) <= score(n));
        }
    }
}
