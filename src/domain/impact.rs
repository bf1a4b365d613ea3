//! Price impact thresholds applied to every quote before execution.

use thiserror::Error;

/// Impact above this many percent attaches a warning to the preview.
pub const IMPACT_WARN_PCT: f64 = 5.0;

/// Impact above this many percent rejects the swap outright.
pub const IMPACT_REJECT_PCT: f64 = 10.0;

#[derive(Debug, Error, PartialEq)]
pub enum ImpactError {
    #[error("High price impact: {actual:.2}%. This swap may not be profitable.")]
    TooHigh { actual: f64 },
}

/// Rejects quotes whose impact exceeds the hard ceiling.
pub fn enforce_impact_ceiling(impact_pct: f64) -> Result<(), ImpactError> {
    if impact_pct > IMPACT_REJECT_PCT {
        return Err(ImpactError::TooHigh { actual: impact_pct });
    }
    Ok(())
}

/// Impact worth warning the user about, below the rejection ceiling.
pub fn impact_warning(impact_pct: f64) -> Option<f64> {
    if impact_pct > IMPACT_WARN_PCT {
        Some(impact_pct)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_at_and_below_ceiling() {
        assert!(enforce_impact_ceiling(0.0).is_ok());
        assert!(enforce_impact_ceiling(9.99).is_ok());
        assert!(enforce_impact_ceiling(10.0).is_ok());
    }

    #[test]
    fn rejects_above_ceiling() {
        let err = enforce_impact_ceiling(10.01).unwrap_err();
        assert_eq!(err, ImpactError::TooHigh { actual: 10.01 });
        assert_eq!(
            err.to_string(),
            "High price impact: 10.01%. This swap may not be profitable."
        );
    }

    #[test]
    fn impact_message_uses_two_decimals() {
        let err = enforce_impact_ceiling(12.5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "High price impact: 12.50%. This swap may not be profitable."
        );
    }

    #[test]
    fn warns_only_between_thresholds() {
        assert_eq!(impact_warning(5.0), None);
        assert_eq!(impact_warning(5.1), Some(5.1));
        assert_eq!(impact_warning(12.0), Some(12.0));
        assert_eq!(impact_warning(0.3), None);
    }
}
