use crate::types::{IceError, IceResult, Polarization};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Ice/water decibel thresholds per polarization and season
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalThresholds {
    pub vv_winter_db: f64,
    pub vv_other_db: f64,
    pub vh_winter_db: f64,
    pub vh_other_db: f64,
}

impl Default for SeasonalThresholds {
    fn default() -> Self {
        Self {
            vv_winter_db: -12.0,
            vv_other_db: -18.0,
            vh_winter_db: -20.0,
            vh_other_db: -25.0,
        }
    }
}

/// December, January and February
pub fn is_winter_month(month: u32) -> bool {
    matches!(month, 12 | 1 | 2)
}

/// Month/polarization lookup of the ice threshold
#[derive(Debug, Clone, Default)]
pub struct SeasonalThresholder {
    thresholds: SeasonalThresholds,
}

impl SeasonalThresholder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: SeasonalThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &SeasonalThresholds {
        &self.thresholds
    }

    /// Threshold in dB above which a pixel of `polarization` counts as ice
    pub fn threshold(&self, month: u32, polarization: Polarization) -> IceResult<f64> {
        if !(1..=12).contains(&month) {
            return Err(IceError::InvalidArgument(format!(
                "Invalid month {}, expected 1-12",
                month
            )));
        }

        let winter = is_winter_month(month);
        let t = &self.thresholds;
        match polarization {
            Polarization::VV => Ok(if winter { t.vv_winter_db } else { t.vv_other_db }),
            Polarization::VH => Ok(if winter { t.vh_winter_db } else { t.vh_other_db }),
            other => Err(IceError::InvalidArgument(format!(
                "Invalid polarization {}. Choose VV or VH",
                other
            ))),
        }
    }

    /// Threshold for the calendar month of `timestamp`
    pub fn threshold_at(&self, timestamp: &DateTime<Utc>, polarization: Polarization) -> IceResult<f64> {
        self.threshold(timestamp.month(), polarization)
    }
}

/// Threshold from the default seasonal table
pub fn dynamic_threshold(month: u32, polarization: Polarization) -> IceResult<f64> {
    SeasonalThresholder::new().threshold(month, polarization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_winter_thresholds() {
        for month in [12, 1, 2] {
            assert_eq!(dynamic_threshold(month, Polarization::VV).unwrap(), -12.0);
            assert_eq!(dynamic_threshold(month, Polarization::VH).unwrap(), -20.0);
        }
    }

    #[test]
    fn test_other_month_thresholds() {
        for month in 3..=11 {
            assert_eq!(dynamic_threshold(month, Polarization::VV).unwrap(), -18.0);
            assert_eq!(dynamic_threshold(month, Polarization::VH).unwrap(), -25.0);
        }
    }

    #[test]
    fn test_unsupported_polarization_is_configuration_error() {
        for pol in [Polarization::HH, Polarization::HV] {
            match dynamic_threshold(1, pol) {
                Err(IceError::InvalidArgument(msg)) => assert!(msg.contains(&pol.to_string())),
                other => panic!("expected InvalidArgument, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_invalid_month() {
        assert!(dynamic_threshold(0, Polarization::VV).is_err());
        assert!(dynamic_threshold(13, Polarization::VH).is_err());
    }

    #[test]
    fn test_threshold_from_timestamp() {
        let thresholder = SeasonalThresholder::new();
        let february = Utc.with_ymd_and_hms(2024, 2, 29, 22, 45, 0).unwrap();
        let march = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(thresholder.threshold_at(&february, Polarization::VV).unwrap(), -12.0);
        assert_eq!(thresholder.threshold_at(&march, Polarization::VV).unwrap(), -18.0);
    }
}
