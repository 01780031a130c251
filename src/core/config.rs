use crate::core::coverage::{CoverageCalculator, CoverageParams};
use crate::core::geometry::AoiWeighting;
use crate::core::speckle_filter::{SpeckleFilter, SpeckleFilterParams};
use crate::core::threshold::{SeasonalThresholder, SeasonalThresholds};
use crate::core::time_series::TimeSeriesBuilder;
use crate::types::{IceError, IceResult};
use serde::{Deserialize, Serialize};

/// Complete processing configuration for a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub filter: SpeckleFilterParams,
    pub thresholds: SeasonalThresholds,
    pub coverage: CoverageParams,
}

impl ProcessingConfig {
    pub fn validate(&self) -> IceResult<()> {
        self.filter.validate()?;

        let t = &self.thresholds;
        for (name, value) in [
            ("vv_winter_db", t.vv_winter_db),
            ("vv_other_db", t.vv_other_db),
            ("vh_winter_db", t.vh_winter_db),
            ("vh_other_db", t.vh_other_db),
        ] {
            if !value.is_finite() {
                return Err(IceError::InvalidArgument(format!(
                    "Threshold {} must be finite, got {}",
                    name, value
                )));
            }
        }

        if let AoiWeighting::Fractional { samples_per_axis: 0 } = self.coverage.weighting {
            return Err(IceError::InvalidArgument(
                "Fractional AOI weighting needs at least one sample per axis".to_string(),
            ));
        }
        Ok(())
    }

    /// Validated time series builder for this configuration
    pub fn builder(&self) -> IceResult<TimeSeriesBuilder> {
        self.validate()?;
        log::debug!("Processing configuration: {:?}", self);

        Ok(TimeSeriesBuilder::with_components(
            SpeckleFilter::with_params(self.filter.clone()),
            CoverageCalculator::with_params(
                SeasonalThresholder::with_thresholds(self.thresholds),
                self.coverage.clone(),
            ),
        ))
    }
}
