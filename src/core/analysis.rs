use crate::core::geometry::AreaOfInterest;
use crate::core::time_series::{TimeSeries, TimeSeriesBuilder};
use crate::io::source::ImageSource;
use crate::types::{DateRange, IceResult};

/// Supplies the run inputs: which lake, which dates, and whether to try again
pub trait AnalysisInputs {
    fn resolve_aoi(&mut self) -> IceResult<AreaOfInterest>;

    fn resolve_date_range(&mut self) -> IceResult<DateRange>;

    /// Called after a date range produced no usable observations; `None` gives up
    fn retry_date_range(&mut self, previous: &DateRange) -> IceResult<Option<DateRange>>;
}

/// Fixed inputs for non-interactive runs; never retries
#[derive(Debug, Clone)]
pub struct StaticInputs {
    pub aoi: AreaOfInterest,
    pub range: DateRange,
}

impl AnalysisInputs for StaticInputs {
    fn resolve_aoi(&mut self) -> IceResult<AreaOfInterest> {
        Ok(self.aoi.clone())
    }

    fn resolve_date_range(&mut self) -> IceResult<DateRange> {
        Ok(self.range)
    }

    fn retry_date_range(&mut self, _previous: &DateRange) -> IceResult<Option<DateRange>> {
        Ok(None)
    }
}

/// Result of a complete analysis run
#[derive(Debug)]
pub enum AnalysisOutcome {
    Series {
        aoi_name: String,
        range: DateRange,
        series: TimeSeries,
    },
    /// Every attempted date range came back empty
    NoData {
        aoi_name: String,
        last_range: DateRange,
    },
}

/// Resolve inputs, fetch acquisitions and build the series, retrying empty date ranges
pub struct IceAnalysis {
    builder: TimeSeriesBuilder,
}

impl IceAnalysis {
    pub fn new(builder: TimeSeriesBuilder) -> Self {
        Self { builder }
    }

    pub fn run(
        &self,
        inputs: &mut dyn AnalysisInputs,
        source: &dyn ImageSource,
    ) -> IceResult<AnalysisOutcome> {
        let aoi = inputs.resolve_aoi()?;
        let mut range = inputs.resolve_date_range()?;
        log::info!("Analyzing '{}' ({:.0} m²)", aoi.name(), aoi.area_m2());

        loop {
            log::info!("Fetching acquisitions for {}", range);
            let acquisitions = source.acquisitions(&aoi, &range)?;
            let series = self.builder.build(&aoi, &acquisitions)?;

            if !series.is_empty() {
                return Ok(AnalysisOutcome::Series {
                    aoi_name: aoi.name().to_string(),
                    range,
                    series,
                });
            }

            log::warn!("No valid SAR observations for {}", range);
            match inputs.retry_date_range(&range)? {
                Some(next) => range = next,
                None => {
                    return Ok(AnalysisOutcome::NoData {
                        aoi_name: aoi.name().to_string(),
                        last_range: range,
                    })
                }
            }
        }
    }
}

impl Default for IceAnalysis {
    fn default() -> Self {
        Self::new(TimeSeriesBuilder::new())
    }
}
