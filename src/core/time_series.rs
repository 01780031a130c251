use crate::core::coverage::CoverageCalculator;
use crate::core::geometry::AreaOfInterest;
use crate::core::raster::DualPolRaster;
use crate::core::speckle_filter::SpeckleFilter;
use crate::types::{Acquisition, ClassificationResult, IceResult, SkippedAcquisition, Validity};
use chrono::NaiveDate;
use serde::Serialize;

/// One exported observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Ice Coverage (%)")]
    pub ice_coverage_percent: f64,
}

/// Chronologically ordered ice coverage observations for one AOI
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    entries: Vec<ClassificationResult>,
    skipped: Vec<SkippedAcquisition>,
}

impl TimeSeries {
    /// Valid results, ascending by timestamp
    pub fn entries(&self) -> &[ClassificationResult] {
        &self.entries
    }

    /// Acquisitions excluded from the series, ascending by timestamp
    pub fn skipped(&self) -> &[SkippedAcquisition] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.first().map(|r| r.timestamp.date_naive())
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|r| r.timestamp.date_naive())
    }

    pub fn records(&self) -> Vec<CoverageRecord> {
        self.entries
            .iter()
            .filter_map(|r| {
                r.ice_coverage_percent.map(|percent| CoverageRecord {
                    date: r.date.clone(),
                    ice_coverage_percent: percent,
                })
            })
            .collect()
    }
}

/// Drives filtering and classification over a set of acquisitions
pub struct TimeSeriesBuilder {
    filter: SpeckleFilter,
    calculator: CoverageCalculator,
}

enum Outcome {
    Valid(ClassificationResult),
    Skipped(SkippedAcquisition),
}

impl TimeSeriesBuilder {
    pub fn new() -> Self {
        Self {
            filter: SpeckleFilter::new(),
            calculator: CoverageCalculator::new(),
        }
    }

    pub fn with_components(filter: SpeckleFilter, calculator: CoverageCalculator) -> Self {
        Self { filter, calculator }
    }

    fn process(&self, aoi: &AreaOfInterest, acquisition: &Acquisition) -> IceResult<Outcome> {
        let timestamp = acquisition.timestamp;
        let raster = match DualPolRaster::from_acquisition(acquisition)? {
            Ok(raster) => raster,
            Err(reason) => return Ok(Outcome::Skipped(SkippedAcquisition { timestamp, reason })),
        };

        let filtered = self.filter.filter(&raster)?;
        let result = self.calculator.coverage(aoi, &filtered, timestamp)?;

        Ok(match result.validity.clone() {
            Validity::Valid => Outcome::Valid(result),
            Validity::Invalid(reason) => Outcome::Skipped(SkippedAcquisition { timestamp, reason }),
        })
    }

    /// Build the time series; invalid acquisitions are skipped, fatal errors abort
    pub fn build(&self, aoi: &AreaOfInterest, acquisitions: &[Acquisition]) -> IceResult<TimeSeries> {
        log::info!(
            "Building ice coverage time series for '{}' from {} acquisitions",
            aoi.name(),
            acquisitions.len()
        );

        #[cfg(feature = "parallel")]
        let outcomes: Vec<Outcome> = {
            use rayon::prelude::*;
            acquisitions
                .par_iter()
                .map(|acq| self.process(aoi, acq))
                .collect::<IceResult<Vec<_>>>()?
        };
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<Outcome> = acquisitions
            .iter()
            .map(|acq| self.process(aoi, acq))
            .collect::<IceResult<Vec<_>>>()?;

        let mut series = TimeSeries::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Valid(result) => series.entries.push(result),
                Outcome::Skipped(skipped) => {
                    log::warn!(
                        "Skipping acquisition {}: {}",
                        skipped.timestamp.to_rfc3339(),
                        skipped.reason
                    );
                    series.skipped.push(skipped);
                }
            }
        }

        series.entries.sort_by_key(|r| r.timestamp);
        series.skipped.sort_by_key(|s| s.timestamp);

        log::info!(
            "Time series complete: {} valid observations, {} skipped",
            series.entries.len(),
            series.skipped.len()
        );
        Ok(series)
    }
}

impl Default for TimeSeriesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::rectangle;
    use crate::types::{CoordinateSystem, DataValidity, GeoTransform, Polarization};
    use chrono::{TimeZone, Utc};
    use ndarray::Array2;

    const UTM18N: CoordinateSystem = CoordinateSystem::Projected { epsg: 32618 };

    fn aoi() -> AreaOfInterest {
        AreaOfInterest::new("lake", vec![rectangle(0.0, 0.0, 50.0, 50.0).unwrap()], UTM18N)
            .unwrap()
    }

    fn acquisition(day: u32, vv_db: f32) -> Acquisition {
        Acquisition::dual_pol(
            Utc.with_ymd_and_hms(2024, 1, day, 11, 0, 0).unwrap(),
            Array2::from_elem((5, 5), vv_db),
            Array2::from_elem((5, 5), -30.0),
            GeoTransform::north_up(0.0, 50.0, 10.0),
            UTM18N,
        )
    }

    #[test]
    fn test_empty_input_gives_empty_series() {
        let series = TimeSeriesBuilder::new().build(&aoi(), &[]).unwrap();
        assert!(series.is_empty());
        assert!(series.skipped().is_empty());
        assert_eq!(series.first_date(), None);
    }

    #[test]
    fn test_records_use_calendar_dates() {
        let series = TimeSeriesBuilder::new()
            .build(&aoi(), &[acquisition(2, -5.0), acquisition(1, -30.0)])
            .unwrap();
        let records = series.records();
        assert_eq!(records[0].date, "2024-01-01");
        assert_eq!(records[0].ice_coverage_percent, 0.0);
        assert_eq!(records[1].date, "2024-01-02");
        assert_eq!(records[1].ice_coverage_percent, 100.0);
    }

    #[test]
    fn test_missing_band_is_skipped() {
        let mut broken = acquisition(3, -5.0);
        broken.bands.remove(&Polarization::VV);

        let series = TimeSeriesBuilder::new()
            .build(&aoi(), &[broken, acquisition(4, -5.0)])
            .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.skipped().len(), 1);
        assert_eq!(
            series.skipped()[0].reason,
            DataValidity::MissingBand(Polarization::VV)
        );
    }
}
