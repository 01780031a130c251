//! Core ice coverage processing modules

pub mod conversion;
pub mod raster;
pub mod speckle_filter;
pub mod threshold;
pub mod geometry;
pub mod coverage;
pub mod time_series;
pub mod analysis;
pub mod config;

// Re-export main types
pub use conversion::{to_db, to_natural};
pub use raster::DualPolRaster;
pub use speckle_filter::{SpeckleFilter, SpeckleFilterParams, LocalStatistics, adaptive_weight};
pub use threshold::{SeasonalThresholder, SeasonalThresholds, dynamic_threshold};
pub use geometry::{AreaOfInterest, Polygon, AoiWeighting, pixel_weights, polygon, rectangle};
pub use coverage::{coverage_percent, CoverageCalculator, CoverageParams, AreaReduction};
pub use time_series::{TimeSeries, TimeSeriesBuilder, CoverageRecord};
pub use analysis::{AnalysisInputs, AnalysisOutcome, IceAnalysis, StaticInputs};
pub use config::ProcessingConfig;
