//! icecover: Lake Ice Coverage from Dual-Polarization SAR
//!
//! This library turns calibrated Sentinel-1 VV/VH backscatter (dB) into a
//! per-lake ice coverage time series: speckle filtering, seasonal thresholding,
//! area-weighted coverage over the lake polygon and CSV export.

pub mod types;
pub mod io;
pub mod core;

#[cfg(feature = "python")]
mod python;

// Re-export main types and functions for easier access
pub use types::{
    Acquisition, BackscatterBand, ClassificationResult, CoordinateSystem, DataValidity, DateRange,
    GeoTransform, IceError, IceResult, Polarization, SkippedAcquisition, Validity, ValidityMask,
};

pub use crate::core::{
    AnalysisInputs, AnalysisOutcome, AreaOfInterest, CoverageCalculator, DualPolRaster,
    IceAnalysis, Polygon, ProcessingConfig, SeasonalThresholder, SpeckleFilter, StaticInputs, TimeSeries,
    TimeSeriesBuilder,
};

pub use io::{export_csv, ImageSource, MemoryImageSource, PromptInputs};
