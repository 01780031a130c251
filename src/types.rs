use chrono::{DateTime, NaiveDate, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Real-valued backscatter band in decibels (row x column)
pub type BackscatterBand = Array2<f32>;

/// Per-pixel validity mask (true = usable sample)
pub type ValidityMask = Array2<bool>;

/// Coordinate system enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinateSystem {
    /// Geographic coordinates (latitude, longitude in degrees)
    Geographic,
    /// Projected coordinates in meters (e.g., UTM)
    Projected { epsg: u32 },
}

impl CoordinateSystem {
    pub fn is_projected(&self) -> bool {
        matches!(self, CoordinateSystem::Projected { .. })
    }
}

impl std::fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinateSystem::Geographic => write!(f, "geographic"),
            CoordinateSystem::Projected { epsg } => write!(f, "EPSG:{}", epsg),
        }
    }
}

/// Polarization modes for Sentinel-1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarization {
    VV,
    VH,
    HV,
    HH,
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarization::VV => write!(f, "VV"),
            Polarization::VH => write!(f, "VH"),
            Polarization::HV => write!(f, "HV"),
            Polarization::HH => write!(f, "HH"),
        }
    }
}

impl std::str::FromStr for Polarization {
    type Err = IceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "VV" => Ok(Polarization::VV),
            "VH" => Ok(Polarization::VH),
            "HV" => Ok(Polarization::HV),
            "HH" => Ok(Polarization::HH),
            _ => Err(IceError::InvalidArgument(format!("Invalid polarization: {}", s))),
        }
    }
}

/// Geospatial transformation parameters (GDAL coefficient order)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform with square pixels of `pixel_size` meters
    pub fn north_up(top_left_x: f64, top_left_y: f64, pixel_size: f64) -> Self {
        Self {
            top_left_x,
            pixel_width: pixel_size,
            rotation_x: 0.0,
            top_left_y,
            rotation_y: 0.0,
            pixel_height: -pixel_size,
        }
    }

    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    /// Map fractional pixel coordinates (column, row) to projected (x, y)
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.top_left_x + col * self.pixel_width + row * self.rotation_x;
        let y = self.top_left_y + col * self.rotation_y + row * self.pixel_height;
        (x, y)
    }

    /// Ground area covered by one pixel
    pub fn pixel_area(&self) -> f64 {
        (self.pixel_width * self.pixel_height - self.rotation_x * self.rotation_y).abs()
    }

    /// Nominal pixel size (square root of the pixel area)
    pub fn pixel_size(&self) -> f64 {
        self.pixel_area().sqrt()
    }
}

/// Half-open calendar date range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> IceResult<Self> {
        if end <= start {
            return Err(IceError::InvalidArgument(format!(
                "End date {} must be after start date {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// A range covering only `day`
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day.succ_opt().unwrap_or(NaiveDate::MAX),
        }
    }

    /// Parse `YYYY-MM-DD` dates; a missing or blank end means a single day
    pub fn parse(start: &str, end: Option<&str>) -> IceResult<Self> {
        let start = parse_date(start)?;
        match end.map(str::trim).filter(|e| !e.is_empty()) {
            Some(end) => Self::new(start, parse_date(end)?),
            None => Ok(Self::single_day(start)),
        }
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        let day = timestamp.date_naive();
        day >= self.start && day < self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Parse an ISO calendar date (`YYYY-MM-DD`)
pub fn parse_date(value: &str) -> IceResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        IceError::InvalidArgument(format!("Invalid date '{}' (expected YYYY-MM-DD): {}", value, e))
    })
}

/// One timestamped radar image as delivered by an image source
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub timestamp: DateTime<Utc>,
    pub bands: HashMap<Polarization, BackscatterBand>,
    pub geo_transform: GeoTransform,
    pub coordinate_system: CoordinateSystem,
}

impl Acquisition {
    /// Dual-polarization acquisition from VV and VH bands
    pub fn dual_pol(
        timestamp: DateTime<Utc>,
        vv: BackscatterBand,
        vh: BackscatterBand,
        geo_transform: GeoTransform,
        coordinate_system: CoordinateSystem,
    ) -> Self {
        let mut bands = HashMap::new();
        bands.insert(Polarization::VV, vv);
        bands.insert(Polarization::VH, vh);
        Self {
            timestamp,
            bands,
            geo_transform,
            coordinate_system,
        }
    }
}

/// Reasons an acquisition cannot produce a valid classification
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataValidity {
    #[error("area of interest has zero area")]
    ZeroAoiArea,

    #[error("raster is missing the {0} band")]
    MissingBand(Polarization),

    #[error("malformed raster: {0}")]
    MalformedRaster(String),

    #[error("raster coordinate system {raster} does not match AOI coordinate system {aoi}")]
    CrsMismatch {
        raster: CoordinateSystem,
        aoi: CoordinateSystem,
    },

    #[error("no valid pixels overlap the area of interest")]
    NoData,
}

/// Validity flag attached to a classification
#[derive(Debug, Clone, PartialEq)]
pub enum Validity {
    Valid,
    Invalid(DataValidity),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }
}

/// Per-acquisition ice classification
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub timestamp: DateTime<Utc>,
    /// Acquisition day, `YYYY-MM-DD`
    pub date: String,
    pub ice_area_m2: f64,
    pub aoi_area_m2: f64,
    /// Ice coverage in percent (0-100), present only for valid results
    pub ice_coverage_percent: Option<f64>,
    /// Share of AOI-overlapping pixels that were unusable after filtering
    pub invalid_pixel_fraction: f64,
    pub validity: Validity,
}

impl ClassificationResult {
    pub fn is_valid(&self) -> bool {
        self.validity.is_valid()
    }
}

/// Acquisition excluded from a time series
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedAcquisition {
    pub timestamp: DateTime<Utc>,
    pub reason: DataValidity,
}

/// Error types for ice coverage processing
#[derive(Debug, thiserror::Error)]
pub enum IceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for ice coverage operations
pub type IceResult<T> = Result<T, IceError>;
