use crate::core::geometry::AreaOfInterest;
use crate::types::{Acquisition, DateRange, IceResult, Polarization};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Supplier of calibrated dual-polarization acquisitions
///
/// Implementations return the acquisitions intersecting `aoi` whose timestamp
/// falls inside `range`, in any order.
pub trait ImageSource {
    fn acquisitions(&self, aoi: &AreaOfInterest, range: &DateRange) -> IceResult<Vec<Acquisition>>;
}

/// Image source backed by acquisitions already in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryImageSource {
    acquisitions: Vec<Acquisition>,
}

impl MemoryImageSource {
    pub fn new(acquisitions: Vec<Acquisition>) -> Self {
        Self { acquisitions }
    }

    pub fn push(&mut self, acquisition: Acquisition) {
        self.acquisitions.push(acquisition);
    }

    pub fn len(&self) -> usize {
        self.acquisitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acquisitions.is_empty()
    }
}

impl ImageSource for MemoryImageSource {
    fn acquisitions(&self, _aoi: &AreaOfInterest, range: &DateRange) -> IceResult<Vec<Acquisition>> {
        let selected: Vec<Acquisition> = self
            .acquisitions
            .iter()
            .filter(|acq| range.contains(&acq.timestamp))
            .cloned()
            .collect();

        log::debug!(
            "Memory source: {} of {} acquisitions within {}",
            selected.len(),
            self.acquisitions.len(),
            range
        );
        Ok(selected)
    }
}

static PRODUCT_TIMESTAMP: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(\d{8}T\d{6})").ok());

static POLARIZATION_TAG: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)[-_.](vv|vh|hv|hh)[-_.]").ok());

/// Sensing start time from a Sentinel-1 product or file name
///
/// e.g. `S1A_IW_GRDH_1SDV_20240115T110327_20240115T110352_052100_064C0F_8E3A`
pub fn parse_product_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let captures = PRODUCT_TIMESTAMP.as_ref()?.captures(name)?;
    let stamp = captures.get(1)?.as_str();
    NaiveDateTime::parse_from_str(stamp, "%Y%m%dT%H%M%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Polarization tag embedded in a file name (`-vv-`, `_VH.tif`, ...)
pub fn polarization_from_filename(filename: &str) -> Option<Polarization> {
    let captures = POLARIZATION_TAG.as_ref()?.captures(filename)?;
    captures.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::rectangle;
    use crate::types::{CoordinateSystem, GeoTransform};
    use ndarray::Array2;

    #[test]
    fn test_parse_product_timestamp() {
        let ts = parse_product_timestamp(
            "S1A_IW_GRDH_1SDV_20240115T110327_20240115T110352_052100_064C0F_8E3A.tif",
        )
        .unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 15, 11, 3, 27).unwrap());
        assert!(parse_product_timestamp("lake_scene.tif").is_none());
    }

    #[test]
    fn test_polarization_from_filename() {
        assert_eq!(
            polarization_from_filename("s1a-iw-grd-vv-20240115t110327.tiff"),
            Some(Polarization::VV)
        );
        assert_eq!(
            polarization_from_filename("scene_20240115T110327_VH.tif"),
            Some(Polarization::VH)
        );
        assert_eq!(polarization_from_filename("scene_20240115T110327.tif"), None);
    }

    #[test]
    fn test_file_name_patterns_compile_once() {
        assert!(PRODUCT_TIMESTAMP.is_some());
        assert!(POLARIZATION_TAG.is_some());

        let names: Vec<String> = (1..=28)
            .map(|day| format!("S1A_IW_GRDH_1SDV_202402{:02}T053015_vh.tif", day))
            .collect();
        let parsed: Vec<_> = names.iter().filter_map(|n| parse_product_timestamp(n)).collect();
        assert_eq!(parsed.len(), 28);
        assert!(names
            .iter()
            .all(|n| polarization_from_filename(n) == Some(Polarization::VH)));
    }

    #[test]
    fn test_memory_source_filters_by_range() {
        let crs = CoordinateSystem::Projected { epsg: 32618 };
        let aoi = AreaOfInterest::new(
            "lake",
            vec![rectangle(0.0, 0.0, 10.0, 10.0).unwrap()],
            crs,
        )
        .unwrap();
        let make = |day| {
            Acquisition::dual_pol(
                Utc.with_ymd_and_hms(2024, 1, day, 11, 0, 0).unwrap(),
                Array2::zeros((1, 1)),
                Array2::zeros((1, 1)),
                GeoTransform::north_up(0.0, 10.0, 10.0),
                crs,
            )
        };
        let source = MemoryImageSource::new(vec![make(1), make(5), make(10)]);
        let range = DateRange::parse("2024-01-01", Some("2024-01-10")).unwrap();

        let selected = source.acquisitions(&aoi, &range).unwrap();
        assert_eq!(selected.len(), 2);
    }
}
