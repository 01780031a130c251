use crate::core::geometry::{pixel_weights, AoiWeighting, AreaOfInterest};
use crate::core::raster::DualPolRaster;
use crate::core::threshold::SeasonalThresholder;
use crate::types::{
    ClassificationResult, DataValidity, IceResult, Polarization, ValidityMask, Validity,
};
use chrono::{DateTime, Utc};
use ndarray::Zip;
use serde::{Deserialize, Serialize};

/// Clamped ice area and percent of a positive AOI area
///
/// The reduction itself never yields a negative area; the lower clamp only
/// guards raw areas handed in from elsewhere. The percent is capped at 100,
/// which happens when an externally supplied AOI area is smaller than the
/// polygon footprint.
pub fn coverage_percent(ice_area_m2: f64, aoi_area_m2: f64) -> (f64, f64) {
    let ice_area = ice_area_m2.max(0.0);
    let percent = 100.0 * ice_area / aoi_area_m2;
    if percent > 100.0 {
        log::debug!("Clamping ice coverage {:.4}% to 100%", percent);
    }
    (ice_area, percent.min(100.0))
}

/// Coverage reduction parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageParams {
    /// AOI overlap weighting for boundary pixels
    pub weighting: AoiWeighting,
}

/// Sums of a masked area reduction over the AOI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaReduction {
    /// Ice area in m² (weighted by AOI overlap)
    pub ice_area_m2: f64,
    /// Area of valid pixels overlapping the AOI
    pub valid_area_m2: f64,
    /// Area of invalid pixels overlapping the AOI
    pub invalid_area_m2: f64,
}

/// Ice/water classification and AOI ice fraction
pub struct CoverageCalculator {
    thresholder: SeasonalThresholder,
    params: CoverageParams,
}

impl CoverageCalculator {
    pub fn new() -> Self {
        Self {
            thresholder: SeasonalThresholder::new(),
            params: CoverageParams::default(),
        }
    }

    pub fn with_params(thresholder: SeasonalThresholder, params: CoverageParams) -> Self {
        Self { thresholder, params }
    }

    /// Per-pixel ice mask: VV above its threshold OR VH above its threshold
    ///
    /// Invalid pixels are never ice.
    pub fn ice_mask(
        &self,
        raster: &DualPolRaster,
        timestamp: &DateTime<Utc>,
    ) -> IceResult<ValidityMask> {
        let threshold_vv = self.thresholder.threshold_at(timestamp, Polarization::VV)?;
        let threshold_vh = self.thresholder.threshold_at(timestamp, Polarization::VH)?;
        log::debug!(
            "Ice thresholds for {}: VV > {} dB or VH > {} dB",
            timestamp.format("%Y-%m"),
            threshold_vv,
            threshold_vh
        );

        Ok(Zip::from(raster.vv())
            .and(raster.vh())
            .and(raster.valid_mask())
            .map_collect(|&vv, &vh, &valid| {
                valid && ((vv as f64) > threshold_vv || (vh as f64) > threshold_vh)
            }))
    }

    /// Area-weighted reduction of the ice mask over the AOI
    pub fn reduce(
        &self,
        aoi: &AreaOfInterest,
        raster: &DualPolRaster,
        ice_mask: &ValidityMask,
    ) -> IceResult<AreaReduction> {
        let weights = pixel_weights(aoi, raster.geo_transform(), raster.dim(), self.params.weighting)?;
        let pixel_area = raster.pixel_area();

        let mut reduction = AreaReduction {
            ice_area_m2: 0.0,
            valid_area_m2: 0.0,
            invalid_area_m2: 0.0,
        };
        Zip::from(&weights)
            .and(ice_mask)
            .and(raster.valid_mask())
            .for_each(|&w, &ice, &valid| {
                if w <= 0.0 {
                    return;
                }
                let area = w * pixel_area;
                if !valid {
                    reduction.invalid_area_m2 += area;
                    return;
                }
                reduction.valid_area_m2 += area;
                if ice {
                    reduction.ice_area_m2 += area;
                }
            });

        Ok(reduction)
    }

    /// Classify a filtered raster and compute the percentage of the AOI covered by ice
    ///
    /// Data problems yield an `Invalid` result; only configuration errors are `Err`.
    pub fn coverage(
        &self,
        aoi: &AreaOfInterest,
        filtered: &DualPolRaster,
        timestamp: DateTime<Utc>,
    ) -> IceResult<ClassificationResult> {
        let aoi_area = aoi.area_m2();
        let mut result = ClassificationResult {
            timestamp,
            date: timestamp.format("%Y-%m-%d").to_string(),
            ice_area_m2: 0.0,
            aoi_area_m2: aoi_area,
            ice_coverage_percent: None,
            invalid_pixel_fraction: 0.0,
            validity: Validity::Valid,
        };

        // Thresholds first so configuration errors surface regardless of the data
        let ice_mask = self.ice_mask(filtered, &timestamp)?;

        if !aoi_area.is_finite() || aoi_area <= 0.0 {
            result.validity = Validity::Invalid(DataValidity::ZeroAoiArea);
            return Ok(result);
        }
        if filtered.coordinate_system() != aoi.coordinate_system() {
            result.validity = Validity::Invalid(DataValidity::CrsMismatch {
                raster: filtered.coordinate_system(),
                aoi: aoi.coordinate_system(),
            });
            return Ok(result);
        }

        let reduction = self.reduce(aoi, filtered, &ice_mask)?;
        let overlap = reduction.valid_area_m2 + reduction.invalid_area_m2;
        if overlap > 0.0 {
            result.invalid_pixel_fraction = reduction.invalid_area_m2 / overlap;
        }
        if reduction.valid_area_m2 <= 0.0 {
            result.validity = Validity::Invalid(DataValidity::NoData);
            return Ok(result);
        }

        let (ice_area, percent) = coverage_percent(reduction.ice_area_m2, aoi_area);
        result.ice_area_m2 = ice_area;
        result.ice_coverage_percent = Some(percent);
        log::debug!(
            "{}: ice area {:.1} m² of {:.1} m² ({:.2}%)",
            result.date,
            ice_area,
            aoi_area,
            percent
        );
        Ok(result)
    }
}

impl Default for CoverageCalculator {
    fn default() -> Self {
        Self::new()
    }
}
