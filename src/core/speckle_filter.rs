use crate::core::conversion::{to_db, to_natural};
use crate::core::raster::DualPolRaster;
use crate::types::{BackscatterBand, IceError, IceResult, ValidityMask};
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

/// Speckle filtering parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeckleFilterParams {
    /// Filter window size (must be odd)
    pub window_size: usize,
}

impl Default for SpeckleFilterParams {
    fn default() -> Self {
        Self {
            window_size: 3, // 3x3 unweighted neighborhood
        }
    }
}

impl SpeckleFilterParams {
    pub fn validate(&self) -> IceResult<()> {
        if self.window_size < 3 || self.window_size % 2 == 0 {
            return Err(IceError::InvalidArgument(format!(
                "Window size must be odd and at least 3, got {}",
                self.window_size
            )));
        }
        Ok(())
    }
}

/// Mean and population variance of the valid samples in a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalStatistics {
    pub mean: f64,
    pub variance: f64,
    pub count: usize,
}

/// Adaptive Lee weight `b = (var - noise_var·mean²) / var` with `noise_var = var / mean²`
///
/// A homogeneous window (`var == 0`) gets `b = 0`.
pub fn adaptive_weight(mean: f64, variance: f64) -> f64 {
    if variance == 0.0 {
        return 0.0;
    }
    let mean_sq = mean * mean;
    let noise_var = variance / mean_sq;
    (variance - noise_var * mean_sq) / variance
}

/// Refined Lee speckle filter working on linear power values
///
/// Edge pixels use a reduced neighborhood: only in-bounds, valid neighbors
/// contribute to the local statistics.
pub struct SpeckleFilter {
    params: SpeckleFilterParams,
}

impl SpeckleFilter {
    /// Create a new speckle filter with default parameters
    pub fn new() -> Self {
        Self {
            params: SpeckleFilterParams::default(),
        }
    }

    /// Create a speckle filter with custom parameters
    pub fn with_params(params: SpeckleFilterParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SpeckleFilterParams {
        &self.params
    }

    /// Filter both bands of a raster
    ///
    /// The output keeps dimensions, georeferencing and band names. Pixels whose
    /// filtered linear value has no logarithm are NaN and marked invalid.
    pub fn filter(&self, raster: &DualPolRaster) -> IceResult<DualPolRaster> {
        self.params.validate()?;

        let (rows, cols) = raster.dim();
        log::info!("Applying Refined Lee speckle filter to {}x{} raster", rows, cols);
        log::debug!("Filter parameters: {:?}", self.params);

        let valid_in = raster.valid_mask();
        let vv = self.filter_band(raster.vv(), valid_in);
        let vh = self.filter_band(raster.vh(), valid_in);

        let valid = Zip::from(valid_in)
            .and(&vv)
            .and(&vh)
            .map_collect(|&ok, vv_db, vh_db| ok && vv_db.is_finite() && vh_db.is_finite());

        let filtered = DualPolRaster::with_mask(
            vv,
            vh,
            valid,
            *raster.geo_transform(),
            raster.coordinate_system(),
        )?;

        let newly_invalid = filtered
            .invalid_pixel_count()
            .saturating_sub(raster.invalid_pixel_count());
        if newly_invalid > 0 {
            log::debug!("{} pixels became invalid during filtering", newly_invalid);
        }
        log::info!("Speckle filtering completed successfully");
        Ok(filtered)
    }

    /// Filter a single decibel band; invalid input pixels come out as NaN
    pub fn filter_band(&self, band_db: &BackscatterBand, valid: &ValidityMask) -> BackscatterBand {
        let natural: Array2<f64> = band_db.mapv(|db| to_natural(db as f64));
        let half_window = self.params.window_size / 2;

        let refine = |(i, j): (usize, usize)| -> f32 {
            self.refine_pixel(&natural, valid, i, j, half_window)
                .map(|db| db as f32)
                .unwrap_or(f32::NAN)
        };

        #[cfg(feature = "parallel")]
        let filtered = Zip::indexed(band_db).par_map_collect(|idx, _| refine(idx));
        #[cfg(not(feature = "parallel"))]
        let filtered = Zip::indexed(band_db).map_collect(|idx, _| refine(idx));

        filtered
    }

    fn refine_pixel(
        &self,
        natural: &Array2<f64>,
        valid: &ValidityMask,
        i: usize,
        j: usize,
        half_window: usize,
    ) -> Option<f64> {
        if !valid[[i, j]] {
            return None;
        }
        let stats = Self::local_statistics(natural, valid, i, j, half_window)?;

        let b = adaptive_weight(stats.mean, stats.variance);
        let filtered = stats.mean + b * (natural[[i, j]] - stats.mean);
        to_db(filtered)
    }

    /// Local statistics over the window centered on (`center_i`, `center_j`)
    pub fn local_statistics(
        image: &Array2<f64>,
        valid: &ValidityMask,
        center_i: usize,
        center_j: usize,
        half_window: usize,
    ) -> Option<LocalStatistics> {
        let (height, width) = image.dim();

        let i_start = center_i.saturating_sub(half_window);
        let i_end = (center_i + half_window + 1).min(height);
        let j_start = center_j.saturating_sub(half_window);
        let j_end = (center_j + half_window + 1).min(width);

        let mut values = Vec::with_capacity((2 * half_window + 1).pow(2));
        for i in i_start..i_end {
            for j in j_start..j_end {
                let pixel_val = image[[i, j]];
                if valid[[i, j]] && pixel_val.is_finite() {
                    values.push(pixel_val);
                }
            }
        }

        let first = *values.first()?;
        let count = values.len();

        // Exact statistics for a homogeneous window
        if values.iter().all(|&v| v == first) {
            return Some(LocalStatistics {
                mean: first,
                variance: 0.0,
                count,
            });
        }

        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / count as f64;

        Some(LocalStatistics {
            mean,
            variance,
            count,
        })
    }
}

impl Default for SpeckleFilter {
    fn default() -> Self {
        Self::new()
    }
}
