use crate::types::{
    Acquisition, BackscatterBand, CoordinateSystem, DataValidity, GeoTransform, IceError,
    IceResult, Polarization, ValidityMask,
};
use ndarray::Zip;

fn check_band_dimensions(vv: &BackscatterBand, vh: &BackscatterBand) -> IceResult<()> {
    if vv.dim() != vh.dim() {
        return Err(IceError::InvalidFormat(format!(
            "VV band {:?} and VH band {:?} have different dimensions",
            vv.dim(),
            vh.dim()
        )));
    }
    Ok(())
}

/// Dual-polarization backscatter raster in decibels
///
/// VV and VH always share the same grid; the validity mask has the same shape
/// and marks pixels usable in both bands.
#[derive(Debug, Clone)]
pub struct DualPolRaster {
    vv: BackscatterBand,
    vh: BackscatterBand,
    valid: ValidityMask,
    geo_transform: GeoTransform,
    coordinate_system: CoordinateSystem,
}

impl DualPolRaster {
    /// Build a raster from VV and VH bands; non-finite samples start out invalid
    pub fn new(
        vv: BackscatterBand,
        vh: BackscatterBand,
        geo_transform: GeoTransform,
        coordinate_system: CoordinateSystem,
    ) -> IceResult<Self> {
        check_band_dimensions(&vv, &vh)?;
        let valid = Zip::from(&vv)
            .and(&vh)
            .map_collect(|a, b| a.is_finite() && b.is_finite());
        Self::with_mask(vv, vh, valid, geo_transform, coordinate_system)
    }

    /// Build a raster with an explicit validity mask
    pub fn with_mask(
        vv: BackscatterBand,
        vh: BackscatterBand,
        valid: ValidityMask,
        geo_transform: GeoTransform,
        coordinate_system: CoordinateSystem,
    ) -> IceResult<Self> {
        check_band_dimensions(&vv, &vh)?;
        if valid.dim() != vv.dim() {
            return Err(IceError::InvalidFormat(format!(
                "Validity mask {:?} does not match band dimensions {:?}",
                valid.dim(),
                vv.dim()
            )));
        }
        let pixel_area = geo_transform.pixel_area();
        if !pixel_area.is_finite() || pixel_area <= 0.0 {
            return Err(IceError::InvalidFormat(format!(
                "Degenerate geotransform: {:?}",
                geo_transform
            )));
        }

        Ok(Self {
            vv,
            vh,
            valid,
            geo_transform,
            coordinate_system,
        })
    }

    /// Assemble the raster of an acquisition
    ///
    /// Missing bands and malformed rasters (band shape mismatch, degenerate
    /// geotransform) only disqualify this acquisition and come back as the
    /// inner `DataValidity`.
    pub fn from_acquisition(
        acquisition: &Acquisition,
    ) -> IceResult<Result<Self, DataValidity>> {
        let vv = match acquisition.bands.get(&Polarization::VV) {
            Some(band) => band.clone(),
            None => return Ok(Err(DataValidity::MissingBand(Polarization::VV))),
        };
        let vh = match acquisition.bands.get(&Polarization::VH) {
            Some(band) => band.clone(),
            None => return Ok(Err(DataValidity::MissingBand(Polarization::VH))),
        };

        match Self::new(vv, vh, acquisition.geo_transform, acquisition.coordinate_system) {
            Ok(raster) => Ok(Ok(raster)),
            Err(IceError::InvalidFormat(msg)) => Ok(Err(DataValidity::MalformedRaster(msg))),
            Err(e) => Err(e),
        }
    }

    pub fn band(&self, polarization: Polarization) -> Option<&BackscatterBand> {
        match polarization {
            Polarization::VV => Some(&self.vv),
            Polarization::VH => Some(&self.vh),
            _ => None,
        }
    }

    pub fn vv(&self) -> &BackscatterBand {
        &self.vv
    }

    pub fn vh(&self) -> &BackscatterBand {
        &self.vh
    }

    pub fn valid_mask(&self) -> &ValidityMask {
        &self.valid
    }

    pub fn geo_transform(&self) -> &GeoTransform {
        &self.geo_transform
    }

    pub fn coordinate_system(&self) -> CoordinateSystem {
        self.coordinate_system
    }

    /// (rows, columns)
    pub fn dim(&self) -> (usize, usize) {
        self.vv.dim()
    }

    pub fn pixel_size(&self) -> f64 {
        self.geo_transform.pixel_size()
    }

    pub fn pixel_area(&self) -> f64 {
        self.geo_transform.pixel_area()
    }

    pub fn invalid_pixel_count(&self) -> usize {
        self.valid.iter().filter(|v| !**v).count()
    }
}
