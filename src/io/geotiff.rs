use crate::core::geometry::AreaOfInterest;
use crate::io::source::{parse_product_timestamp, polarization_from_filename, ImageSource};
use crate::types::{
    Acquisition, BackscatterBand, CoordinateSystem, DateRange, GeoTransform, IceError, IceResult,
    Polarization,
};
use chrono::{DateTime, Utc};
use gdal::raster::RasterBand;
use gdal::{Dataset, Metadata};
use ndarray::Array2;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Directory of calibrated backscatter GeoTIFFs (dB), one acquisition per timestamp
///
/// Files carry the sensing time in their name (`..._YYYYMMDDTHHMMSS_...`). A
/// file either holds one polarization (tagged in its name, e.g. `-vv-`) or both,
/// identified by band description or by band order (1 = VV, 2 = VH).
pub struct GeotiffImageSource {
    dir: PathBuf,
}

struct GeoRaster {
    bands: HashMap<Polarization, BackscatterBand>,
    geo_transform: GeoTransform,
    coordinate_system: CoordinateSystem,
}

impl GeotiffImageSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// GeoTIFF files in the directory grouped by sensing time
    fn scan(&self) -> IceResult<BTreeMap<DateTime<Utc>, Vec<PathBuf>>> {
        let mut groups: BTreeMap<DateTime<Utc>, Vec<PathBuf>> = BTreeMap::new();

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_tiff = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
                .unwrap_or(false);
            if !is_tiff {
                continue;
            }

            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            match parse_product_timestamp(name) {
                Some(timestamp) => groups.entry(timestamp).or_default().push(path),
                None => log::warn!("No acquisition time in file name {}, skipping", path.display()),
            }
        }

        Ok(groups)
    }

    fn read_band(band: &RasterBand, width: usize, height: usize) -> IceResult<BackscatterBand> {
        let buffer = band.read_as::<f32>((0, 0), (width, height), (width, height), None)?;
        let mut data = Array2::from_shape_vec((height, width), buffer.data)
            .map_err(|e| IceError::InvalidFormat(format!("Failed to reshape band data: {}", e)))?;

        if let Some(no_data) = band.no_data_value() {
            let no_data = no_data as f32;
            data.mapv_inplace(|v| if v == no_data { f32::NAN } else { v });
        }
        Ok(data)
    }

    fn coordinate_system(dataset: &Dataset) -> IceResult<CoordinateSystem> {
        let srs = dataset.spatial_ref()?;
        if srs.to_proj4()?.contains("+proj=longlat") {
            return Ok(CoordinateSystem::Geographic);
        }
        let epsg = srs.auth_code().map_err(|e| {
            IceError::InvalidFormat(format!("Projected raster without EPSG code: {}", e))
        })?;
        Ok(CoordinateSystem::Projected { epsg: epsg as u32 })
    }

    fn read_file(path: &Path) -> IceResult<GeoRaster> {
        log::debug!("Reading backscatter raster: {}", path.display());

        let dataset = Dataset::open(path)?;
        let (width, height) = dataset.raster_size();
        let geo_transform = GeoTransform::from_gdal(dataset.geo_transform()?);
        let coordinate_system = Self::coordinate_system(&dataset)?;

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let tagged = polarization_from_filename(name);

        let mut bands = HashMap::new();
        for index in 1..=dataset.raster_count() {
            let band = dataset.rasterband(index)?;
            let polarization = match tagged {
                Some(pol) if index == 1 => Some(pol),
                Some(_) => None,
                None => band
                    .description()
                    .ok()
                    .and_then(|d| d.parse::<Polarization>().ok())
                    .or(match index {
                        1 => Some(Polarization::VV),
                        2 => Some(Polarization::VH),
                        _ => None,
                    }),
            };
            if let Some(pol) = polarization {
                bands.insert(pol, Self::read_band(&band, width, height)?);
            }
        }

        Ok(GeoRaster {
            bands,
            geo_transform,
            coordinate_system,
        })
    }
}

impl ImageSource for GeotiffImageSource {
    fn acquisitions(&self, _aoi: &AreaOfInterest, range: &DateRange) -> IceResult<Vec<Acquisition>> {
        log::info!("Scanning {} for acquisitions in {}", self.dir.display(), range);

        let mut acquisitions = Vec::new();
        for (timestamp, paths) in self.scan()? {
            if !range.contains(&timestamp) {
                continue;
            }

            let mut merged: Option<GeoRaster> = None;
            for path in &paths {
                let raster = Self::read_file(path)?;
                match merged.as_mut() {
                    None => merged = Some(raster),
                    Some(existing) => {
                        if existing.geo_transform != raster.geo_transform {
                            return Err(IceError::InvalidFormat(format!(
                                "Files for {} have different geotransforms",
                                timestamp.to_rfc3339()
                            )));
                        }
                        existing.bands.extend(raster.bands);
                    }
                }
            }

            if let Some(raster) = merged {
                acquisitions.push(Acquisition {
                    timestamp,
                    bands: raster.bands,
                    geo_transform: raster.geo_transform,
                    coordinate_system: raster.coordinate_system,
                });
            }
        }

        log::info!("Loaded {} acquisitions", acquisitions.len());
        Ok(acquisitions)
    }
}
