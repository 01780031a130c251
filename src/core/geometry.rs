//! Planar AOI geometry: polygons in a projected coordinate system, their area,
//! and the per-pixel overlap weights used when reducing a raster over the AOI.

use crate::types::{CoordinateSystem, GeoTransform, IceError, IceResult};
use geo::{Area, BoundingRect, Contains};
use geo_types::{LineString, MultiPolygon, Point};
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

pub use geo_types::Polygon;

fn ring(mut coords: Vec<(f64, f64)>) -> IceResult<LineString<f64>> {
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    if coords.len() < 3 {
        return Err(IceError::InvalidArgument(format!(
            "Polygon ring needs at least 3 distinct vertices, got {}",
            coords.len()
        )));
    }
    if coords.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(IceError::InvalidArgument(
            "Polygon ring contains non-finite coordinates".to_string(),
        ));
    }
    Ok(LineString::from(coords))
}

/// Polygon from projected (x, y) rings; rings may be open or closed
pub fn polygon(exterior: Vec<(f64, f64)>, holes: Vec<Vec<(f64, f64)>>) -> IceResult<Polygon<f64>> {
    let exterior = ring(exterior)?;
    let holes = holes.into_iter().map(ring).collect::<IceResult<Vec<_>>>()?;
    Ok(Polygon::new(exterior, holes))
}

/// Axis-aligned rectangle
pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> IceResult<Polygon<f64>> {
    polygon(
        vec![(min_x, min_y), (max_x, min_y), (max_x, max_y), (min_x, max_y)],
        Vec::new(),
    )
}

/// Waterbody polygon(s) under analysis, fixed for the duration of a run
#[derive(Debug, Clone, PartialEq)]
pub struct AreaOfInterest {
    name: String,
    geometry: MultiPolygon<f64>,
    coordinate_system: CoordinateSystem,
    area_m2: f64,
}

impl AreaOfInterest {
    /// AOI whose area is computed from the polygons
    pub fn new(
        name: impl Into<String>,
        polygons: Vec<Polygon<f64>>,
        coordinate_system: CoordinateSystem,
    ) -> IceResult<Self> {
        let area_m2 = MultiPolygon::new(polygons.clone()).unsigned_area();
        Self::with_area(name, polygons, coordinate_system, area_m2)
    }

    /// AOI with an area supplied by an external geometry service
    pub fn with_area(
        name: impl Into<String>,
        polygons: Vec<Polygon<f64>>,
        coordinate_system: CoordinateSystem,
        area_m2: f64,
    ) -> IceResult<Self> {
        if !coordinate_system.is_projected() {
            return Err(IceError::InvalidArgument(
                "Area of interest must be in a projected coordinate system (meters)".to_string(),
            ));
        }
        if polygons.is_empty() {
            return Err(IceError::InvalidArgument(
                "Area of interest has no polygons".to_string(),
            ));
        }

        Ok(Self {
            name: name.into(),
            geometry: MultiPolygon::new(polygons),
            coordinate_system,
            area_m2,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    pub fn coordinate_system(&self) -> CoordinateSystem {
        self.coordinate_system
    }

    pub fn area_m2(&self) -> f64 {
        self.area_m2
    }

    /// Strict interior test; points on the boundary are outside
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.geometry.contains(&Point::new(x, y))
    }

    /// (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        match self.geometry.bounding_rect() {
            Some(rect) => (rect.min().x, rect.min().y, rect.max().x, rect.max().y),
            None => (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }
}

/// How much of a pixel counts as inside the AOI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AoiWeighting {
    /// Whole pixel if its center is inside
    PixelCenter,
    /// Fraction of an n×n grid of sample points inside (partial-pixel overlap)
    Fractional { samples_per_axis: usize },
}

impl Default for AoiWeighting {
    fn default() -> Self {
        AoiWeighting::Fractional { samples_per_axis: 4 }
    }
}

/// Per-pixel AOI overlap in [0, 1] for a raster grid of `dim` (rows, columns)
pub fn pixel_weights(
    aoi: &AreaOfInterest,
    geo_transform: &GeoTransform,
    dim: (usize, usize),
    weighting: AoiWeighting,
) -> IceResult<Array2<f64>> {
    let offsets: Vec<f64> = match weighting {
        AoiWeighting::PixelCenter => vec![0.5],
        AoiWeighting::Fractional { samples_per_axis: 0 } => {
            return Err(IceError::InvalidArgument(
                "Fractional weighting needs at least one sample per axis".to_string(),
            ))
        }
        AoiWeighting::Fractional { samples_per_axis: n } => {
            (0..n).map(|k| (k as f64 + 0.5) / n as f64).collect()
        }
    };
    let total = (offsets.len() * offsets.len()) as f64;
    let (min_x, min_y, max_x, max_y) = aoi.bounds();

    let weight = |(row, col): (usize, usize)| -> f64 {
        // Cheap rejection on the pixel footprint's bounding box
        let corners = [
            geo_transform.pixel_to_world(col as f64, row as f64),
            geo_transform.pixel_to_world(col as f64 + 1.0, row as f64),
            geo_transform.pixel_to_world(col as f64, row as f64 + 1.0),
            geo_transform.pixel_to_world(col as f64 + 1.0, row as f64 + 1.0),
        ];
        let outside = corners.iter().all(|c| c.0 < min_x)
            || corners.iter().all(|c| c.0 > max_x)
            || corners.iter().all(|c| c.1 < min_y)
            || corners.iter().all(|c| c.1 > max_y);
        if outside {
            return 0.0;
        }

        let mut inside = 0usize;
        for &dr in &offsets {
            for &dc in &offsets {
                let (x, y) = geo_transform.pixel_to_world(col as f64 + dc, row as f64 + dr);
                if aoi.contains(x, y) {
                    inside += 1;
                }
            }
        }
        inside as f64 / total
    };

    let grid = Array2::<()>::from_elem(dim, ());
    #[cfg(feature = "parallel")]
    let weights = Zip::indexed(&grid).par_map_collect(|idx, _| weight(idx));
    #[cfg(not(feature = "parallel"))]
    let weights = Zip::indexed(&grid).map_collect(|idx, _| weight(idx));

    Ok(weights)
}
