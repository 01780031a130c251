//! Python bindings for the ice coverage core

use crate::core::{
    polygon, AreaOfInterest, CoverageCalculator, DualPolRaster, SpeckleFilter, SeasonalThresholder,
};
use crate::types::{CoordinateSystem, GeoTransform, IceError, Polarization, Validity};
use chrono::{DateTime, NaiveDate, Utc};
use numpy::{PyReadonlyArray2, ToPyArray};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

fn to_py_err(err: IceError) -> PyErr {
    match err {
        IceError::InvalidArgument(msg) => PyValueError::new_err(msg),
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

fn parse_timestamp(value: &str) -> PyResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
        .ok_or_else(|| PyValueError::new_err(format!("Invalid timestamp: {}", value)))
}

fn build_raster(
    vv: PyReadonlyArray2<f32>,
    vh: PyReadonlyArray2<f32>,
    top_left_x: f64,
    top_left_y: f64,
    pixel_size: f64,
    epsg: u32,
) -> PyResult<DualPolRaster> {
    DualPolRaster::new(
        vv.as_array().to_owned(),
        vh.as_array().to_owned(),
        GeoTransform::north_up(top_left_x, top_left_y, pixel_size),
        CoordinateSystem::Projected { epsg },
    )
    .map_err(to_py_err)
}

/// Refined Lee filter of VV/VH decibel arrays
#[pyfunction]
fn refined_lee_filter(
    py: Python,
    vv: PyReadonlyArray2<f32>,
    vh: PyReadonlyArray2<f32>,
) -> PyResult<PyObject> {
    let raster = build_raster(vv, vh, 0.0, 0.0, 1.0, 0)?;
    let filtered = SpeckleFilter::new().filter(&raster).map_err(to_py_err)?;

    let result = PyDict::new(py);
    result.set_item("VV", filtered.vv().to_pyarray(py))?;
    result.set_item("VH", filtered.vh().to_pyarray(py))?;
    result.set_item("valid", filtered.valid_mask().to_pyarray(py))?;
    Ok(result.into())
}

/// Seasonal ice threshold in dB
#[pyfunction]
fn dynamic_threshold(month: u32, polarization: &str) -> PyResult<f64> {
    let pol: Polarization = polarization.parse().map_err(to_py_err)?;
    SeasonalThresholder::new()
        .threshold(month, pol)
        .map_err(to_py_err)
}

/// Filter, classify and compute the ice coverage of a polygon AOI
#[pyfunction]
#[allow(clippy::too_many_arguments)]
fn calculate_ice_coverage(
    py: Python,
    vv: PyReadonlyArray2<f32>,
    vh: PyReadonlyArray2<f32>,
    timestamp: &str,
    top_left_x: f64,
    top_left_y: f64,
    pixel_size: f64,
    epsg: u32,
    aoi_exterior: Vec<(f64, f64)>,
) -> PyResult<PyObject> {
    let timestamp = parse_timestamp(timestamp)?;
    let raster = build_raster(vv, vh, top_left_x, top_left_y, pixel_size, epsg)?;
    let outline = polygon(aoi_exterior, Vec::new()).map_err(to_py_err)?;
    let aoi = AreaOfInterest::new("aoi", vec![outline], CoordinateSystem::Projected { epsg })
        .map_err(to_py_err)?;

    let filtered = SpeckleFilter::new().filter(&raster).map_err(to_py_err)?;
    let classification = CoverageCalculator::new()
        .coverage(&aoi, &filtered, timestamp)
        .map_err(to_py_err)?;

    let result = PyDict::new(py);
    result.set_item("Date", classification.date.clone())?;
    result.set_item("Ice_Coverage_Percent", classification.ice_coverage_percent)?;
    result.set_item("ice_area_m2", classification.ice_area_m2)?;
    result.set_item("aoi_area_m2", classification.aoi_area_m2)?;
    match &classification.validity {
        Validity::Valid => result.set_item("valid", true)?,
        Validity::Invalid(reason) => {
            result.set_item("valid", false)?;
            result.set_item("reason", reason.to_string())?;
        }
    }
    Ok(result.into())
}

/// Python module definition
#[pymodule]
fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(refined_lee_filter, m)?)?;
    m.add_function(wrap_pyfunction!(dynamic_threshold, m)?)?;
    m.add_function(wrap_pyfunction!(calculate_ice_coverage, m)?)?;
    Ok(())
}
