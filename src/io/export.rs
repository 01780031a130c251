use crate::core::time_series::TimeSeries;
use crate::types::{IceError, IceResult};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Export file name: `{name}_IceCoverage_{first}[_to_{last}].csv`
pub fn export_filename(aoi_name: &str, series: &TimeSeries) -> IceResult<String> {
    let (first, last) = match (series.first_date(), series.last_date()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(IceError::InvalidArgument(
                "Cannot name an export for an empty time series".to_string(),
            ))
        }
    };

    let name = sanitize_name(aoi_name);
    if first == last {
        Ok(format!("{}_IceCoverage_{}.csv", name, first.format("%Y-%m-%d")))
    } else {
        Ok(format!(
            "{}_IceCoverage_{}_to_{}.csv",
            name,
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        ))
    }
}

/// Lake name as given, with path separators escaped so it stays one file name
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "lake".to_string()
    } else {
        cleaned
    }
}

/// Write `Date,Ice Coverage (%)` rows to any writer
pub fn write_csv<W: Write>(series: &TimeSeries, writer: W) -> IceResult<()> {
    if series.is_empty() {
        return Err(IceError::InvalidArgument(
            "Refusing to export an empty time series".to_string(),
        ));
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in series.records() {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the series into `dir` under its conventional file name
pub fn export_csv<P: AsRef<Path>>(aoi_name: &str, series: &TimeSeries, dir: P) -> IceResult<PathBuf> {
    let path = dir.as_ref().join(export_filename(aoi_name, series)?);
    log::info!("Writing {} observations to {}", series.len(), path.display());

    let file = std::fs::File::create(&path)?;
    write_csv(series, file)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Lac des Deux Montagnes"), "Lac des Deux Montagnes");
        assert_eq!(sanitize_name("Lac Saint-Jean: nord"), "Lac Saint-Jean: nord");
        assert_eq!(sanitize_name("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_name("   "), "lake");
    }

    #[test]
    fn test_empty_series_not_exported() {
        let series = TimeSeries::default();
        assert!(export_filename("Lake", &series).is_err());
        assert!(write_csv(&series, Vec::new()).is_err());
    }
}
