use chrono::{NaiveDate, TimeZone, Utc};
use icecover::core::{
    AnalysisInputs, AnalysisOutcome, AreaOfInterest, IceAnalysis, StaticInputs,
};
use icecover::core::geometry::rectangle;
use icecover::io::{export_csv, MemoryImageSource, MemoryLakeCatalog, PromptInputs};
use icecover::types::{Acquisition, CoordinateSystem, DateRange, GeoTransform, IceError, IceResult};
use ndarray::Array2;
use std::collections::VecDeque;
use std::io::Cursor;

const UTM18N: CoordinateSystem = CoordinateSystem::Projected { epsg: 32618 };

fn lake() -> AreaOfInterest {
    AreaOfInterest::new(
        "Lac Test",
        vec![rectangle(0.0, 0.0, 200.0, 200.0).expect("valid rectangle")],
        UTM18N,
    )
    .expect("valid AOI")
}

fn frozen(year: i32, month: u32, day: u32) -> Acquisition {
    Acquisition::dual_pol(
        Utc.with_ymd_and_hms(year, month, day, 22, 40, 0).unwrap(),
        Array2::from_elem((20, 20), -4.0),
        Array2::from_elem((20, 20), -14.0),
        GeoTransform::north_up(0.0, 200.0, 10.0),
        UTM18N,
    )
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Inputs that replay a fixed list of retry answers
struct ScriptedInputs {
    aoi: AreaOfInterest,
    first: DateRange,
    retries: VecDeque<DateRange>,
    retry_calls: usize,
}

impl AnalysisInputs for ScriptedInputs {
    fn resolve_aoi(&mut self) -> IceResult<AreaOfInterest> {
        Ok(self.aoi.clone())
    }

    fn resolve_date_range(&mut self) -> IceResult<DateRange> {
        Ok(self.first)
    }

    fn retry_date_range(&mut self, _previous: &DateRange) -> IceResult<Option<DateRange>> {
        self.retry_calls += 1;
        Ok(self.retries.pop_front())
    }
}

#[test]
fn test_empty_range_retries_with_new_dates() {
    let _ = env_logger::builder().is_test(true).try_init();

    let source = MemoryImageSource::new(vec![frozen(2024, 1, 10), frozen(2024, 1, 22)]);
    let retry = DateRange::new(day(2024, 1, 1), day(2024, 2, 1)).unwrap();
    let mut inputs = ScriptedInputs {
        aoi: lake(),
        first: DateRange::single_day(day(2023, 7, 1)),
        retries: VecDeque::from(vec![retry]),
        retry_calls: 0,
    };

    let outcome = IceAnalysis::default()
        .run(&mut inputs, &source)
        .expect("analysis runs");

    assert_eq!(inputs.retry_calls, 1);
    match outcome {
        AnalysisOutcome::Series {
            aoi_name,
            range,
            series,
        } => {
            assert_eq!(aoi_name, "Lac Test");
            assert_eq!(range, retry);
            assert_eq!(series.len(), 2);
            assert_eq!(series.records()[0].ice_coverage_percent, 100.0);
        }
        other => panic!("expected a series, got {:?}", other),
    }
}

#[test]
fn test_declined_retry_reports_no_data() {
    let _ = env_logger::builder().is_test(true).try_init();

    let source = MemoryImageSource::new(vec![frozen(2024, 1, 10)]);
    let first = DateRange::single_day(day(2024, 1, 11));
    let mut inputs = StaticInputs {
        aoi: lake(),
        range: first,
    };

    let outcome = IceAnalysis::default()
        .run(&mut inputs, &source)
        .expect("analysis runs");

    match outcome {
        AnalysisOutcome::NoData {
            aoi_name,
            last_range,
        } => {
            assert_eq!(aoi_name, "Lac Test");
            assert_eq!(last_range, first);
        }
        other => panic!("expected no data, got {:?}", other),
    }
}

#[test]
fn test_prompted_run_and_export() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut catalog = MemoryLakeCatalog::new();
    catalog.insert(8_123_456, lake());
    let source = MemoryImageSource::new(vec![
        frozen(2024, 2, 20),
        frozen(2024, 2, 8),
        frozen(2023, 12, 30),
    ]);

    // Lake id, a summer date range with no imagery, then a retry over the winter
    let script = "8123456\n2023-06-01\n2023-07-01\nyes\n2024-02-01\n2024-03-01\n";
    let mut inputs = PromptInputs::new(Cursor::new(script), Vec::new(), &catalog);

    let outcome = IceAnalysis::default()
        .run(&mut inputs, &source)
        .expect("analysis runs");
    let transcript = String::from_utf8(inputs.into_writer()).unwrap();
    assert!(transcript.contains("No valid SAR imagery or no ice coverage data found"));

    let (aoi_name, series) = match outcome {
        AnalysisOutcome::Series {
            aoi_name, series, ..
        } => (aoi_name, series),
        other => panic!("expected a series, got {:?}", other),
    };
    assert_eq!(series.len(), 2);

    let dir = tempfile::tempdir().expect("temp dir");
    let path = export_csv(&aoi_name, &series, dir.path()).expect("export succeeds");
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("Lac Test_IceCoverage_2024-02-08_to_2024-02-20.csv")
    );

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Date,Ice Coverage (%)");
    assert!(lines[1].starts_with("2024-02-08,100"));
    assert!(lines[2].starts_with("2024-02-20,100"));
}

#[test]
fn test_unknown_lake_cancels_run() {
    let _ = env_logger::builder().is_test(true).try_init();

    let catalog = MemoryLakeCatalog::new();
    let source = MemoryImageSource::default();
    let mut inputs = PromptInputs::new(Cursor::new("42\nno\n"), Vec::new(), &catalog);

    let result = IceAnalysis::default().run(&mut inputs, &source);
    assert!(matches!(result, Err(IceError::Cancelled(_))));
}
