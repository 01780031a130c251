use crate::core::analysis::AnalysisInputs;
use crate::core::geometry::AreaOfInterest;
use crate::types::{DateRange, IceError, IceResult};
use std::collections::HashMap;
use std::io::{BufRead, Write};

/// Waterbody lookup by numeric identifier (HYDROUID)
pub trait LakeCatalog {
    fn lookup(&self, lake_id: u64) -> Option<AreaOfInterest>;
}

/// Lake catalog held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryLakeCatalog {
    lakes: HashMap<u64, AreaOfInterest>,
}

impl MemoryLakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, lake_id: u64, aoi: AreaOfInterest) {
        self.lakes.insert(lake_id, aoi);
    }
}

impl LakeCatalog for MemoryLakeCatalog {
    fn lookup(&self, lake_id: u64) -> Option<AreaOfInterest> {
        self.lakes.get(&lake_id).cloned()
    }
}

/// Line-oriented prompts for lake id and dates
///
/// Values given up front (e.g. from command-line arguments) are tried first;
/// anything missing or invalid is asked for. End of input counts as "no".
pub struct PromptInputs<'a, R, W> {
    reader: R,
    writer: W,
    catalog: &'a dyn LakeCatalog,
    lake_id: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl<'a, R: BufRead, W: Write> PromptInputs<'a, R, W> {
    pub fn new(reader: R, writer: W, catalog: &'a dyn LakeCatalog) -> Self {
        Self {
            reader,
            writer,
            catalog,
            lake_id: None,
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_lake_id(mut self, lake_id: impl Into<String>) -> Self {
        self.lake_id = Some(lake_id.into());
        self
    }

    pub fn with_dates(mut self, start: impl Into<String>, end: Option<String>) -> Self {
        self.start_date = Some(start.into());
        self.end_date = end;
        self
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn say(&mut self, message: &str) -> IceResult<()> {
        writeln!(self.writer, "{}", message)?;
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> IceResult<Option<String>> {
        write!(self.writer, "{}", prompt)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn ask_yes_no(&mut self, prompt: &str) -> IceResult<bool> {
        loop {
            match self.ask(prompt)? {
                None => return Ok(false),
                Some(answer) => match answer.to_lowercase().as_str() {
                    "yes" | "y" => return Ok(true),
                    "no" | "n" => return Ok(false),
                    _ => self.say("Please enter either 'yes' or 'no'.")?,
                },
            }
        }
    }

    fn try_lake(&mut self, raw: &str) -> IceResult<Option<AreaOfInterest>> {
        match raw.trim().parse::<u64>() {
            Ok(lake_id) => match self.catalog.lookup(lake_id) {
                Some(aoi) => {
                    log::info!("Selected lake {} ('{}')", lake_id, aoi.name());
                    Ok(Some(aoi))
                }
                None => {
                    self.say("Lake not found.")?;
                    Ok(None)
                }
            },
            Err(_) => {
                self.say("Invalid HYDROUID.")?;
                Ok(None)
            }
        }
    }

    fn prompt_date_range(&mut self) -> IceResult<Option<DateRange>> {
        loop {
            let start = match self.ask("Enter the start date in the format 'YYYY-MM-DD': ")? {
                Some(start) => start,
                None => return Ok(None),
            };
            let end = self
                .ask("Enter the end date (optional) in the format 'YYYY-MM-DD'. Leave blank for single day: ")?
                .unwrap_or_default();

            match DateRange::parse(&start, Some(&end)) {
                Ok(range) => return Ok(Some(range)),
                Err(e) => self.say(&e.to_string())?,
            }
        }
    }
}

impl<'a, R: BufRead, W: Write> AnalysisInputs for PromptInputs<'a, R, W> {
    fn resolve_aoi(&mut self) -> IceResult<AreaOfInterest> {
        if let Some(raw) = self.lake_id.take() {
            if let Some(aoi) = self.try_lake(&raw)? {
                return Ok(aoi);
            }
        }

        loop {
            let raw = self
                .ask("Enter the HYDROUID of the lake you would like to analyze (ID cannot include commas): ")?
                .unwrap_or_default();
            if let Some(aoi) = self.try_lake(&raw)? {
                return Ok(aoi);
            }
            if !self.ask_yes_no("Would you like to try again? (yes/no): ")? {
                return Err(IceError::Cancelled("no lake selected".to_string()));
            }
        }
    }

    fn resolve_date_range(&mut self) -> IceResult<DateRange> {
        if let Some(start) = self.start_date.take() {
            let end = self.end_date.take();
            match DateRange::parse(&start, end.as_deref()) {
                Ok(range) => return Ok(range),
                Err(e) => self.say(&e.to_string())?,
            }
        }

        self.prompt_date_range()?
            .ok_or_else(|| IceError::Cancelled("no date range entered".to_string()))
    }

    fn retry_date_range(&mut self, previous: &DateRange) -> IceResult<Option<DateRange>> {
        self.say(&format!(
            "No valid SAR imagery or no ice coverage data found for {}.",
            previous
        ))?;
        if !self.ask_yes_no("Would you like to try a new date range? (yes/no): ")? {
            return Ok(None);
        }
        self.prompt_date_range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::rectangle;
    use crate::types::CoordinateSystem;
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn catalog() -> MemoryLakeCatalog {
        let aoi = AreaOfInterest::new(
            "Lac Deschênes",
            vec![rectangle(0.0, 0.0, 100.0, 100.0).unwrap()],
            CoordinateSystem::Projected { epsg: 32618 },
        )
        .unwrap();
        let mut catalog = MemoryLakeCatalog::new();
        catalog.insert(55404, aoi);
        catalog
    }

    #[test]
    fn test_lake_prompt_retries_until_found() {
        let catalog = catalog();
        let input = Cursor::new("55,404\nyes\n99\ny\n55404\n");
        let mut inputs = PromptInputs::new(input, Vec::new(), &catalog);

        let aoi = inputs.resolve_aoi().unwrap();
        assert_eq!(aoi.name(), "Lac Deschênes");

        let output = String::from_utf8(inputs.into_writer()).unwrap();
        assert!(output.contains("Invalid HYDROUID."));
        assert!(output.contains("Lake not found."));
    }

    #[test]
    fn test_lake_prompt_cancelled() {
        let catalog = catalog();
        let input = Cursor::new("1\nmaybe\nno\n");
        let mut inputs = PromptInputs::new(input, Vec::new(), &catalog);

        assert!(matches!(inputs.resolve_aoi(), Err(IceError::Cancelled(_))));
        let output = String::from_utf8(inputs.into_writer()).unwrap();
        assert!(output.contains("Please enter either 'yes' or 'no'."));
    }

    #[test]
    fn test_preset_values_skip_prompts() {
        let catalog = catalog();
        let mut inputs = PromptInputs::new(Cursor::new(""), Vec::new(), &catalog)
            .with_lake_id("55404")
            .with_dates("2024-01-01", Some("2024-03-01".to_string()));

        assert!(inputs.resolve_aoi().is_ok());
        let range = inputs.resolve_date_range().unwrap();
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(inputs.into_writer().is_empty());
    }

    #[test]
    fn test_blank_end_date_means_single_day() {
        let catalog = catalog();
        let input = Cursor::new("2024-13-01\n\n2024-02-10\n\n");
        let mut inputs = PromptInputs::new(input, Vec::new(), &catalog);

        let range = inputs.resolve_date_range().unwrap();
        assert_eq!(range, DateRange::single_day(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()));
    }

    #[test]
    fn test_retry_declined_at_end_of_input() {
        let catalog = catalog();
        let mut inputs = PromptInputs::new(Cursor::new(""), Vec::new(), &catalog);
        let previous = DateRange::single_day(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        assert_eq!(inputs.retry_date_range(&previous).unwrap(), None);
    }
}
