use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use tracing::{info, warn};

use crate::types::{Dataset, Result};

use super::{build_dataset, DataReader};

/// Excel workbook reader (supports .xlsx, .xls, .xlsm, .xlsb).
/// Only the first worksheet is read.
pub struct ExcelReader {
    path: PathBuf,
}

impl ExcelReader {
    pub fn new(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Convert Excel Data to string representation
    fn data_to_string(dt: &Data) -> String {
        match dt {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            Data::Float(f) => f.to_string(),
            Data::Int(i) => i.to_string(),
            Data::Bool(b) => b.to_string(),
            Data::DateTime(d) => Self::excel_serial_to_date_string(d.as_f64()),
            Data::DateTimeIso(s) => s.clone(),
            Data::DurationIso(s) => s.clone(),
            // Formula errors count as missing
            Data::Error(_) => String::new(),
        }
    }

    /// Convert Excel serial date to ISO date string
    fn excel_serial_to_date_string(serial: f64) -> String {
        // Excel epoch is 1899-12-30 (with the 1900 leap year bug)
        let days = serial as i64;
        chrono::NaiveDate::from_ymd_opt(1899, 12, 30)
            .and_then(|base| base.checked_add_signed(chrono::Duration::days(days)))
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| serial.to_string())
    }
}

impl DataReader for ExcelReader {
    fn load(&mut self) -> Result<Dataset> {
        let mut workbook = open_workbook_auto(&self.path)?;

        let sheet_names = workbook.sheet_names();
        let Some(sheet_name) = sheet_names.first() else {
            warn!(path = %self.path.display(), "workbook has no worksheets");
            return Ok(Dataset::default());
        };
        if sheet_names.len() > 1 {
            warn!(
                sheet = %sheet_name,
                ignored = sheet_names.len() - 1,
                "reading first worksheet only"
            );
        }

        let range = workbook.worksheet_range(sheet_name)?;
        let mut rows = range.rows();

        // First row is headers
        let headers: Vec<String> = match rows.next() {
            Some(row) => row
                .iter()
                .enumerate()
                .map(|(idx, cell)| {
                    let name = Self::data_to_string(cell).trim().to_string();
                    if name.is_empty() {
                        format!("Column{}", idx + 1)
                    } else {
                        name
                    }
                })
                .collect(),
            None => return Ok(Dataset::default()),
        };

        let data: Vec<Vec<String>> = rows
            .map(|row| row.iter().map(Self::data_to_string).collect())
            .collect();

        let dataset = build_dataset(headers, data)?;
        info!(
            path = %self.path.display(),
            sheet = %sheet_name,
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "loaded workbook snapshot"
        );
        Ok(dataset)
    }
}
