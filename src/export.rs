//! Writing results to disk as CSV, JSON or plain text.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::request::{ExtractionResult, ModeUsed};

pub const CSV_HEADER: [&str; 3] = ["Number", "Extracted_Content", "Extraction_Date"];

/// `YYYY-MM-DD HH:MM:SS`, local time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Txt,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Txt => "txt",
        }
    }
}

#[derive(Serialize)]
struct JsonExport<'a> {
    items: &'a [String],
    mode_used: ModeUsed,
    page_count: u32,
    extraction_date: &'a str,
}

/// Writes results into one output directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new("outputs")
    }
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `filename` inside the output directory, with the format's extension
    /// appended unless it already ends with it.
    pub fn output_path(&self, filename: &str, format: ExportFormat) -> PathBuf {
        let ext = format.extension();
        let has_ext = Path::new(filename)
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case(ext));

        if has_ext {
            self.output_dir.join(filename)
        } else {
            self.output_dir.join(format!("{filename}.{ext}"))
        }
    }

    /// Render `result` and write it, creating the output directory on demand.
    ///
    /// The timestamp is taken once, at export time. Nothing is written if
    /// rendering fails.
    pub fn export(
        &self,
        result: &ExtractionResult,
        filename: &str,
        format: ExportFormat,
    ) -> Result<PathBuf> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let body = render(result, format, &timestamp)?;

        fs::create_dir_all(&self.output_dir).map_err(|source| Error::Export {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.output_path(filename, format);
        fs::write(&path, body).map_err(|source| Error::Export {
            path: path.clone(),
            source,
        })?;

        info!("Saved {} items to {}", result.len(), path.display());
        Ok(path)
    }
}

/// Serialize `result` in `format` with `timestamp` as the extraction date.
pub fn render(result: &ExtractionResult, format: ExportFormat, timestamp: &str) -> Result<String> {
    match format {
        ExportFormat::Csv => render_csv(&result.items, timestamp),
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&JsonExport {
            items: &result.items,
            mode_used: result.mode_used,
            page_count: result.page_count,
            extraction_date: timestamp,
        })?),
        ExportFormat::Txt => Ok(result.items.iter().map(|item| format!("{item}\n")).collect()),
    }
}

/// Header row, then `index,item,timestamp` with a 1-based index.
pub fn render_csv(items: &[String], timestamp: &str) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(CSV_HEADER)?;

    for (i, item) in items.iter().enumerate() {
        writer.write_record([(i + 1).to_string().as_str(), item.as_str(), timestamp])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Csv(csv::Error::from(e.into_error())))?;
    String::from_utf8(bytes).map_err(|e| Error::Parse(format!("CSV output is not UTF-8: {e}")))
}
