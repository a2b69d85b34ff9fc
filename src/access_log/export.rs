//! Log export formats for the admin download endpoint and report attachments.

use chrono::SecondsFormat;

use crate::access_log::entry::{AccessLogEntry, LogDocument};
use crate::error::{SimError, SimResult};

/// Fixed CSV column order.
pub const CSV_COLUMNS: [&str; 8] = [
    "Timestamp",
    "Hostname",
    "Path",
    "UserAgent",
    "IP",
    "StatusCode",
    "RuleType",
    "Target",
];

/// Supported export encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Parse a `format` query value; anything other than `csv` means JSON.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Render entries in the requested format.
pub fn render(entries: &[AccessLogEntry], format: ExportFormat) -> SimResult<Vec<u8>> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(&LogDocument {
            logs: entries.to_vec(),
        })?),
        ExportFormat::Csv => to_csv(entries).map(String::into_bytes),
    }
}

/// Every field quoted, header first.
pub fn to_csv(entries: &[AccessLogEntry]) -> SimResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(CSV_COLUMNS)?;
    for entry in entries {
        let timestamp = entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        let status = entry.status_code.to_string();
        writer
            .write_record([
                timestamp.as_str(),
                entry.hostname.as_str(),
                entry.path.as_str(),
                entry.user_agent.as_str(),
                entry.ip.as_str(),
                status.as_str(),
                entry.rule_type.as_str(),
                entry.target.as_deref().unwrap_or(""),
            ])?;
    }

    let bytes = writer.into_inner().map_err(|e| SimError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| SimError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
