// Unilog - core/render.rs
//
// Writes the merged record stream as text, JSON or CSV.
// Core layer: writes to any Write trait object; records are consumed as
// they arrive, so the merged stream is never collected in memory.

use crate::core::model::LogRecord;
use crate::core::timestamp::format_timestamp;
use crate::util::error::RenderError;
use serde::Serializer;
use std::fmt;
use std::io::{BufWriter, Write};
use std::str::FromStr;

/// Output encodings understood by [`write_records`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown output format '{other}' (expected text, json or csv)")),
        }
    }
}

/// Write `records` to `writer` in `format`. Returns the number written.
///
/// `destination` names the sink in error messages (a path or "stdout").
pub fn write_records<W, I>(
    format: OutputFormat,
    records: I,
    writer: W,
    destination: &str,
) -> Result<usize, RenderError>
where
    W: Write,
    I: IntoIterator<Item = LogRecord>,
{
    let count = match format {
        OutputFormat::Text => write_text(records, writer, destination),
        OutputFormat::Json => write_json(records, writer, destination),
        OutputFormat::Csv => write_csv(records, writer, destination),
    }?;
    tracing::debug!(format = %format, records = count, destination, "Output written");
    Ok(count)
}

/// Plain text: a `[source] timestamp` header, each line tab-indented, then a
/// blank line.
pub fn write_text<W, I>(records: I, writer: W, destination: &str) -> Result<usize, RenderError>
where
    W: Write,
    I: IntoIterator<Item = LogRecord>,
{
    let io_err = |source| RenderError::Io {
        destination: destination.to_string(),
        source,
    };

    let mut out = BufWriter::new(writer);
    let mut count = 0;
    for record in records {
        writeln!(
            out,
            "[{}] {}",
            record.source_id,
            format_timestamp(&record.timestamp)
        )
        .map_err(io_err)?;
        for line in &record.lines {
            writeln!(out, "\t{line}").map_err(io_err)?;
        }
        writeln!(out).map_err(io_err)?;
        count += 1;
    }
    out.flush().map_err(io_err)?;
    Ok(count)
}

/// A pretty-printed JSON array of `{source_id, timestamp, line_number, lines}`.
pub fn write_json<W, I>(records: I, writer: W, destination: &str) -> Result<usize, RenderError>
where
    W: Write,
    I: IntoIterator<Item = LogRecord>,
{
    let mut out = BufWriter::new(writer);
    let mut count = 0;
    {
        let mut serializer = serde_json::Serializer::pretty(&mut out);
        (&mut serializer)
            .collect_seq(records.into_iter().inspect(|_| count += 1))
            .map_err(|e| RenderError::Json {
                destination: destination.to_string(),
                source: e,
            })?;
    }
    writeln!(out)
        .and_then(|()| out.flush())
        .map_err(|e| RenderError::Io {
            destination: destination.to_string(),
            source: e,
        })?;
    Ok(count)
}

/// CSV with header `timestamp,source_id,line_number,line_count,text`.
/// Multi-line records keep their newlines inside the quoted `text` field.
pub fn write_csv<W, I>(records: I, writer: W, destination: &str) -> Result<usize, RenderError>
where
    W: Write,
    I: IntoIterator<Item = LogRecord>,
{
    let csv_err = |source| RenderError::Csv {
        destination: destination.to_string(),
        source,
    };

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(["timestamp", "source_id", "line_number", "line_count", "text"])
        .map_err(csv_err)?;

    let mut count = 0;
    for record in records {
        let timestamp = format_timestamp(&record.timestamp);
        let line_number = record.line_number.to_string();
        let line_count = record.line_count().to_string();
        let text = record.text();
        csv_writer
            .write_record([
                timestamp.as_str(),
                &*record.source_id,
                line_number.as_str(),
                line_count.as_str(),
                text.as_str(),
            ])
            .map_err(csv_err)?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| RenderError::Io {
        destination: destination.to_string(),
        source: e,
    })?;

    Ok(count)
}

// =============================================================================
// Tests
// =============================================================================
