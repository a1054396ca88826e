//! Line-oriented URL source and delimited report sink.

use std::path::Path;
use std::str::FromStr;

use futures::{Stream, StreamExt as _};
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, BufWriter};
use tokio_stream::wrappers::LinesStream;
use tracing::warn;

use crate::error::{Error, Result};
use crate::model::ColorReport;

/// Open `path` and stream its URLs, one per line.
///
/// Lines are trimmed and blank lines skipped. A line that cannot be read is
/// logged and skipped. Failing to open the file is an error.
pub async fn read_urls(path: &Path) -> Result<impl Stream<Item = String> + Send + 'static> {
    let file = File::open(path).await.map_err(|e| {
        Error::Config(format!("cannot open url list {}: {e}", path.display()))
    })?;
    let lines = LinesStream::new(BufReader::new(file).lines());

    Ok(lines.filter_map(|line| async move {
        match line {
            Ok(line) => {
                let url = line.trim();
                (!url.is_empty()).then(|| url.to_string())
            }
            Err(e) => {
                warn!("skipping unreadable line: {e}");
                None
            }
        }
    }))
}

/// How reports are serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `url,primary,secondary,tertiary`
    #[default]
    Csv,
    /// One JSON object per line.
    Jsonl,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "jsonl" | "json" => Ok(OutputFormat::Jsonl),
            other => Err(Error::Config(format!("unknown output format: {other}"))),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Jsonl => "jsonl",
        };
        write!(f, "{s}")
    }
}

/// Render one report as a newline-terminated line.
pub fn format_report(report: &ColorReport, format: OutputFormat) -> Result<String> {
    let mut line = match format {
        OutputFormat::Csv => report.to_csv_line(),
        OutputFormat::Jsonl => serde_json::to_string(report)
            .map_err(|e| Error::Other(format!("serialize report: {e}")))?,
    };
    line.push('\n');
    Ok(line)
}

/// Buffered writer for reports, in the order they arrive.
pub struct ReportWriter {
    out: BufWriter<File>,
    format: OutputFormat,
    written: usize,
}

impl ReportWriter {
    /// Create (or truncate) the output file.
    pub async fn create(path: &Path, format: OutputFormat) -> Result<Self> {
        let file = File::create(path).await.map_err(|e| {
            Error::Config(format!("cannot create output {}: {e}", path.display()))
        })?;
        Ok(Self {
            out: BufWriter::new(file),
            format,
            written: 0,
        })
    }

    pub async fn write(&mut self, report: &ColorReport) -> Result<()> {
        let line = format_report(report, self.format)?;
        self.out.write_all(line.as_bytes()).await?;
        self.written += 1;
        Ok(())
    }

    /// Flush buffered lines. Returns the number of reports written.
    pub async fn finish(mut self) -> Result<usize> {
        self.out.flush().await?;
        Ok(self.written)
    }
}
