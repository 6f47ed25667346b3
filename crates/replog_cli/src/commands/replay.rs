//! Replay command implementation.

use clap::ValueEnum;
use replog_core::{Backlog, BacklogConfig, BacklogError, BacklogInfo, StatsSnapshot};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// How an input stream is cut into records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Delimiter {
    /// One record per line, newline kept.
    Newline,
    /// Fixed-size chunks.
    None,
}

/// Errors from the replay command.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backlog rejected the configuration or the read.
    #[error(transparent)]
    Backlog(#[from] BacklogError),

    /// Chunked splitting was requested with a zero chunk size.
    #[error("chunk size must be positive")]
    ZeroChunk,

    /// An output file was given without an offset to read from.
    #[error("--output requires --from")]
    OutputWithoutRange,
}

/// Options for a replay run.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Input file, or `-` for stdin.
    pub input: PathBuf,
    /// Backlog capacity in bytes.
    pub capacity: usize,
    /// Default block size in bytes.
    pub block_size: usize,
    /// Record splitting mode.
    pub delimiter: Delimiter,
    /// Chunk size for [`Delimiter::None`].
    pub chunk: usize,
    /// Offset to read from after replaying.
    pub from: Option<u64>,
    /// Where to write the range read from `from`. Stdout when unset.
    pub output: Option<PathBuf>,
}

/// Outcome of a replay run.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    /// Number of records fed to the backlog.
    pub records: usize,
    /// Final window and sizing.
    pub backlog: BacklogInfo,
    /// Counters after the run.
    pub stats: StatsSnapshot,
    /// The range read, if one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeInfo>,
}

/// A range read from the replayed backlog.
#[derive(Debug, Serialize)]
pub struct RangeInfo {
    /// The requested offset.
    pub from: u64,
    /// Number of bytes returned.
    pub len: usize,
    /// The raw bytes, written out unchanged.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Runs the replay command.
///
/// With `--from`, the raw range goes to `--output`, or to stdout when no
/// output file is given. In the stdout case the report moves to stderr so
/// the byte stream stays clean.
pub fn run(options: &ReplayOptions, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let report = replay(options)?;

    let mut report_to_stderr = false;
    if let Some(range) = &report.range {
        match &options.output {
            Some(path) => {
                fs::write(path, &range.bytes)?;
                info!(
                    "Wrote {} bytes from offset {} to {:?}",
                    range.len, range.from, path
                );
            }
            None => {
                write_range(&range.bytes, &mut io::stdout().lock())?;
                report_to_stderr = true;
            }
        }
    }

    let rendered = match format {
        "json" => serde_json::to_string_pretty(&report)?,
        _ => format_text_output(&report),
    };
    if report_to_stderr {
        eprintln!("{}", rendered);
    } else {
        println!("{}", rendered);
    }

    Ok(())
}

/// Replays the input through a fresh backlog.
pub fn replay(options: &ReplayOptions) -> Result<ReplayReport, ReplayError> {
    if options.output.is_some() && options.from.is_none() {
        return Err(ReplayError::OutputWithoutRange);
    }

    let config = BacklogConfig::new()
        .capacity(options.capacity)
        .block_size(options.block_size);
    let mut backlog = Backlog::with_config(config)?;

    let input = read_input(&options.input)?;
    info!("Replaying {} bytes from {:?}", input.len(), options.input);

    let records = split_records(&input, options.delimiter, options.chunk)?;
    for record in &records {
        backlog.append(record);
    }
    debug!(
        records = records.len(),
        starting_offset = backlog.starting_offset(),
        ending_offset = backlog.ending_offset(),
        "replay finished"
    );

    let range = match options.from {
        Some(from) => {
            let bytes = backlog.read_range(from)?;
            Some(RangeInfo {
                from,
                len: bytes.len(),
                bytes,
            })
        }
        None => None,
    };

    Ok(ReplayReport {
        records: records.len(),
        backlog: backlog.info(),
        stats: backlog.stats().snapshot(),
        range,
    })
}

/// Writes a range unchanged.
pub fn write_range<W: Write>(bytes: &[u8], out: &mut W) -> io::Result<()> {
    out.write_all(bytes)?;
    out.flush()
}

fn read_input(path: &Path) -> io::Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(path)
    }
}

/// Cuts the input into records.
fn split_records(
    input: &[u8],
    delimiter: Delimiter,
    chunk: usize,
) -> Result<Vec<&[u8]>, ReplayError> {
    match delimiter {
        Delimiter::Newline => Ok(input.split_inclusive(|b| *b == b'\n').collect()),
        Delimiter::None if chunk == 0 => Err(ReplayError::ZeroChunk),
        Delimiter::None => Ok(input.chunks(chunk).collect()),
    }
}

fn format_text_output(report: &ReplayReport) -> String {
    let info = &report.backlog;
    let stats = &report.stats;

    let mut lines = vec![
        format!("Records replayed:  {}", report.records),
        format!(
            "Window:            [{}, {})",
            info.starting_offset, info.ending_offset
        ),
        format!(
            "Retained:          {} bytes in {} blocks (capacity {}, block size {})",
            info.used_bytes, info.block_count, info.capacity, info.block_size
        ),
        format!(
            "Evicted:           {} bytes in {} blocks",
            stats.bytes_evicted, stats.blocks_evicted
        ),
    ];

    if let Some(range) = &report.range {
        lines.push(format!("Range from {}:     {} bytes", range.from, range.len));
    }

    lines.join("\n")
}
