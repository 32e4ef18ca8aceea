use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use escframe_frame::{Frame, FrameHandler, HandlerError, ParserStats};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Where a frame came from: which source, and its position in the run.
#[derive(Clone, Copy, Debug)]
pub struct FrameOrigin {
    pub stream: u64,
    pub index: usize,
}

/// Frame handler that prints every frame in the selected format.
#[derive(Debug)]
pub struct FramePrinter {
    format: OutputFormat,
    origin: FrameOrigin,
}

impl FramePrinter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            origin: FrameOrigin {
                stream: 1,
                index: 0,
            },
        }
    }

    /// Label frames printed from now on as belonging to `stream`.
    pub fn begin_stream(&mut self, stream: u64) {
        self.origin.stream = stream;
    }

    pub fn print(&mut self, frame: &Frame) {
        print_frame(frame, self.origin, self.format);
        self.origin.index += 1;
    }

    /// Frames printed so far, across all streams.
    pub fn printed(&self) -> usize {
        self.origin.index
    }
}

impl FrameHandler for FramePrinter {
    fn handle_frame(&mut self, frame: Frame) -> Result<(), HandlerError> {
        self.print(&frame);
        Ok(())
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    stream: u64,
    index: usize,
    size: usize,
    payload: String,
    hex: &'a str,
}

pub fn print_frame(frame: &Frame, origin: FrameOrigin, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let hex = hex::encode(&frame.payload);
            let out = FrameOutput {
                stream: origin.stream,
                index: origin.index,
                size: frame.len(),
                payload: payload_preview(frame.payload.as_ref()),
                hex: &hex,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["STREAM", "INDEX", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    origin.stream.to_string(),
                    origin.index.to_string(),
                    frame.len().to_string(),
                    payload_preview(frame.payload.as_ref()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "stream={} index={} size={} payload={}",
                origin.stream,
                origin.index,
                frame.len(),
                payload_preview(frame.payload.as_ref())
            );
        }
        OutputFormat::Raw => {
            print_raw(frame.payload.as_ref());
            print_raw(b"\n");
        }
    }
}

#[derive(Serialize)]
struct StatsOutput {
    bytes_signalled: u64,
    frames_emitted: u64,
    empty_frames_dropped: u64,
    idle_bytes_discarded: u64,
    malformed_starts: u64,
    desyncs: u64,
    oversized_frames: u64,
    frames_overwritten: u64,
}

impl From<&ParserStats> for StatsOutput {
    fn from(s: &ParserStats) -> Self {
        Self {
            bytes_signalled: s.bytes_signalled,
            frames_emitted: s.frames_emitted,
            empty_frames_dropped: s.empty_frames_dropped,
            idle_bytes_discarded: s.idle_bytes_discarded,
            malformed_starts: s.malformed_starts,
            desyncs: s.desyncs,
            oversized_frames: s.oversized_frames,
            frames_overwritten: s.frames_overwritten,
        }
    }
}

/// Parser counters go to stderr so they never mix with frame output.
pub fn print_stats(stats: &ParserStats, format: OutputFormat) {
    let out = StatsOutput::from(stats);
    match format {
        OutputFormat::Json => {
            eprintln!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COUNTER", "VALUE"]);
            for (name, value) in stats_rows(&out) {
                table.add_row(vec![name.to_string(), value.to_string()]);
            }
            eprintln!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            let line: Vec<String> = stats_rows(&out)
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            eprintln!("{}", line.join(" "));
        }
    }
}

fn stats_rows(out: &StatsOutput) -> [(&'static str, u64); 8] {
    [
        ("bytes_signalled", out.bytes_signalled),
        ("frames_emitted", out.frames_emitted),
        ("empty_frames_dropped", out.empty_frames_dropped),
        ("idle_bytes_discarded", out.idle_bytes_discarded),
        ("malformed_starts", out.malformed_starts),
        ("desyncs", out.desyncs),
        ("oversized_frames", out.oversized_frames),
        ("frames_overwritten", out.frames_overwritten),
    ]
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}
