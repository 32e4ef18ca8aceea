use std::fs::File;
use std::io::{Cursor, Read};

use escframe_frame::{FrameError, FrameReader};
use tracing::{info, warn};

use crate::cmd::{DecodeArgs, FramingArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_stats, FramePrinter, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat, framing: &FramingArgs) -> CliResult<i32> {
    let mut config = framing.to_config()?;
    config.emit_empty_frames = args.emit_empty;

    let input = open_input(&args)?;
    let mut reader = FrameReader::with_config(input, config);
    let mut printer = FramePrinter::new(format);
    let limit = args.count.unwrap_or(usize::MAX);

    while printer.printed() < limit {
        match reader.read_frame() {
            Ok(frame) => printer.print(&frame),
            Err(FrameError::ConnectionClosed) => break,
            Err(err) => return Err(frame_error("decode failed", err)),
        }
    }

    if !reader.parser().is_idle() {
        warn!(
            state = ?reader.parser().state(),
            pending = reader.parser().in_progress_len(),
            "input ended inside a frame"
        );
    }
    info!(frames = printer.printed(), "decode finished");

    if args.stats {
        print_stats(reader.parser().stats(), format);
    }

    Ok(SUCCESS)
}

fn open_input(args: &DecodeArgs) -> CliResult<Box<dyn Read>> {
    let mut raw: Box<dyn Read> = match &args.path {
        Some(path) if path.as_os_str() != "-" => Box::new(File::open(path).map_err(|err| {
            io_error(&format!("failed opening {}", path.display()), err)
        })?),
        _ => Box::new(std::io::stdin()),
    };

    if !args.hex {
        return Ok(raw);
    }

    let mut text = String::new();
    raw.read_to_string(&mut text)
        .map_err(|err| io_error("failed reading hex input", err))?;
    Ok(Box::new(Cursor::new(parse_hex(&text)?)))
}

fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let digits: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    hex::decode(digits)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex input: {err}")))
}
