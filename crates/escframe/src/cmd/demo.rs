use escframe_frame::{ByteSource, FrameDriver, FrameParser, Markers};
use tracing::info;

use crate::cmd::{DemoArgs, FramingArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_stats, FramePrinter, OutputFormat};

pub fn run(args: DemoArgs, format: OutputFormat, framing: &FramingArgs) -> CliResult<i32> {
    let config = framing.to_config()?;
    let streams = demo_streams(&config.markers);

    let mut driver = FrameDriver::with_parser(
        FrameParser::with_config(config),
        FramePrinter::new(format),
    );

    for (n, bytes) in streams.into_iter().enumerate() {
        let stream = n as u64 + 1;
        let source = ByteSource::from(bytes);
        info!(stream, bytes = source.remaining(), "feeding source");

        driver.handler_mut().begin_stream(stream);
        driver
            .drive(source)
            .map_err(|err| frame_error("demo failed", err))?;
    }

    info!(frames = driver.handler().printed(), "demo finished");
    if args.stats {
        print_stats(driver.parser().stats(), format);
    }

    Ok(SUCCESS)
}

/// Two simulated connections. The first ends right after opening a frame
/// that the second one finishes.
fn demo_streams(markers: &Markers) -> [Vec<u8>; 2] {
    let esc = markers.esc();
    let sof = markers.sof();

    let mut first = vec![filler(0x70, markers), esc, sof];
    first.extend(escaped(b"Hello", markers));
    first.extend_from_slice(&[esc, sof, filler(0x07, markers), esc, sof]);

    let mut second: Vec<u8> = escaped(b"World", markers).collect();
    second.extend_from_slice(&[esc, sof, filler(0x99, markers)]);

    [first, second]
}

/// Noise byte between frames. Bumped past either marker so it stays noise.
fn filler(preferred: u8, markers: &Markers) -> u8 {
    let mut byte = preferred;
    while markers.is_marker(byte) {
        byte = byte.wrapping_add(1);
    }
    byte
}

fn escaped<'a>(payload: &'a [u8], markers: &'a Markers) -> impl Iterator<Item = u8> + 'a {
    payload.iter().flat_map(move |&b| {
        let copies = if b == markers.esc() { 2 } else { 1 };
        std::iter::repeat(b).take(copies)
    })
}
