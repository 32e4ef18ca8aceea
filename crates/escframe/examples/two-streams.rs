//! Feeds two simulated connections through one long-lived parser.
//!
//! Run with:
//!   cargo run --example two-streams
//!
//! The first connection ends right after a frame has been opened; the second
//! connection carries the rest of that frame.

use escframe::frame::{ByteSource, Frame, FrameDriver, HandlerError, ESC, SOF};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let first = ByteSource::from(vec![
        0x70, ESC, SOF, ESC, b'H', b'e', b'l', b'l', b'o', ESC, SOF, 0x07, ESC, SOF,
    ]);
    let second = ByteSource::from(vec![b'W', b'o', b'r', b'l', b'd', ESC, SOF, 0x99]);

    let mut driver = FrameDriver::new(|frame: Frame| {
        println!("{}", String::from_utf8_lossy(&frame.payload));
        Ok::<(), HandlerError>(())
    });

    for source in [first, second] {
        let summary = driver.drive(source)?;
        eprintln!(
            "drained {} bytes, {} frame(s), parser now {:?}",
            summary.bytes,
            summary.frames,
            driver.parser().state()
        );
    }

    Ok(())
}
