use tracing::debug;

use crate::codec::Frame;
use crate::error::{FrameError, HandlerError, Result};
use crate::parser::FrameParser;

/// Receives each completed frame.
pub trait FrameHandler {
    fn handle_frame(&mut self, frame: Frame) -> std::result::Result<(), HandlerError>;
}

impl<F, E> FrameHandler for F
where
    F: FnMut(Frame) -> std::result::Result<(), E>,
    E: Into<HandlerError>,
{
    fn handle_frame(&mut self, frame: Frame) -> std::result::Result<(), HandlerError> {
        self(frame).map_err(Into::into)
    }
}

/// Handler that keeps every frame it is given.
#[derive(Debug, Default)]
pub struct FrameCollector {
    frames: Vec<Frame>,
}

impl FrameCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl FrameHandler for FrameCollector {
    fn handle_frame(&mut self, frame: Frame) -> std::result::Result<(), HandlerError> {
        self.frames.push(frame);
        Ok(())
    }
}

/// What one call to [`process_stream`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveSummary {
    /// Bytes taken from the source and signalled to the parser.
    pub bytes: usize,
    /// Frames accepted by the handler.
    pub frames: usize,
}

/// Drain `source` into `parser`, dispatching completed frames to `handler`.
///
/// For every byte: signal, then poll, then dispatch. A handler error stops
/// the drain and is returned as [`FrameError::Handler`]; bytes already
/// signalled stay applied to the parser, and the rest of the source is left
/// unread (pass `&mut source` to keep it).
pub fn process_stream<I, H>(
    source: I,
    parser: &mut FrameParser,
    handler: &mut H,
) -> Result<DriveSummary>
where
    I: IntoIterator<Item = u8>,
    H: FrameHandler + ?Sized,
{
    let mut summary = DriveSummary::default();

    for b in source {
        parser.signal(b);
        summary.bytes += 1;

        if let Some(frame) = parser.poll_frame() {
            handler.handle_frame(frame).map_err(FrameError::Handler)?;
            summary.frames += 1;
        }
    }

    Ok(summary)
}

/// A long-lived parser paired with its frame handler.
///
/// Feed it any number of sources with [`drive`](Self::drive); parser state
/// carries over between them.
#[derive(Debug)]
pub struct FrameDriver<H> {
    parser: FrameParser,
    handler: H,
    streams: u64,
}

impl<H: FrameHandler> FrameDriver<H> {
    /// Create a driver with a default parser.
    pub fn new(handler: H) -> Self {
        Self::with_parser(FrameParser::new(), handler)
    }

    pub fn with_parser(parser: FrameParser, handler: H) -> Self {
        Self {
            parser,
            handler,
            streams: 0,
        }
    }

    /// Drain one source through the parser.
    pub fn drive<I>(&mut self, source: I) -> Result<DriveSummary>
    where
        I: IntoIterator<Item = u8>,
    {
        self.streams += 1;
        let summary = process_stream(source, &mut self.parser, &mut self.handler)?;
        debug!(
            stream = self.streams,
            bytes = summary.bytes,
            frames = summary.frames,
            state = ?self.parser.state(),
            "source drained"
        );
        Ok(summary)
    }

    /// Number of sources handed to [`drive`](Self::drive) so far.
    pub fn streams(&self) -> u64 {
        self.streams
    }

    pub fn parser(&self) -> &FrameParser {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut FrameParser {
        &mut self.parser
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Consume the driver and return the parser and handler.
    pub fn into_parts(self) -> (FrameParser, H) {
        (self.parser, self.handler)
    }
}
