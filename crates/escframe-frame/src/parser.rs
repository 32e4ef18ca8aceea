use bytes::{BufMut, BytesMut};
use tracing::{debug, trace, warn};

use crate::codec::{Frame, FrameConfig};

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Where the parser is within the `ESC SOF ... ESC SOF` grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Outside a frame, waiting for `ESC`.
    Idle,
    /// Saw `ESC` outside a frame, waiting for `SOF`.
    AwaitingSof,
    /// Inside a frame, appending payload bytes.
    Capturing,
    /// Inside a frame, the previous byte was `ESC`.
    CapturingAfterEsc,
}

/// Lifetime counters for a parser instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserStats {
    pub bytes_signalled: u64,
    /// Frames handed out by `poll_frame`.
    pub frames_emitted: u64,
    pub empty_frames_dropped: u64,
    pub idle_bytes_discarded: u64,
    /// `ESC` followed by something other than `SOF` outside a frame.
    pub malformed_starts: u64,
    /// `ESC` followed by something other than `SOF` or `ESC` inside a frame.
    pub desyncs: u64,
    pub oversized_frames: u64,
    /// Completed frames replaced before anyone polled them.
    pub frames_overwritten: u64,
}

/// Reassembles escape-delimited frames from bytes delivered one at a time.
///
/// Bytes go in through [`signal`](Self::signal); a completed frame comes out
/// through [`poll_frame`](Self::poll_frame). The parser does not care where
/// bytes come from: its state carries over unchanged when one byte source
/// ends and another begins.
///
/// Malformed input never produces an error. A bad start sequence or an
/// out-of-sync escape drops whatever was in progress and the parser goes
/// back to [`ParserState::Idle`].
#[derive(Debug)]
pub struct FrameParser {
    state: ParserState,
    buf: BytesMut,
    /// Payload bytes seen past `max_frame_size` for the frame in progress.
    overflow: usize,
    pending_signal: Option<u8>,
    ready: Option<Frame>,
    config: FrameConfig,
    stats: ParserStats,
}

impl FrameParser {
    /// Create a parser with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a parser with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            state: ParserState::Idle,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            overflow: 0,
            pending_signal: None,
            ready: None,
            config,
            stats: ParserStats::default(),
        }
    }

    /// Deliver the next inbound byte.
    ///
    /// Must be called once per byte, in stream order. The byte is consumed
    /// before this returns, so a following [`poll_frame`](Self::poll_frame)
    /// sees any frame it completed.
    pub fn signal(&mut self, byte: u8) {
        // Single slot, last write wins. Always drained below.
        self.pending_signal = Some(byte);
        self.resume();
    }

    /// Take the frame completed since the last poll, if any.
    ///
    /// Each completed frame is returned at most once.
    pub fn poll_frame(&mut self) -> Option<Frame> {
        let frame = self.ready.take()?;
        self.stats.frames_emitted += 1;
        Some(frame)
    }

    /// Signal every byte of `bytes`, collecting the frames they complete.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        for &b in bytes {
            self.signal(b);
            if let Some(frame) = self.poll_frame() {
                frames.push(frame);
            }
        }
        frames
    }

    /// Drop any partial or unpolled frame and return to `Idle`.
    ///
    /// Stats are kept.
    pub fn reset(&mut self) {
        self.state = ParserState::Idle;
        self.buf.clear();
        self.overflow = 0;
        self.pending_signal = None;
        self.ready = None;
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == ParserState::Idle
    }

    /// Number of payload bytes captured for the frame in progress.
    pub fn in_progress_len(&self) -> usize {
        match self.state {
            ParserState::Capturing | ParserState::CapturingAfterEsc => self.buf.len(),
            ParserState::Idle | ParserState::AwaitingSof => 0,
        }
    }

    pub fn stats(&self) -> &ParserStats {
        &self.stats
    }

    /// Current parser configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn resume(&mut self) {
        let Some(byte) = self.pending_signal.take() else {
            return;
        };
        self.stats.bytes_signalled += 1;
        self.state = self.step(byte);
    }

    fn step(&mut self, byte: u8) -> ParserState {
        let esc = self.config.markers.esc();
        let sof = self.config.markers.sof();

        match self.state {
            ParserState::Idle => {
                if byte == esc {
                    ParserState::AwaitingSof
                } else {
                    self.stats.idle_bytes_discarded += 1;
                    ParserState::Idle
                }
            }
            ParserState::AwaitingSof => {
                if byte == sof {
                    self.buf.clear();
                    self.overflow = 0;
                    ParserState::Capturing
                } else {
                    self.stats.malformed_starts += 1;
                    debug!(byte, "malformed start sequence, ignoring");
                    ParserState::Idle
                }
            }
            ParserState::Capturing => {
                if byte == esc {
                    ParserState::CapturingAfterEsc
                } else {
                    self.append(byte);
                    ParserState::Capturing
                }
            }
            ParserState::CapturingAfterEsc => {
                if byte == sof {
                    self.finish();
                    ParserState::Idle
                } else if byte == esc {
                    // ESC ESC carries one literal ESC.
                    self.append(byte);
                    ParserState::Capturing
                } else {
                    self.stats.desyncs += 1;
                    debug!(
                        byte,
                        discarded = self.buf.len() + self.overflow,
                        "out of sync after escape, dropping frame"
                    );
                    self.buf.clear();
                    self.overflow = 0;
                    ParserState::Idle
                }
            }
        }
    }

    fn append(&mut self, byte: u8) {
        if self.buf.len() >= self.config.max_frame_size {
            self.overflow = self.overflow.saturating_add(1);
            return;
        }
        self.buf.put_u8(byte);
    }

    fn finish(&mut self) {
        let overflow = std::mem::take(&mut self.overflow);
        let payload = self.buf.split().freeze();

        if overflow > 0 {
            self.stats.oversized_frames += 1;
            debug!(
                size = payload.len() + overflow,
                max = self.config.max_frame_size,
                "dropping oversized frame"
            );
            return;
        }

        if payload.is_empty() && !self.config.emit_empty_frames {
            self.stats.empty_frames_dropped += 1;
            trace!("dropping empty frame");
            return;
        }

        trace!(len = payload.len(), "frame complete");
        if let Some(old) = self.ready.replace(Frame { payload }) {
            self.stats.frames_overwritten += 1;
            warn!(dropped_len = old.len(), "completed frame replaced before poll");
        }
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{Markers, ESC, SOF};

    fn feed(parser: &mut FrameParser, bytes: &[u8]) -> Vec<Vec<u8>> {
        parser
            .push(bytes)
            .into_iter()
            .map(|f| f.payload.to_vec())
            .collect()
    }

    #[test]
    fn idle_bytes_never_produce_frames() {
        let mut parser = FrameParser::new();
        let frames = feed(&mut parser, b"plain text without markers \x00\x01\xFF");
        assert!(frames.is_empty());
        assert!(parser.is_idle());
        assert_eq!(parser.stats().idle_bytes_discarded, 30);
    }

    #[test]
    fn single_delimited_frame() {
        let mut parser = FrameParser::new();
        let mut wire = vec![ESC, SOF];
        wire.extend_from_slice(b"data");
        wire.extend_from_slice(&[ESC, SOF]);

        assert_eq!(feed(&mut parser, &wire), vec![b"data".to_vec()]);
        assert!(parser.is_idle());
    }

    #[test]
    fn desync_drops_frame_and_recovers() {
        let mut parser = FrameParser::new();
        let frames = feed(&mut parser, &[ESC, SOF, b'a', b'b', ESC, b'X']);
        assert!(frames.is_empty());
        assert_eq!(parser.state(), ParserState::Idle);
        assert_eq!(parser.stats().desyncs, 1);

        let frames = feed(&mut parser, &[ESC, SOF, b'o', b'k', ESC, SOF]);
        assert_eq!(frames, vec![b"ok".to_vec()]);
    }

    #[test]
    fn malformed_start_returns_to_idle() {
        let mut parser = FrameParser::new();
        parser.signal(ESC);
        assert_eq!(parser.state(), ParserState::AwaitingSof);
        parser.signal(b'z');
        assert_eq!(parser.state(), ParserState::Idle);
        assert_eq!(parser.stats().malformed_starts, 1);
        assert!(parser.poll_frame().is_none());
    }

    #[test]
    fn double_escape_outside_frame_is_malformed_start() {
        let mut parser = FrameParser::new();
        parser.signal(ESC);
        parser.signal(ESC);
        assert_eq!(parser.state(), ParserState::Idle);

        let frames = feed(&mut parser, &[SOF, b'x', ESC, SOF]);
        assert!(frames.is_empty());
        assert_eq!(parser.stats().malformed_starts, 1);
        assert_eq!(parser.stats().idle_bytes_discarded, 2);
        assert_eq!(parser.state(), ParserState::Capturing);
        assert_eq!(parser.in_progress_len(), 0);
    }

    #[test]
    fn escaped_escape_is_literal() {
        let mut parser = FrameParser::new();
        let frames = feed(&mut parser, &[ESC, SOF, ESC, ESC, b'i', ESC, SOF]);
        assert_eq!(frames, vec![vec![ESC, b'i']]);
    }

    #[test]
    fn state_transitions() {
        let mut parser = FrameParser::new();
        assert_eq!(parser.state(), ParserState::Idle);
        parser.signal(ESC);
        assert_eq!(parser.state(), ParserState::AwaitingSof);
        parser.signal(SOF);
        assert_eq!(parser.state(), ParserState::Capturing);
        parser.signal(b'q');
        assert_eq!(parser.in_progress_len(), 1);
        parser.signal(ESC);
        assert_eq!(parser.state(), ParserState::CapturingAfterEsc);
        parser.signal(SOF);
        assert_eq!(parser.state(), ParserState::Idle);
        assert_eq!(parser.poll_frame().unwrap().payload.as_ref(), b"q");
    }

    #[test]
    fn poll_is_idempotent() {
        let mut parser = FrameParser::new();
        for b in [ESC, SOF, b'x', ESC, SOF] {
            parser.signal(b);
        }
        assert!(parser.poll_frame().is_some());
        assert!(parser.poll_frame().is_none());
    }

    #[test]
    fn state_persists_across_sources() {
        let mut parser = FrameParser::new();
        assert!(feed(&mut parser, &[ESC, SOF, b'p', b'a']).is_empty());
        assert_eq!(parser.state(), ParserState::Capturing);

        let frames = feed(&mut parser, &[b'r', b't', ESC, SOF]);
        assert_eq!(frames, vec![b"part".to_vec()]);
    }

    #[test]
    fn two_stream_example() {
        let mut parser = FrameParser::new();
        let first = [
            0x70, ESC, SOF, ESC, b'H', b'e', b'l', b'l', b'o', ESC, SOF, 0x07, ESC, SOF,
        ];
        let second = [b'W', b'o', b'r', b'l', b'd', ESC, SOF, 0x99];

        assert_eq!(feed(&mut parser, &first), vec![b"Hello".to_vec()]);
        assert_eq!(feed(&mut parser, &second), vec![b"World".to_vec()]);
        assert!(parser.is_idle());
        assert_eq!(parser.stats().frames_emitted, 2);
        assert_eq!(parser.stats().idle_bytes_discarded, 3);
    }

    #[test]
    fn empty_frames_dropped_by_default() {
        let mut parser = FrameParser::new();
        assert!(feed(&mut parser, &[ESC, SOF, ESC, SOF]).is_empty());
        assert_eq!(parser.stats().empty_frames_dropped, 1);
    }

    #[test]
    fn empty_frames_emitted_when_enabled() {
        let cfg = FrameConfig {
            emit_empty_frames: true,
            ..FrameConfig::default()
        };
        let mut parser = FrameParser::with_config(cfg);
        assert_eq!(feed(&mut parser, &[ESC, SOF, ESC, SOF]), vec![Vec::new()]);
    }

    #[test]
    fn oversized_frame_dropped_then_next_parses() {
        let cfg = FrameConfig {
            max_frame_size: 4,
            ..FrameConfig::default()
        };
        let mut parser = FrameParser::with_config(cfg);

        let mut wire = vec![ESC, SOF];
        wire.extend_from_slice(b"too long");
        wire.extend_from_slice(&[ESC, SOF, ESC, SOF]);
        wire.extend_from_slice(b"fits");
        wire.extend_from_slice(&[ESC, SOF]);

        assert_eq!(feed(&mut parser, &wire), vec![b"fits".to_vec()]);
        assert_eq!(parser.stats().oversized_frames, 1);
    }

    #[test]
    fn unpolled_frame_is_replaced() {
        let mut parser = FrameParser::new();
        for b in [ESC, SOF, b'1', ESC, SOF, ESC, SOF, b'2', ESC, SOF] {
            parser.signal(b);
        }
        assert_eq!(parser.poll_frame().unwrap().payload.as_ref(), b"2");
        assert!(parser.poll_frame().is_none());
        assert_eq!(parser.stats().frames_overwritten, 1);
        assert_eq!(parser.stats().frames_emitted, 1);
    }

    #[test]
    fn unpolled_frame_is_not_counted() {
        let mut parser = FrameParser::new();
        for b in [ESC, SOF, b'1', ESC, SOF] {
            parser.signal(b);
        }
        assert_eq!(parser.stats().frames_emitted, 0);
        parser.reset();
        assert!(parser.poll_frame().is_none());
        assert_eq!(parser.stats().frames_emitted, 0);
    }

    #[test]
    fn reset_discards_partial_frame() {
        let mut parser = FrameParser::new();
        feed(&mut parser, &[ESC, SOF, b'a']);
        parser.reset();
        assert!(parser.is_idle());
        assert_eq!(parser.in_progress_len(), 0);

        assert!(feed(&mut parser, &[b'b', ESC, SOF]).is_empty());
        assert_eq!(parser.state(), ParserState::Capturing);
    }

    #[test]
    fn custom_markers() {
        let cfg = FrameConfig {
            markers: Markers::new(0xDB, 0xC0).unwrap(),
            ..FrameConfig::default()
        };
        let mut parser = FrameParser::with_config(cfg);
        let frames = feed(&mut parser, &[0xDB, 0xC0, b'H', 0xDB, 0xDB, 0xDB, 0xC0]);
        assert_eq!(frames, vec![vec![b'H', 0xDB]]);
    }
}
