use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::marker::Markers;

/// Bytes added around every payload: `ESC SOF` before and after.
pub const DELIMITER_OVERHEAD: usize = 4;

/// Default maximum frame payload size: 64 KiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// A completed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The frame payload, with markers and escapes removed.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The payload as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    /// The size of this frame once encoded with `markers`.
    pub fn wire_size(&self, markers: &Markers) -> usize {
        encoded_len(&self.payload, markers)
    }
}

/// Length of `payload` once encoded: delimiters plus one extra byte per
/// literal `ESC`.
pub fn encoded_len(payload: &[u8], markers: &Markers) -> usize {
    let escapes = payload.iter().filter(|&&b| b == markers.esc()).count();
    DELIMITER_OVERHEAD + payload.len() + escapes
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌─────────┬──────────────────────────────┬─────────┐
/// │ ESC SOF │ payload, ESC written ESC ESC │ ESC SOF │
/// └─────────┴──────────────────────────────┴─────────┘
/// ```
pub fn encode_frame(payload: &[u8], markers: &Markers, dst: &mut BytesMut) {
    let esc = markers.esc();
    let sof = markers.sof();

    dst.reserve(encoded_len(payload, markers));
    dst.put_u8(esc);
    dst.put_u8(sof);
    for &b in payload {
        if b == esc {
            dst.put_u8(esc);
        }
        dst.put_u8(b);
    }
    dst.put_u8(esc);
    dst.put_u8(sof);
}

/// Encode a payload, rejecting it if it exceeds `config.max_frame_size`.
pub fn encode_checked(payload: &[u8], config: &FrameConfig, dst: &mut BytesMut) -> Result<()> {
    if payload.len() > config.max_frame_size {
        return Err(FrameError::FrameTooLarge {
            size: payload.len(),
            max: config.max_frame_size,
        });
    }
    encode_frame(payload, &config.markers, dst);
    Ok(())
}

/// Configuration shared by the parser, reader, writer and codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Marker bytes. Default: `ESC = 'H'`, `SOF = 0x10`.
    pub markers: Markers,
    /// Maximum payload size in bytes. Default: 64 KiB.
    pub max_frame_size: usize,
    /// Whether `ESC SOF ESC SOF` yields an empty frame. Default: false.
    pub emit_empty_frames: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            markers: Markers::default(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            emit_empty_frames: false,
        }
    }
}
