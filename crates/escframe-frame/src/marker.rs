//! Reserved marker bytes.
//!
//! `ESC SOF` opens and closes every frame. Inside a frame, `ESC ESC` carries
//! one literal `ESC` byte; `ESC` followed by any other byte is a desync.

use crate::error::{FrameError, Result};

/// Default escape marker (`'H'`).
pub const ESC: u8 = b'H';

/// Default start/end-of-frame marker.
pub const SOF: u8 = 0x10;

/// The pair of marker bytes a parser or encoder works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markers {
    esc: u8,
    sof: u8,
}

impl Markers {
    /// Create a marker pair. `esc` and `sof` must differ.
    pub fn new(esc: u8, sof: u8) -> Result<Self> {
        if esc == sof {
            return Err(FrameError::InvalidMarkers(esc));
        }
        Ok(Self { esc, sof })
    }

    pub fn esc(&self) -> u8 {
        self.esc
    }

    pub fn sof(&self) -> u8 {
        self.sof
    }

    /// Returns true if `byte` is one of the two markers.
    pub fn is_marker(&self, byte: u8) -> bool {
        byte == self.esc || byte == self.sof
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self { esc: ESC, sof: SOF }
    }
}

/// Returns a human-readable name for a byte under the given markers.
pub fn marker_name(markers: &Markers, byte: u8) -> &'static str {
    if byte == markers.esc {
        "ESC"
    } else if byte == markers.sof {
        "SOF"
    } else {
        "DATA"
    }
}
