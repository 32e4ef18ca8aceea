//! Escape-delimited byte-stream framing.
//!
//! escframe reassembles `ESC SOF ... ESC SOF` frames from byte streams that
//! arrive one byte at a time, possibly across several independent sources.
//!
//! # Crate Structure
//!
//! - [`frame`] — Parser state machine, byte sources, driver, encoder, reader/writer
//! - [`frame::EscCodec`] — `tokio_util` codec (behind `async` feature)

/// Re-export frame types.
pub mod frame {
    pub use escframe_frame::*;
}
