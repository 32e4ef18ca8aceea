//! Escape-delimited byte-stream framing.
//!
//! Every frame on the wire looks like:
//! - `ESC SOF` to open it
//! - the payload, with each literal `ESC` written twice
//! - `ESC SOF` to close it
//!
//! [`FrameParser`] consumes the stream one byte at a time (`signal`) and hands
//! out completed frames (`poll_frame`). Its state survives the end of one byte
//! source and the start of the next. Malformed sequences are dropped, never
//! reported as errors.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod driver;
pub mod error;
pub mod marker;
pub mod parser;
pub mod reader;
pub mod source;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::EscCodec;
pub use codec::{
    encode_checked, encode_frame, encoded_len, Frame, FrameConfig, DEFAULT_MAX_FRAME_SIZE,
    DELIMITER_OVERHEAD,
};
pub use driver::{process_stream, DriveSummary, FrameCollector, FrameDriver, FrameHandler};
pub use error::{FrameError, HandlerError, Result};
pub use marker::{marker_name, Markers, ESC, SOF};
pub use parser::{FrameParser, ParserState, ParserStats};
pub use reader::FrameReader;
pub use source::ByteSource;
pub use writer::FrameWriter;
