//! `tokio_util::codec` adapter over [`FrameParser`].

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_checked, Frame, FrameConfig};
use crate::error::FrameError;
use crate::parser::FrameParser;

/// Codec for use with `FramedRead` / `FramedWrite`.
///
/// Decoding feeds the read buffer through a parser one byte at a time and
/// stops as soon as a frame completes, leaving later bytes in the buffer.
#[derive(Debug, Default)]
pub struct EscCodec {
    parser: FrameParser,
}

impl EscCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            parser: FrameParser::with_config(config),
        }
    }

    pub fn parser(&self) -> &FrameParser {
        &self.parser
    }
}

impl Decoder for EscCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        while src.has_remaining() {
            self.parser.signal(src.get_u8());
            if let Some(frame) = self.parser.poll_frame() {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}

impl Encoder<Bytes> for EscCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_checked(&item, self.parser.config(), dst)
    }
}

impl Encoder<Frame> for EscCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_checked(&item.payload, self.parser.config(), dst)
    }
}
