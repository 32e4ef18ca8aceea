use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};

use crate::codec::{Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::parser::FrameParser;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally — callers always get complete frames.
/// Bytes read past the end of a frame stay buffered for the next call.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    parser: FrameParser,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self::with_parser(inner, FrameParser::with_config(config))
    }

    /// Create a frame reader that continues from an existing parser state.
    pub fn with_parser(inner: T, parser: FrameParser) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            parser,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.drain_buffered() {
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    fn drain_buffered(&mut self) -> Option<Frame> {
        while self.buf.has_remaining() {
            self.parser.signal(self.buf.get_u8());
            if let Some(frame) = self.parser.poll_frame() {
                return Some(frame);
            }
        }
        None
    }

    /// Borrow the parser.
    pub fn parser(&self) -> &FrameParser {
        &self.parser
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Consume the reader and return the parser, so a later stream can
    /// continue where this one stopped. Buffered bytes are signalled first.
    pub fn into_parser(mut self) -> FrameParser {
        while self.buf.has_remaining() {
            self.parser.signal(self.buf.get_u8());
        }
        self.parser
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<Frame>;

    /// Yields frames until the stream ends; EOF ends iteration.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_frame() {
            Ok(frame) => Some(Ok(frame)),
            Err(FrameError::ConnectionClosed) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::encode_frame;
    use crate::marker::{Markers, ESC, SOF};

    fn wire(payloads: &[&[u8]]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for p in payloads {
            encode_frame(p, &Markers::default(), &mut buf);
        }
        buf.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(wire(&[b"hello"])));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.payload.as_ref(), b"hello");
    }

    #[test]
    fn read_multiple_frames() {
        let mut reader = FrameReader::new(Cursor::new(wire(&[b"one", b"two", b"three"])));

        let f1 = reader.read_frame().unwrap();
        let f2 = reader.read_frame().unwrap();
        let f3 = reader.read_frame().unwrap();

        assert_eq!(f1.payload.as_ref(), b"one");
        assert_eq!(f2.payload.as_ref(), b"two");
        assert_eq!(f3.payload.as_ref(), b"three");
        assert!(matches!(
            reader.read_frame().unwrap_err(),
            FrameError::ConnectionClosed
        ));
    }

    #[test]
    fn payload_with_markers_survives() {
        let payload = [ESC, SOF, b'H', 0x00, ESC];
        let mut reader = FrameReader::new(Cursor::new(wire(&[&payload])));
        assert_eq!(reader.read_frame().unwrap().payload.as_ref(), &payload);
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: wire(&[b"slow"]),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);
        assert_eq!(reader.read_frame().unwrap().payload.as_ref(), b"slow");
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut reader = FrameReader::new(Cursor::new(vec![ESC, SOF, b'p', b'a']));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert_eq!(reader.parser().in_progress_len(), 2);
    }

    #[test]
    fn parser_carries_over_to_next_stream() {
        let mut reader = FrameReader::new(Cursor::new(vec![ESC, SOF, b'p', b'a']));
        assert!(reader.read_frame().is_err());

        let parser = reader.into_parser();
        let mut next = FrameReader::with_parser(Cursor::new(vec![b'r', b't', ESC, SOF]), parser);
        assert_eq!(next.read_frame().unwrap().payload.as_ref(), b"part");
    }

    #[test]
    fn iterator_ends_at_eof() {
        let reader = FrameReader::new(Cursor::new(wire(&[b"a", b"b"])));
        let frames: Vec<_> = reader.map(|f| f.unwrap().payload.to_vec()).collect();
        assert_eq!(frames, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn noise_between_frames_is_skipped() {
        let mut bytes = b"garbage".to_vec();
        bytes.extend(wire(&[b"x"]));
        bytes.extend_from_slice(&[ESC, b'?']);
        bytes.extend(wire(&[b"y"]));

        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert_eq!(reader.read_frame().unwrap().payload.as_ref(), b"x");
        assert_eq!(reader.read_frame().unwrap().payload.as_ref(), b"y");
        assert_eq!(reader.parser().stats().malformed_starts, 1);
    }

    #[test]
    fn read_error_propagates() {
        let mut reader = FrameReader::new(FailingReader);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(wire(&[b"ok"])),
        };
        let mut framed = FrameReader::new(reader);
        assert_eq!(framed.read_frame().unwrap().payload.as_ref(), b"ok");
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }
}
