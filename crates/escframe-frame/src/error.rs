/// Boxed error returned by a frame handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during frame encoding, reading, or dispatch.
///
/// Malformed byte sequences on the wire are not errors: the parser drops
/// them and resynchronizes on the next `ESC SOF`.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame payload exceeds the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The escape and start-of-frame markers are the same byte.
    #[error("invalid markers: ESC and SOF must differ (both 0x{0:02X})")]
    InvalidMarkers(u8),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// The frame handler rejected a frame.
    #[error("frame handler failed: {0}")]
    Handler(#[source] HandlerError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
