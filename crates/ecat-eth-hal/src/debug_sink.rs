//! Diagnostic text sink with a fixed-size format buffer.
//!
//! Independent of the transport; used only for diagnostics. Messages are rendered into
//! a single 1024-byte buffer that is reused across calls, then forwarded to the
//! console sink. Output beyond the buffer capacity is silently truncated. The buffer
//! is shared state: `&mut self` serializes callers within one execution context, and
//! use from multiple contexts requires external synchronization.

use std::fmt;
use std::io::{self, Write};

/// Capacity of the shared format buffer.
pub const DEBUG_BUFFER_LEN: usize = 1024;

/// Renders formatted messages into a fixed buffer and writes them to a console sink.
pub struct DebugSink<W> {
    buf: [u8; DEBUG_BUFFER_LEN],
    out: W,
}

impl DebugSink<io::Stderr> {
    /// Sink writing to the process console.
    pub fn console() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> DebugSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            buf: [0; DEBUG_BUFFER_LEN],
            out,
        }
    }

    /// Render `args` into the shared buffer and forward the rendered text.
    ///
    /// Rendering never fails: once the buffer is full the remaining output is dropped,
    /// matching the truncation rule of the underlying formatting routine. Only the
    /// console write itself can report an error.
    pub fn print(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        let mut cursor = FixedCursor {
            buf: &mut self.buf,
            len: 0,
        };
        // Truncation is not an error; `write_str` below always reports success.
        let _ = fmt::Write::write_fmt(&mut cursor, args);
        let len = cursor.len;
        self.out.write_all(&self.buf[..len])
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

struct FixedCursor<'a> {
    buf: &'a mut [u8; DEBUG_BUFFER_LEN],
    len: usize,
}

impl fmt::Write for FixedCursor<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = DEBUG_BUFFER_LEN - self.len;
        let take = room.min(s.len());
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

/// Render a format string through a [`DebugSink`].
///
/// ```
/// use ecat_eth_hal::{debug_print, DebugSink};
///
/// let mut sink = DebugSink::new(Vec::new());
/// debug_print!(sink, "wkc {} expected {}", 3, 4).unwrap();
/// assert_eq!(sink.into_inner(), b"wkc 3 expected 4");
/// ```
#[macro_export]
macro_rules! debug_print {
    ($sink:expr, $($arg:tt)*) => {
        $sink.print(::core::format_args!($($arg)*))
    };
}
