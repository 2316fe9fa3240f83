//! Transport contract shared by the raw-Ethernet backends of the fieldbus master.
//!
//! This crate is intentionally minimal: it deals exclusively with raw Ethernet frames
//! (flat byte slices) and defines the four-operation contract (open, close, send,
//! receive) that the protocol engine calls. Concrete backends (the integrated MAC/DMA
//! controller in `ecat-eth-emac`, the SPI MAC/PHY chip in `ecat-eth-w5500`) implement
//! [`EthernetTransport`] and are selected at build configuration time; exactly one is
//! present in a given binary.
//!
//! This crate exists so the protocol engine and test harnesses do not need to depend on
//! either hardware backend.
#![forbid(unsafe_code)]

pub mod debug_sink;
pub mod regs;

pub use debug_sink::{DebugSink, DEBUG_BUFFER_LEN};
pub use regs::StatusRegister;

use thiserror::Error;

/// Length of the Ethernet frame header: destination MAC, source MAC, type/length.
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Failures a backend can actually distinguish.
///
/// There is no unified error taxonomy across the underlying drivers; each backend
/// surfaces its native result code ([`TransportError::Vendor`]) or one of the few
/// conditions this layer validates itself.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The frame is shorter than the 14-byte Ethernet header and cannot be split into
    /// header and payload segments.
    #[error("frame too short to carry an Ethernet header: {len} bytes, need at least 14")]
    FrameTooShort { len: usize },

    /// The frame exceeds the backend's transmit capacity.
    #[error("frame exceeds transmit capacity: {len} bytes > {max}")]
    FrameTooLong { len: usize, max: usize },

    /// The on-chip length prefix ahead of a received frame does not describe a frame
    /// that fits the receive slot.
    #[error("corrupt receive length prefix {value:#06x}")]
    CorruptLengthPrefix { value: u16 },

    /// A negative result code from the vendor driver, passed through in the driver's
    /// own code space.
    #[error("vendor driver error code {0}")]
    Vendor(i32),
}

/// Uniform raw-Ethernet transport used by the protocol engine.
///
/// The engine holds exactly one transport and drives it from a single cooperative
/// polling loop; no operation blocks or yields. Calling [`send`](Self::send) or
/// [`poll_receive`](Self::poll_receive) before `open` or after `close`, or opening
/// twice without an intervening close, is backend-defined and not guarded here.
pub trait EthernetTransport {
    /// Bring the transport to a ready-to-transfer state.
    fn open(&mut self) -> Result<(), TransportError>;

    /// Release the transport. Failure is not observable to the caller.
    fn close(&mut self);

    /// Transmit exactly one frame; no retry, no fragmentation.
    ///
    /// `frame` must be at least [`ETHERNET_HEADER_LEN`] bytes and must not exceed the
    /// underlying hardware's maximum frame size. Returns the count the underlying
    /// driver reported for the submission.
    fn send(&mut self, frame: &[u8]) -> Result<usize, TransportError>;

    /// Retrieve at most one pending frame, without blocking.
    ///
    /// Returns `Ok(None)` when nothing is pending. The returned slice borrows the
    /// backend's single receive slot and is valid only until the next `poll_receive`
    /// call; callers that need the data longer must copy it out.
    fn poll_receive(&mut self) -> Result<Option<&[u8]>, TransportError>;
}

impl<T: EthernetTransport + ?Sized> EthernetTransport for Box<T> {
    fn open(&mut self) -> Result<(), TransportError> {
        <T as EthernetTransport>::open(&mut **self)
    }

    fn close(&mut self) {
        <T as EthernetTransport>::close(&mut **self);
    }

    fn send(&mut self, frame: &[u8]) -> Result<usize, TransportError> {
        <T as EthernetTransport>::send(&mut **self, frame)
    }

    fn poll_receive(&mut self) -> Result<Option<&[u8]>, TransportError> {
        <T as EthernetTransport>::poll_receive(&mut **self)
    }
}

impl<T: EthernetTransport + ?Sized> EthernetTransport for &mut T {
    fn open(&mut self) -> Result<(), TransportError> {
        <T as EthernetTransport>::open(&mut **self)
    }

    fn close(&mut self) {
        <T as EthernetTransport>::close(&mut **self);
    }

    fn send(&mut self, frame: &[u8]) -> Result<usize, TransportError> {
        <T as EthernetTransport>::send(&mut **self, frame)
    }

    fn poll_receive(&mut self) -> Result<Option<&[u8]>, TransportError> {
        <T as EthernetTransport>::poll_receive(&mut **self)
    }
}

/// Split a frame into its 14-byte header segment and the remaining payload segment.
///
/// This is the only structure the HAL imposes on a frame; backends that submit the two
/// segments separately use this so a short input is rejected up front instead of
/// underflowing the payload-length computation.
pub fn split_frame(frame: &[u8]) -> Result<(&[u8], &[u8]), TransportError> {
    if frame.len() < ETHERNET_HEADER_LEN {
        return Err(TransportError::FrameTooShort { len: frame.len() });
    }
    Ok(frame.split_at(ETHERNET_HEADER_LEN))
}
