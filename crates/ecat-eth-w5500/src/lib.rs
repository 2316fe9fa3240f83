//! SPI MAC/PHY backend: an external W5500-class chip operated in MAC-raw mode.
//!
//! The chip terminates nothing itself in this mode; full Ethernet frames move between
//! its internal socket buffer and the HAL. One hardware socket is used, and the chip
//! places a 2-byte big-endian length prefix ahead of every received frame in its
//! buffer. This crate owns the single receive slot and the prefix parsing; SPI bus
//! timing and register maps belong to the chip driver behind [`MacRawChip`].
#![forbid(unsafe_code)]

use ecat_eth_hal::{EthernetTransport, TransportError, ETHERNET_HEADER_LEN};
use tracing::debug;

/// Capacity of the receive slot, and the largest frame the chip moves in one transfer.
pub const RX_BUFFER_LEN: usize = 1536;

/// The chip prefixes each received frame with its total framed size, prefix included.
pub const LENGTH_PREFIX_LEN: usize = 2;

/// Commands accepted by the chip's socket command register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketCommand {
    /// Open the socket in the configured mode.
    Open,
    /// Transmit the queued data as a raw MAC frame, no address resolution.
    SendMac,
    /// Acknowledge that queued receive data has been consumed.
    Recv,
}

/// Low-level operations of the SPI-attached chip, as exposed by its driver.
pub trait MacRawChip {
    /// Hardware reset and electrical initialization.
    fn reset(&mut self);

    /// Full software reset, clearing all transmit and receive state. The chip has no
    /// selective socket close; this is the coarsest-but-only teardown primitive.
    fn soft_reset(&mut self);

    /// Configure the single hardware socket for raw MAC frames.
    fn set_macraw_mode(&mut self);

    /// Issue a socket command.
    fn command(&mut self, command: SocketCommand);

    /// Number of received bytes currently pending in the chip's socket buffer.
    fn received_size(&mut self) -> usize;

    /// Copy `buf.len()` bytes out of the chip's socket buffer, advancing its read
    /// pointer.
    fn read_data(&mut self, buf: &mut [u8]);

    /// Queue a frame into the chip's transmit buffer.
    fn write_data(&mut self, frame: &[u8]);
}

/// Raw-Ethernet transport over the SPI-attached chip.
///
/// The receive slot is owned here and reused across calls; a slice returned by
/// [`EthernetTransport::poll_receive`] aliases it and is valid only until the next
/// poll.
pub struct SpiRawBackend<C> {
    chip: C,
    rx_slot: [u8; RX_BUFFER_LEN],
}

impl<C: MacRawChip> SpiRawBackend<C> {
    pub fn new(chip: C) -> Self {
        Self {
            chip,
            rx_slot: [0; RX_BUFFER_LEN],
        }
    }

    pub fn chip(&self) -> &C {
        &self.chip
    }

    pub fn chip_mut(&mut self) -> &mut C {
        &mut self.chip
    }

    pub fn into_chip(self) -> C {
        self.chip
    }
}

impl<C: MacRawChip> EthernetTransport for SpiRawBackend<C> {
    fn open(&mut self) -> Result<(), TransportError> {
        self.chip.reset();
        self.chip.set_macraw_mode();
        self.chip.command(SocketCommand::Open);
        debug!("raw socket open in MAC-raw mode");
        Ok(())
    }

    fn close(&mut self) {
        self.chip.soft_reset();
        debug!("chip soft reset on close");
    }

    fn send(&mut self, frame: &[u8]) -> Result<usize, TransportError> {
        if frame.len() < ETHERNET_HEADER_LEN {
            return Err(TransportError::FrameTooShort { len: frame.len() });
        }
        if frame.len() > RX_BUFFER_LEN {
            return Err(TransportError::FrameTooLong {
                len: frame.len(),
                max: RX_BUFFER_LEN,
            });
        }
        self.chip.write_data(frame);
        self.chip.command(SocketCommand::SendMac);
        Ok(frame.len())
    }

    fn poll_receive(&mut self) -> Result<Option<&[u8]>, TransportError> {
        if self.chip.received_size() == 0 {
            return Ok(None);
        }

        let mut prefix = [0u8; LENGTH_PREFIX_LEN];
        self.chip.read_data(&mut prefix);
        self.chip.command(SocketCommand::Recv);

        // The prefix counts itself; anything below 2 or beyond the slot cannot be a
        // frame the chip produced, and reading it through would scribble past the
        // slot, so it is rejected instead of trusted.
        let framed = u16::from_be_bytes(prefix);
        let payload_len = usize::from(framed)
            .checked_sub(LENGTH_PREFIX_LEN)
            .filter(|len| *len <= RX_BUFFER_LEN)
            .ok_or(TransportError::CorruptLengthPrefix { value: framed })?;

        self.rx_slot.fill(0);
        self.chip.read_data(&mut self.rx_slot[..payload_len]);
        self.chip.command(SocketCommand::Recv);
        Ok(Some(&self.rx_slot[..payload_len]))
    }
}
