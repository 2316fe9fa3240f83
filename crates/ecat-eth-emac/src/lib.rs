//! Integrated MAC/DMA backend: the on-chip Ethernet controller driven through the
//! vendor TCP/UDP stack's raw packet primitives.
//!
//! The controller is operated in a polling model. Its interrupt line is masked when
//! the channel opens, and pending hardware status (PHY status change, Wake-on-LAN
//! magic-packet detect) is serviced at the top of every receive poll instead of in an
//! interrupt handler. Frame queueing, electrical init and the interrupt vector table
//! belong to the vendor stack behind [`RawPacketChannel`]; this crate only owns the
//! transport contract and the status-register discipline.
#![forbid(unsafe_code)]

use ecat_eth_hal::{split_frame, EthernetTransport, StatusRegister, TransportError};
use tracing::{debug, trace};

/// Controller-status (ECSR) magic-packet-detect bit: a Wake-on-LAN pattern arrived
/// while detection was armed.
pub const ECSR_MPD: u32 = 1 << 1;

/// Engine-status (EESR) controller-interrupt bit: the controller-status register has
/// events pending.
pub const EESR_ECI: u32 = 1 << 22;

/// Raw packet channel of the vendor TCP/UDP stack.
///
/// Result codes live in the vendor's own space: zero and positive values indicate
/// success, negative values are failures. This crate passes them through rather than
/// inventing a taxonomy the driver does not have.
pub trait RawPacketChannel {
    /// Allocate the stack's internal work area and open the single raw channel.
    fn open(&mut self) -> i32;

    /// Close the channel, freeing the stack's internal resources.
    fn close(&mut self);

    /// Queue one frame for transmission as separate header and payload segments.
    fn write_split(&mut self, header: &[u8], payload: &[u8]) -> i32;

    /// Borrow the next pending frame from the driver-owned receive buffer, or `None`
    /// when nothing is queued. The borrow is valid until the next driver call.
    fn read_next(&mut self) -> Option<&[u8]>;
}

/// Register-level view of the integrated controller used by the polling path.
///
/// Both status words are write-1-to-clear; the backend clears them by writing back
/// the exact value it read (see [`StatusRegister::clear_observed`]), never a literal
/// mask, so events raised after the read are preserved.
pub trait MacRegisterFile {
    type Controller: StatusRegister;
    type Engine: StatusRegister;

    /// Controller status word (ECSR): magic packet detect, link change, and friends.
    fn controller_status(&mut self) -> &mut Self::Controller;

    /// DMA engine status word (EESR); its [`EESR_ECI`] bit mirrors pending controller
    /// status.
    fn engine_status(&mut self) -> &mut Self::Engine;

    /// Mask or unmask the controller's Ethernet interrupt line.
    fn set_ethernet_interrupt(&mut self, enabled: bool);
}

/// Raw-Ethernet transport over the integrated controller.
pub struct IntegratedMacBackend<C, R> {
    channel: C,
    regs: R,
}

impl<C: RawPacketChannel, R: MacRegisterFile> IntegratedMacBackend<C, R> {
    pub fn new(channel: C, regs: R) -> Self {
        Self { channel, regs }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn regs(&self) -> &R {
        &self.regs
    }

    pub fn regs_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    pub fn into_parts(self) -> (C, R) {
        (self.channel, self.regs)
    }

    /// Service pending hardware status ahead of a receive attempt.
    ///
    /// Reads both status words up front, then clears each by writing back the value
    /// read. ECSR is touched only when EESR reports controller events pending; EESR is
    /// cleared unconditionally.
    fn service_status(&mut self) {
        let controller = self.regs.controller_status().read();
        let engine = self.regs.engine_status().read();

        if engine & EESR_ECI != 0 {
            if controller & ECSR_MPD != 0 {
                // Observed only; acting on the wake event belongs to host power logic.
                trace!(ecsr = controller, "magic packet detect pending");
            }
            self.regs.controller_status().write(controller);
        }
        self.regs.engine_status().write(engine);
    }
}

impl<C: RawPacketChannel, R: MacRegisterFile> EthernetTransport for IntegratedMacBackend<C, R> {
    fn open(&mut self) -> Result<(), TransportError> {
        let code = self.channel.open();
        // Data-path events are serviced by polling in `poll_receive`; the line stays
        // masked for the whole lifetime of the channel.
        self.regs.set_ethernet_interrupt(false);
        if code < 0 {
            return Err(TransportError::Vendor(code));
        }
        debug!(code, "raw channel open, interrupt line masked");
        Ok(())
    }

    fn close(&mut self) {
        self.channel.close();
        debug!("raw channel closed");
    }

    fn send(&mut self, frame: &[u8]) -> Result<usize, TransportError> {
        let (header, payload) = split_frame(frame)?;
        let code = self.channel.write_split(header, payload);
        if code < 0 {
            return Err(TransportError::Vendor(code));
        }
        Ok(code as usize)
    }

    fn poll_receive(&mut self) -> Result<Option<&[u8]>, TransportError> {
        self.service_status();
        Ok(self.channel.read_next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;

    #[derive(Default)]
    struct FakeChannel {
        open_code: i32,
        write_code: Option<i32>,
        opens: usize,
        closes: usize,
        writes: Vec<(Vec<u8>, Vec<u8>)>,
        rx: VecDeque<Vec<u8>>,
        slot: Vec<u8>,
    }

    impl RawPacketChannel for FakeChannel {
        fn open(&mut self) -> i32 {
            self.opens += 1;
            self.open_code
        }

        fn close(&mut self) {
            self.closes += 1;
        }

        fn write_split(&mut self, header: &[u8], payload: &[u8]) -> i32 {
            self.writes.push((header.to_vec(), payload.to_vec()));
            self.write_code
                .unwrap_or((header.len() + payload.len()) as i32)
        }

        fn read_next(&mut self) -> Option<&[u8]> {
            self.slot = self.rx.pop_front()?;
            Some(&self.slot)
        }
    }

    #[derive(Default)]
    struct FakeRegister {
        value: u32,
        writes: Vec<u32>,
    }

    impl StatusRegister for FakeRegister {
        fn read(&mut self) -> u32 {
            self.value
        }

        fn write(&mut self, value: u32) {
            self.writes.push(value);
            self.value &= !value;
        }
    }

    #[derive(Default)]
    struct FakeRegs {
        controller: FakeRegister,
        engine: FakeRegister,
        interrupt_enabled: Option<bool>,
    }

    impl MacRegisterFile for FakeRegs {
        type Controller = FakeRegister;
        type Engine = FakeRegister;

        fn controller_status(&mut self) -> &mut FakeRegister {
            &mut self.controller
        }

        fn engine_status(&mut self) -> &mut FakeRegister {
            &mut self.engine
        }

        fn set_ethernet_interrupt(&mut self, enabled: bool) {
            self.interrupt_enabled = Some(enabled);
        }
    }

    fn backend() -> IntegratedMacBackend<FakeChannel, FakeRegs> {
        IntegratedMacBackend::new(FakeChannel::default(), FakeRegs::default())
    }

    #[test]
    fn open_masks_the_interrupt_line() {
        let mut hal = backend();
        hal.open().unwrap();
        assert_eq!(hal.channel().opens, 1);
        assert_eq!(hal.regs().interrupt_enabled, Some(false));
    }

    #[test]
    fn open_surfaces_negative_vendor_codes() {
        let mut hal = backend();
        hal.channel_mut().open_code = -57;
        assert_eq!(hal.open(), Err(TransportError::Vendor(-57)));
        // The line is still masked on the failure path.
        assert_eq!(hal.regs().interrupt_enabled, Some(false));
    }

    #[test]
    fn send_submits_header_and_payload_segments_separately() {
        let mut hal = backend();
        let frame: Vec<u8> = (0..60).collect();
        assert_eq!(hal.send(&frame).unwrap(), 60);

        let (header, payload) = &hal.channel().writes[0];
        assert_eq!(header.len(), 14);
        assert_eq!(payload.len(), 46);
        assert_eq!(header.as_slice(), &frame[..14]);
        assert_eq!(payload.as_slice(), &frame[14..]);
    }

    #[test]
    fn send_rejects_short_frames_before_touching_the_driver() {
        let mut hal = backend();
        assert_eq!(
            hal.send(&[0u8; 10]),
            Err(TransportError::FrameTooShort { len: 10 })
        );
        assert!(hal.channel().writes.is_empty());
    }

    #[test]
    fn send_surfaces_negative_vendor_codes() {
        let mut hal = backend();
        hal.channel_mut().write_code = Some(-3);
        assert_eq!(hal.send(&[0u8; 20]), Err(TransportError::Vendor(-3)));
    }

    #[test]
    fn poll_receive_returns_none_when_nothing_is_pending() {
        let mut hal = backend();
        assert_eq!(hal.poll_receive().unwrap(), None);
        // A later frame arrives; the previous empty poll must not have pinned
        // stale state.
        hal.channel_mut().rx.push_back(vec![1, 2, 3]);
        assert_eq!(hal.poll_receive().unwrap(), Some(&[1u8, 2, 3][..]));
        assert_eq!(hal.poll_receive().unwrap(), None);
    }
}
