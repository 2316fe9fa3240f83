//! Register-access seam for status-register housekeeping.
//!
//! Backends that service hardware events by polling read a status word, act on the
//! bits they care about, and clear what they observed. The seam is a trait so unit
//! tests can inject a simulated register and exercise the clearing discipline without
//! hardware.

/// A hardware status word with write-1-to-clear semantics.
///
/// Reads are allowed to have side effects on real hardware, so both operations take
/// `&mut self`.
pub trait StatusRegister {
    fn read(&mut self) -> u32;

    fn write(&mut self, value: u32);

    /// Clear exactly the bits observed by a read, by writing that value back.
    ///
    /// Bits that become set between the read and the write-back survive; clearing with
    /// a literal mask instead would race with the hardware and lose events. Returns the
    /// value read.
    fn clear_observed(&mut self) -> u32 {
        let value = self.read();
        self.write(value);
        value
    }
}

impl<R: StatusRegister + ?Sized> StatusRegister for &mut R {
    fn read(&mut self) -> u32 {
        <R as StatusRegister>::read(&mut **self)
    }

    fn write(&mut self, value: u32) {
        <R as StatusRegister>::write(&mut **self, value);
    }
}
