use crate::error::Error;
use crate::traits::{Address, FlashMemoryDevice, ERASED};

/// Number of identical raw reads required before a value is trusted.
pub const READ_SAMPLES: u8 = 5;

/// Guards reads and writes against a noisy flash device.
///
/// The driver borrows the device for its whole lifetime and keeps no state
/// between calls: every read and write goes to the hardware.
pub struct DeviceDriver<'a, D: FlashMemoryDevice + ?Sized> {
    device: &'a mut D,
}

impl<D: FlashMemoryDevice + ?Sized> core::fmt::Debug for DeviceDriver<'_, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeviceDriver").finish()
    }
}

impl<'a, D: FlashMemoryDevice + ?Sized> DeviceDriver<'a, D> {
    pub fn new(device: &'a mut D) -> Self {
        Self { device }
    }

    /// Verified read.
    ///
    /// Reads `address` [`READ_SAMPLES`] times and returns the value only if
    /// every sample matches the first one. Gives up at the first mismatch,
    /// so an unstable cell may cost fewer than [`READ_SAMPLES`] raw reads.
    pub fn read(&mut self, address: Address) -> Result<u32, Error<D::Error>> {
        let expected = self.device.read(address).map_err(Error::Device)?;
        defmt::trace!("read {=i64:#x} [1] = {=u8:#x}", address, expected);

        for sample in 2..=READ_SAMPLES {
            let observed = self.device.read(address).map_err(Error::Device)?;
            defmt::trace!("read {=i64:#x} [{=u8}] = {=u8:#x}", address, sample, observed);
            if observed != expected {
                defmt::warn!(
                    "Unstable read at {=i64:#x}: {=u8:#x} then {=u8:#x}",
                    address,
                    expected,
                    observed
                );
                return Err(Error::ReadInstability {
                    address,
                    expected,
                    observed,
                    sample,
                });
            }
        }

        Ok(u32::from(expected))
    }

    /// Guarded write.
    ///
    /// Only the low byte of `data` is written, and only if the cell currently
    /// reads as [`ERASED`]. The written value is not read back.
    pub fn write(&mut self, address: Address, data: u32) -> Result<(), Error<D::Error>> {
        let found = self.device.read(address).map_err(Error::Device)?;
        if found != ERASED {
            defmt::warn!("Refusing to write {=i64:#x}: holds {=u8:#x}", address, found);
            return Err(Error::WriteGuard { address, found });
        }

        let byte = data as u8;
        defmt::debug!("write {=i64:#x} <- {=u8:#x}", address, byte);
        self.device.write(address, byte).map_err(Error::Device)
    }

    /// Raw dump of `start..=end` through the device's own display routine.
    /// Values printed this way are not verified.
    pub fn read_and_print_raw(
        &mut self,
        start: Address,
        end: Address,
    ) -> Result<(), Error<D::Error>> {
        self.device.read_and_print(start, end).map_err(Error::Device)
    }
}
