/// Byte offset into a device's address space.
///
/// Whether an address is valid is up to the device, not the driver.
pub type Address = i64;

/// Value of a flash cell in the erased state (all ones).
pub const ERASED: u8 = 0xFF;

/// Byte-level access to a flash memory device.
///
/// Individual raw reads may be noisy. Implementations return immediately and
/// never retry; [`DeviceDriver`](crate::DeviceDriver) is what defends
/// against inconsistent values.
pub trait FlashMemoryDevice {
    type Error;

    /// Reads the raw byte stored at `address`.
    fn read(&mut self, address: Address) -> Result<u8, Self::Error>;

    /// Programs `data` at `address`.
    fn write(&mut self, address: Address, data: u8) -> Result<(), Self::Error>;

    /// Dumps the raw contents of `start..=end` to the log.
    ///
    /// No verification is done here, each address is read exactly once.
    fn read_and_print(&mut self, start: Address, end: Address) -> Result<(), Self::Error> {
        for address in start..=end {
            let value = self.read(address)?;
            defmt::info!("{=i64:#x} : {=u8:#x}", address, value);
        }
        Ok(())
    }
}

/// Page-level interface of a 25-series NOR flash part.
pub trait HardwareFlashDevice {
    type Error;

    /// Reads flash contents into `buf`, starting at `addr`.
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Sets every byte of the sector containing `addr` to the erased state (FFh).
    fn sector_erase(&mut self, addr: u32) -> Result<(), Self::Error>;

    /// Programs up to one page of `data` at previously erased (FFh) locations.
    fn page_program(&mut self, addr: u32, data: &[u8]) -> Result<(), Self::Error>;

    /// Sets the whole device to the erased state (FFh).
    fn chip_erase(&mut self) -> Result<(), Self::Error>;
}
