//! SPI backend for 25-series NOR flash (W25Q128JV and compatibles).
//!
//! Refer to datasheet:
//! https://datasheet.lcsc.com/lcsc/1912111437_Winbond-Elec-W25Q128JVSIQ_C113767.pdf
use core::fmt::Debug;

use embedded_hal::spi::{Operation, SpiDevice};

use crate::error::SpiError;
use crate::traits::{Address, FlashMemoryDevice, HardwareFlashDevice};

/// Highest address reachable with the part's 24-bit addressing.
pub const MAX_ADDRESS: Address = 0xFF_FFFF;

pub struct FlashSpi<SPI> {
    spi: SPI,
}

impl<SPI> Debug for FlashSpi<SPI> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FlashSpi").finish()
    }
}

#[repr(u8)]
enum Opcode {
    /// Set the write enable latch.
    WriteEnable = 0x06,
    /// Read the 8-bit status register.
    ReadStatus = 0x05,
    Read = 0x03,
    PageProg = 0x02,
    SectorErase = 0x20,
    ChipErase = 0xC7,
}

defmt::bitflags! {
    /// Status register bits.
    pub struct Status: u8 {
        /// Erase or write in progress.
        const BUSY = 1 << 0;
        /// Status of the **W**rite **E**nable **L**atch.
        const WEL = 1 << 1;
        /// The 3 protection region bits.
        const PROT = 0b00011100;
        /// **S**tatus **R**egister **W**rite **D**isable bit.
        const SRWD = 1 << 7;
    }
}

/// Opcode followed by the 24-bit big-endian address.
fn addressed(opcode: Opcode, addr: u32) -> [u8; 4] {
    [opcode as u8, (addr >> 16) as u8, (addr >> 8) as u8, addr as u8]
}

fn device_address<SPI: SpiDevice>(address: Address) -> Result<u32, SpiError<SPI>> {
    if (0..=MAX_ADDRESS).contains(&address) {
        Ok(address as u32)
    } else {
        Err(SpiError::AddressOutOfRange(address))
    }
}

impl<SPI> HardwareFlashDevice for FlashSpi<SPI>
where
    SPI: SpiDevice,
{
    type Error = SpiError<SPI>;

    /// Read Data (03h), datasheet 8.2.6.
    ///
    /// Only 24 bits of `addr` reach the part; smaller parts mirror their
    /// contents at multiples of their size.
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), SpiError<SPI>> {
        self.wait_done()?;
        self.spi
            .transaction(&mut [
                Operation::Write(&addressed(Opcode::Read, addr)),
                Operation::Read(buf),
            ])
            .map_err(SpiError::Spi)
    }

    /// Sector Erase (20h), datasheet 8.2.15. `addr` should be the start of a
    /// 4K sector.
    fn sector_erase(&mut self, addr: u32) -> Result<(), SpiError<SPI>> {
        self.wait_done()?;
        self.write_enable()?;
        self.command(&addressed(Opcode::SectorErase, addr))
    }

    /// Page Program (02h), datasheet 8.2.13. Up to 256 bytes, which must not
    /// cross a page boundary.
    fn page_program(&mut self, addr: u32, data: &[u8]) -> Result<(), SpiError<SPI>> {
        self.wait_done()?;
        self.write_enable()?;
        if !self.is_wel()? {
            defmt::warn!("WEL should be set: {:?}", self.read_status()?);
        }

        self.spi
            .transaction(&mut [
                Operation::Write(&addressed(Opcode::PageProg, addr)),
                Operation::Write(data),
            ])
            .map_err(SpiError::Spi)
    }

    /// Chip Erase (C7h), datasheet 8.2.18.
    fn chip_erase(&mut self) -> Result<(), SpiError<SPI>> {
        self.wait_done()?;
        self.write_enable()?;
        self.command(&[Opcode::ChipErase as u8])
    }
}

impl<SPI> FlashMemoryDevice for FlashSpi<SPI>
where
    SPI: SpiDevice,
{
    type Error = SpiError<SPI>;

    fn read(&mut self, address: Address) -> Result<u8, SpiError<SPI>> {
        let addr = device_address::<SPI>(address)?;
        let mut byte = [0u8; 1];
        HardwareFlashDevice::read(self, addr, &mut byte)?;
        Ok(byte[0])
    }

    fn write(&mut self, address: Address, data: u8) -> Result<(), SpiError<SPI>> {
        let addr = device_address::<SPI>(address)?;
        self.page_program(addr, &[data])
    }
}

impl<SPI> FlashSpi<SPI>
where
    SPI: SpiDevice,
{
    /// Takes ownership of the bus and waits until the part is idle.
    pub fn init(spi: SPI) -> Result<Self, SpiError<SPI>> {
        let mut this = Self { spi };
        let status = loop {
            let status = this.read_status()?;
            if (status & (Status::BUSY | Status::WEL)).is_empty() {
                break status;
            }
            defmt::warn!("Flash is not ready: {:?}", status);
        };
        defmt::debug!("Initial status: {:?}", status);
        Ok(this)
    }

    /// Hands the bus back.
    pub fn release(self) -> SPI {
        self.spi
    }

    pub fn is_busy(&mut self) -> Result<bool, SpiError<SPI>> {
        Ok(self.read_status()?.contains(Status::BUSY))
    }

    pub fn is_wel(&mut self) -> Result<bool, SpiError<SPI>> {
        Ok(self.read_status()?.contains(Status::WEL))
    }

    /// Reads the status register.
    pub fn read_status(&mut self) -> Result<Status, SpiError<SPI>> {
        let mut response = [0u8; 2];
        self.spi
            .transaction(&mut [
                Operation::Write(&[Opcode::ReadStatus as u8]),
                Operation::Read(&mut response),
            ])
            .map_err(SpiError::Spi)?;

        Ok(Status::from_bits_truncate(response[1]))
    }

    fn command(&mut self, bytes: &[u8]) -> Result<(), SpiError<SPI>> {
        self.spi
            .transaction(&mut [Operation::Write(bytes)])
            .map_err(SpiError::Spi)
    }

    /// Block until the status of the device is not busy
    fn wait_done(&mut self) -> Result<(), SpiError<SPI>> {
        while self.is_busy()? {}
        Ok(())
    }

    /// Write Enable (06h), datasheet 8.2.1. Must precede every program and
    /// erase instruction.
    fn write_enable(&mut self) -> Result<(), SpiError<SPI>> {
        self.command(&[Opcode::WriteEnable as u8])
    }
}
