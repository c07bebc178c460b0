use core::fmt::Write;

use crate::driver::DeviceDriver;
use crate::error::Error;
use crate::traits::{Address, FlashMemoryDevice};

/// Number of cells programmed by [`Application::write_all`].
pub const WRITE_ALL_LEN: usize = 5;

/// First address programmed by [`Application::write_all`] unless overridden
/// with [`Application::with_write_base`].
pub const DEFAULT_WRITE_BASE: Address = 0x00;

/// Runs verified reads and guarded writes over whole address ranges.
///
/// Every range operation is fail-fast: the first error aborts it and is
/// returned unchanged. Output already written to the sink is not retracted.
pub struct Application<'a, 'd, D: FlashMemoryDevice + ?Sized, W> {
    driver: &'a mut DeviceDriver<'d, D>,
    out: W,
    write_base: Address,
}

impl<'a, 'd, D, W> Application<'a, 'd, D, W>
where
    D: FlashMemoryDevice + ?Sized,
    W: Write,
{
    pub fn new(driver: &'a mut DeviceDriver<'d, D>, out: W) -> Self {
        Self {
            driver,
            out,
            write_base: DEFAULT_WRITE_BASE,
        }
    }

    /// Moves the block programmed by [`write_all`](Self::write_all) to start at `base`.
    pub fn with_write_base(mut self, base: Address) -> Self {
        self.write_base = base;
        self
    }

    /// Addresses targeted by [`write_all`](Self::write_all), in write order.
    ///
    /// Stops early if the block would run past [`Address::MAX`].
    pub fn write_targets(&self) -> impl Iterator<Item = Address> {
        let base = self.write_base;
        (0..WRITE_ALL_LEN as Address).map_while(move |offset| base.checked_add(offset))
    }

    /// Verified read of every address in `start..=end`, in ascending order,
    /// printing one `0x<address> : 0x<value>` line per address.
    ///
    /// An empty range (`start > end`) touches nothing.
    pub fn read_and_print(
        &mut self,
        start: Address,
        end: Address,
    ) -> Result<(), Error<D::Error>> {
        defmt::debug!("read_and_print {=i64:#x}..={=i64:#x}", start, end);
        for address in start..=end {
            let value = self.driver.read(address)?;
            writeln!(self.out, "0x{:X} : 0x{:02X}", address, value)?;
        }
        Ok(())
    }

    /// Guarded write of `data` to each of the [`WRITE_ALL_LEN`] cells
    /// starting at the write base.
    ///
    /// A block that does not fit below [`Address::MAX`] is rejected before
    /// any cell is touched.
    pub fn write_all(&mut self, data: u32) -> Result<(), Error<D::Error>> {
        let base = self.write_base;
        defmt::debug!("write_all {=u32:#x} from {=i64:#x}", data, base);
        if base.checked_add(WRITE_ALL_LEN as Address - 1).is_none() {
            return Err(Error::AddressOverflow {
                base,
                len: WRITE_ALL_LEN,
            });
        }
        for address in self.write_targets() {
            self.driver.write(address, data)?;
        }
        Ok(())
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }
}
