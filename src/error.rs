use core::fmt::{self, Debug, Display};
use defmt::{Format, Formatter};
use embedded_hal::spi::{Error as _, SpiDevice};

use crate::traits::Address;

/// The error type returned by the driver and the application layer.
///
/// `E` is the error type of the underlying
/// [`FlashMemoryDevice`](crate::FlashMemoryDevice).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<E> {
    /// Repeated raw reads at one address returned different values.
    ReadInstability {
        address: Address,
        /// Value returned by the first raw read.
        expected: u8,
        /// Value returned by the raw read that diverged.
        observed: u8,
        /// 1-based index of the diverging raw read.
        sample: u8,
    },
    /// The target cell was not erased, so the write was not attempted.
    WriteGuard { address: Address, found: u8 },
    /// The block starting at `base` runs past the end of the address space.
    AddressOverflow { base: Address, len: usize },
    /// The device itself failed.
    Device(E),
    /// The display sink rejected output.
    Output,
}

impl<E> From<fmt::Error> for Error<E> {
    fn from(_: fmt::Error) -> Self {
        Error::Output
    }
}

impl<E: Debug> Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ReadInstability {
                address,
                expected,
                observed,
                sample,
            } => write!(
                f,
                "unstable read at {address:#x}: read {sample} returned {observed:#04x}, expected {expected:#04x}"
            ),
            Error::WriteGuard { address, found } => write!(
                f,
                "cannot write {address:#x}: cell holds {found:#04x}, not erased"
            ),
            Error::AddressOverflow { base, len } => write!(
                f,
                "block of {len} cells at {base:#x} overflows the address space"
            ),
            Error::Device(e) => write!(f, "device error: {e:?}"),
            Error::Output => write!(f, "display sink rejected output"),
        }
    }
}

impl<E: Format> Format for Error<E> {
    fn format(&self, fmt: Formatter) {
        match self {
            Error::ReadInstability {
                address,
                expected,
                observed,
                sample,
            } => defmt::write!(
                fmt,
                "Error::ReadInstability {{ address: {=i64:#x}, expected: {=u8:#x}, observed: {=u8:#x}, sample: {=u8} }}",
                address,
                expected,
                observed,
                sample
            ),
            Error::WriteGuard { address, found } => defmt::write!(
                fmt,
                "Error::WriteGuard {{ address: {=i64:#x}, found: {=u8:#x} }}",
                address,
                found
            ),
            Error::AddressOverflow { base, len } => defmt::write!(
                fmt,
                "Error::AddressOverflow {{ base: {=i64:#x}, len: {=usize} }}",
                base,
                len
            ),
            Error::Device(e) => defmt::write!(fmt, "Error::Device({})", e),
            Error::Output => defmt::write!(fmt, "Error::Output"),
        }
    }
}

/// Errors raised by [`FlashSpi`](crate::comms::FlashSpi).
pub enum SpiError<SPI: SpiDevice> {
    /// An SPI transfer failed.
    Spi(SPI::Error),
    /// The address does not fit the 24-bit address space of the part.
    AddressOutOfRange(Address),
}

impl<SPI: SpiDevice> Format for SpiError<SPI> {
    fn format(&self, fmt: Formatter) {
        match self {
            SpiError::Spi(spi) => defmt::write!(fmt, "SpiError::Spi({})", spi.kind()),
            SpiError::AddressOutOfRange(address) => {
                defmt::write!(fmt, "SpiError::AddressOutOfRange({=i64:#x})", address)
            }
        }
    }
}

impl<SPI: SpiDevice> Debug for SpiError<SPI>
where
    SPI::Error: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpiError::Spi(spi) => write!(f, "SpiError::Spi({:?})", spi),
            SpiError::AddressOutOfRange(address) => {
                write!(f, "SpiError::AddressOutOfRange({:#x})", address)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[test]
    fn display_names_the_failing_address() {
        let err: Error<Infallible> = Error::WriteGuard {
            address: 0xAA,
            found: 0x56,
        };
        assert_eq!(
            err.to_string(),
            "cannot write 0xaa: cell holds 0x56, not erased"
        );

        let err: Error<Infallible> = Error::ReadInstability {
            address: 0x200,
            expected: 0xAB,
            observed: 0xCD,
            sample: 4,
        };
        assert_eq!(
            err.to_string(),
            "unstable read at 0x200: read 4 returned 0xcd, expected 0xab"
        );
    }

    #[test]
    fn display_reports_overflowing_block() {
        let err: Error<Infallible> = Error::AddressOverflow {
            base: i64::MAX - 2,
            len: 5,
        };
        assert_eq!(
            err.to_string(),
            "block of 5 cells at 0x7ffffffffffffffd overflows the address space"
        );
    }

    fn assert_format<T: Format>() {}

    #[test]
    fn device_errors_with_format_are_formattable() {
        struct Fault;
        impl Format for Fault {
            fn format(&self, fmt: Formatter) {
                defmt::write!(fmt, "Fault")
            }
        }
        assert_format::<Error<Fault>>();
    }

    #[test]
    fn fmt_error_maps_to_output() {
        let err: Error<Infallible> = fmt::Error.into();
        assert_eq!(err, Error::Output);
    }
}
