//! Verified access to noisy NOR flash.
//!
//! A [`DeviceDriver`] wraps any byte-addressable [`FlashMemoryDevice`] and
//! adds two guards on top of it:
//!
//! * reads are only trusted when [`READ_SAMPLES`] consecutive raw reads agree
//! * writes are only issued to cells that currently hold the erased value
//!   [`ERASED`] (`0xFF`)
//!
//! [`Application`] applies those guarded operations across address ranges.
//! [`comms::FlashSpi`] is the production backend for 25-series SPI NOR parts.
#![cfg_attr(not(test), no_std)]

pub mod application;
pub mod comms;
pub mod driver;
pub mod error;
#[cfg(test)]
pub(crate) mod mock;
pub mod traits;

pub use application::{Application, DEFAULT_WRITE_BASE, WRITE_ALL_LEN};
pub use driver::{DeviceDriver, READ_SAMPLES};
pub use error::{Error, SpiError};
pub use traits::{Address, FlashMemoryDevice, HardwareFlashDevice, ERASED};
