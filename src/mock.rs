//! In-memory stand-in for a noisy flash part.

use std::collections::{HashMap, VecDeque};

use core::convert::Infallible;

use crate::traits::{Address, FlashMemoryDevice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Read(Address),
    Write(Address, u8),
}

/// Serves raw reads from a per-address script, falling back to a fixed value
/// once the script runs dry. Every call is recorded in order.
#[derive(Debug, Default)]
pub struct MockFlash {
    scripts: HashMap<Address, VecDeque<u8>>,
    fallback: u8,
    pub calls: Vec<Call>,
}

impl MockFlash {
    /// Every raw read returns `value`.
    pub fn steady(value: u8) -> Self {
        Self {
            fallback: value,
            ..Self::default()
        }
    }

    /// Queues the values returned by the next raw reads at `address`.
    pub fn script(mut self, address: Address, values: &[u8]) -> Self {
        self.scripts
            .entry(address)
            .or_default()
            .extend(values.iter().copied());
        self
    }

    pub fn reads(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Read(_)))
            .count()
    }

    pub fn writes(&self) -> Vec<(Address, u8)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                Call::Write(address, data) => Some((address, data)),
                Call::Read(_) => None,
            })
            .collect()
    }
}

impl FlashMemoryDevice for MockFlash {
    type Error = Infallible;

    fn read(&mut self, address: Address) -> Result<u8, Infallible> {
        self.calls.push(Call::Read(address));
        let scripted = self.scripts.get_mut(&address).and_then(VecDeque::pop_front);
        Ok(scripted.unwrap_or(self.fallback))
    }

    fn write(&mut self, address: Address, data: u8) -> Result<(), Infallible> {
        self.calls.push(Call::Write(address, data));
        Ok(())
    }
}

/// A device whose bus fails on every access.
#[derive(Debug, Default)]
pub struct DeadFlash {
    pub attempts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

impl FlashMemoryDevice for DeadFlash {
    type Error = BusFault;

    fn read(&mut self, _address: Address) -> Result<u8, BusFault> {
        self.attempts += 1;
        Err(BusFault)
    }

    fn write(&mut self, _address: Address, _data: u8) -> Result<(), BusFault> {
        self.attempts += 1;
        Err(BusFault)
    }
}
