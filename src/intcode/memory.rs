//! Address space of a running machine.
//!
//! Memory layout: `[low region][high region]`
//! - **Low region**: a dense copy of the program image, exactly as long as the program.
//! - **High region**: every address at or past the program length. Cells are
//!   allocated on first write as slots in a backing buffer and found through an
//!   address-to-slot map; cells never written read as zero.
//!
//! Slots are never freed or reused during a run.

use crate::intcode::errors::IntcodeError;
use std::collections::{BTreeMap, HashMap};

/// Capacity of the high region's backing buffer on first allocation.
pub const INITIAL_HIGH_CAPACITY: usize = 10;

/// Mutable memory owned by one machine for the length of one run.
#[derive(Clone, Debug)]
pub struct AddressSpace {
    /// Dense program copy.
    low: Vec<i64>,
    /// Address to index into `high`.
    slots: HashMap<usize, usize>,
    /// Backing buffer for high-region cells, in allocation order.
    high: Vec<i64>,
    /// Logical capacity of `high`; grows to `max(10, capacity * 2)` when full.
    high_capacity: usize,
}

impl AddressSpace {
    /// Creates an address space holding a fresh copy of `program`.
    pub fn new(program: &[i64]) -> Self {
        Self {
            low: program.to_vec(),
            slots: HashMap::new(),
            high: Vec::new(),
            high_capacity: 0,
        }
    }

    /// Reads the cell at `address`.
    ///
    /// Returns [`IntcodeError::InvalidAddress`] if `address` is negative.
    pub fn read(&self, address: i64) -> Result<i64, IntcodeError> {
        Ok(self.get(Self::check(address)?))
    }

    /// Writes `value` to the cell at `address`.
    ///
    /// Returns [`IntcodeError::InvalidAddress`] if `address` is negative.
    pub fn write(&mut self, address: i64, value: i64) -> Result<(), IntcodeError> {
        self.set(Self::check(address)?, value);
        Ok(())
    }

    /// Reads the cell at a known non-negative address.
    pub fn get(&self, address: usize) -> i64 {
        if let Some(cell) = self.low.get(address) {
            return *cell;
        }
        self.slots
            .get(&address)
            .map_or(0, |&slot| self.high[slot])
    }

    /// Writes the cell at a known non-negative address.
    pub fn set(&mut self, address: usize, value: i64) {
        if let Some(cell) = self.low.get_mut(address) {
            *cell = value;
            return;
        }

        if let Some(&slot) = self.slots.get(&address) {
            self.high[slot] = value;
            return;
        }

        if self.high.len() == self.high_capacity {
            let grown = INITIAL_HIGH_CAPACITY.max(self.high_capacity * 2);
            self.high.reserve_exact(grown - self.high.len());
            self.high_capacity = grown;
        }
        self.slots.insert(address, self.high.len());
        self.high.push(value);
    }

    /// Length of the low region, i.e. the program length.
    pub fn low_len(&self) -> usize {
        self.low.len()
    }

    /// Number of high-region cells allocated so far.
    pub fn high_len(&self) -> usize {
        self.high.len()
    }

    /// Current logical capacity of the high-region backing buffer.
    pub fn high_capacity(&self) -> usize {
        self.high_capacity
    }

    /// Copies both regions into an immutable snapshot.
    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            low: self.low.clone(),
            high: self
                .slots
                .iter()
                .map(|(&address, &slot)| (address, self.high[slot]))
                .collect(),
        }
    }

    /// Consumes the address space into a snapshot without copying the low region.
    pub fn into_snapshot(self) -> MemorySnapshot {
        let high = self
            .slots
            .iter()
            .map(|(&address, &slot)| (address, self.high[slot]))
            .collect();
        MemorySnapshot {
            low: self.low,
            high,
        }
    }

    fn check(address: i64) -> Result<usize, IntcodeError> {
        usize::try_from(address).map_err(|_| IntcodeError::InvalidAddress { address, ip: 0 })
    }
}

/// Memory contents of a halted machine, in ascending address order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MemorySnapshot {
    low: Vec<i64>,
    high: BTreeMap<usize, i64>,
}

impl MemorySnapshot {
    /// Value at `address`; addresses never touched read as zero.
    pub fn get(&self, address: usize) -> i64 {
        match self.low.get(address) {
            Some(cell) => *cell,
            None => self.high.get(&address).copied().unwrap_or(0),
        }
    }

    /// One past the highest address that holds program data or was written.
    pub fn len(&self) -> usize {
        self.high
            .last_key_value()
            .map_or(self.low.len(), |(&address, _)| address + 1)
    }

    /// Whether the snapshot holds no cells at all: an empty program that never wrote.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The low region, i.e. the final state of the program image.
    pub fn program_region(&self) -> &[i64] {
        &self.low
    }

    /// Iterates `(address, value)` over every low-region cell and every written
    /// high-region cell, in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, i64)> + '_ {
        self.low
            .iter()
            .copied()
            .enumerate()
            .chain(self.high.iter().map(|(&address, &value)| (address, value)))
    }

    /// Flattens both regions into one dense vector, filling gaps with zero.
    ///
    /// Allocates [`len`](Self::len) cells, so a single write to a very large address
    /// makes this enormous. Use [`iter`](Self::iter) or [`get`](Self::get) when the
    /// high region may be sparse.
    pub fn to_vec(&self) -> Vec<i64> {
        let mut flat = self.low.clone();
        flat.resize(self.len(), 0);
        for (&address, &value) in &self.high {
            flat[address] = value;
        }
        flat
    }
}
