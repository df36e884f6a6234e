//! Fixed memory map of the device and the span arithmetic built on it.

use crate::{Result, TagError};

/// Size of one physical memory block; the unit of every bus transfer.
pub const BLOCK_SIZE: usize = 16;

/// First block address of the SRAM-backed window.
pub const SRAM_BASE: u16 = 0xF8;

/// Length of the SRAM-backed window, in block addresses.
pub const SRAM_LEN: u16 = 64;

/// Block holding the configuration registers.
pub const CONFIG_BLOCK: u16 = 0x3A;

/// Pseudo-address selecting the session register file on the wire.
pub const SESSION_REGS: u8 = 0xFE;

/// Settle time after a block write lands in EEPROM-backed memory.
pub const EEPROM_SETTLE_MS: u32 = 4;

/// Fill byte used by erase.
pub const ERASE_FILL: u8 = 0x00;

/// Byte offset of the capability descriptor within block 0.
pub const DESCRIPTOR_OFFSET: usize = 12;

/// Factory bus address of the device.
pub const DEFAULT_DEV_ADDR: u8 = 0x40;

/// Factory images of the blocks a factory reset restores: block 0 (address
/// byte, blank serial/lock region, default capability descriptor), the two
/// lock blocks, and the configuration block.
pub const FACTORY_BLOCKS: [(u16, [u8; BLOCK_SIZE]); 4] = [
    (
        0x00,
        [
            0xAA, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x00, 0xE1, 0x10, 0x6D, 0x00,
        ],
    ),
    (
        0x38,
        [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF,
        ],
    ),
    (
        0x39,
        [
            0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, //
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ],
    ),
    (
        0x3A,
        [
            0x01, 0x00, 0xF8, 0x48, 0x08, 0x01, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ],
    ),
];

/// Memory zones with distinct write timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemRegion {
    /// General EEPROM-backed memory (everything outside the zones below).
    Eeprom,
    /// The fast-write SRAM window at `[SRAM_BASE, SRAM_BASE + SRAM_LEN)`.
    Sram,
    /// The configuration block (EEPROM-backed, distinct access pattern).
    Config,
}

impl MemRegion {
    pub fn of(block: u16) -> Self {
        if (SRAM_BASE..SRAM_BASE + SRAM_LEN).contains(&block) {
            MemRegion::Sram
        } else if block == CONFIG_BLOCK {
            MemRegion::Config
        } else {
            MemRegion::Eeprom
        }
    }

    /// Settle delay the medium requires after a block write in this region.
    ///
    /// SRAM completes a write in under a millisecond; EEPROM needs 4 ms
    /// before the next transfer or the adjacent write corrupts.
    pub fn write_settle_ms(self) -> Option<u32> {
        match self {
            MemRegion::Sram => None,
            MemRegion::Eeprom | MemRegion::Config => Some(EEPROM_SETTLE_MS),
        }
    }
}

/// A byte request normalized onto whole blocks.
///
/// The incoming offset may exceed one block; whole blocks are folded into the
/// start address so the stored offset is always `< BLOCK_SIZE`. `blocks` is
/// the minimal count covering the request: `ceil((offset + len) / BLOCK_SIZE)`
/// after folding, which is one block more than `len` alone implies whenever
/// the span straddles a block boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    /// First block of the covering run.
    pub start: u16,
    /// Offset of the first requested byte within that run.
    pub offset: usize,
    /// Number of blocks in the run.
    pub blocks: usize,
}

impl Span {
    pub fn new(address: u16, offset: usize, len: usize) -> Result<Self> {
        if len == 0 {
            return Err(TagError::EmptyTransfer);
        }
        let fold = u16::try_from(offset / BLOCK_SIZE).map_err(|_| TagError::AddressOverflow)?;
        let start = address.checked_add(fold).ok_or(TagError::AddressOverflow)?;
        let offset = offset % BLOCK_SIZE;

        let blocks = offset
            .checked_add(len)
            .ok_or(TagError::AddressOverflow)?
            .div_ceil(BLOCK_SIZE);
        let last = u16::try_from(blocks - 1).map_err(|_| TagError::AddressOverflow)?;
        start.checked_add(last).ok_or(TagError::AddressOverflow)?;

        Ok(Self {
            start,
            offset,
            blocks,
        })
    }

    /// Size of the scratch buffer holding the covering run.
    pub fn scratch_len(&self) -> usize {
        self.blocks * BLOCK_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_folds_oversized_offsets() {
        let span = Span::new(4, 100, 1).unwrap();
        assert_eq!(span.start, 10); // 4 + 100/16
        assert_eq!(span.offset, 4); // 100 % 16
        assert_eq!(span.blocks, 1);
    }

    #[test]
    fn span_counts_boundary_straddle() {
        // A whole-block length at a nonzero offset still needs two blocks.
        let span = Span::new(0, 8, 16).unwrap();
        assert_eq!(span.blocks, 2);
    }

    #[test]
    fn span_does_not_overcount_aligned_runs() {
        let span = Span::new(0, 0, 32).unwrap();
        assert_eq!(span.blocks, 2);
    }

    #[test]
    fn span_rejects_empty_requests() {
        assert!(matches!(
            Span::new(0, 0, 0).unwrap_err(),
            TagError::EmptyTransfer
        ));
    }

    #[test]
    fn span_reports_address_overflow() {
        assert!(matches!(
            Span::new(u16::MAX, BLOCK_SIZE, 1).unwrap_err(),
            TagError::AddressOverflow
        ));
        assert!(matches!(
            Span::new(u16::MAX, 0, BLOCK_SIZE + 1).unwrap_err(),
            TagError::AddressOverflow
        ));
    }

    #[test]
    fn sram_window_bounds() {
        assert_eq!(MemRegion::of(SRAM_BASE - 1), MemRegion::Eeprom);
        assert_eq!(MemRegion::of(SRAM_BASE), MemRegion::Sram);
        assert_eq!(MemRegion::of(SRAM_BASE + SRAM_LEN - 1), MemRegion::Sram);
        assert_eq!(MemRegion::of(SRAM_BASE + SRAM_LEN), MemRegion::Eeprom);
    }
}
