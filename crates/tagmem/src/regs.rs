//! Register access: the volatile session file reached through short wire
//! transactions, and the persisted configuration file reached through block
//! read-modify-write.

use crate::device::TagDevice;
use crate::layout::{BLOCK_SIZE, CONFIG_BLOCK, SESSION_REGS};
use crate::transport::Transport;
use crate::{Result, TagError};

/// Number of registers the device implements in each file.
pub const SESSION_REG_COUNT: usize = 8;

/// Session register indices (volatile, live at the session pseudo-address).
pub mod session {
    pub const NC_REG: u8 = 0;
    pub const LAST_NDEF_BLOCK: u8 = 1;
    pub const SRAM_MIRROR_BLOCK: u8 = 2;
    pub const WDT_LS: u8 = 3;
    pub const WDT_MS: u8 = 4;
    pub const I2C_CLOCK_STR: u8 = 5;
    pub const NS_REG: u8 = 6;
}

/// Configuration register indices (persisted, inside the configuration
/// block).
pub mod config {
    pub const NC_REG: u8 = 0;
    pub const LAST_NDEF_BLOCK: u8 = 1;
    pub const SRAM_MIRROR_BLOCK: u8 = 2;
    pub const WDT_LS: u8 = 3;
    pub const WDT_MS: u8 = 4;
    pub const I2C_CLOCK_STR: u8 = 5;
    pub const REG_LOCK: u8 = 6;
}

/// `NS_REG` bit set while an external RF field is coupled to the antenna.
pub const NS_RF_FIELD_PRESENT: u8 = 0x01;

fn check_index(index: u8) -> Result<()> {
    if usize::from(index) >= BLOCK_SIZE {
        return Err(TagError::RegisterOutOfRange {
            index,
            max: BLOCK_SIZE,
        });
    }
    Ok(())
}

impl<T: Transport> TagDevice<T> {
    /// Read one session register: a 2-byte select packet, then a 1-byte
    /// response. Not routed through the block engine.
    pub fn read_session_reg(&mut self, index: u8) -> Result<u8> {
        check_index(index)?;
        self.begin()?;
        let result = self.read_session_reg_inner(index);
        self.finish();
        result
    }

    fn read_session_reg_inner(&mut self, index: u8) -> Result<u8> {
        self.raw_write(&[SESSION_REGS, index])?;
        let mut value = [0u8; 1];
        self.raw_read(&mut value)?;
        Ok(value[0])
    }

    /// Write one session register through the device's masked-write
    /// transaction: a single 4-byte packet, no response payload. The device
    /// merges `value` into the bits selected by `mask`.
    pub fn write_session_reg(&mut self, index: u8, mask: u8, value: u8) -> Result<()> {
        check_index(index)?;
        self.begin()?;
        let result = self.raw_write(&[SESSION_REGS, index, mask, value]);
        self.finish();
        result
    }

    /// Read one configuration register out of the configuration block.
    pub fn read_config_reg(&mut self, index: u8) -> Result<u8> {
        check_index(index)?;
        let mut block = [0u8; BLOCK_SIZE];
        self.read_blocks(CONFIG_BLOCK, 1, &mut block)?;
        Ok(block[usize::from(index)])
    }

    /// Update one configuration register, preserving the bits `mask` keeps:
    /// `new = (old & mask) | value`. The whole block is read, patched, and
    /// written back.
    pub fn write_config_reg(&mut self, index: u8, mask: u8, value: u8) -> Result<()> {
        check_index(index)?;
        let mut block = [0u8; BLOCK_SIZE];
        self.read_blocks(CONFIG_BLOCK, 1, &mut block)?;
        let at = usize::from(index);
        block[at] = (block[at] & mask) | value;
        self.write_blocks(CONFIG_BLOCK, &block)
    }
}
