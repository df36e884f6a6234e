//! The capability descriptor: 4 bytes of layout metadata inside block 0.

use crate::device::TagDevice;
use crate::layout::{BLOCK_SIZE, DESCRIPTOR_OFFSET};
use crate::transport::Transport;
use crate::Result;

/// The 4-byte capability descriptor at a fixed slot inside block 0.
///
/// An all-zero descriptor is the factory sentinel for "never programmed";
/// [`TagDevice::init`] seeds [`CapabilityDescriptor::DEFAULT`] when it finds
/// one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapabilityDescriptor {
    pub magic: u8,
    pub version: u8,
    /// Memory-length code; usable memory is `mlen * 8` bytes.
    pub mlen: u8,
    pub access: u8,
}

impl CapabilityDescriptor {
    /// Descriptor seeded into a blank device.
    pub const DEFAULT: Self = Self {
        magic: 0xE1,
        version: 0x10,
        mlen: 0x6D,
        access: 0x00,
    };

    pub fn from_bytes(raw: [u8; 4]) -> Self {
        Self {
            magic: raw[0],
            version: raw[1],
            mlen: raw[2],
            access: raw[3],
        }
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.magic, self.version, self.mlen, self.access]
    }

    /// True for the all-zero "never programmed" sentinel.
    pub fn is_blank(self) -> bool {
        self.to_bytes() == [0; 4]
    }

    /// Usable memory size in bytes, as the descriptor advertises it.
    pub fn user_memory_len(self) -> usize {
        usize::from(self.mlen) * 8
    }
}

impl<T: Transport> TagDevice<T> {
    /// Fetch the descriptor from block 0 (bytes 12–15) and cache it on the
    /// handle.
    pub fn read_descriptor(&mut self) -> Result<CapabilityDescriptor> {
        let mut block = [0u8; BLOCK_SIZE];
        self.read_blocks(0, 1, &mut block)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&block[DESCRIPTOR_OFFSET..DESCRIPTOR_OFFSET + 4]);
        let caps = CapabilityDescriptor::from_bytes(raw);
        self.set_cached_descriptor(caps);
        Ok(caps)
    }

    /// Overwrite the descriptor slot, leaving the rest of block 0 (device
    /// address byte, serial, lock bytes) untouched.
    pub fn write_descriptor(&mut self, caps: CapabilityDescriptor) -> Result<()> {
        let mut block = [0u8; BLOCK_SIZE];
        self.read_blocks(0, 1, &mut block)?;
        block[DESCRIPTOR_OFFSET..DESCRIPTOR_OFFSET + 4].copy_from_slice(&caps.to_bytes());
        self.write_blocks(0, &block)?;
        self.set_cached_descriptor(caps);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let caps = CapabilityDescriptor::DEFAULT;
        assert_eq!(caps.to_bytes(), [0xE1, 0x10, 0x6D, 0x00]);
        assert_eq!(CapabilityDescriptor::from_bytes(caps.to_bytes()), caps);
    }

    #[test]
    fn blank_is_all_zero_only() {
        assert!(CapabilityDescriptor::from_bytes([0; 4]).is_blank());
        assert!(!CapabilityDescriptor::from_bytes([0, 0, 0, 1]).is_blank());
    }

    #[test]
    fn advertised_memory_size() {
        assert_eq!(CapabilityDescriptor::DEFAULT.user_memory_len(), 0x6D * 8);
    }
}
