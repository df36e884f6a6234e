//! The device handle, the block transfer engine, and device-level operations.

use tracing::{debug, info, warn};

use crate::caps::CapabilityDescriptor;
use crate::layout::{MemRegion, BLOCK_SIZE, DEFAULT_DEV_ADDR, FACTORY_BLOCKS};
use crate::regs::{self, NS_RF_FIELD_PRESENT};
use crate::transport::Transport;
use crate::{Result, TagError};

/// Lifecycle of a [`TagDevice`] handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceState {
    /// Constructed, not yet probed.
    Uninitialized,
    /// Probed and idle; operations may start.
    Ready,
    /// An operation's transfers are in flight.
    Busy,
    /// The liveness probe failed; re-run [`TagDevice::init`] to recover.
    Error,
}

/// Handle to one tag on the bus.
///
/// Owns the transport and the device's bus address. Every operation takes
/// `&mut self` and returns only after its transfers and any mandated settle
/// delays complete. The [`DeviceState::Busy`] guard rejects re-entrant calls
/// on the same handle; it is not a cross-thread lock, so a shared handle
/// still needs external serialization.
pub struct TagDevice<T> {
    transport: T,
    addr: u8,
    password: Option<[u8; 16]>,
    descriptor: Option<CapabilityDescriptor>,
    state: DeviceState,
}

impl<T: Transport> TagDevice<T> {
    /// Handle at the factory bus address.
    pub fn new(transport: T) -> Self {
        Self::with_address(transport, DEFAULT_DEV_ADDR)
    }

    pub fn with_address(transport: T, addr: u8) -> Self {
        Self {
            transport,
            addr,
            password: None,
            descriptor: None,
            state: DeviceState::Uninitialized,
        }
    }

    /// Attach the password used for memory-protection sessions. Stored on the
    /// handle for the caller; this layer does not interpret it.
    pub fn with_password(mut self, password: [u8; 16]) -> Self {
        self.password = Some(password);
        self
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn bus_address(&self) -> u8 {
        self.addr
    }

    pub fn password(&self) -> Option<&[u8; 16]> {
        self.password.as_ref()
    }

    /// Last capability descriptor read from or written to the device, if any.
    pub fn descriptor(&self) -> Option<CapabilityDescriptor> {
        self.descriptor
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Liveness probe: a block-0 read. Any bus failure is reported as the
    /// device not responding and parks the handle in [`DeviceState::Error`].
    pub fn check(&mut self) -> Result<()> {
        let mut block = [0u8; BLOCK_SIZE];
        match self.read_blocks(0, 1, &mut block) {
            Ok(()) => Ok(()),
            Err(TagError::Busy) => Err(TagError::Busy),
            Err(error) => {
                warn!(addr = self.addr, %error, "liveness probe failed");
                self.state = DeviceState::Error;
                Err(TagError::NotResponding)
            }
        }
    }

    /// Bring the device up: liveness check, then read the capability
    /// descriptor and seed the factory default if the slot has never been
    /// programmed. Re-initializing an already-seeded device writes nothing.
    pub fn init(&mut self) -> Result<()> {
        self.check()?;

        let caps = self.read_descriptor()?;
        if caps.is_blank() {
            info!(addr = self.addr, "capability descriptor blank, seeding default");
            self.write_descriptor(CapabilityDescriptor::DEFAULT)?;
        }

        self.state = DeviceState::Ready;
        debug!(addr = self.addr, "device initialized");
        Ok(())
    }

    /// Release the handle's session. No hardware side effect.
    pub fn deinit(&mut self) -> Result<()> {
        if self.state == DeviceState::Busy {
            return Err(TagError::Busy);
        }
        self.state = DeviceState::Uninitialized;
        debug!(addr = self.addr, "device deinitialized");
        Ok(())
    }

    /// True while an external RF field is coupled to the antenna.
    pub fn field_present(&mut self) -> Result<bool> {
        let ns = self.read_session_reg(regs::session::NS_REG)?;
        Ok(ns & NS_RF_FIELD_PRESENT != 0)
    }

    /// Program a new bus address into byte 0 of block 0. The device answers
    /// at the new address from its next power cycle; the handle keeps using
    /// the address it was constructed with.
    pub fn write_device_address(&mut self, new_addr: u8) -> Result<()> {
        let mut block = [0u8; BLOCK_SIZE];
        self.read_blocks(0, 1, &mut block)?;
        block[0] = new_addr;
        self.write_blocks(0, &block)
    }

    /// Restore the factory images of block 0, the lock blocks, and the
    /// configuration block. User memory outside those blocks is untouched.
    pub fn factory_reset(&mut self) -> Result<()> {
        for (block, image) in FACTORY_BLOCKS {
            self.write_blocks(block, &image)?;
        }
        self.descriptor = Some(CapabilityDescriptor::DEFAULT);
        debug!(addr = self.addr, "factory block images restored");
        Ok(())
    }

    /// Read `count` blocks starting at `address` into `buf`.
    ///
    /// The bus has no burst mode: blocks transfer one at a time, the address
    /// incrementing per block. `buf` must hold `count * BLOCK_SIZE` bytes.
    pub(crate) fn read_blocks(&mut self, address: u16, count: usize, buf: &mut [u8]) -> Result<()> {
        debug_assert_eq!(buf.len(), count * BLOCK_SIZE);
        if count == 0 {
            return Err(TagError::EmptyTransfer);
        }
        self.begin()?;
        let result = self.read_blocks_inner(address, buf);
        self.finish();
        result
    }

    fn read_blocks_inner(&mut self, address: u16, buf: &mut [u8]) -> Result<()> {
        for (i, block_buf) in buf.chunks_exact_mut(BLOCK_SIZE).enumerate() {
            let block = address
                .checked_add(i as u16)
                .ok_or(TagError::AddressOverflow)?;
            self.transport.write(self.addr, &[block as u8])?;
            self.transport.read(self.addr, block_buf)?;
        }
        Ok(())
    }

    /// Write whole blocks starting at `address`; `data` must be a multiple of
    /// `BLOCK_SIZE`. The first failed transfer aborts the loop; blocks
    /// already written stay written.
    pub(crate) fn write_blocks(&mut self, address: u16, data: &[u8]) -> Result<()> {
        debug_assert_eq!(data.len() % BLOCK_SIZE, 0);
        if data.is_empty() {
            return Err(TagError::EmptyTransfer);
        }
        self.begin()?;
        let result = self.write_blocks_inner(address, data);
        self.finish();
        result
    }

    fn write_blocks_inner(&mut self, address: u16, data: &[u8]) -> Result<()> {
        let mut packet = [0u8; 1 + BLOCK_SIZE];
        for (i, block_data) in data.chunks_exact(BLOCK_SIZE).enumerate() {
            let block = address
                .checked_add(i as u16)
                .ok_or(TagError::AddressOverflow)?;
            packet[0] = block as u8;
            packet[1..].copy_from_slice(block_data);
            self.transport.write(self.addr, &packet)?;

            // The medium needs settle time after an EEPROM write before the
            // next transfer can start; SRAM finishes in under a millisecond.
            if let Some(ms) = MemRegion::of(block).write_settle_ms() {
                self.transport.delay_ms(ms);
            }
        }
        Ok(())
    }

    pub(crate) fn begin(&mut self) -> Result<()> {
        if self.state == DeviceState::Busy {
            return Err(TagError::Busy);
        }
        self.state = DeviceState::Busy;
        Ok(())
    }

    pub(crate) fn finish(&mut self) {
        self.state = DeviceState::Ready;
    }

    pub(crate) fn raw_write(&mut self, bytes: &[u8]) -> Result<()> {
        self.transport.write(self.addr, bytes)
    }

    pub(crate) fn raw_read(&mut self, buf: &mut [u8]) -> Result<()> {
        self.transport.read(self.addr, buf)
    }

    pub(crate) fn set_cached_descriptor(&mut self, caps: CapabilityDescriptor) {
        self.descriptor = Some(caps);
    }
}
