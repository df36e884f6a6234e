//! The bus contract and an in-memory implementation of it.

use crate::layout::{BLOCK_SIZE, FACTORY_BLOCKS, SESSION_REGS};
use crate::regs::SESSION_REG_COUNT;
use crate::{Result, TagError};

/// Bus contract supplied by the platform.
///
/// The core frames every request itself (one address byte at the head of
/// each packet, payload after it), so implementations only move bytes between
/// the host and the device at `addr`. All three calls block until the
/// transfer (or wait) completes; a transport with bounded waits reports
/// exceedance as an ordinary [`TagError::Bus`] failure.
pub trait Transport {
    /// Transmit `bytes` to the device at bus address `addr`.
    fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<()>;

    /// Receive exactly `buf.len()` bytes from the device at `addr`.
    fn read(&mut self, addr: u8, buf: &mut [u8]) -> Result<()>;

    /// Block for `period` milliseconds.
    fn delay_ms(&mut self, period: u32);
}

/// Transfer counters kept by [`MemTransport`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Total `write` calls, including the address-select half of reads.
    pub writes: u64,
    /// Total `read` calls.
    pub reads: u64,
    /// `write` calls that carried a full block payload.
    pub block_writes: u64,
    /// Number of `delay_ms` calls.
    pub delays: u64,
    /// Sum of all requested delays, in milliseconds.
    pub delay_ms_total: u64,
}

enum Pending {
    Block(u8),
    Session(u8),
}

/// In-memory model of the tag's wire protocol.
///
/// Understands the four packet shapes the core emits (block select, block
/// write, session register select, session register masked write) over 256
/// blocks of backing memory and the session register file. It counts
/// transfers and can fail a chosen write call, which is what the behavioural
/// tests lean on; `tagmem-dump` uses it as the backend for raw memory images.
/// It is a protocol model, not a timing-accurate device model: `delay_ms` is
/// recorded, never slept.
pub struct MemTransport {
    mem: Vec<u8>,
    session: [u8; SESSION_REG_COUNT],
    pending: Option<Pending>,
    stats: TransportStats,
    fail_write_at: Option<u64>,
}

impl MemTransport {
    /// Number of block addresses the model backs (the 8-bit wire range).
    pub const BLOCKS: usize = 256;

    /// A blank device: every block and session register reads zero.
    pub fn new() -> Self {
        Self {
            mem: vec![0; Self::BLOCKS * BLOCK_SIZE],
            session: [0; SESSION_REG_COUNT],
            pending: None,
            stats: TransportStats::default(),
            fail_write_at: None,
        }
    }

    /// A device carrying the factory block images (programmed descriptor,
    /// default bus address, default configuration).
    pub fn factory_fresh() -> Self {
        let mut t = Self::new();
        for (block, image) in FACTORY_BLOCKS {
            let start = usize::from(block) * BLOCK_SIZE;
            t.mem[start..start + BLOCK_SIZE].copy_from_slice(&image);
        }
        t
    }

    /// A device whose memory starts with `image` (remaining blocks zero).
    /// Bytes past the backed range are ignored.
    pub fn from_image(image: &[u8]) -> Self {
        let mut t = Self::new();
        let len = image.len().min(t.mem.len());
        t.mem[..len].copy_from_slice(&image[..len]);
        t
    }

    pub fn stats(&self) -> TransportStats {
        self.stats
    }

    /// Full backing memory, one 16-byte block per block address.
    pub fn memory(&self) -> &[u8] {
        &self.mem
    }

    /// One block of backing memory (by wire address).
    pub fn block(&self, block: u8) -> &[u8] {
        let start = usize::from(block) * BLOCK_SIZE;
        &self.mem[start..start + BLOCK_SIZE]
    }

    pub fn session_reg(&self, index: usize) -> u8 {
        self.session[index]
    }

    pub fn set_session_reg(&mut self, index: usize, value: u8) {
        self.session[index] = value;
    }

    /// Fail the `n`-th `write` call (1-based) with a bus error.
    pub fn fail_write_at(&mut self, n: u64) {
        self.fail_write_at = Some(n);
    }
}

impl Default for MemTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemTransport {
    fn write(&mut self, _addr: u8, bytes: &[u8]) -> Result<()> {
        self.stats.writes += 1;
        if self.fail_write_at == Some(self.stats.writes) {
            return Err(TagError::Bus("injected write failure".into()));
        }

        match bytes {
            [block] => {
                self.pending = Some(Pending::Block(*block));
            }
            [SESSION_REGS, index] => {
                self.pending = Some(Pending::Session(*index));
            }
            [SESSION_REGS, index, mask, value] => {
                if let Some(reg) = self.session.get_mut(usize::from(*index)) {
                    *reg = (*reg & mask) | value;
                }
            }
            [block, payload @ ..] if payload.len() == BLOCK_SIZE => {
                self.stats.block_writes += 1;
                let start = usize::from(*block) * BLOCK_SIZE;
                self.mem[start..start + BLOCK_SIZE].copy_from_slice(payload);
            }
            _ => return Err(TagError::Bus(format!("unrecognized packet ({} bytes)", bytes.len()))),
        }
        Ok(())
    }

    fn read(&mut self, _addr: u8, buf: &mut [u8]) -> Result<()> {
        self.stats.reads += 1;
        match self.pending.take() {
            Some(Pending::Block(block)) => {
                let start = usize::from(block) * BLOCK_SIZE;
                let end = start + buf.len();
                if end > self.mem.len() {
                    return Err(TagError::Bus("read past end of memory".into()));
                }
                buf.copy_from_slice(&self.mem[start..end]);
                Ok(())
            }
            Some(Pending::Session(index)) => {
                // Registers past the implemented file read as zero.
                buf[0] = self.session.get(usize::from(index)).copied().unwrap_or(0);
                Ok(())
            }
            None => Err(TagError::Bus("read with no pending request".into())),
        }
    }

    fn delay_ms(&mut self, period: u32) {
        self.stats.delays += 1;
        self.stats.delay_ms_total += u64::from(period);
    }
}
