//! Byte-span translation: arbitrary (address, offset, length) requests mapped
//! onto whole-block transfers.

use crate::device::TagDevice;
use crate::layout::{Span, ERASE_FILL};
use crate::transport::Transport;
use crate::Result;

impl<T: Transport> TagDevice<T> {
    /// Read `out.len()` bytes starting `offset` bytes into block `address`.
    ///
    /// The offset may exceed one block; whole blocks fold into the address.
    pub fn read_bytes(&mut self, address: u16, offset: usize, out: &mut [u8]) -> Result<()> {
        let span = Span::new(address, offset, out.len())?;
        let mut scratch = vec![0u8; span.scratch_len()];
        self.read_blocks(span.start, span.blocks, &mut scratch)?;
        out.copy_from_slice(&scratch[span.offset..span.offset + out.len()]);
        Ok(())
    }

    /// Write `data` starting `offset` bytes into block `address`.
    ///
    /// The bus has no sub-block write primitive, so the covering blocks are
    /// read back first and rewritten in full after the merge; a single-byte
    /// write still costs one block each way.
    pub fn write_bytes(&mut self, address: u16, offset: usize, data: &[u8]) -> Result<()> {
        self.splice_bytes(address, offset, data.len(), |scratch, at| {
            scratch[at..at + data.len()].copy_from_slice(data);
        })
    }

    /// Fill `len` bytes starting `offset` bytes into block `address` with the
    /// erase value.
    pub fn erase_bytes(&mut self, address: u16, offset: usize, len: usize) -> Result<()> {
        self.splice_bytes(address, offset, len, |scratch, at| {
            scratch[at..at + len].fill(ERASE_FILL);
        })
    }

    fn splice_bytes(
        &mut self,
        address: u16,
        offset: usize,
        len: usize,
        merge: impl FnOnce(&mut [u8], usize),
    ) -> Result<()> {
        let span = Span::new(address, offset, len)?;
        let mut scratch = vec![0u8; span.scratch_len()];
        self.read_blocks(span.start, span.blocks, &mut scratch)?;
        merge(&mut scratch, span.offset);
        self.write_blocks(span.start, &scratch)
    }
}
