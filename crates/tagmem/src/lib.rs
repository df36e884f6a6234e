//! Host-side access layer for an I2C NFC tag EEPROM.
//!
//! The tag only understands whole 16-byte block transfers addressed by block
//! index, while callers want byte-addressed reads, writes, and erases plus
//! single-byte access to the device's register files. This crate provides:
//!
//! - [`Transport`]: the bus contract a platform supplies (transmit, receive,
//!   millisecond delay)
//! - [`TagDevice`]: the device handle, carrying the block transfer engine,
//!   byte-span translation, capability descriptor and register access, and
//!   the init/check lifecycle
//! - [`CapabilityDescriptor`]: the 4-byte descriptor kept inside block 0
//! - [`MemTransport`]: an in-memory model of the wire protocol, used by the
//!   test suites and by `tagmem-dump`
//!
//! Real bus HALs live with the caller: implement [`Transport`] over your
//! platform's I2C primitives and hand it to [`TagDevice::new`]. Everything is
//! synchronous and blocking; a handle shared across threads needs external
//! serialization.

mod caps;
mod device;
mod error;
pub mod layout;
mod mem;
pub mod regs;
mod transport;

pub use caps::CapabilityDescriptor;
pub use device::{DeviceState, TagDevice};
pub use error::{Result, TagError};
pub use layout::{MemRegion, Span, BLOCK_SIZE};
pub use transport::{MemTransport, Transport, TransportStats};

#[cfg(test)]
mod proptests;
