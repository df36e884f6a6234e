use thiserror::Error;

pub type Result<T> = std::result::Result<T, TagError>;

/// Unified error type for tag memory operations.
///
/// Transport implementations return this type directly. [`TagError::Bus`]
/// intentionally stores a human-readable `String` rather than a
/// platform-specific error type so arbitrary host HALs can surface their own
/// failure text without forcing a generic error parameter through the whole
/// API.
#[derive(Debug, Error)]
pub enum TagError {
    /// A read, write, or erase asked for zero bytes.
    #[error("empty transfer (length must be non-zero)")]
    EmptyTransfer,

    /// A register index points outside the 16-byte register block.
    #[error("register index {index} out of range (a register block holds {max} bytes)")]
    RegisterOutOfRange { index: u8, max: usize },

    /// The requested span runs past the end of the block address space.
    #[error("integer overflow while computing block addresses")]
    AddressOverflow,

    /// The handle is already in the middle of an operation.
    #[error("device is busy with another operation")]
    Busy,

    /// The liveness probe got no answer at the device's bus address.
    #[error("device not responding")]
    NotResponding,

    /// Bus-level transfer failure, propagated from the transport unchanged.
    #[error("bus transfer failed: {0}")]
    Bus(String),
}
