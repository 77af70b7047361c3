#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A fixed size read could not be satisfied by the bytes remaining.
    #[error("Not enough bytes; needed {needed}, {available} available")]
    InsufficientData {
        /// Number of bytes the read required
        needed: usize,
        /// Number of bytes remaining when the read was attempted
        available: usize,
    },

    /// The primary header length field disagrees with the number of bytes decoded
    /// for the packet. Only produced when length validation is enabled.
    #[error("Packet length mismatch; length field {length_field} implies {expected} bytes, decoded {actual}")]
    LengthMismatch {
        length_field: u16,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
