use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    /// The input does not parse as a DNS message.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// A compression pointer chain revisited an offset it already
    /// followed.
    #[error("compression pointer loop at offset {0}")]
    PointerLoop(u16),

    /// Opcodes are four bits wide on the wire.
    #[error("opcode does not fit in four bits")]
    ReservedOpCode,

    #[error("label of {0} octets exceeds the 63 octet limit: {1}")]
    LabelTooLong(usize, String),

    #[error("label is not valid utf-8")]
    BadLabel(#[from] std::str::Utf8Error),
}

impl<E: std::fmt::Debug> From<nom::Err<E>> for WireError {
    fn from(error: nom::Err<E>) -> Self {
        WireError::Malformed(format!("{:?}", error))
    }
}
