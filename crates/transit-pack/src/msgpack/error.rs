//! MessagePack error type.

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum MsgPackError {
    #[error("unexpected end of MessagePack input")]
    UnexpectedEof,
    #[error("invalid MessagePack marker at offset {0}")]
    InvalidByte(usize),
    #[error("invalid UTF-8 in MessagePack string")]
    InvalidUtf8,
    #[error("MessagePack map key is not a string")]
    NotStr,
    #[error("unsupported MessagePack type 0x{0:02x}")]
    Unsupported(u8),
    #[error("trailing bytes after MessagePack value at offset {0}")]
    TrailingBytes(usize),
}
