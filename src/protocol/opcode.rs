//! WebSocket frame opcodes as defined in RFC 6455.

use std::fmt;

/// WebSocket frame opcode.
///
/// Only the distinction between data and control frames matters to the
/// compression extension; the transport owns opcode parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Continuation frame (0x0).
    Continuation = 0x0,
    /// Text frame (0x1).
    Text = 0x1,
    /// Binary frame (0x2).
    Binary = 0x2,
    /// Close frame (0x8).
    Close = 0x8,
    /// Ping frame (0x9).
    Ping = 0x9,
    /// Pong frame (0xA).
    Pong = 0xA,
}

impl OpCode {
    /// Check if this is a control frame opcode.
    ///
    /// Control frames never carry the per-message compressed bit.
    #[inline]
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, OpCode::Close | OpCode::Ping | OpCode::Pong)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
