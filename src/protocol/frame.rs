//! Decoded WebSocket frame as handed over by the transport.
//!
//! Parsing, masking and fragment reassembly happen elsewhere; the extension
//! only touches the reserved bits and the payload.

use bytes::Bytes;

use crate::extensions::RsvBits;
use crate::protocol::OpCode;

/// A WebSocket frame header plus its (unmasked) payload.
///
/// ```text
///  0                   1
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5
/// +-+-+-+-+-------+-+-------------+
/// |F|R|R|R| opcode|M| Payload len |
/// |I|S|S|S|  (4)  |A|     (7)     |
/// |N|V|V|V|       |S|             |
/// | |1|2|3|       |K|             |
/// +-+-+-+-+-------+-+-------------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Final fragment flag. True if this is the last fragment of a message.
    pub fin: bool,
    /// Reserved bits RSV1-RSV3.
    pub rsv: RsvBits,
    /// Frame opcode defining the interpretation of payload data.
    pub opcode: OpCode,
    payload: Bytes,
}

impl Frame {
    /// Create a new frame with all reserved bits cleared.
    #[must_use]
    pub fn new(fin: bool, opcode: OpCode, payload: impl Into<Bytes>) -> Self {
        Self {
            fin,
            rsv: RsvBits::NONE,
            opcode,
            payload: payload.into(),
        }
    }

    /// Create a final text frame.
    #[must_use]
    pub fn text(data: impl Into<Bytes>) -> Self {
        Self::new(true, OpCode::Text, data)
    }

    /// Create a final binary frame.
    #[must_use]
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::new(true, OpCode::Binary, data)
    }

    /// Create a ping frame.
    #[must_use]
    pub fn ping(data: impl Into<Bytes>) -> Self {
        Self::new(true, OpCode::Ping, data)
    }

    /// Payload bytes.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length, the header's `Length` field.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Replace the payload; the length follows it.
    pub fn set_payload(&mut self, payload: impl Into<Bytes>) {
        self.payload = payload.into();
    }

    /// Consume the frame, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}
