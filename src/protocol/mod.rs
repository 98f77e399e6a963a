//! Frame view shared with the (external) WebSocket transport.

pub mod frame;
pub mod opcode;

pub use frame::Frame;
pub use opcode::OpCode;
