//! # rsws-deflate - permessage-deflate for WebSocket
//!
//! `rsws-deflate` implements the permessage-deflate extension (RFC 7692) as a
//! set of building blocks for a WebSocket stack:
//!
//! - **Parameter model** with strict parsing and canonical encoding
//! - **Server-side negotiation** of client offers
//! - **RSV1 handling** for fragmented compressed messages
//! - **Stream adapters** that strip and restore the sync-flush trailer
//!   around any raw-deflate codec
//! - **flate2 codec** and whole-message helpers (feature `compression`)
//!
//! ## Quick Start
//!
//! ```rust
//! use rsws_deflate::{DeflateConfig, DeflateHelper, Frame};
//!
//! let helper = DeflateHelper::new(DeflateConfig::default());
//! let frame = helper.compress_frame(&Frame::text("hello hello hello"))?;
//! assert!(frame.rsv.rsv1);
//!
//! let plain = helper.decompress_frame(&frame)?;
//! assert_eq!(plain.payload(), b"hello hello hello");
//! # Ok::<(), rsws_deflate::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod extensions;
pub mod protocol;

pub use config::DeflateConfig;
pub use error::{Error, ParameterErrorKind, Result};
pub use extensions::deflate::{
    DeflateExtension, Parameters, Reader, WindowBits, Writer, extend_read, extend_write,
};
pub use extensions::{ExtensionOffer, ExtensionParam, RsvBits, RsvExtension};
pub use protocol::{Frame, OpCode};

#[cfg(feature = "compression")]
pub use extensions::deflate::DeflateHelper;

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn test_public_types_are_send() {
        assert_send::<Error>();
        assert_send::<DeflateConfig>();
        assert_send::<Parameters>();
        assert_send::<WindowBits>();
        assert_send::<DeflateExtension>();
        assert_send::<ExtensionOffer>();
        assert_send::<RsvBits>();
        assert_send::<Frame>();
    }

    #[test]
    fn test_public_types_are_sync() {
        assert_sync::<Error>();
        assert_sync::<DeflateConfig>();
        assert_sync::<Parameters>();
        assert_sync::<WindowBits>();
        assert_sync::<DeflateExtension>();
        assert_sync::<ExtensionOffer>();
        assert_sync::<RsvBits>();
        assert_sync::<Frame>();
    }
}
