//! Permessage-deflate WebSocket compression extension (RFC 7692).
//!
//! The pieces are independent and can be used on their own:
//!
//! - [`Parameters`] and [`WindowBits`] model the extension parameters and
//!   convert from and to an [`ExtensionOffer`](crate::extensions::ExtensionOffer);
//! - [`DeflateExtension`] negotiates a server answer to client offers;
//! - [`extend_read`] and [`extend_write`] handle RSV1 per frame;
//! - [`Writer`] and [`Reader`] strip and restore the sync-flush trailer
//!   around any raw-deflate codec;
//! - with the `compression` feature, [`DeflateEncoder`], [`DeflateDecoder`]
//!   and [`DeflateHelper`] provide a flate2-backed codec.
//!
//! ```
//! use rsws_deflate::extensions::ExtensionOffer;
//! use rsws_deflate::extensions::deflate::{DeflateExtension, Parameters};
//!
//! let offer = ExtensionOffer::parse("permessage-deflate; client_max_window_bits").unwrap();
//! let mut ext = DeflateExtension::new(Parameters::no_context_takeover());
//! let answer = ext.negotiate(&offer).unwrap().unwrap();
//! assert_eq!(
//!     answer.to_string(),
//!     "permessage-deflate; server_no_context_takeover; client_no_context_takeover"
//! );
//! ```

mod negotiate;
mod params;
mod reader;
mod rsv;
mod writer;

#[cfg(feature = "compression")]
mod codec;
#[cfg(feature = "compression")]
mod helper;

pub use negotiate::DeflateExtension;
pub use params::{Parameters, WindowBits};
pub use reader::{Decompressor, DecompressorFactory, Reader, SuffixedReader};
pub use rsv::{extend_read, extend_write};
pub use writer::{Compressor, CompressorFactory, TailBuffer, Writer};

#[cfg(feature = "compression")]
pub use codec::{DeflateDecoder, DeflateEncoder, compressor_factory, decompressor_factory};
#[cfg(feature = "compression")]
pub use helper::DeflateHelper;

/// Extension token in `Sec-WebSocket-Extensions`.
pub const EXTENSION_NAME: &str = "permessage-deflate";

/// Bytes a sync flush ends with; removed from every compressed message.
pub const TAIL: [u8; 4] = [0x00, 0x00, 0xff, 0xff];

/// Appended to a received payload before decompression: the removed trailer,
/// then an empty final stored block.
pub const READ_SUFFIX: [u8; 9] = [0x00, 0x00, 0xff, 0xff, 0x01, 0x00, 0x00, 0xff, 0xff];
