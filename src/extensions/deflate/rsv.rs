//! RSV1 handling for compressed messages (RFC 7692 Section 6).
//!
//! Both functions match [`RsvExtension`](crate::extensions::RsvExtension) and
//! never touch RSV2 or RSV3.

use crate::error::{Error, Result};
use crate::extensions::RsvBits;

/// Reserved bits of a received frame after the extension has consumed RSV1.
///
/// `fseq` is the frame's index within its message.
///
/// # Errors
///
/// Returns [`Error::ProtocolViolation`] if RSV1 is set on a non-first
/// fragment; the connection must be failed.
pub fn extend_read(fseq: usize, rsv: RsvBits) -> Result<RsvBits> {
    if fseq > 0 {
        if rsv.rsv1 {
            return Err(Error::ProtocolViolation(
                "non-first fragment contains compression bit enabled".into(),
            ));
        }
        return Ok(rsv);
    }
    Ok(rsv.with_rsv1(false))
}

/// Reserved bits of a frame about to be sent as part of a compressed message.
///
/// RSV1 is set on the first fragment only.
///
/// # Errors
///
/// Returns [`Error::CompressionBitSet`] if RSV1 is already set.
pub fn extend_write(fseq: usize, rsv: RsvBits) -> Result<RsvBits> {
    if rsv.rsv1 {
        return Err(Error::CompressionBitSet);
    }
    if fseq > 0 {
        return Ok(rsv);
    }
    Ok(rsv.with_rsv1(true))
}
