//! Server-side permessage-deflate offer/accept logic (RFC 7692 Section 7.1).

use log::debug;

use crate::error::Result;
use crate::extensions::ExtensionOffer;

use super::{EXTENSION_NAME, Parameters};

/// Negotiation state for one connection.
///
/// Holds the parameters this endpoint is willing to run with and the outcome
/// of negotiating against the peer's offers. Reuse it across handshakes by
/// calling [`reset`](Self::reset) in between.
#[derive(Debug, Clone, Default)]
pub struct DeflateExtension {
    /// Parameters the server is going to accept and answer with.
    pub parameters: Parameters,

    accepted: Option<Parameters>,
}

impl DeflateExtension {
    /// Create a negotiator that answers with `parameters`.
    pub fn new(parameters: Parameters) -> Self {
        Self {
            parameters,
            accepted: None,
        }
    }

    /// Consider one offer and return the accept response, if any.
    ///
    /// Returns `Ok(None)` ("no opinion") when the offer names another
    /// extension, when an earlier offer has already been accepted (offers
    /// arrive in preference order, so the first acceptable one wins) or when
    /// the offer asks for something this endpoint will not do:
    /// - a server window larger than the configured one;
    /// - room for a client window smaller than the offer allows;
    /// - server no-context-takeover when it is not configured.
    ///
    /// # Errors
    ///
    /// Returns the parse error of a malformed offer; the state is untouched.
    pub fn negotiate(&mut self, offer: &ExtensionOffer) -> Result<Option<ExtensionOffer>> {
        if offer.name != EXTENSION_NAME || self.accepted.is_some() {
            return Ok(None);
        }

        let want = &self.parameters;
        let got = Parameters::parse(offer)?;

        if got.server_max_window_bits > want.server_max_window_bits {
            debug!(
                "declining offer: server_max_window_bits {} exceeds {}",
                got.server_max_window_bits, want.server_max_window_bits
            );
            return Ok(None);
        }
        if want.client_max_window_bits > got.client_max_window_bits {
            debug!(
                "declining offer: client_max_window_bits {} does not allow {}",
                got.client_max_window_bits, want.client_max_window_bits
            );
            return Ok(None);
        }
        if got.server_no_context_takeover && !want.server_no_context_takeover {
            debug!("declining offer: server_no_context_takeover is not supported");
            return Ok(None);
        }

        let response = want.to_offer();
        self.accepted = Some(got);
        Ok(Some(response))
    }

    /// Parameters of the accepted offer, or `None` if nothing was accepted.
    pub fn accepted(&self) -> Option<&Parameters> {
        self.accepted.as_ref()
    }

    /// Forget the previous negotiation.
    pub fn reset(&mut self) {
        self.accepted = None;
    }
}
