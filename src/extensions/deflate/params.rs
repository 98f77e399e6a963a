//! permessage-deflate extension parameters (RFC 7692 Section 7.1).

use std::fmt;

use crate::config::{MAX_WINDOW_BITS, MIN_WINDOW_BITS};
use crate::error::{Error, ParameterErrorKind, Result};
use crate::extensions::{ExtensionOffer, ExtensionParam};

use super::EXTENSION_NAME;

const SERVER_NO_CONTEXT_TAKEOVER: &str = "server_no_context_takeover";
const CLIENT_NO_CONTEXT_TAKEOVER: &str = "client_no_context_takeover";
const SERVER_MAX_WINDOW_BITS: &str = "server_max_window_bits";
const CLIENT_MAX_WINDOW_BITS: &str = "client_max_window_bits";

/// LZ77 window size exponent as carried by the `*_max_window_bits` parameters.
///
/// Holds one of three things:
/// - [`WindowBits::UNSPECIFIED`]: the parameter is absent;
/// - [`WindowBits::BARE`]: the parameter is present without a value;
/// - an exponent in `8..=15`.
///
/// Ordering compares the raw value, so both sentinels sort below every
/// explicit size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowBits(u8);

impl WindowBits {
    /// Parameter not present.
    pub const UNSPECIFIED: Self = Self(0);

    /// Parameter present with no value.
    pub const BARE: Self = Self(1);

    /// Create an explicit window size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] if `bits` is outside 8-15.
    pub fn new(bits: u8) -> Result<Self> {
        if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&bits) {
            return Err(Error::InvalidExtension(format!(
                "window bits must be {}-{}, got {}",
                MIN_WINDOW_BITS, MAX_WINDOW_BITS, bits
            )));
        }
        Ok(Self(bits))
    }

    /// Raw value: 0, 1 or 8-15.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Reports whether the parameter was present at all.
    #[inline]
    #[must_use]
    pub const fn is_defined(self) -> bool {
        self.0 > 0
    }

    /// Explicit exponent, if one was given.
    #[must_use]
    pub const fn bits(self) -> Option<u8> {
        if self.0 >= MIN_WINDOW_BITS {
            Some(self.0)
        } else {
            None
        }
    }

    /// Window size in bytes for an explicit exponent.
    #[must_use]
    pub const fn window_size(self) -> Option<usize> {
        match self.bits() {
            Some(bits) => Some(1 << bits),
            None => None,
        }
    }

    fn from_ascii(key: &str, value: &str) -> Result<Self> {
        Some(value)
            .filter(|v| v.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|v| v.parse::<u8>().ok())
            .and_then(|bits| Self::new(bits).ok())
            .ok_or_else(|| Error::parameter(ParameterErrorKind::Invalid, key, Some(value)))
    }

    fn to_param(self, key: &str) -> Option<ExtensionParam> {
        match self.0 {
            0 => None,
            1 => Some(ExtensionParam::flag(key)),
            8..=15 => Some(ExtensionParam::new(key, self.0.to_string())),
            other => unreachable!("invalid window bits value: {other}"),
        }
    }
}

impl fmt::Display for WindowBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => f.write_str("unspecified"),
            1 => f.write_str("bare"),
            bits => write!(f, "{}", bits),
        }
    }
}

/// The four negotiable permessage-deflate settings.
///
/// A value is either built by the caller to describe what it wants, or
/// obtained with [`Parameters::parse`] from a peer's offer. It is never
/// merged with earlier state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Parameters {
    /// Server resets its compression context after every message.
    pub server_no_context_takeover: bool,
    /// Client resets its compression context after every message.
    pub client_no_context_takeover: bool,
    /// Upper bound on the server's LZ77 window.
    pub server_max_window_bits: WindowBits,
    /// Upper bound on the client's LZ77 window.
    pub client_max_window_bits: WindowBits,
}

impl Parameters {
    /// Parameters with context takeover disabled in both directions.
    ///
    /// This is what [`DeflateHelper`](super::DeflateHelper) assumes, since it
    /// starts a fresh compressor for every message.
    #[must_use]
    pub const fn no_context_takeover() -> Self {
        Self {
            server_no_context_takeover: true,
            client_no_context_takeover: true,
            server_max_window_bits: WindowBits::UNSPECIFIED,
            client_max_window_bits: WindowBits::UNSPECIFIED,
        }
    }

    /// Read parameters from a tokenized extension option.
    ///
    /// Parameters are processed in order and parsing stops at the first bad
    /// one. On error nothing is returned, so no partial state can leak.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] when the option:
    /// - contains a parameter not defined for permessage-deflate (`Unexpected`);
    /// - contains the same parameter twice (`Duplicate`);
    /// - has a missing, forbidden or out-of-range value (`Invalid`).
    pub fn parse(offer: &ExtensionOffer) -> Result<Self> {
        let mut params = Self::default();
        let mut seen = [false; 4];

        for param in &offer.params {
            let key = param.name.as_str();
            let value = param.value();

            let slot = match key {
                CLIENT_MAX_WINDOW_BITS => 0,
                SERVER_MAX_WINDOW_BITS => 1,
                CLIENT_NO_CONTEXT_TAKEOVER => 2,
                SERVER_NO_CONTEXT_TAKEOVER => 3,
                _ => {
                    return Err(Error::parameter(
                        ParameterErrorKind::Unexpected,
                        key,
                        value,
                    ));
                }
            };
            if std::mem::replace(&mut seen[slot], true) {
                return Err(Error::parameter(ParameterErrorKind::Duplicate, key, value));
            }

            match (key, value) {
                (CLIENT_MAX_WINDOW_BITS, None) => {
                    params.client_max_window_bits = WindowBits::BARE;
                }
                (CLIENT_MAX_WINDOW_BITS, Some(value)) => {
                    params.client_max_window_bits = WindowBits::from_ascii(key, value)?;
                }
                (SERVER_MAX_WINDOW_BITS, Some(value)) => {
                    params.server_max_window_bits = WindowBits::from_ascii(key, value)?;
                }
                (CLIENT_NO_CONTEXT_TAKEOVER, None) => {
                    params.client_no_context_takeover = true;
                }
                (SERVER_NO_CONTEXT_TAKEOVER, None) => {
                    params.server_no_context_takeover = true;
                }
                _ => {
                    return Err(Error::parameter(ParameterErrorKind::Invalid, key, value));
                }
            }
        }

        Ok(params)
    }

    /// Encode as a tokenized `permessage-deflate` option.
    ///
    /// Flags are emitted only when set and window bits only when defined.
    #[must_use]
    pub fn to_offer(&self) -> ExtensionOffer {
        let mut offer = ExtensionOffer::new(EXTENSION_NAME);
        if self.server_no_context_takeover {
            offer.push(ExtensionParam::flag(SERVER_NO_CONTEXT_TAKEOVER));
        }
        if self.client_no_context_takeover {
            offer.push(ExtensionParam::flag(CLIENT_NO_CONTEXT_TAKEOVER));
        }
        offer.params.extend(
            [
                self.server_max_window_bits.to_param(SERVER_MAX_WINDOW_BITS),
                self.client_max_window_bits.to_param(CLIENT_MAX_WINDOW_BITS),
            ]
            .into_iter()
            .flatten(),
        );
        offer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(params: &[(&str, Option<&str>)]) -> ExtensionOffer {
        ExtensionOffer::with_params(
            EXTENSION_NAME,
            params
                .iter()
                .map(|(name, value)| match value {
                    Some(value) => ExtensionParam::new(*name, *value),
                    None => ExtensionParam::flag(*name),
                })
                .collect(),
        )
    }

    fn kind(result: Result<Parameters>) -> Option<ParameterErrorKind> {
        result.err().and_then(|e| e.parameter_kind())
    }

    #[test]
    fn test_window_bits_new() {
        assert_eq!(WindowBits::new(8).unwrap().get(), 8);
        assert_eq!(WindowBits::new(15).unwrap().get(), 15);
        assert!(WindowBits::new(0).is_err());
        assert!(WindowBits::new(1).is_err());
        assert!(WindowBits::new(7).is_err());
        assert!(WindowBits::new(16).is_err());
    }

    #[test]
    fn test_window_bits_sentinels() {
        assert!(!WindowBits::UNSPECIFIED.is_defined());
        assert!(WindowBits::BARE.is_defined());
        assert_eq!(WindowBits::BARE.bits(), None);
        assert_eq!(WindowBits::default(), WindowBits::UNSPECIFIED);
        assert!(WindowBits::BARE < WindowBits::new(8).unwrap());
    }

    #[test]
    fn test_window_bits_size() {
        assert_eq!(WindowBits::new(15).unwrap().window_size(), Some(32768));
        assert_eq!(WindowBits::new(8).unwrap().window_size(), Some(256));
        assert_eq!(WindowBits::UNSPECIFIED.window_size(), None);
    }

    #[test]
    fn test_window_bits_display() {
        assert_eq!(WindowBits::UNSPECIFIED.to_string(), "unspecified");
        assert_eq!(WindowBits::BARE.to_string(), "bare");
        assert_eq!(WindowBits::new(12).unwrap().to_string(), "12");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Parameters::parse(&offer(&[])).unwrap(), Parameters::default());
    }

    #[test]
    fn test_parse_all() {
        let params = Parameters::parse(&offer(&[
            ("server_no_context_takeover", None),
            ("client_no_context_takeover", None),
            ("server_max_window_bits", Some("10")),
            ("client_max_window_bits", Some("12")),
        ]))
        .unwrap();
        assert_eq!(
            params,
            Parameters {
                server_no_context_takeover: true,
                client_no_context_takeover: true,
                server_max_window_bits: WindowBits::new(10).unwrap(),
                client_max_window_bits: WindowBits::new(12).unwrap(),
            }
        );
    }

    #[test]
    fn test_parse_bare_client_max_window_bits() {
        let params = Parameters::parse(&offer(&[("client_max_window_bits", None)])).unwrap();
        assert_eq!(params.client_max_window_bits, WindowBits::BARE);

        let params = Parameters::parse(&offer(&[("client_max_window_bits", Some(""))])).unwrap();
        assert_eq!(params.client_max_window_bits, WindowBits::BARE);
    }

    #[test]
    fn test_parse_bare_server_max_window_bits_invalid() {
        let result = Parameters::parse(&offer(&[("server_max_window_bits", None)]));
        assert_eq!(kind(result), Some(ParameterErrorKind::Invalid));
    }

    #[test]
    fn test_parse_out_of_range_bits() {
        for value in ["7", "16", "0", "-1", "abc", "08x", "+9", "255"] {
            let result = Parameters::parse(&offer(&[("server_max_window_bits", Some(value))]));
            assert_eq!(kind(result), Some(ParameterErrorKind::Invalid), "{value}");

            let result = Parameters::parse(&offer(&[("client_max_window_bits", Some(value))]));
            assert_eq!(kind(result), Some(ParameterErrorKind::Invalid), "{value}");
        }
    }

    #[test]
    fn test_parse_flag_with_value_invalid() {
        let result = Parameters::parse(&offer(&[("server_no_context_takeover", Some("1"))]));
        assert_eq!(kind(result), Some(ParameterErrorKind::Invalid));

        let result = Parameters::parse(&offer(&[("client_no_context_takeover", Some("x"))]));
        assert_eq!(kind(result), Some(ParameterErrorKind::Invalid));
    }

    #[test]
    fn test_parse_duplicates() {
        let cases: [&[(&str, Option<&str>)]; 5] = [
            &[("server_no_context_takeover", None), ("server_no_context_takeover", None)],
            &[("client_no_context_takeover", None), ("client_no_context_takeover", None)],
            &[("server_max_window_bits", Some("9")), ("server_max_window_bits", Some("10"))],
            &[("client_max_window_bits", Some("9")), ("client_max_window_bits", None)],
            &[("client_max_window_bits", None), ("client_max_window_bits", None)],
        ];
        for case in cases {
            assert_eq!(
                kind(Parameters::parse(&offer(case))),
                Some(ParameterErrorKind::Duplicate),
                "{case:?}"
            );
        }
    }

    #[test]
    fn test_parse_unexpected() {
        let result = Parameters::parse(&offer(&[
            ("server_no_context_takeover", None),
            ("x_unknown", Some("1")),
        ]));
        let err = result.unwrap_err();
        assert_eq!(
            err,
            Error::InvalidParameter {
                kind: ParameterErrorKind::Unexpected,
                key: "x_unknown".into(),
                value: Some("1".into()),
            }
        );
    }

    #[test]
    fn test_parse_stops_at_first_error() {
        let result = Parameters::parse(&offer(&[
            ("server_max_window_bits", Some("99")),
            ("bogus", None),
        ]));
        assert_eq!(kind(result), Some(ParameterErrorKind::Invalid));
    }

    #[test]
    fn test_to_offer_default_is_bare_name() {
        let offer = Parameters::default().to_offer();
        assert_eq!(offer.name, EXTENSION_NAME);
        assert!(offer.params.is_empty());
        assert_eq!(offer.to_string(), "permessage-deflate");
    }

    #[test]
    fn test_to_offer_order_and_forms() {
        let params = Parameters {
            server_no_context_takeover: true,
            client_no_context_takeover: true,
            server_max_window_bits: WindowBits::new(10).unwrap(),
            client_max_window_bits: WindowBits::BARE,
        };
        assert_eq!(
            params.to_offer().to_string(),
            "permessage-deflate; server_no_context_takeover; client_no_context_takeover; \
             server_max_window_bits=10; client_max_window_bits"
        );
    }

    #[test]
    fn test_to_offer_roundtrip() {
        let params = Parameters {
            server_no_context_takeover: false,
            client_no_context_takeover: true,
            server_max_window_bits: WindowBits::new(15).unwrap(),
            client_max_window_bits: WindowBits::new(8).unwrap(),
        };
        assert_eq!(Parameters::parse(&params.to_offer()).unwrap(), params);
    }

    #[test]
    fn test_no_context_takeover() {
        let params = Parameters::no_context_takeover();
        assert!(params.server_no_context_takeover);
        assert!(params.client_no_context_takeover);
        assert!(!params.server_max_window_bits.is_defined());
    }
}
