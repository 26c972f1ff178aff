//! Scope envelopes: `payload '|' signature`, or just `payload` when unsigned.
//!
//! The signature is opaque. It is split off and rejoined byte-for-byte, never computed or checked here.

use crate::{
	error::{Error, Result},
	value::StateMapping,
};
use serde::Deserialize;

pub const SEPARATOR: char = '|';

/// An envelope split into its parts, borrowing from the original string.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<'a> {
	pub payload: &'a str,
	/// Everything after the separator, without it. [`None`] iff there was no separator.
	pub signature: Option<&'a str>,
	pub state: StateMapping,
}

/// Splits `envelope` on the last [`SEPARATOR`] without looking at either part.
#[must_use]
pub fn split(envelope: &str) -> (&str, Option<&str>) {
	match envelope.rfind(SEPARATOR) {
		Some(index) => (&envelope[..index], Some(&envelope[index + SEPARATOR.len_utf8()..])),
		None => (envelope, None),
	}
}

/// Splits `envelope` and decodes its payload.
///
/// If the split-off payload is invalid but the whole envelope decodes as an object,
/// the separator belonged to the payload and the envelope is unsigned.
///
/// # Errors
///
/// [`Error::MalformedEnvelope`] iff no payload object can be decoded.
/// Callers must then skip speculation and send the raw envelope unchanged.
pub fn decode(envelope: &str) -> Result<Decoded<'_>> {
	let (payload, signature) = split(envelope);
	match StateMapping::from_payload(payload) {
		Ok(state) => Ok(Decoded { payload, signature, state }),
		Err(reason) if signature.is_some() => match StateMapping::from_payload(envelope) {
			Ok(state) => Ok(Decoded {
				payload: envelope,
				signature: None,
				state,
			}),
			Err(_) => Err(Error::malformed(reason)),
		},
		Err(reason) => Err(Error::malformed(reason)),
	}
}

/// Rejoins a payload with an (untouched) signature.
#[must_use]
pub fn encode(payload: &str, signature: Option<&str>) -> String {
	match signature {
		Some(signature) => {
			let mut envelope = String::with_capacity(payload.len() + SEPARATOR.len_utf8() + signature.len());
			envelope.push_str(payload);
			envelope.push(SEPARATOR);
			envelope.push_str(signature);
			envelope
		}
		None => payload.to_owned(),
	}
}

/// How a speculative write treats the signature of the envelope it replaces.
///
/// Either way the server only ever receives the envelope captured before speculation,
/// so the stale (or missing) signature is never submitted for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignaturePolicy {
	/// Append the old signature verbatim to the new payload.
	/// The suffix then no longer matches, but it round-trips byte-for-byte.
	#[default]
	PreserveStale,
	/// Write the new payload unsigned.
	Drop,
}

impl SignaturePolicy {
	/// The envelope to display after speculating `payload` over an envelope signed with `signature`.
	#[must_use]
	pub fn rewrite(self, payload: &str, signature: Option<&str>) -> String {
		match self {
			SignaturePolicy::PreserveStale => encode(payload, signature),
			SignaturePolicy::Drop => payload.to_owned(),
		}
	}
}
