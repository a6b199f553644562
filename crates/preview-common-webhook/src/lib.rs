// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HMAC-SHA1 webhook signature utilities.
//!
//! GitHub signs every delivery with the shared webhook secret and sends the
//! result in the `X-Hub-Signature` header as `sha1=<hex>`. Verification must
//! run over the raw request body exactly as received; re-serializing a parsed
//! payload does not reproduce the signed bytes.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the SHA-1 delivery signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

/// Prefix GitHub puts in front of the hex digest.
pub const SIGNATURE_PREFIX: &str = "sha1=";

/// Compute an HMAC-SHA1 signature for a payload.
///
/// Returns the hex-encoded digest without any prefix.
pub fn compute_hmac_sha1(secret: &[u8], payload: &[u8]) -> String {
	let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
	mac.update(payload);
	hex::encode(mac.finalize().into_bytes())
}

/// Compute the full header value (`sha1=<hex>`) for a payload.
pub fn compute_signature_header(secret: &[u8], payload: &[u8]) -> String {
	format!("{SIGNATURE_PREFIX}{}", compute_hmac_sha1(secret, payload))
}

/// Verify an `X-Hub-Signature` header value against a payload.
///
/// The expected header is rebuilt from the payload and compared byte for
/// byte. A header of a different length is rejected before any content is
/// compared; equal-length headers are compared in constant time.
pub fn verify_signature_header(secret: &[u8], payload: &[u8], header: &str) -> bool {
	let expected = compute_signature_header(secret, payload);
	let expected = expected.as_bytes();
	let supplied = header.as_bytes();

	if expected.len() != supplied.len() {
		return false;
	}

	expected.ct_eq(supplied).into()
}
