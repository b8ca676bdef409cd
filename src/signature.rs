//! SHA-1 signatures used by the JS-SDK and the platform handshake.

use std::fmt::Write;

use rand::Rng;
use rand::distr::Alphanumeric;
use sha1::{Digest, Sha1};

const NONCE_LEN: usize = 16;

fn sha1_hex(data: &[u8]) -> String {
    let digest = Sha1::digest(data);
    // lowercase hex
    let mut s = String::with_capacity(digest.len() * 2);
    for b in digest {
        let _ = write!(&mut s, "{:02x}", b);
    }
    s
}

/// JS-SDK page signature: SHA-1 over
/// `jsapi_ticket=<ticket>&noncestr=<nonce>&timestamp=<timestamp>&url=<url>`.
///
/// `url` must be the full page URL without the `#` fragment, exactly as the page sees it.
pub fn jsapi_signature(ticket: &str, nonce: &str, timestamp: i64, url: &str) -> String {
    let plain = format!(
        "jsapi_ticket={}&noncestr={}&timestamp={}&url={}",
        ticket, nonce, timestamp, url
    );
    sha1_hex(plain.as_bytes())
}

/// Random alphanumeric nonce for `wx.config`.
pub fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

/// Compute SHA-1 signature by sorting parts lexicographically and concatenating.
pub fn sha1_signature(parts: &[&str]) -> String {
    let mut v = parts.to_vec();
    v.sort_unstable();
    sha1_hex(v.concat().as_bytes())
}

/// Verify the server URL handshake signature (plain mode).
pub fn verify_url_signature(token: &str, timestamp: &str, nonce: &str, signature: &str) -> bool {
    let calc = sha1_signature(&[token, timestamp, nonce]);
    calc.eq_ignore_ascii_case(signature)
}
