use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::{rngs::ThreadRng, CryptoRng, RngCore};
use sha2::{Digest, Sha256};

pub fn generate_nonce() -> String {
    URL_SAFE_NO_PAD.encode(get_random_values::<_, 16>(&mut ThreadRng::default()))
}

pub fn get_random_values<R, const LEN: usize>(rng: &mut R) -> [u8; LEN]
where
    R: RngCore + CryptoRng,
{
    let mut bytes = [0u8; LEN];
    rng.fill_bytes(&mut bytes);
    bytes
}

/// Returns `(code_challenge, code_verifier)`.
pub fn generate_pkce() -> (String, String) {
    // https://datatracker.ietf.org/doc/html/rfc7636#section-4.1
    let verifier = URL_SAFE_NO_PAD.encode(get_random_values::<_, 32>(&mut ThreadRng::default()));
    (code_challenge(&verifier), verifier)
}

// https://datatracker.ietf.org/doc/html/rfc7636#section-4.2
pub fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Appends an encoded query string to `endpoint`, keeping any query it already has.
pub fn append_query(endpoint: &str, query: &str) -> String {
    if query.is_empty() {
        return endpoint.to_string();
    }
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}{query}")
}
