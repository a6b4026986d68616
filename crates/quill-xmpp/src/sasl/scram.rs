// quill/quill-xmpp
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use crate::sasl::saslprep::saslprep;

pub const MECHANISM: &str = "SCRAM-SHA-1";

const HASH_LEN: usize = 20;
const GS2_HEADER: &str = "n,,";
/// base64 of the GS2 header `n,,`.
const CHANNEL_BINDING: &str = "biws";

type HmacSha1 = Hmac<Sha1>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScramError {
    #[error("invalid challenge from server: {0}")]
    InvalidChallenge(String),

    /// Decoded challenges may never contain NUL bytes.
    #[error("malicious challenge from server")]
    MaliciousChallenge,

    #[error("server signature does not verify")]
    ServerSignatureMismatch,

    #[error("unable to canonicalize {0}")]
    Saslprep(&'static str),

    #[error("unexpected message for the current authentication step")]
    UnexpectedMessage,
}

/// The SCRAM exchange position. Step one awaits the server's first
/// challenge, step two the verifier, step three is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum Step {
    One = 1,
    Two = 2,
    Three = 3,
    Aborted = -1,
}

/// Picks the mechanism to authenticate with from a server-advertised list.
///
/// Channel binding is unsupported, so `SCRAM-SHA-1-PLUS` entries are
/// ignored in favour of the plain form.
pub fn select_mechanism<'a>(advertised: impl IntoIterator<Item = &'a str>) -> Option<&'static str> {
    advertised
        .into_iter()
        .any(|mechanism| mechanism == MECHANISM)
        .then_some(MECHANISM)
}

/// Client side of the SCRAM-SHA-1 handshake (RFC 5802).
///
/// All payloads entering and leaving the machine are base64-wrapped as
/// they appear on the SASL stream.
pub struct ScramSha1 {
    step: Step,
    cnonce: String,
    client_first_bare: String,
    auth_message: String,
    password: SecretString,
    client_proof: Option<[u8; HASH_LEN]>,
    server_signature: Option<[u8; HASH_LEN]>,
}

impl ScramSha1 {
    pub fn new(username: &str, password: &str) -> Result<Self, ScramError> {
        let cnonce = BASE64.encode(rand::random::<[u8; 8]>());
        Self::with_cnonce(username, password, &cnonce)
    }

    /// Builds the machine with a caller-chosen client nonce. Exists for
    /// deterministic tests and interop verification; `new` draws the nonce
    /// from the process RNG.
    pub fn with_cnonce(username: &str, password: &str, cnonce: &str) -> Result<Self, ScramError> {
        let username = escape_username(&saslprep(username, "username")?);
        let password = SecretString::new(saslprep(password, "password")?);

        let client_first_bare = format!("n={},r={}", username, cnonce);

        Ok(Self {
            step: Step::One,
            cnonce: cnonce.to_string(),
            auth_message: client_first_bare.clone(),
            client_first_bare,
            password,
            client_proof: None,
            server_signature: None,
        })
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// The base64-wrapped initial response carried by the `<auth/>`
    /// element.
    pub fn initial_response(&self) -> String {
        BASE64.encode(format!("{}{}", GS2_HEADER, self.client_first_bare))
    }

    /// Feeds a base64-wrapped `<challenge/>` payload and returns the
    /// base64-wrapped response payload. The second challenge (the "slow"
    /// server verifier path) yields an empty response.
    pub fn handle_challenge(&mut self, encoded: &str) -> Result<String, ScramError> {
        let challenge = match self.decode_payload(Some(encoded)) {
            Ok(challenge) => challenge,
            Err(error) => {
                self.step = Step::Aborted;
                return Err(error);
            }
        };

        self.auth_message.push(',');
        self.auth_message.push_str(&challenge);

        let result = match self.step {
            Step::One => self.handle_first_challenge(&challenge),
            Step::Two => self
                .verify_server_signature(&challenge)
                .map(|()| String::new()),
            Step::Three | Step::Aborted => Err(ScramError::UnexpectedMessage),
        };

        match result {
            Ok(response) => {
                self.step = match self.step {
                    Step::One => Step::Two,
                    _ => Step::Three,
                };
                Ok(response)
            }
            Err(error) => {
                self.step = Step::Aborted;
                Err(error)
            }
        }
    }

    /// Feeds the `<success/>` payload. Servers usually deliver the
    /// verifier here; those that already sent it as a challenge pass an
    /// empty payload.
    pub fn handle_success(&mut self, encoded: Option<&str>) -> Result<(), ScramError> {
        if self.step == Step::Three {
            return Ok(());
        }
        if self.step != Step::Two {
            self.step = Step::Aborted;
            return Err(ScramError::UnexpectedMessage);
        }

        let payload = match self.decode_payload(encoded) {
            Ok(payload) => payload,
            Err(error) => {
                self.step = Step::Aborted;
                return Err(error);
            }
        };

        self.auth_message.push(',');
        self.auth_message.push_str(&payload);

        match self.verify_server_signature(&payload) {
            Ok(()) => {
                self.step = Step::Three;
                Ok(())
            }
            Err(error) => {
                self.step = Step::Aborted;
                Err(error)
            }
        }
    }

    pub fn abort(&mut self) {
        self.step = Step::Aborted;
    }

    /// The computed client proof, available after the first challenge.
    pub fn client_proof(&self) -> Option<[u8; HASH_LEN]> {
        self.client_proof
    }

    /// The expected server signature, available after the first challenge.
    pub fn server_signature(&self) -> Option<[u8; HASH_LEN]> {
        self.server_signature
    }

    fn decode_payload(&self, encoded: Option<&str>) -> Result<String, ScramError> {
        let encoded = encoded.unwrap_or_default();
        if encoded.is_empty() {
            return Err(ScramError::InvalidChallenge("empty payload".to_string()));
        }
        let decoded = BASE64
            .decode(encoded)
            .map_err(|e| ScramError::InvalidChallenge(e.to_string()))?;
        if decoded.contains(&0) {
            return Err(ScramError::MaliciousChallenge);
        }
        String::from_utf8(decoded).map_err(|e| ScramError::InvalidChallenge(e.to_string()))
    }

    fn handle_first_challenge(&mut self, challenge: &str) -> Result<String, ScramError> {
        let (nonce, salt, iterations) = parse_first_challenge(challenge, &self.cnonce)?;

        self.auth_message
            .push_str(&format!(",c={},r={}", CHANNEL_BINDING, nonce));

        self.calc_proofs(&salt, iterations);

        let proof = BASE64.encode(self.client_proof.expect("proofs were just computed"));
        let response = format!("c={},r={},p={}", CHANNEL_BINDING, nonce, proof);
        Ok(BASE64.encode(response))
    }

    fn calc_proofs(&mut self, salt: &[u8], iterations: u32) {
        let password = self.password.expose_secret().as_bytes();

        let salted_password = hi(password, salt, iterations);
        let client_key = hmac(&salted_password, b"Client Key");
        let server_key = hmac(&salted_password, b"Server Key");
        let stored_key: [u8; HASH_LEN] = Sha1::digest(client_key).into();
        let client_signature = hmac(&stored_key, self.auth_message.as_bytes());

        let mut client_proof = client_key;
        for (proof, signature) in client_proof.iter_mut().zip(client_signature.iter()) {
            *proof ^= signature;
        }

        self.client_proof = Some(client_proof);
        self.server_signature = Some(hmac(&server_key, self.auth_message.as_bytes()));
    }

    fn verify_server_signature(&self, payload: &str) -> Result<(), ScramError> {
        let verifier = payload
            .split(',')
            .next()
            .and_then(|token| token.strip_prefix("v="))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ScramError::InvalidChallenge("missing verifier".to_string()))?;

        let signature = BASE64
            .decode(verifier)
            .map_err(|e| ScramError::InvalidChallenge(e.to_string()))?;
        let expected = self
            .server_signature
            .ok_or(ScramError::UnexpectedMessage)?;

        if signature.len() != expected.len() {
            return Err(ScramError::ServerSignatureMismatch);
        }
        if !bool::from(signature.as_slice().ct_eq(&expected)) {
            return Err(ScramError::ServerSignatureMismatch);
        }
        Ok(())
    }
}

fn escape_username(username: &str) -> String {
    username.replace('=', "=3D").replace(',', "=2C")
}

fn parse_first_challenge(
    challenge: &str,
    cnonce: &str,
) -> Result<(String, Vec<u8>, u32), ScramError> {
    let mut tokens = challenge.split(',');

    let nonce = tokens
        .next()
        .and_then(|token| token.strip_prefix("r="))
        .ok_or_else(|| ScramError::InvalidChallenge("missing nonce".to_string()))?;
    if !nonce.starts_with(cnonce) {
        return Err(ScramError::InvalidChallenge(
            "server nonce does not extend the client nonce".to_string(),
        ));
    }

    let salt = tokens
        .next()
        .and_then(|token| token.strip_prefix("s="))
        .ok_or_else(|| ScramError::InvalidChallenge("missing salt".to_string()))?;
    let salt = BASE64
        .decode(salt)
        .map_err(|e| ScramError::InvalidChallenge(e.to_string()))?;
    if salt.is_empty() {
        return Err(ScramError::InvalidChallenge("empty salt".to_string()));
    }

    let iterations = tokens
        .next()
        .and_then(|token| token.strip_prefix("i="))
        .ok_or_else(|| ScramError::InvalidChallenge("missing iteration count".to_string()))?;
    if iterations.is_empty() || !iterations.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ScramError::InvalidChallenge(
            "iteration count is not a decimal integer".to_string(),
        ));
    }
    let iterations = iterations
        .parse::<u32>()
        .map_err(|e| ScramError::InvalidChallenge(e.to_string()))?;

    Ok((nonce.to_string(), salt, iterations))
}

fn hmac(key: &[u8], data: &[u8]) -> [u8; HASH_LEN] {
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// `Hi(password, salt, i)`: PBKDF2-HMAC-SHA-1 with a single output block.
fn hi(password: &[u8], salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
    let mut block = Vec::with_capacity(salt.len() + 4);
    block.extend_from_slice(salt);
    block.extend_from_slice(&1u32.to_be_bytes());

    let mut u = hmac(password, &block);
    let mut result = u;

    for _ in 1..iterations {
        u = hmac(password, &u);
        for (r, b) in result.iter_mut().zip(u.iter()) {
            *r ^= b;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // RFC 5802 section 5 example exchange.
    const CNONCE: &str = "fyko+d2lbbFgONRv9qkxdawL";
    const FIRST_CHALLENGE: &str =
        "r=fyko+d2lbbFgONRv9qkxdawL3rfcNHYJY1ZVvWVs7j,s=QSXCR+Q6sek8bf92,i=4096";
    const FINAL_RESPONSE: &str =
        "c=biws,r=fyko+d2lbbFgONRv9qkxdawL3rfcNHYJY1ZVvWVs7j,p=v0X8v3Bz2T0CJGbJQyF0X+HI4Ts=";
    const SUCCESS: &str = "v=rmF9pqV8S7suAoZWja4dJRkFsKQ=";

    fn machine() -> ScramSha1 {
        ScramSha1::with_cnonce("user", "pencil", CNONCE).unwrap()
    }

    #[test]
    fn test_initial_response_matches_rfc_vector() {
        let scram = machine();
        assert_eq!(
            scram.initial_response(),
            BASE64.encode("n,,n=user,r=fyko+d2lbbFgONRv9qkxdawL")
        );
        assert_eq!(scram.step(), Step::One);
    }

    #[test]
    fn test_full_exchange_matches_rfc_vector() {
        let mut scram = machine();

        let response = scram
            .handle_challenge(&BASE64.encode(FIRST_CHALLENGE))
            .unwrap();
        assert_eq!(response, BASE64.encode(FINAL_RESPONSE));
        assert_eq!(scram.step(), Step::Two);
        assert_eq!(
            BASE64.encode(scram.client_proof().unwrap()),
            "v0X8v3Bz2T0CJGbJQyF0X+HI4Ts="
        );

        scram
            .handle_success(Some(&BASE64.encode(SUCCESS)))
            .unwrap();
        assert_eq!(scram.step(), Step::Three);
    }

    #[test]
    fn test_slow_server_sends_verifier_as_challenge() {
        let mut scram = machine();
        scram
            .handle_challenge(&BASE64.encode(FIRST_CHALLENGE))
            .unwrap();

        let response = scram.handle_challenge(&BASE64.encode(SUCCESS)).unwrap();
        assert_eq!(response, "");
        assert_eq!(scram.step(), Step::Three);

        // The trailing <success/> is then empty.
        scram.handle_success(None).unwrap();
    }

    #[test]
    fn test_wrong_server_signature_is_fatal() {
        let mut scram = machine();
        scram
            .handle_challenge(&BASE64.encode(FIRST_CHALLENGE))
            .unwrap();

        let result =
            scram.handle_success(Some(&BASE64.encode("v=AAAAAAAAAAAAAAAAAAAAAAAAAAA=")));
        assert_eq!(result, Err(ScramError::ServerSignatureMismatch));
        assert_eq!(scram.step(), Step::Aborted);
    }

    #[test]
    fn test_nul_bytes_in_challenge_are_fatal() {
        let mut scram = machine();
        let result = scram.handle_challenge(&BASE64.encode(b"r=abc\0def,s=QQ==,i=1"));
        assert_eq!(result, Err(ScramError::MaliciousChallenge));
        assert_eq!(scram.step(), Step::Aborted);
    }

    #[test]
    fn test_nonce_must_extend_cnonce() {
        let mut scram = machine();
        let challenge = "r=completely-different,s=QSXCR+Q6sek8bf92,i=4096";
        assert!(scram.handle_challenge(&BASE64.encode(challenge)).is_err());
        assert_eq!(scram.step(), Step::Aborted);
    }

    #[test]
    fn test_iteration_count_rejects_non_digits() {
        for iterations in ["4096x", "", "-1", "40 96"] {
            let mut scram = machine();
            let challenge = format!(
                "r=fyko+d2lbbFgONRv9qkxdawL3rfcNHYJY1ZVvWVs7j,s=QSXCR+Q6sek8bf92,i={}",
                iterations
            );
            assert!(
                scram.handle_challenge(&BASE64.encode(&challenge)).is_err(),
                "iteration count {:?} should be rejected",
                iterations
            );
        }
    }

    #[test]
    fn test_username_escaping() {
        let scram = ScramSha1::with_cnonce("a=b,c", "pencil", CNONCE).unwrap();
        let decoded = String::from_utf8(BASE64.decode(scram.initial_response()).unwrap()).unwrap();
        assert_eq!(decoded, format!("n,,n=a=3Db=2Cc,r={}", CNONCE));
    }

    #[test]
    fn test_base64_round_trip() {
        let payload = "c=biws,r=abcdef,p=AAEC";
        assert_eq!(
            BASE64.decode(BASE64.encode(payload)).unwrap(),
            payload.as_bytes()
        );
    }

    #[test]
    fn test_plus_mechanism_is_ignored() {
        assert_eq!(
            select_mechanism(["SCRAM-SHA-1-PLUS", "SCRAM-SHA-1"]),
            Some(MECHANISM)
        );
        assert_eq!(select_mechanism(["SCRAM-SHA-1-PLUS"]), None);
        assert_eq!(select_mechanism(["PLAIN"]), None);
    }

    #[test]
    fn test_abort() {
        let mut scram = machine();
        scram.abort();
        assert_eq!(scram.step(), Step::Aborted);
        assert!(scram
            .handle_challenge(&BASE64.encode(FIRST_CHALLENGE))
            .is_err());
    }
}
