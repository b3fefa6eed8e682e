use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Label whose token doubles as the pre-registration code.
pub const PREREGISTRATION_LABEL: &str = "preregistration";

/// Server secret used to derive per-person authorization tokens.
#[derive(Clone)]
pub struct TokenKey {
    secret: Vec<u8>,
}

impl TokenKey {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self { secret: secret.as_ref().to_vec() }
    }

    /// HMAC-SHA256 of `subject`, lowercase hex.
    pub fn sign(&self, subject: &str) -> String {
        let mut mac = match HmacSha256::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC-SHA256 takes keys of any size"),
        };
        mac.update(subject.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    pub fn person_token(&self, person_id: i64) -> String {
        token(self, person_id)
    }

    pub fn preregistration_code(&self) -> String {
        self.sign(PREREGISTRATION_LABEL)
    }

    /// Constant-time check of a caller-supplied token.
    pub fn verify(&self, subject: &str, candidate: &str) -> bool {
        let expected = self.sign(subject);
        constant_time_eq(expected.as_bytes(), candidate.as_bytes())
    }

    pub fn verify_person(&self, person_id: i64, candidate: &str) -> bool {
        self.verify(&person_id.to_string(), candidate)
    }
}

impl fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKey").field("secret", &"<redacted>").finish()
    }
}

/// Authorization token for a person: keyed hash of the decimal id.
pub fn token(key: &TokenKey, person_id: i64) -> String {
    key.sign(&person_id.to_string())
}

/// Link an attendee can use to see their own details.
pub fn attendee_link(base_url: &str, key: &TokenKey, person_id: i64) -> String {
    format!(
        "{}/attendee/{}?auth={}",
        base_url.trim_end_matches('/'),
        person_id,
        token(key, person_id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_is_deterministic() {
        let key = TokenKey::new("s3cret");
        let first = token(&key, 42);

        assert_eq!(first, token(&key, 42));
        assert_eq!(first, TokenKey::new("s3cret").person_token(42));
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_token_depends_on_secret() {
        assert_ne!(token(&TokenKey::new("one"), 7), token(&TokenKey::new("two"), 7));
    }

    #[test]
    fn test_distinct_people_get_distinct_tokens() {
        let key = TokenKey::new("s3cret");
        let tokens: HashSet<String> = (1..=1000).map(|id| token(&key, id)).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_known_vector() {
        // HMAC-SHA256(key = "key", message = "1")
        let key = TokenKey::new("key");
        let expected = {
            let mut mac = HmacSha256::new_from_slice(b"key").unwrap();
            mac.update(b"1");
            hex::encode(mac.finalize().into_bytes())
        };
        assert_eq!(token(&key, 1), expected);
    }

    #[test]
    fn test_verify() {
        let key = TokenKey::new("s3cret");
        let good = token(&key, 5);

        assert!(key.verify_person(5, &good));
        assert!(!key.verify_person(6, &good));
        assert!(!key.verify_person(5, ""));
        assert!(!key.verify_person(5, &good[..63]));
        assert!(!key.verify_person(5, &good.to_uppercase()));
    }

    #[test]
    fn test_preregistration_code_differs_from_person_tokens() {
        let key = TokenKey::new("s3cret");
        let code = key.preregistration_code();

        assert_eq!(code, key.sign("preregistration"));
        assert!(key.verify(PREREGISTRATION_LABEL, &code));
        assert_ne!(code, token(&key, 0));
    }

    #[test]
    fn test_attendee_link() {
        let key = TokenKey::new("s3cret");
        let link = attendee_link("https://summit.example.org/", &key, 3);

        assert_eq!(
            link,
            format!("https://summit.example.org/attendee/3?auth={}", token(&key, 3))
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", TokenKey::new("hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
