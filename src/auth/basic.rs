use base64::{engine::general_purpose, Engine as _};
use sqlx::PgPool;
use tracing::{debug, info, warn};

use crate::auth::token::TokenKey;
use crate::db::errors::{DatabaseError, Result};
use crate::db::read_ops::find_person_by_username;
use crate::models::tables::Person;

/// Message returned for every failed organizer login, whatever the cause.
pub const ADMIN_ONLY: &str = "This page is only available to the organizers";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Parse an `Authorization: Basic <base64(user:pass)>` header value.
pub fn parse_basic_header(header: &str) -> Option<BasicCredentials> {
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let encoded = parts.next()?.trim();
    let decoded = general_purpose::STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    if username.is_empty() {
        return None;
    }

    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Why a login was refused. Logged, never shown to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    UnknownUser,
    NotAdministrator,
    WrongPassword,
}

/// Decide whether `person` may log in as an organizer with `password`.
pub fn check_admin(key: &TokenKey, person: &Person, password: &str) -> std::result::Result<(), Refusal> {
    if !person.administrator {
        return Err(Refusal::NotAdministrator);
    }
    if !key.verify_person(person.id, password) {
        return Err(Refusal::WrongPassword);
    }
    Ok(())
}

pub struct AdminValidator;

impl AdminValidator {
    /// Validate organizer credentials from an Authorization header.
    /// The password is the person's own authorization token.
    #[tracing::instrument(skip(pool, key, auth_header), fields(username))]
    pub async fn validate(
        pool: &PgPool,
        key: &TokenKey,
        auth_header: Option<&str>,
    ) -> Result<Person> {
        debug!("Validating organizer credentials");

        let credentials = auth_header
            .and_then(parse_basic_header)
            .ok_or_else(|| {
                debug!("Missing or malformed Basic credentials");
                DatabaseError::Unauthorized(ADMIN_ONLY.to_string())
            })?;

        tracing::Span::current().record("username", credentials.username.as_str());

        let person = find_person_by_username(pool, &credentials.username).await?;

        let outcome = match &person {
            Some(p) => check_admin(key, p, &credentials.password),
            None => Err(Refusal::UnknownUser),
        };

        match (outcome, person) {
            (Ok(()), Some(person)) => {
                info!(person_id = person.id, "Organizer authenticated");
                Ok(person)
            }
            (outcome, _) => {
                let reason = outcome.err().unwrap_or(Refusal::UnknownUser);
                warn!(username = %credentials.username, ?reason, "Organizer login refused");
                Err(DatabaseError::Unauthorized(ADMIN_ONLY.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: i64, administrator: bool) -> Person {
        Person {
            id,
            name: "Organizer".to_string(),
            username: Some("org".to_string()),
            email: Some("org@example.org".to_string()),
            address: "Cambridge".to_string(),
            administrator,
            arrival: None,
            departure: None,
            host_id: None,
            shirt_size: "M".to_string(),
            dietary_needs: None,
        }
    }

    fn encode(raw: &str) -> String {
        format!("Basic {}", general_purpose::STANDARD.encode(raw))
    }

    #[test]
    fn test_parse_basic_header() {
        let creds = parse_basic_header(&encode("jon:abc:def")).unwrap();
        assert_eq!(creds.username, "jon");
        assert_eq!(creds.password, "abc:def");

        let lower = parse_basic_header(&format!("basic {}", general_purpose::STANDARD.encode("a:b")));
        assert!(lower.is_some());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse_basic_header("Bearer abc"), None);
        assert_eq!(parse_basic_header("Basic"), None);
        assert_eq!(parse_basic_header("Basic !!!notbase64"), None);
        assert_eq!(parse_basic_header(&encode("no-colon")), None);
        assert_eq!(parse_basic_header(&encode(":password")), None);
    }

    #[test]
    fn test_check_admin() {
        let key = TokenKey::new("s3cret");
        let admin = person(1, true);
        let attendee = person(2, false);

        assert_eq!(check_admin(&key, &admin, &key.person_token(1)), Ok(()));
        assert_eq!(
            check_admin(&key, &admin, &key.person_token(2)),
            Err(Refusal::WrongPassword)
        );
        assert_eq!(
            check_admin(&key, &attendee, &key.person_token(2)),
            Err(Refusal::NotAdministrator)
        );
    }
}
