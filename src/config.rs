use std::env;
use thiserror::Error;
use tracing::info;

use crate::models::money::Currency;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// How outbound mail leaves the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTransport {
    /// Write each message to the log instead of delivering it.
    Log,
    /// Pipe each message to a local sendmail binary.
    Sendmail { path: String },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub secret_key: String,
    pub port: u16,
    pub site_title: String,
    pub site_url: String,
    pub registration_open: bool,
    pub currency: Currency,
    pub mail_from: String,
    pub mail_reply_to: String,
    pub mail_transport: MailTransport,
    pub mapbox_token: Option<String>,
    pub member_email_domain: String,
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

impl Settings {
    /// Load settings from the environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenv::dotenv().is_ok() {
            info!("Loaded environment from .env");
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let or = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let secret_key = get("SECRET_KEY").ok_or(ConfigError::Missing("SECRET_KEY"))?;

        let port = match get("PORT") {
            Some(p) => p.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                value: p.clone(),
                reason: e.to_string(),
            })?,
            None => 3000,
        };

        let registration_open = match get("REGISTRATION_IS_OPEN") {
            Some(v) => parse_bool("REGISTRATION_IS_OPEN", &v)?,
            None => false,
        };

        let mail_transport = match or("MAIL_TRANSPORT", "log").to_ascii_lowercase().as_str() {
            "log" => MailTransport::Log,
            "sendmail" => MailTransport::Sendmail {
                path: or("SENDMAIL_PATH", "/usr/sbin/sendmail"),
            },
            other => {
                return Err(ConfigError::Invalid {
                    name: "MAIL_TRANSPORT",
                    value: other.to_string(),
                    reason: "expected 'log' or 'sendmail'".to_string(),
                })
            }
        };

        let mail_from = or("MAIL_FROM", "devsummit@localhost");
        let mail_reply_to = get("MAIL_REPLYTO").unwrap_or_else(|| mail_from.clone());
        let defaults = Currency::default();

        Ok(Self {
            database_url,
            secret_key,
            port,
            site_title: or("SITE_TITLE", "DevSummit"),
            site_url: or("SITE_URL", "http://localhost:3000"),
            registration_open,
            currency: Currency {
                name: or("CURRENCY", &defaults.name),
                symbol: or("CURRENCY_SYMBOL", &defaults.symbol),
            },
            mail_from,
            mail_reply_to,
            mail_transport,
            mapbox_token: get("MAPBOX_TOKEN"),
            member_email_domain: or("MEMBER_EMAIL_DOMAIN", "FreeBSD.org"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/devsummit"),
        ("SECRET_KEY", "s3cret"),
    ];

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(settings.port, 3000);
        assert_eq!(settings.site_title, "DevSummit");
        assert!(!settings.registration_open);
        assert_eq!(settings.currency, Currency::default());
        assert_eq!(settings.mail_transport, MailTransport::Log);
        assert_eq!(settings.mail_reply_to, settings.mail_from);
        assert_eq!(settings.mapbox_token, None);
        assert_eq!(settings.member_email_domain, "FreeBSD.org");
    }

    #[test]
    fn test_missing_required() {
        let err = Settings::from_lookup(lookup(&[("SECRET_KEY", "x")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));

        let err = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/devsummit"),
            ("SECRET_KEY", "  "),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("SECRET_KEY"));
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("PORT", "8080"),
            ("REGISTRATION_IS_OPEN", "yes"),
            ("CURRENCY", "USD"),
            ("CURRENCY_SYMBOL", "$"),
            ("MAIL_REPLYTO", "organizers@example.org"),
            ("MAIL_TRANSPORT", "sendmail"),
            ("MAPBOX_TOKEN", "pk.abc"),
        ]);

        let settings = Settings::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(settings.port, 8080);
        assert!(settings.registration_open);
        assert_eq!(settings.currency.symbol, "$");
        assert_eq!(settings.mail_reply_to, "organizers@example.org");
        assert_eq!(
            settings.mail_transport,
            MailTransport::Sendmail { path: "/usr/sbin/sendmail".to_string() }
        );
        assert_eq!(settings.mapbox_token.as_deref(), Some("pk.abc"));
    }

    #[test]
    fn test_invalid_values() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "eighty"));
        assert!(matches!(
            Settings::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("REGISTRATION_IS_OPEN", "maybe"));
        assert!(matches!(
            Settings::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { name: "REGISTRATION_IS_OPEN", .. })
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("MAIL_TRANSPORT", "pigeon"));
        assert!(matches!(
            Settings::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { name: "MAIL_TRANSPORT", .. })
        ));
    }
}
