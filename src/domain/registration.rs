use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};

use super::DomainError;
use crate::auth::token::{attendee_link, TokenKey, PREREGISTRATION_LABEL};
use crate::config::Settings;
use crate::db::connection::REGISTRATION_PRODUCT;
use crate::db::read_ops::{self, within};
use crate::db::{write_ops, DatabaseError};
use crate::mail::{registration_email, Envelope, Mailer};
use crate::models::forms::{non_blank, AttendeeForm, FieldError, FormErrors, RegistrationForm, Validate};
use crate::models::tables::Product;
use crate::models::views::{HostChoice, Registered, RegistrationOptions};

pub const REGISTRATION_CLOSED: &str = "Registration is not open yet";
pub const SHIRT_PREFIX: &str = "Shirt ";
pub const NO_SUCH_HOST: &str = "No such member to act as host";

/// Closed registration still admits callers holding the pre-registration code.
pub fn check_open(open: bool, key: &TokenKey, code: Option<&str>) -> Result<(), DomainError> {
    if open {
        return Ok(());
    }
    match code {
        Some(code) if key.verify(PREREGISTRATION_LABEL, code) => Ok(()),
        _ => Err(DomainError::Forbidden(REGISTRATION_CLOSED.to_string())),
    }
}

/// Members without an explicit address get one at the member domain.
pub fn default_email(form: &AttendeeForm, member_domain: &str) -> Option<String> {
    if let Some(email) = non_blank(&form.email) {
        return Some(email.to_string());
    }
    non_blank(&form.username).map(|username| format!("{}@{}", username, member_domain))
}

pub fn is_shirt_style(product: &Product) -> bool {
    product.name.starts_with(SHIRT_PREFIX)
}

/// What the registration form needs to offer.
#[tracing::instrument(skip(pool))]
pub async fn registration_options(pool: &PgPool, open: bool) -> Result<RegistrationOptions, DomainError> {
    let shirt_styles = read_ops::list_shirt_styles(pool).await?;
    let hosts = read_ops::list_hosts(pool)
        .await?
        .into_iter()
        .map(|p| HostChoice { id: p.id, name: p.name })
        .collect();

    Ok(RegistrationOptions { open, shirt_styles, hosts })
}

/// A guest's host must be an existing member, not another guest.
pub async fn check_host(conn: &mut PgConnection, host: Option<i64>) -> Result<(), DomainError> {
    let Some(host) = host else {
        return Ok(());
    };
    if within::host(conn, host).await?.is_none() {
        warn!(host, "Refused unknown host");
        return Err(FormErrors(vec![FieldError {
            field: "host",
            message: NO_SUCH_HOST.to_string(),
        }])
        .into());
    }
    Ok(())
}

fn conflict_or(e: DatabaseError) -> DomainError {
    if e.is_integrity_error() {
        DomainError::Conflict(format!("{} (have you already registered?)", e))
    } else {
        e.into()
    }
}

/// Register a new attendee: store them with their registration and
/// complimentary items in one transaction, then mail them their link.
#[tracing::instrument(skip_all, fields(name = %form.attendee.name))]
pub async fn register(
    pool: &PgPool,
    settings: &Settings,
    key: &TokenKey,
    mailer: &dyn Mailer,
    form: RegistrationForm,
) -> Result<Registered, DomainError> {
    form.validate()?;

    let mut attendee = form.attendee;
    attendee.administrator = false;
    let email = default_email(&attendee, &settings.member_email_domain);
    let today = Utc::now().date_naive();

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| DatabaseError::TransactionError(e.to_string()))?;

    write_ops::lock_people(&mut *tx).await?;
    check_host(&mut *tx, attendee.host).await?;

    let shirt = match form.shirt_style {
        Some(id) => match within::product(&mut *tx, id).await? {
            Some(product) if is_shirt_style(&product) => Some(product),
            _ => return Err(DomainError::Validation("Invalid shirt style".to_string())),
        },
        None => None,
    };

    let person_id = write_ops::insert_person(&mut *tx, &attendee, email.as_deref())
        .await
        .map_err(conflict_or)?;

    let administrator = write_ops::count_people(&mut *tx).await? == 1;
    if administrator {
        write_ops::set_administrator(&mut *tx, person_id, true).await?;
        info!(person_id, "First registrant made administrator");
    }

    let registration = within::product_by_name(&mut *tx, REGISTRATION_PRODUCT)
        .await?
        .ok_or_else(|| {
            DomainError::Internal(format!("No '{}' product exists", REGISTRATION_PRODUCT))
        })?;
    write_ops::insert_purchase(&mut *tx, person_id, registration.id, 1, today, false).await?;

    if let Some(shirt) = &shirt {
        write_ops::insert_purchase(&mut *tx, person_id, shirt.id, 1, today, true).await?;
    }

    if let Some(souvenir) = within::first_souvenir(&mut *tx).await? {
        write_ops::insert_purchase(&mut *tx, person_id, souvenir.id, 1, today, true).await?;
    }

    tx.commit()
        .await
        .map_err(|e| DatabaseError::TransactionError(e.to_string()))?;

    info!(person_id, "Registered attendee");

    let link = attendee_link(&settings.site_url, key, person_id);

    if let Some(address) = &email {
        let sent = Envelope::compose(
            &settings.mail_from,
            &settings.mail_reply_to,
            std::slice::from_ref(address),
            format!("{} registration", settings.site_title),
            registration_email(&settings.site_title, attendee.name.trim(), &link),
        );
        let delivered = match sent {
            Ok(envelope) => mailer.send(&envelope).await,
            Err(e) => Err(e),
        };
        if let Err(e) = delivered {
            warn!(person_id, error = %e, "Failed to send registration email");
        }
    }

    Ok(Registered {
        id: person_id,
        administrator,
        message: format!("Thank you for registering for the {}", settings.site_title),
        link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn product(name: &str) -> Product {
        Product {
            id: 1,
            name: name.to_string(),
            description: String::new(),
            cost: 0,
            note: None,
        }
    }

    #[test]
    fn test_open_registration_needs_no_code() {
        let key = TokenKey::new("s3cret");
        assert!(check_open(true, &key, None).is_ok());
    }

    #[test]
    fn test_closed_registration_requires_code() {
        let key = TokenKey::new("s3cret");
        let code = key.preregistration_code();

        assert!(check_open(false, &key, Some(&code)).is_ok());
        assert!(matches!(check_open(false, &key, None), Err(DomainError::Forbidden(_))));
        assert!(matches!(
            check_open(false, &key, Some("not-the-code")),
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            check_open(false, &key, Some(&key.person_token(1))),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn test_default_email() {
        let member = AttendeeForm {
            username: Some("jonathan".to_string()),
            ..AttendeeForm::default()
        };
        assert_eq!(
            default_email(&member, "FreeBSD.org"),
            Some("jonathan@FreeBSD.org".to_string())
        );

        let explicit = AttendeeForm {
            email: Some(" j@example.org ".to_string()),
            ..member.clone()
        };
        assert_eq!(default_email(&explicit, "FreeBSD.org"), Some("j@example.org".to_string()));

        let guest = AttendeeForm { username: None, host: Some(1), ..AttendeeForm::default() };
        assert_eq!(default_email(&guest, "FreeBSD.org"), None);
    }

    #[test]
    fn test_shirt_styles() {
        assert!(is_shirt_style(&product("Shirt M (fitted)")));
        assert!(!is_shirt_style(&product("Shirts")));
        assert!(!is_shirt_style(&product("Souvenir mug")));
    }
}
