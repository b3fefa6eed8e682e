use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fmt;

use crate::models::money::Money;

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Problem with '{}': {}", self.field, self.message)
    }
}

/// Every problem found in a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(pub Vec<FieldError>);

impl FormErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError { field, message: message.into() });
    }

    fn require(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "This field is required.");
        }
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for FormErrors {}

pub trait Validate {
    fn validate(&self) -> Result<(), FormErrors>;
}

/// Largest quantity accepted on a single purchase.
pub const MAX_QUANTITY: i64 = 10_000;

/// Largest price or payment accepted, in minor units.
pub const MAX_AMOUNT: Money = Money::from_minor(100_000_000_000);

fn within_amount_limit(value: Money) -> bool {
    (-MAX_AMOUNT.minor()..=MAX_AMOUNT.minor()).contains(&value.minor())
}

/// A bare `local@domain` address, safe to put in a mail header.
pub fn is_plain_address(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    let allowed = |c: char| c.is_ascii_graphic() && !"@<>()[]\\,;:\"".contains(c);

    !local.is_empty()
        && local.chars().all(allowed)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

/// Member usernames also form the local part of their default address.
pub fn is_username(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Empty strings from HTML-ish clients mean "not given".
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendeeForm {
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub host: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub administrator: bool,
    pub address: String,
    #[serde(default)]
    pub arrival: Option<NaiveDate>,
    #[serde(default)]
    pub departure: Option<NaiveDate>,
    #[serde(default)]
    pub shirt_size: String,
    #[serde(default)]
    pub dietary_needs: Option<String>,
}

impl Validate for AttendeeForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        errors.require("name", &self.name);
        errors.require("address", &self.address);

        if self.name.contains(['\r', '\n']) {
            errors.push("name", "Name must be on a single line");
        }
        if let Some(username) = non_blank(&self.username) {
            if !is_username(username) {
                errors.push(
                    "username",
                    "Usernames may only contain letters, digits, '.', '_' and '-'",
                );
            }
        }
        if let Some(email) = non_blank(&self.email) {
            if !is_plain_address(email) {
                errors.push("email", "Enter a valid email address.");
            }
        }

        match (non_blank(&self.username), self.host) {
            (None, None) => {
                errors.push("host", "Guests without a member username require a host");
            }
            (Some(_), Some(_)) => {
                errors.push("host", "People with member usernames do not require a host");
            }
            _ => {}
        }

        if let (Some(arrival), Some(departure)) = (self.arrival, self.departure) {
            if departure < arrival {
                errors.push("departure", "Departure cannot be before arrival");
            }
        }

        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationForm {
    #[serde(flatten)]
    pub attendee: AttendeeForm,
    #[serde(default)]
    pub shirt_style: Option<i64>,
}

impl Validate for RegistrationForm {
    fn validate(&self) -> Result<(), FormErrors> {
        self.attendee.validate()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoiForm {
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub icon: String,
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub height: Option<i32>,
}

pub const DEFAULT_ICON_SIZE: i32 = 32;

impl Validate for PoiForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        errors.require("title", &self.title);
        errors.require("icon", &self.icon);
        if !(-90.0..=90.0).contains(&self.latitude) {
            errors.push("latitude", "Latitude must be between -90 and 90");
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            errors.push("longitude", "Longitude must be between -180 and 180");
        }
        for (field, size) in [("width", self.width), ("height", self.height)] {
            if matches!(size, Some(s) if s <= 0) {
                errors.push(field, "Icon dimensions must be positive");
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub cost: Money,
    #[serde(default)]
    pub note: Option<String>,
}

impl Validate for ProductForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        errors.require("name", &self.name);
        errors.require("description", &self.description);
        if self.cost < Money::ZERO {
            errors.push("cost", "Cost cannot be negative");
        } else if self.cost > MAX_AMOUNT {
            errors.push("cost", "Cost is too large");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseForm {
    pub buyer: i64,
    pub item: i64,
    pub quantity: i64,
    #[serde(default)]
    pub complimentary: bool,
}

impl Validate for PurchaseForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if self.quantity < 1 {
            errors.push("quantity", "Quantity must be at least 1");
        } else if self.quantity > MAX_QUANTITY {
            errors.push("quantity", format!("Quantity cannot exceed {}", MAX_QUANTITY));
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentForm {
    pub payer: i64,
    pub date: NaiveDate,
    pub value: Money,
    #[serde(default)]
    pub note: Option<String>,
}

impl Validate for PaymentForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if self.value.is_zero() {
            errors.push("value", "This field is required.");
        } else if !within_amount_limit(self.value) {
            errors.push("value", "Payment is too large");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TodoForm {
    pub description: String,
    #[serde(default)]
    pub deadline: Option<NaiveDateTime>,
    #[serde(default)]
    pub assignee: Option<i64>,
    #[serde(default)]
    pub complete: bool,
}

impl Validate for TodoForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        errors.require("description", &self.description);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailForm {
    pub subject: String,
    pub body: String,
}

impl Validate for MailForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        errors.require("subject", &self.subject);
        if self.subject.contains(['\r', '\n']) {
            errors.push("subject", "Subject must be on a single line");
        }
        errors.require("body", &self.body);
        errors.into_result()
    }
}
