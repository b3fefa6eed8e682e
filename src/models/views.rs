use serde::Serialize;

use crate::domain::geo::BoundingBox;
use crate::models::money::{Currency, Money, MoneyError};
use crate::models::tables::{Payment, Person, Poi, Product, PurchaseDetail, Todo};

/// A monetary amount as both exact minor units and display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Amount {
    pub minor: i64,
    pub display: String,
}

impl Amount {
    pub fn new(money: Money, currency: &Currency) -> Self {
        Self {
            minor: money.minor(),
            display: money.format(currency),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseView {
    #[serde(flatten)]
    pub purchase: PurchaseDetail,
    pub total: Amount,
}

impl PurchaseView {
    pub fn new(purchase: PurchaseDetail, currency: &Currency) -> Result<Self, MoneyError> {
        let total = Amount::new(purchase.total()?, currency);
        Ok(Self { purchase, total })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentView {
    #[serde(flatten)]
    pub payment: Payment,
    pub amount: Amount,
}

impl PaymentView {
    pub fn new(payment: Payment, currency: &Currency) -> Self {
        let amount = Amount::new(payment.amount(), currency);
        Self { payment, amount }
    }
}

/// A product an attendee can buy, with a ready-made purchase link.
#[derive(Debug, Clone, Serialize)]
pub struct ProductOffer {
    #[serde(flatten)]
    pub product: Product,
    pub price: Amount,
    pub buy_link: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendeePage {
    pub attendee: Person,
    pub purchases: Vec<PurchaseView>,
    pub payments: Vec<PaymentView>,
    pub total_purchases: Amount,
    pub paid: Amount,
    pub balance: Amount,
    pub products: Vec<ProductOffer>,
}

/// A person as organizers see them, including their credentials.
#[derive(Debug, Clone, Serialize)]
pub struct PersonView {
    #[serde(flatten)]
    pub person: Person,
    pub host_name: Option<String>,
    pub auth: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceView {
    pub person_id: i64,
    pub name: String,
    pub balance: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductSalesView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub note: Option<String>,
    pub price: Amount,
    pub quantity: i64,
    pub revenue: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub attendees: usize,
    pub bookings: Vec<ProductSalesView>,
    pub products: Vec<ProductSalesView>,
    pub total_purchases: Amount,
    pub payments: Vec<PaymentView>,
    pub total_payments: Amount,
    pub balances: Vec<BalanceView>,
    pub balance: Amount,
    pub todos: Vec<Todo>,
    pub registration_open: bool,
    pub preregistration_code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseList {
    pub person: Option<Person>,
    pub product: Option<Product>,
    pub purchases: Vec<PurchaseView>,
    pub total: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    pub poi: Vec<Poi>,
    pub bounds: Option<BoundingBox>,
    pub mapbox_access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HostChoice {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationOptions {
    pub open: bool,
    pub shirt_styles: Vec<Product>,
    pub hosts: Vec<HostChoice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registered {
    pub id: i64,
    pub administrator: bool,
    pub link: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Created {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteInfo {
    pub title: String,
    pub registration_open: bool,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailReport {
    pub subject: String,
    pub recipients: usize,
}
