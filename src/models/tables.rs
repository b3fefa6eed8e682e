use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::money::{Money, MoneyError};

/// person table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub address: String,
    pub administrator: bool,
    pub arrival: Option<NaiveDate>,
    pub departure: Option<NaiveDate>,
    pub host_id: Option<i64>,
    pub shirt_size: String,
    pub dietary_needs: Option<String>,
}

/// product table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub cost: i64,
    pub note: Option<String>,
}

impl Product {
    pub fn price(&self) -> Money {
        Money::from_minor(self.cost)
    }
}

/// purchase table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Purchase {
    pub id: i64,
    pub buyer_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub date: NaiveDate,
    pub complimentary: bool,
}

/// A purchase joined with its buyer's name and the product it bought.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PurchaseDetail {
    pub id: i64,
    pub buyer_id: i64,
    pub buyer_name: String,
    pub item_id: i64,
    pub item_name: String,
    pub item_description: String,
    pub unit_cost: i64,
    pub quantity: i64,
    pub date: NaiveDate,
    pub complimentary: bool,
}

impl PurchaseDetail {
    pub fn total(&self) -> Result<Money, MoneyError> {
        if self.complimentary {
            Ok(Money::ZERO)
        } else {
            Money::from_minor(self.unit_cost).scale(self.quantity)
        }
    }
}

/// payment table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: i64,
    pub payer_id: i64,
    pub date: NaiveDate,
    pub value: i64,
    pub note: Option<String>,
}

impl Payment {
    pub fn amount(&self) -> Money {
        Money::from_minor(self.value)
    }
}

/// poi table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Poi {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub description: Option<String>,
    pub icon: String,
    pub width: i32,
    pub height: i32,
}

/// todo table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Todo {
    pub id: i64,
    pub description: String,
    pub deadline: Option<NaiveDateTime>,
    pub assignee_id: Option<i64>,
    pub complete: bool,
}
