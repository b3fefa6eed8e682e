use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::db::errors::{DatabaseError, Result};
use crate::domain::ledger::{Ledger, LineItem};
use crate::models::money::{Money, MoneyError};
use crate::models::tables::{Payment, Person, Poi, Product, PurchaseDetail, Todo};

const PERSON_COLUMNS: &str = r#"
    id, name, username, email, address, administrator,
    arrival, departure, host_id, shirt_size, dietary_needs
"#;

fn not_found(what: &str, id: i64) -> DatabaseError {
    DatabaseError::NotFound(format!("{} {} does not exist", what, id))
}

#[tracing::instrument(skip(pool))]
pub async fn find_person(pool: &PgPool, id: i64) -> Result<Option<Person>> {
    sqlx::query_as::<_, Person>(&format!("SELECT {} FROM person WHERE id = $1", PERSON_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::QueryError)
}

pub async fn get_person(pool: &PgPool, id: i64) -> Result<Person> {
    find_person(pool, id).await?.ok_or_else(|| not_found("Person", id))
}

#[tracing::instrument(skip(pool))]
pub async fn find_person_by_username(pool: &PgPool, username: &str) -> Result<Option<Person>> {
    debug!("Looking up person by username");
    sqlx::query_as::<_, Person>(&format!(
        "SELECT {} FROM person WHERE username = $1",
        PERSON_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::QueryError)
}

/// Everyone, ordered by name.
pub async fn list_people(pool: &PgPool) -> Result<Vec<Person>> {
    let people = sqlx::query_as::<_, Person>(&format!(
        "SELECT {} FROM person ORDER BY name, id",
        PERSON_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    debug!("Loaded {} people", people.len());
    Ok(people)
}

/// People who can host a guest: those who are not guests themselves.
pub async fn list_hosts(pool: &PgPool) -> Result<Vec<Person>> {
    sqlx::query_as::<_, Person>(&format!(
        "SELECT {} FROM person WHERE host_id IS NULL ORDER BY name, id",
        PERSON_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)
}

const PRODUCT_COLUMNS: &str = "id, name, description, cost, note";

pub async fn find_product(pool: &PgPool, id: i64) -> Result<Option<Product>> {
    sqlx::query_as::<_, Product>(&format!("SELECT {} FROM product WHERE id = $1", PRODUCT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::QueryError)
}

pub async fn get_product(pool: &PgPool, id: i64) -> Result<Product> {
    find_product(pool, id).await?.ok_or_else(|| not_found("Product", id))
}

/// All products, ordered by description.
pub async fn list_products(pool: &PgPool) -> Result<Vec<Product>> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM product ORDER BY description, id",
        PRODUCT_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)
}

/// Products that cost something, i.e. what attendees can buy.
pub async fn list_priced_products(pool: &PgPool) -> Result<Vec<Product>> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM product WHERE cost > 0 ORDER BY description, id",
        PRODUCT_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)
}

/// Shirt products offered at registration (named `Shirt ...`).
pub async fn list_shirt_styles(pool: &PgPool) -> Result<Vec<Product>> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM product WHERE name LIKE 'Shirt %' ORDER BY description, id",
        PRODUCT_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)
}

/// A product together with how much of it has been sold.
#[derive(Debug, Clone, FromRow)]
pub struct ProductSales {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub cost: i64,
    pub note: Option<String>,
    pub quantity: i64,
    pub paid_quantity: i64,
}

impl ProductSales {
    /// Products that cost nothing are bookings (e.g. registration) rather
    /// than things to sell.
    pub fn is_booking(&self) -> bool {
        self.cost == 0
    }

    pub fn revenue(&self) -> std::result::Result<Money, MoneyError> {
        Money::from_minor(self.cost).scale(self.paid_quantity)
    }
}

#[tracing::instrument(skip(pool))]
pub async fn product_sales(pool: &PgPool) -> Result<Vec<ProductSales>> {
    let rows = sqlx::query_as::<_, ProductSales>(
        r#"
        SELECT
            p.id,
            p.name,
            p.description,
            p.cost,
            p.note,
            COALESCE(SUM(pu.quantity), 0)::BIGINT AS quantity,
            COALESCE(SUM(pu.quantity) FILTER (WHERE NOT pu.complimentary), 0)::BIGINT AS paid_quantity
        FROM product p
        LEFT JOIN purchase pu ON pu.item_id = p.id
        GROUP BY p.id
        ORDER BY p.description, p.id
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    info!("Loaded sales for {} products", rows.len());
    Ok(rows)
}

/// Which purchases to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurchaseFilter {
    pub buyer: Option<i64>,
    pub item: Option<i64>,
}

#[tracing::instrument(skip(pool))]
pub async fn list_purchases(pool: &PgPool, filter: PurchaseFilter) -> Result<Vec<PurchaseDetail>> {
    sqlx::query_as::<_, PurchaseDetail>(
        r#"
        SELECT
            pu.id,
            pu.buyer_id,
            pe.name AS buyer_name,
            pu.item_id,
            pr.name AS item_name,
            pr.description AS item_description,
            pr.cost AS unit_cost,
            pu.quantity,
            pu.date,
            pu.complimentary
        FROM purchase pu
        JOIN person pe ON pe.id = pu.buyer_id
        JOIN product pr ON pr.id = pu.item_id
        WHERE ($1::BIGINT IS NULL OR pu.buyer_id = $1)
            AND ($2::BIGINT IS NULL OR pu.item_id = $2)
        ORDER BY pu.date, pu.id
        "#,
    )
    .bind(filter.buyer)
    .bind(filter.item)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)
}

const PAYMENT_COLUMNS: &str = "id, payer_id, date, value, note";

/// Every payment, newest first.
pub async fn list_payments(pool: &PgPool) -> Result<Vec<Payment>> {
    sqlx::query_as::<_, Payment>(&format!(
        "SELECT {} FROM payment ORDER BY date DESC, id DESC",
        PAYMENT_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)
}

pub async fn payments_by(pool: &PgPool, payer_id: i64) -> Result<Vec<Payment>> {
    sqlx::query_as::<_, Payment>(&format!(
        "SELECT {} FROM payment WHERE payer_id = $1 ORDER BY date, id",
        PAYMENT_COLUMNS
    ))
    .bind(payer_id)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)
}

const POI_COLUMNS: &str = "id, latitude, longitude, title, description, icon, width, height";

pub async fn list_poi(pool: &PgPool) -> Result<Vec<Poi>> {
    sqlx::query_as::<_, Poi>(&format!("SELECT {} FROM poi ORDER BY title", POI_COLUMNS))
        .fetch_all(pool)
        .await
        .map_err(DatabaseError::QueryError)
}

const TODO_COLUMNS: &str = "id, description, deadline, assignee_id, complete";

/// To-dos by deadline; undated ones last.
pub async fn list_todos(pool: &PgPool, open_only: bool) -> Result<Vec<Todo>> {
    sqlx::query_as::<_, Todo>(&format!(
        "SELECT {} FROM todo WHERE (NOT $1 OR NOT complete) ORDER BY deadline NULLS LAST, id",
        TODO_COLUMNS
    ))
    .bind(open_only)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)
}

#[derive(Debug, FromRow)]
struct LedgerLine {
    person_id: i64,
    unit_cost: i64,
    quantity: i64,
    complimentary: bool,
}

#[derive(Debug, FromRow)]
struct LedgerPayment {
    person_id: i64,
    value: i64,
}

/// Load every person's purchases and payments for balance accounting.
/// People with no activity get an empty ledger.
#[tracing::instrument(skip(pool))]
pub async fn load_ledgers(pool: &PgPool) -> Result<Vec<Ledger>> {
    let people = list_people(pool).await?;

    let lines = sqlx::query_as::<_, LedgerLine>(
        r#"
        SELECT pu.buyer_id AS person_id, pr.cost AS unit_cost, pu.quantity, pu.complimentary
        FROM purchase pu
        JOIN product pr ON pr.id = pu.item_id
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    let payments = sqlx::query_as::<_, LedgerPayment>(
        "SELECT payer_id AS person_id, value FROM payment",
    )
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    let mut ledgers: HashMap<i64, Ledger> = people
        .iter()
        .map(|p| (p.id, Ledger::new(p.id, p.name.clone())))
        .collect();

    for line in lines {
        if let Some(ledger) = ledgers.get_mut(&line.person_id) {
            ledger.purchases.push(LineItem {
                unit_cost: Money::from_minor(line.unit_cost),
                quantity: line.quantity,
                complimentary: line.complimentary,
            });
        }
    }

    for payment in payments {
        if let Some(ledger) = ledgers.get_mut(&payment.person_id) {
            ledger.payments.push(Money::from_minor(payment.value));
        }
    }

    // Keep the people ordering stable for callers.
    let ordered = people
        .iter()
        .filter_map(|p| ledgers.remove(&p.id))
        .collect::<Vec<_>>();

    info!("Loaded {} ledgers", ordered.len());
    Ok(ordered)
}

/// Lookups that run inside a write transaction.
pub mod within {
    use sqlx::PgConnection;

    use super::{PERSON_COLUMNS, PRODUCT_COLUMNS};
    use crate::db::errors::{DatabaseError, Result};
    use crate::models::tables::{Person, Product};

    /// A person who may host guests: anyone who is not a guest themselves.
    pub async fn host(conn: &mut PgConnection, id: i64) -> Result<Option<Person>> {
        sqlx::query_as::<_, Person>(&format!(
            "SELECT {} FROM person WHERE id = $1 AND host_id IS NULL",
            PERSON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(DatabaseError::QueryError)
    }

    pub async fn product_by_name(conn: &mut PgConnection, name: &str) -> Result<Option<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM product WHERE name = $1",
            PRODUCT_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(DatabaseError::QueryError)
    }

    pub async fn product(conn: &mut PgConnection, id: i64) -> Result<Option<Product>> {
        sqlx::query_as::<_, Product>(&format!("SELECT {} FROM product WHERE id = $1", PRODUCT_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(DatabaseError::QueryError)
    }

    /// The first souvenir product, if the organizers created one.
    pub async fn first_souvenir(conn: &mut PgConnection) -> Result<Option<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM product WHERE name LIKE 'Souvenir%' ORDER BY id LIMIT 1",
            PRODUCT_COLUMNS
        ))
        .fetch_optional(&mut *conn)
        .await
        .map_err(DatabaseError::QueryError)
    }
}
