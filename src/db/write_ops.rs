use chrono::NaiveDate;
use sqlx::{PgConnection, Row};
use tracing::{debug, info};

use crate::db::errors::{DatabaseError, Result};
use crate::models::forms::{
    non_blank, AttendeeForm, PaymentForm, PoiForm, ProductForm, PurchaseForm, TodoForm,
    DEFAULT_ICON_SIZE,
};

fn expect_one(rows: u64, what: &str, id: i64) -> Result<()> {
    if rows == 0 {
        return Err(DatabaseError::NotFound(format!("{} {} does not exist", what, id)));
    }
    Ok(())
}

async fn delete_by_id(conn: &mut PgConnection, table: &str, what: &str, id: i64) -> Result<()> {
    let rows = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(DatabaseError::classify)?
        .rows_affected();

    expect_one(rows, what, id)?;
    info!("Deleted {} {}", what, id);
    Ok(())
}

/// Insert a person. `email` overrides the form's email (registration
/// fills in a default address).
#[tracing::instrument(skip(conn, form), fields(name = %form.name))]
pub async fn insert_person(
    conn: &mut PgConnection,
    form: &AttendeeForm,
    email: Option<&str>,
) -> Result<i64> {
    debug!("Inserting person");

    let row = sqlx::query(
        r#"
        INSERT INTO person (
            name, username, email, address, administrator,
            arrival, departure, host_id, shirt_size, dietary_needs
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(form.name.trim())
    .bind(non_blank(&form.username))
    .bind(email.or_else(|| non_blank(&form.email)))
    .bind(form.address.trim())
    .bind(form.administrator)
    .bind(form.arrival)
    .bind(form.departure)
    .bind(form.host)
    .bind(&form.shirt_size)
    .bind(non_blank(&form.dietary_needs))
    .fetch_one(&mut *conn)
    .await
    .map_err(DatabaseError::classify)?;

    let id: i64 = row.get("id");
    info!("Inserted person with ID: {}", id);
    Ok(id)
}

#[tracing::instrument(skip(conn, form))]
pub async fn update_person(conn: &mut PgConnection, id: i64, form: &AttendeeForm) -> Result<()> {
    let rows = sqlx::query(
        r#"
        UPDATE person SET
            name = $2,
            username = $3,
            email = $4,
            address = $5,
            administrator = $6,
            arrival = $7,
            departure = $8,
            host_id = $9,
            shirt_size = $10,
            dietary_needs = $11
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(form.name.trim())
    .bind(non_blank(&form.username))
    .bind(non_blank(&form.email))
    .bind(form.address.trim())
    .bind(form.administrator)
    .bind(form.arrival)
    .bind(form.departure)
    .bind(form.host)
    .bind(&form.shirt_size)
    .bind(non_blank(&form.dietary_needs))
    .execute(&mut *conn)
    .await
    .map_err(DatabaseError::classify)?
    .rows_affected();

    expect_one(rows, "Person", id)
}

pub async fn set_administrator(conn: &mut PgConnection, id: i64, administrator: bool) -> Result<()> {
    let rows = sqlx::query("UPDATE person SET administrator = $2 WHERE id = $1")
        .bind(id)
        .bind(administrator)
        .execute(&mut *conn)
        .await
        .map_err(DatabaseError::classify)?
        .rows_affected();

    expect_one(rows, "Person", id)
}

pub async fn delete_person(conn: &mut PgConnection, id: i64) -> Result<()> {
    delete_by_id(conn, "person", "Person", id).await
}

/// Serialize registrations for the rest of the transaction, so the
/// first-registrant check sees every committed person.
pub async fn lock_people(conn: &mut PgConnection) -> Result<()> {
    sqlx::query("LOCK TABLE person IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *conn)
        .await
        .map_err(DatabaseError::QueryError)?;
    Ok(())
}

pub async fn count_people(conn: &mut PgConnection) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM person")
        .fetch_one(&mut *conn)
        .await
        .map_err(DatabaseError::QueryError)
}

pub async fn insert_product(conn: &mut PgConnection, form: &ProductForm) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO product (name, description, cost, note)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(form.name.trim())
    .bind(form.description.trim())
    .bind(form.cost.minor())
    .bind(non_blank(&form.note))
    .fetch_one(&mut *conn)
    .await
    .map_err(DatabaseError::classify)?;

    info!("Inserted product with ID: {}", id);
    Ok(id)
}

pub async fn update_product(conn: &mut PgConnection, id: i64, form: &ProductForm) -> Result<()> {
    let rows = sqlx::query(
        "UPDATE product SET name = $2, description = $3, cost = $4, note = $5 WHERE id = $1",
    )
    .bind(id)
    .bind(form.name.trim())
    .bind(form.description.trim())
    .bind(form.cost.minor())
    .bind(non_blank(&form.note))
    .execute(&mut *conn)
    .await
    .map_err(DatabaseError::classify)?
    .rows_affected();

    expect_one(rows, "Product", id)
}

/// Fails with an integrity error while any purchase refers to the product.
pub async fn delete_product(conn: &mut PgConnection, id: i64) -> Result<()> {
    delete_by_id(conn, "product", "Product", id).await
}

#[tracing::instrument(skip(conn))]
pub async fn insert_purchase(
    conn: &mut PgConnection,
    buyer_id: i64,
    item_id: i64,
    quantity: i64,
    date: NaiveDate,
    complimentary: bool,
) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO purchase (buyer_id, item_id, quantity, date, complimentary)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(buyer_id)
    .bind(item_id)
    .bind(quantity)
    .bind(date)
    .bind(complimentary)
    .fetch_one(&mut *conn)
    .await
    .map_err(DatabaseError::classify)?;

    info!("Inserted purchase with ID: {}", id);
    Ok(id)
}

pub async fn update_purchase(conn: &mut PgConnection, id: i64, form: &PurchaseForm) -> Result<()> {
    let rows = sqlx::query(
        "UPDATE purchase SET buyer_id = $2, item_id = $3, quantity = $4, complimentary = $5 WHERE id = $1",
    )
    .bind(id)
    .bind(form.buyer)
    .bind(form.item)
    .bind(form.quantity)
    .bind(form.complimentary)
    .execute(&mut *conn)
    .await
    .map_err(DatabaseError::classify)?
    .rows_affected();

    expect_one(rows, "Purchase", id)
}

pub async fn delete_purchase(conn: &mut PgConnection, id: i64) -> Result<()> {
    delete_by_id(conn, "purchase", "Purchase", id).await
}

pub async fn insert_payment(conn: &mut PgConnection, form: &PaymentForm) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO payment (payer_id, date, value, note) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(form.payer)
    .bind(form.date)
    .bind(form.value.minor())
    .bind(non_blank(&form.note))
    .fetch_one(&mut *conn)
    .await
    .map_err(DatabaseError::classify)?;

    info!("Inserted payment with ID: {}", id);
    Ok(id)
}

pub async fn update_payment(conn: &mut PgConnection, id: i64, form: &PaymentForm) -> Result<()> {
    let rows = sqlx::query(
        "UPDATE payment SET payer_id = $2, date = $3, value = $4, note = $5 WHERE id = $1",
    )
    .bind(id)
    .bind(form.payer)
    .bind(form.date)
    .bind(form.value.minor())
    .bind(non_blank(&form.note))
    .execute(&mut *conn)
    .await
    .map_err(DatabaseError::classify)?
    .rows_affected();

    expect_one(rows, "Payment", id)
}

pub async fn delete_payment(conn: &mut PgConnection, id: i64) -> Result<()> {
    delete_by_id(conn, "payment", "Payment", id).await
}

pub async fn insert_poi(conn: &mut PgConnection, form: &PoiForm) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO poi (title, description, latitude, longitude, icon, width, height)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(form.title.trim())
    .bind(non_blank(&form.description))
    .bind(form.latitude)
    .bind(form.longitude)
    .bind(form.icon.trim())
    .bind(form.width.unwrap_or(DEFAULT_ICON_SIZE))
    .bind(form.height.unwrap_or(DEFAULT_ICON_SIZE))
    .fetch_one(&mut *conn)
    .await
    .map_err(DatabaseError::classify)?;

    info!("Inserted POI with ID: {}", id);
    Ok(id)
}

/// Omitted icon dimensions keep their stored values.
pub async fn update_poi(conn: &mut PgConnection, id: i64, form: &PoiForm) -> Result<()> {
    let rows = sqlx::query(
        r#"
        UPDATE poi SET
            title = $2,
            description = $3,
            latitude = $4,
            longitude = $5,
            icon = $6,
            width = COALESCE($7, width),
            height = COALESCE($8, height)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(form.title.trim())
    .bind(non_blank(&form.description))
    .bind(form.latitude)
    .bind(form.longitude)
    .bind(form.icon.trim())
    .bind(form.width)
    .bind(form.height)
    .execute(&mut *conn)
    .await
    .map_err(DatabaseError::classify)?
    .rows_affected();

    expect_one(rows, "POI", id)
}

pub async fn delete_poi(conn: &mut PgConnection, id: i64) -> Result<()> {
    delete_by_id(conn, "poi", "POI", id).await
}

pub async fn insert_todo(conn: &mut PgConnection, form: &TodoForm) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO todo (description, deadline, assignee_id, complete)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(form.description.trim())
    .bind(form.deadline)
    .bind(form.assignee)
    .bind(form.complete)
    .fetch_one(&mut *conn)
    .await
    .map_err(DatabaseError::classify)?;

    info!("Inserted todo with ID: {}", id);
    Ok(id)
}

pub async fn update_todo(conn: &mut PgConnection, id: i64, form: &TodoForm) -> Result<()> {
    let rows = sqlx::query(
        "UPDATE todo SET description = $2, deadline = $3, assignee_id = $4, complete = $5 WHERE id = $1",
    )
    .bind(id)
    .bind(form.description.trim())
    .bind(form.deadline)
    .bind(form.assignee)
    .bind(form.complete)
    .execute(&mut *conn)
    .await
    .map_err(DatabaseError::classify)?
    .rows_affected();

    expect_one(rows, "Todo", id)
}

pub async fn delete_todo(conn: &mut PgConnection, id: i64) -> Result<()> {
    delete_by_id(conn, "todo", "Todo", id).await
}
