use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};

use super::DomainError;
use crate::auth::token::TokenKey;
use crate::db::read_ops::{self, PurchaseFilter};
use crate::db::DatabaseError;
use crate::db::write_ops;
use crate::domain::ledger::{Ledger, LineItem};
use crate::models::money::{Currency, Money, MoneyError};
use crate::models::tables::{Payment, Person, Product, PurchaseDetail};
use crate::models::views::{Amount, AttendeePage, PaymentView, ProductOffer, PurchaseView};

/// Returned for every refused attendee page, whatever the reason.
pub const ATTENDEE_AUTH_REQUIRED: &str =
    "Access to an attendee's details requires an authorization code";

/// Returned for every failed purchase link, whatever the reason.
pub const BUY_FAILED: &str = "No such person, item or authorization code";

pub fn buy_link(key: &TokenKey, buyer_id: i64, item_id: i64) -> String {
    format!(
        "/buy?item={}&buyer={}&auth={}",
        item_id,
        buyer_id,
        key.person_token(buyer_id)
    )
}

/// Assemble an attendee's page from already-loaded rows.
pub fn build_attendee_page(
    key: &TokenKey,
    currency: &Currency,
    attendee: Person,
    purchases: Vec<PurchaseDetail>,
    payments: Vec<Payment>,
    products: Vec<Product>,
) -> Result<AttendeePage, MoneyError> {
    let mut ledger = Ledger::new(attendee.id, attendee.name.clone());
    ledger.purchases = purchases
        .iter()
        .map(|p| LineItem {
            unit_cost: Money::from_minor(p.unit_cost),
            quantity: p.quantity,
            complimentary: p.complimentary,
        })
        .collect();
    ledger.payments = payments.iter().map(Payment::amount).collect();

    let offers = products
        .into_iter()
        .map(|product| ProductOffer {
            price: Amount::new(product.price(), currency),
            buy_link: buy_link(key, attendee.id, product.id),
            product,
        })
        .collect();

    Ok(AttendeePage {
        purchases: purchases
            .into_iter()
            .map(|p| PurchaseView::new(p, currency))
            .collect::<Result<Vec<_>, _>>()?,
        payments: payments
            .into_iter()
            .map(|p| PaymentView::new(p, currency))
            .collect(),
        total_purchases: Amount::new(ledger.total_purchases()?, currency),
        paid: Amount::new(ledger.paid()?, currency),
        balance: Amount::new(ledger.balance()?, currency),
        products: offers,
        attendee,
    })
}

/// An attendee's own page, reachable only with their token. Unknown people
/// and wrong tokens are refused identically.
#[tracing::instrument(skip(pool, key, currency, auth))]
pub async fn attendee_page(
    pool: &PgPool,
    key: &TokenKey,
    currency: &Currency,
    person_id: i64,
    auth: Option<&str>,
) -> Result<AttendeePage, DomainError> {
    let refused = || DomainError::Unauthorized(ATTENDEE_AUTH_REQUIRED.to_string());

    let person = read_ops::find_person(pool, person_id).await?;
    let authorized = match (&person, auth) {
        (Some(_), Some(candidate)) => key.verify_person(person_id, candidate),
        _ => false,
    };

    let attendee = match person {
        Some(p) if authorized => p,
        _ => {
            warn!("Refused attendee page");
            return Err(refused());
        }
    };

    let purchases = read_ops::list_purchases(
        pool,
        PurchaseFilter { buyer: Some(person_id), item: None },
    )
    .await?;
    let payments = read_ops::payments_by(pool, person_id).await?;
    let products = read_ops::list_priced_products(pool).await?;

    info!(
        purchases = purchases.len(),
        payments = payments.len(),
        "Attendee page loaded"
    );

    Ok(build_attendee_page(
        key, currency, attendee, purchases, payments, products,
    )?)
}

/// Buy one of an item through an attendee's purchase link. Returns the buyer.
#[tracing::instrument(skip(pool, key, auth))]
pub async fn buy_item(
    pool: &PgPool,
    key: &TokenKey,
    item_id: i64,
    buyer_id: i64,
    auth: &str,
) -> Result<Person, DomainError> {
    let failed = || DomainError::NotFound(BUY_FAILED.to_string());

    let item = read_ops::find_product(pool, item_id).await?;
    let buyer = read_ops::find_person(pool, buyer_id).await?;

    let (item, buyer) = match (item, buyer) {
        (Some(item), Some(buyer)) if key.verify_person(buyer.id, auth) => (item, buyer),
        _ => {
            warn!("Refused purchase link");
            return Err(failed());
        }
    };

    let mut conn = pool
        .acquire()
        .await
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

    let purchase_id = write_ops::insert_purchase(
        &mut conn,
        buyer.id,
        item.id,
        1,
        Utc::now().date_naive(),
        false,
    )
    .await?;

    info!(purchase_id, item = %item.name, "Attendee bought item");
    Ok(buyer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn attendee() -> Person {
        Person {
            id: 12,
            name: "Ada".to_string(),
            username: Some("ada".to_string()),
            email: Some("ada@FreeBSD.org".to_string()),
            address: "London".to_string(),
            administrator: false,
            arrival: None,
            departure: None,
            host_id: None,
            shirt_size: "M".to_string(),
            dietary_needs: None,
        }
    }

    fn purchase(id: i64, cost: i64, quantity: i64, complimentary: bool) -> PurchaseDetail {
        PurchaseDetail {
            id,
            buyer_id: 12,
            buyer_name: "Ada".to_string(),
            item_id: id,
            item_name: format!("item-{}", id),
            item_description: "Item".to_string(),
            unit_cost: cost,
            quantity,
            date: NaiveDate::from_ymd_opt(2018, 6, 1).unwrap(),
            complimentary,
        }
    }

    #[test]
    fn test_buy_link() {
        let key = TokenKey::new("s3cret");
        assert_eq!(
            buy_link(&key, 12, 3),
            format!("/buy?item=3&buyer=12&auth={}", key.person_token(12))
        );
    }

    #[test]
    fn test_build_attendee_page_totals() {
        let key = TokenKey::new("s3cret");
        let currency = Currency::default();
        let payments = vec![Payment {
            id: 1,
            payer_id: 12,
            date: NaiveDate::from_ymd_opt(2018, 6, 2).unwrap(),
            value: 2000,
            note: None,
        }];
        let products = vec![Product {
            id: 5,
            name: "Dinner".to_string(),
            description: "Conference dinner".to_string(),
            cost: 4500,
            note: None,
        }];

        let page = build_attendee_page(
            &key,
            &currency,
            attendee(),
            vec![purchase(1, 2500, 2, false), purchase(2, 1500, 1, true)],
            payments,
            products,
        )
        .unwrap();

        assert_eq!(page.total_purchases.minor, 5000);
        assert_eq!(page.paid.minor, 2000);
        assert_eq!(page.balance.minor, 3000);
        assert_eq!(page.balance.display, "£30.00");
        assert_eq!(page.products[0].price.display, "£45.00");
        assert_eq!(page.products[0].buy_link, buy_link(&key, 12, 5));
        assert_eq!(page.purchases[1].total.minor, 0);
    }

    #[test]
    fn test_attendee_page_refuses_oversized_purchase() {
        let key = TokenKey::new("s3cret");
        let result = build_attendee_page(
            &key,
            &Currency::default(),
            attendee(),
            vec![purchase(1, 100, i64::MAX, false)],
            Vec::new(),
            Vec::new(),
        );

        assert!(matches!(result, Err(MoneyError::Overflow)));
    }
}
