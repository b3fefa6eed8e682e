use sqlx::PgPool;
use tracing::info;

use super::DomainError;
use crate::auth::token::TokenKey;
use crate::db::read_ops::{self, ProductSales};
use crate::domain::ledger::{BalanceReport, Ledger};
use crate::models::money::{Currency, Money, MoneyError};
use crate::models::tables::{Payment, Todo};
use crate::models::views::{Amount, BalanceView, PaymentView, ProductSalesView, Summary};

pub fn sales_view(
    sales: &ProductSales,
    currency: &Currency,
) -> Result<ProductSalesView, MoneyError> {
    Ok(ProductSalesView {
        id: sales.id,
        name: sales.name.clone(),
        description: sales.description.clone(),
        note: sales.note.clone(),
        price: Amount::new(Money::from_minor(sales.cost), currency),
        quantity: sales.quantity,
        revenue: Amount::new(sales.revenue()?, currency),
    })
}

/// Everything the organizers' front page shows, from already-loaded rows.
pub fn summarize(
    currency: &Currency,
    sales: &[ProductSales],
    payments: Vec<Payment>,
    ledgers: &[Ledger],
    todos: Vec<Todo>,
    registration_open: bool,
    preregistration_code: String,
) -> Result<Summary, MoneyError> {
    let (bookings, products): (Vec<&ProductSales>, Vec<&ProductSales>) =
        sales.iter().partition(|s| s.is_booking());

    let total_purchases = Money::try_total(products.iter().map(|s| s.revenue()))?;
    let total_payments = Money::total(payments.iter().map(Payment::amount))?;
    let report = BalanceReport::build(ledgers)?;

    let views = |rows: Vec<&ProductSales>| {
        rows.into_iter()
            .map(|s| sales_view(s, currency))
            .collect::<Result<Vec<_>, _>>()
    };

    Ok(Summary {
        attendees: ledgers.len(),
        bookings: views(bookings)?,
        products: views(products)?,
        total_purchases: Amount::new(total_purchases, currency),
        payments: payments
            .into_iter()
            .map(|p| PaymentView::new(p, currency))
            .collect(),
        total_payments: Amount::new(total_payments, currency),
        balances: report
            .rows
            .into_iter()
            .map(|row| BalanceView {
                person_id: row.person_id,
                name: row.name,
                balance: Amount::new(row.balance, currency),
            })
            .collect(),
        balance: Amount::new(report.total, currency),
        todos,
        registration_open,
        preregistration_code,
    })
}

#[tracing::instrument(skip(pool, key, currency))]
pub async fn build_summary(
    pool: &PgPool,
    key: &TokenKey,
    currency: &Currency,
    registration_open: bool,
) -> Result<Summary, DomainError> {
    let sales = read_ops::product_sales(pool).await?;
    let payments = read_ops::list_payments(pool).await?;
    let ledgers = read_ops::load_ledgers(pool).await?;
    let todos = read_ops::list_todos(pool, true).await?;

    let summary = summarize(
        currency,
        &sales,
        payments,
        &ledgers,
        todos,
        registration_open,
        key.preregistration_code(),
    )?;

    info!(
        attendees = summary.attendees,
        balance = summary.balance.minor,
        "Built organizer summary"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::LineItem;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn sales(id: i64, name: &str, cost: i64, quantity: i64, paid_quantity: i64) -> ProductSales {
        ProductSales {
            id,
            name: name.to_string(),
            description: name.to_string(),
            cost,
            note: None,
            quantity,
            paid_quantity,
        }
    }

    fn ledger(id: i64, name: &str, owed: i64, paid: i64) -> Ledger {
        Ledger {
            person_id: id,
            name: name.to_string(),
            purchases: vec![LineItem::new(Money::from_minor(owed), 1)],
            payments: vec![Money::from_minor(paid)],
        }
    }

    #[test]
    fn test_summarize() {
        let key = TokenKey::new("s3cret");
        let currency = Currency::default();
        let payments = vec![Payment {
            id: 1,
            payer_id: 2,
            date: NaiveDate::from_ymd_opt(2018, 6, 1).unwrap(),
            value: 100,
            note: Some("cash".to_string()),
        }];

        let summary = summarize(
            &currency,
            &[
                sales(1, "Registration", 0, 3, 3),
                sales(2, "Dinner", 4500, 3, 2),
                sales(3, "Shirt M", 1500, 2, 0),
            ],
            payments,
            &[ledger(1, "A", 300, 0), ledger(2, "B", 0, 100), ledger(3, "C", 0, 0)],
            Vec::new(),
            false,
            key.preregistration_code(),
        )
        .unwrap();

        assert_eq!(summary.attendees, 3);
        assert_eq!(summary.bookings.len(), 1);
        assert_eq!(summary.bookings[0].quantity, 3);
        assert_eq!(summary.products.len(), 2);
        assert_eq!(summary.products[0].revenue.minor, 9000);
        assert_eq!(summary.products[1].revenue.minor, 0);
        assert_eq!(summary.total_purchases.display, "£90.00");
        assert_eq!(summary.total_payments.minor, 100);

        let order: Vec<&str> = summary.balances.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(order, vec!["A", "C", "B"]);
        assert_eq!(summary.balance.minor, 200);
        assert_eq!(summary.preregistration_code, key.preregistration_code());
    }
}
