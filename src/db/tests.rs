#[cfg(test)]
mod integration_tests {
    use super::super::*;
    use chrono::NaiveDate;
    use sqlx::PgPool;

    use crate::models::forms::{AttendeeForm, PaymentForm, ProductForm};
    use crate::models::money::Money;

    // These tests need a PostgreSQL server: set DATABASE_URL and run with
    // `--ignored`. sqlx::test creates a fresh database with migrations applied.

    fn member(name: &str, username: &str) -> AttendeeForm {
        AttendeeForm {
            name: name.to_string(),
            username: Some(username.to_string()),
            address: "Cambridge, UK".to_string(),
            shirt_size: "M".to_string(),
            ..AttendeeForm::default()
        }
    }

    fn product(name: &str, cost: i64) -> ProductForm {
        ProductForm {
            name: name.to_string(),
            description: name.to_string(),
            cost: Money::from_minor(cost),
            note: None,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 6, 1).unwrap()
    }

    #[sqlx::test]
    #[ignore]
    async fn test_seed_is_idempotent(pool: PgPool) -> sqlx::Result<()> {
        seed(&pool).await.unwrap();
        seed(&pool).await.unwrap();

        let products = list_products(&pool).await.unwrap();
        let registrations = products
            .iter()
            .filter(|p| p.name == REGISTRATION_PRODUCT)
            .count();
        assert_eq!(registrations, 1);
        Ok(())
    }

    #[sqlx::test]
    #[ignore]
    async fn test_duplicate_email_is_integrity_error(pool: PgPool) -> sqlx::Result<()> {
        let mut conn = pool.acquire().await?;
        let ada = member("Ada", "ada");

        insert_person(&mut conn, &ada, Some("ada@FreeBSD.org")).await.unwrap();
        let err = insert_person(&mut conn, &member("Ada again", "ada2"), Some("ada@FreeBSD.org"))
            .await
            .unwrap_err();

        assert!(err.is_integrity_error());
        Ok(())
    }

    #[sqlx::test]
    #[ignore]
    async fn test_ledgers_include_everyone(pool: PgPool) -> sqlx::Result<()> {
        let mut conn = pool.acquire().await?;

        let a = insert_person(&mut conn, &member("A", "a"), None).await.unwrap();
        let b = insert_person(&mut conn, &member("B", "b"), None).await.unwrap();
        let c = insert_person(&mut conn, &member("C", "c"), None).await.unwrap();

        let dinner = insert_product(&mut conn, &product("Dinner", 300)).await.unwrap();
        let shirt = insert_product(&mut conn, &product("Shirt M", 1500)).await.unwrap();

        insert_purchase(&mut conn, a, dinner, 1, day(), false).await.unwrap();
        insert_purchase(&mut conn, c, shirt, 1, day(), true).await.unwrap();
        insert_payment(
            &mut conn,
            &PaymentForm {
                payer: b,
                date: day(),
                value: Money::from_minor(100),
                note: None,
            },
        )
        .await
        .unwrap();

        let ledgers = load_ledgers(&pool).await.unwrap();
        assert_eq!(ledgers.len(), 3);

        let report = crate::domain::BalanceReport::build(&ledgers).unwrap();
        let order: Vec<i64> = report.rows.iter().map(|r| r.person_id).collect();
        assert_eq!(order, vec![a, c, b]);
        assert_eq!(report.total, Money::from_minor(200));
        Ok(())
    }

    #[sqlx::test]
    #[ignore]
    async fn test_purchase_filter(pool: PgPool) -> sqlx::Result<()> {
        let mut conn = pool.acquire().await?;

        let a = insert_person(&mut conn, &member("A", "a"), None).await.unwrap();
        let b = insert_person(&mut conn, &member("B", "b"), None).await.unwrap();
        let dinner = insert_product(&mut conn, &product("Dinner", 4500)).await.unwrap();

        insert_purchase(&mut conn, a, dinner, 2, day(), false).await.unwrap();
        insert_purchase(&mut conn, b, dinner, 1, day(), false).await.unwrap();

        let mine = list_purchases(&pool, PurchaseFilter { buyer: Some(a), item: None })
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].total(), Ok(Money::from_minor(9000)));

        let all = list_purchases(&pool, PurchaseFilter { buyer: None, item: Some(dinner) })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        Ok(())
    }

    #[sqlx::test]
    #[ignore]
    async fn test_only_members_can_host(pool: PgPool) -> sqlx::Result<()> {
        let mut conn = pool.acquire().await?;

        let ada = insert_person(&mut conn, &member("Ada", "ada"), None).await.unwrap();
        let guest = AttendeeForm {
            name: "Guest".to_string(),
            address: "Cambridge, UK".to_string(),
            host: Some(ada),
            ..AttendeeForm::default()
        };
        let guest = insert_person(&mut conn, &guest, None).await.unwrap();

        assert_eq!(within::host(&mut conn, ada).await.unwrap().map(|p| p.id), Some(ada));
        assert!(within::host(&mut conn, guest).await.unwrap().is_none());
        assert!(within::host(&mut conn, 999).await.unwrap().is_none());
        Ok(())
    }

    #[sqlx::test]
    #[ignore]
    async fn test_missing_rows_are_not_found(pool: PgPool) -> sqlx::Result<()> {
        let mut conn = pool.acquire().await?;

        assert!(matches!(get_person(&pool, 999).await, Err(DatabaseError::NotFound(_))));
        assert!(matches!(delete_poi(&mut conn, 999).await, Err(DatabaseError::NotFound(_))));
        assert!(find_person(&pool, 999).await.unwrap().is_none());
        Ok(())
    }
}
