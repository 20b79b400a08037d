//! Concurrent sales against one product must never oversell it.

mod common;

use std::sync::Arc;

use futures::future::join_all;
use localfish_core::sales::PaymentMethod;
use localfish_db::repositories::CreateSaleInput;
use localfish_db::{ProductRepository, SaleRepository};
use rust_decimal_macros::dec;
use tokio::sync::Barrier;

#[tokio::test]
#[ignore = "requires a migrated database (DATABASE_URL)"]
async fn test_concurrent_sales_never_oversell() {
    let db = common::connect().await;
    let business = common::create_business(&db).await;
    let product_id = common::create_product(&db, business, dec!(10)).await;

    let workers = 25;
    let barrier = Arc::new(Barrier::new(workers));
    let tasks = (0..workers).map(|_| {
        let sales = SaleRepository::new(db.clone());
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            barrier.wait().await;
            sales
                .create(
                    business,
                    business,
                    CreateSaleInput {
                        product_id,
                        contact_id: None,
                        quantity: dec!(1),
                        unit_price: None,
                        payment_method: PaymentMethod::Cash,
                        amount_paid: None,
                        sale_date: None,
                        notes: None,
                    },
                )
                .await
        })
    });

    let results = join_all(tasks).await;
    let succeeded = results
        .into_iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();

    let product = ProductRepository::new(db.clone())
        .find(business, product_id)
        .await
        .unwrap();

    assert_eq!(succeeded, 10);
    assert_eq!(product.quantity, dec!(0));
}
