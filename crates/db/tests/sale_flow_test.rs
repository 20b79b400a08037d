//! Integration tests for the sale, stock and cash log flow.

mod common;

use localfish_core::finance::TransactionType;
use localfish_core::inventory::{CorrectionReason, InventoryError};
use localfish_core::sales::PaymentMethod;
use localfish_db::repositories::{
    AddStockInput, CorrectStockInput, CreateSaleInput, MovementFilter, RecordPaymentInput,
    TransactionFilter,
};
use localfish_db::{
    ProductRepository, RepositoryError, SaleRepository, StockRepository, TransactionRepository,
};
use localfish_shared::types::PageRequest;
use rust_decimal_macros::dec;

#[tokio::test]
#[ignore = "requires a migrated database (DATABASE_URL)"]
async fn test_sale_takes_stock_and_logs_cash() {
    let db = common::connect().await;
    let business = common::create_business(&db).await;
    let product_id = common::create_product(&db, business, dec!(10)).await;

    let sale = SaleRepository::new(db.clone())
        .create(
            business,
            business,
            CreateSaleInput {
                product_id,
                contact_id: None,
                quantity: dec!(4),
                unit_price: None,
                payment_method: PaymentMethod::Cash,
                amount_paid: None,
                sale_date: None,
                notes: None,
            },
        )
        .await
        .expect("Failed to record sale");

    assert_eq!(sale.total_amount, dec!(26.00));
    assert_eq!(sale.profit, dec!(10.00));
    assert_eq!(sale.payment_status, "paid");

    let product = ProductRepository::new(db.clone())
        .find(business, product_id)
        .await
        .unwrap();
    assert_eq!(product.quantity, dec!(6));

    let log = TransactionRepository::new(db.clone())
        .list(
            business,
            TransactionFilter {
                transaction_type: Some(TransactionType::Sale),
                ..TransactionFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(log.meta.total, 1);
    assert_eq!(log.data[0].amount, dec!(26.00));
}

#[tokio::test]
#[ignore = "requires a migrated database (DATABASE_URL)"]
async fn test_credit_sale_payment_then_delete_restores_stock() {
    let db = common::connect().await;
    let business = common::create_business(&db).await;
    let product_id = common::create_product(&db, business, dec!(5)).await;
    let sales = SaleRepository::new(db.clone());

    let sale = sales
        .create(
            business,
            business,
            CreateSaleInput {
                product_id,
                contact_id: None,
                quantity: dec!(2),
                unit_price: Some(dec!(10)),
                payment_method: PaymentMethod::Credit,
                amount_paid: None,
                sale_date: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(sale.payment_status, "pending");

    let sale = sales
        .record_payment(
            business,
            sale.id,
            business,
            RecordPaymentInput {
                amount: dec!(15),
                payment_date: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(sale.payment_status, "partial");

    sales.delete(business, sale.id, business).await.unwrap();

    let product = ProductRepository::new(db.clone())
        .find(business, product_id)
        .await
        .unwrap();
    assert_eq!(product.quantity, dec!(5));

    let reversals = TransactionRepository::new(db.clone())
        .list(
            business,
            TransactionFilter {
                transaction_type: Some(TransactionType::SaleReversal),
                ..TransactionFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(reversals.data[0].amount, dec!(15));
}

#[tokio::test]
#[ignore = "requires a migrated database (DATABASE_URL)"]
async fn test_stock_addition_and_correction_are_logged() {
    let db = common::connect().await;
    let business = common::create_business(&db).await;
    let product_id = common::create_product(&db, business, dec!(0)).await;
    let stock = StockRepository::new(db.clone());

    stock
        .add_stock(
            business,
            business,
            AddStockInput {
                product_id,
                quantity: dec!(20),
                unit_cost: dec!(3.25),
                contact_id: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let err = stock
        .correct_stock(
            business,
            business,
            CorrectStockInput {
                product_id,
                quantity_change: dec!(-21),
                reason: CorrectionReason::Damaged,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Inventory(InventoryError::InsufficientStock { .. })
    ));

    stock
        .correct_stock(
            business,
            business,
            CorrectStockInput {
                product_id,
                quantity_change: dec!(-1.5),
                reason: CorrectionReason::Damaged,
                notes: Some("Spoiled in transit".to_string()),
            },
        )
        .await
        .unwrap();

    let movements = stock
        .list_movements(
            business,
            MovementFilter {
                product_id: Some(product_id),
                ..MovementFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(movements.meta.total, 2);
    assert_eq!(movements.data[0].quantity_after, dec!(18.5));

    let purchases = TransactionRepository::new(db.clone())
        .list(
            business,
            TransactionFilter {
                transaction_type: Some(TransactionType::StockPurchase),
                ..TransactionFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(purchases.data[0].amount, dec!(65.00));
}
