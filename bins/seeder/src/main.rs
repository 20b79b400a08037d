//! Demo data seeder for local development.
//!
//! Creates one business with catalog, contacts, opening stock, a restock,
//! a couple of sales, and an expense. Everything goes through the
//! repositories, so stock movements and transactions are recorded exactly
//! as the API would record them.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use localfish_core::auth::hash_password;
use localfish_core::finance::{ContactType, ExpenseStatus};
use localfish_core::sales::PaymentMethod;
use localfish_db::entities::products;
use localfish_db::{
    AddStockInput, CategoryInput, ContactInput, ContactRepository, CreateProductInput,
    CreateSaleInput, CreateUserInput, ExpenseCategoryRepository, ExpenseInput, ExpenseRepository,
    ProductCategoryRepository, ProductRepository, SaleRepository, StockRepository,
    UserRepository,
};

/// Login of the demo owner.
const DEMO_EMAIL: &str = "demo@localfish.dev";
/// Password of the demo owner.
const DEMO_PASSWORD: &str = "fisherman123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = localfish_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let users = UserRepository::new(db.clone());
    if users.email_exists(DEMO_EMAIL).await? {
        println!("Demo business already exists, skipping...");
        return Ok(());
    }

    println!("Seeding demo business...");
    let owner = users
        .create(CreateUserInput {
            email: DEMO_EMAIL.to_string(),
            password_hash: hash_password(DEMO_PASSWORD)?,
            business_name: "Lakeside Fresh Fish".to_string(),
            phone_number: Some("+256700000001".to_string()),
        })
        .await?;

    println!("Seeding catalog...");
    let catalog = seed_catalog(&db, owner.id).await?;

    println!("Seeding contacts...");
    let contacts = ContactRepository::new(db.clone());
    let supplier = contacts
        .create(
            owner.id,
            ContactInput {
                name: "Kasenyi Landing Co-op".to_string(),
                contact_type: ContactType::Supplier,
                email: None,
                phone_number: Some("+256700000010".to_string()),
                address: Some("Kasenyi landing site".to_string()),
                notes: None,
            },
        )
        .await?;
    let customer = contacts
        .create(
            owner.id,
            ContactInput {
                name: "Mama Grace Restaurant".to_string(),
                contact_type: ContactType::Customer,
                email: Some("grace@example.com".to_string()),
                phone_number: Some("+256700000020".to_string()),
                address: None,
                notes: Some("Buys on credit, settles weekly".to_string()),
            },
        )
        .await?;

    println!("Seeding stock and sales...");
    let stock = StockRepository::new(db.clone());
    stock
        .add_stock(
            owner.id,
            owner.id,
            AddStockInput {
                product_id: catalog.tilapia.id,
                quantity: Decimal::new(25, 0),
                unit_cost: Decimal::new(8_500, 0),
                contact_id: Some(supplier.id),
                notes: Some("Morning catch".to_string()),
            },
        )
        .await?;

    let sales = SaleRepository::new(db.clone());
    let today = Utc::now().date_naive();
    sales
        .create(
            owner.id,
            owner.id,
            CreateSaleInput {
                product_id: catalog.tilapia.id,
                contact_id: None,
                quantity: Decimal::new(45, 1),
                unit_price: None,
                payment_method: PaymentMethod::Cash,
                amount_paid: None,
                sale_date: Some(today - Duration::days(1)),
                notes: None,
            },
        )
        .await?;
    sales
        .create(
            owner.id,
            owner.id,
            CreateSaleInput {
                product_id: catalog.silverfish.id,
                contact_id: Some(customer.id),
                quantity: Decimal::new(10, 0),
                unit_price: None,
                payment_method: PaymentMethod::Credit,
                amount_paid: Some(Decimal::new(20_000, 0)),
                sale_date: Some(today),
                notes: Some("Balance due Friday".to_string()),
            },
        )
        .await?;

    println!("Seeding expenses...");
    let fuel = ExpenseCategoryRepository::new(db.clone())
        .create(
            owner.id,
            CategoryInput {
                name: "Fuel".to_string(),
                description: Some("Boat and delivery fuel".to_string()),
            },
        )
        .await?;
    ExpenseRepository::new(db.clone())
        .create(
            owner.id,
            owner.id,
            ExpenseInput {
                category_id: Some(fuel.id),
                title: "Outboard engine fuel".to_string(),
                amount: Decimal::new(60_000, 0),
                payment_status: ExpenseStatus::Paid,
                payment_method: Some(PaymentMethod::Cash),
                expense_date: today,
                notes: None,
            },
        )
        .await?;

    println!("Seeding complete! Log in as {DEMO_EMAIL} / {DEMO_PASSWORD}");
    Ok(())
}

struct Catalog {
    tilapia: products::Model,
    silverfish: products::Model,
}

async fn seed_catalog(db: &DatabaseConnection, business_id: Uuid) -> anyhow::Result<Catalog> {
    let categories = ProductCategoryRepository::new(db.clone());
    let fresh = categories
        .create(
            business_id,
            CategoryInput {
                name: "Fresh Fish".to_string(),
                description: Some("Sold on the day of the catch".to_string()),
            },
        )
        .await?;
    let dried = categories
        .create(
            business_id,
            CategoryInput {
                name: "Dried Fish".to_string(),
                description: None,
            },
        )
        .await?;

    let products = ProductRepository::new(db.clone());
    let tilapia = products
        .create(
            business_id,
            business_id,
            CreateProductInput {
                category_id: Some(fresh.id),
                name: "Tilapia".to_string(),
                sku: Some("FF-TIL".to_string()),
                unit: "kg".to_string(),
                quantity: Decimal::new(40, 0),
                cost_price: Decimal::new(8_000, 0),
                selling_price: Decimal::new(12_000, 0),
                low_stock_threshold: Decimal::new(10, 0),
            },
        )
        .await?;
    products
        .create(
            business_id,
            business_id,
            CreateProductInput {
                category_id: Some(fresh.id),
                name: "Nile Perch".to_string(),
                sku: Some("FF-NPE".to_string()),
                unit: "kg".to_string(),
                quantity: Decimal::new(3, 0),
                cost_price: Decimal::new(11_000, 0),
                selling_price: Decimal::new(16_000, 0),
                low_stock_threshold: Decimal::new(5, 0),
            },
        )
        .await?;
    let silverfish = products
        .create(
            business_id,
            business_id,
            CreateProductInput {
                category_id: Some(dried.id),
                name: "Silverfish (Mukene)".to_string(),
                sku: Some("DF-MUK".to_string()),
                unit: "basin".to_string(),
                quantity: Decimal::new(30, 0),
                cost_price: Decimal::new(4_000, 0),
                selling_price: Decimal::new(6_500, 0),
                low_stock_threshold: Decimal::new(5, 0),
            },
        )
        .await?;

    Ok(Catalog {
        tilapia,
        silverfish,
    })
}
