//! Core business logic for Local Fishing.
//!
//! This crate contains pure business logic with no web or database dependencies.
//! Domain enums, stock and payment rules, report aggregation and rendering live here.
//!
//! # Modules
//!
//! - `auth` - Roles and password hashing
//! - `inventory` - Stock movements and quantity rules
//! - `sales` - Sale amounts and payment status
//! - `finance` - Expenses, deposits and the cash transaction log
//! - `reports` - Report filters, aggregation and PDF output
//! - `storage` - Product image uploads to Cloudinary

pub mod auth;
pub mod finance;
pub mod inventory;
pub mod reports;
pub mod sales;
pub mod storage;
