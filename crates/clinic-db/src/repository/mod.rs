//! # Repository Module
//!
//! One repository per aggregate. Every method takes the tenant id as an
//! explicit argument: tenant resolution happens at the API boundary, never
//! ambiently inside the data layer.
//!
//! Statement helpers that the checkout transaction shares are exposed as
//! `*_with(executor, ...)` functions so the same SQL runs either on the
//! pool or inside an open transaction.

pub mod expense;
pub mod lot;
pub mod patient;
pub mod product;
pub mod professional;
pub mod report;
pub mod sale;

use uuid::Uuid;

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
