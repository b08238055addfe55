//! # clinic-db: Database Layer for Clinic Manager
//!
//! SQLite persistence for Clinic Manager using sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                 clinic-core (Business Logic)                        │
//! │          Pure functions - pricing, tiers, validation                │
//! └─────────────────────────────┬───────────────────────────────────────┘
//!                               │ domain types + derived figures
//! ┌─────────────────────────────▼───────────────────────────────────────┐
//! │                 ★ clinic-db (THIS CRATE) ★                          │
//! │                                                                     │
//! │  ┌──────────┐ ┌────────────┐ ┌──────────────┐ ┌──────────────────┐  │
//! │  │   pool   │ │ migrations │ │ repositories │ │    checkout      │  │
//! │  │ sqlite + │ │  embedded  │ │ one per      │ │ one transaction: │  │
//! │  │ WAL mode │ │  via sqlx  │ │ aggregate    │ │ sale + debit +   │  │
//! │  │          │ │            │ │              │ │ commission       │  │
//! │  └──────────┘ └────────────┘ └──────────────┘ └──────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Repository pattern**: one repository per aggregate, constructed
//!    from the shared pool via [`Database`]
//! 2. **Explicit tenancy**: every method takes `tenant_id`; no ambient
//!    "current tenant" state anywhere
//! 3. **Transactions where it matters**: checkout either fully records a
//!    sale (header, lines, debits, ledger, commission) or records nothing
//! 4. **Derived figures are frozen**: the database stores what clinic-core
//!    computed, it never recomputes

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use checkout::{Checkout, CheckoutLine, CheckoutOutcome, CheckoutRequest};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::expense::ExpenseRepository;
pub use repository::generate_id;
pub use repository::lot::LotRepository;
pub use repository::patient::PatientRepository;
pub use repository::product::{ProductRepository, ProductStockLevel};
pub use repository::professional::ProfessionalRepository;
pub use repository::report::{CategoryRevenue, MonthlyRevenue, PeriodSummary, ReportRepository};
pub use repository::sale::SaleRepository;
