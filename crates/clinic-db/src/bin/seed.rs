//! # Seed Data Generator
//!
//! Populates the database with a realistic demo clinic for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p clinic-db --bin seed
//!
//! # Specify database path and tenant
//! cargo run -p clinic-db --bin seed -- --db ./data/clinic.db --tenant demo-clinic
//! ```
//!
//! ## Generated Data
//! - 2 professionals: one owner, one commission-based (15%)
//! - 8 patients
//! - An aesthetic catalog across the therapeutic categories:
//!   toxins, hyaluronic fillers, biostimulators, skinboosters, lipolytics
//! - 2 stock lots per product with staggered expiry dates and costs

use chrono::{Datelike, Duration, NaiveDate, Utc};
use std::env;

use clinic_core::{Patient, Product, Professional, ProfessionalProfile, StockLot};
use clinic_db::{generate_id, Database, DbConfig};

/// Catalog entries: (name, category label, list price cents, unit cost cents).
const CATALOG: &[(&str, &str, i64, i64)] = &[
    ("Botox 100U", "Toxina Botulinica", 120000, 45000),
    ("Dysport 300U", "Toxina Botulinica", 110000, 42000),
    ("Xeomin 100U", "Toxina Botulinica", 115000, 44000),
    ("Juvederm Volbella", "Preenchedor Hialuronico", 95000, 38000),
    ("Juvederm Voluma", "Preenchedor Hialuronico", 105000, 42000),
    ("Restylane Kysse", "Preenchedor Hialuronico", 90000, 36000),
    ("Sculptra", "Bioestimulador", 180000, 85000),
    ("Radiesse Duo", "Bioestimulador", 165000, 78000),
    ("Ellanse M", "Bioestimulador", 170000, 80000),
    ("Profhilo", "Skinbooster", 85000, 34000),
    ("Restylane Skinbooster", "Skinbooster", 80000, 32000),
    ("Enzima Lipolitica", "Enzimas", 45000, 12000),
    ("Soro Fisiologico 500ml", "Insumos", 2500, 800),
];

const PATIENTS: &[&str] = &[
    "Maria Souza",
    "Juliana Ferreira",
    "Camila Rodrigues",
    "Fernanda Lima",
    "Patricia Alves",
    "Renata Carvalho",
    "Beatriz Mendes",
    "Larissa Costa",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./clinic_dev.db");
    let mut tenant_id = String::from("demo-clinic");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--tenant" | "-t" => {
                if i + 1 < args.len() {
                    tenant_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Clinic Manager Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: ./clinic_dev.db)");
                println!("  -t, --tenant <ID>    Tenant to seed (default: demo-clinic)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Clinic Manager Seed Data Generator");
    println!("=====================================");
    println!("Database: {}", db_path);
    println!("Tenant:   {}", tenant_id);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing data
    let existing = db.products().count(&tenant_id).await?;
    if existing > 0 {
        println!("⚠ Tenant already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let today = now.date_naive();

    // Professionals
    println!();
    println!("Creating professionals...");

    let owner = Professional {
        id: generate_id(),
        tenant_id: tenant_id.clone(),
        name: "Dra. Ana Ribeiro".to_string(),
        profile: ProfessionalProfile::Owner,
        commission_rate_bps: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.professionals().insert(&owner).await?;

    let commissioned = Professional {
        id: generate_id(),
        tenant_id: tenant_id.clone(),
        name: "Dra. Beatriz Nogueira".to_string(),
        profile: ProfessionalProfile::CommissionBased,
        commission_rate_bps: 1500,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.professionals().insert(&commissioned).await?;

    println!("  {} (owner)", owner.name);
    println!("  {} (commission 15%)", commissioned.name);

    // Patients
    println!();
    println!("Creating patients...");

    for (idx, name) in PATIENTS.iter().enumerate() {
        let patient = Patient {
            id: generate_id(),
            tenant_id: tenant_id.clone(),
            name: name.to_string(),
            phone: Some(format!("+55 11 9{:04}-{:04}", 8000 + idx, 1000 + idx * 7)),
            notes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.patients().insert(&patient).await?;
    }
    println!("  {} patients", PATIENTS.len());

    // Catalog with lots
    println!();
    println!("Creating catalog and stock lots...");

    let start = std::time::Instant::now();
    let mut lot_count = 0;

    for (idx, (name, label, price, cost)) in CATALOG.iter().enumerate() {
        let product = Product {
            id: generate_id(),
            tenant_id: tenant_id.clone(),
            name: name.to_string(),
            category_label: label.to_string(),
            list_price_cents: *price,
            stock_minimum: 2,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;

        // Two lots per product: a near-expiry batch and a fresh one
        for (batch, months_out, quantity) in [(1, 3, 4i64), (2, 14, 10)] {
            let lot = StockLot {
                id: generate_id(),
                tenant_id: tenant_id.clone(),
                product_id: product.id.clone(),
                lot_code: format!("LOT-{:03}-{}", idx + 1, batch),
                quantity,
                unit_cost_cents: *cost,
                expiry_date: months_from(today, months_out),
                created_at: now,
                updated_at: now,
            };
            db.lots().insert(&lot).await?;
            lot_count += 1;
        }
    }

    let elapsed = start.elapsed();
    println!(
        "  {} products, {} lots in {:?}",
        CATALOG.len(),
        lot_count,
        elapsed
    );

    // Verify the alert queries see the seeded data
    println!();
    println!("Verifying alert queries...");

    let expiring = db
        .lots()
        .list_expiring_before(&tenant_id, today + Duration::days(120))
        .await?;
    println!("  Lots expiring within 120 days: {}", expiring.len());

    let low = db.products().list_below_minimum(&tenant_id).await?;
    println!("  Products below stock minimum: {}", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Adds whole months to a date, clamping the day when the target month is
/// shorter.
fn months_from(date: NaiveDate, months: u32) -> NaiveDate {
    let month0 = date.month0() + months;
    let year = date.year() + (month0 / 12) as i32;
    let month = month0 % 12 + 1;

    let mut day = date.day();
    loop {
        if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
            return d;
        }
        day -= 1;
    }
}
