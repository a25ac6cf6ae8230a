//! # Seed Data Generator
//!
//! Populates a database with sample discounts for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./cartwise_dev.db (default)
//! cargo run -p cartwise-db --bin seed
//!
//! # Specify database path
//! cargo run -p cartwise-db --bin seed -- --db ./data/cartwise.db
//! ```
//!
//! ## Generated Discounts
//! - High / Medium / Low priority discounts gated on a $100 minimum spend
//! - A buy-one-get-one discount scoped to product 1
//! - A second-item-half-price discount scoped to product 2
//!
//! After seeding, the eligible set for a $150 cart is printed in ranked
//! order together with the composed total.

use chrono::{Duration, Utc};
use std::env;

use cartwise_core::{
    compose, rank, CartContext, Condition, DiscountKind, EligibilityQuery, LineItems,
    MembershipPolicy, Money, NewDiscount, PRIORITY_HIGH, PRIORITY_LOW, PRIORITY_MEDIUM,
};
use cartwise_db::{Database, DbConfig, DiscountRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./cartwise_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Cartwise Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./cartwise_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Cartwise Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let repo = db.discounts();

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = repo.count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} discounts", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
    } else {
        let now = Utc::now();
        for discount in sample_discounts(now) {
            let created = repo.create(discount, now).await?;
            println!("  + #{} {} ({})", created.id, created.name, created.kind);
        }
        println!();
        println!("✓ Seeded sample discounts");
    }

    // Sample cart: $150, anonymous, no product filter
    let starting = Money::from_cents(15_000);
    let ctx = CartContext::default().with_cart_total(starting);
    let query = EligibilityQuery::for_cart(&ctx, &MembershipPolicy::default(), Utc::now());
    let ranked = rank(repo.find_eligible(&query).await?);

    println!();
    println!("Eligible for a {} cart:", starting);
    for discount in &ranked {
        println!(
            "  [{}] {} {} value={} stackable={}",
            discount.priority, discount.name, discount.kind, discount.value, discount.stackable
        );
    }

    let composition = compose(&ranked, starting, &LineItems::new(1, starting));
    println!();
    println!(
        "Composed total: {} (saves {})",
        composition.final_amount,
        composition.savings()
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn sample_discounts(now: chrono::DateTime<Utc>) -> Vec<NewDiscount> {
    let start = now - Duration::minutes(1);
    let end = now + Duration::days(30);
    let min_spend = Condition::CartTotal {
        minimum: Money::from_cents(10_000),
    };

    vec![
        NewDiscount::new("High Priority Discount", DiscountKind::Percentage, 10.0, start, end)
            .priority(PRIORITY_HIGH)
            .max_usage(100)
            .condition(min_spend.clone()),
        NewDiscount::new("Medium Priority Discount", DiscountKind::Fixed, 5.0, start, end)
            .priority(PRIORITY_MEDIUM)
            .stackable(true)
            .max_usage(50)
            .condition(min_spend.clone()),
        NewDiscount::new("Low Priority Discount", DiscountKind::Threshold, 20.0, start, end)
            .priority(PRIORITY_LOW)
            .stackable(true)
            .condition(min_spend),
        NewDiscount::new("Buy One Get One", DiscountKind::Bogo, 1.0, start, end)
            .priority(PRIORITY_MEDIUM)
            .product(1),
        NewDiscount::new("Second Item Half Price", DiscountKind::MultiItem, 50.0, start, end)
            .priority(PRIORITY_LOW)
            .product(2),
    ]
}
