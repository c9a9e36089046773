//! Audit command implementation.

use trustledger_core::ScoreAudit;
use trustledger_journal::{JournalReader, ReadMode};

use crate::errors::CliError;
use crate::output::short;

pub fn run(journal: String, json: bool, strict: bool) -> Result<(), CliError> {
    let mut reader = JournalReader::open(&journal, ReadMode::Strict)?;
    let mut audit = ScoreAudit::new();
    while let Some(record) = reader.read_record()? {
        audit.observe(&record.notification);
    }
    let report = audit.finish();
    tracing::info!(
        notifications = report.notifications,
        reviews = report.reviews,
        violations = report.violations.len(),
        "audit finished"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{:<16} {:<8} {:>8} {:>10} {:>8} {:>10}",
            "PRODUCT", "ACTIVE", "REVIEWS", "SUM", "AVERAGE", "BROADCASTS"
        );
        println!("{}", "-".repeat(66));
        for (product_id, product) in &report.products {
            println!(
                "{:<16} {:<8} {:>8} {:>10} {:>8} {:>10}",
                short(product_id),
                product.is_active,
                product.total_reviews,
                product.sum_of_ratings,
                product.average_rating,
                product.broadcasts
            );
        }
        for violation in &report.violations {
            println!("violation: {}", serde_json::to_string(violation)?);
        }
        println!(
            "{} notifications, {} reviews, {} violations",
            report.notifications,
            report.reviews,
            report.violations.len()
        );
    }

    if strict && !report.is_clean() {
        return Err(CliError::Failed(format!(
            "audit found {} violations",
            report.violations.len()
        )));
    }
    Ok(())
}
