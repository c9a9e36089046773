//! Output formatting utilities.

use trustledger_core::{Notification, NotificationRecord};

/// Prints the table header for `list`.
#[allow(clippy::print_literal)]
pub fn print_table_header() {
    println!(
        "{:<6} {:<24} {:<20} {}",
        "SEQ", "KIND", "AT", "DETAIL"
    );
    println!("{}", "-".repeat(100));
}

/// Formats a record as a table row.
pub fn format_table_row(record: &NotificationRecord) -> String {
    let notification = &record.notification;
    format!(
        "{:<6} {:<24} {:<20} {}",
        record.seq,
        notification.kind(),
        format_time(notification.at().as_secs()),
        detail(notification)
    )
}

fn format_time(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| format!("@{}", secs))
}

fn detail(notification: &Notification) -> String {
    match notification {
        Notification::ProductCreated {
            product_id, vendor, ..
        } => format!("{} vendor={}", short(product_id), short(vendor)),
        Notification::ProductStatusChanged {
            product_id,
            is_active,
            ..
        } => format!("{} active={}", short(product_id), is_active),
        Notification::ReviewPosted {
            review_id,
            product_id,
            rating,
            ..
        } => format!("#{} {} rating={}", review_id, short(product_id), rating),
        Notification::TrustScoreUpdated {
            product_id,
            average_rating,
            total_reviews,
            ..
        } => format!(
            "{} average={} total={}",
            short(product_id),
            average_rating,
            total_reviews
        ),
        Notification::TrustScoreBroadcast {
            message_id,
            product_id,
            destination_domain,
            ..
        } => format!(
            "{} -> domain {} message={}",
            short(product_id),
            destination_domain,
            short(message_id)
        ),
        Notification::RoleGranted { role, account, .. } => {
            format!("+{} {}", role, short(account))
        }
        Notification::RoleRevoked { role, account, .. } => {
            format!("-{} {}", role, short(account))
        }
        Notification::Paused { by, .. } | Notification::Unpaused { by, .. } => {
            format!("by {}", short(by))
        }
    }
}

/// Shortens a hex identifier to its first and last four digits.
pub fn short(id: &impl ToString) -> String {
    let s = id.to_string();
    if s.len() <= 14 {
        s
    } else {
        format!("{}..{}", &s[..6], &s[s.len() - 4..])
    }
}

/// Truncates with an ellipsis.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}
