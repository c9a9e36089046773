//! List command implementation.

use trustledger_journal::{JournalReader, ReadMode};

use crate::errors::CliError;
use crate::output;

pub fn run(
    journal: String,
    json: bool,
    kind: Option<String>,
    max_events: Option<u64>,
) -> Result<(), CliError> {
    let mut reader = JournalReader::open(&journal, ReadMode::Strict)?;

    if !json {
        output::print_table_header();
    }

    let mut shown: u64 = 0;
    while let Some(record) = reader.read_record()? {
        if max_events.is_some_and(|max| shown >= max) {
            break;
        }
        if kind
            .as_deref()
            .is_some_and(|k| k != record.notification.kind())
        {
            continue;
        }

        if json {
            println!("{}", serde_json::to_string(&record)?);
        } else {
            println!("{}", output::format_table_row(&record));
        }
        shown += 1;
    }

    Ok(())
}
