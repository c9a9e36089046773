//! Verify command implementation.

use serde::Serialize;
use trustledger_canonical::Canonicalizer;
use trustledger_journal::{verify_value, JournalReader, ReadMode};

use crate::errors::CliError;
use crate::output::truncate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Verdict {
    Ok,
    /// Stored id differs from the recomputed one.
    Mismatch,
    /// Id present and correct but `seq` breaks the sequence.
    OutOfSequence,
    /// Id missing or not computable.
    Invalid,
}

#[derive(Serialize)]
struct RecordResult {
    position: u64,
    seq: Option<u64>,
    kind: String,
    event_id: String,
    verdict: Verdict,
}

pub fn run(journal: String, strict: bool, json_output: bool) -> Result<(), CliError> {
    let canonicalizer = Canonicalizer::ledger();
    let mut reader = JournalReader::open(&journal, ReadMode::Strict)?;

    let mut results = Vec::new();
    let mut position = 0;
    while let Some(value) = reader.read_value()? {
        let seq = value.get("seq").and_then(|v| v.as_u64());
        let kind = value
            .get("kind")
            .and_then(|v| v.as_str())
            .unwrap_or("?")
            .to_string();
        let event_id = value
            .get("event_id")
            .and_then(|v| v.get("b64"))
            .and_then(|v| v.as_str())
            .unwrap_or("?")
            .to_string();

        let verdict = match verify_value(&value, &canonicalizer) {
            Ok(true) if seq == Some(position) => Verdict::Ok,
            Ok(true) => Verdict::OutOfSequence,
            Ok(false) => Verdict::Mismatch,
            Err(e) => {
                if !json_output {
                    eprintln!("Error verifying record {}: {}", position, e);
                }
                Verdict::Invalid
            }
        };
        results.push(RecordResult {
            position,
            seq,
            kind,
            event_id,
            verdict,
        });
        position += 1;
    }

    let failures = results.iter().filter(|r| r.verdict != Verdict::Ok).count();
    if json_output {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!("{:<6} {:<24} {:<44} {}", "SEQ", "KIND", "EVENT_ID", "VERDICT");
        println!("{}", "-".repeat(90));
        for r in &results {
            let seq = r.seq.map_or_else(|| "?".to_string(), |s| s.to_string());
            println!(
                "{:<6} {:<24} {:<44} {:?}",
                seq,
                r.kind,
                truncate(&r.event_id, 44),
                r.verdict
            );
        }
        println!("{} records, {} failed", results.len(), failures);
    }

    if strict && failures > 0 {
        return Err(CliError::Failed(format!(
            "{} of {} records failed verification",
            failures,
            results.len()
        )));
    }
    Ok(())
}
