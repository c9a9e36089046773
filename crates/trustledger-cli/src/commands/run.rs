//! Run command implementation.

use serde::Serialize;
use trustledger_core::{InMemoryGateway, LedgerConfig, TrustLedger};
use trustledger_journal::{JournalWriter, WriteOptions};

use crate::errors::CliError;
use crate::script::Script;

#[derive(Serialize)]
struct OpResult {
    index: usize,
    op: &'static str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    records: u64,
}

pub fn run(
    script_path: String,
    journal: String,
    config_path: Option<String>,
    sync: bool,
    truncate: bool,
    json: bool,
) -> Result<(), CliError> {
    let script = Script::load(&script_path)?;
    let config = match (config_path, script.config) {
        (Some(path), _) => LedgerConfig::load(path)?,
        (None, Some(config)) => config,
        (None, None) => {
            return Err(CliError::Script(
                "no ledger config: pass --config or add \"config\" to the script".to_string(),
            ))
        }
    };
    config.validate()?;

    let mut ledger = TrustLedger::from_config(&config);
    let mut gateway = InMemoryGateway::new(config.gateway.clone());
    let mut writer = JournalWriter::open(
        &journal,
        WriteOptions {
            sync,
            append: !truncate,
            ..WriteOptions::default()
        },
    )?;
    // Every run starts a fresh ledger, so its history cannot follow another one.
    if writer.next_seq() > 0 {
        return Err(CliError::Script(format!(
            "journal {} already holds {} records; pass --truncate to replace them",
            journal,
            writer.next_seq()
        )));
    }
    tracing::info!(
        script = %script_path,
        journal = %journal,
        operations = script.operations.len(),
        first_seq = writer.next_seq(),
        "running script"
    );

    let mut results = Vec::with_capacity(script.operations.len());
    for (index, op) in script.operations.iter().enumerate() {
        let outcome = op.apply(&mut ledger, &mut gateway);
        let mut records = 0;
        // Rejected operations leave the outbox empty; committed ones are journaled.
        for notification in ledger.drain_notifications() {
            writer.append_notification(notification)?;
            records += 1;
        }
        results.push(match outcome {
            Ok(detail) => OpResult {
                index,
                op: op.name(),
                ok: true,
                detail: Some(detail),
                code: None,
                error: None,
                records,
            },
            Err(e) => OpResult {
                index,
                op: op.name(),
                ok: false,
                detail: None,
                code: Some(e.code()),
                error: Some(e.to_string()),
                records,
            },
        });
    }
    writer.finish()?;

    let failed = results.iter().filter(|r| !r.ok).count();
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for r in &results {
            match (&r.detail, r.code, &r.error) {
                (Some(detail), _, _) => println!("{:>4} ok   {:<12} {}", r.index, r.op, detail),
                (_, Some(code), Some(error)) => {
                    println!("{:>4} FAIL {:<12} {} {}", r.index, r.op, code, error)
                }
                _ => {}
            }
        }
        println!(
            "{} operations, {} applied, {} rejected, {} sent",
            results.len(),
            results.len() - failed,
            failed,
            gateway.sent().len()
        );
    }
    Ok(())
}
