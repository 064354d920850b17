use std::collections::HashSet;

use myfit_store::infra::config;
use myfit_store::storage::codec;
use myfit_store::{ArrayFileStore, ModelRegistry};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--init-missing]\n\
         \n\
         Reads env vars (all optional):\n\
           MYFIT_DATA_DIR (default: data)\n\
         \n\
         Checks that every collection file exists, holds a JSON array,\n\
         and that every record has a unique id.\n"
    );
    std::process::exit(2);
}

/// Problems found in one collection file.
fn check_collection(store: &ArrayFileStore) -> anyhow::Result<(usize, Vec<String>)> {
    let body = store.load()?;
    let records = codec::split_into_records(&body)?;

    let mut problems = Vec::new();
    let mut seen = HashSet::new();
    for (index, record) in records.iter().enumerate() {
        match codec::extract_id(record) {
            Ok(id) => {
                if !seen.insert(id.clone()) {
                    problems.push(format!("record #{} repeats id {}", index, id));
                }
            }
            Err(e) => problems.push(format!("record #{}: {}", index, e)),
        }
        if !record.starts_with('{') || !record.ends_with('}') {
            problems.push(format!("record #{} is not a flat object: {}", index, record));
        }
    }
    Ok((records.len(), problems))
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let init_missing = args.iter().any(|a| a == "--init-missing");

    let data_dir = config::data_dir();
    println!("> Preflight:");
    println!("  MYFIT_DATA_DIR={}", data_dir.display());

    let registry = ModelRegistry::with_defaults();
    let mut failures = 0usize;
    for model in registry.models() {
        let store = ArrayFileStore::new(data_dir.join(model.file_name()));
        if !store.path().exists() {
            if init_missing {
                store.ensure_initialized()?;
                println!("  {}: created {}", model.name(), store.path().display());
            } else {
                println!("  {}: MISSING {}", model.name(), store.path().display());
                failures += 1;
                continue;
            }
        }

        match check_collection(&store) {
            Ok((count, problems)) if problems.is_empty() => {
                println!("  {}: {} records, ok", model.name(), count);
            }
            Ok((count, problems)) => {
                println!("  {}: {} records, {} problems", model.name(), count, problems.len());
                for p in &problems {
                    println!("    - {}", p);
                }
                failures += 1;
            }
            Err(e) => {
                println!("  {}: unreadable: {}", model.name(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(anyhow::anyhow!(
            "{} collection(s) failed preflight. Re-run with --init-missing to create absent files",
            failures
        ));
    }
    println!("> Preflight OK.");
    Ok(())
}
