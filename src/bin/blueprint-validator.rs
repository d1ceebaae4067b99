//! # Blueprint Validator
//!
//! A command-line utility for checking blueprint files before they are
//! deployed to the blueprint root.
//!
//! ## Overview
//!
//! The validator scans a directory the same way the engine does and then
//! dry-runs every blueprint it finds:
//! - Files that are hidden, empty, unparseable or of another version are
//!   skipped, exactly as discovery would skip them
//! - `!Context` and `!Format` tags are resolved against the document context
//! - Every entry is checked against the built-in model registry
//!
//! Nothing is written anywhere; validation runs against empty in-memory
//! storage.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin blueprint-validator ./blueprints/
//! ```
//!
//! ## Output Examples
//!
//! ```text
//! Validating blueprints in directory: ./blueprints/
//!
//! Validating: system/bootstrap.yaml
//!   ✓ Valid - Bootstrap (3 entries, 9b71d224bd62)
//!
//! Validating: example/broken.yaml
//!   ❌ entry_invalid index=0 model=idp_core.widget reason=unknown model
//!
//! Validation Summary:
//!   Valid blueprints: 1
//!   Invalid blueprints: 1
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: All blueprints are valid
//! - `1`: One or more blueprints are invalid or the scan failed

use idp_engine::blueprints::importer::{Importer, LogLevel, ModelRegistry};
use idp_engine::blueprints::{BlueprintFile, BlueprintScanner};
use idp_engine::storage::InMemoryStorage;
use serde_json::Map;
use std::env;
use std::path::Path;
use std::process;

const VALIDATION_TENANT: &str = "validation";

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <blueprint-directory>", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} ./blueprints/", args[0]);
        process::exit(1);
    }

    let root = Path::new(&args[1]);
    if !root.is_dir() {
        eprintln!("Error: '{}' is not a directory", root.display());
        process::exit(1);
    }

    println!("Validating blueprints in directory: {}", root.display());
    println!();

    let blueprints = match BlueprintScanner::new(root).find() {
        Ok(blueprints) => blueprints,
        Err(error) => {
            eprintln!("❌ Scan failed: {}", error);
            process::exit(1);
        }
    };

    let models = ModelRegistry::default();
    let mut valid_count = 0;
    let mut invalid_count = 0;

    for blueprint in &blueprints {
        println!("Validating: {}", blueprint.path);
        match validate_blueprint(root, blueprint, &models).await {
            Ok(summary) => {
                println!("  ✓ Valid - {}", summary);
                valid_count += 1;
            }
            Err(problems) => {
                for problem in problems {
                    println!("  ❌ {}", problem);
                }
                invalid_count += 1;
            }
        }
        println!();
    }

    println!("Validation Summary:");
    println!("  Valid blueprints: {}", valid_count);
    println!("  Invalid blueprints: {}", invalid_count);

    if invalid_count > 0 {
        process::exit(1);
    }
}

async fn validate_blueprint(
    root: &Path,
    blueprint: &BlueprintFile,
    models: &ModelRegistry,
) -> Result<String, Vec<String>> {
    let content = std::fs::read_to_string(root.join(&blueprint.path))
        .map_err(|e| vec![format!("Failed to read file: {}", e)])?;
    let importer =
        Importer::from_string(&content, &Map::new()).map_err(|e| vec![e.to_string()])?;

    let storage = InMemoryStorage::new();
    let (valid, logs) = importer
        .validate(&storage, VALIDATION_TENANT, models)
        .await
        .map_err(|e| vec![e.to_string()])?;

    if !valid {
        return Err(logs
            .iter()
            .filter(|event| event.log_level >= LogLevel::Warning)
            .map(ToString::to_string)
            .collect());
    }

    let name = blueprint
        .meta
        .as_ref()
        .map(|meta| meta.name.as_str())
        .unwrap_or(blueprint.path.as_str());
    Ok(format!(
        "{} ({} entries, {})",
        name,
        importer.blueprint().entries.len(),
        &blueprint.hash[..12]
    ))
}
