//! Form submission demo
//!
//! Renders an Invoice or JSA from input JSON and uploads the PDF.
//!
//! Usage:
//!   cargo run --example render_form -- <invoice|jsa> <input.json> [store_dir]
//!
//! With `store_dir` the document is written under that directory instead of
//! S3. Without it, AWS credentials are read from `AWS_ACCESS_KEY_ID`,
//! `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN`; other settings come from
//! the `FORMS_*` variables (see `PipelineConfig::from_env`).

use form_storage::{FileSystemStore, ObjectStore, StaticCredentials};
use forms::{FormPipeline, FormType, PipelineConfig};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

async fn submit<S: ObjectStore>(
    pipeline: FormPipeline<S>,
    form_type: FormType,
    data: &Value,
) -> Result<(), Box<dyn std::error::Error>> {
    let submission = pipeline.submit(form_type, data).await?;
    let report = &submission.report;

    println!("Uploaded: {}", submission.upload.uri);
    println!(
        "  pages: {}, fields: {}, rows: {}, note lines: {}",
        report.pages, report.fields_drawn, report.table_rows, report.notes_lines
    );
    println!(
        "  signatures: {} embedded, {} skipped",
        report.embedded_signatures, report.skipped_signatures
    );
    if report.template_fallback {
        println!("  template missing, rendered on a blank page");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <invoice|jsa> <input.json> [store_dir]", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  cargo run --example render_form -- invoice input/invoice.json output");
        eprintln!("  cargo run --example render_form -- jsa input/jsa.json");
        std::process::exit(1);
    }

    let form_type: FormType = args[1].parse()?;
    let input_path = &args[2];
    let input_json = std::fs::read_to_string(input_path)
        .map_err(|e| format!("Failed to read input '{}': {}", input_path, e))?;
    let data: Value = serde_json::from_str(&input_json)?;

    let config = PipelineConfig::from_env()?;

    match args.get(3) {
        Some(store_dir) => {
            let store = FileSystemStore::new(store_dir);
            submit(FormPipeline::new(config, store), form_type, &data).await
        }
        None => {
            let store = config.s3_store(StaticCredentials::from_env()?);
            submit(FormPipeline::new(config, store), form_type, &data).await
        }
    }
}
