//! Subcommand handlers. Each prints one pretty JSON document to stdout.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use mcqgen_core::Config;
use mcqgen_pipeline::{BatchRequest, InputFile, McqService};
use mcqgen_storage::McqStore;

use crate::cli::Command;

pub async fn run(command: Command, mut config: Config) -> Result<()> {
    match command {
        Command::Generate {
            files,
            questions,
            chunk_size,
            overlap,
            seed,
        } => {
            if seed.is_some() {
                config.selection.seed = seed;
            }
            let inputs = files
                .iter()
                .map(|path| {
                    InputFile::from_path(path)
                        .with_context(|| format!("failed to read {}", path.display()))
                })
                .collect::<Result<Vec<_>>>()?;

            let service = McqService::new(config).context("failed to start service")?;
            let request = BatchRequest {
                files: inputs,
                questions_per_pdf: questions,
                chunk_size,
                overlap,
            };
            let report = service
                .generate_batch(request)
                .await
                .context("batch generation failed")?;
            info!(
                "Generated {} questions across {} files",
                report.total_questions, report.total_files
            );
            print_json(&report)
        }

        Command::Chunks { file, seed } => {
            if seed.is_some() {
                config.selection.seed = seed;
            }
            let input = InputFile::from_path(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let service = McqService::new(config).context("failed to start service")?;
            let preview = service
                .preview_chunks(&input)
                .with_context(|| format!("failed to chunk {}", input.filename))?;
            print_json(&preview)
        }

        Command::List => {
            let store = open_store(&config)?;
            print_json(&store.list_summaries().context("failed to list records")?)
        }

        Command::Show {
            record,
            full,
            reference,
        } => {
            let store = open_store(&config)?;
            let loaded = store
                .load(&record)
                .with_context(|| format!("failed to load {record}"))?;

            if let Some(reference) = reference {
                let entry = loaded
                    .resolve_ref(&reference)
                    .with_context(|| format!("no entry at {reference} in {record}"))?;
                print_json(&entry)
            } else if full {
                print_json(&loaded)
            } else {
                print_json(&json!({
                    "filename": record,
                    "metadata": loaded.metadata,
                    "questions": loaded.question_summaries(),
                }))
            }
        }

        Command::Delete { record } => {
            let store = open_store(&config)?;
            let deleted = store
                .delete(&record)
                .with_context(|| format!("failed to delete {record}"))?;
            print_json(&json!({ "filename": record, "deleted": deleted }))
        }

        Command::ModelInfo => {
            let service = McqService::new(config).context("failed to start service")?;
            print_json(&service.model_info())
        }

        Command::Config => print_json(&json!({
            "available_profiles": Config::available_profiles(),
            "config": config.redacted_summary(),
        })),
    }
}

fn open_store(config: &Config) -> Result<McqStore> {
    McqStore::new(&config.storage.output_dir).with_context(|| {
        format!(
            "failed to open output directory {}",
            config.storage.output_dir.display()
        )
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
