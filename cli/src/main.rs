use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use squeezer::cli::{to_options, Cli, Command};
use squeezer::io::{collect_files, resolve_output};
use squeezer::process::process_file;
use squeezer::report::{FileResult, Report};
use squeezer_core::capability::{candidates, CAPABILITIES};
use squeezer_core::{CompressOptions, Compressor, MediaCategory};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Command::Compress {
            input,
            output,
            quality,
            mode,
            target_width,
            target_height,
            max_width,
            max_height,
            preserve_exif,
            recursive,
            backup,
            dry_run,
            report,
        } => {
            let options = to_options(
                quality,
                mode,
                target_width,
                target_height,
                max_width,
                max_height,
                preserve_exif,
            );
            let batch = Batch {
                recursive,
                backup,
                dry_run,
                print_report: report,
            };
            handle_compress(&input, output.as_deref(), &batch, &options).await
        }
        Command::Strategies => {
            handle_strategies();
            Ok(())
        }
    }
}

/// File-level switches of one `compress` run.
struct Batch {
    recursive: bool,
    backup: bool,
    dry_run: bool,
    print_report: bool,
}

async fn handle_compress(
    input: &Path,
    output: Option<&Path>,
    batch: &Batch,
    options: &CompressOptions,
) -> Result<()> {
    let Batch {
        recursive,
        backup,
        dry_run,
        print_report,
    } = *batch;
    let compressor = Compressor::new();

    let files = collect_files(input, recursive).context("Failed to collect input files")?;

    if files.is_empty() {
        println!("No supported files found.");
        return Ok(());
    }

    println!("Found {} file(s) to process.", files.len());

    if dry_run {
        println!("[dry-run] Would process:");
        for f in &files {
            let out = resolve_output(f, input, output);
            println!("  {} → {}", f.display(), out.display());
        }
        return Ok(());
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("█▓░"),
    );

    let mut report = Report::new();

    for input_path in &files {
        let output_path = resolve_output(input_path, input, output);

        let result = process_file(
            &compressor,
            input_path,
            &output_path,
            backup,
            print_report,
            options,
            &pb,
        )
        .await;

        match result {
            Ok(file_result) => {
                pb.set_message(format!(
                    "{} ({:.1}%)",
                    input_path.file_name().unwrap_or_default().to_string_lossy(),
                    file_result.savings_pct()
                ));
                report.add(file_result);
            }
            Err(e) => {
                log::error!("Error processing {}: {:#}", input_path.display(), e);
                report.add(FileResult {
                    path: input_path.clone(),
                    written_to: None,
                    original_size: 0,
                    compressed_size: 0,
                    tool: String::new(),
                    error: Some(format!("{:#}", e)),
                });
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done!");
    report.print_summary();

    Ok(())
}

fn handle_strategies() {
    println!("Strategies:");
    for cap in &CAPABILITIES {
        let categories: Vec<_> = cap.categories.iter().map(|c| c.as_str()).collect();
        println!(
            "  {:<18} categories: {:<20} keeps EXIF: {}",
            cap.id.as_str(),
            categories.join(", "),
            if cap.preserves_metadata { "yes" } else { "no" }
        );
    }

    println!("\nCandidates by category (priority order):");
    for category in MediaCategory::ALL {
        let ids: Vec<_> = candidates(category).iter().map(|id| id.as_str()).collect();
        println!("  {:<6} {}", category.as_str(), ids.join(" → "));
    }
}
