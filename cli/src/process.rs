use std::path::Path;

use anyhow::Result;
use indicatif::ProgressBar;

use squeezer_core::{CompressOptions, Compressor, NamedFile, Outcome, Representation, Winner};

use crate::io::{create_backup, output_for_media_type, read_file, write_file};
use crate::report::FileResult;

/// Compress one file and write the kept result.
///
/// A winner in another format than the input is written next to
/// `output_path` with the matching extension, so an in-place run never
/// replaces a file with bytes of a different format.
pub async fn process_file(
    compressor: &Compressor,
    input_path: &Path,
    output_path: &Path,
    backup: bool,
    print_report: bool,
    options: &CompressOptions,
    pb: &ProgressBar,
) -> Result<FileResult> {
    let data = read_file(input_path)?;
    let original_size = data.len() as u64;
    let file = NamedFile::from_path(input_path, data);

    let telemetry = match compressor.compress(file, options).await? {
        Outcome::Report(telemetry) => telemetry,
        Outcome::Single(_) => anyhow::bail!("compressor returned no comparison report"),
    };
    if print_report {
        pb.suspend(|| match serde_json::to_string_pretty(&telemetry) {
            Ok(json) => println!("{}: {}", input_path.display(), json),
            Err(e) => log::warn!("Could not serialize report: {}", e),
        });
    }

    let blob = match telemetry.best_result {
        Representation::Blob(blob) => blob,
        other => anyhow::bail!("unexpected result representation {}", other.kind()),
    };
    let compressed_size = blob.len() as u64;

    let target = output_for_media_type(output_path, &blob.media_type);

    // Nothing to write when the original is kept in place
    let written_to = if telemetry.best_tool == Winner::Original && target == input_path {
        None
    } else {
        if target != output_path {
            log::info!(
                "{} won with {}, writing {}",
                telemetry.best_tool,
                blob.media_type,
                target.display()
            );
        }
        if backup {
            create_backup(&target)?;
        }
        write_file(&target, &blob.data)?;
        Some(target)
    };

    Ok(FileResult {
        path: input_path.to_path_buf(),
        written_to,
        original_size,
        compressed_size,
        tool: telemetry.best_tool.to_string(),
        error: None,
    })
}
