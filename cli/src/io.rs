use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use squeezer_core::format::{extension_for_media_type, media_type_from_path};

use crate::error::CliError;

/// Collect all supported image files from the input path.
/// If `recursive` is true, walk subdirectories.
pub fn collect_files(input: &Path, recursive: bool) -> Result<Vec<PathBuf>, CliError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    if !input.is_dir() {
        return Err(CliError::ReadFile {
            path: input.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a file or directory"),
        });
    }

    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut files = WalkDir::new(input)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| match entry {
            Err(e) => Some(Err(CliError::from(e))),
            Ok(entry) if entry.file_type().is_file() => {
                let path = entry.into_path();
                media_type_from_path(&path).map(|_| Ok(path))
            }
            Ok(_) => None,
        })
        .collect::<Result<Vec<_>, _>>()?;

    files.sort();
    Ok(files)
}

/// Resolve the output path for a given input file.
/// If `output_base` is None, return the input path (overwrite in-place).
/// If `output_base` is a directory, mirror the relative structure.
pub fn resolve_output(input_file: &Path, input_base: &Path, output_base: Option<&Path>) -> PathBuf {
    match output_base {
        None => input_file.to_path_buf(),
        Some(out) => {
            if input_base.is_file() {
                // Single file → single output
                match input_file.file_name() {
                    Some(name) if out.extension().is_none() => out.join(name),
                    _ => out.to_path_buf(),
                }
            } else {
                // Directory → mirror structure
                let relative = input_file.strip_prefix(input_base).unwrap_or(input_file);
                out.join(relative)
            }
        }
    }
}

/// Output path for data of `media_type`: `path` itself when its extension
/// already names that type, otherwise `path` with the matching extension.
pub fn output_for_media_type(path: &Path, media_type: &str) -> PathBuf {
    let declared = media_type_from_path(path);
    if declared.is_some_and(|t| t.eq_ignore_ascii_case(media_type)) {
        return path.to_path_buf();
    }
    match extension_for_media_type(media_type) {
        Some(ext) => path.with_extension(ext),
        None => path.to_path_buf(),
    }
}

/// Create a .bak backup of the file if it exists.
pub fn create_backup(path: &Path) -> Result<(), CliError> {
    if path.exists() {
        let backup = path.with_extension(format!(
            "{}.bak",
            path.extension().unwrap_or_default().to_string_lossy()
        ));
        fs::copy(path, &backup).map_err(|e| CliError::WriteFile {
            path: backup,
            source: e,
        })?;
    }
    Ok(())
}

/// Read file contents.
pub fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|e| CliError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write file contents, creating parent directories as needed.
pub fn write_file(path: &Path, data: &[u8]) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CliError::WriteFile {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, data).map_err(|e| CliError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}
