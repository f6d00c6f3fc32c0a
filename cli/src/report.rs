use std::path::PathBuf;

/// Result of processing a single file.
pub struct FileResult {
    pub path: PathBuf,
    /// Where the kept output was written, `None` when nothing was written
    pub written_to: Option<PathBuf>,
    pub original_size: u64,
    pub compressed_size: u64,
    /// Strategy that produced the kept output, or "original"
    pub tool: String,
    pub error: Option<String>,
}

impl FileResult {
    pub fn savings_pct(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_size as f64 / self.original_size as f64) * 100.0
    }

    pub fn kept_original(&self) -> bool {
        self.error.is_none() && self.tool == "original"
    }
}

/// Aggregate report for all processed files.
#[derive(Default)]
pub struct Report {
    pub results: Vec<FileResult>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: FileResult) {
        self.results.push(result);
    }

    fn ok(&self) -> impl Iterator<Item = &FileResult> {
        self.results.iter().filter(|r| r.error.is_none())
    }

    pub fn total_original(&self) -> u64 {
        self.ok().map(|r| r.original_size).sum()
    }

    pub fn total_compressed(&self) -> u64 {
        self.ok().map(|r| r.compressed_size).sum()
    }

    pub fn total_savings_pct(&self) -> f64 {
        let orig = self.total_original();
        if orig == 0 {
            return 0.0;
        }
        (1.0 - self.total_compressed() as f64 / orig as f64) * 100.0
    }

    pub fn success_count(&self) -> usize {
        self.ok().filter(|r| !r.kept_original()).count()
    }

    pub fn unchanged_count(&self) -> usize {
        self.results.iter().filter(|r| r.kept_original()).count()
    }

    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }

    pub fn print_summary(&self) {
        println!("\n--- Summary ---");
        println!(
            "Files compressed: {} | Unchanged: {} | Errors: {}",
            self.success_count(),
            self.unchanged_count(),
            self.error_count()
        );

        if self.success_count() > 0 {
            println!(
                "Total: {} → {} ({:.1}% reduction)",
                format_size(self.total_original()),
                format_size(self.total_compressed()),
                self.total_savings_pct()
            );
        }

        for r in &self.results {
            match &r.error {
                Some(err) => println!("  ERROR {}: {}", r.path.display(), err),
                None if !r.kept_original() => match &r.written_to {
                    Some(out) if out != &r.path => println!(
                        "  {} → {} [{}] {:.1}%",
                        r.path.display(),
                        out.display(),
                        r.tool,
                        r.savings_pct()
                    ),
                    _ => println!("  {} [{}] {:.1}%", r.path.display(), r.tool, r.savings_pct()),
                },
                None => {}
            }
        }
    }
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(original: u64, compressed: u64, tool: &str, error: Option<&str>) -> FileResult {
        FileResult {
            path: PathBuf::from("x.png"),
            written_to: None,
            original_size: original,
            compressed_size: compressed,
            tool: tool.to_string(),
            error: error.map(String::from),
        }
    }

    #[test]
    fn totals_skip_errors() {
        let mut report = Report::new();
        report.add(result(1000, 500, "raster-optimizer", None));
        report.add(result(1000, 1000, "original", None));
        report.add(result(0, 0, "", Some("boom")));

        assert_eq!(report.success_count(), 1);
        assert_eq!(report.unchanged_count(), 1);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.total_original(), 2000);
        assert!((report.total_savings_pct() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
