use indicatif::{ProgressBar, ProgressStyle};
use raindump::aggregate::AggregateEvent;
use raindump::error::ExportError;
use raindump::pipeline::RunSummary;
use raindump::utils::truncate;
use std::time::Duration;

const PATH_WIDTH: usize = 50;

/// Console progress for an export run
///
/// Spins while the collection tree is discovered, then turns into a bar
/// advancing once per collection.
pub struct ExportProgress {
    bar: ProgressBar,
}

impl ExportProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            bar.set_style(style);
        }
        bar.set_message("Discovering collections...");
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn start(&self, total: usize) {
        if let Ok(style) =
            ProgressStyle::default_bar().template("{bar:30.cyan/blue} {pos}/{len} {msg}")
        {
            self.bar.set_style(style.progress_chars("=> "));
        }
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_message("Fetching bookmarks...");
    }

    pub fn update(&self, event: &AggregateEvent<'_>) {
        self.bar.set_message(describe_event(event));
        self.bar.inc(1);
    }

    pub fn finish(&self, summary: &RunSummary) {
        self.bar.finish_with_message(describe_summary(summary));
    }

    pub fn abandon(&self, error: &ExportError) {
        self.bar
            .abandon_with_message(format!("✗ export failed ({})", categorize_error(error)));
    }
}

impl Default for ExportProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// One-line status of a processed collection
pub fn describe_event(event: &AggregateEvent<'_>) -> String {
    match event {
        AggregateEvent::Processed {
            collection,
            fetched,
            kept,
            ..
        } => format!(
            "✓ {} ({} bookmarks, {} new)",
            truncate(&collection.full_path, PATH_WIDTH),
            fetched,
            kept
        ),
        AggregateEvent::Skipped {
            collection, error, ..
        } => format!(
            "✗ {} ({})",
            truncate(&collection.full_path, PATH_WIDTH),
            categorize_error(error)
        ),
    }
}

pub fn describe_summary(summary: &RunSummary) -> String {
    let mut msg = format!(
        "✓ {} collections, {} bookmarks",
        summary.collections_written, summary.bookmarks_written
    );
    if summary.duplicates > 0 {
        msg.push_str(&format!(", {} duplicates dropped", summary.duplicates));
    }
    if !summary.failures.is_empty() {
        msg.push_str(&format!(", {} collections failed", summary.failures.len()));
    }
    if !summary.cycles.is_empty() {
        msg.push_str(&format!(", {} collections on parent cycles", summary.cycles.len()));
    }
    msg
}

/// Categorize error for user-friendly display
pub fn categorize_error(error: &ExportError) -> &'static str {
    match error {
        ExportError::Auth => "unauthorized",
        ExportError::Config(_) => "configuration",
        ExportError::RateLimited => "rate limited",
        ExportError::RetriesExhausted { source, .. } => match source.as_ref() {
            ExportError::RateLimited => "rate limited, retries exhausted",
            _ => "server error, retries exhausted",
        },
        ExportError::Server { .. } => "server error",
        ExportError::Status { status: 403, .. } => "forbidden",
        ExportError::Status { status: 404, .. } => "not found",
        ExportError::Status { .. } => "unexpected status",
        ExportError::Http(e) if e.is_timeout() => "timeout",
        ExportError::Http(e) if e.is_connect() => "connection error",
        ExportError::Http(_) => "fetch error",
        ExportError::Csv(_) => "malformed export",
        ExportError::Json(_) => "malformed response",
        ExportError::GraphCycle { .. } | ExportError::UnknownCollection(_) => "hierarchy error",
        ExportError::Io(_) | ExportError::Yaml(_) => "local error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raindump::models::{CollectionId, ResolvedCollection};
    use rstest::rstest;
    use std::path::PathBuf;

    fn collection(full_path: &str) -> ResolvedCollection {
        ResolvedCollection {
            id: CollectionId::from(1),
            title: "t".into(),
            parent_id: None,
            path: full_path.into(),
            root_title: "t".into(),
            root_id: CollectionId::from(1),
            group: String::new(),
            full_path: full_path.into(),
        }
    }

    #[rstest]
    #[case(ExportError::Auth, "unauthorized")]
    #[case(ExportError::RateLimited, "rate limited")]
    #[case(ExportError::Server { status: 502 }, "server error")]
    #[case(ExportError::Status { status: 403, url: String::new(), body: String::new() }, "forbidden")]
    #[case(ExportError::Status { status: 418, url: String::new(), body: String::new() }, "unexpected status")]
    #[case(ExportError::Csv("x".into()), "malformed export")]
    #[case(
        ExportError::RetriesExhausted { attempts: 3, source: Box::new(ExportError::Server { status: 500 }) },
        "server error, retries exhausted"
    )]
    fn test_categorize_error(#[case] error: ExportError, #[case] expected: &str) {
        assert_eq!(categorize_error(&error), expected);
    }

    #[test]
    fn test_describe_processed_event() {
        let c = collection("Work / Rust");
        let event = AggregateEvent::Processed {
            index: 0,
            total: 1,
            collection: &c,
            fetched: 4,
            kept: 3,
        };
        assert_eq!(describe_event(&event), "✓ Work / Rust (4 bookmarks, 3 new)");
    }

    #[test]
    fn test_describe_skipped_event_truncates_path() {
        let c = collection(&"x".repeat(80));
        let error = ExportError::RateLimited;
        let event = AggregateEvent::Skipped {
            index: 0,
            total: 1,
            collection: &c,
            error: &error,
        };
        let msg = describe_event(&event);
        assert!(msg.ends_with("... (rate limited)"));
    }

    #[test]
    fn test_describe_summary() {
        let summary = RunSummary {
            collections_path: PathBuf::from("collections.csv"),
            collections_written: 3,
            bookmarks_path: None,
            bookmarks_written: 0,
            duplicates: 2,
            failures: Vec::new(),
            cycles: Vec::new(),
        };
        assert_eq!(
            describe_summary(&summary),
            "✓ 3 collections, 0 bookmarks, 2 duplicates dropped"
        );
    }
}
