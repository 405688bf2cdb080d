//! Output module for reporting crawl results
//!
//! Renders the final [`CrawlSummary`] for the terminal.

use crate::crawler::CrawlSummary;
use std::fmt::Write;

/// Formats a crawl summary as a human-readable block
pub fn format_summary(summary: &CrawlSummary) -> String {
    let mut out = String::new();

    let title = if summary.cancelled {
        "=== Crawl Stopped ==="
    } else {
        "=== Crawl Complete ==="
    };
    let _ = writeln!(out, "{}\n", title);
    let _ = writeln!(out, "  Pages fetched: {}", summary.fetched);
    let _ = writeln!(out, "  Links discovered: {}", summary.discovered);
    let _ = writeln!(out, "  Unique URLs: {}", summary.unique_urls);
    if summary.pending > 0 {
        let _ = writeln!(out, "  Left in queue: {}", summary.pending);
    }
    let _ = writeln!(out, "  Workers: {}", summary.workers);
    let _ = writeln!(
        out,
        "  Elapsed: {:.1}s ({:.2} pages/sec)",
        summary.elapsed.as_secs_f64(),
        summary.pages_per_sec()
    );

    out
}

/// Prints a crawl summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    print!("{}", format_summary(summary));
}
