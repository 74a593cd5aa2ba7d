use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

/// Bar over image visits; hidden when there is nothing to sample.
pub fn visits(total: u64) -> ProgressBar {
    if total == 0 {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} images ({eta}) {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

pub fn visited(pb: &ProgressBar, path: &Path) {
    tracing::debug!(path = %path.display(), "image visited");
    if let Some(name) = path.file_name() {
        pb.set_message(name.to_string_lossy().into_owned());
    }
    pb.inc(1);
}
