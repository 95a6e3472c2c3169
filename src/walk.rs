use std::{
    fs,
    path::{Path, PathBuf},
};

use regex::Regex;

/// Contents of one directory visited by [`walk_through_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirSummary {
    pub path: PathBuf,
    pub dirs: usize,
    pub files: usize,
    /// Files whose extension names an image format.
    pub images: usize,
}

fn image_pattern() -> Regex {
    Regex::new(r"(?i)\.(jpe?g|png|bmp|gif|webp|tiff?)$").expect("image extension pattern is valid")
}

/// Walks `dir_path` top-down and reports how many subdirectories and files
/// each directory holds.
///
/// Siblings are visited in name order.
pub fn walk_through_dir(dir_path: impl AsRef<Path>) -> crate::Result<Vec<DirSummary>> {
    let images = image_pattern();
    let mut summaries = Vec::new();
    let mut pending = vec![dir_path.as_ref().to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut subdirs = Vec::new();
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                subdirs.push(entry.path());
            } else {
                files.push(entry.file_name());
            }
        }
        subdirs.sort();

        let summary = DirSummary {
            dirs: subdirs.len(),
            files: files.len(),
            images: files
                .iter()
                .filter(|name| images.is_match(&name.to_string_lossy()))
                .count(),
            path: dir,
        };
        tracing::info!(
            "There are {} directories and {} images in '{}'.",
            summary.dirs,
            summary.files,
            summary.path.display()
        );
        summaries.push(summary);

        // reversed so the stack pops them in name order
        pending.extend(subdirs.into_iter().rev());
    }

    Ok(summaries)
}
