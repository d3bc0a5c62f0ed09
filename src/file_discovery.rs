use std::path::{Path, PathBuf};

use tokio::fs;

use crate::config::SampleSize;
use crate::error::{Result, ValidationError};

/// Builds the ordered feed list for a directory of article-json files.
///
/// The directory listing is filtered to regular files with a matching
/// extension, sorted ascending by file name (listing order is never
/// guaranteed), truncated to the sample size and finally reversed so the
/// run counts down from the highest identifier to the lowest.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    /// File extensions to include (e.g., ["json"])
    extensions: Vec<String>,
    sample_size: SampleSize,
}

impl FileDiscovery {
    pub fn new() -> Self {
        Self {
            extensions: vec!["json".to_string()],
            sample_size: SampleSize::All,
        }
    }

    /// Set file extensions to discover
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn with_sample_size(mut self, sample_size: SampleSize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// List the files to feed, in feed order.
    ///
    /// Subdirectories are skipped, not descended into. A sample size larger
    /// than the number of eligible files is clamped to what is available.
    pub async fn discover_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut read_dir = fs::read_dir(dir).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ValidationError::PathNotFound {
                path: dir.to_path_buf(),
            },
            _ => ValidationError::from(e),
        })?;

        let mut files = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_dir() && self.should_process(&path) {
                files.push(path);
            }
        }

        Ok(self.sample(files))
    }

    /// Apply sort, truncation and reversal to an already filtered list.
    pub fn sample(&self, mut files: Vec<PathBuf>) -> Vec<PathBuf> {
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        files.truncate(self.sample_size.resolve(files.len()));
        files.reverse();
        files
    }

    /// Check if a file should be processed based on its extension
    pub fn should_process(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_files(root: &Path, names: &[&str]) {
        for name in names {
            fs::write(root.join(name), "{}").await.unwrap();
        }
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_feed_order_counts_down() {
        let temp_dir = TempDir::new().unwrap();
        create_files(temp_dir.path(), &["b.json", "c.json", "a.json"]).await;

        let files = FileDiscovery::new()
            .discover_files(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(names(&files), vec!["c.json", "b.json", "a.json"]);
    }

    #[tokio::test]
    async fn test_sample_takes_lowest_names_then_reverses() {
        let temp_dir = TempDir::new().unwrap();
        create_files(
            temp_dir.path(),
            &["04.json", "01.json", "05.json", "03.json", "02.json"],
        )
        .await;

        let files = FileDiscovery::new()
            .with_sample_size(SampleSize::Limit(3))
            .discover_files(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(names(&files), vec!["03.json", "02.json", "01.json"]);
    }

    #[tokio::test]
    async fn test_sample_size_is_clamped() {
        let temp_dir = TempDir::new().unwrap();
        let names: Vec<String> = (0..10).map(|i| format!("elife-{i:05}.json")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        create_files(temp_dir.path(), &refs).await;

        let files = FileDiscovery::new()
            .with_sample_size(SampleSize::Limit(1000))
            .discover_files(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(files.len(), 10);
    }

    #[tokio::test]
    async fn test_directories_and_other_extensions_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        create_files(temp_dir.path(), &["a.json", "b.xml", "README"]).await;
        fs::create_dir(temp_dir.path().join("0-nested.json")).await.unwrap();
        create_files(&temp_dir.path().join("0-nested.json"), &["z.json"]).await;

        // directories are filtered before sampling, so they never eat into the sample
        let files = FileDiscovery::new()
            .with_sample_size(SampleSize::Limit(1))
            .discover_files(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(names(&files), vec!["a.json"]);
    }

    #[test]
    fn test_extension_matching() {
        let discovery = FileDiscovery::new().with_extensions(vec![".JSON".to_string()]);
        assert!(discovery.should_process(Path::new("a.json")));
        assert!(discovery.should_process(Path::new("a.JSON")));
        assert!(!discovery.should_process(Path::new("a.xml")));
        assert!(!discovery.should_process(Path::new("json")));
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let err = FileDiscovery::new()
            .discover_files(Path::new("/nonexistent/articles"))
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::PathNotFound { .. }));
    }
}
