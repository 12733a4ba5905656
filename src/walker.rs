use crate::config::OutlineConfig;
use crate::error::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Walks a project for PHP files, respecting .gitignore
pub struct FileWalker<'a> {
    root: PathBuf,
    config: &'a OutlineConfig,
}

impl<'a> FileWalker<'a> {
    pub fn new(root: &Path, config: &'a OutlineConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
        }
    }

    /// All PHP files under the root, sorted by path
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)           // Skip hidden files
            .git_ignore(true)       // Respect .gitignore
            .git_global(true)       // Respect global gitignore
            .git_exclude(true)      // Respect .git/info/exclude
            .require_git(false)     // Work even without .git
            .build();

        for entry in walker.flatten() {
            let path = entry.path();

            if path.is_dir() || !self.config.matches(path) {
                continue;
            }

            if let Ok(meta) = path.metadata() {
                if meta.len() > self.config.max_file_size {
                    tracing::debug!(path = %path.display(), size = meta.len(), "skipping large file");
                    continue;
                }
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_walk_finds_php_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/Models")).unwrap();
        fs::write(dir.path().join("src/Models/User.php"), "<?php class User {}").unwrap();
        fs::write(dir.path().join("index.php"), "<?php").unwrap();
        fs::write(dir.path().join("README.md"), "# readme").unwrap();

        let config = OutlineConfig::default();
        let files = FileWalker::new(dir.path(), &config).walk().unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["index.php", "src/Models/User.php"]);
    }

    #[test]
    fn test_walk_respects_gitignore_and_size() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("vendor")).unwrap();
        fs::write(dir.path().join(".gitignore"), "vendor/\n").unwrap();
        fs::write(dir.path().join("vendor/lib.php"), "<?php").unwrap();
        fs::write(dir.path().join("big.php"), "<?php // ".repeat(20)).unwrap();
        fs::write(dir.path().join("small.php"), "<?php").unwrap();

        let config = OutlineConfig {
            max_file_size: 64,
            ..OutlineConfig::default()
        };
        let files = FileWalker::new(dir.path(), &config).walk().unwrap();
        assert_eq!(files, vec![dir.path().join("small.php")]);
    }
}
