//! # 实验目录索引
//!
//! 对解压后的实验目录做一次有界遍历，之后所有文件查找都在内存索引上完成。
//! 遍历深度与条目数都有上限，超过条目上限时停止遍历并记录警告。
//!
//! ## 依赖关系
//! - 被 `scxrd/processor.rs` 使用
//! - 使用 `walkdir` 遍历目录，`glob` 匹配文件名

use crate::error::{Result, ScxrdError};
use glob::{MatchOptions, Pattern};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

const NAME_MATCH: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// 索引中的一个文件
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    /// 相对于根目录的路径
    pub relative: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl ArchiveEntry {
    /// 小写文件名
    pub fn file_name_lower(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// 文件名以给定前缀开头（不区分大小写）
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.file_name_lower().starts_with(&prefix.to_lowercase())
    }

    /// 直接父目录名（不区分大小写）
    fn parent_is(&self, dir: &str) -> bool {
        self.relative
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().eq_ignore_ascii_case(dir))
            .unwrap_or(false)
    }

    /// 任一上级目录名（不区分大小写）
    fn is_under(&self, dir: &str) -> bool {
        self.relative
            .parent()
            .map(|p| {
                p.components()
                    .any(|c| c.as_os_str().to_string_lossy().eq_ignore_ascii_case(dir))
            })
            .unwrap_or(false)
    }
}

/// 有界目录索引
#[derive(Debug, Clone, Default)]
pub struct ArchiveIndex {
    root: PathBuf,
    entries: Vec<ArchiveEntry>,
    truncated: bool,
}

impl ArchiveIndex {
    /// 遍历 `root`，深度不超过 `max_depth`，最多访问 `max_files` 个条目
    pub fn build(root: &Path, max_depth: usize, max_files: usize) -> Result<Self> {
        if !root.is_dir() {
            return Err(ScxrdError::DirectoryNotFound {
                path: root.display().to_string(),
            });
        }

        let mut entries = Vec::new();
        let mut visited = 0usize;
        let mut truncated = false;

        let walker = WalkDir::new(root)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter();

        for item in walker {
            let entry = match item {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            visited += 1;
            if visited > max_files {
                warn!(
                    "Archive walk stopped after {} entries under {}",
                    max_files,
                    root.display()
                );
                truncated = true;
                break;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            let metadata = entry.metadata().ok();
            let relative = entry
                .path()
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| entry.path().to_path_buf());

            entries.push(ArchiveEntry {
                path: entry.path().to_path_buf(),
                relative,
                size: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
                modified: metadata.and_then(|m| m.modified().ok()),
            });
        }

        debug!("Indexed {} files under {}", entries.len(), root.display());
        Ok(ArchiveIndex {
            root: root.to_path_buf(),
            entries,
            truncated,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// 文件名匹配 `pattern` 的所有文件（任意深度）
    pub fn named(&self, pattern: &str) -> Vec<&ArchiveEntry> {
        self.filter(pattern, |_| true)
    }

    /// 直接位于名为 `dir` 的目录中且文件名匹配的文件
    pub fn named_in(&self, dir: &str, pattern: &str) -> Vec<&ArchiveEntry> {
        self.filter(pattern, |e| e.parent_is(dir))
    }

    /// 位于名为 `dir` 的目录之下（任意层级）且文件名匹配的文件
    pub fn named_under(&self, dir: &str, pattern: &str) -> Vec<&ArchiveEntry> {
        self.filter(pattern, |e| e.is_under(dir))
    }

    fn filter<F>(&self, pattern: &str, location: F) -> Vec<&ArchiveEntry>
    where
        F: Fn(&ArchiveEntry) -> bool,
    {
        let pattern = match Pattern::new(pattern) {
            Ok(p) => p,
            Err(e) => {
                warn!("Invalid file pattern '{}': {}", pattern, e);
                return Vec::new();
            }
        };

        self.entries
            .iter()
            .filter(|e| location(e))
            .filter(|e| {
                e.path
                    .file_name()
                    .map(|n| pattern.matches_with(&n.to_string_lossy(), NAME_MATCH))
                    .unwrap_or(false)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_named_lookups() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "expinfo/exp_crystal.ini");
        touch(dir.path(), "other/EXP2_Crystal.INI");
        touch(dir.path(), "struct/best_res/a/model.res");
        touch(dir.path(), "frames/exp_1_1.rodhypix");

        let index = ArchiveIndex::build(dir.path(), 12, 1000).unwrap();
        assert!(!index.is_truncated());
        assert_eq!(index.named("*crystal.ini").len(), 2);
        assert_eq!(index.named_in("expinfo", "*crystal.ini").len(), 1);
        assert_eq!(index.named_under("struct", "*.res").len(), 1);
        assert_eq!(index.named_in("frames", "*.rodhypix").len(), 1);
        assert!(index.named_in("struct", "*.res").is_empty());
    }

    #[test]
    fn test_depth_limit() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/b/c/deep.txt");
        touch(dir.path(), "top.txt");

        let index = ArchiveIndex::build(dir.path(), 2, 1000).unwrap();
        assert_eq!(index.named("*.txt").len(), 1);
    }

    #[test]
    fn test_file_cap_truncates_walk() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            touch(dir.path(), &format!("f{}.txt", i));
        }

        let index = ArchiveIndex::build(dir.path(), 12, 5).unwrap();
        assert!(index.is_truncated());
        assert!(index.entries().len() < 10);
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ArchiveIndex::build(&dir.path().join("missing"), 12, 10).is_err());
    }

    #[test]
    fn test_prefix_check() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "PRE_x.tabbin");
        let index = ArchiveIndex::build(dir.path(), 12, 10).unwrap();
        assert!(index.entries()[0].has_prefix("pre_"));
    }
}
