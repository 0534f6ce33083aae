//! # 文件收集器
//!
//! 根据输入路径和文件名模式收集待处理文件列表。
//! 输入为单文件时直接返回该文件；输入为目录时按模式筛选。
//!
//! ## 依赖关系
//! - 被 `commands/peaks.rs` 调用
//! - 使用 `walkdir` 遍历目录，`glob` 匹配文件名

use crate::error::{Result, ScxrdError};
use glob::{MatchOptions, Pattern};
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const NAME_MATCH: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// 文件收集器
pub struct FileCollector {
    input: PathBuf,
    patterns: Vec<Pattern>,
    recursive: bool,
}

impl FileCollector {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            patterns: Vec::new(),
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）；无效模式被忽略
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.patterns = pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| match Pattern::new(s) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Ignoring invalid pattern '{}': {}", s, e);
                    None
                }
            })
            .collect();
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn is_single_file(&self) -> bool {
        self.input.is_file()
    }

    /// 收集所有匹配的文件（按路径排序）
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if self.input.is_file() {
            return Ok(vec![self.input.clone()]);
        }

        if !self.input.is_dir() {
            return Err(ScxrdError::FileNotFound {
                path: self.input.display().to_string(),
            });
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.matches_patterns(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(ScxrdError::NoFilesFound {
                pattern: format!("{} in {}", self.pattern_list(), self.input.display()),
            });
        }
        Ok(files)
    }

    fn matches_patterns(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };
        self.patterns.is_empty()
            || self
                .patterns
                .iter()
                .any(|p| p.matches_with(&filename, NAME_MATCH))
    }

    fn pattern_list(&self) -> String {
        if self.patterns.is_empty() {
            return "*".to_string();
        }
        self.patterns
            .iter()
            .map(Pattern::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}
