//! # 批量执行器
//!
//! 基于 rayon 并行执行批量任务，显示进度条并汇总结果。
//!
//! ## 依赖关系
//! - 被 `commands/peaks.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::error::{Result, ScxrdError};
use crate::utils::progress;

use rayon::prelude::*;
use std::path::PathBuf;

/// 单个文件处理结果
#[derive(Debug, Clone)]
pub enum ProcessResult<T> {
    Success(PathBuf, T),
    /// 跳过（附原因）
    Skipped(PathBuf, String),
    /// 处理失败（附错误信息）
    Failed(PathBuf, String),
}

/// 批量处理结果统计
#[derive(Debug)]
pub struct BatchResult<T> {
    /// 成功项，保持输入顺序
    pub outputs: Vec<(PathBuf, T)>,
    pub skipped: Vec<(PathBuf, String)>,
    pub failures: Vec<(PathBuf, String)>,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self {
            outputs: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> BatchResult<T> {
    pub fn merge(&mut self, result: ProcessResult<T>) {
        match result {
            ProcessResult::Success(path, value) => self.outputs.push((path, value)),
            ProcessResult::Skipped(path, reason) => self.skipped.push((path, reason)),
            ProcessResult::Failed(path, err) => self.failures.push((path, err)),
        }
    }

    pub fn success(&self) -> usize {
        self.outputs.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.outputs.len() + self.skipped.len() + self.failures.len()
    }
}

/// 批量执行器
pub struct BatchRunner {
    jobs: usize,
    show_progress: bool,
}

impl BatchRunner {
    /// `jobs == 0` 时使用全部 CPU 核心
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self {
            jobs,
            show_progress: true,
        }
    }

    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 并行处理文件列表
    pub fn run<T, F>(&self, files: Vec<PathBuf>, processor: F) -> Result<BatchResult<T>>
    where
        T: Send,
        F: Fn(&PathBuf) -> ProcessResult<T> + Sync + Send,
    {
        let pb = if self.show_progress {
            progress::create_progress_bar(files.len() as u64, "Processing")
        } else {
            indicatif::ProgressBar::hidden()
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| ScxrdError::Other(format!("Failed to build thread pool: {}", e)))?;

        let results: Vec<ProcessResult<T>> = pool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    let result = processor(file);
                    pb.inc(1);
                    result
                })
                .collect()
        });

        pb.finish_and_clear();

        let mut batch_result = BatchResult::default();
        for result in results {
            batch_result.merge(result);
        }
        Ok(batch_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_keeps_input_order() {
        let files: Vec<PathBuf> = (0..20).map(|i| PathBuf::from(format!("f{:02}", i))).collect();
        let runner = BatchRunner::new(4).quiet();

        let result = runner
            .run(files.clone(), |path| {
                let name = path.display().to_string();
                if name.ends_with('3') {
                    ProcessResult::Failed(path.clone(), "bad".to_string())
                } else if name.ends_with('5') {
                    ProcessResult::Skipped(path.clone(), "empty".to_string())
                } else {
                    ProcessResult::Success(path.clone(), name.len())
                }
            })
            .unwrap();

        assert_eq!(result.total(), 20);
        assert_eq!(result.failed(), 2);
        assert_eq!(result.skipped.len(), 2);
        assert_eq!(result.success(), 16);
        assert_eq!(result.outputs[0].0, files[0]);
        assert_eq!(result.outputs[1].0, files[1]);
    }

    #[test]
    fn test_zero_jobs_uses_all_cores() {
        assert_eq!(BatchRunner::new(0).jobs(), num_cpus::get());
    }
}
