//! # 批量执行器
//!
//! 并行执行构建阶段的子目录任务。各子目录内容相互独立，允许并行
//! 落盘；提交阶段的顺序性与此无关。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代
//! - 进度条显示
//! - 错误收集与汇总报告
//!
//! ## 依赖关系
//! - 被 `commands/build.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::utils::progress;

use rayon::prelude::*;

/// 单个子目录任务结果
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// 处理成功
    Success(String),
    /// 处理失败
    Failed(String, String), // (子目录名, 错误信息)
}

/// 批量处理结果统计
#[derive(Debug, Default)]
pub struct BatchResult {
    /// 成功数量
    pub success: usize,
    /// 失败数量
    pub failed: usize,
    /// 失败详情
    pub failures: Vec<(String, String)>,
}

impl BatchResult {
    /// 合并处理结果
    pub fn merge(&mut self, result: TaskResult) {
        match result {
            TaskResult::Success(_) => self.success += 1,
            TaskResult::Failed(name, err) => {
                self.failed += 1;
                self.failures.push((name, err));
            }
        }
    }

    /// 总处理数量
    pub fn total(&self) -> usize {
        self.success + self.failed
    }
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
}

impl BatchRunner {
    /// 创建新的批量执行器
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    /// 按下标并行处理 `count` 个任务
    pub fn run<F>(&self, count: usize, label: &str, task: F) -> BatchResult
    where
        F: Fn(usize) -> TaskResult + Sync + Send,
    {
        let pb = progress::create_progress_bar(count as u64, label);

        // 配置 rayon 线程池
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .unwrap();

        let results: Vec<TaskResult> = pool.install(|| {
            (0..count)
                .into_par_iter()
                .map(|i| {
                    let result = task(i);
                    pb.inc(1);
                    result
                })
                .collect()
        });

        pb.finish_and_clear();

        // 汇总结果
        let mut batch_result = BatchResult::default();
        for result in results {
            batch_result.merge(result);
        }

        batch_result
    }
}
