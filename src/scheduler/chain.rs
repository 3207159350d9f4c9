//! # 提交链并发控制模块
//!
//! 用调度器原生依赖把同时运行的作业数限制在给定上限：先无条件
//! 提交前 `max_concurrent` 个单位，之后每个单位都依赖滑动窗口中
//! 最早的未出链作业（`afterany`，前驱进入任意终态即可启动），
//! 严格 FIFO 退窗。稳态下恰有 `max_concurrent` 个作业在跑，依赖
//! 沿链传递而不是全部挂在首批上。
//!
//! ## 依赖关系
//! - 被 `commands/submit.rs` 使用
//! - 使用 `scheduler/slurm.rs`, `error.rs`

use crate::error::{ParsweepError, Result};
use crate::scheduler::slurm::{JobId, Scheduler};

use std::collections::VecDeque;
use std::path::PathBuf;

/// 一个待提交单位：脚本与其提交工作目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitUnit {
    pub script: PathBuf,
    pub workdir: PathBuf,
}

/// 以有界并发依赖链提交全部单位
///
/// `max_concurrent` 超过单位数时向下收紧；提交失败立即中止，
/// 已提交的作业留在调度器里继续运行。返回全部作业 ID，提交序。
pub fn submit_chain<S: Scheduler>(
    scheduler: &S,
    units: &[SubmitUnit],
    max_concurrent: usize,
) -> Result<Vec<JobId>> {
    if max_concurrent < 1 {
        return Err(ParsweepError::ConfigurationError(
            "maximum concurrent jobs must be at least 1".to_string(),
        ));
    }
    let bound = max_concurrent.min(units.len());

    let mut window: VecDeque<JobId> = VecDeque::with_capacity(bound);
    let mut all = Vec::with_capacity(units.len());

    for (i, unit) in units.iter().enumerate() {
        let after = if i < bound {
            None
        } else {
            // 窗口最旧的作业，严格 FIFO
            window.front().cloned()
        };

        let id = scheduler.submit(&unit.script, &unit.workdir, after.as_ref())?;

        if i >= bound {
            window.pop_front();
        }
        window.push_back(id.clone());
        all.push(id);
    }

    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;

    /// 记录每次提交的脚本与依赖，按序发放递增作业 ID
    struct MockScheduler {
        calls: RefCell<Vec<(PathBuf, Option<JobId>)>>,
        fail_at: Option<usize>,
    }

    impl MockScheduler {
        fn new() -> Self {
            MockScheduler {
                calls: RefCell::new(Vec::new()),
                fail_at: None,
            }
        }

        fn failing_at(call: usize) -> Self {
            MockScheduler {
                calls: RefCell::new(Vec::new()),
                fail_at: Some(call),
            }
        }
    }

    impl Scheduler for MockScheduler {
        fn submit(&self, script: &Path, _workdir: &Path, after: Option<&JobId>) -> Result<JobId> {
            let mut calls = self.calls.borrow_mut();
            if Some(calls.len()) == self.fail_at {
                return Err(ParsweepError::SubmissionFailure {
                    command: "sbatch".to_string(),
                    stderr: "queue limit reached".to_string(),
                });
            }
            calls.push((script.to_path_buf(), after.cloned()));
            Ok(JobId::new(format!("{}", 100 + calls.len())))
        }

        fn cancel(&self, _job: &JobId) -> Result<()> {
            Ok(())
        }
    }

    fn units(n: usize) -> Vec<SubmitUnit> {
        (0..n)
            .map(|i| SubmitUnit {
                script: PathBuf::from(format!("job{}.slurm", i)),
                workdir: PathBuf::from("/study"),
            })
            .collect()
    }

    #[test]
    fn test_window_of_two_over_five_units() {
        let scheduler = MockScheduler::new();
        let ids = submit_chain(&scheduler, &units(5), 2).unwrap();

        assert_eq!(ids.len(), 5);
        let calls = scheduler.calls.borrow();
        let deps: Vec<Option<String>> = calls
            .iter()
            .map(|(_, dep)| dep.as_ref().map(|d| d.to_string()))
            .collect();
        // 前两个无依赖，其后依次挂在窗口最旧作业上
        assert_eq!(
            deps,
            vec![
                None,
                None,
                Some("101".to_string()),
                Some("102".to_string()),
                Some("103".to_string()),
            ]
        );
    }

    #[test]
    fn test_concurrency_clamped_to_unit_count() {
        let scheduler = MockScheduler::new();
        let ids = submit_chain(&scheduler, &units(3), 10).unwrap();

        assert_eq!(ids.len(), 3);
        assert!(scheduler
            .calls
            .borrow()
            .iter()
            .all(|(_, dep)| dep.is_none()));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let scheduler = MockScheduler::new();
        let err = submit_chain(&scheduler, &units(3), 0).unwrap_err();
        assert!(matches!(err, ParsweepError::ConfigurationError(_)));
    }

    #[test]
    fn test_ids_returned_in_submission_order() {
        let scheduler = MockScheduler::new();
        let ids = submit_chain(&scheduler, &units(4), 2).unwrap();
        let rendered: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        assert_eq!(rendered, vec!["101", "102", "103", "104"]);
    }

    #[test]
    fn test_submission_failure_aborts_run() {
        let scheduler = MockScheduler::failing_at(2);
        let err = submit_chain(&scheduler, &units(5), 2).unwrap_err();
        assert!(matches!(err, ParsweepError::SubmissionFailure { .. }));
        // 前两个已提交的作业不回收
        assert_eq!(scheduler.calls.borrow().len(), 2);
    }
}
