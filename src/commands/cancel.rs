//! # cancel 命令实现
//!
//! 读取 `jobIDs.txt`，逐个调用 scancel。每次撤销彼此独立、尽力
//! 而为：单个失败记入报告后继续，绝不中断整个循环。
//!
//! ## 依赖关系
//! - 使用 `cli/cancel.rs` 定义的参数
//! - 使用 `study/layout.rs`, `scheduler/slurm.rs`, `utils/output.rs`

use crate::cli::cancel::CancelArgs;
use crate::error::Result;
use crate::scheduler::slurm::{JobId, Scheduler, SlurmScheduler};
use crate::study::config::{CoreOverrides, StudyConfig};
use crate::study::layout;
use crate::utils::output;

use tabled::{Table, Tabled};

/// 单个作业的撤销结果行
#[derive(Tabled)]
struct CancelRow {
    #[tabled(rename = "Job ID")]
    job_id: String,
    #[tabled(rename = "Result")]
    outcome: String,
}

/// 撤销报告
struct CancelReport {
    rows: Vec<CancelRow>,
    cancelled: usize,
    failed: usize,
}

/// 逐个撤销，失败不中断
fn cancel_all<S: Scheduler>(scheduler: &S, ids: &[JobId]) -> CancelReport {
    let mut report = CancelReport {
        rows: Vec::with_capacity(ids.len()),
        cancelled: 0,
        failed: 0,
    };

    for id in ids {
        match scheduler.cancel(id) {
            Ok(()) => {
                report.cancelled += 1;
                report.rows.push(CancelRow {
                    job_id: id.to_string(),
                    outcome: "cancelled".to_string(),
                });
            }
            Err(e) => {
                report.failed += 1;
                report.rows.push(CancelRow {
                    job_id: id.to_string(),
                    outcome: format!("failed: {}", e),
                });
            }
        }
    }
    report
}

/// 执行 cancel 命令
pub fn execute(args: CancelArgs) -> Result<()> {
    output::print_header("Parametric Study Cancellation");

    let config = StudyConfig::load(&args.config, CoreOverrides::default())?;
    let ids = layout::read_job_ids(&config.study_root)?;
    if ids.is_empty() {
        output::print_warning("jobIDs.txt holds no job ids, nothing to cancel");
        return Ok(());
    }
    output::print_info(&format!("Cancelling {} recorded job(s)", ids.len()));

    let scheduler = SlurmScheduler::new();
    let report = cancel_all(&scheduler, &ids);

    println!("{}", Table::new(&report.rows));
    output::print_separator();
    if report.failed > 0 {
        output::print_warning(&format!(
            "{} cancellation(s) failed, see the table above",
            report.failed
        ));
    }
    output::print_done(&format!(
        "Cancelled {} of {} job(s)",
        report.cancelled,
        ids.len()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParsweepError;
    use std::cell::RefCell;
    use std::path::Path;

    /// 第二个作业撤销失败的调度器
    struct FlakyScheduler {
        attempts: RefCell<Vec<String>>,
    }

    impl Scheduler for FlakyScheduler {
        fn submit(
            &self,
            _script: &Path,
            _workdir: &Path,
            _after: Option<&JobId>,
        ) -> Result<JobId> {
            unreachable!("cancel tests never submit")
        }

        fn cancel(&self, job: &JobId) -> Result<()> {
            self.attempts.borrow_mut().push(job.to_string());
            if self.attempts.borrow().len() == 2 {
                return Err(ParsweepError::CancellationFailure {
                    job_id: job.to_string(),
                    stderr: "job already completed".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_cancel_continues_past_failures() {
        let scheduler = FlakyScheduler {
            attempts: RefCell::new(Vec::new()),
        };
        let ids = vec![JobId::new("1"), JobId::new("2"), JobId::new("3")];

        let report = cancel_all(&scheduler, &ids);

        // 第二个失败后第三个仍被尝试
        assert_eq!(*scheduler.attempts.borrow(), vec!["1", "2", "3"]);
        assert_eq!(report.cancelled, 2);
        assert_eq!(report.failed, 1);
        assert!(report.rows[1].outcome.starts_with("failed:"));
    }
}
