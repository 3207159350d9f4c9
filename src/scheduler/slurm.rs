//! # Slurm 调度器客户端
//!
//! 通过 `sbatch` / `scancel` 与集群调度器交互。调度器藏在
//! `Scheduler` trait 之后，提交链逻辑与测试都只面向该接口。
//!
//! ## 应答格式约定
//! `sbatch` 成功时应答 `Submitted batch job <id>`，按此版本化契约
//! 用正则抽取作业 ID，对不上时给出明确错误而不是盲取记号位。
//!
//! ## 依赖关系
//! - 被 `scheduler/chain.rs`, `commands/submit.rs`, `commands/cancel.rs` 使用
//! - 使用 `utils/output.rs`, `error.rs`

use crate::error::{ParsweepError, Result};
use crate::utils::output;

use regex::Regex;
use std::fmt;
use std::path::Path;
use std::process::Command;

/// 调度器返回的不透明作业标识
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        JobId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 批处理调度器接口
///
/// `submit` 在 `workdir` 下提交脚本，可附带"前驱作业进入终态后才
/// 启动"的依赖；`cancel` 撤销单个作业。
pub trait Scheduler {
    fn submit(&self, script: &Path, workdir: &Path, after: Option<&JobId>) -> Result<JobId>;

    fn cancel(&self, job: &JobId) -> Result<()>;
}

/// 基于 sbatch/scancel 子进程的 Slurm 客户端
pub struct SlurmScheduler;

impl SlurmScheduler {
    pub fn new() -> Self {
        SlurmScheduler
    }
}

impl Default for SlurmScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// 从 sbatch 应答中抽取作业 ID
pub fn parse_job_id(reply: &str) -> Result<JobId> {
    let pattern = Regex::new(r"Submitted batch job (\d+)").unwrap();
    pattern
        .captures(reply)
        .map(|caps| JobId::new(&caps[1]))
        .ok_or_else(|| ParsweepError::UnparsableSchedulerReply {
            reply: reply.trim().to_string(),
        })
}

impl Scheduler for SlurmScheduler {
    fn submit(&self, script: &Path, workdir: &Path, after: Option<&JobId>) -> Result<JobId> {
        let mut cmd = Command::new("sbatch");
        if let Some(dep) = after {
            cmd.arg(format!("--dependency=afterany:{}", dep));
        }
        cmd.arg(script);
        // 显式工作目录，不改动进程级 cwd
        cmd.current_dir(workdir);

        let shown = format!(
            "sbatch {}{}",
            after
                .map(|dep| format!("--dependency=afterany:{} ", dep))
                .unwrap_or_default(),
            script.display()
        );
        output::print_command(&shown);

        let out = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ParsweepError::CommandNotFound {
                    command: "sbatch".to_string(),
                }
            } else {
                ParsweepError::SubmissionFailure {
                    command: shown.clone(),
                    stderr: e.to_string(),
                }
            }
        })?;

        if !out.status.success() {
            return Err(ParsweepError::SubmissionFailure {
                command: shown,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }

        parse_job_id(&String::from_utf8_lossy(&out.stdout))
    }

    fn cancel(&self, job: &JobId) -> Result<()> {
        let out = Command::new("scancel")
            .arg(job.as_str())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ParsweepError::CommandNotFound {
                        command: "scancel".to_string(),
                    }
                } else {
                    ParsweepError::CancellationFailure {
                        job_id: job.to_string(),
                        stderr: e.to_string(),
                    }
                }
            })?;

        if !out.status.success() {
            return Err(ParsweepError::CancellationFailure {
                job_id: job.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_id_from_sbatch_reply() {
        let id = parse_job_id("Submitted batch job 4170234\n").unwrap();
        assert_eq!(id.as_str(), "4170234");
    }

    #[test]
    fn test_parse_job_id_tolerates_cluster_suffix() {
        // 部分集群会在应答后附加提示行
        let id = parse_job_id("Submitted batch job 99 on cluster hpc\n").unwrap();
        assert_eq!(id.as_str(), "99");
    }

    #[test]
    fn test_unparsable_reply_is_an_error() {
        let err = parse_job_id("sbatch: error: invalid partition\n").unwrap_err();
        assert!(matches!(err, ParsweepError::UnparsableSchedulerReply { .. }));
    }
}
