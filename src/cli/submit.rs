//! # submit 子命令 CLI 定义
//!
//! 以有界并发依赖链向 Slurm 提交研究作业
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/submit.rs`

use clap::Args;
use std::path::PathBuf;

/// submit 子命令参数
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Path to the study configuration JSON file
    #[arg(long, short)]
    pub config: PathBuf,

    /// Maximum number of jobs allowed to run concurrently
    #[arg(long, short = 'n')]
    pub max_concurrent: usize,

    /// Show the submission plan without calling sbatch
    #[arg(long)]
    pub dry_run: bool,
}
