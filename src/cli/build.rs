//! # build 子命令 CLI 定义
//!
//! 生成研究目录树并填充输入文件与作业脚本
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/build.rs`

use clap::Args;
use std::path::PathBuf;

/// build 子命令参数
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Path to the study configuration JSON file
    #[arg(long, short)]
    pub config: PathBuf,

    /// Override the configured number of cores per node
    #[arg(long)]
    pub cores_per_node: Option<u32>,

    /// Override the configured number of cores per unit job
    #[arg(long)]
    pub cores_per_job: Option<u32>,

    /// Number of parallel workers for populating sub-directories (0 = all cores)
    #[arg(long, default_value_t = 0)]
    pub jobs: usize,
}
