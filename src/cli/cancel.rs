//! # cancel 子命令 CLI 定义
//!
//! 按 jobIDs.txt 尽力撤销已提交作业
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/cancel.rs`

use clap::Args;
use std::path::PathBuf;

/// cancel 子命令参数
#[derive(Args, Debug)]
pub struct CancelArgs {
    /// Path to the study configuration JSON file
    #[arg(long, short)]
    pub config: PathBuf,
}
