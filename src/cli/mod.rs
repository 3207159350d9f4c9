//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `build`: 生成研究目录树、输入文件与作业脚本
//! - `submit`: 以有界并发依赖链提交全部作业
//! - `cancel`: 按 jobIDs.txt 尽力撤销已提交作业
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: build, submit, cancel

pub mod build;
pub mod cancel;
pub mod submit;

use clap::{Parser, Subcommand};

/// parsweep - 参数扫描研究构建与提交工具
#[derive(Parser)]
#[command(name = "parsweep")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "A parametric study builder and Slurm job launcher", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Build the study directory tree, input files and job scripts
    Build(build::BuildArgs),

    /// Submit all study jobs with a bounded-concurrency dependency chain
    Submit(submit::SubmitArgs),

    /// Best-effort cancellation of every job recorded in jobIDs.txt
    Cancel(cancel::CancelArgs),
}
