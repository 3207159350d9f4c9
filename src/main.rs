//! # parsweep - 参数扫描研究构建与提交工具
//!
//! 对命名参数值的交叉乘积（或成组乘积）物化出每个唯一组合的工作
//! 目录，写入定制输入文件与提交脚本，并以调度器依赖链限制并发地
//! 提交到 Slurm 集群。
//!
//! ## 子命令
//! - `build`  - 生成研究目录树、输入文件与作业脚本
//! - `submit` - 以有界并发依赖链提交全部作业
//! - `cancel` - 按 jobIDs.txt 尽力撤销已提交作业
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── study/     (枚举、命名、模板、脚本)
//!   │     ├── scheduler/ (Slurm 客户端与提交链)
//!   │     └── batch/     (并行落盘)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod scheduler;
mod study;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
