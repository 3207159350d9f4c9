//! # 批量处理模块
//!
//! 构建阶段按子目录并行落盘的执行器。
//!
//! ## 功能
//! - 并行执行相互独立的子目录任务
//! - 进度反馈与失败收集
//!
//! ## 依赖关系
//! - 被 `commands/build.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod runner;

pub use runner::{BatchResult, BatchRunner, TaskResult};
