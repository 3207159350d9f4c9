//! # 调度器模块
//!
//! Slurm 客户端与提交链并发控制。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 子模块: slurm, chain

pub mod chain;
pub mod slurm;
