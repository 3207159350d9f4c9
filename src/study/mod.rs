//! # 参数研究领域模块
//!
//! 参数规格枚举、目录命名、输入文件模板与作业脚本生成。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 子模块: config, spec, layout, template, script

pub mod config;
pub mod layout;
pub mod script;
pub mod spec;
pub mod template;
