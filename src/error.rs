//! # 统一错误处理模块
//!
//! 定义 parsweep 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// parsweep 统一错误类型
#[derive(Error, Debug)]
pub enum ParsweepError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Study directory already exists: {path}\nRefusing to overwrite an existing study")]
    DirectoryExists { path: String },

    #[error("Study directory not found: {path}\nRun the build step first")]
    StudyNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 配置错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid study configuration: {0}")]
    ConfigurationError(String),

    #[error("Invalid parameter specification: {0}")]
    InvalidSpec(String),

    #[error("Malformed grouped parameter key '{key}': splits into {names} name(s) but the group holds {arity} sub-parameter(s)")]
    MalformedGroupKey {
        key: String,
        names: usize,
        arity: usize,
    },

    // ─────────────────────────────────────────────────────────────
    // 模板与脚本错误
    // ─────────────────────────────────────────────────────────────
    #[error("Line modifier rejected a matching line for parameter '{param}': {line}")]
    LineModRejected { param: String, line: String },

    #[error("No line containing '{marker}' found in submission script {path}")]
    ExecutableLineNotFound { marker: String, path: String },

    #[error("Marker '{marker}' appears on {count} lines of {path}, expected exactly one invocation line")]
    ExecutableLineAmbiguous {
        marker: String,
        path: String,
        count: usize,
    },

    // ─────────────────────────────────────────────────────────────
    // 调度器错误
    // ─────────────────────────────────────────────────────────────
    #[error("External command '{command}' not found in PATH")]
    CommandNotFound { command: String },

    #[error("Job submission failed: {command}\n{stderr}")]
    SubmissionFailure { command: String, stderr: String },

    #[error("Could not extract a job id from the scheduler reply: {reply:?}")]
    UnparsableSchedulerReply { reply: String },

    #[error("Failed to cancel job {job_id}: {stderr}")]
    CancellationFailure { job_id: String, stderr: String },

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, ParsweepError>;
