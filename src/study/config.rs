//! # 研究配置模块
//!
//! 从 JSON 配置文件加载参数扫描的全部设置，并在构造期完成校验：
//! 必填字段、未知关键字、成组参数的结构都在任何目录创建之前检查。
//! 参数值按 JSON 形状（首元素是否为数组）在这里一次性定型为
//! 平铺/成组变体，运行期不再做形状推断。
//!
//! ## 路径解析
//! 配置中的相对路径（输入文件、提交脚本、研究根目录）一律相对
//! 配置文件所在目录解析，不依赖进程当前目录。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `study/spec.rs`, `error.rs`
//! - 使用 `serde` + `serde_json`

use crate::error::{ParsweepError, Result};
use crate::study::spec::{ParamValues, ParameterSpec, Scalar};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

fn default_separator() -> String {
    " = ".to_string()
}

fn default_cores_per_node() -> u32 {
    16
}

fn default_cores_per_job() -> u32 {
    1
}

/// 配置文件的原始形态，仅做反序列化
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStudyFile {
    study_name: String,
    input_file: PathBuf,
    submission_file: PathBuf,
    #[serde(default = "default_separator")]
    assignment_separator: String,
    parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    multiple_jobs_per_node: bool,
    #[serde(default)]
    executable_name: Option<String>,
    #[serde(default = "default_cores_per_node")]
    cores_per_node: u32,
    #[serde(default = "default_cores_per_job")]
    cores_per_job: u32,
}

/// 作业脚本生成模式，构建与提交共用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobScriptMode {
    /// 每个子目录一份独立提交脚本
    SingleJob,
    /// 多个单位作业共享一个节点分配
    NodePacking {
        executable_name: String,
        cores_per_node: u32,
        cores_per_job: u32,
    },
}

/// 命令行对核数配置的覆盖
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreOverrides {
    pub cores_per_node: Option<u32>,
    pub cores_per_job: Option<u32>,
}

/// 校验完成的研究配置
#[derive(Debug, Clone)]
pub struct StudyConfig {
    pub study_name: String,
    pub input_file: PathBuf,
    pub submission_file: PathBuf,
    pub assignment_separator: String,
    pub spec: ParameterSpec,
    pub mode: JobScriptMode,
    pub study_root: PathBuf,
}

impl StudyConfig {
    /// 加载并校验配置文件
    pub fn load(path: &Path, overrides: CoreOverrides) -> Result<StudyConfig> {
        if !path.is_file() {
            return Err(ParsweepError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let text = fs::read_to_string(path).map_err(|e| ParsweepError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        let raw: RawStudyFile = serde_json::from_str(&text).map_err(|e| {
            ParsweepError::ConfigurationError(format!("{}: {}", path.display(), e))
        })?;

        // 相对路径以配置文件所在目录为基准
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let base = fs::canonicalize(base).map_err(|e| ParsweepError::FileReadError {
            path: base.display().to_string(),
            source: e,
        })?;

        if raw.study_name.is_empty() || raw.study_name.contains(std::path::MAIN_SEPARATOR) {
            return Err(ParsweepError::ConfigurationError(format!(
                "study_name must be a non-empty directory name, got {:?}",
                raw.study_name
            )));
        }

        let mode = if raw.multiple_jobs_per_node {
            let executable_name = raw
                .executable_name
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    ParsweepError::ConfigurationError(
                        "multiple_jobs_per_node requires executable_name".to_string(),
                    )
                })?;
            JobScriptMode::NodePacking {
                executable_name: executable_name.to_string(),
                cores_per_node: overrides.cores_per_node.unwrap_or(raw.cores_per_node),
                cores_per_job: overrides.cores_per_job.unwrap_or(raw.cores_per_job),
            }
        } else {
            JobScriptMode::SingleJob
        };

        let mut params = BTreeMap::new();
        for (key, value) in &raw.parameters {
            params.insert(key.clone(), values_from_json(key, value)?);
        }
        let spec = ParameterSpec::new(params)?;

        Ok(StudyConfig {
            study_root: base.join(&raw.study_name),
            study_name: raw.study_name,
            input_file: base.join(&raw.input_file),
            submission_file: base.join(&raw.submission_file),
            assignment_separator: raw.assignment_separator,
            spec,
            mode,
        })
    }
}

/// JSON 数组 → 平铺或成组取值序列
///
/// 首元素是数组则整个键成组，此后不允许标量混入；反之全为标量。
fn values_from_json(key: &str, value: &serde_json::Value) -> Result<ParamValues> {
    let seq = value.as_array().ok_or_else(|| {
        ParsweepError::InvalidSpec(format!(
            "parameter '{}' must declare an array of values",
            key
        ))
    })?;

    let grouped = matches!(seq.first(), Some(serde_json::Value::Array(_)));
    if grouped {
        let mut groups = Vec::with_capacity(seq.len());
        for sub in seq {
            let sub = sub.as_array().ok_or_else(|| {
                ParsweepError::InvalidSpec(format!(
                    "grouped parameter '{}' mixes scalars and sequences",
                    key
                ))
            })?;
            groups.push(
                sub.iter()
                    .map(|v| scalar_from_json(key, v))
                    .collect::<Result<Vec<Scalar>>>()?,
            );
        }
        Ok(ParamValues::Grouped(groups))
    } else {
        Ok(ParamValues::Flat(
            seq.iter()
                .map(|v| scalar_from_json(key, v))
                .collect::<Result<Vec<Scalar>>>()?,
        ))
    }
}

/// JSON 标量 → 参数标量
fn scalar_from_json(key: &str, value: &serde_json::Value) -> Result<Scalar> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Scalar::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Scalar::Float(f))
            } else {
                Err(ParsweepError::InvalidSpec(format!(
                    "parameter '{}' holds an unrepresentable number: {}",
                    key, n
                )))
            }
        }
        serde_json::Value::String(s) => Ok(Scalar::Text(s.clone())),
        other => Err(ParsweepError::InvalidSpec(format!(
            "parameter '{}' holds an unsupported value: {}",
            key, other
        ))),
    }
}
