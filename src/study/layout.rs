//! # 目录结构与持久化文件模块
//!
//! 根据枚举出的参数组合生成子目录名、创建研究目录树，并负责
//! `parStudyInfo.txt` 与 `jobIDs.txt` 两个纯文本文件的读写。
//!
//! ## 命名规则
//! 子目录名是按键字典序拼接的 `<键><值>`（平铺键）或
//! `<键>-<值1>-<值2>...`（成组键）。不同参数组合产生相同名字
//! 属调用方责任，这里不做碰撞检测。
//!
//! ## 依赖关系
//! - 被 `commands/build.rs`, `commands/submit.rs`, `commands/cancel.rs` 使用
//! - 使用 `study/spec.rs`, `scheduler/slurm.rs`, `error.rs`

use crate::error::{ParsweepError, Result};
use crate::scheduler::slurm::JobId;
use crate::study::spec::{ParamValue, ParameterSet, ParameterSpec};

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// 研究信息文件名
pub const STUDY_INFO_FILE: &str = "parStudyInfo.txt";
/// 作业 ID 记录文件名
pub const JOB_IDS_FILE: &str = "jobIDs.txt";
/// 共享节点作业脚本目录名
pub const JOB_SCRIPTS_DIR: &str = "jobScripts";

/// 由一个参数组合构造子目录名
pub fn sub_dir_name(set: &ParameterSet) -> String {
    let mut name = String::new();
    for (key, value) in set.iter() {
        match value {
            ParamValue::Single(v) => {
                let _ = write!(name, "{}{}", key, v);
            }
            ParamValue::Group(vals) => {
                let _ = write!(name, "{}", key);
                for v in vals {
                    let _ = write!(name, "-{}", v);
                }
            }
        }
    }
    name
}

/// 研究目录树：根目录加每个参数组合一个子目录，顺序与枚举一致
#[derive(Debug, Clone)]
pub struct StudyLayout {
    root: PathBuf,
    sub_dirs: Vec<PathBuf>,
    sub_names: Vec<String>,
}

impl StudyLayout {
    /// 纯命名规划，不触碰文件系统
    pub fn plan(root: PathBuf, sets: &[ParameterSet]) -> StudyLayout {
        let sub_names: Vec<String> = sets.iter().map(sub_dir_name).collect();
        let sub_dirs = sub_names.iter().map(|n| root.join(n)).collect();
        StudyLayout {
            root,
            sub_dirs,
            sub_names,
        }
    }

    /// 创建根目录与全部子目录
    ///
    /// 根目录已存在时拒绝执行，不做合并或覆盖。
    pub fn create(&self) -> Result<()> {
        if self.root.exists() {
            return Err(ParsweepError::DirectoryExists {
                path: self.root.display().to_string(),
            });
        }
        fs::create_dir_all(&self.root).map_err(|e| ParsweepError::FileWriteError {
            path: self.root.display().to_string(),
            source: e,
        })?;

        for dir in &self.sub_dirs {
            fs::create_dir(dir).map_err(|e| ParsweepError::FileWriteError {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// 研究根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 子目录路径，规范枚举顺序
    pub fn sub_dirs(&self) -> &[PathBuf] {
        &self.sub_dirs
    }

    /// 子目录名，规范枚举顺序
    pub fn sub_names(&self) -> &[String] {
        &self.sub_names
    }

    /// 共享节点作业脚本目录
    pub fn job_scripts_dir(&self) -> PathBuf {
        self.root.join(JOB_SCRIPTS_DIR)
    }
}

/// 在研究根目录写出 `parStudyInfo.txt`
pub fn write_study_info(layout: &StudyLayout, spec: &ParameterSpec) -> Result<()> {
    let mut text = String::new();
    text.push_str("Parameters varied and their values:\n");
    for (key, values) in spec.iter() {
        let _ = writeln!(text, "{}:\t{}", key, values);
    }
    text.push_str("Unique parameter set directory names:\n");
    let mut names = layout.sub_names().to_vec();
    names.sort();
    for name in names {
        text.push_str(&name);
        text.push('\n');
    }

    let path = layout.root().join(STUDY_INFO_FILE);
    fs::write(&path, text).map_err(|e| ParsweepError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 将作业 ID 按提交顺序写入 `jobIDs.txt`，每行一个
pub fn write_job_ids(root: &Path, ids: &[JobId]) -> Result<()> {
    let mut text = String::new();
    for id in ids {
        let _ = writeln!(text, "{}", id);
    }
    let path = root.join(JOB_IDS_FILE);
    fs::write(&path, text).map_err(|e| ParsweepError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 从 `jobIDs.txt` 读回作业 ID 列表
pub fn read_job_ids(root: &Path) -> Result<Vec<JobId>> {
    let path = root.join(JOB_IDS_FILE);
    if !path.is_file() {
        return Err(ParsweepError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let text = fs::read_to_string(&path).map_err(|e| ParsweepError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(JobId::new)
        .collect())
}
