//! # submit 命令实现
//!
//! 收集待提交单位并以有界并发依赖链提交到 Slurm，最后把全部作业
//! ID 按提交顺序写入 `jobIDs.txt`。
//!
//! ## 单位发现
//! 单作业模式按配置重新枚举（确定性）得到子目录顺序；节点装箱
//! 模式从 `jobScripts/` 收集共享脚本并按文件名中的起始作业序号
//! 排序。
//!
//! ## 依赖关系
//! - 使用 `cli/submit.rs` 定义的参数
//! - 使用 `study/`, `scheduler/`, `utils/output.rs`

use crate::cli::submit::SubmitArgs;
use crate::error::{ParsweepError, Result};
use crate::scheduler::chain::{submit_chain, SubmitUnit};
use crate::scheduler::slurm::SlurmScheduler;
use crate::study::config::{CoreOverrides, JobScriptMode, StudyConfig};
use crate::study::layout::{self, StudyLayout, JOB_SCRIPTS_DIR};
use crate::utils::output;

use regex::Regex;
use std::path::Path;
use std::time::Instant;
use walkdir::WalkDir;

/// 执行 submit 命令
pub fn execute(args: SubmitArgs) -> Result<()> {
    output::print_header("Parametric Study Submission");
    let start = Instant::now();

    let config = StudyConfig::load(&args.config, CoreOverrides::default())?;
    if !config.study_root.is_dir() {
        return Err(ParsweepError::StudyNotFound {
            path: config.study_root.display().to_string(),
        });
    }

    let units = collect_units(&config)?;
    output::print_info(&format!("Collected {} submission unit(s)", units.len()));

    if args.max_concurrent > units.len() {
        output::print_warning(&format!(
            "max_concurrent ({}) exceeds the number of units, adjusting to {}",
            args.max_concurrent,
            units.len()
        ));
    }

    if args.dry_run {
        for unit in &units {
            output::print_command(&format!("sbatch {}", unit.script.display()));
        }
        output::print_done("Dry run: no jobs were submitted");
        return Ok(());
    }

    let scheduler = SlurmScheduler::new();
    let ids = submit_chain(&scheduler, &units, args.max_concurrent)?;

    layout::write_job_ids(&config.study_root, &ids)?;
    output::print_success(&format!(
        "Recorded {} job id(s) in {}",
        ids.len(),
        config.study_root.join(layout::JOB_IDS_FILE).display()
    ));

    output::print_done(&format!(
        "Submitted {} job(s) in {:.2}s",
        ids.len(),
        start.elapsed().as_secs_f64()
    ));
    Ok(())
}

/// 按模式收集待提交单位，顺序即提交顺序
fn collect_units(config: &StudyConfig) -> Result<Vec<SubmitUnit>> {
    match &config.mode {
        JobScriptMode::SingleJob => {
            let sets = config.spec.enumerate();
            let planned = StudyLayout::plan(config.study_root.clone(), &sets);
            let file_name = config.submission_file.file_name().ok_or_else(|| {
                ParsweepError::ConfigurationError(format!(
                    "submission file path has no file name: {}",
                    config.submission_file.display()
                ))
            })?;

            let mut units = Vec::with_capacity(planned.sub_dirs().len());
            for dir in planned.sub_dirs() {
                let script = dir.join(file_name);
                if !script.is_file() {
                    return Err(ParsweepError::FileNotFound {
                        path: script.display().to_string(),
                    });
                }
                units.push(SubmitUnit {
                    script,
                    workdir: dir.clone(),
                });
            }
            Ok(units)
        }
        JobScriptMode::NodePacking { .. } => collect_shared_scripts(&config.study_root),
    }
}

/// 收集 `jobScripts/` 下的共享脚本并按起始作业序号排序
fn collect_shared_scripts(study_root: &Path) -> Result<Vec<SubmitUnit>> {
    let scripts_dir = study_root.join(JOB_SCRIPTS_DIR);
    if !scripts_dir.is_dir() {
        return Err(ParsweepError::StudyNotFound {
            path: scripts_dir.display().to_string(),
        });
    }

    let pattern = Regex::new(r"^jobs(\d+)-(\d+)\.slurm$").unwrap();
    let mut found = Vec::new();

    for entry in WalkDir::new(&scripts_dir).max_depth(1) {
        let entry = entry.map_err(|e| ParsweepError::FileReadError {
            path: scripts_dir.display().to_string(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(caps) = pattern.captures(&name) {
            // 文件名中的序号可靠，目录遍历顺序不可靠
            let start: usize = caps[1].parse().unwrap_or(usize::MAX);
            found.push((start, entry.into_path()));
        }
    }

    if found.is_empty() {
        return Err(ParsweepError::Other(format!(
            "no shared job scripts found in {}",
            scripts_dir.display()
        )));
    }

    found.sort_by_key(|(start, _)| *start);
    Ok(found
        .into_iter()
        .map(|(_, script)| SubmitUnit {
            script,
            workdir: scripts_dir.clone(),
        })
        .collect())
}
