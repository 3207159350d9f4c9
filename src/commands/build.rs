//! # build 命令实现
//!
//! 枚举参数组合，创建研究目录树，并行写出定制输入文件，再按模式
//! 生成作业脚本与研究信息文件。
//!
//! ## 流程
//! 1. 加载并校验配置（任何副作用之前）
//! 2. 枚举参数组合，创建根目录与子目录
//! 3. 并行落盘各子目录的输入文件
//! 4. 单作业脚本或节点装箱共享脚本
//! 5. 写 `parStudyInfo.txt`
//!
//! ## 依赖关系
//! - 使用 `cli/build.rs` 定义的参数
//! - 使用 `study/`, `batch/`, `utils/output.rs`

use crate::batch::{BatchRunner, TaskResult};
use crate::cli::build::BuildArgs;
use crate::error::{ParsweepError, Result};
use crate::study::config::{CoreOverrides, JobScriptMode, StudyConfig};
use crate::study::layout::{self, StudyLayout};
use crate::study::script;
use crate::study::template::{self, AssignmentLineMod};
use crate::utils::output;

use std::time::Instant;

/// 执行 build 命令
pub fn execute(args: BuildArgs) -> Result<()> {
    output::print_header("Parametric Study Build");
    let start = Instant::now();

    let config = StudyConfig::load(
        &args.config,
        CoreOverrides {
            cores_per_node: args.cores_per_node,
            cores_per_job: args.cores_per_job,
        },
    )?;

    // 两个模板文件必须在任何目录创建之前就位
    if !config.input_file.is_file() {
        return Err(ParsweepError::FileNotFound {
            path: config.input_file.display().to_string(),
        });
    }
    if !config.submission_file.is_file() {
        return Err(ParsweepError::FileNotFound {
            path: config.submission_file.display().to_string(),
        });
    }

    let sets = config.spec.enumerate();
    output::print_info(&format!("Enumerated {} unique parameter sets", sets.len()));

    let layout = StudyLayout::plan(config.study_root.clone(), &sets);
    layout.create()?;
    output::print_info(&format!(
        "Created study directory: {}",
        layout.root().display()
    ));

    // 子目录内容相互独立，并行写出输入文件
    let line_mod = AssignmentLineMod::new(&config.assignment_separator);
    let runner = BatchRunner::new(args.jobs);
    let result = runner.run(sets.len(), "Writing input files", |i| {
        match template::apply_template(&config.input_file, &sets[i], &line_mod, &layout.sub_dirs()[i])
        {
            Ok(()) => TaskResult::Success(layout.sub_names()[i].clone()),
            Err(e) => TaskResult::Failed(layout.sub_names()[i].clone(), e.to_string()),
        }
    });

    if result.failed > 0 {
        for (name, err) in &result.failures {
            output::print_error(&format!("{}: {}", name, err));
        }
        return Err(ParsweepError::Other(format!(
            "{} of {} input files could not be written",
            result.failed,
            result.total()
        )));
    }

    match &config.mode {
        JobScriptMode::SingleJob => {
            script::write_single_job_scripts(&layout, &config.submission_file)?;
            output::print_info(&format!(
                "Wrote {} per-directory submission scripts",
                sets.len()
            ));
        }
        JobScriptMode::NodePacking {
            executable_name,
            cores_per_node,
            cores_per_job,
        } => {
            let packing = script::plan_packing(sets.len(), *cores_per_node, *cores_per_job)?;
            output::print_info(&format!(
                "Assuming {} cores per node and {} core(s) per job: {} job(s) per node",
                cores_per_node, cores_per_job, packing.jobs_per_node
            ));
            let scripts =
                script::write_shared_scripts(&layout, &config.submission_file, executable_name, &packing)?;
            output::print_info(&format!(
                "Wrote {} shared node scripts ({} leftover job(s))",
                scripts.len(),
                packing.leftover
            ));
        }
    }

    layout::write_study_info(&layout, &config.spec)?;

    output::print_done(&format!(
        "Set up {} parameter sets in {:.2}s",
        sets.len(),
        start.elapsed().as_secs_f64()
    ));
    Ok(())
}
