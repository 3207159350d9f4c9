//! # 作业脚本生成模块
//!
//! 两种互斥模式：
//! - 单作业模式：每个子目录一份默认提交脚本副本，仅改写作业名行。
//! - 节点装箱模式：把 N 个单位作业按顺序装入 ceil(N / 每节点作业数)
//!   份共享脚本，每份脚本后台启动箱内全部作业并以一条 `wait` 收尾，
//!   余数作业单独成箱。
//!
//! ## 依赖关系
//! - 被 `commands/build.rs` 使用
//! - 使用 `study/layout.rs`, `error.rs`

use crate::error::{ParsweepError, Result};
use crate::study::layout::StudyLayout;

use std::fs;
use std::path::{Path, PathBuf};

/// Slurm 作业名声明行的标记
pub const JOB_NAME_MARKER: &str = "#SBATCH --job-name=";

/// 把脚本中的作业名行改写为给定作业名
pub fn rewrite_job_name(content: &str, job_name: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        if line.contains(JOB_NAME_MARKER) {
            out.push_str(JOB_NAME_MARKER);
            out.push_str(job_name);
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

/// 单作业模式：向每个子目录写入作业名定制后的提交脚本副本
pub fn write_single_job_scripts(layout: &StudyLayout, default_script: &Path) -> Result<()> {
    let content = fs::read_to_string(default_script).map_err(|e| ParsweepError::FileReadError {
        path: default_script.display().to_string(),
        source: e,
    })?;
    let file_name = default_script
        .file_name()
        .ok_or_else(|| ParsweepError::ConfigurationError(format!(
            "submission file path has no file name: {}",
            default_script.display()
        )))?;

    for (dir, name) in layout.sub_dirs().iter().zip(layout.sub_names()) {
        let dst = dir.join(file_name);
        fs::write(&dst, rewrite_job_name(&content, name)).map_err(|e| {
            ParsweepError::FileWriteError {
                path: dst.display().to_string(),
                source: e,
            }
        })?;
    }
    Ok(())
}

/// 节点装箱结果：每节点作业数、整箱数与余数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePacking {
    pub jobs_per_node: usize,
    pub full_bins: usize,
    pub leftover: usize,
}

impl NodePacking {
    /// 需要生成的共享脚本总数（含余数箱）
    pub fn total_scripts(&self) -> usize {
        self.full_bins + usize::from(self.leftover > 0)
    }
}

/// 计算节点装箱参数
pub fn plan_packing(total_jobs: usize, cores_per_node: u32, cores_per_job: u32) -> Result<NodePacking> {
    if cores_per_job == 0 || cores_per_node == 0 {
        return Err(ParsweepError::ConfigurationError(
            "coresPerNode and coresPerJob must be positive".to_string(),
        ));
    }
    let jobs_per_node = (cores_per_node / cores_per_job) as usize;
    if jobs_per_node < 1 {
        return Err(ParsweepError::ConfigurationError(format!(
            "coresPerJob ({}) exceeds coresPerNode ({}); cannot fit a single job on a node",
            cores_per_job, cores_per_node
        )));
    }
    Ok(NodePacking {
        jobs_per_node,
        full_bins: total_jobs / jobs_per_node,
        leftover: total_jobs % jobs_per_node,
    })
}

/// 一个共享脚本覆盖的作业箱；`start`/`end` 为 1 起始的闭区间作业序号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobBin {
    pub start: usize,
    pub end: usize,
    pub dirs: Vec<PathBuf>,
}

impl JobBin {
    /// 共享脚本文件名，如 `jobs1-16.slurm`
    pub fn script_file_name(&self) -> String {
        format!("jobs{}-{}.slurm", self.start, self.end)
    }

    /// 脚本内使用的作业名，如 `jobs1-16`
    fn job_name(&self) -> String {
        format!("jobs{}-{}", self.start, self.end)
    }
}

/// 严格顺序装箱：箱 i 覆盖子目录 [i*jobsPerNode, (i+1)*jobsPerNode)
pub fn assign_bins(sub_dirs: &[PathBuf], packing: &NodePacking) -> Vec<JobBin> {
    let mut bins = Vec::with_capacity(packing.total_scripts());
    for i in 0..packing.full_bins {
        let lo = i * packing.jobs_per_node;
        let hi = lo + packing.jobs_per_node;
        bins.push(JobBin {
            start: lo + 1,
            end: hi,
            dirs: sub_dirs[lo..hi].to_vec(),
        });
    }
    if packing.leftover > 0 {
        let lo = packing.full_bins * packing.jobs_per_node;
        bins.push(JobBin {
            start: lo + 1,
            end: lo + packing.leftover,
            dirs: sub_dirs[lo..lo + packing.leftover].to_vec(),
        });
    }
    bins
}

/// 在默认脚本中定位唯一的可执行程序调用行
///
/// 返回行号（0 起始）与该行原文。找不到或出现多行都是致命错误。
pub fn find_invocation_line(content: &str, marker: &str, script: &Path) -> Result<(usize, String)> {
    let matches: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .filter(|(_, l)| l.contains(marker))
        .collect();

    match matches.as_slice() {
        [] => Err(ParsweepError::ExecutableLineNotFound {
            marker: marker.to_string(),
            path: script.display().to_string(),
        }),
        [(idx, line)] => Ok((*idx, line.to_string())),
        many => Err(ParsweepError::ExecutableLineAmbiguous {
            marker: marker.to_string(),
            path: script.display().to_string(),
            count: many.len(),
        }),
    }
}

/// 渲染一份共享脚本
///
/// 保留调用行之前的脚本前奏（作业名行改写为箱名），替换调用行为
/// 逐目录的 `cd` + 后台调用序列加 `wait` 屏障，再保留其后的尾奏。
pub fn render_shared_script(
    default_content: &str,
    invocation_idx: usize,
    invocation: &str,
    bin: &JobBin,
) -> String {
    let mut out = String::with_capacity(default_content.len());

    for (idx, line) in default_content.lines().enumerate() {
        if idx < invocation_idx {
            if line.contains(JOB_NAME_MARKER) {
                out.push_str(JOB_NAME_MARKER);
                out.push_str(&bin.job_name());
            } else {
                out.push_str(line);
            }
            out.push('\n');
        } else if idx == invocation_idx {
            out.push_str("# go to job sub-directories and start jobs then wait\n");
            for dir in &bin.dirs {
                out.push_str(&format!("cd {}\n", dir.display()));
                out.push_str(invocation);
                out.push_str("&\n");
            }
            out.push_str("wait\n");
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// 节点装箱模式：在 `jobScripts/` 下生成全部共享脚本
///
/// 返回生成的脚本路径，箱序即提交序。
pub fn write_shared_scripts(
    layout: &StudyLayout,
    default_script: &Path,
    executable_name: &str,
    packing: &NodePacking,
) -> Result<Vec<PathBuf>> {
    let content = fs::read_to_string(default_script).map_err(|e| ParsweepError::FileReadError {
        path: default_script.display().to_string(),
        source: e,
    })?;
    let (invocation_idx, invocation) =
        find_invocation_line(&content, executable_name, default_script)?;

    let scripts_dir = layout.job_scripts_dir();
    fs::create_dir(&scripts_dir).map_err(|e| ParsweepError::FileWriteError {
        path: scripts_dir.display().to_string(),
        source: e,
    })?;

    let mut paths = Vec::with_capacity(packing.total_scripts());
    for bin in assign_bins(layout.sub_dirs(), packing) {
        let rendered = render_shared_script(&content, invocation_idx, &invocation, &bin);
        let path = scripts_dir.join(bin.script_file_name());
        fs::write(&path, rendered).map_err(|e| ParsweepError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_SCRIPT: &str = "#!/bin/bash\n\
#SBATCH --job-name=default\n\
#SBATCH --nodes=1\n\
mpirun -np 1 solver input.dat\n\
echo done\n";

    fn dirs(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("/study/run{}", i))).collect()
    }

    #[test]
    fn test_rewrite_job_name() {
        let out = rewrite_job_name(DEFAULT_SCRIPT, "a0b2");
        assert!(out.contains("#SBATCH --job-name=a0b2\n"));
        assert!(!out.contains("job-name=default"));
        assert!(out.contains("mpirun -np 1 solver input.dat\n"));
    }

    #[test]
    fn test_packing_with_leftover() {
        let packing = plan_packing(10, 4, 1).unwrap();
        assert_eq!(packing.jobs_per_node, 4);
        assert_eq!(packing.full_bins, 2);
        assert_eq!(packing.leftover, 2);
        assert_eq!(packing.total_scripts(), 3);

        let bins = assign_bins(&dirs(10), &packing);
        assert_eq!(bins.len(), 3);
        assert_eq!((bins[0].start, bins[0].end), (1, 4));
        assert_eq!((bins[1].start, bins[1].end), (5, 8));
        assert_eq!((bins[2].start, bins[2].end), (9, 10));
        assert_eq!(bins[2].dirs, dirs(10)[8..].to_vec());
        assert_eq!(bins[2].script_file_name(), "jobs9-10.slurm");
    }

    #[test]
    fn test_packing_exact_fit_has_no_leftover() {
        let packing = plan_packing(8, 4, 1).unwrap();
        assert_eq!(packing.full_bins, 2);
        assert_eq!(packing.leftover, 0);
        assert_eq!(packing.total_scripts(), 2);
        assert_eq!(assign_bins(&dirs(8), &packing).len(), 2);
    }

    #[test]
    fn test_packing_jobs_per_node_from_cores() {
        let packing = plan_packing(10, 16, 4).unwrap();
        assert_eq!(packing.jobs_per_node, 4);
    }

    #[test]
    fn test_packing_rejects_oversized_jobs() {
        let err = plan_packing(4, 16, 32).unwrap_err();
        assert!(matches!(err, ParsweepError::ConfigurationError(_)));
    }

    #[test]
    fn test_find_invocation_line() {
        let (idx, line) =
            find_invocation_line(DEFAULT_SCRIPT, "solver", Path::new("run.slurm")).unwrap();
        assert_eq!(idx, 3);
        assert_eq!(line, "mpirun -np 1 solver input.dat");
    }

    #[test]
    fn test_missing_invocation_line_is_fatal() {
        let err =
            find_invocation_line(DEFAULT_SCRIPT, "nonexistent", Path::new("run.slurm")).unwrap_err();
        assert!(matches!(err, ParsweepError::ExecutableLineNotFound { .. }));
    }

    #[test]
    fn test_ambiguous_invocation_line_is_fatal() {
        let content = "solver a\nsolver b\n";
        let err = find_invocation_line(content, "solver", Path::new("run.slurm")).unwrap_err();
        assert!(matches!(
            err,
            ParsweepError::ExecutableLineAmbiguous { count: 2, .. }
        ));
    }

    #[test]
    fn test_render_shared_script_layout() {
        let bin = JobBin {
            start: 1,
            end: 2,
            dirs: dirs(2),
        };
        let out = render_shared_script(DEFAULT_SCRIPT, 3, "mpirun -np 1 solver input.dat", &bin);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "#!/bin/bash");
        assert_eq!(lines[1], "#SBATCH --job-name=jobs1-2");
        assert_eq!(lines[2], "#SBATCH --nodes=1");
        assert_eq!(lines[3], "# go to job sub-directories and start jobs then wait");
        assert_eq!(lines[4], "cd /study/run0");
        assert_eq!(lines[5], "mpirun -np 1 solver input.dat&");
        assert_eq!(lines[6], "cd /study/run1");
        assert_eq!(lines[7], "mpirun -np 1 solver input.dat&");
        assert_eq!(lines[8], "wait");
        // 调用行之后的尾奏保留
        assert_eq!(lines[9], "echo done");
    }

    #[test]
    fn test_write_shared_scripts_end_to_end() {
        use crate::study::layout::StudyLayout;
        use crate::study::spec::{ParamValues, ParameterSpec, Scalar};
        use std::collections::BTreeMap;

        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("run.slurm");
        std::fs::write(&script, DEFAULT_SCRIPT).unwrap();

        let mut params = BTreeMap::new();
        params.insert(
            "a".to_string(),
            ParamValues::Flat((0..5).map(Scalar::Int).collect()),
        );
        let spec = ParameterSpec::new(params).unwrap();
        let layout = StudyLayout::plan(tmp.path().join("study"), &spec.enumerate());
        layout.create().unwrap();

        let packing = plan_packing(5, 2, 1).unwrap();
        let paths = write_shared_scripts(&layout, &script, "solver", &packing).unwrap();

        assert_eq!(paths.len(), 3);
        assert!(layout.job_scripts_dir().join("jobs1-2.slurm").is_file());
        assert!(layout.job_scripts_dir().join("jobs5-5.slurm").is_file());

        let leftover = std::fs::read_to_string(&paths[2]).unwrap();
        assert!(leftover.contains("#SBATCH --job-name=jobs5-5"));
        assert_eq!(leftover.matches("&\n").count(), 1);
        assert!(leftover.contains("\nwait\n"));
    }
}
