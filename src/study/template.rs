//! # 输入文件模板模块
//!
//! 把默认输入文件按参数组合改写后放入各子目录。只有行首空白分隔
//! 记号恰好等于参数名的行才交给行修改器，其余行原样保留。
//!
//! ## 行修改器契约
//! `LineModifier::modify` 收到完整原始行、参数名与新值，返回含行
//! 终止符的完整替换行；对已匹配转发的行返回 `None` 视为契约违例，
//! 整个构建失败。
//!
//! ## 依赖关系
//! - 被 `commands/build.rs` 使用
//! - 使用 `study/spec.rs`, `error.rs`

use crate::error::{ParsweepError, Result};
use crate::study::spec::{ParamValue, ParameterSet, Scalar};

use std::fs;
use std::path::Path;

/// 输入文件行修改器
///
/// 外部可插拔的替换策略。实现方只需处理行内容本身，匹配哪些行
/// 由模板引擎决定。
pub trait LineModifier: Sync {
    /// 返回含行终止符的完整替换行，无法处理时返回 `None`
    fn modify(&self, line: &str, param: &str, value: &Scalar) -> Option<String>;
}

/// 处理 `名字<分隔符>值` 形式输入行的内置修改器
///
/// 对应最常见的 `param = value` 输入文件格式，分隔符可配置。
pub struct AssignmentLineMod {
    separator: String,
}

impl AssignmentLineMod {
    pub fn new(separator: &str) -> Self {
        AssignmentLineMod {
            separator: separator.to_string(),
        }
    }
}

impl LineModifier for AssignmentLineMod {
    fn modify(&self, line: &str, _param: &str, value: &Scalar) -> Option<String> {
        let (head, _) = line.split_once(&self.separator)?;
        Some(format!("{}{}{}\n", head, self.separator, value))
    }
}

/// 展开一个参数组合为（子参数名, 标量值）对
///
/// 成组键按 `-` 拆出子参数名；名字个数与组内序列个数的一致性在
/// 规格构造时已校验。
fn expand_assignments(set: &ParameterSet) -> Vec<(String, Scalar)> {
    let mut pairs = Vec::new();
    for (key, value) in set.iter() {
        match value {
            ParamValue::Single(v) => pairs.push((key.clone(), v.clone())),
            ParamValue::Group(vals) => {
                for (name, v) in key.split('-').filter(|s| !s.is_empty()).zip(vals) {
                    pairs.push((name.to_string(), v.clone()));
                }
            }
        }
    }
    pairs
}

/// 对文件内容逐参数应用行修改器
///
/// 独立出来便于测试；`apply_template` 负责外层的读写。
pub fn render(content: &str, set: &ParameterSet, line_mod: &dyn LineModifier) -> Result<String> {
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

    for (name, value) in expand_assignments(set) {
        for line in lines.iter_mut() {
            // 只转发行首记号与参数名完全相等的行
            let leading = line.split_whitespace().next();
            if leading != Some(name.as_str()) {
                continue;
            }
            let replaced =
                line_mod
                    .modify(line, &name, &value)
                    .ok_or_else(|| ParsweepError::LineModRejected {
                        param: name.clone(),
                        line: line.clone(),
                    })?;
            *line = replaced.trim_end_matches(['\r', '\n']).to_string();
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

/// 将默认输入文件的定制副本写入目标子目录
pub fn apply_template(
    default_file: &Path,
    set: &ParameterSet,
    line_mod: &dyn LineModifier,
    target_dir: &Path,
) -> Result<()> {
    let content = fs::read_to_string(default_file).map_err(|e| ParsweepError::FileReadError {
        path: default_file.display().to_string(),
        source: e,
    })?;

    let rendered = render(&content, set, line_mod)?;

    let file_name = default_file
        .file_name()
        .ok_or_else(|| ParsweepError::ConfigurationError(format!(
            "input file path has no file name: {}",
            default_file.display()
        )))?;
    let dst = target_dir.join(file_name);
    fs::write(&dst, rendered).map_err(|e| ParsweepError::FileWriteError {
        path: dst.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::spec::{ParamValues, ParameterSpec};
    use std::collections::BTreeMap;

    fn ints(vals: &[i64]) -> Vec<Scalar> {
        vals.iter().map(|v| Scalar::Int(*v)).collect()
    }

    fn one_set(params: BTreeMap<String, ParamValues>) -> ParameterSet {
        let spec = ParameterSpec::new(params).unwrap();
        spec.enumerate().into_iter().next().unwrap()
    }

    #[test]
    fn test_assignment_line_mod_replaces_value() {
        let mods = AssignmentLineMod::new(" = ");
        let out = mods.modify("dt = 0.1", "dt", &Scalar::Float(0.25)).unwrap();
        assert_eq!(out, "dt = 0.25\n");
    }

    #[test]
    fn test_assignment_line_mod_without_separator() {
        let mods = AssignmentLineMod::new(" = ");
        assert!(mods.modify("dt: 0.1", "dt", &Scalar::Int(1)).is_none());
    }

    #[test]
    fn test_render_only_touches_matching_lines() {
        let mut params = BTreeMap::new();
        params.insert("a".to_string(), ParamValues::Flat(ints(&[42])));
        let set = one_set(params);

        let content = "# comment about a\na = 0\nab = 5\nkeep = 1\n";
        let out = render(content, &set, &AssignmentLineMod::new(" = ")).unwrap();
        assert_eq!(out, "# comment about a\na = 42\nab = 5\nkeep = 1\n");
    }

    #[test]
    fn test_render_grouped_parameters() {
        let mut params = BTreeMap::new();
        params.insert(
            "c-d".to_string(),
            ParamValues::Grouped(vec![ints(&[8, 9]), ints(&[7, 3])]),
        );
        let set = one_set(params);

        let content = "c = 0\nd = 0\ne = 0\n";
        let out = render(content, &set, &AssignmentLineMod::new(" = ")).unwrap();
        assert_eq!(out, "c = 8\nd = 7\ne = 0\n");
    }

    #[test]
    fn test_render_rejects_unmodifiable_matching_line() {
        let mut params = BTreeMap::new();
        params.insert("a".to_string(), ParamValues::Flat(ints(&[1])));
        let set = one_set(params);

        // 行首记号匹配但没有分隔符，修改器返回 None
        let err = render("a 0\n", &set, &AssignmentLineMod::new(" = ")).unwrap_err();
        assert!(matches!(err, ParsweepError::LineModRejected { .. }));
    }

    #[test]
    fn test_apply_template_writes_into_target_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("input.dat");
        std::fs::write(&src, "a = 0\nb = 0\n").unwrap();
        let target = tmp.path().join("a7");
        std::fs::create_dir(&target).unwrap();

        let mut params = BTreeMap::new();
        params.insert("a".to_string(), ParamValues::Flat(ints(&[7])));
        let set = one_set(params);

        apply_template(&src, &set, &AssignmentLineMod::new(" = "), &target).unwrap();
        let written = std::fs::read_to_string(target.join("input.dat")).unwrap();
        assert_eq!(written, "a = 7\nb = 0\n");
    }
}
