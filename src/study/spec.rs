//! # 参数规格与枚举模块
//!
//! 定义参数扫描的数据模型（标量、平铺/成组参数序列），并将参数规格
//! 展开为全部唯一参数组合的规范有序列表。
//!
//! ## 枚举顺序
//! 先按字典序遍历参数键做混合进制（里程表）计数生成全集，再按
//! 各组合的取值元组（键排序后）整体排序，得到与哈希表遍历顺序
//! 无关的确定性序列。
//!
//! ## 依赖关系
//! - 被 `study/config.rs`, `study/layout.rs`, `study/template.rs` 使用
//! - 使用 `error.rs`

use crate::error::{ParsweepError, Result};

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// 参数标量值
#[derive(Debug, Clone)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// 数值与文本之间的全序比较（数值 < 文本，数值间按大小）
    fn total_order(&self, other: &Scalar) -> Ordering {
        use Scalar::*;
        match (self, other) {
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Int(a), Float(b)) => (*a as f64).total_cmp(b),
            (Float(a), Int(b)) => a.total_cmp(&(*b as f64)),
            (Text(a), Text(b)) => a.cmp(b),
            (Text(_), _) => Ordering::Greater,
            (_, Text(_)) => Ordering::Less,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Text(v) => write!(f, "{}", v),
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.total_order(other) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.total_order(other))
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_order(other)
    }
}

/// 一个参数键声明的取值序列
///
/// 平铺键：值序列逐个交叉相乘；成组键（如 `"c-d"`）：多个子参数
/// 等长序列同步变化。变体在配置解析时确定，运行期不再做结构推断。
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValues {
    Flat(Vec<Scalar>),
    Grouped(Vec<Vec<Scalar>>),
}

impl ParamValues {
    /// 该键在扫描中取值的个数
    pub fn arity(&self) -> usize {
        match self {
            ParamValues::Flat(vals) => vals.len(),
            ParamValues::Grouped(groups) => groups.first().map_or(0, |g| g.len()),
        }
    }

    /// 取第 `idx` 个赋值（成组键按子参数声明顺序取同一列）
    fn assignment(&self, idx: usize) -> ParamValue {
        match self {
            ParamValues::Flat(vals) => ParamValue::Single(vals[idx].clone()),
            ParamValues::Grouped(groups) => {
                ParamValue::Group(groups.iter().map(|g| g[idx].clone()).collect())
            }
        }
    }
}

impl fmt::Display for ParamValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_list(f: &mut fmt::Formatter<'_>, vals: &[Scalar]) -> fmt::Result {
            write!(f, "[")?;
            for (i, v) in vals.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", v)?;
            }
            write!(f, "]")
        }

        match self {
            ParamValues::Flat(vals) => write_list(f, vals),
            ParamValues::Grouped(groups) => {
                write!(f, "[")?;
                for (i, g) in groups.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_list(f, g)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// 一个参数键上的具体赋值
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParamValue {
    Single(Scalar),
    Group(Vec<Scalar>),
}

/// 一个唯一参数组合（键 → 赋值）
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    /// 按键字典序迭代赋值
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }

    /// 规范排序用的取值元组（键排序后）
    fn sort_key(&self) -> Vec<&ParamValue> {
        self.values.values().collect()
    }
}

/// 完整的参数扫描规格
///
/// 构造时完成全部校验（非空、组内等长、成组键名可拆分），之后
/// 不可变。`BTreeMap` 保证键的字典序遍历。
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    params: BTreeMap<String, ParamValues>,
}

impl ParameterSpec {
    /// 校验并构造参数规格
    pub fn new(params: BTreeMap<String, ParamValues>) -> Result<Self> {
        if params.is_empty() {
            return Err(ParsweepError::InvalidSpec(
                "no parameters declared".to_string(),
            ));
        }

        for (key, vals) in &params {
            match vals {
                ParamValues::Flat(seq) => {
                    if seq.is_empty() {
                        return Err(ParsweepError::InvalidSpec(format!(
                            "parameter '{}' has an empty value sequence",
                            key
                        )));
                    }
                }
                ParamValues::Grouped(groups) => {
                    if groups.is_empty() {
                        return Err(ParsweepError::InvalidSpec(format!(
                            "grouped parameter '{}' declares no sub-parameters",
                            key
                        )));
                    }
                    let arity = groups[0].len();
                    if arity == 0 {
                        return Err(ParsweepError::InvalidSpec(format!(
                            "grouped parameter '{}' has an empty value sequence",
                            key
                        )));
                    }
                    // 成组但只有一个取值列：按调用方错误处理
                    if arity == 1 {
                        return Err(ParsweepError::InvalidSpec(format!(
                            "grouped parameter '{}' has arity 1; use a flat parameter instead",
                            key
                        )));
                    }
                    if groups.iter().any(|g| g.len() != arity) {
                        return Err(ParsweepError::InvalidSpec(format!(
                            "grouped parameter '{}' has sub-sequences of unequal length",
                            key
                        )));
                    }
                    // 成组键名必须按 '-' 拆出与子参数个数相同的名字
                    let names = key.split('-').filter(|s| !s.is_empty()).count();
                    if names != groups.len() {
                        return Err(ParsweepError::MalformedGroupKey {
                            key: key.clone(),
                            names,
                            arity: groups.len(),
                        });
                    }
                }
            }
        }

        Ok(ParameterSpec { params })
    }

    /// 按键字典序迭代（键, 取值序列）
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValues)> {
        self.params.iter()
    }

    /// 唯一参数组合总数 = 各键取值个数之积
    pub fn total_sets(&self) -> usize {
        self.params.values().map(|v| v.arity()).product()
    }

    /// 展开为全部唯一参数组合的规范有序列表
    pub fn enumerate(&self) -> Vec<ParameterSet> {
        let total = self.total_sets();
        let mut sets: Vec<BTreeMap<String, ParamValue>> = vec![BTreeMap::new(); total];

        // 里程表计数：键按字典序处理，步长随键的取值个数累乘，
        // 字典序靠前的键变化最慢
        let mut skip = 1usize;
        for (key, vals) in &self.params {
            let arity = vals.arity();
            for (i, set) in sets.iter_mut().enumerate() {
                let idx = (i / skip) % arity;
                set.insert(key.clone(), vals.assignment(idx));
            }
            skip *= arity;
        }

        let mut sets: Vec<ParameterSet> = sets
            .into_iter()
            .map(|values| ParameterSet { values })
            .collect();

        // 按取值元组整体排序，与生成顺序无关的规范化
        sets.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        sets
    }
}
