//! 符号表
//!
//! 保存题目中使用的具名常量（如半径 `R`、载荷 `P`、`√2`），
//! 供表达式求值器替换使用。符号表可以被整体或部分覆盖，
//! 覆盖后由持有者显式触发重新解析。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 默认半径
pub const DEFAULT_RADIUS: f64 = 100.0;

/// 默认载荷
pub const DEFAULT_LOAD: f64 = 10.0;

/// 符号表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolTable {
    values: BTreeMap<String, f64>,
}

impl SymbolTable {
    /// 创建空符号表
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带默认值的符号表：`R = 100`，`P = 10`，`√2 = Sqrt[2] = 1.414…`
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.set("R", DEFAULT_RADIUS);
        table.set("P", DEFAULT_LOAD);
        table.set("√2", std::f64::consts::SQRT_2);
        table.set("Sqrt[2]", std::f64::consts::SQRT_2);
        table
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// 查询符号；未知符号返回 `None`，不提供默认值
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.values.remove(name)
    }

    /// 部分覆盖：`overrides` 中的值优先
    pub fn merge<I, K>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        for (name, value) in overrides {
            self.set(name, value);
        }
    }

    /// 返回合并覆盖后的新符号表，自身不变
    pub fn merged<I, K>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let mut table = self.clone();
        table.merge(overrides);
        table
    }

    /// 按名称排序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 复合符号（非普通标识符，如 `√2`、`Sqrt[2]`），按长度降序排列
    ///
    /// 长度相同时按名称排序，保证替换顺序确定。
    pub fn composite_tokens_longest_first(&self) -> Vec<(&str, f64)> {
        let mut tokens: Vec<(&str, f64)> = self
            .iter()
            .filter(|(name, _)| !is_identifier(name))
            .collect();
        tokens.sort_by(|a, b| {
            b.0.chars()
                .count()
                .cmp(&a.0.chars().count())
                .then_with(|| a.0.cmp(b.0))
        });
        tokens
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for SymbolTable {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        let mut table = Self::new();
        table.merge(iter);
        table
    }
}

/// 普通标识符：字母或下划线开头，后续为字母、数字或下划线
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let table = SymbolTable::with_defaults();
        assert_eq!(table.get("R"), Some(100.0));
        assert_eq!(table.get("P"), Some(10.0));
        assert_eq!(table.get("√2"), Some(std::f64::consts::SQRT_2));
        assert_eq!(table.get("Q"), None);
    }

    #[test]
    fn test_partial_override() {
        let table = SymbolTable::with_defaults().merged([("R", 50.0)]);
        assert_eq!(table.get("R"), Some(50.0));
        assert_eq!(table.get("P"), Some(10.0));
    }

    #[test]
    fn test_composite_tokens_order() {
        let table = SymbolTable::with_defaults();
        let tokens: Vec<&str> = table
            .composite_tokens_longest_first()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(tokens, vec!["Sqrt[2]", "√2"]);
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("R"));
        assert!(is_identifier("load_1"));
        assert!(!is_identifier("√2"));
        assert!(!is_identifier("Sqrt[2]"));
        assert!(!is_identifier("2R"));
        assert!(!is_identifier(""));
    }
}
