//! 题目目录
//!
//! 保存题目文档及其解析结果，持有一份目录级符号表。
//! 符号更新后重新解析目录中的全部题目，标题与描述保持不变。

use crate::document::ProblemDocument;
use crate::error::FileError;
use crate::parser::ProblemParser;
use fbd_core::problem::Problem;
use fbd_core::symbols::SymbolTable;
use std::collections::BTreeMap;

/// 内置题目 6 的编号
pub const BUILTIN_PROBLEM_ID: &str = "6";

/// 内置题目 6：两段四分之一圆弧刚体与两个地面支座
pub const PROBLEM_6_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Problem id="6">
  <RigidBody Name="AC" IsGround="False">
    <ImageFile>assets/AC.png</ImageFile>
    <Point Name="A" X="-R" Y="0" />
    <Point Name="mid" X="-R/√2" Y="R/√2" />
    <Point Name="C" X="0" Y="R" />
    <ExternalForce Point="mid" Dir="down" Mag="P" />
  </RigidBody>
  <RigidBody Name="CB" IsGround="False">
    <ImageFile>assets/CB.png</ImageFile>
    <Point Name="C" X="0" Y="R" />
    <Point Name="mid" X="R/√2" Y="R/√2" />
    <Point Name="B" X="R" Y="0" />
    <ExternalForce Point="mid" Dir="down" Mag="P" />
  </RigidBody>
  <RigidBody Name="A_Ground" IsGround="True">
    <Point Name="A" X="-R" Y="0" />
  </RigidBody>
  <RigidBody Name="B_Ground" IsGround="True">
    <Point Name="B" X="R" Y="0" />
  </RigidBody>
</Problem>"#;

const PROBLEM_6_TITLE: &str = "Problem #6: Quarter-Circle Rigid Bodies";

const PROBLEM_6_DESCRIPTION: &str = "Two quarter-circle rigid bodies AC and CB with downward loads P at their mid-points. Draw the free-body diagram showing all forces and reactions.";

#[derive(Debug, Clone)]
struct Entry {
    document: ProblemDocument,
    problem: Problem,
}

/// 题目目录
#[derive(Debug, Clone)]
pub struct ProblemCatalogue {
    parser: ProblemParser,
    symbols: SymbolTable,
    entries: BTreeMap<String, Entry>,
}

impl ProblemCatalogue {
    pub fn new(parser: ProblemParser, symbols: SymbolTable) -> Self {
        Self {
            parser,
            symbols,
            entries: BTreeMap::new(),
        }
    }

    /// 默认符号表，并注册内置题目 6
    pub fn with_builtin() -> Result<Self, FileError> {
        Self::with_builtin_using(ProblemParser::default(), SymbolTable::with_defaults())
    }

    pub fn with_builtin_using(parser: ProblemParser, symbols: SymbolTable) -> Result<Self, FileError> {
        let mut catalogue = Self::new(parser, symbols);
        let problem = catalogue.insert(ProblemDocument::from_xml(PROBLEM_6_XML)?)?;
        problem.title = PROBLEM_6_TITLE.to_string();
        problem.description = PROBLEM_6_DESCRIPTION.to_string();
        tracing::info!(problem = BUILTIN_PROBLEM_ID, "Loaded built-in problem");
        Ok(catalogue)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// 解析并登记文档（以文档编号为键，已存在则替换）
    pub fn insert(&mut self, document: ProblemDocument) -> Result<&mut Problem, FileError> {
        let problem = self.parser.parse(&document, &self.symbols)?;
        let id = problem.id.clone();
        let entry = Entry { document, problem };

        let slot = match self.entries.entry(id) {
            std::collections::btree_map::Entry::Occupied(mut o) => {
                o.insert(entry);
                o.into_mut()
            }
            std::collections::btree_map::Entry::Vacant(v) => v.insert(entry),
        };
        Ok(&mut slot.problem)
    }

    pub fn get(&self, id: &str) -> Option<&Problem> {
        self.entries.get(id).map(|e| &e.problem)
    }

    pub fn document(&self, id: &str) -> Option<&ProblemDocument> {
        self.entries.get(id).map(|e| &e.document)
    }

    /// 所有题目，按编号排序
    pub fn all(&self) -> impl Iterator<Item = &Problem> {
        self.entries.values().map(|e| &e.problem)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 合并符号覆盖并重新解析目录中的全部题目，保留各自的标题与描述
    ///
    /// 返回 `id` 对应的题目。任一题目解析失败时目录保持原状。
    pub fn update_symbols<I, K>(&mut self, id: &str, overrides: I) -> Result<&Problem, FileError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        if !self.entries.contains_key(id) {
            return Err(FileError::UnknownProblem(id.to_string()));
        }

        let symbols = self.symbols.merged(overrides);
        let mut reparsed = Vec::with_capacity(self.entries.len());
        for (key, entry) in &self.entries {
            let problem = self
                .parser
                .reparse_preserving(&entry.problem, &entry.document, &symbols)?;
            reparsed.push((key.clone(), problem));
        }

        for (key, problem) in reparsed {
            if let Some(entry) = self.entries.get_mut(&key) {
                entry.problem = problem;
            }
        }
        self.symbols = symbols;
        tracing::debug!(problems = self.entries.len(), "Re-derived geometry after symbol update");

        self.get(id)
            .ok_or_else(|| FileError::UnknownProblem(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_problem() {
        let catalogue = ProblemCatalogue::with_builtin().unwrap();
        assert_eq!(catalogue.len(), 1);

        let problem = catalogue.get("6").unwrap();
        assert_eq!(problem.title, "Problem #6: Quarter-Circle Rigid Bodies");
        assert!(problem.description.starts_with("Two quarter-circle rigid bodies AC and CB"));
        assert_eq!(problem.bodies.len(), 4);
        assert_eq!(problem.bodies[0].image.as_deref(), Some("assets/AC.png"));
        assert!(catalogue.get("7").is_none());
    }

    #[test]
    fn test_update_symbols_preserves_metadata() {
        let mut catalogue = ProblemCatalogue::with_builtin().unwrap();
        let problem = catalogue.update_symbols("6", [("R", 50.0)]).unwrap();

        assert_eq!(problem.title, "Problem #6: Quarter-Circle Rigid Bodies");
        assert_eq!(problem.body("AC").unwrap().point("A").unwrap().x, -50.0);
        assert_eq!(catalogue.symbols().get("R"), Some(50.0));
        assert_eq!(catalogue.symbols().get("P"), Some(10.0));
    }

    #[test]
    fn test_update_unknown_problem() {
        let mut catalogue = ProblemCatalogue::with_builtin().unwrap();
        assert!(matches!(
            catalogue.update_symbols("42", [("R", 1.0)]),
            Err(FileError::UnknownProblem(_))
        ));
    }

    #[test]
    fn test_failed_reparse_keeps_previous_state() {
        let mut catalogue = ProblemCatalogue::with_builtin_using(
            ProblemParser::new(crate::parser::ParserOptions::strict()),
            SymbolTable::with_defaults(),
        )
        .unwrap();

        // 除零得到非有限值，严格模式下报错
        assert!(catalogue.update_symbols("6", [("√2", 0.0)]).is_err());
        assert_eq!(catalogue.symbols().get("√2"), Some(std::f64::consts::SQRT_2));
        assert_eq!(catalogue.get("6").unwrap().bodies[0].points[0].x, -100.0);
    }

    #[test]
    fn test_insert_and_all_in_id_order() {
        let mut catalogue = ProblemCatalogue::with_builtin().unwrap();
        let document =
            ProblemDocument::from_xml(r#"<Problem id="12"><RigidBody Name="AC"/></Problem>"#).unwrap();
        catalogue.insert(document).unwrap();

        let ids: Vec<&str> = catalogue.all().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["12", "6"]);
        assert_eq!(catalogue.get("12").unwrap().title, "Problem 12");
    }

    #[test]
    fn test_update_symbols_rederives_every_problem() {
        let mut catalogue = ProblemCatalogue::with_builtin().unwrap();
        let document = ProblemDocument::from_xml(
            r#"<Problem id="12"><RigidBody Name="G" IsGround="True"><Point Name="A" X="R" Y="0"/></RigidBody></Problem>"#,
        )
        .unwrap();
        catalogue.insert(document).unwrap();
        assert_eq!(catalogue.get("12").unwrap().bodies[0].points[0].x, 100.0);

        catalogue.update_symbols("6", [("R", 50.0)]).unwrap();
        assert_eq!(catalogue.symbols().get("R"), Some(50.0));
        assert_eq!(catalogue.get("6").unwrap().bodies[0].points[0].x, -50.0);
        assert_eq!(catalogue.get("12").unwrap().bodies[0].points[0].x, 50.0);
        assert_eq!(catalogue.get("12").unwrap().title, "Problem 12");
    }

    #[test]
    fn test_failure_in_other_problem_keeps_all_state() {
        let mut catalogue = ProblemCatalogue::with_builtin_using(
            ProblemParser::new(crate::parser::ParserOptions::strict()),
            SymbolTable::with_defaults(),
        )
        .unwrap();
        let document = ProblemDocument::from_xml(
            r#"<Problem id="12"><RigidBody Name="G" IsGround="True"><Point Name="A" X="1/Q" Y="0"/></RigidBody></Problem>"#,
        )
        .unwrap();
        catalogue.update_symbols("6", [("Q", 2.0)]).unwrap();
        catalogue.insert(document).unwrap();

        // 题目 12 在 Q=0 时求值失败，题目 6 也不应更新
        assert!(catalogue.update_symbols("6", [("Q", 0.0), ("R", 50.0)]).is_err());
        assert_eq!(catalogue.symbols().get("R"), Some(100.0));
        assert_eq!(catalogue.get("6").unwrap().bodies[0].points[0].x, -100.0);
        assert_eq!(catalogue.get("12").unwrap().bodies[0].points[0].x, 0.5);
    }
}
