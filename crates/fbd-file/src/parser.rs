//! 题目几何解析器
//!
//! 将原始文档在给定符号表下求值为完全数值化的 [`Problem`]。
//! 解析不修改文档与符号表；符号变化后由调用方重新调用。

use crate::document::{BodyDocument, ForceDocument, PointDocument, ProblemDocument};
use crate::error::FileError;
use fbd_core::expression::{evaluate_with_policy, EvalPolicy};
use fbd_core::problem::{Direction, Force, Point, Problem, RigidBody};
use fbd_core::symbols::SymbolTable;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 缺省的题目编号
pub const DEFAULT_PROBLEM_ID: &str = "0";

/// 缺省的题目描述
pub const DEFAULT_DESCRIPTION: &str = "Free-body diagram problem";

/// 缺省表达式（缺少坐标/量值时使用）
const DEFAULT_EXPRESSION: &str = "0";

/// 解析选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    /// 表达式求值失败时的策略
    pub policy: EvalPolicy,
}

impl ParserOptions {
    pub fn strict() -> Self {
        Self {
            policy: EvalPolicy::Strict,
        }
    }
}

/// 题目解析器
#[derive(Debug, Clone, Default)]
pub struct ProblemParser {
    options: ParserOptions,
}

impl ProblemParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// 解析文档；刚体按文档顺序输出
    pub fn parse(
        &self,
        document: &ProblemDocument,
        symbols: &SymbolTable,
    ) -> Result<Problem, FileError> {
        let id = document
            .id
            .clone()
            .unwrap_or_else(|| DEFAULT_PROBLEM_ID.to_string());

        let bodies = document
            .bodies
            .iter()
            .enumerate()
            .map(|(index, body)| self.parse_body(index, body, symbols))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(problem = %id, bodies = bodies.len(), "Parsed problem");

        Ok(Problem {
            title: format!("Problem {}", id),
            description: DEFAULT_DESCRIPTION.to_string(),
            id,
            bodies,
            symbols: symbols.clone(),
        })
    }

    pub fn parse_xml(&self, xml: &str, symbols: &SymbolTable) -> Result<Problem, FileError> {
        self.parse(&ProblemDocument::from_xml(xml)?, symbols)
    }

    pub fn parse_json(&self, json: &str, symbols: &SymbolTable) -> Result<Problem, FileError> {
        self.parse(&ProblemDocument::from_json(json)?, symbols)
    }

    /// 以新符号表重新解析，保留上一次结果的标题与描述
    pub fn reparse_preserving(
        &self,
        previous: &Problem,
        document: &ProblemDocument,
        symbols: &SymbolTable,
    ) -> Result<Problem, FileError> {
        let problem = self.parse(document, symbols)?.with_metadata_from(previous);
        tracing::info!(problem = %problem.id, "Re-parsed problem with updated symbols");
        Ok(problem)
    }

    fn parse_body(
        &self,
        index: usize,
        body: &BodyDocument,
        symbols: &SymbolTable,
    ) -> Result<RigidBody, FileError> {
        let name = match body.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(FileError::EmptyBodyName { index }),
        };

        let is_ground = match body.is_ground.as_deref() {
            None | Some("False") => false,
            Some("True") => true,
            Some(other) => {
                tracing::warn!(body = %name, value = other, "Unexpected IsGround value, treating as False");
                false
            }
        };

        let mut seen = HashSet::new();
        let mut points = Vec::with_capacity(body.points.len());
        for point in &body.points {
            let point = self.parse_point(&name, point, symbols)?;
            if !seen.insert(point.name.clone()) {
                return Err(FileError::DuplicatePoint {
                    body: name,
                    point: point.name,
                });
            }
            points.push(point);
        }

        let forces = body
            .forces
            .iter()
            .map(|force| self.parse_force(&name, force, &seen, symbols))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RigidBody {
            name,
            is_ground,
            image: body.image.clone(),
            points,
            forces,
        })
    }

    fn parse_point(
        &self,
        body: &str,
        point: &PointDocument,
        symbols: &SymbolTable,
    ) -> Result<Point, FileError> {
        let name = match point.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(FileError::EmptyPointName {
                    body: body.to_string(),
                })
            }
        };

        let x = self.evaluate(body, &format!("{}.X", name), point.x.as_deref(), symbols)?;
        let y = self.evaluate(body, &format!("{}.Y", name), point.y.as_deref(), symbols)?;
        Ok(Point::new(name, x, y))
    }

    fn parse_force(
        &self,
        body: &str,
        force: &ForceDocument,
        points: &HashSet<String>,
        symbols: &SymbolTable,
    ) -> Result<Force, FileError> {
        let point = force.point.clone().unwrap_or_default();
        if !points.contains(&point) {
            return Err(FileError::DanglingForce {
                body: body.to_string(),
                point,
            });
        }

        let direction = match force.direction.as_deref() {
            None => Direction::default(),
            Some(token) => token
                .parse::<Direction>()
                .map_err(|_| FileError::UnknownDirection {
                    body: body.to_string(),
                    direction: token.to_string(),
                })?,
        };

        let magnitude = self.evaluate(
            body,
            &format!("{}.Mag", point),
            force.magnitude.as_deref(),
            symbols,
        )?;

        Ok(Force {
            point,
            direction,
            magnitude,
            preset: true,
        })
    }

    fn evaluate(
        &self,
        body: &str,
        field: &str,
        expression: Option<&str>,
        symbols: &SymbolTable,
    ) -> Result<f64, FileError> {
        let expression = expression.unwrap_or(DEFAULT_EXPRESSION);
        evaluate_with_policy(expression, symbols, self.options.policy).map_err(|source| {
            FileError::Eval {
                body: body.to_string(),
                field: field.to_string(),
                expression: expression.to_string(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbd_core::expression::EvalError;

    fn xml(body: &str) -> String {
        format!("<Problem id=\"9\">{}</Problem>", body)
    }

    fn parse(body: &str) -> Result<Problem, FileError> {
        ProblemParser::default().parse_xml(&xml(body), &SymbolTable::with_defaults())
    }

    #[test]
    fn test_defaults() {
        let problem = parse(
            r#"<RigidBody Name="G"><Point Name="A" X="R" /><ExternalForce Point="A" /></RigidBody>"#,
        )
        .unwrap();

        assert_eq!(problem.title, "Problem 9");
        assert_eq!(problem.description, "Free-body diagram problem");

        let body = &problem.bodies[0];
        assert!(!body.is_ground);
        assert_eq!(body.points[0], Point::new("A", 100.0, 0.0));
        assert_eq!(body.forces[0].direction, Direction::Down);
        assert_eq!(body.forces[0].magnitude, 0.0);
        assert!(body.forces[0].preset);
    }

    #[test]
    fn test_missing_id() {
        let problem = ProblemParser::default()
            .parse_xml("<Problem></Problem>", &SymbolTable::with_defaults())
            .unwrap();
        assert_eq!(problem.id, "0");
        assert_eq!(problem.title, "Problem 0");
        assert!(problem.bodies.is_empty());
    }

    #[test]
    fn test_ground_flag_is_case_sensitive() {
        let problem = parse(
            r#"<RigidBody Name="A" IsGround="True"/><RigidBody Name="B" IsGround="true"/><RigidBody Name="C" IsGround="False"/>"#,
        )
        .unwrap();
        let flags: Vec<bool> = problem.bodies.iter().map(|b| b.is_ground).collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn test_duplicate_body_names_kept_in_order() {
        let problem = parse(
            r#"<RigidBody Name="G" IsGround="True"><Point Name="A" X="-R"/></RigidBody><RigidBody Name="G" IsGround="True"><Point Name="B" X="R"/></RigidBody>"#,
        )
        .unwrap();
        assert_eq!(problem.bodies.len(), 2);
        assert_eq!(problem.bodies[0].points[0].name, "A");
        assert_eq!(problem.bodies[1].points[0].name, "B");
    }

    #[test]
    fn test_rejects_duplicate_point() {
        let err = parse(r#"<RigidBody Name="AC"><Point Name="A"/><Point Name="A" X="1"/></RigidBody>"#)
            .unwrap_err();
        assert!(matches!(err, FileError::DuplicatePoint { ref body, ref point } if body == "AC" && point == "A"));
    }

    #[test]
    fn test_rejects_dangling_force() {
        let err = parse(
            r#"<RigidBody Name="AC"><Point Name="A"/><ExternalForce Point="mid" Dir="down" Mag="P"/></RigidBody>"#,
        )
        .unwrap_err();
        assert!(matches!(err, FileError::DanglingForce { ref point, .. } if point == "mid"));
    }

    #[test]
    fn test_rejects_unknown_direction() {
        let err = parse(
            r#"<RigidBody Name="AC"><Point Name="A"/><ExternalForce Point="A" Dir="Down"/></RigidBody>"#,
        )
        .unwrap_err();
        assert!(matches!(err, FileError::UnknownDirection { ref direction, .. } if direction == "Down"));
    }

    #[test]
    fn test_rejects_empty_names() {
        assert!(matches!(
            parse(r#"<RigidBody><Point Name="A"/></RigidBody>"#),
            Err(FileError::EmptyBodyName { index: 0 })
        ));
        assert!(matches!(
            parse(r#"<RigidBody Name="AC"><Point Name="" X="1"/></RigidBody>"#),
            Err(FileError::EmptyPointName { .. })
        ));
    }

    #[test]
    fn test_evaluation_policy() {
        let body = r#"<RigidBody Name="AC"><Point Name="A" X="Q*2"/></RigidBody>"#;

        let lenient = parse(body).unwrap();
        assert_eq!(lenient.bodies[0].points[0].x, 0.0);

        let strict = ProblemParser::new(ParserOptions::strict())
            .parse_xml(&xml(body), &SymbolTable::with_defaults())
            .unwrap_err();
        match strict {
            FileError::Eval {
                body,
                field,
                expression,
                source,
            } => {
                assert_eq!(body, "AC");
                assert_eq!(field, "A.X");
                assert_eq!(expression, "Q*2");
                assert_eq!(source, EvalError::UnknownSymbol("Q".to_string()));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_reparse_preserving_metadata() {
        let document = ProblemDocument::from_xml(&xml(
            r#"<RigidBody Name="AC"><Point Name="A" X="-R" Y="0"/></RigidBody>"#,
        ))
        .unwrap();
        let parser = ProblemParser::default();

        let mut first = parser.parse(&document, &SymbolTable::with_defaults()).unwrap();
        first.title = "Custom title".to_string();
        first.description = "Custom description".to_string();

        let symbols = SymbolTable::with_defaults().merged([("R", 40.0)]);
        let second = parser.reparse_preserving(&first, &document, &symbols).unwrap();
        assert_eq!(second.title, "Custom title");
        assert_eq!(second.description, "Custom description");
        assert_eq!(second.bodies[0].points[0].x, -40.0);
        assert_eq!(second.symbols.get("R"), Some(40.0));
    }

    #[test]
    fn test_document_reusable_across_parses() {
        let document = ProblemDocument::from_xml(&xml(
            r#"<RigidBody Name="AC"><Point Name="A" X="-R/√2"/><ExternalForce Point="A" Dir="up" Mag="P"/></RigidBody>"#,
        ))
        .unwrap();
        let before = document.clone();
        let parser = ProblemParser::default();

        let first = parser.parse(&document, &SymbolTable::with_defaults()).unwrap();
        let second = parser
            .parse(&document, &SymbolTable::with_defaults().merged([("R", 50.0)]))
            .unwrap();
        assert_eq!(document, before);
        assert_eq!(first.bodies[0].points[0].y, 0.0);
        assert!((first.bodies[0].points[0].x - 2.0 * second.bodies[0].points[0].x).abs() < 1e-9);
    }
}
