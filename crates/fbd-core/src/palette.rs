//! 刚体调色板
//!
//! 把题目中的刚体模板列成可选条目，每个条目带一个缩略图。
//! 选中条目后先用 [`Palette::template`] 取回刚体模板，
//! 再交给 [`Canvas::place_body`](crate::canvas::Canvas::place_body)。

use crate::arc::{ArcGeometry, ArcRegistry, THUMBNAIL_PADDING};
use crate::problem::{Problem, RigidBody};
use serde::{Deserialize, Serialize};

/// 缩略图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Thumbnail {
    Arc(ArcGeometry),
    /// 地面支座符号，附带其 viewBox
    GroundSupport { view_box: String },
    /// 生成器报错时的通用占位
    Placeholder { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    /// 在 `Problem::bodies` 中的位置（同名刚体以此区分）
    pub template_index: usize,
    pub name: String,
    pub is_ground: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub thumbnail: Thumbnail,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub entries: Vec<PaletteEntry>,
}

impl Palette {
    pub fn from_problem(problem: &Problem, registry: &ArcRegistry) -> Self {
        let entries = problem
            .bodies
            .iter()
            .enumerate()
            .map(|(template_index, body)| PaletteEntry {
                template_index,
                name: body.name.clone(),
                is_ground: body.is_ground,
                image: body.image.clone(),
                thumbnail: thumbnail(body, registry),
            })
            .collect();
        Self { entries }
    }

    /// 条目对应的模板
    pub fn template<'a>(&self, problem: &'a Problem, entry: usize) -> Option<&'a RigidBody> {
        let entry = self.entries.get(entry)?;
        problem.bodies.get(entry.template_index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn thumbnail(body: &RigidBody, registry: &ArcRegistry) -> Thumbnail {
    if body.is_ground {
        let p = THUMBNAIL_PADDING;
        return Thumbnail::GroundSupport {
            view_box: format!("{} {} {} {}", -p, -p, 2.0 * p, 2.0 * p),
        };
    }

    match registry.thumbnail(&body.name) {
        Ok(arc) => Thumbnail::Arc(arc),
        Err(err) => {
            tracing::warn!(body = %body.name, error = %err, "Thumbnail generation failed, using placeholder");
            Thumbnail::Placeholder {
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Point;
    use crate::symbols::SymbolTable;

    fn body(name: &str, is_ground: bool) -> RigidBody {
        RigidBody {
            name: name.to_string(),
            is_ground,
            image: Some(format!("{}.png", name)),
            points: vec![Point::new("P", 0.0, 0.0)],
            forces: Vec::new(),
        }
    }

    fn problem() -> Problem {
        Problem {
            id: "6".to_string(),
            title: "Problem 6".to_string(),
            description: String::new(),
            bodies: vec![
                body("AC", false),
                body("CB", false),
                body("Ground", true),
                body("Ground", true),
                body("Truss", false),
            ],
            symbols: SymbolTable::with_defaults(),
        }
    }

    #[test]
    fn test_entries_follow_body_order() {
        let problem = problem();
        let palette = Palette::from_problem(&problem, &ArcRegistry::default());
        assert_eq!(palette.len(), 5);

        let names: Vec<&str> = palette.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["AC", "CB", "Ground", "Ground", "Truss"]);
        assert_eq!(palette.entries[3].template_index, 3);
        assert_eq!(palette.entries[0].image.as_deref(), Some("AC.png"));
    }

    #[test]
    fn test_thumbnail_kinds() {
        let problem = problem();
        let palette = Palette::from_problem(&problem, &ArcRegistry::default());

        assert!(matches!(&palette.entries[0].thumbnail, Thumbnail::Arc(arc) if arc.view_box == "-60 -60 70 70"));
        assert_eq!(
            palette.entries[2].thumbnail,
            Thumbnail::GroundSupport {
                view_box: "-10 -10 20 20".to_string()
            }
        );
        assert_eq!(
            palette.entries[4].thumbnail,
            Thumbnail::Placeholder {
                reason: "Unknown body name: Truss".to_string()
            }
        );
    }

    #[test]
    fn test_template_lookup() {
        let problem = problem();
        let palette = Palette::from_problem(&problem, &ArcRegistry::default());
        assert_eq!(palette.template(&problem, 1).map(|b| b.name.as_str()), Some("CB"));
        assert!(palette.template(&problem, 9).is_none());
    }
}
