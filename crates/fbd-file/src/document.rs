//! 题目文档的原始模型
//!
//! 与文档结构一一对应，坐标与量值保持为表达式文本，由解析器求值。
//!
//! XML 形式：
//!
//! ```xml
//! <Problem id="6">
//!   <RigidBody Name="AC" IsGround="False">
//!     <ImageFile>assets/AC.png</ImageFile>
//!     <Point Name="A" X="-R" Y="0" />
//!     <ExternalForce Point="A" Dir="down" Mag="P" />
//!   </RigidBody>
//! </Problem>
//! ```
//!
//! JSON 形式使用相同的字段名，根对象为 `{"Problem": {...}}`，
//! 重复元素写成数组。

use crate::error::FileError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 根元素名
pub const ROOT_ELEMENT: &str = "Problem";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Problem")]
pub struct ProblemDocument {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "RigidBody", default)]
    pub bodies: Vec<BodyDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyDocument {
    #[serde(rename = "@Name", default)]
    pub name: Option<String>,

    /// `"True"` / `"False"`，区分大小写
    #[serde(rename = "@IsGround", default)]
    pub is_ground: Option<String>,

    #[serde(rename = "ImageFile", default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(rename = "Point", default)]
    pub points: Vec<PointDocument>,

    #[serde(rename = "ExternalForce", default)]
    pub forces: Vec<ForceDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointDocument {
    #[serde(rename = "@Name", default)]
    pub name: Option<String>,
    #[serde(rename = "@X", default)]
    pub x: Option<String>,
    #[serde(rename = "@Y", default)]
    pub y: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForceDocument {
    #[serde(rename = "@Point", default)]
    pub point: Option<String>,
    #[serde(rename = "@Dir", default)]
    pub direction: Option<String>,
    #[serde(rename = "@Mag", default)]
    pub magnitude: Option<String>,
}

#[derive(Deserialize)]
struct JsonRoot {
    #[serde(rename = "Problem")]
    problem: Option<ProblemDocument>,
}

impl ProblemDocument {
    /// 从 XML 文本读取
    pub fn from_xml(xml: &str) -> Result<Self, FileError> {
        if root_element(xml)?.as_deref() != Some(ROOT_ELEMENT) {
            return Err(FileError::MissingRoot);
        }
        Ok(quick_xml::de::from_str(xml)?)
    }

    /// 从 JSON 文本读取
    pub fn from_json(json: &str) -> Result<Self, FileError> {
        let root: JsonRoot = serde_json::from_str(json)?;
        root.problem.ok_or(FileError::MissingRoot)
    }

    /// 按扩展名（`.xml` / `.json`）读取文件
    pub fn open(path: &Path) -> Result<Self, FileError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "xml" => Self::from_xml(&std::fs::read_to_string(path)?),
            "json" => Self::from_json(&std::fs::read_to_string(path)?),
            _ => Err(FileError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn to_json(&self) -> Result<String, FileError> {
        let root = BTreeMap::from([(ROOT_ELEMENT, self)]);
        Ok(serde_json::to_string_pretty(&root)?)
    }
}

/// 第一个元素的名称
fn root_element(xml: &str) -> Result<Option<String>, FileError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(Some(String::from_utf8_lossy(e.name().as_ref()).into_owned()));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Problem id="7">
  <RigidBody Name="AC" IsGround="False">
    <ImageFile>assets/AC.png</ImageFile>
    <Point Name="A" X="-R" Y="0" />
    <ExternalForce Point="A" Dir="left" Mag="P" />
    <Point Name="C" X="0" Y="R" />
  </RigidBody>
  <RigidBody Name="G" IsGround="True">
    <Point Name="A" X="-R" />
  </RigidBody>
</Problem>"#;

    #[test]
    fn test_read_xml() {
        let doc = ProblemDocument::from_xml(XML).unwrap();
        assert_eq!(doc.id.as_deref(), Some("7"));
        assert_eq!(doc.bodies.len(), 2);

        let ac = &doc.bodies[0];
        assert_eq!(ac.name.as_deref(), Some("AC"));
        assert_eq!(ac.is_ground.as_deref(), Some("False"));
        assert_eq!(ac.image.as_deref(), Some("assets/AC.png"));
        assert_eq!(ac.points.len(), 2);
        assert_eq!(ac.points[1].y.as_deref(), Some("R"));
        assert_eq!(ac.forces[0].direction.as_deref(), Some("left"));

        let ground = &doc.bodies[1];
        assert_eq!(ground.points[0].y, None);
        assert!(ground.forces.is_empty());
    }

    #[test]
    fn test_missing_root() {
        assert!(matches!(
            ProblemDocument::from_xml("<Exercise id=\"1\"></Exercise>"),
            Err(FileError::MissingRoot)
        ));
        assert!(matches!(ProblemDocument::from_xml(""), Err(FileError::MissingRoot)));
        assert!(matches!(
            ProblemDocument::from_json("{\"Exercise\": {}}"),
            Err(FileError::MissingRoot)
        ));
    }

    #[test]
    fn test_json_uses_same_model() {
        let doc = ProblemDocument::from_xml(XML).unwrap();
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"@Name\": \"AC\""));
        assert_eq!(ProblemDocument::from_json(&json).unwrap(), doc);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            ProblemDocument::open(Path::new("problem.txt")),
            Err(FileError::UnsupportedFormat(_))
        ));
    }
}
