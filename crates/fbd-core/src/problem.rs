//! 题目数据模型
//!
//! 所有坐标均已完成表达式求值，处于刚体模板自身的局部坐标系中
//! （题目数学坐标系，Y 轴向上）。

use crate::math::Point2;
use crate::symbols::SymbolTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 刚体上的具名点（局部坐标）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
        }
    }

    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// 外力方向
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    /// 题目坐标系下的角度（度，逆时针，向右为 0°）
    pub fn angle_degrees(&self) -> f64 {
        match self {
            Direction::Right => 0.0,
            Direction::Up => 90.0,
            Direction::Left => 180.0,
            Direction::Down => 270.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(format!("Unknown direction: {}", other)),
        }
    }
}

/// 预设外力，通过点名引用同一刚体上的点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Force {
    pub point: String,
    pub direction: Direction,
    pub magnitude: f64,
    pub preset: bool,
}

/// 局部坐标到世界坐标的换算约定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinateConvention {
    /// 直接使用局部 Y（地面支座）
    Direct,
    /// 翻转局部 Y：题目中的“向上”对应屏幕上的负 Y
    FlipY,
}

impl CoordinateConvention {
    pub fn for_ground(is_ground: bool) -> Self {
        if is_ground {
            CoordinateConvention::Direct
        } else {
            CoordinateConvention::FlipY
        }
    }

    /// 局部点相对刚体原点的世界偏移
    pub fn offset(&self, local: &Point) -> (f64, f64) {
        match self {
            CoordinateConvention::Direct => (local.x, local.y),
            CoordinateConvention::FlipY => (local.x, -local.y),
        }
    }
}

/// 刚体模板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    pub name: String,
    pub is_ground: bool,
    /// 展示层使用的图片引用，几何引擎不读取
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub points: Vec<Point>,
    pub forces: Vec<Force>,
}

impl RigidBody {
    pub fn point(&self, name: &str) -> Option<&Point> {
        self.points.iter().find(|p| p.name == name)
    }

    pub fn convention(&self) -> CoordinateConvention {
        CoordinateConvention::for_ground(self.is_ground)
    }

    /// 具名点在刚体放置于 `origin` 时的世界坐标
    pub fn world_point(&self, origin: Point2, point_name: &str) -> Option<Point2> {
        self.point(point_name)
            .map(|p| world_position(self.convention(), origin, p))
    }
}

/// 世界坐标计算的唯一入口
pub fn world_position(convention: CoordinateConvention, origin: Point2, local: &Point) -> Point2 {
    let (dx, dy) = convention.offset(local);
    Point2::new(origin.x + dx, origin.y + dy)
}

/// 题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub bodies: Vec<RigidBody>,
    /// 求值时使用的符号表快照
    pub symbols: SymbolTable,
}

impl Problem {
    /// 按名称查找第一个匹配的刚体模板
    pub fn body(&self, name: &str) -> Option<&RigidBody> {
        self.bodies.iter().find(|b| b.name == name)
    }

    /// 保留另一个题目的标题与描述（重新解析后使用）
    pub fn with_metadata_from(mut self, previous: &Problem) -> Self {
        self.title = previous.title.clone();
        self.description = previous.description.clone();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc_body(is_ground: bool) -> RigidBody {
        RigidBody {
            name: "AC".to_string(),
            is_ground,
            image: None,
            points: vec![Point::new("A", -100.0, 0.0), Point::new("C", 0.0, 100.0)],
            forces: Vec::new(),
        }
    }

    #[test]
    fn test_direction_parse_and_angle() {
        assert_eq!("down".parse::<Direction>(), Ok(Direction::Down));
        assert!("Down".parse::<Direction>().is_err());
        assert_eq!(Direction::Up.angle_degrees(), 90.0);
        assert_eq!(Direction::Down.to_string(), "down");
    }

    #[test]
    fn test_world_point_flips_non_ground() {
        let body = arc_body(false);
        let origin = Point2::new(300.0, 200.0);
        assert_eq!(body.world_point(origin, "C"), Some(Point2::new(300.0, 100.0)));
        assert_eq!(body.world_point(origin, "A"), Some(Point2::new(200.0, 200.0)));
        assert_eq!(body.world_point(origin, "missing"), None);
    }

    #[test]
    fn test_world_point_direct_for_ground() {
        let body = arc_body(true);
        let origin = Point2::new(300.0, 200.0);
        assert_eq!(body.world_point(origin, "C"), Some(Point2::new(300.0, 300.0)));
    }

    #[test]
    fn test_serde_direction_lowercase() {
        let json = serde_json::to_string(&Direction::Left).unwrap();
        assert_eq!(json, "\"left\"");
    }
}
