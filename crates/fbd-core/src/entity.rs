//! 画布实例与标识符
//!
//! `DroppedBody` 是刚体模板在画布上的一个实例；多个实例可以引用同一模板。
//! 实例身份由画布分配，而非模板。

use crate::math::Point2;
use crate::problem::{world_position, RigidBody};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 画布实例ID，形如 `AC-1`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 捕捉点ID：实例 + 点名
///
/// 文本形式为 `<实例ID>-<点名>`。由于实例ID本身含有 `-`，
/// 归属判断总是按字段比较，不按字符串前缀。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapPointId {
    pub instance: InstanceId,
    pub point: String,
}

impl SnapPointId {
    pub fn new(instance: InstanceId, point: impl Into<String>) -> Self {
        Self {
            instance,
            point: point.into(),
        }
    }

    pub fn belongs_to(&self, instance: &InstanceId) -> bool {
        &self.instance == instance
    }
}

impl fmt::Display for SnapPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.instance, self.point)
    }
}

/// 放置在画布上的刚体实例
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedBody {
    pub id: InstanceId,
    pub template: RigidBody,
    pub x: f64,
    pub y: f64,
}

impl DroppedBody {
    pub fn new(id: InstanceId, template: RigidBody, x: f64, y: f64) -> Self {
        Self { id, template, x, y }
    }

    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Point2) {
        self.x = position.x;
        self.y = position.y;
    }

    pub fn snap_point_id(&self, point: &str) -> SnapPointId {
        SnapPointId::new(self.id.clone(), point)
    }

    /// 当前放置位置下具名点的世界坐标
    pub fn world_point(&self, point: &str) -> Option<Point2> {
        self.template.world_point(self.position(), point)
    }

    /// 假设实例位于 `origin` 时，按模板顺序给出所有点的世界坐标
    pub fn world_points_at(&self, origin: Point2) -> impl Iterator<Item = (&str, Point2)> + '_ {
        let convention = self.template.convention();
        self.template
            .points
            .iter()
            .map(move |p| (p.name.as_str(), world_position(convention, origin, p)))
    }

    pub fn world_points(&self) -> impl Iterator<Item = (&str, Point2)> + '_ {
        self.world_points_at(self.position())
    }
}
