//! 数学基础类型
//!
//! 基于 nalgebra 的二维点/向量别名，以及轴对齐包围盒。

use serde::{Deserialize, Serialize};

pub type Point2 = nalgebra::Point2<f64>;
pub type Vector2 = nalgebra::Vector2<f64>;

/// 几何比较使用的默认容差
pub const EPSILON: f64 = 1e-9;

/// 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2 {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox2 {
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    /// 由一组点构造包围盒，空集合返回原点处的退化盒
    pub fn from_points(points: impl IntoIterator<Item = Point2>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::new(Point2::origin(), Point2::origin());
        };

        let mut bbox = Self::new(first, first);
        for p in iter {
            bbox.expand_to_include(p);
        }
        bbox
    }

    pub fn expand_to_include(&mut self, p: Point2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// 向四周扩展指定边距
    pub fn padded(&self, padding: f64) -> Self {
        Self::new(
            Point2::new(self.min.x - padding, self.min.y - padding),
            Point2::new(self.max.x + padding, self.max.y + padding),
        )
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point2 {
        nalgebra::center(&self.min, &self.max)
    }

    /// SVG viewBox 字符串（`min_x min_y width height`）
    pub fn to_view_box(&self) -> String {
        format!(
            "{} {} {} {}",
            self.min.x,
            self.min.y,
            self.width(),
            self.height()
        )
    }
}
