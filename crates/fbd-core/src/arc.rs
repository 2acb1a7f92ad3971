//! 四分之一圆弧刚体的几何生成
//!
//! 为 `AC`、`CB` 等圆弧刚体生成 SVG 环形扇区路径、包围盒以及
//! 与刚体模板一致的局部点坐标。
//!
//! 输出处于“显示坐标系”（Y 轴向下）：题目坐标 `(x, y)` 对应显示坐标 `(x, -y)`。
//! 角度在显示坐标系中度量，例如 `AC` 从 180° 扫到 270°，
//! 即题目坐标中从 `A(-R, 0)` 到 `C(0, R)`。

use crate::math::{BoundingBox2, Point2, EPSILON};
use crate::problem::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// 默认环宽
pub const DEFAULT_THICKNESS: f64 = 20.0;

/// 缩略图半径
pub const THUMBNAIL_RADIUS: f64 = 50.0;

/// 缩略图环宽
pub const THUMBNAIL_THICKNESS: f64 = 8.0;

/// 缩略图 viewBox 边距
pub const THUMBNAIL_PADDING: f64 = 10.0;

/// 中点名称
pub const MIDPOINT_NAME: &str = "mid";

/// 圆弧生成错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArcError {
    #[error("Unknown body name: {0}")]
    UnknownBody(String),

    #[error("Invalid radius: {0}")]
    InvalidRadius(f64),
}

/// 画布上圆弧刚体的绘制样式
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcStyle {
    /// 环宽
    pub thickness: f64,
}

impl Default for ArcStyle {
    fn default() -> Self {
        Self {
            thickness: DEFAULT_THICKNESS,
        }
    }
}

/// 圆弧刚体的角度定义（显示坐标系，度）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcSpec {
    pub start_deg: f64,
    pub end_deg: f64,
    /// 起点的点名
    pub start_point: String,
    /// 终点的点名
    pub end_point: String,
}

impl ArcSpec {
    pub fn new(
        start_deg: f64,
        end_deg: f64,
        start_point: impl Into<String>,
        end_point: impl Into<String>,
    ) -> Self {
        Self {
            start_deg,
            end_deg,
            start_point: start_point.into(),
            end_point: end_point.into(),
        }
    }

    /// 带符号的扫掠角，落在 (-180°, 180°]
    pub fn sweep_deg(&self) -> f64 {
        normalized_sweep(self.start_deg, self.end_deg)
    }

    /// 弧中点角度
    pub fn mid_deg(&self) -> f64 {
        self.start_deg + self.sweep_deg() / 2.0
    }

    /// 显示坐标系下，以 `center` 为圆心的局部点（起点、中点、终点）
    pub fn local_points(&self, center: Point2, radius: f64) -> Vec<Point> {
        [
            (self.start_point.as_str(), self.start_deg),
            (MIDPOINT_NAME, self.mid_deg()),
            (self.end_point.as_str(), self.end_deg),
        ]
        .into_iter()
        .map(|(name, deg)| {
            let p = point_at_angle(center, radius, deg);
            Point::new(name, p.x, p.y)
        })
        .collect()
    }
}

/// 计算从 `start` 到 `end` 的带符号角度差，归一化到 (-180°, 180°]
///
/// 据此选择扫掠方向，保证总是绘制劣弧。
pub fn normalized_sweep(start_deg: f64, end_deg: f64) -> f64 {
    let delta = (end_deg - start_deg).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

/// 圆上指定角度的点，消除三角函数带来的微小残差
fn point_at_angle(center: Point2, radius: f64, deg: f64) -> Point2 {
    let rad = deg.to_radians();
    let clean = |v: f64| if v.abs() < EPSILON * radius.max(1.0) { 0.0 } else { v };
    Point2::new(
        center.x + clean(radius * rad.cos()),
        center.y + clean(radius * rad.sin()),
    )
}

/// 生成的圆弧几何
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcGeometry {
    /// SVG 路径
    pub path: String,
    /// 紧包围盒
    pub bounding_box: BoundingBox2,
    /// 加边距后的 SVG viewBox
    pub view_box: String,
    /// 显示坐标系中的局部点
    pub local_points: Vec<Point>,
}

impl ArcGeometry {
    /// 局部点换回题目坐标系（Y 向上），应与刚体模板一致
    pub fn problem_points(&self) -> Vec<Point> {
        self.local_points
            .iter()
            .map(|p| Point::new(p.name.clone(), p.x, -p.y))
            .collect()
    }
}

/// 生成环形扇区 SVG 路径
pub fn arc_path(spec: &ArcSpec, center: Point2, radius: f64, thickness: f64) -> String {
    let inner_radius = (radius - thickness).max(0.0);

    let outer_start = point_at_angle(center, radius, spec.start_deg);
    let outer_end = point_at_angle(center, radius, spec.end_deg);
    let inner_start = point_at_angle(center, inner_radius, spec.start_deg);
    let inner_end = point_at_angle(center, inner_radius, spec.end_deg);

    let sweep_flag = if spec.sweep_deg() > 0.0 { 1 } else { 0 };

    let mut path = format!("M {:.2} {:.2} ", outer_start.x, outer_start.y);
    path += &format!(
        "A {} {} 0 0 {} {:.2} {:.2} ",
        radius, radius, sweep_flag, outer_end.x, outer_end.y
    );

    if thickness > 0.0 && inner_radius > 0.0 {
        path += &format!("L {:.2} {:.2} ", inner_end.x, inner_end.y);
        path += &format!(
            "A {} {} 0 0 {} {:.2} {:.2} ",
            inner_radius,
            inner_radius,
            1 - sweep_flag,
            inner_start.x,
            inner_start.y
        );
        path += "Z";
    } else {
        path += &format!("L {:.2} {:.2} Z", inner_start.x, inner_start.y);
    }

    path
}

/// 环形扇区的紧包围盒：内外弧端点加上扫掠范围内的象限极值点
fn arc_bounding_box(spec: &ArcSpec, center: Point2, radius: f64, thickness: f64) -> BoundingBox2 {
    let inner_radius = (radius - thickness).max(0.0);
    let mut bbox = BoundingBox2::from_points([
        point_at_angle(center, radius, spec.start_deg),
        point_at_angle(center, radius, spec.end_deg),
        point_at_angle(center, inner_radius, spec.start_deg),
        point_at_angle(center, inner_radius, spec.end_deg),
    ]);

    let sweep = spec.sweep_deg();
    for quadrant in [0.0, 90.0, 180.0, 270.0] {
        let offset = normalized_sweep(spec.start_deg, quadrant);
        let inside = if sweep >= 0.0 {
            offset >= 0.0 && offset <= sweep
        } else {
            offset <= 0.0 && offset >= sweep
        };
        if inside {
            bbox.expand_to_include(point_at_angle(center, radius, quadrant));
        }
    }
    bbox
}

/// 圆弧刚体注册表（刚体类型扩展点）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcRegistry {
    specs: BTreeMap<String, ArcSpec>,
}

impl Default for ArcRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        // 左上四分之一圆：A(-R, 0) -> C(0, R)
        registry.register("AC", ArcSpec::new(180.0, 270.0, "A", "C"));
        // 右上四分之一圆：C(0, R) -> B(R, 0)，用 360° 代替 0° 保证方向
        registry.register("CB", ArcSpec::new(270.0, 360.0, "C", "B"));
        registry
    }
}

impl ArcRegistry {
    pub fn empty() -> Self {
        Self {
            specs: BTreeMap::new(),
        }
    }

    /// 注册或替换刚体的圆弧定义
    pub fn register(&mut self, name: impl Into<String>, spec: ArcSpec) {
        self.specs.insert(name.into(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&ArcSpec> {
        self.specs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    /// 以原点为圆心生成圆弧几何
    pub fn generate(
        &self,
        body_name: &str,
        radius: f64,
        thickness: f64,
    ) -> Result<ArcGeometry, ArcError> {
        let spec = self
            .get(body_name)
            .ok_or_else(|| ArcError::UnknownBody(body_name.to_string()))?;

        if !radius.is_finite() || radius <= 0.0 {
            return Err(ArcError::InvalidRadius(radius));
        }

        let center = Point2::origin();
        let bounding_box = arc_bounding_box(spec, center, radius, thickness);

        Ok(ArcGeometry {
            path: arc_path(spec, center, radius, thickness),
            bounding_box,
            view_box: bounding_box.padded(THUMBNAIL_PADDING).to_view_box(),
            local_points: spec.local_points(center, radius),
        })
    }

    /// 调色板缩略图
    pub fn thumbnail(&self, body_name: &str) -> Result<ArcGeometry, ArcError> {
        self.generate(body_name, THUMBNAIL_RADIUS, THUMBNAIL_THICKNESS)
    }
}

/// 使用默认注册表生成圆弧几何
pub fn generate_arc(body_name: &str, radius: f64, thickness: f64) -> Result<ArcGeometry, ArcError> {
    ArcRegistry::default().generate(body_name, radius, thickness)
}

/// 使用默认注册表生成调色板缩略图
pub fn generate_thumbnail(body_name: &str) -> Result<ArcGeometry, ArcError> {
    ArcRegistry::default().thumbnail(body_name)
}
