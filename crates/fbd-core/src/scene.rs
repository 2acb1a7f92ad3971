//! 渲染快照
//!
//! 从画布生成只读的绘制数据：刚体外形、附着点状态、力箭头与捕捉提示环。
//! 快照不持有画布引用，绘制层不能借此修改画布状态。
//!
//! 坐标均为世界坐标（屏幕方向，Y 轴向下）。

use crate::arc::{ArcGeometry, ArcRegistry, ArcStyle};
use crate::canvas::{Canvas, CanvasPhase, ForceKind, Selection};
use crate::entity::{DroppedBody, InstanceId, SnapPointId};
use crate::math::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// 快照配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// 基准长度：量值等于 `reference_magnitude` 时的箭头长度
    pub arrow_base_length: f64,
    pub reference_magnitude: f64,
    pub min_arrow_length: f64,
    pub max_arrow_length: f64,
    pub arrow_head_size: f64,
    /// 标签相对箭杆的垂直偏移
    pub label_offset: f64,
    pub snap_point_radius: f64,
    /// 悬停/选中时的附着点半径
    pub active_snap_point_radius: f64,
    pub snap_ring_radius: f64,
    /// 选中刚体的高亮圈半径
    pub selection_radius: f64,
    pub arc_style: ArcStyle,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            arrow_base_length: 80.0,
            reference_magnitude: 10.0,
            min_arrow_length: 30.0,
            max_arrow_length: 150.0,
            arrow_head_size: 8.0,
            label_offset: 15.0,
            snap_point_radius: 6.0,
            active_snap_point_radius: 8.0,
            snap_ring_radius: 12.0,
            selection_radius: 70.0,
            arc_style: ArcStyle::default(),
        }
    }
}

impl SceneConfig {
    /// 箭头长度随量值单调增长，并限制在可视范围内
    pub fn arrow_length(&self, magnitude: f64) -> f64 {
        if self.reference_magnitude <= 0.0 || magnitude.is_nan() {
            return self.min_arrow_length;
        }
        let length = self.arrow_base_length * magnitude.abs() / self.reference_magnitude;
        length.clamp(self.min_arrow_length, self.max_arrow_length)
    }
}

/// 线段
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point2,
    pub end: Point2,
}

impl Segment {
    fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }
}

/// 地面支座符号（相对支座原点）：铰接圆、底线与斜线阴影
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundGlyph {
    pub pin_radius: f64,
    pub base: Segment,
    pub hatches: Vec<Segment>,
}

impl Default for GroundGlyph {
    fn default() -> Self {
        let half = 15.0;
        Self {
            pin_radius: 8.0,
            base: Segment::new(Point2::new(-half, 12.0), Point2::new(half, 12.0)),
            hatches: (0..5)
                .map(|i| {
                    let x = -half + i as f64 * 6.0;
                    Segment::new(Point2::new(x, 15.0), Point2::new(x + 3.0, 20.0))
                })
                .collect(),
        }
    }
}

/// 刚体外形
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyShape {
    /// 圆弧几何（显示坐标，圆心位于实例原点）
    Arc(ArcGeometry),
    GroundSupport(GroundGlyph),
    /// 生成器无法处理的刚体
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneBody {
    pub id: InstanceId,
    pub template: String,
    /// 拖动中为假设位置
    pub position: Point2,
    pub shape: BodyShape,
    pub selected: bool,
}

/// 附着点显示状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapPointState {
    Default,
    Hovered,
    HasForce,
    Selected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapPoint {
    pub id: SnapPointId,
    pub position: Point2,
    pub state: SnapPointState,
    pub radius: f64,
}

/// 力箭头：箭尾位于附着点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceArrow {
    pub id: String,
    pub snap_point: SnapPointId,
    pub tail: Point2,
    pub tip: Point2,
    pub head_size: f64,
    pub label: String,
    pub label_position: Point2,
    pub kind: ForceKind,
}

impl ForceArrow {
    pub fn length(&self) -> f64 {
        (self.tip - self.tail).norm()
    }
}

/// 捕捉目标提示环
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapRing {
    pub target: SnapPointId,
    pub center: Point2,
    pub radius: f64,
}

/// 画布快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub phase: CanvasPhase,
    pub bodies: Vec<SceneBody>,
    pub snap_points: Vec<SceneSnapPoint>,
    pub forces: Vec<ForceArrow>,
    pub snap_rings: Vec<SnapRing>,
    pub selection: Selection,
    pub selection_radius: f64,
}

impl Scene {
    pub fn capture(canvas: &Canvas, registry: &ArcRegistry, config: &SceneConfig) -> Self {
        let selection = canvas.selection().clone();
        let mut bodies = Vec::with_capacity(canvas.bodies().len());
        let mut snap_points = Vec::new();

        for body in canvas.bodies() {
            let position = match (canvas.dragging(), canvas.drag_position()) {
                (Some(id), Some(p)) if id == &body.id => p,
                _ => body.position(),
            };

            bodies.push(SceneBody {
                id: body.id.clone(),
                template: body.template.name.clone(),
                position,
                shape: body_shape(body, registry, config),
                selected: selection.body.as_ref() == Some(&body.id),
            });

            for (name, world) in body.world_points_at(position) {
                let id = body.snap_point_id(name);
                let state = snap_point_state(canvas, &id);
                let radius = match state {
                    SnapPointState::Hovered | SnapPointState::Selected => {
                        config.active_snap_point_radius
                    }
                    _ => config.snap_point_radius,
                };
                snap_points.push(SceneSnapPoint {
                    id,
                    position: world,
                    state,
                    radius,
                });
            }
        }

        let forces = canvas
            .forces()
            .iter()
            .map(|force| {
                let length = config.arrow_length(force.magnitude);
                // 题目坐标系角度（逆时针）换算到屏幕方向
                let rad = force.angle_degrees.to_radians();
                let direction = Vector2::new(rad.cos(), -rad.sin());
                let normal = Vector2::new(direction.y, -direction.x);
                let tail = force.position();
                ForceArrow {
                    id: force.id.clone(),
                    snap_point: force.snap_point.clone(),
                    tail,
                    tip: tail + direction * length,
                    head_size: config.arrow_head_size,
                    label: format!("{}", force.magnitude),
                    label_position: tail + direction * (length / 2.0) + normal * config.label_offset,
                    kind: force.kind,
                }
            })
            .collect();

        let snap_rings = canvas
            .snap_candidates()
            .iter()
            .map(|c| SnapRing {
                target: c.target.clone(),
                center: c.target_world,
                radius: config.snap_ring_radius,
            })
            .collect();

        Self {
            phase: canvas.phase(),
            bodies,
            snap_points,
            forces,
            snap_rings,
            selection,
            selection_radius: config.selection_radius,
        }
    }

    pub fn snap_point(&self, id: &SnapPointId) -> Option<&SceneSnapPoint> {
        self.snap_points.iter().find(|p| &p.id == id)
    }
}

fn body_shape(body: &DroppedBody, registry: &ArcRegistry, config: &SceneConfig) -> BodyShape {
    if body.template.is_ground {
        return BodyShape::GroundSupport(GroundGlyph::default());
    }

    // 半径取自模板起点到圆心的距离
    let radius = registry
        .get(&body.template.name)
        .and_then(|spec| body.template.point(&spec.start_point))
        .map(|p| p.position().coords.norm())
        .unwrap_or(0.0);

    match registry.generate(&body.template.name, radius, config.arc_style.thickness) {
        Ok(arc) => BodyShape::Arc(arc),
        Err(err) => {
            tracing::debug!(body = %body.template.name, error = %err, "Using placeholder shape");
            BodyShape::Placeholder
        }
    }
}

/// 悬停 > 选中 > 有力
fn snap_point_state(canvas: &Canvas, id: &SnapPointId) -> SnapPointState {
    if canvas.hovered() == Some(id) {
        SnapPointState::Hovered
    } else if canvas.selection().point.as_ref() == Some(id) {
        SnapPointState::Selected
    } else if canvas.force_at(id).is_some() {
        SnapPointState::HasForce
    } else {
        SnapPointState::Default
    }
}
