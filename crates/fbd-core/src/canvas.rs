//! 画布放置与捕捉引擎
//!
//! 画布独占实例与受力标注的可变状态，所有修改都经由这里的命令接口。
//!
//! 状态机：
//! - `Empty` --place_body--> `Populated`
//! - `Populated` --begin_drag--> `Dragging`
//! - `Dragging` --drag_move--> `Dragging`（重新计算捕捉候选）
//! - `Dragging` --end_drag--> `Populated`（有候选则精确对齐，否则落在释放位置）
//! - 任意状态 --clear_all--> `Empty`
//!
//! 针对未知实例/点的命令都是无操作，不返回错误
//! （例如清空画布后迟到的拖动事件）。

use crate::entity::{DroppedBody, InstanceId, SnapPointId};
use crate::math::Point2;
use crate::problem::RigidBody;
use crate::snap::{SnapCandidate, SnapConfig, SnapEngine};
use serde::{Deserialize, Serialize};

/// 画布状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanvasPhase {
    Empty,
    Populated,
    Dragging,
}

/// 标注类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForceKind {
    Force,
    Reaction,
}

/// 附着在某个捕捉点上的力/约束反力标注
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceAnnotation {
    pub id: String,
    pub snap_point: SnapPointId,
    pub x: f64,
    pub y: f64,
    /// 角度（度）
    pub angle_degrees: f64,
    pub magnitude: f64,
    pub kind: ForceKind,
}

impl ForceAnnotation {
    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// 单选模型：最多一个选中实例、一个选中点
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub body: Option<InstanceId>,
    pub point: Option<SnapPointId>,
}

/// 进行中的拖动
#[derive(Debug, Clone, PartialEq)]
struct DragState {
    instance: InstanceId,
    /// 开始拖动时的位置
    origin: Point2,
    /// 最近一次移动到的假设位置
    position: Point2,
}

/// 画布
#[derive(Debug, Clone)]
pub struct Canvas {
    /// 按放置顺序
    bodies: Vec<DroppedBody>,
    forces: Vec<ForceAnnotation>,
    selection: Selection,
    hovered: Option<SnapPointId>,
    drag: Option<DragState>,
    snap: SnapEngine,
    next_serial: u64,
}

impl Canvas {
    pub fn new(config: SnapConfig) -> Self {
        Self {
            bodies: Vec::new(),
            forces: Vec::new(),
            selection: Selection::default(),
            hovered: None,
            drag: None,
            snap: SnapEngine::new(config),
            next_serial: 1,
        }
    }

    // ========== 查询 ==========

    pub fn phase(&self) -> CanvasPhase {
        if self.drag.is_some() {
            CanvasPhase::Dragging
        } else if self.bodies.is_empty() {
            CanvasPhase::Empty
        } else {
            CanvasPhase::Populated
        }
    }

    pub fn bodies(&self) -> &[DroppedBody] {
        &self.bodies
    }

    pub fn body(&self, id: &InstanceId) -> Option<&DroppedBody> {
        self.bodies.iter().find(|b| &b.id == id)
    }

    pub fn forces(&self) -> &[ForceAnnotation] {
        &self.forces
    }

    pub fn force_at(&self, snap_point: &SnapPointId) -> Option<&ForceAnnotation> {
        self.forces.iter().find(|f| &f.snap_point == snap_point)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn hovered(&self) -> Option<&SnapPointId> {
        self.hovered.as_ref()
    }

    /// 正在拖动的实例
    pub fn dragging(&self) -> Option<&InstanceId> {
        self.drag.as_ref().map(|d| &d.instance)
    }

    /// 拖动中实例的假设位置
    pub fn drag_position(&self) -> Option<Point2> {
        self.drag.as_ref().map(|d| d.position)
    }

    /// 当前捕捉候选（仅拖动期间非空）
    pub fn snap_candidates(&self) -> &[SnapCandidate] {
        self.snap.candidates()
    }

    pub fn snap_config(&self) -> &SnapConfig {
        self.snap.config()
    }

    pub fn snap_config_mut(&mut self) -> &mut SnapConfig {
        self.snap.config_mut()
    }

    /// 捕捉点的世界坐标
    pub fn world_point(&self, snap_point: &SnapPointId) -> Option<Point2> {
        self.body(&snap_point.instance)?
            .world_point(&snap_point.point)
    }

    /// 将 `<实例ID>-<点名>` 文本解析为画布上存在的捕捉点
    pub fn resolve_snap_point(&self, text: &str) -> Option<SnapPointId> {
        self.bodies.iter().find_map(|body| {
            let point = text.strip_prefix(body.id.as_str())?.strip_prefix('-')?;
            body.template
                .point(point)
                .map(|_| body.snap_point_id(point))
        })
    }

    // ========== 放置 ==========

    /// 在世界坐标 `(x, y)` 放置模板的新实例
    pub fn place_body(&mut self, template: &RigidBody, x: f64, y: f64) -> InstanceId {
        let id = InstanceId::new(format!("{}-{}", template.name, self.next_serial));
        self.next_serial += 1;

        self.bodies
            .push(DroppedBody::new(id.clone(), template.clone(), x, y));
        tracing::debug!(instance = %id, x, y, "Placed body");
        id
    }

    /// 用模板上的预设外力为实例生成标注，返回生成数量
    pub fn apply_preset_forces(&mut self, instance: &InstanceId) -> usize {
        let Some(body) = self.body(instance) else {
            tracing::debug!(instance = %instance, "Preset forces ignored: unknown instance");
            return 0;
        };

        let presets: Vec<_> = body
            .template
            .forces
            .iter()
            .filter(|f| f.preset)
            .map(|f| {
                (
                    body.snap_point_id(&f.point),
                    f.magnitude,
                    f.direction.angle_degrees(),
                )
            })
            .collect();

        let mut applied = 0;
        for (point, magnitude, angle) in presets {
            if self.add_force(&point, magnitude, angle, ForceKind::Force) {
                applied += 1;
            }
        }
        applied
    }

    // ========== 拖动 ==========

    /// 开始拖动；同一时刻只允许一个实例处于拖动中
    pub fn begin_drag(&mut self, instance: &InstanceId) -> bool {
        if let Some(drag) = &self.drag {
            tracing::debug!(instance = %instance, active = %drag.instance, "Drag ignored: another drag in progress");
            return false;
        }
        let Some(body) = self.body(instance) else {
            tracing::debug!(instance = %instance, "Drag ignored: unknown instance");
            return false;
        };

        let origin = body.position();
        self.drag = Some(DragState {
            instance: instance.clone(),
            origin,
            position: origin,
        });
        self.snap.clear();
        true
    }

    /// 拖动到假设位置 `(x, y)`，从头重新计算捕捉候选
    pub fn drag_move(&mut self, x: f64, y: f64) -> &[SnapCandidate] {
        let Some(drag) = self.drag.as_mut() else {
            tracing::debug!(x, y, "Drag move ignored: not dragging");
            return &[];
        };

        let position = Point2::new(x, y);
        drag.position = position;
        let instance = drag.instance.clone();

        let Some(dragged) = self.bodies.iter().find(|b| b.id == instance) else {
            self.snap.clear();
            return self.snap.candidates();
        };
        self.snap.find_candidates(dragged, position, &self.bodies)
    }

    /// 结束拖动并提交位置，返回实例的最终位置
    ///
    /// 有候选时取第一个（或按策略），平移实例使两点精确重合；
    /// 无候选时落在 `(x, y)`。
    pub fn end_drag(&mut self, x: f64, y: f64) -> Option<Point2> {
        let Some(drag) = self.drag.take() else {
            tracing::debug!(x, y, "Drag end ignored: not dragging");
            return None;
        };

        let position = Point2::new(x, y);
        let index = self.bodies.iter().position(|b| b.id == drag.instance)?;

        self.snap
            .find_candidates(&self.bodies[index], position, &self.bodies);
        let committed = self.snap.snapped_position(position);
        if let Some(candidate) = self.snap.resolve() {
            tracing::debug!(
                source = %candidate.source,
                target = %candidate.target,
                "Snapped on release"
            );
        }
        self.snap.clear();

        self.bodies[index].set_position(committed);
        self.reanchor_forces(&drag.instance);
        tracing::debug!(
            instance = %drag.instance,
            from_x = drag.origin.x,
            from_y = drag.origin.y,
            to_x = committed.x,
            to_y = committed.y,
            "Committed drag"
        );
        Some(committed)
    }

    /// 实例移动后，更新锚定在其上的标注坐标
    fn reanchor_forces(&mut self, instance: &InstanceId) {
        let Some(body) = self.bodies.iter().find(|b| &b.id == instance) else {
            return;
        };
        for force in self
            .forces
            .iter_mut()
            .filter(|f| f.snap_point.belongs_to(instance))
        {
            if let Some(p) = body.world_point(&force.snap_point.point) {
                force.x = p.x;
                force.y = p.y;
            }
        }
    }

    // ========== 受力标注 ==========

    /// 在捕捉点上添加标注；同一捕捉点已有标注时替换之
    pub fn add_force(
        &mut self,
        snap_point: &SnapPointId,
        magnitude: f64,
        angle_degrees: f64,
        kind: ForceKind,
    ) -> bool {
        if self.drag.is_some() {
            tracing::debug!(snap_point = %snap_point, "Force ignored: drag in progress");
            return false;
        }
        let Some(position) = self.world_point(snap_point) else {
            tracing::debug!(snap_point = %snap_point, "Force ignored: unknown snap point");
            return false;
        };

        self.forces.retain(|f| &f.snap_point != snap_point);
        self.forces.push(ForceAnnotation {
            id: format!("arrow-{}", snap_point),
            snap_point: snap_point.clone(),
            x: position.x,
            y: position.y,
            angle_degrees,
            magnitude,
            kind,
        });
        true
    }

    /// 旋转已有标注
    pub fn move_force(&mut self, snap_point: &SnapPointId, angle_degrees: f64) -> bool {
        match self.forces.iter_mut().find(|f| &f.snap_point == snap_point) {
            Some(force) => {
                force.angle_degrees = angle_degrees;
                true
            }
            None => false,
        }
    }

    pub fn remove_force(&mut self, snap_point: &SnapPointId) -> bool {
        let before = self.forces.len();
        self.forces.retain(|f| &f.snap_point != snap_point);
        self.forces.len() != before
    }

    // ========== 删除 ==========

    /// 删除实例、其上的全部标注以及指向它的选择状态
    pub fn clear_body(&mut self, instance: &InstanceId) -> bool {
        let before = self.bodies.len();
        self.bodies.retain(|b| &b.id != instance);
        if self.bodies.len() == before {
            tracing::debug!(instance = %instance, "Clear ignored: unknown instance");
            return false;
        }

        self.forces.retain(|f| !f.snap_point.belongs_to(instance));

        if self.selection.body.as_ref() == Some(instance) {
            self.selection.body = None;
        }
        if self
            .selection
            .point
            .as_ref()
            .is_some_and(|p| p.belongs_to(instance))
        {
            self.selection.point = None;
        }
        if self.hovered.as_ref().is_some_and(|p| p.belongs_to(instance)) {
            self.hovered = None;
        }
        if self.drag.as_ref().is_some_and(|d| &d.instance == instance) {
            self.drag = None;
            self.snap.clear();
        }
        true
    }

    /// 清空画布
    pub fn clear_all(&mut self) {
        self.bodies.clear();
        self.forces.clear();
        self.selection = Selection::default();
        self.hovered = None;
        self.drag = None;
        self.snap.clear();
    }

    // ========== 选择 ==========

    /// 选中实例（`None` 取消选择），替换之前的选择
    pub fn select_body(&mut self, instance: Option<&InstanceId>) -> bool {
        match instance {
            None => {
                self.selection.body = None;
                true
            }
            Some(id) if self.body(id).is_some() => {
                self.selection.body = Some(id.clone());
                true
            }
            Some(id) => {
                tracing::debug!(instance = %id, "Select ignored: unknown instance");
                false
            }
        }
    }

    /// 点击实例：已选中则取消，否则选中
    pub fn toggle_body(&mut self, instance: &InstanceId) -> Option<&InstanceId> {
        if self.selection.body.as_ref() == Some(instance) {
            self.selection.body = None;
        } else {
            self.select_body(Some(instance));
        }
        self.selection.body.as_ref()
    }

    /// 选中捕捉点（`None` 取消选择），替换之前的选择
    pub fn select_point(&mut self, snap_point: Option<&SnapPointId>) -> bool {
        match snap_point {
            None => {
                self.selection.point = None;
                true
            }
            Some(p) if self.world_point(p).is_some() => {
                self.selection.point = Some(p.clone());
                true
            }
            Some(p) => {
                tracing::debug!(snap_point = %p, "Select ignored: unknown snap point");
                false
            }
        }
    }

    /// 更新悬停的捕捉点
    pub fn hover_point(&mut self, snap_point: Option<&SnapPointId>) {
        self.hovered = snap_point
            .filter(|p| self.world_point(p).is_some())
            .cloned();
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(SnapConfig::default())
    }
}
