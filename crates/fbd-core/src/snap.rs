//! 附着点捕捉
//!
//! 拖动刚体实例时，将被拖实例的每个附着点与其他所有实例的附着点比较，
//! 世界坐标距离不超过容差即为候选。候选在每次移动时从头重新计算。
//!
//! 搜索顺序固定：被拖实例的点按模板顺序；对每个点，其他实例按放置顺序，
//! 再按各自模板顺序遍历点。默认取第一个候选，可切换为取最近候选。

use crate::entity::{DroppedBody, SnapPointId};
use crate::math::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// 默认捕捉容差（世界坐标单位）
pub const DEFAULT_SNAP_TOLERANCE: f64 = 25.0;

/// 多个候选同时存在时的选取策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapStrategy {
    /// 按搜索顺序取第一个
    #[default]
    FirstFound,
    /// 取距离最近的（距离相同则取先找到的）
    Nearest,
}

/// 捕捉配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapConfig {
    /// 捕捉容差
    pub tolerance: f64,
    /// 候选选取策略
    pub strategy: SnapStrategy,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_SNAP_TOLERANCE,
            strategy: SnapStrategy::FirstFound,
        }
    }
}

/// 捕捉候选（仅在拖动期间存在）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapCandidate {
    /// 被拖实例上的点
    pub source: SnapPointId,
    /// 其他实例上的目标点
    pub target: SnapPointId,
    /// 源点在假设位置下的世界坐标
    pub source_world: Point2,
    /// 目标点的世界坐标
    pub target_world: Point2,
    pub distance: f64,
}

impl SnapCandidate {
    /// 使源点与目标点精确重合所需的平移
    pub fn translation(&self) -> Vector2 {
        self.target_world - self.source_world
    }
}

/// 捕捉引擎
#[derive(Debug, Clone)]
pub struct SnapEngine {
    config: SnapConfig,
    /// 当前候选
    candidates: Vec<SnapCandidate>,
}

impl SnapEngine {
    pub fn new(config: SnapConfig) -> Self {
        Self {
            config,
            candidates: Vec::with_capacity(16),
        }
    }

    /// 获取配置
    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// 获取配置（可变）
    pub fn config_mut(&mut self) -> &mut SnapConfig {
        &mut self.config
    }

    /// 当前候选集合
    pub fn candidates(&self) -> &[SnapCandidate] {
        &self.candidates
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
    }

    /// 重新计算被拖实例位于 `position` 时的候选
    ///
    /// `others` 必须按放置顺序给出，且不包含被拖实例本身。
    pub fn find_candidates<'a>(
        &mut self,
        dragged: &DroppedBody,
        position: Point2,
        others: impl IntoIterator<Item = &'a DroppedBody>,
    ) -> &[SnapCandidate] {
        self.candidates.clear();

        let others: Vec<&DroppedBody> = others
            .into_iter()
            .filter(|other| other.id != dragged.id)
            .collect();
        let tolerance = self.config.tolerance;

        for (source_name, source_world) in dragged.world_points_at(position) {
            for other in &others {
                for (target_name, target_world) in other.world_points() {
                    let distance = (target_world - source_world).norm();
                    if distance <= tolerance {
                        self.candidates.push(SnapCandidate {
                            source: dragged.snap_point_id(source_name),
                            target: other.snap_point_id(target_name),
                            source_world,
                            target_world,
                            distance,
                        });
                    }
                }
            }
        }

        &self.candidates
    }

    /// 按策略选出候选
    pub fn resolve(&self) -> Option<&SnapCandidate> {
        match self.config.strategy {
            SnapStrategy::FirstFound => self.candidates.first(),
            SnapStrategy::Nearest => self.candidates.iter().fold(None, |best, c| match best {
                Some(b) if b.distance <= c.distance => Some(b),
                _ => Some(c),
            }),
        }
    }

    /// 计算实例在 `position` 释放后的最终位置
    ///
    /// 有候选时平移到源点与目标点精确重合，否则保持原位置。
    pub fn snapped_position(&self, position: Point2) -> Point2 {
        match self.resolve() {
            Some(candidate) => position + candidate.translation(),
            None => position,
        }
    }
}

impl Default for SnapEngine {
    fn default() -> Self {
        Self::new(SnapConfig::default())
    }
}
