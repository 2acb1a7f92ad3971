//! FBD 核心引擎
//!
//! 受力图（free-body diagram）构建引擎：符号表达式求值、圆弧几何生成，
//! 以及画布上刚体实例的放置、附着点捕捉与受力标注。
//!
//! # 架构设计
//!
//! - `Problem`: 完全数值化的题目，刚体模板只读
//! - `Canvas`: 独占实例与标注的可变状态，所有修改经由命令接口
//! - `Scene` / `Palette`: 只读快照，供绘制层使用
//!
//! # 示例
//!
//! ```rust
//! use fbd_core::prelude::*;
//!
//! let symbols = SymbolTable::with_defaults();
//! let r = evaluate("-R/√2", &symbols).unwrap();
//! assert!((r + 100.0 / 2f64.sqrt()).abs() < 1e-9);
//!
//! let arc = generate_arc("AC", 100.0, 20.0).unwrap();
//! println!("Path: {}", arc.path);
//! ```

pub mod arc;
pub mod canvas;
pub mod entity;
pub mod expression;
pub mod math;
pub mod palette;
pub mod problem;
pub mod scene;
pub mod snap;
pub mod symbols;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::arc::{generate_arc, generate_thumbnail, ArcError, ArcGeometry, ArcRegistry, ArcSpec, ArcStyle};
    pub use crate::canvas::{Canvas, CanvasPhase, ForceAnnotation, ForceKind, Selection};
    pub use crate::entity::{DroppedBody, InstanceId, SnapPointId};
    pub use crate::expression::{evaluate, evaluate_with_policy, EvalError, EvalPolicy};
    pub use crate::math::{BoundingBox2, Point2, Vector2};
    pub use crate::palette::{Palette, PaletteEntry, Thumbnail};
    pub use crate::problem::{CoordinateConvention, Direction, Force, Point, Problem, RigidBody};
    pub use crate::scene::{Scene, SceneConfig, SnapPointState};
    pub use crate::snap::{SnapCandidate, SnapConfig, SnapEngine, SnapStrategy};
    pub use crate::symbols::SymbolTable;
}
