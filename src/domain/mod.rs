// ==========================================
// 餐饮出品编排系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod catalog;
pub mod checklist;
pub mod fry;
pub mod order;
pub mod station;
pub mod timer;
pub mod types;
pub mod water;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use catalog::CatalogItem;
pub use checklist::{ChecklistGroup, ChecklistItem, OrderChecklistView};
pub use fry::{FryEntry, FryLedger, FryStationState, LockedBatch};
pub use order::{BoxRow, Order, OrderBox, OrderLine, OrderSubmission};
pub use station::{
    FryStationConfig, FryStationSettings, KitchenLayout, PredicateTarget, RulePredicate,
    StationRule, WaterStationConfig,
};
pub use timer::CookTimer;
pub use types::{
    ChecklistPart, ChecklistSource, ChecklistStatus, FryStationPhase, MatchMode, ModuleKind,
    PredicateMode, PrepKind, ServiceMode, ServiceStatus, WaterTaskKind, WaterTaskStatus,
};
pub use water::{TaskOrigin, WaterTask, WaterTaskRuntime};
