// ==========================================
// 餐饮出品编排系统 - 引擎层
// ==========================================
// 职责: 路由、煎台批次、水煮任务、打包清单等业务规则
// 红线: Engine 不拼 SQL, 所有拒绝必须输出原因
// 红线: 推导为纯函数，不做 I/O
// ==========================================

pub mod availability;
pub mod catalog;
pub mod checklist;
pub mod error;
pub mod events;
pub mod fry_entries;
pub mod fry_scheduler;
pub mod fry_station;
pub mod orchestrator;
pub mod routing_policy;
pub mod station_router;
pub mod views;
pub mod water_deriver;
pub mod water_scheduler;

// 重导出核心引擎
pub use availability::AvailabilityResolver;
pub use catalog::{Catalog, CatalogLookup};
pub use checklist::{ChecklistAggregator, ChecklistContext, StatusIndex};
pub use error::{OrchestratorError, OrchestratorResult};
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, OrchestratorEvent, OrchestratorEventPublisher,
    OrchestratorEventType,
};
pub use fry_scheduler::{FryBatchScheduler, FryPlan, FryRecommendation};
pub use fry_station::FryStationMachine;
pub use orchestrator::{Derivation, KitchenOrchestrator, ModuleRoute};
pub use routing_policy::{OrderProfile, RoutingPolicyEvaluator};
pub use station_router::{RouteAssignment, StationRouter};
pub use views::{
    GriddleStationView, GriddleView, KitchenOverview, PackagingLaneView, WaterStationView,
    WaterTaskView,
};
pub use water_deriver::WaterTaskDeriver;
pub use water_scheduler::{CaptureBounds, WaterScheduler};
