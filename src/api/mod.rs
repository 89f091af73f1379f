// ==========================================
// 餐饮出品编排系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口（引擎包装 + 审计 + 手势门控）
// ==========================================

pub mod error;
pub mod import_api;
pub mod kitchen_api;
pub mod tap_gate;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse};
pub use kitchen_api::{KitchenApi, SYSTEM_ACTOR};
pub use tap_gate::{TapConfirmGate, TapOutcome};
