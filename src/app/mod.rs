// ==========================================
// 餐饮出品编排系统 - 应用层
// ==========================================
// 职责: 装配应用状态与定时刷新任务
// ==========================================

pub mod state;
pub mod ticker;

// 重导出
pub use state::{get_default_db_path, AppState};
pub use ticker::{run_ticker, tick_once, TickReport};
