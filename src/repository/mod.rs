// ==========================================
// 餐饮出品编排系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 操作审计与归档记录（引擎在途状态不落库）
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod order_archive_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use order_archive_repo::{ArchiveEventRecorder, ArchivedOrderRecord, OrderArchiveRepository};
