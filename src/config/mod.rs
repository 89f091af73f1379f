// ==========================================
// 餐饮出品编排系统 - 配置层
// ==========================================
// 职责: 编排参数、工位布局、外部重置信号
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod orchestrator_config_trait;
pub mod settings;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use orchestrator_config_trait::OrchestratorConfigReader;
pub use settings::{DurationScaling, OrchestratorSettings, TapGateSettings};
