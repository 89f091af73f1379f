// ==========================================
// 餐饮出品编排系统 - 编排配置读取 Trait
// ==========================================
// 职责: 定义服务层/刷新任务所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::settings::OrchestratorSettings;
use crate::domain::station::KitchenLayout;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// OrchestratorConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait OrchestratorConfigReader: Send + Sync {
    /// 编排参数
    ///
    /// # 默认值
    /// - 未配置或格式错误时返回 `OrchestratorSettings::default()`
    async fn get_orchestrator_settings(&self) -> Result<OrchestratorSettings, Box<dyn Error + Send + Sync>>;

    /// 工位布局
    ///
    /// # 默认值
    /// - 未配置时返回空布局（各模块走兜底工位）
    async fn get_kitchen_layout(&self) -> Result<KitchenLayout, Box<dyn Error + Send + Sync>>;

    /// 外部重置版本号
    ///
    /// # 默认值
    /// - 0
    async fn get_workflow_reset_version(&self) -> Result<u64, Box<dyn Error + Send + Sync>>;
}
