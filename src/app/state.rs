// ==========================================
// 餐饮出品编排系统 - 应用状态
// ==========================================
// 职责: 装配数据库、仓储、配置、编排引擎与 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ImportApi, KitchenApi};
use crate::config::{ConfigManager, OrchestratorConfigReader};
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::engine::catalog::Catalog;
use crate::engine::events::OptionalEventPublisher;
use crate::engine::KitchenOrchestrator;
use crate::importer::{CatalogMapper, OrderFieldMapper, OrderImporterImpl, UniversalFileParser};
use crate::repository::{ActionLogRepository, ArchiveEventRecorder, OrderArchiveRepository};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 操作日志仓储
    pub action_log_repo: Arc<ActionLogRepository>,

    /// 归档快照仓储
    pub archive_repo: Arc<OrderArchiveRepository>,

    /// 出品编排API
    pub kitchen_api: Arc<KitchenApi>,

    /// 订单导入API
    pub import_api: Arc<ImportApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - catalog: 目录快照（目录编辑不在本系统范围内）
    pub async fn new(db_path: String, catalog: Catalog) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        // 共享连接
        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // Repository / Config
        // ==========================================
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let archive_repo = Arc::new(OrderArchiveRepository::new(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let settings = config_manager
            .get_orchestrator_settings()
            .await
            .map_err(|e| format!("读取编排参数失败: {}", e))?;
        let layout = config_manager
            .get_kitchen_layout()
            .await
            .map_err(|e| format!("读取工位布局失败: {}", e))?;
        let reset_version = config_manager
            .get_workflow_reset_version()
            .await
            .map_err(|e| format!("读取重置版本号失败: {}", e))?;
        let aliases = config_manager
            .get_catalog_aliases()
            .map_err(|e| format!("读取导入别名表失败: {}", e))?;

        // ==========================================
        // Engine
        // ==========================================
        let recorder = Arc::new(ArchiveEventRecorder::new(archive_repo.clone()));
        let mut orchestrator = KitchenOrchestrator::new(settings, catalog.clone(), layout)
            .map_err(|e| format!("无法创建编排引擎: {}", e))?
            .with_event_publisher(OptionalEventPublisher::with_publisher(recorder));
        // 启动时对齐外部重置版本号（此时无在途状态）
        orchestrator.apply_reset_version(reset_version, chrono::Utc::now());
        let engine = Arc::new(Mutex::new(orchestrator));

        // ==========================================
        // API
        // ==========================================
        let kitchen_api = Arc::new(
            KitchenApi::new(engine, action_log_repo.clone())
                .map_err(|e| format!("无法创建KitchenApi: {}", e))?
                .with_config_manager(config_manager.clone()),
        );

        let catalog_mapper = CatalogMapper::new(Arc::new(catalog)).with_aliases(aliases);
        let importer = OrderImporterImpl::new(
            Box::new(UniversalFileParser),
            Box::new(OrderFieldMapper),
            catalog_mapper,
        );
        let import_api = Arc::new(ImportApi::new(Box::new(importer), kitchen_api.clone()));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            config_manager,
            action_log_repo,
            archive_repo,
            kitchen_api,
            import_api,
        })
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 KITCHEN_ORCHESTRATOR_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("KITCHEN_ORCHESTRATOR_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./kitchen_orchestrator.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = if cfg!(debug_assertions) {
            data_dir.join("kitchen-orchestrator-dev")
        } else {
            data_dir.join("kitchen-orchestrator")
        };
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("kitchen_orchestrator.db");
        }
    }

    path.to_string_lossy().to_string()
}
