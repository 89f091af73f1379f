// ==========================================
// 餐饮出品编排系统 - 核心库
// ==========================================
// 系统定位: 后厨出品与打包编排（人工最终控制权）
// 模块: 煎台批次 / 水煮勺位 / 打包清单 / 工位路由
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 审计与归档记录
pub mod repository;

// 引擎层 - 编排规则
pub mod engine;

// 导入层 - 外部订单文件
pub mod importer;

// 配置层 - 编排参数与工位布局
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配与定时刷新
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ChecklistStatus, FryStationPhase, ModuleKind, PrepKind, ServiceMode, ServiceStatus,
    WaterTaskKind, WaterTaskStatus,
};

// 领域实体
pub use domain::{ActionLog, ActionType, CatalogItem, KitchenLayout, Order, OrderSubmission};

// 引擎
pub use engine::{Catalog, KitchenOrchestrator, OrchestratorError, OrchestratorResult};

// API
pub use api::{ImportApi, KitchenApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "餐饮出品编排系统";
