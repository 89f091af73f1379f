// ==========================================
// 餐饮出品编排系统 - 配置管理器
// ==========================================
// 职责: 编排参数 / 工位布局 / 重置版本号的加载与保存
// 存储: config_kv 表 (scope_id + key → JSON 文本)
// ==========================================

use crate::config::orchestrator_config_trait::OrchestratorConfigReader;
use crate::config::settings::OrchestratorSettings;
use crate::db::open_sqlite_connection;
use crate::domain::station::KitchenLayout;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（UPSERT）
    fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    // ==========================================
    // 保存
    // ==========================================

    /// 保存编排参数（先校验）
    pub fn save_orchestrator_settings(&self, settings: &OrchestratorSettings) -> ConfigResult<()> {
        settings.validate()?;
        self.set_config_value(config_keys::ORCHESTRATOR_SETTINGS, &serde_json::to_string(settings)?)
    }

    /// 保存工位布局（先校验）
    pub fn save_kitchen_layout(&self, layout: &KitchenLayout) -> ConfigResult<()> {
        layout.validate()?;
        self.set_config_value(config_keys::KITCHEN_LAYOUT, &serde_json::to_string(layout)?)
    }

    /// 保存导入别名表（外部编码/名称 → 内部品项ID）
    pub fn save_catalog_aliases(&self, aliases: &HashMap<String, String>) -> ConfigResult<()> {
        self.set_config_value(config_keys::CATALOG_ALIASES, &serde_json::to_string(aliases)?)
    }

    /// 读取导入别名表（未配置时为空）
    pub fn get_catalog_aliases(&self) -> ConfigResult<HashMap<String, String>> {
        match self.get_config_value(config_keys::CATALOG_ALIASES)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(HashMap::new()),
        }
    }

    /// 外部重置信号: 版本号 +1
    ///
    /// # 返回
    /// 新版本号
    pub fn bump_workflow_reset_version(&self) -> ConfigResult<u64> {
        let next = self.read_reset_version()? + 1;
        self.set_config_value(config_keys::WORKFLOW_RESET_VERSION, &next.to_string())?;
        tracing::info!(version = next, "工作流重置版本号已递增");
        Ok(next)
    }

    fn read_reset_version(&self) -> ConfigResult<u64> {
        let value = self.get_config_or_default(config_keys::WORKFLOW_RESET_VERSION, "0")?;
        Ok(value.trim().parse::<u64>().unwrap_or(0))
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// OrchestratorConfigReader Trait 实现
// ==========================================
#[async_trait]
impl OrchestratorConfigReader for ConfigManager {
    async fn get_orchestrator_settings(&self) -> ConfigResult<OrchestratorSettings> {
        let Some(raw) = self.get_config_value(config_keys::ORCHESTRATOR_SETTINGS)? else {
            return Ok(OrchestratorSettings::default());
        };
        let settings = serde_json::from_str::<OrchestratorSettings>(&raw)
            .ok()
            .filter(|s| s.validate().is_ok())
            .unwrap_or_else(|| {
                tracing::warn!(
                    config_key = config_keys::ORCHESTRATOR_SETTINGS,
                    raw_value = %raw,
                    "编排参数格式错误，使用默认值"
                );
                OrchestratorSettings::default()
            });
        Ok(settings)
    }

    async fn get_kitchen_layout(&self) -> ConfigResult<KitchenLayout> {
        match self.get_config_value(config_keys::KITCHEN_LAYOUT)? {
            Some(raw) => {
                let layout: KitchenLayout = serde_json::from_str(&raw)?;
                layout.validate()?;
                Ok(layout)
            }
            None => Ok(KitchenLayout::default()),
        }
    }

    async fn get_workflow_reset_version(&self) -> ConfigResult<u64> {
        self.read_reset_version()
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    /// 编排参数 (JSON)
    pub const ORCHESTRATOR_SETTINGS: &str = "orchestrator_settings";
    /// 工位布局 (JSON)
    pub const KITCHEN_LAYOUT: &str = "kitchen_layout";
    /// 导入别名表 (JSON)
    pub const CATALOG_ALIASES: &str = "catalog_aliases";
    /// 外部重置版本号
    pub const WORKFLOW_RESET_VERSION: &str = "workflow_reset_version";
}
