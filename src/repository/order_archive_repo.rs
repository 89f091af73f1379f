// ==========================================
// 餐饮出品编排系统 - 订单归档仓储
// ==========================================
// 对齐: order_archive 表
// 职责: 保存归档订单快照（记录方），并以事件发布者身份接收归档事件
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use crate::engine::events::{OrchestratorEvent, OrchestratorEventPublisher, OrchestratorEventType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 归档记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedOrderRecord {
    pub order_id: String,
    pub event_id: String,
    pub archived_at: DateTime<Utc>,
    pub snapshot: serde_json::Value,
}

// ==========================================
// OrderArchiveRepository
// ==========================================
pub struct OrderArchiveRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderArchiveRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入归档快照（同一订单号重复归档时覆盖）
    pub fn save(&self, record: &ArchivedOrderRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO order_archive (order_id, event_id, archived_at, snapshot_json)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(order_id) DO UPDATE SET
                event_id = ?2, archived_at = ?3, snapshot_json = ?4
            "#,
            params![
                record.order_id,
                record.event_id,
                record.archived_at.to_rfc3339(),
                serde_json::to_string(&record.snapshot)?,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_order_id(&self, order_id: &str) -> RepositoryResult<Option<ArchivedOrderRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT order_id, event_id, archived_at, snapshot_json FROM order_archive WHERE order_id = ?1",
        )?;
        match stmt.query_row(params![order_id], map_row) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 最近归档（按归档时间倒序）
    pub fn find_recent(&self, limit: i32) -> RepositoryResult<Vec<ArchivedOrderRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT order_id, event_id, archived_at, snapshot_json
            FROM order_archive
            ORDER BY archived_at DESC
            LIMIT ?1
            "#,
        )?;
        let records = stmt
            .query_map(params![limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM order_archive", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn map_row(row: &Row) -> SqliteResult<ArchivedOrderRecord> {
    let archived_at_str: String = row.get(2)?;
    let archived_at = DateTime::parse_from_rfc3339(&archived_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e)))?;
    let snapshot_str: String = row.get(3)?;
    let snapshot = serde_json::from_str(&snapshot_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(ArchivedOrderRecord {
        order_id: row.get(0)?,
        event_id: row.get(1)?,
        archived_at,
        snapshot,
    })
}

// ==========================================
// ArchiveEventRecorder - 归档事件落库适配器
// ==========================================
// 说明: 只处理 OrderArchived，其余事件忽略
pub struct ArchiveEventRecorder {
    repo: Arc<OrderArchiveRepository>,
}

impl ArchiveEventRecorder {
    pub fn new(repo: Arc<OrderArchiveRepository>) -> Self {
        Self { repo }
    }
}

impl OrchestratorEventPublisher for ArchiveEventRecorder {
    fn publish(&self, event: OrchestratorEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        if event.event_type != OrchestratorEventType::OrderArchived {
            return Ok(String::new());
        }
        let order_id = event
            .order_id
            .clone()
            .ok_or_else(|| format!("归档事件缺少订单ID: event_id={}", event.event_id))?;

        let record = ArchivedOrderRecord {
            order_id,
            event_id: event.event_id.clone(),
            archived_at: event.occurred_at,
            snapshot: event.payload,
        };
        self.repo.save(&record)?;
        tracing::info!(order_id = %record.order_id, event_id = %record.event_id, "归档快照已落库");
        Ok(record.event_id)
    }
}
