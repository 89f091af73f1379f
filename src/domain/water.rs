// ==========================================
// 餐饮出品编排系统 - 水煮任务领域模型
// ==========================================
// 红线: 同一 (工位, 勺位) 同时至多一个煮制中任务
// 状态: QUEUED → COOKING → DONE（DONE 只能由 COOKING 到达）
// ==========================================

use crate::domain::timer::CookTimer;
use crate::domain::types::{ChecklistPart, WaterTaskKind, WaterTaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 任务来源（订单行 / 盒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskOrigin {
    Line(usize),
    Box(usize),
}

// ==========================================
// WaterTaskRuntime - 运行时状态（唯一被存储的部分）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterTaskRuntime {
    pub status: WaterTaskStatus,
    /// 开煮时锁定的工位（之后路由变化不再迁移任务）
    pub station_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub slot: Option<u8>,
    /// 人工解锁（允许改勺位/退回队列）
    pub slot_unlocked: bool,
    pub finished_at: Option<DateTime<Utc>>,
    /// 强制完成（未到时）
    pub forced: bool,
}

// ==========================================
// WaterTask - 原子水煮任务
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterTask {
    pub task_id: String,
    pub order_id: String,
    pub order_created_at: DateTime<Utc>,
    /// 订单内派生序号
    pub ordinal: u32,
    pub origin: TaskOrigin,
    pub part: ChecklistPart,
    pub station_id: String,
    pub kind: WaterTaskKind,
    pub item_id: String,
    pub quantity: u32,
    pub required_secs: u32,
    pub requires_ladle: bool,
    pub runtime: WaterTaskRuntime,
}

impl WaterTask {
    /// FIFO 键: 创建顺序 → 订单号 → 派生序号
    pub fn fifo_key(&self) -> (DateTime<Utc>, &str, u32) {
        (self.order_created_at, self.order_id.as_str(), self.ordinal)
    }

    pub fn status(&self) -> WaterTaskStatus {
        self.runtime.status
    }

    pub fn timer(&self) -> Option<CookTimer> {
        match (self.runtime.status, self.runtime.started_at) {
            (WaterTaskStatus::Cooking, Some(started)) => Some(CookTimer::new(started, self.required_secs)),
            _ => None,
        }
    }

    /// 是否占用勺位（煮制中的占勺任务，含已解锁待改位的任务）
    pub fn occupied_slot(&self) -> Option<u8> {
        if self.requires_ladle && self.runtime.status == WaterTaskStatus::Cooking {
            self.runtime.slot
        } else {
            None
        }
    }
}
