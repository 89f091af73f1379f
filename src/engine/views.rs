// ==========================================
// 餐饮出品编排系统 - 出站视图
// ==========================================
// 职责: 工位/打包线/全厨房视图（每轮重算，不存储）
// ==========================================

use crate::domain::checklist::OrderChecklistView;
use crate::domain::fry::LockedBatch;
use crate::domain::station::FryStationSettings;
use crate::domain::types::{FryStationPhase, ModuleKind, WaterTaskKind, WaterTaskStatus};
use crate::domain::water::WaterTask;
use crate::engine::fry_scheduler::FryRecommendation;
use chrono::{DateTime, Utc};
use serde::Serialize;

// ==========================================
// 煎台视图
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GriddleStationView {
    pub station_id: String,
    pub name: String,
    pub phase: FryStationPhase,
    pub settings: FryStationSettings,
    /// 未锁定时的推荐批次
    pub recommendation: Option<FryRecommendation>,
    pub locked_batch: Option<LockedBatch>,
    pub remaining_secs: Option<i64>,
    pub progress: Option<f64>,
    /// 推荐为空时队首超容条目
    pub blocked_entry_id: Option<String>,
    /// 路由到本工位的待煎订单（负载预览）
    pub backlog_preview: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GriddleView {
    pub stations: Vec<GriddleStationView>,
    /// 共享待煎队列深度
    pub queue_depth: usize,
    pub blocked_entry_ids: Vec<String>,
    pub fried_pieces_total: u64,
}

// ==========================================
// 水煮视图
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterTaskView {
    pub task_id: String,
    pub order_id: String,
    pub kind: WaterTaskKind,
    pub item_id: String,
    pub quantity: u32,
    pub status: WaterTaskStatus,
    pub slot: Option<u8>,
    pub slot_unlocked: bool,
    pub remaining_secs: Option<i64>,
    pub progress: Option<f64>,
    /// 正常出锅是否可用（剩余 ≤ 0）
    pub can_finish: bool,
}

impl WaterTaskView {
    pub fn from_task(task: &WaterTask, now: DateTime<Utc>) -> Self {
        let timer = task.timer();
        Self {
            task_id: task.task_id.clone(),
            order_id: task.order_id.clone(),
            kind: task.kind,
            item_id: task.item_id.clone(),
            quantity: task.quantity,
            status: task.runtime.status,
            slot: task.runtime.slot,
            slot_unlocked: task.runtime.slot_unlocked,
            remaining_secs: timer.map(|t| t.remaining_secs(now)),
            progress: timer.map(|t| t.progress(now)),
            can_finish: timer.map_or(false, |t| t.is_due(now)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub slot: u8,
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterStationView {
    pub station_id: String,
    pub module: ModuleKind,
    pub ladle_slots: u8,
    pub queued: Vec<WaterTaskView>,
    pub cooking: Vec<WaterTaskView>,
    pub slots: Vec<SlotView>,
}

// ==========================================
// 打包线视图
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackagingLaneView {
    pub lane_id: String,
    pub waiting_orders: usize,
    pub pinned: Vec<String>,
    pub top_queue: Vec<OrderChecklistView>,
}

// ==========================================
// 全厨房概览
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KitchenOverview {
    pub generated_at: DateTime<Utc>,
    pub active_orders: usize,
    pub pending_archives: usize,
    pub reset_version: u64,
    pub griddle: GriddleView,
    pub water_stations: Vec<WaterStationView>,
    pub lanes: Vec<PackagingLaneView>,
}
