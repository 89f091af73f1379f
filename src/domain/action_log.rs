// ==========================================
// 餐饮出品编排系统 - 操作日志领域模型
// ==========================================
// 红线: 所有人工变更操作必须记录
// 用途: 审计追踪（锁锅、开煎、出锅、勺位调整、打包覆写、归档、重置）
// 对齐: action_log 表
// ==========================================

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub action_type: String,
    pub action_ts: NaiveDateTime,
    pub actor: String,

    // ===== 作用对象 =====
    pub order_id: Option<String>,
    pub station_id: Option<String>,
    pub entity_id: Option<String>, // 条目ID / 任务ID / 清单项键

    // ===== 操作负载 =====
    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

impl ActionLog {
    pub fn new(action_type: ActionType, actor: &str) -> Self {
        Self {
            action_id: Uuid::new_v4().to_string(),
            action_type: action_type.as_str().to_string(),
            action_ts: Utc::now().naive_utc(),
            actor: actor.to_string(),
            order_id: None,
            station_id: None,
            entity_id: None,
            payload_json: None,
            detail: None,
        }
    }

    pub fn order(mut self, order_id: &str) -> Self {
        self.order_id = Some(order_id.to_string());
        self
    }

    pub fn station(mut self, station_id: &str) -> Self {
        self.station_id = Some(station_id.to_string());
        self
    }

    pub fn entity(mut self, entity_id: &str) -> Self {
        self.entity_id = Some(entity_id.to_string());
        self
    }

    pub fn payload(mut self, payload: JsonValue) -> Self {
        self.payload_json = Some(payload);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    SubmitOrder,       // 订单提交
    ImportOrders,      // 批量导入
    LockBatch,         // 锁锅
    ReleaseBatch,      // 解锁（未开煎）
    StartBatch,        // 开煎
    CompleteBatch,     // 出锅
    UpdateFryStation,  // 煎台参数变更
    SplitFryOrder,     // 拆盒煎制
    StartWaterTask,    // 下锅
    UnlockWaterTask,   // 勺位解锁
    AssignLadleSlot,   // 改勺位
    ReturnWaterTask,   // 退回队列
    FinishWaterTask,   // 出锅
    ForceFinishTask,   // 强制出锅
    CaptureDumplings,  // 饺子批量下锅
    TogglePacked,      // 打包覆写切换
    PinOrder,          // 置顶
    UnpinOrder,        // 取消置顶
    MarkServed,        // 出餐
    RequestArchive,    // 申请归档
    UndoArchive,       // 撤销归档
    ArchiveOrder,      // 归档完成
    AppendNote,        // 追加流程备注
    UpdateLayout,      // 工位布局变更
    WorkflowReset,     // 流程重置
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::SubmitOrder => "SUBMIT_ORDER",
            ActionType::ImportOrders => "IMPORT_ORDERS",
            ActionType::LockBatch => "LOCK_BATCH",
            ActionType::ReleaseBatch => "RELEASE_BATCH",
            ActionType::StartBatch => "START_BATCH",
            ActionType::CompleteBatch => "COMPLETE_BATCH",
            ActionType::UpdateFryStation => "UPDATE_FRY_STATION",
            ActionType::SplitFryOrder => "SPLIT_FRY_ORDER",
            ActionType::StartWaterTask => "START_WATER_TASK",
            ActionType::UnlockWaterTask => "UNLOCK_WATER_TASK",
            ActionType::AssignLadleSlot => "ASSIGN_LADLE_SLOT",
            ActionType::ReturnWaterTask => "RETURN_WATER_TASK",
            ActionType::FinishWaterTask => "FINISH_WATER_TASK",
            ActionType::ForceFinishTask => "FORCE_FINISH_TASK",
            ActionType::CaptureDumplings => "CAPTURE_DUMPLINGS",
            ActionType::TogglePacked => "TOGGLE_PACKED",
            ActionType::PinOrder => "PIN_ORDER",
            ActionType::UnpinOrder => "UNPIN_ORDER",
            ActionType::MarkServed => "MARK_SERVED",
            ActionType::RequestArchive => "REQUEST_ARCHIVE",
            ActionType::UndoArchive => "UNDO_ARCHIVE",
            ActionType::ArchiveOrder => "ARCHIVE_ORDER",
            ActionType::AppendNote => "APPEND_NOTE",
            ActionType::UpdateLayout => "UPDATE_LAYOUT",
            ActionType::WorkflowReset => "WORKFLOW_RESET",
        }
    }
}
