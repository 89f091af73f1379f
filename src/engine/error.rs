// ==========================================
// 餐饮出品编排系统 - 引擎层错误类型
// ==========================================
// 红线: 所有拒绝必须带显式原因，且仅作用于当前订单/条目/任务
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 编排引擎错误类型
///
/// 任何变更被拒绝时状态保持不变（拒绝即空操作）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestratorError {
    // ===== 订单提交 =====
    #[error("订单号重复: {0}")]
    DuplicateOrder(String),

    #[error("订单无效: order_id={order_id}, 原因={reason}")]
    InvalidOrder { order_id: String, reason: String },

    #[error("目录中不存在品项: order_id={order_id}, item_id={item_id}")]
    UnknownItem { order_id: String, item_id: String },

    #[error("品项不可售: order_id={order_id}, item_id={item_id}")]
    ItemUnavailable { order_id: String, item_id: String },

    // ===== 实体查找 =====
    #[error("订单不存在: {0}")]
    OrderNotFound(String),

    #[error("工位不存在: {0}")]
    StationNotFound(String),

    #[error("水煮任务不存在: {0}")]
    TaskNotFound(String),

    #[error("清单项不存在: order_id={order_id}, item_key={item_key}")]
    ChecklistItemNotFound { order_id: String, item_key: String },

    // ===== 状态机 =====
    #[error("无效的状态转换: entity={entity}, from={from}, to={to}")]
    InvalidStateTransition {
        entity: String,
        from: String,
        to: String,
    },

    #[error("工位已有锁定批次: {station_id}")]
    AlreadyLocked { station_id: String },

    #[error("推荐批次为空，无法锁定: {station_id}")]
    EmptyRecommendation { station_id: String },

    #[error("批次超出工位容量: station={station_id}, pieces={pieces}, capacity={capacity}")]
    CapacityExceeded {
        station_id: String,
        pieces: u32,
        capacity: u32,
    },

    #[error("尚未到时: entity={entity}, 剩余{remaining_secs}秒")]
    NotFinished { entity: String, remaining_secs: i64 },

    #[error("工位批次锁定中，禁止修改参数: {station_id}")]
    StationLocked { station_id: String },

    // ===== 勺位 =====
    #[error("勺位已占用: station={station_id}, slot={slot}, task={occupied_by}")]
    SlotOccupied {
        station_id: String,
        slot: u8,
        occupied_by: String,
    },

    #[error("勺位超出范围: station={station_id}, slot={slot}, 可用1..={capacity}")]
    SlotOutOfRange {
        station_id: String,
        slot: u8,
        capacity: u8,
    },

    #[error("占勺任务必须指定勺位: {task_id}")]
    SlotRequired { task_id: String },

    // ===== 人工操作 =====
    #[error("不允许拆盒: order_id={order_id}, 原因={reason}")]
    SplitNotAllowed { order_id: String, reason: String },

    #[error("排队中的清单项需二次确认: order_id={order_id}, item_key={item_key}")]
    ConfirmationRequired { order_id: String, item_key: String },

    #[error("批量下锅目标超出范围: target={target}, 允许[{min}, {max}]")]
    InvalidCaptureTarget { target: u32, min: u32, max: u32 },

    #[error("无可下锅的排队饺子任务: {station_id}")]
    NothingToCapture { station_id: String },

    #[error("订单不在归档等待中: {0}")]
    ArchiveNotPending(String),

    // ===== 配置 =====
    #[error("配置无效: {0}")]
    InvalidConfig(String),
}

/// Result 类型别名
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
