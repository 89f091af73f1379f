// ==========================================
// 餐饮出品编排系统 - 出品编排 API
// ==========================================
// 职责: 包装编排引擎，每次变更为一个临界区（校验 + 提交）
// 红线: 所有成功的人工变更必须写入 ActionLog
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::warn;

use crate::api::error::{ApiError, ApiResult};
use crate::api::tap_gate::TapConfirmGate;
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::checklist::OrderChecklistView;
use crate::domain::order::{Order, OrderSubmission};
use crate::domain::station::KitchenLayout;
use crate::engine::orchestrator::KitchenOrchestrator;
use crate::engine::views::KitchenOverview;
use crate::repository::action_log_repo::ActionLogRepository;

mod packaging;
mod stations;

/// 系统自动触发的操作人
pub const SYSTEM_ACTOR: &str = "system";

// ==========================================
// KitchenApi - 出品编排 API
// ==========================================

/// 出品编排API
///
/// 职责：
/// 1. 订单提交、备注、出餐、归档
/// 2. 煎台 / 水煮 / 打包线人工操作
/// 3. 连击确认门控（强制出锅、排队项打包）
/// 4. ActionLog记录
pub struct KitchenApi {
    engine: Arc<Mutex<KitchenOrchestrator>>,
    action_log_repo: Arc<ActionLogRepository>,
    config_manager: Option<Arc<ConfigManager>>,
    force_finish_gate: Mutex<TapConfirmGate>,
    packed_confirm_gate: Mutex<TapConfirmGate>,
}

impl KitchenApi {
    /// 创建新的KitchenApi实例
    ///
    /// 手势门控参数取自引擎当前编排参数
    pub fn new(
        engine: Arc<Mutex<KitchenOrchestrator>>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> ApiResult<Self> {
        let (force_gate, packed_gate) = {
            let guard = engine
                .lock()
                .map_err(|e| ApiError::InternalError(format!("引擎锁获取失败: {}", e)))?;
            let settings = guard.settings();
            (settings.force_finish_gate, settings.packed_confirm_gate)
        };

        Ok(Self {
            engine,
            action_log_repo,
            config_manager: None,
            force_finish_gate: Mutex::new(TapConfirmGate::new(force_gate)),
            packed_confirm_gate: Mutex::new(TapConfirmGate::new(packed_gate)),
        })
    }

    /// 挂接配置管理器（布局/煎台参数变更后回写 config_kv）
    pub fn with_config_manager(mut self, config_manager: Arc<ConfigManager>) -> Self {
        self.config_manager = Some(config_manager);
        self
    }

    pub fn engine_handle(&self) -> Arc<Mutex<KitchenOrchestrator>> {
        self.engine.clone()
    }

    /// 两个门控中尚在等待确认的目标总数
    pub fn pending_taps(&self) -> usize {
        let mut total = 0;
        self.with_gates(|gate| total += gate.pending_keys());
        total
    }

    // ==========================================
    // 内部工具
    // ==========================================

    fn engine(&self) -> ApiResult<MutexGuard<'_, KitchenOrchestrator>> {
        self.engine
            .lock()
            .map_err(|e| ApiError::InternalError(format!("引擎锁获取失败: {}", e)))
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// 依次作用于两个确认门控（锁中毒时跳过）
    fn with_gates(&self, mut f: impl FnMut(&mut TapConfirmGate)) {
        for gate in [&self.force_finish_gate, &self.packed_confirm_gate] {
            if let Ok(mut gate) = gate.lock() {
                f(&mut gate);
            }
        }
    }

    /// 写审计日志（失败只告警，引擎状态已提交）
    fn record(&self, log: ActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            warn!(action_type = %log.action_type, error = %e, "操作日志写入失败");
        }
    }

    /// 布局回写 config_kv
    fn persist_layout(&self, layout: &KitchenLayout) -> ApiResult<()> {
        if let Some(config) = &self.config_manager {
            config
                .save_kitchen_layout(layout)
                .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        }
        Ok(())
    }

    // ==========================================
    // 订单生命周期
    // ==========================================

    /// 提交单个订单
    pub fn submit_order(&self, submission: OrderSubmission, actor: &str) -> ApiResult<()> {
        let order_id = submission.order_id.clone();
        let line_count = submission.lines.len();
        let box_count = submission.boxes.len();
        self.engine()?.submit_order(submission, self.now())?;

        self.record(
            ActionLog::new(ActionType::SubmitOrder, actor)
                .order(&order_id)
                .payload(json!({ "lines": line_count, "boxes": box_count })),
        );
        Ok(())
    }

    /// 整批提交（任一订单被拒则整批不提交）
    pub fn submit_orders(
        &self,
        submissions: Vec<OrderSubmission>,
        actor: &str,
        batch_id: Option<&str>,
    ) -> ApiResult<Vec<String>> {
        let accepted = self.engine()?.submit_orders(submissions, self.now())?;

        let mut log = ActionLog::new(ActionType::ImportOrders, actor)
            .payload(json!({ "order_ids": accepted }))
            .detail(format!("批量提交{}个订单", accepted.len()));
        if let Some(batch_id) = batch_id {
            log = log.entity(batch_id);
        }
        self.record(log);
        Ok(accepted)
    }

    pub fn append_workflow_note(&self, order_id: &str, note: &str, actor: &str) -> ApiResult<()> {
        if note.trim().is_empty() {
            return Err(ApiError::InvalidInput("备注不能为空".to_string()));
        }
        self.engine()?.append_workflow_note(order_id, note)?;
        self.record(ActionLog::new(ActionType::AppendNote, actor).order(order_id).detail(note));
        Ok(())
    }

    /// 出餐（待取餐 → 已出餐）
    pub fn mark_served(&self, order_id: &str, actor: &str) -> ApiResult<()> {
        self.engine()?.mark_served(order_id, self.now())?;
        self.record(ActionLog::new(ActionType::MarkServed, actor).order(order_id));
        Ok(())
    }

    /// 申请归档（宽限期后由定时任务落实）
    ///
    /// # 返回
    /// 归档到期时间
    pub fn request_archive(&self, order_id: &str, actor: &str) -> ApiResult<DateTime<Utc>> {
        let due_at = self.engine()?.request_archive(order_id, self.now())?;
        self.record(
            ActionLog::new(ActionType::RequestArchive, actor)
                .order(order_id)
                .payload(json!({ "due_at": due_at.to_rfc3339() })),
        );
        Ok(due_at)
    }

    pub fn undo_archive(&self, order_id: &str, actor: &str) -> ApiResult<()> {
        self.engine()?.undo_archive(order_id)?;
        self.record(ActionLog::new(ActionType::UndoArchive, actor).order(order_id));
        Ok(())
    }

    /// 落实到期归档，并清理确认门控（超窗点按、已归档订单的点按）
    ///
    /// # 返回
    /// 已归档订单ID
    pub fn flush_due_archives(&self, now: DateTime<Utc>) -> ApiResult<Vec<String>> {
        let archived = self.engine()?.flush_due_archives(now);
        self.with_gates(|gate| {
            gate.prune(now);
            for order_id in &archived {
                gate.forget_order(order_id);
            }
        });
        if !archived.is_empty() {
            let logs = archived
                .iter()
                .map(|order_id| ActionLog::new(ActionType::ArchiveOrder, SYSTEM_ACTOR).order(order_id))
                .collect();
            if let Err(e) = self.action_log_repo.batch_insert(logs) {
                warn!(error = %e, "归档日志写入失败");
            }
        }
        Ok(archived)
    }

    /// 应用外部重置版本号
    ///
    /// # 返回
    /// 是否实际执行了重置
    pub fn apply_reset_version(&self, version: u64) -> ApiResult<bool> {
        let applied = self.engine()?.apply_reset_version(version, self.now());
        if applied {
            self.with_gates(TapConfirmGate::clear);
            self.record(
                ActionLog::new(ActionType::WorkflowReset, SYSTEM_ACTOR)
                    .payload(json!({ "version": version })),
            );
        }
        Ok(applied)
    }

    /// 替换工位布局
    pub fn apply_layout(&self, layout: KitchenLayout, actor: &str) -> ApiResult<()> {
        let station_count = layout.stations.len();
        {
            let mut engine = self.engine()?;
            engine.apply_layout(layout, self.now())?;
            self.persist_layout(engine.layout())?;
        }
        self.record(
            ActionLog::new(ActionType::UpdateLayout, actor)
                .payload(json!({ "stations": station_count })),
        );
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn overview(&self) -> ApiResult<KitchenOverview> {
        Ok(self.engine()?.overview(self.now()))
    }

    pub fn order(&self, order_id: &str) -> ApiResult<Order> {
        self.engine()?
            .order(order_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("订单(id={})不存在", order_id)))
    }

    pub fn order_checklist(&self, order_id: &str) -> ApiResult<OrderChecklistView> {
        Ok(self.engine()?.order_checklist(order_id, self.now())?)
    }

    pub fn recent_actions(&self, limit: i32) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_recent(limit)?)
    }

    pub fn order_actions(&self, order_id: &str) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_by_order_id(order_id)?)
    }
}
