// ==========================================
// KitchenApi - 煎台 / 水煮工位操作
// ==========================================

use serde_json::json;
use tracing::info;

use super::KitchenApi;
use crate::api::error::{ApiError, ApiResult};
use crate::api::tap_gate::TapOutcome;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::fry::LockedBatch;
use crate::domain::station::FryStationSettings;
use crate::engine::views::{GriddleView, WaterStationView};

impl KitchenApi {
    // ==========================================
    // 煎台
    // ==========================================

    /// 锁定当前推荐批次
    pub fn lock_batch(&self, station_id: &str, actor: &str) -> ApiResult<LockedBatch> {
        let batch = self.engine()?.lock_batch(station_id, self.now())?;
        self.record(
            ActionLog::new(ActionType::LockBatch, actor)
                .station(station_id)
                .payload(json!({
                    "entry_ids": batch.entry_ids,
                    "total_pieces": batch.total_pieces,
                    "flavor_totals": batch.flavor_totals,
                })),
        );
        Ok(batch)
    }

    /// 开煎
    ///
    /// # 返回
    /// - `false`: 已在煎制中（幂等，不记日志）
    pub fn start_batch(&self, station_id: &str, actor: &str) -> ApiResult<bool> {
        let started = self.engine()?.start_batch(station_id, self.now())?;
        if started {
            self.record(ActionLog::new(ActionType::StartBatch, actor).station(station_id));
        }
        Ok(started)
    }

    /// 出锅（计入已煎台账）
    pub fn complete_batch(&self, station_id: &str, actor: &str) -> ApiResult<LockedBatch> {
        let batch = self.engine()?.complete_batch(station_id, self.now())?;
        self.record(
            ActionLog::new(ActionType::CompleteBatch, actor)
                .station(station_id)
                .payload(json!({
                    "entry_ids": batch.entry_ids,
                    "total_pieces": batch.total_pieces,
                })),
        );
        Ok(batch)
    }

    /// 解锁（仅未开煎）
    pub fn release_batch(&self, station_id: &str, actor: &str) -> ApiResult<LockedBatch> {
        let batch = self.engine()?.release_batch(station_id)?;
        self.record(
            ActionLog::new(ActionType::ReleaseBatch, actor)
                .station(station_id)
                .payload(json!({ "entry_ids": batch.entry_ids })),
        );
        Ok(batch)
    }

    /// 修改煎台容量/时长（锁定中拒绝）
    pub fn update_fry_settings(
        &self,
        station_id: &str,
        settings: FryStationSettings,
        actor: &str,
    ) -> ApiResult<()> {
        {
            let mut engine = self.engine()?;
            engine.update_fry_settings(station_id, settings)?;
            self.persist_layout(engine.layout())?;
        }
        self.record(
            ActionLog::new(ActionType::UpdateFryStation, actor)
                .station(station_id)
                .payload(json!({
                    "capacity_pieces": settings.capacity_pieces,
                    "default_cook_secs": settings.default_cook_secs,
                })),
        );
        Ok(())
    }

    /// 按盒拆分煎制条目
    pub fn split_fry_order(&self, order_id: &str, actor: &str) -> ApiResult<Vec<String>> {
        let entry_ids = self.engine()?.split_fry_order(order_id)?;
        self.record(
            ActionLog::new(ActionType::SplitFryOrder, actor)
                .order(order_id)
                .payload(json!({ "entry_ids": entry_ids })),
        );
        Ok(entry_ids)
    }

    pub fn griddle_view(&self) -> ApiResult<GriddleView> {
        Ok(self.engine()?.griddle_view(self.now()))
    }

    // ==========================================
    // 水煮
    // ==========================================

    /// 下锅（占勺任务须指定勺位）
    pub fn start_water_task(&self, task_id: &str, slot: Option<u8>, actor: &str) -> ApiResult<()> {
        self.engine()?.start_water_task(task_id, slot, self.now())?;
        self.record(
            ActionLog::new(ActionType::StartWaterTask, actor)
                .entity(task_id)
                .payload(json!({ "slot": slot })),
        );
        Ok(())
    }

    pub fn unlock_water_task(&self, task_id: &str, actor: &str) -> ApiResult<()> {
        self.engine()?.unlock_water_task(task_id, self.now())?;
        self.record(ActionLog::new(ActionType::UnlockWaterTask, actor).entity(task_id));
        Ok(())
    }

    /// 改勺位（保留已计时长）
    pub fn assign_ladle_slot(&self, task_id: &str, slot: u8, actor: &str) -> ApiResult<()> {
        self.engine()?.assign_ladle_slot(task_id, slot, self.now())?;
        self.record(
            ActionLog::new(ActionType::AssignLadleSlot, actor)
                .entity(task_id)
                .payload(json!({ "slot": slot })),
        );
        Ok(())
    }

    pub fn return_water_task(&self, task_id: &str, actor: &str) -> ApiResult<()> {
        self.engine()?.return_water_task(task_id, self.now())?;
        self.record(ActionLog::new(ActionType::ReturnWaterTask, actor).entity(task_id));
        Ok(())
    }

    /// 正常出锅（须到时）
    pub fn finish_water_task(&self, task_id: &str, actor: &str) -> ApiResult<()> {
        self.engine()?.finish_water_task(task_id, false, self.now())?;
        self.record(ActionLog::new(ActionType::FinishWaterTask, actor).entity(task_id));
        Ok(())
    }

    /// 强制出锅点按（连击达到次数才执行）
    ///
    /// # 返回
    /// - Err(ConfirmationPending): 尚需继续点按
    pub fn tap_force_finish(&self, task_id: &str, actor: &str) -> ApiResult<()> {
        let now = self.now();
        let outcome = self
            .force_finish_gate
            .lock()
            .map_err(|e| ApiError::InternalError(format!("门控锁获取失败: {}", e)))?
            .tap(task_id, now);

        if let TapOutcome::Pending { remaining } = outcome {
            return Err(ApiError::ConfirmationPending {
                action: format!("强制出锅 {}", task_id),
                remaining,
            });
        }

        let forced = self.engine()?.finish_water_task(task_id, true, now)?;
        info!(task_id = %task_id, forced, actor = %actor, "强制出锅确认");
        self.record(
            ActionLog::new(ActionType::ForceFinishTask, actor)
                .entity(task_id)
                .payload(json!({ "forced": forced })),
        );
        Ok(())
    }

    /// 饺子批量下锅
    pub fn capture_dumplings(
        &self,
        station_id: &str,
        target: Option<u32>,
        actor: &str,
    ) -> ApiResult<Vec<String>> {
        let task_ids = self
            .engine()?
            .capture_dumpling_batch(station_id, target, self.now())?;
        self.record(
            ActionLog::new(ActionType::CaptureDumplings, actor)
                .station(station_id)
                .payload(json!({ "target": target, "task_ids": task_ids })),
        );
        Ok(task_ids)
    }

    pub fn water_station_views(&self) -> ApiResult<Vec<WaterStationView>> {
        Ok(self.engine()?.water_station_views(self.now()))
    }
}
