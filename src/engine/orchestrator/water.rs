use super::{Derivation, KitchenOrchestrator};
use crate::domain::types::ModuleKind;
use crate::domain::water::{WaterTask, WaterTaskRuntime};
use crate::engine::error::{OrchestratorError, OrchestratorResult};
use crate::engine::water_scheduler::CaptureBounds;
use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

impl KitchenOrchestrator {
    fn water_task_in<'a>(derivation: &'a Derivation, task_id: &str) -> OrchestratorResult<&'a WaterTask> {
        derivation
            .water_task(task_id)
            .ok_or_else(|| OrchestratorError::TaskNotFound(task_id.to_string()))
    }

    fn commit_runtime(&mut self, task_id: &str, runtime: WaterTaskRuntime) {
        if runtime == WaterTaskRuntime::default() {
            self.water_runtime.remove(task_id);
        } else {
            self.water_runtime.insert(task_id.to_string(), runtime);
        }
    }

    /// 开煮（占勺任务须指定勺位）
    pub fn start_water_task(
        &mut self,
        task_id: &str,
        slot: Option<u8>,
        now: DateTime<Utc>,
    ) -> OrchestratorResult<()> {
        let derivation = self.derive(now);
        let task = Self::water_task_in(&derivation, task_id)?;
        let ladle_slots = self.ladle_slots_for(&task.station_id);
        let runtime = self
            .water_scheduler
            .start(&derivation.water_tasks, task, slot, ladle_slots, now)?;
        info!(task_id = %task_id, station_id = %task.station_id, slot = ?runtime.slot, "水煮开煮");
        self.commit_runtime(task_id, runtime);
        Ok(())
    }

    /// 解锁勺位
    pub fn unlock_water_task(&mut self, task_id: &str, now: DateTime<Utc>) -> OrchestratorResult<()> {
        let derivation = self.derive(now);
        let task = Self::water_task_in(&derivation, task_id)?;
        let runtime = self.water_scheduler.unlock(task)?;
        self.commit_runtime(task_id, runtime);
        Ok(())
    }

    /// 指定勺位（排队中即开煮；已解锁则换位）
    pub fn assign_ladle_slot(&mut self, task_id: &str, slot: u8, now: DateTime<Utc>) -> OrchestratorResult<()> {
        let derivation = self.derive(now);
        let task = Self::water_task_in(&derivation, task_id)?;
        let ladle_slots = self.ladle_slots_for(&task.station_id);
        let runtime = self
            .water_scheduler
            .assign_slot(&derivation.water_tasks, task, slot, ladle_slots, now)?;
        info!(task_id = %task_id, slot, "勺位已指定");
        self.commit_runtime(task_id, runtime);
        Ok(())
    }

    /// 退回队列（清除运行时状态）
    pub fn return_water_task(&mut self, task_id: &str, now: DateTime<Utc>) -> OrchestratorResult<()> {
        let derivation = self.derive(now);
        let task = Self::water_task_in(&derivation, task_id)?;
        let runtime = self.water_scheduler.return_to_queue(task)?;
        info!(task_id = %task_id, "水煮任务退回队列");
        self.commit_runtime(task_id, runtime);
        Ok(())
    }

    /// 出锅
    ///
    /// # 返回
    /// 是否为强制完成（未到时）
    pub fn finish_water_task(&mut self, task_id: &str, force: bool, now: DateTime<Utc>) -> OrchestratorResult<bool> {
        let derivation = self.derive(now);
        let task = Self::water_task_in(&derivation, task_id)?;
        let runtime = self.water_scheduler.finish(task, force, now)?;
        let forced = runtime.forced;
        if forced {
            warn!(task_id = %task_id, "水煮任务强制出锅");
        } else {
            info!(task_id = %task_id, "水煮任务出锅");
        }
        self.commit_runtime(task_id, runtime);
        Ok(forced)
    }

    /// 饺子批量下锅
    ///
    /// # 参数
    /// - `target`: 目标只数（None 取默认值）
    ///
    /// # 返回
    /// 被下锅的任务ID（FIFO 顺序）
    #[instrument(skip(self), fields(station_id = %station_id))]
    pub fn capture_dumpling_batch(
        &mut self,
        station_id: &str,
        target: Option<u32>,
        now: DateTime<Utc>,
    ) -> OrchestratorResult<Vec<String>> {
        let derivation = self.derive(now);
        let is_dumpling_station = derivation
            .route(ModuleKind::Dumpling)
            .map_or(false, |r| r.stations.iter().any(|s| s.station_id == station_id));
        if !is_dumpling_station {
            return Err(OrchestratorError::StationNotFound(station_id.to_string()));
        }

        let bounds = CaptureBounds {
            min: self.settings.capture_min,
            max: self.settings.capture_max,
        };
        let target = target.unwrap_or(self.settings.capture_default);
        let captured = self.water_scheduler.capture_dumpling_batch(
            &derivation.water_tasks,
            station_id,
            target,
            bounds,
            now,
        )?;

        let ids: Vec<String> = captured.iter().map(|(id, _)| id.clone()).collect();
        info!(target, tasks = ids.len(), "饺子批量下锅");
        for (task_id, runtime) in captured {
            self.commit_runtime(&task_id, runtime);
        }
        Ok(ids)
    }
}
