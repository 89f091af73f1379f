// ==========================================
// 餐饮出品编排系统 - 水煮任务调度（勺位池）
// ==========================================
// 状态: QUEUED → COOKING → DONE（DONE 仅由 COOKING 到达）
// 反向: COOKING(已解锁) → QUEUED（退回队列）
// 红线: 同一 (工位, 勺位) 同时至多一个煮制中任务
// 红线: 改勺位保留原开煮时间（计时由原开始时间推导）
// 规则: 批量下锅仅作用于排队中的饺子任务，原子开煮
// ==========================================
// 说明: 纯函数，返回新的运行时状态，由编排器提交
// ==========================================

use crate::domain::types::{WaterTaskKind, WaterTaskStatus};
use crate::domain::water::{WaterTask, WaterTaskRuntime};
use crate::engine::error::{OrchestratorError, OrchestratorResult};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// 批量下锅目标区间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureBounds {
    pub min: u32,
    pub max: u32,
}

fn transition_error(task: &WaterTask, to: &str) -> OrchestratorError {
    let from = if task.runtime.status == WaterTaskStatus::Cooking && task.runtime.slot_unlocked {
        "COOKING(UNLOCKED)".to_string()
    } else {
        task.runtime.status.to_string()
    };
    OrchestratorError::InvalidStateTransition {
        entity: format!("water_task:{}", task.task_id),
        from,
        to: to.to_string(),
    }
}

// ==========================================
// WaterScheduler - 水煮任务调度器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct WaterScheduler;

impl WaterScheduler {
    pub fn new() -> Self {
        Self
    }

    /// 工位勺位占用: 勺位 → 任务ID
    pub fn occupied_slots(tasks: &[WaterTask], station_id: &str) -> BTreeMap<u8, String> {
        tasks
            .iter()
            .filter(|t| t.station_id == station_id)
            .filter_map(|t| t.occupied_slot().map(|slot| (slot, t.task_id.clone())))
            .collect()
    }

    /// 勺位可用性校验（排除任务自身）
    fn ensure_slot_free(
        tasks: &[WaterTask],
        task: &WaterTask,
        slot: u8,
        ladle_slots: u8,
    ) -> OrchestratorResult<()> {
        if slot == 0 || slot > ladle_slots {
            return Err(OrchestratorError::SlotOutOfRange {
                station_id: task.station_id.clone(),
                slot,
                capacity: ladle_slots,
            });
        }
        let occupant = tasks.iter().find(|t| {
            t.task_id != task.task_id
                && t.station_id == task.station_id
                && t.occupied_slot() == Some(slot)
        });
        match occupant {
            Some(other) => Err(OrchestratorError::SlotOccupied {
                station_id: task.station_id.clone(),
                slot,
                occupied_by: other.task_id.clone(),
            }),
            None => Ok(()),
        }
    }

    /// 开煮（仅排队中）
    ///
    /// 占勺任务必须指定空闲勺位；饺子任务忽略勺位直接开煮
    pub fn start(
        &self,
        tasks: &[WaterTask],
        task: &WaterTask,
        slot: Option<u8>,
        ladle_slots: u8,
        now: DateTime<Utc>,
    ) -> OrchestratorResult<WaterTaskRuntime> {
        if task.runtime.status != WaterTaskStatus::Queued {
            return Err(transition_error(task, "COOKING"));
        }

        let slot = if task.requires_ladle {
            let slot = slot.ok_or_else(|| OrchestratorError::SlotRequired {
                task_id: task.task_id.clone(),
            })?;
            Self::ensure_slot_free(tasks, task, slot, ladle_slots)?;
            Some(slot)
        } else {
            None
        };

        Ok(WaterTaskRuntime {
            status: WaterTaskStatus::Cooking,
            station_id: Some(task.station_id.clone()),
            started_at: Some(now),
            slot,
            slot_unlocked: false,
            finished_at: None,
            forced: false,
        })
    }

    /// 解锁勺位（允许改位或退回队列）
    pub fn unlock(&self, task: &WaterTask) -> OrchestratorResult<WaterTaskRuntime> {
        if !task.requires_ladle
            || task.runtime.status != WaterTaskStatus::Cooking
            || task.runtime.slot_unlocked
        {
            return Err(transition_error(task, "COOKING(UNLOCKED)"));
        }
        let mut runtime = task.runtime.clone();
        runtime.slot_unlocked = true;
        Ok(runtime)
    }

    /// 指定勺位
    ///
    /// - 排队中: 等同于在该勺位开煮
    /// - 煮制中且已解锁: 换到该勺位并重新锁定，保留开煮时间
    pub fn assign_slot(
        &self,
        tasks: &[WaterTask],
        task: &WaterTask,
        slot: u8,
        ladle_slots: u8,
        now: DateTime<Utc>,
    ) -> OrchestratorResult<WaterTaskRuntime> {
        if !task.requires_ladle {
            return Err(transition_error(task, "SLOT_ASSIGNED"));
        }
        match task.runtime.status {
            WaterTaskStatus::Queued => self.start(tasks, task, Some(slot), ladle_slots, now),
            WaterTaskStatus::Cooking if task.runtime.slot_unlocked => {
                Self::ensure_slot_free(tasks, task, slot, ladle_slots)?;
                let mut runtime = task.runtime.clone();
                runtime.slot = Some(slot);
                runtime.slot_unlocked = false;
                Ok(runtime)
            }
            _ => Err(transition_error(task, "SLOT_ASSIGNED")),
        }
    }

    /// 退回队列（占勺任务须先解锁）
    pub fn return_to_queue(&self, task: &WaterTask) -> OrchestratorResult<WaterTaskRuntime> {
        let allowed = task.runtime.status == WaterTaskStatus::Cooking
            && (!task.requires_ladle || task.runtime.slot_unlocked);
        if !allowed {
            return Err(transition_error(task, "QUEUED"));
        }
        Ok(WaterTaskRuntime::default())
    }

    /// 出锅
    ///
    /// # 参数
    /// - `force`: 强制完成（未到时），手势门控在引擎外部
    pub fn finish(
        &self,
        task: &WaterTask,
        force: bool,
        now: DateTime<Utc>,
    ) -> OrchestratorResult<WaterTaskRuntime> {
        let timer = match task.timer() {
            Some(timer) => timer,
            None => return Err(transition_error(task, "DONE")),
        };
        let due = timer.is_due(now);
        if !due && !force {
            return Err(OrchestratorError::NotFinished {
                entity: format!("water_task:{}", task.task_id),
                remaining_secs: timer.remaining_secs(now),
            });
        }

        let mut runtime = task.runtime.clone();
        runtime.status = WaterTaskStatus::Done;
        runtime.slot_unlocked = false;
        runtime.finished_at = Some(now);
        runtime.forced = !due;
        Ok(runtime)
    }

    /// 饺子批量下锅
    ///
    /// FIFO 贪心累加至目标只数（遇到放不下的即停止）；
    /// 队首任务单独超出目标时单独下锅
    ///
    /// # 返回
    /// 被下锅任务ID → 新运行时状态（FIFO 顺序）
    pub fn capture_dumpling_batch(
        &self,
        tasks: &[WaterTask],
        station_id: &str,
        target: u32,
        bounds: CaptureBounds,
        now: DateTime<Utc>,
    ) -> OrchestratorResult<Vec<(String, WaterTaskRuntime)>> {
        if target < bounds.min || target > bounds.max {
            return Err(OrchestratorError::InvalidCaptureTarget {
                target,
                min: bounds.min,
                max: bounds.max,
            });
        }

        let mut queued: Vec<&WaterTask> = tasks
            .iter()
            .filter(|t| {
                t.station_id == station_id
                    && t.kind == WaterTaskKind::Dumpling
                    && t.runtime.status == WaterTaskStatus::Queued
            })
            .collect();
        queued.sort_by(|a, b| a.fifo_key().cmp(&b.fifo_key()));

        let mut captured: Vec<&WaterTask> = Vec::new();
        let mut total = 0u32;
        for task in &queued {
            if total + task.quantity > target {
                break;
            }
            total += task.quantity;
            captured.push(*task);
        }

        if captured.is_empty() {
            match queued.first() {
                Some(first) => captured.push(*first),
                None => {
                    return Err(OrchestratorError::NothingToCapture {
                        station_id: station_id.to_string(),
                    })
                }
            }
        }

        captured
            .into_iter()
            .map(|task| {
                self.start(tasks, task, None, 0, now)
                    .map(|runtime| (task.task_id.clone(), runtime))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ChecklistPart;
    use crate::domain::water::TaskOrigin;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn task(id: &str, minute: u32, kind: WaterTaskKind, quantity: u32) -> WaterTask {
        WaterTask {
            task_id: id.to_string(),
            order_id: id.to_string(),
            order_created_at: t0() + Duration::minutes(i64::from(minute)),
            ordinal: 0,
            origin: TaskOrigin::Line(0),
            part: ChecklistPart::Whole,
            station_id: "W1".to_string(),
            kind,
            item_id: "x".to_string(),
            quantity,
            required_secs: 240,
            requires_ladle: kind.requires_ladle(),
            runtime: WaterTaskRuntime::default(),
        }
    }

    fn commit(tasks: &mut [WaterTask], id: &str, runtime: WaterTaskRuntime) {
        if let Some(t) = tasks.iter_mut().find(|t| t.task_id == id) {
            t.runtime = runtime;
        }
    }

    #[test]
    fn test_reassign_keeps_start_time() {
        let scheduler = WaterScheduler::new();
        let mut tasks = vec![task("A", 0, WaterTaskKind::Noodle, 1)];

        let rt = scheduler.start(&tasks, &tasks[0], Some(1), 2, t0()).unwrap();
        commit(&mut tasks, "A", rt);
        assert!(scheduler.assign_slot(&tasks, &tasks[0], 2, 2, t0()).is_err());

        let rt = scheduler.unlock(&tasks[0]).unwrap();
        commit(&mut tasks, "A", rt);
        let rt = scheduler
            .assign_slot(&tasks, &tasks[0], 2, 2, t0() + Duration::seconds(90))
            .unwrap();
        assert_eq!(rt.slot, Some(2));
        assert_eq!(rt.started_at, Some(t0()));
        assert!(!rt.slot_unlocked);
    }

    #[test]
    fn test_return_to_queue_requires_unlock() {
        let scheduler = WaterScheduler::new();
        let mut tasks = vec![task("A", 0, WaterTaskKind::Noodle, 1)];
        let rt = scheduler.start(&tasks, &tasks[0], Some(1), 2, t0()).unwrap();
        commit(&mut tasks, "A", rt);

        assert!(scheduler.return_to_queue(&tasks[0]).is_err());
        let rt = scheduler.unlock(&tasks[0]).unwrap();
        commit(&mut tasks, "A", rt);
        let rt = scheduler.return_to_queue(&tasks[0]).unwrap();
        assert_eq!(rt, WaterTaskRuntime::default());
    }

    #[test]
    fn test_finish_requires_due_or_force() {
        let scheduler = WaterScheduler::new();
        let mut tasks = vec![task("A", 0, WaterTaskKind::Dumpling, 10)];
        assert!(scheduler.finish(&tasks[0], true, t0()).is_err());

        let rt = scheduler.start(&tasks, &tasks[0], None, 0, t0()).unwrap();
        commit(&mut tasks, "A", rt);

        let early = scheduler.finish(&tasks[0], false, t0() + Duration::seconds(100));
        assert!(matches!(early, Err(OrchestratorError::NotFinished { remaining_secs: 140, .. })));

        let forced = scheduler.finish(&tasks[0], true, t0() + Duration::seconds(100)).unwrap();
        assert_eq!(forced.status, WaterTaskStatus::Done);
        assert!(forced.forced);

        let normal = scheduler.finish(&tasks[0], false, t0() + Duration::seconds(240)).unwrap();
        assert!(!normal.forced);
    }

    #[test]
    fn test_capture_overflow_fallback() {
        let scheduler = WaterScheduler::new();
        let tasks = vec![
            task("A", 0, WaterTaskKind::Dumpling, 60),
            task("B", 1, WaterTaskKind::Dumpling, 10),
        ];
        let bounds = CaptureBounds { min: 20, max: 100 };

        let captured = scheduler
            .capture_dumpling_batch(&tasks, "W1", 40, bounds, t0())
            .unwrap();
        let ids: Vec<&str> = captured.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["A"]);

        assert!(matches!(
            scheduler.capture_dumpling_batch(&tasks, "W1", 10, bounds, t0()),
            Err(OrchestratorError::InvalidCaptureTarget { .. })
        ));
        assert!(matches!(
            scheduler.capture_dumpling_batch(&tasks, "W9", 40, bounds, t0()),
            Err(OrchestratorError::NothingToCapture { .. })
        ));
    }
}
