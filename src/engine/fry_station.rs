// ==========================================
// 餐饮出品编排系统 - 煎台工位状态机
// ==========================================
// 状态: UNLOCKED → LOCKED(锁定) → COOKING(开煎) → UNLOCKED(出锅)
// 反向: LOCKED → UNLOCKED(撤销锁定，仅限未开煎)
// 红线: 锁定批次总只数 ≤ 容量；出锅须到时；批次锁定中禁止改参数
// ==========================================

use crate::domain::fry::{FryLedger, FryStationState, LockedBatch};
use crate::domain::station::FryStationSettings;
use crate::domain::types::FryStationPhase;
use crate::engine::error::{OrchestratorError, OrchestratorResult};
use crate::engine::fry_scheduler::FryRecommendation;
use chrono::{DateTime, Utc};

fn transition_error(state: &FryStationState, to: &str) -> OrchestratorError {
    OrchestratorError::InvalidStateTransition {
        entity: format!("fry_station:{}", state.station_id),
        from: state.phase().to_string(),
        to: to.to_string(),
    }
}

/// FryStationMachine - 煎台状态机（无状态，直接操作工位状态）
#[derive(Debug, Clone, Copy, Default)]
pub struct FryStationMachine;

impl FryStationMachine {
    pub fn new() -> Self {
        Self
    }

    /// 锁定推荐批次（快照）
    pub fn lock(
        &self,
        state: &mut FryStationState,
        recommendation: &FryRecommendation,
        now: DateTime<Utc>,
    ) -> OrchestratorResult<()> {
        if state.locked_batch.is_some() {
            return Err(OrchestratorError::AlreadyLocked {
                station_id: state.station_id.clone(),
            });
        }
        if recommendation.is_empty() {
            return Err(OrchestratorError::EmptyRecommendation {
                station_id: state.station_id.clone(),
            });
        }
        if recommendation.total_pieces > state.settings.capacity_pieces {
            return Err(OrchestratorError::CapacityExceeded {
                station_id: state.station_id.clone(),
                pieces: recommendation.total_pieces,
                capacity: state.settings.capacity_pieces,
            });
        }

        state.locked_batch = Some(LockedBatch {
            entry_ids: recommendation.entry_ids.clone(),
            total_pieces: recommendation.total_pieces,
            flavor_totals: recommendation.flavor_totals.clone(),
            duration_secs: recommendation
                .duration_secs
                .max(state.settings.default_cook_secs),
            locked_at: now,
            started_at: None,
        });
        Ok(())
    }

    /// 开煎
    ///
    /// # 返回
    /// - `Ok(true)`: 本次开煎
    /// - `Ok(false)`: 已在煎制中（幂等，状态不变）
    pub fn start(&self, state: &mut FryStationState, now: DateTime<Utc>) -> OrchestratorResult<bool> {
        if state.phase() == FryStationPhase::Unlocked {
            return Err(transition_error(state, "COOKING"));
        }
        match state.locked_batch.as_mut() {
            Some(batch) if batch.started_at.is_none() => {
                batch.started_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// 出锅: 记入已煎台账并清空锁定批次
    pub fn complete(
        &self,
        state: &mut FryStationState,
        ledger: &mut FryLedger,
        now: DateTime<Utc>,
    ) -> OrchestratorResult<LockedBatch> {
        let timer = match state.locked_batch.as_ref().and_then(|b| b.timer()) {
            Some(timer) => timer,
            None => return Err(transition_error(state, "UNLOCKED")),
        };
        if !timer.is_due(now) {
            return Err(OrchestratorError::NotFinished {
                entity: format!("fry_station:{}", state.station_id),
                remaining_secs: timer.remaining_secs(now),
            });
        }

        match state.locked_batch.take() {
            Some(batch) => {
                ledger.record(&batch.entry_ids, batch.total_pieces);
                Ok(batch)
            }
            None => Err(transition_error(state, "UNLOCKED")),
        }
    }

    /// 撤销锁定（仅 LOCKED，开煎后不可撤销）
    pub fn release(&self, state: &mut FryStationState) -> OrchestratorResult<LockedBatch> {
        if state.phase() != FryStationPhase::Locked {
            return Err(transition_error(state, "UNLOCKED"));
        }
        state
            .locked_batch
            .take()
            .ok_or_else(|| transition_error(state, "UNLOCKED"))
    }

    /// 修改容量/默认时长（批次锁定中拒绝）
    pub fn update_settings(
        &self,
        state: &mut FryStationState,
        settings: FryStationSettings,
    ) -> OrchestratorResult<()> {
        if state.locked_batch.is_some() {
            return Err(OrchestratorError::StationLocked {
                station_id: state.station_id.clone(),
            });
        }
        if settings.capacity_pieces == 0 || settings.default_cook_secs == 0 {
            return Err(OrchestratorError::InvalidConfig(format!(
                "煎台参数必须大于0: station={}, capacity={}, cook_secs={}",
                state.station_id, settings.capacity_pieces, settings.default_cook_secs
            )));
        }
        state.settings = settings;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::collections::BTreeMap;

    fn station() -> FryStationState {
        FryStationState::new(
            "G1",
            FryStationSettings {
                capacity_pieces: 20,
                default_cook_secs: 360,
            },
        )
    }

    fn rec(pieces: u32) -> FryRecommendation {
        FryRecommendation {
            station_id: "G1".to_string(),
            entry_ids: vec!["A#fry".to_string()],
            total_pieces: pieces,
            flavor_totals: BTreeMap::new(),
            duration_secs: 420,
            blocked_entry_id: None,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_full_cycle() {
        let machine = FryStationMachine::new();
        let mut state = station();
        let mut ledger = FryLedger::default();

        machine.lock(&mut state, &rec(12), t0()).unwrap();
        assert_eq!(state.phase(), FryStationPhase::Locked);
        assert!(matches!(
            machine.lock(&mut state, &rec(12), t0()),
            Err(OrchestratorError::AlreadyLocked { .. })
        ));

        assert!(machine.start(&mut state, t0()).unwrap());
        assert!(!machine.start(&mut state, t0() + Duration::seconds(30)).unwrap());
        assert_eq!(state.locked_batch.as_ref().unwrap().started_at, Some(t0()));

        let early = machine.complete(&mut state, &mut ledger, t0() + Duration::seconds(419));
        assert!(matches!(early, Err(OrchestratorError::NotFinished { remaining_secs: 1, .. })));
        assert_eq!(state.phase(), FryStationPhase::Cooking);
        assert!(!ledger.is_fried("A#fry"));

        let batch = machine
            .complete(&mut state, &mut ledger, t0() + Duration::seconds(420))
            .unwrap();
        assert_eq!(batch.total_pieces, 12);
        assert_eq!(state.phase(), FryStationPhase::Unlocked);
        assert!(ledger.is_fried("A#fry"));
        assert_eq!(ledger.fried_pieces_total, 12);
    }

    #[test]
    fn test_release_only_before_start() {
        let machine = FryStationMachine::new();
        let mut state = station();
        assert!(machine.release(&mut state).is_err());

        machine.lock(&mut state, &rec(5), t0()).unwrap();
        machine.release(&mut state).unwrap();
        assert_eq!(state.phase(), FryStationPhase::Unlocked);

        machine.lock(&mut state, &rec(5), t0()).unwrap();
        machine.start(&mut state, t0()).unwrap();
        assert!(machine.release(&mut state).is_err());
        assert_eq!(state.phase(), FryStationPhase::Cooking);
    }

    #[test]
    fn test_settings_rejected_while_locked() {
        let machine = FryStationMachine::new();
        let mut state = station();
        let wider = FryStationSettings {
            capacity_pieces: 30,
            default_cook_secs: 360,
        };
        machine.lock(&mut state, &rec(5), t0()).unwrap();
        assert!(matches!(
            machine.update_settings(&mut state, wider),
            Err(OrchestratorError::StationLocked { .. })
        ));
        machine.release(&mut state).unwrap();
        machine.update_settings(&mut state, wider).unwrap();
        assert_eq!(state.settings.capacity_pieces, 30);
    }

    #[test]
    fn test_lock_rejects_empty_or_oversized() {
        let machine = FryStationMachine::new();
        let mut state = station();
        let mut empty = rec(0);
        empty.entry_ids.clear();
        assert!(machine.lock(&mut state, &empty, t0()).is_err());
        assert!(matches!(
            machine.lock(&mut state, &rec(25), t0()),
            Err(OrchestratorError::CapacityExceeded { .. })
        ));
        assert!(state.locked_batch.is_none());
    }
}
