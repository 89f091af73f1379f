use super::KitchenOrchestrator;
use crate::domain::fry::LockedBatch;
use crate::domain::station::{FryStationConfig, FryStationSettings};
use crate::engine::error::{OrchestratorError, OrchestratorResult};
use crate::engine::fry_entries::{box_entry_id, combined_entry_id, fry_relevant_boxes};
use crate::engine::fry_scheduler::FryRecommendation;
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

impl KitchenOrchestrator {
    fn require_fry_station(&self, station_id: &str) -> OrchestratorResult<()> {
        if self.fry_stations.contains_key(station_id) {
            Ok(())
        } else {
            Err(OrchestratorError::StationNotFound(station_id.to_string()))
        }
    }

    /// 锁定当前推荐批次
    #[instrument(skip(self), fields(station_id = %station_id))]
    pub fn lock_batch(&mut self, station_id: &str, now: DateTime<Utc>) -> OrchestratorResult<LockedBatch> {
        self.require_fry_station(station_id)?;
        let recommendation = self
            .derive(now)
            .fry_plan
            .recommendation(station_id)
            .cloned()
            .unwrap_or_else(|| FryRecommendation {
                station_id: station_id.to_string(),
                ..Default::default()
            });

        let machine = self.fry_machine;
        let state = self
            .fry_stations
            .get_mut(station_id)
            .ok_or_else(|| OrchestratorError::StationNotFound(station_id.to_string()))?;
        machine.lock(state, &recommendation, now)?;

        info!(
            entries = recommendation.entry_ids.len(),
            pieces = recommendation.total_pieces,
            "煎台批次已锁定"
        );
        state
            .locked_batch
            .clone()
            .ok_or_else(|| OrchestratorError::StationNotFound(station_id.to_string()))
    }

    /// 开煎
    pub fn start_batch(&mut self, station_id: &str, now: DateTime<Utc>) -> OrchestratorResult<bool> {
        let machine = self.fry_machine;
        let state = self
            .fry_stations
            .get_mut(station_id)
            .ok_or_else(|| OrchestratorError::StationNotFound(station_id.to_string()))?;
        let started = machine.start(state, now)?;
        if started {
            info!(station_id = %station_id, "煎台开煎");
        }
        Ok(started)
    }

    /// 出锅（到时才允许）
    pub fn complete_batch(&mut self, station_id: &str, now: DateTime<Utc>) -> OrchestratorResult<LockedBatch> {
        let machine = self.fry_machine;
        let state = self
            .fry_stations
            .get_mut(station_id)
            .ok_or_else(|| OrchestratorError::StationNotFound(station_id.to_string()))?;
        let batch = machine.complete(state, &mut self.fry_ledger, now)?;
        info!(
            station_id = %station_id,
            entries = batch.entry_ids.len(),
            pieces = batch.total_pieces,
            fried_total = self.fry_ledger.fried_pieces_total,
            "煎台出锅"
        );
        Ok(batch)
    }

    /// 撤销锁定（条目回到共享队列）
    pub fn release_batch(&mut self, station_id: &str) -> OrchestratorResult<LockedBatch> {
        let machine = self.fry_machine;
        let state = self
            .fry_stations
            .get_mut(station_id)
            .ok_or_else(|| OrchestratorError::StationNotFound(station_id.to_string()))?;
        let batch = machine.release(state)?;
        info!(station_id = %station_id, entries = batch.entry_ids.len(), "煎台锁定已撤销");
        Ok(batch)
    }

    /// 修改煎台容量/默认时长（同步写回布局）
    pub fn update_fry_settings(
        &mut self,
        station_id: &str,
        settings: FryStationSettings,
    ) -> OrchestratorResult<()> {
        let machine = self.fry_machine;
        let state = self
            .fry_stations
            .get_mut(station_id)
            .ok_or_else(|| OrchestratorError::StationNotFound(station_id.to_string()))?;
        machine.update_settings(state, settings)?;

        match self
            .layout
            .fry_stations
            .iter_mut()
            .find(|c| c.station_id == station_id)
        {
            Some(config) => config.settings = settings,
            None => self.layout.fry_stations.push(FryStationConfig {
                station_id: station_id.to_string(),
                settings,
            }),
        }
        info!(
            station_id = %station_id,
            capacity = settings.capacity_pieces,
            cook_secs = settings.default_cook_secs,
            "煎台参数已更新"
        );
        Ok(())
    }

    /// 拆盒: 合并条目改为按盒拆分（不可撤销）
    ///
    /// # 返回
    /// 拆分后的盒条目ID
    pub fn split_fry_order(&mut self, order_id: &str) -> OrchestratorResult<Vec<String>> {
        let order = self.require_order(order_id)?;
        let refuse = |reason: &str| OrchestratorError::SplitNotAllowed {
            order_id: order_id.to_string(),
            reason: reason.to_string(),
        };

        if self.split_orders.contains(order_id) {
            return Err(refuse("已拆分"));
        }
        let boxes = fry_relevant_boxes(order, &self.catalog);
        if boxes.len() < 2 {
            return Err(refuse("含煎制品的盒少于2个"));
        }

        let entry_id = combined_entry_id(order_id);
        if self.fry_ledger.is_fried(&entry_id) {
            return Err(refuse("合并条目已出锅"));
        }
        let locked = self
            .fry_stations
            .values()
            .any(|s| s.locked_batch.as_ref().map_or(false, |b| b.contains(&entry_id)));
        if locked {
            return Err(refuse("合并条目已被锁定"));
        }

        self.split_orders.insert(order_id.to_string());
        let ids: Vec<String> = boxes.iter().map(|b| box_entry_id(order_id, *b)).collect();
        info!(order_id = %order_id, boxes = ids.len(), "订单已拆盒");
        Ok(ids)
    }
}
