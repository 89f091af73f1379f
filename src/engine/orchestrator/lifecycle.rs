use super::KitchenOrchestrator;
use crate::domain::catalog::CatalogItem;
use crate::domain::order::{Order, OrderSubmission};
use crate::domain::station::KitchenLayout;
use crate::domain::types::{ModuleKind, ServiceStatus};
use crate::engine::availability::AvailabilityResolver;
use crate::engine::error::{OrchestratorError, OrchestratorResult};
use crate::engine::fry_entries::derive_fry_entries;
use crate::engine::events::{OrchestratorEvent, OrchestratorEventType};
use crate::engine::station_router::StationRouter;
use crate::engine::water_scheduler::WaterScheduler;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

fn invalid(order_id: &str, reason: impl Into<String>) -> OrchestratorError {
    OrchestratorError::InvalidOrder {
        order_id: order_id.to_string(),
        reason: reason.into(),
    }
}

impl KitchenOrchestrator {
    // ==========================================
    // 订单提交
    // ==========================================

    /// 提交校验（不修改状态）
    fn validate_submission(
        &self,
        submission: &OrderSubmission,
        resolver: &mut AvailabilityResolver<'_>,
    ) -> OrchestratorResult<()> {
        let order_id = submission.order_id.as_str();
        if order_id.trim().is_empty() {
            return Err(invalid(order_id, "订单号为空"));
        }
        if order_id.contains('#') {
            return Err(invalid(order_id, "订单号不能包含 '#'"));
        }
        if self.orders.contains_key(order_id) {
            return Err(OrchestratorError::DuplicateOrder(order_id.to_string()));
        }

        let box_rows = submission.boxes.iter().flat_map(|b| b.rows.iter());
        if submission.lines.is_empty() && submission.boxes.iter().all(|b| b.rows.is_empty()) {
            return Err(invalid(order_id, "订单无任何品项"));
        }

        let requested = submission
            .lines
            .iter()
            .map(|l| (l.item_id.as_str(), l.quantity))
            .chain(box_rows.map(|r| (r.item_id.as_str(), r.quantity)));
        for (item_id, quantity) in requested {
            if quantity == 0 {
                return Err(invalid(order_id, format!("品项数量为0: {}", item_id)));
            }
            if !self.catalog.contains(item_id) {
                return Err(OrchestratorError::UnknownItem {
                    order_id: order_id.to_string(),
                    item_id: item_id.to_string(),
                });
            }
            if !resolver.is_available(item_id) {
                return Err(OrchestratorError::ItemUnavailable {
                    order_id: order_id.to_string(),
                    item_id: item_id.to_string(),
                });
            }
        }
        Ok(())
    }

    fn commit_order(&mut self, submission: OrderSubmission, now: DateTime<Utc>) {
        let order = Order::from_submission(submission);
        let order_id = order.order_id.clone();
        let payload = json!({
            "service_mode": order.service_mode,
            "lines": order.lines.len(),
            "boxes": order.boxes.len(),
        });
        self.orders.insert(order_id.clone(), order);
        info!(order_id = %order_id, "订单进入编排");
        self.emit(OrchestratorEvent::for_order(
            OrchestratorEventType::OrderSubmitted,
            &order_id,
            payload,
            now,
        ));
    }

    /// 提交单个订单
    pub fn submit_order(&mut self, submission: OrderSubmission, now: DateTime<Utc>) -> OrchestratorResult<()> {
        let mut resolver = AvailabilityResolver::new(&self.catalog);
        if let Err(e) = self.validate_submission(&submission, &mut resolver) {
            warn!(order_id = %submission.order_id, error = %e, "订单被拒绝");
            return Err(e);
        }
        self.commit_order(submission, now);
        Ok(())
    }

    /// 批量提交（全部校验通过才提交）
    #[instrument(skip(self, submissions), fields(count = submissions.len()))]
    pub fn submit_orders(
        &mut self,
        submissions: Vec<OrderSubmission>,
        now: DateTime<Utc>,
    ) -> OrchestratorResult<Vec<String>> {
        {
            let mut resolver = AvailabilityResolver::new(&self.catalog);
            let mut seen = HashSet::new();
            for submission in &submissions {
                if !seen.insert(submission.order_id.as_str()) {
                    return Err(OrchestratorError::DuplicateOrder(submission.order_id.clone()));
                }
                self.validate_submission(submission, &mut resolver)?;
            }
        }

        let ids: Vec<String> = submissions.iter().map(|s| s.order_id.clone()).collect();
        for submission in submissions {
            self.commit_order(submission, now);
        }
        Ok(ids)
    }

    // ==========================================
    // 备注 / 服务状态
    // ==========================================

    pub fn append_workflow_note(&mut self, order_id: &str, note: &str) -> OrchestratorResult<()> {
        if note.trim().is_empty() {
            return Err(invalid(order_id, "备注为空"));
        }
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| OrchestratorError::OrderNotFound(order_id.to_string()))?;
        order.append_workflow_note(note);
        Ok(())
    }

    /// 待取餐 → 已出餐
    pub fn mark_served(&mut self, order_id: &str, now: DateTime<Utc>) -> OrchestratorResult<()> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| OrchestratorError::OrderNotFound(order_id.to_string()))?;
        if order.service_status != ServiceStatus::WaitingPickup {
            return Err(OrchestratorError::InvalidStateTransition {
                entity: format!("order:{}", order_id),
                from: order.service_status.to_string(),
                to: ServiceStatus::Served.to_string(),
            });
        }
        order.service_status = ServiceStatus::Served;
        info!(order_id = %order_id, "订单已出餐");
        self.emit(OrchestratorEvent::for_order(
            OrchestratorEventType::ServiceStatusChanged,
            order_id,
            json!({"from": ServiceStatus::WaitingPickup, "to": ServiceStatus::Served}),
            now,
        ));
        Ok(())
    }

    // ==========================================
    // 配置热替换
    // ==========================================

    /// 替换工位布局
    ///
    /// 拒绝: 移除/改参数正在锁定的煎台；勺位数低于正在占用的勺位
    pub fn apply_layout(&mut self, layout: KitchenLayout, now: DateTime<Utc>) -> OrchestratorResult<()> {
        layout.validate().map_err(OrchestratorError::InvalidConfig)?;

        let new_griddles: HashSet<String> = StationRouter::effective_stations(&layout, ModuleKind::Griddle)
            .stations
            .into_iter()
            .map(|s| s.station_id)
            .collect();
        for state in self.fry_stations.values() {
            if state.locked_batch.is_none() {
                continue;
            }
            let unchanged = new_griddles.contains(&state.station_id)
                && layout
                    .fry_settings(&state.station_id)
                    .map_or(true, |s| s == state.settings);
            if !unchanged {
                return Err(OrchestratorError::StationLocked {
                    station_id: state.station_id.clone(),
                });
            }
        }

        let derivation = self.derive(now);
        for module in [ModuleKind::Dumpling, ModuleKind::Noodle] {
            if let Some(route) = derivation.route(module) {
                for station in &route.stations {
                    let occupied = WaterScheduler::occupied_slots(&derivation.water_tasks, &station.station_id);
                    let new_slots = layout
                        .ladle_slots(&station.station_id)
                        .unwrap_or(self.settings.default_ladle_slots);
                    if let Some((&max_slot, task_id)) = occupied.iter().next_back() {
                        if max_slot > new_slots {
                            return Err(OrchestratorError::InvalidConfig(format!(
                                "勺位{}正被任务{}占用，不能缩减到{}: station={}",
                                max_slot, task_id, new_slots, station.station_id
                            )));
                        }
                    }
                }
            }
        }

        self.layout = layout;
        self.sync_fry_stations();
        info!(stations = self.layout.stations.len(), "工位布局已更新");
        self.emit(OrchestratorEvent::global(
            OrchestratorEventType::LayoutChanged,
            json!({"stations": self.layout.stations.len()}),
            now,
        ));
        Ok(())
    }

    /// 更新目录品项（估清/恢复/新增）
    pub fn update_catalog(&mut self, items: Vec<CatalogItem>) {
        let count = items.len();
        for item in items {
            self.catalog.upsert(item);
        }
        debug!(count = count, "目录已更新");
    }

    // ==========================================
    // 归档（防抖）
    // ==========================================

    /// 发起归档，宽限期后生效
    ///
    /// # 返回
    /// 归档到期时间（重复发起保留原到期时间）
    pub fn request_archive(&mut self, order_id: &str, now: DateTime<Utc>) -> OrchestratorResult<DateTime<Utc>> {
        self.require_order(order_id)?;
        let grace = Duration::milliseconds(self.settings.archive_grace_ms as i64);
        let due = *self
            .pending_archives
            .entry(order_id.to_string())
            .or_insert(now + grace);
        debug!(order_id = %order_id, due = %due, "归档等待中");
        Ok(due)
    }

    /// 撤销归档
    pub fn undo_archive(&mut self, order_id: &str) -> OrchestratorResult<()> {
        match self.pending_archives.remove(order_id) {
            Some(_) => Ok(()),
            None => Err(OrchestratorError::ArchiveNotPending(order_id.to_string())),
        }
    }

    /// 执行到期归档
    ///
    /// # 返回
    /// 本次归档的订单ID
    pub fn flush_due_archives(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let due: Vec<String> = self
            .pending_archives
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(id, _)| id.clone())
            .collect();

        for order_id in &due {
            self.pending_archives.remove(order_id);
            let Some(order) = self.orders.remove(order_id) else {
                continue;
            };

            let split = self.split_orders.remove(order_id);
            self.release_fry_entries(&order, split);

            let prefix = format!("{}#", order_id);
            self.water_runtime.retain(|task_id, _| !task_id.starts_with(&prefix));
            self.overrides.remove(order_id);
            for pins in self.pins.values_mut() {
                pins.retain(|id| id != order_id);
            }

            info!(order_id = %order_id, "订单已归档");
            let snapshot = serde_json::to_value(&order).unwrap_or_else(|e| json!({"error": e.to_string()}));
            self.emit(OrchestratorEvent::for_order(
                OrchestratorEventType::OrderArchived,
                order_id,
                snapshot,
                now,
            ));
        }
        due
    }

    /// 归档订单退出煎台: 摘出锁定批次，清理已煎台账
    fn release_fry_entries(&mut self, order: &Order, split: bool) {
        let entries = derive_fry_entries(order, &self.catalog, split);
        for state in self.fry_stations.values_mut() {
            let Some(batch) = state.locked_batch.as_mut() else {
                continue;
            };
            if !batch.drop_entries(&entries) {
                continue;
            }
            if batch.entry_ids.is_empty() && batch.started_at.is_none() {
                state.locked_batch = None;
                info!(station_id = %state.station_id, order_id = %order.order_id, "锁定批次随订单归档撤销");
            } else {
                debug!(
                    station_id = %state.station_id,
                    order_id = %order.order_id,
                    remaining = batch.entry_ids.len(),
                    "归档订单已摘出锁定批次"
                );
            }
        }
        self.fry_ledger.forget_order(&order.order_id);
    }

    // ==========================================
    // 外部重置
    // ==========================================

    /// 应用外部重置版本号（大于已知版本才生效）
    ///
    /// # 返回
    /// 是否执行了重置
    pub fn apply_reset_version(&mut self, version: u64, now: DateTime<Utc>) -> bool {
        if version <= self.reset_version {
            return false;
        }

        let discarded = self.orders.len();
        self.orders.clear();
        self.split_orders.clear();
        self.water_runtime.clear();
        self.overrides.clear();
        self.pins.clear();
        self.pending_archives.clear();
        self.fry_ledger = Default::default();
        for state in self.fry_stations.values_mut() {
            state.locked_batch = None;
        }
        let previous = self.reset_version;
        self.reset_version = version;

        warn!(previous, version, discarded, "工作流重置，已丢弃全部在途状态");
        self.emit(OrchestratorEvent::global(
            OrchestratorEventType::WorkflowReset,
            json!({"previous": previous, "version": version, "discarded_orders": discarded}),
            now,
        ));
        true
    }
}
