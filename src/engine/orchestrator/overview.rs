use super::{Derivation, KitchenOrchestrator};
use crate::domain::order::sorted_by_fifo;
use crate::domain::types::{ModuleKind, WaterTaskStatus};
use crate::domain::water::WaterTask;
use crate::engine::views::{
    GriddleStationView, GriddleView, KitchenOverview, PackagingLaneView, SlotView, WaterStationView,
    WaterTaskView,
};
use crate::engine::water_scheduler::WaterScheduler;
use chrono::{DateTime, Utc};

impl KitchenOrchestrator {
    // ==========================================
    // 煎台视图
    // ==========================================

    fn griddle_view_from(&self, derivation: &Derivation) -> GriddleView {
        let now = derivation.now;
        let route = derivation.route(ModuleKind::Griddle);
        let mut stations = Vec::new();

        for station_id in self.griddle_station_ids() {
            let Some(state) = self.fry_stations.get(&station_id) else {
                continue;
            };
            let name = route
                .and_then(|r| r.stations.iter().find(|s| s.station_id == station_id))
                .map(|s| s.name.clone())
                .unwrap_or_else(|| station_id.clone());
            let timer = state.locked_batch.as_ref().and_then(|b| b.timer());
            let plan = derivation.fry_plan.recommendation(&station_id);
            let recommendation = match state.locked_batch {
                None => plan.cloned(),
                Some(_) => None,
            };

            // 路由到本工位、仍有待煎条目的订单（FIFO）
            let backlog_preview = route
                .map(|r| {
                    let mut orders: Vec<_> = derivation
                        .fry_entries
                        .iter()
                        .filter(|e| !self.fry_ledger.is_fried(&e.entry_id))
                        .filter(|e| r.assignment.station_of(&e.order_id) == Some(station_id.as_str()))
                        .map(|e| (e.order_created_at, e.order_id.clone()))
                        .collect();
                    orders.sort();
                    orders.dedup();
                    orders.into_iter().map(|(_, id)| id).collect()
                })
                .unwrap_or_default();

            stations.push(GriddleStationView {
                station_id: station_id.clone(),
                name,
                phase: state.phase(),
                settings: state.settings,
                recommendation,
                locked_batch: state.locked_batch.clone(),
                remaining_secs: timer.map(|t| t.remaining_secs(now)),
                progress: timer.map(|t| t.progress(now)),
                blocked_entry_id: plan.and_then(|p| p.blocked_entry_id.clone()),
                backlog_preview,
            });
        }

        GriddleView {
            stations,
            queue_depth: derivation.fry_plan.queue.len(),
            blocked_entry_ids: derivation.fry_plan.blocked_entry_ids.clone(),
            fried_pieces_total: self.fry_ledger.fried_pieces_total,
        }
    }

    pub fn griddle_view(&self, now: DateTime<Utc>) -> GriddleView {
        self.griddle_view_from(&self.derive(now))
    }

    // ==========================================
    // 水煮视图
    // ==========================================

    fn water_views_from(&self, derivation: &Derivation) -> Vec<WaterStationView> {
        let now = derivation.now;
        let mut views = Vec::new();

        for module in [ModuleKind::Dumpling, ModuleKind::Noodle] {
            let Some(route) = derivation.route(module) else {
                continue;
            };
            for station in &route.stations {
                let mut tasks: Vec<&WaterTask> = derivation
                    .water_tasks
                    .iter()
                    .filter(|t| t.kind.module() == module && t.station_id == station.station_id)
                    .collect();
                tasks.sort_by(|a, b| a.fifo_key().cmp(&b.fifo_key()));

                let by_status = |status: WaterTaskStatus| -> Vec<WaterTaskView> {
                    tasks
                        .iter()
                        .filter(|t| t.runtime.status == status)
                        .map(|t| WaterTaskView::from_task(t, now))
                        .collect()
                };

                let ladle_slots = self.ladle_slots_for(&station.station_id);
                let occupied = WaterScheduler::occupied_slots(&derivation.water_tasks, &station.station_id);
                let slots = if module == ModuleKind::Noodle {
                    (1..=ladle_slots)
                        .map(|slot| SlotView {
                            slot,
                            task_id: occupied.get(&slot).cloned(),
                        })
                        .collect()
                } else {
                    Vec::new()
                };

                views.push(WaterStationView {
                    station_id: station.station_id.clone(),
                    module,
                    ladle_slots,
                    queued: by_status(WaterTaskStatus::Queued),
                    cooking: by_status(WaterTaskStatus::Cooking),
                    slots,
                });
            }
        }
        views
    }

    pub fn water_station_views(&self, now: DateTime<Utc>) -> Vec<WaterStationView> {
        self.water_views_from(&self.derive(now))
    }

    // ==========================================
    // 打包线视图
    // ==========================================

    fn lane_views_from(&self, derivation: &Derivation) -> Vec<PackagingLaneView> {
        let Some(route) = derivation.route(ModuleKind::Packaging) else {
            return Vec::new();
        };

        route
            .stations
            .iter()
            .map(|lane| {
                let waiting = sorted_by_fifo(self.lane_waiting_orders(&lane.station_id, derivation));
                let pins = self.pinned_orders(&lane.station_id);
                let top = self
                    .checklist
                    .select_top_queue(&waiting, pins, self.settings.top_queue_limit);
                let top_queue = top
                    .iter()
                    .filter_map(|id| self.orders.get(id))
                    .map(|order| self.checklist_from(order, derivation))
                    .collect();
                PackagingLaneView {
                    lane_id: lane.station_id.clone(),
                    waiting_orders: waiting.len(),
                    pinned: pins.to_vec(),
                    top_queue,
                }
            })
            .collect()
    }

    pub fn packaging_lane_views(&self, now: DateTime<Utc>) -> Vec<PackagingLaneView> {
        self.lane_views_from(&self.derive(now))
    }

    // ==========================================
    // 全厨房概览（单轮推导）
    // ==========================================

    pub fn overview(&self, now: DateTime<Utc>) -> KitchenOverview {
        let derivation = self.derive(now);
        KitchenOverview {
            generated_at: now,
            active_orders: self.orders.len(),
            pending_archives: self.pending_archives.len(),
            reset_version: self.reset_version,
            griddle: self.griddle_view_from(&derivation),
            water_stations: self.water_views_from(&derivation),
            lanes: self.lane_views_from(&derivation),
        }
    }
}
