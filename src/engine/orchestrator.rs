// ==========================================
// 餐饮出品编排系统 - 引擎编排器
// ==========================================
// 用途: 持有在途状态，协调路由/煎台/水煮/清单引擎
// 流程: 订单 → 路由 → 各模块队列 → 煎台推荐 & 水煮派生 → 状态索引 → 打包清单
// 红线: 推导每轮从当前状态重算；变更先校验后提交，拒绝即空操作
// ==========================================

mod griddle;
mod lifecycle;
mod overview;
mod packaging;
mod water;

use crate::config::settings::OrchestratorSettings;
use crate::domain::fry::{FryEntry, FryLedger, FryStationState};
use crate::domain::order::Order;
use crate::domain::station::{FryStationSettings, KitchenLayout, StationRule};
use crate::domain::types::{ChecklistStatus, ModuleKind, WaterTaskStatus};
use crate::domain::water::{WaterTask, WaterTaskRuntime};
use crate::engine::catalog::Catalog;
use crate::engine::checklist::{ChecklistAggregator, ChecklistContext, StatusIndex};
use crate::engine::error::{OrchestratorError, OrchestratorResult};
use crate::engine::events::{OptionalEventPublisher, OrchestratorEvent};
use crate::engine::fry_entries::derive_fry_entries;
use crate::engine::fry_scheduler::{FryBatchScheduler, FryPlan};
use crate::engine::fry_station::FryStationMachine;
use crate::engine::routing_policy::OrderProfile;
use crate::engine::station_router::{RoutableOrder, RouteAssignment, StationRouter};
use crate::engine::water_deriver::WaterTaskDeriver;
use crate::engine::water_scheduler::WaterScheduler;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{info, warn};

// ==========================================
// 单模块路由快照
// ==========================================
#[derive(Debug, Clone)]
pub struct ModuleRoute {
    pub stations: Vec<StationRule>,
    pub assignment: RouteAssignment,
}

impl ModuleRoute {
    /// 订单所在工位（未分配时取第一个有效工位）
    pub fn station_for(&self, order_id: &str) -> String {
        self.assignment
            .station_of(order_id)
            .map(|s| s.to_string())
            .or_else(|| self.stations.first().map(|s| s.station_id.clone()))
            .unwrap_or_default()
    }
}

// ==========================================
// 一轮推导结果（纯函数输出，不存储）
// ==========================================
#[derive(Debug, Clone)]
pub struct Derivation {
    pub now: DateTime<Utc>,
    pub routes: BTreeMap<ModuleKind, ModuleRoute>,
    pub fry_entries: Vec<FryEntry>,
    pub fry_plan: FryPlan,
    pub water_tasks: Vec<WaterTask>,
    pub index: StatusIndex,
}

impl Derivation {
    pub fn route(&self, module: ModuleKind) -> Option<&ModuleRoute> {
        self.routes.get(&module)
    }

    pub fn water_task(&self, task_id: &str) -> Option<&WaterTask> {
        self.water_tasks.iter().find(|t| t.task_id == task_id)
    }
}

// ==========================================
// KitchenOrchestrator - 引擎编排器
// ==========================================
pub struct KitchenOrchestrator {
    settings: OrchestratorSettings,
    catalog: Catalog,
    layout: KitchenLayout,

    // ===== 在途状态 =====
    orders: BTreeMap<String, Order>,
    split_orders: HashSet<String>,
    fry_stations: BTreeMap<String, FryStationState>,
    fry_ledger: FryLedger,
    water_runtime: HashMap<String, WaterTaskRuntime>,
    /// 订单ID → 清单项键 → 人工覆写
    overrides: HashMap<String, HashMap<String, ChecklistStatus>>,
    /// 打包线ID → 置顶订单（先置顶在前）
    pins: HashMap<String, Vec<String>>,
    /// 订单ID → 归档到期时间
    pending_archives: BTreeMap<String, DateTime<Utc>>,
    reset_version: u64,

    events: OptionalEventPublisher,

    // ===== 引擎 =====
    router: StationRouter,
    fry_scheduler: FryBatchScheduler,
    fry_machine: FryStationMachine,
    water_scheduler: WaterScheduler,
    checklist: ChecklistAggregator,
}

impl KitchenOrchestrator {
    /// 创建编排器
    ///
    /// # 参数
    /// - settings: 编排参数
    /// - catalog: 目录快照
    /// - layout: 工位布局
    pub fn new(
        settings: OrchestratorSettings,
        catalog: Catalog,
        layout: KitchenLayout,
    ) -> OrchestratorResult<Self> {
        settings.validate().map_err(OrchestratorError::InvalidConfig)?;
        layout.validate().map_err(OrchestratorError::InvalidConfig)?;

        let mut orchestrator = Self {
            settings,
            catalog,
            layout,
            orders: BTreeMap::new(),
            split_orders: HashSet::new(),
            fry_stations: BTreeMap::new(),
            fry_ledger: FryLedger::default(),
            water_runtime: HashMap::new(),
            overrides: HashMap::new(),
            pins: HashMap::new(),
            pending_archives: BTreeMap::new(),
            reset_version: 0,
            events: OptionalEventPublisher::none(),
            router: StationRouter::new(),
            fry_scheduler: FryBatchScheduler::new(),
            fry_machine: FryStationMachine::new(),
            water_scheduler: WaterScheduler::new(),
            checklist: ChecklistAggregator::new(),
        };
        orchestrator.sync_fry_stations();

        info!(
            stations = orchestrator.layout.stations.len(),
            catalog_items = orchestrator.catalog.len(),
            "编排器初始化完成"
        );
        Ok(orchestrator)
    }

    /// 挂接出站事件发布者
    pub fn with_event_publisher(mut self, events: OptionalEventPublisher) -> Self {
        self.events = events;
        self
    }

    // ==========================================
    // 只读访问
    // ==========================================

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn layout(&self) -> &KitchenLayout {
        &self.layout
    }

    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.orders.get(order_id)
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn fry_station(&self, station_id: &str) -> Option<&FryStationState> {
        self.fry_stations.get(station_id)
    }

    pub fn fry_ledger(&self) -> &FryLedger {
        &self.fry_ledger
    }

    pub fn reset_version(&self) -> u64 {
        self.reset_version
    }

    pub fn is_split(&self, order_id: &str) -> bool {
        self.split_orders.contains(order_id)
    }

    pub fn archive_due_at(&self, order_id: &str) -> Option<DateTime<Utc>> {
        self.pending_archives.get(order_id).copied()
    }

    // ==========================================
    // 内部工具
    // ==========================================

    fn require_order(&self, order_id: &str) -> OrchestratorResult<&Order> {
        self.orders
            .get(order_id)
            .ok_or_else(|| OrchestratorError::OrderNotFound(order_id.to_string()))
    }

    /// 煎台（声明顺序，含兜底工位）
    fn griddle_station_ids(&self) -> Vec<String> {
        StationRouter::effective_stations(&self.layout, ModuleKind::Griddle)
            .stations
            .into_iter()
            .map(|s| s.station_id)
            .collect()
    }

    fn fry_settings_for(&self, station_id: &str) -> FryStationSettings {
        self.layout
            .fry_settings(station_id)
            .unwrap_or(FryStationSettings {
                capacity_pieces: self.settings.fry_default_capacity,
                default_cook_secs: self.settings.fry_default_cook_secs,
            })
    }

    fn ladle_slots_for(&self, station_id: &str) -> u8 {
        self.layout
            .ladle_slots(station_id)
            .unwrap_or(self.settings.default_ladle_slots)
    }

    /// 煎台状态与布局对齐（新增工位按配置建状态，移除的工位丢弃）
    fn sync_fry_stations(&mut self) {
        let ids = self.griddle_station_ids();
        let keep: HashSet<&str> = ids.iter().map(|s| s.as_str()).collect();
        self.fry_stations.retain(|id, _| keep.contains(id.as_str()));
        for id in &ids {
            let settings = self.fry_settings_for(id);
            self.fry_stations
                .entry(id.clone())
                .and_modify(|state| {
                    if state.locked_batch.is_none() {
                        state.settings = settings;
                    }
                })
                .or_insert_with(|| FryStationState::new(id, settings));
        }
    }

    /// 发布出站事件（失败只告警）
    fn emit(&self, event: OrchestratorEvent) {
        let event_type = event.event_type;
        if let Err(e) = self.events.publish(event) {
            warn!(event_type = event_type.as_str(), error = %e, "事件发布失败");
        }
    }

    /// 订单是否已全部打包（已打包只能来自覆写，与推导状态无关）
    fn is_fully_packed(&self, order: &Order) -> bool {
        let index = StatusIndex::new();
        let ctx = ChecklistContext {
            catalog: &self.catalog,
            index: &index,
            split: self.split_orders.contains(&order.order_id),
            overrides: self.overrides.get(&order.order_id),
        };
        self.checklist.build(order, &ctx).is_fully_packed()
    }

    /// 订单是否仍计入负载
    fn is_active(&self, order: &Order) -> bool {
        !order.is_served() && !self.is_fully_packed(order)
    }

    // ==========================================
    // 推导
    // ==========================================

    /// 各模块工作量（按订单）
    fn workloads(&self, fry_entries: &[FryEntry]) -> HashMap<(ModuleKind, String), u32> {
        let mut loads: HashMap<(ModuleKind, String), u32> = HashMap::new();

        for entry in fry_entries {
            if !self.fry_ledger.is_fried(&entry.entry_id) {
                *loads
                    .entry((ModuleKind::Griddle, entry.order_id.clone()))
                    .or_insert(0) += entry.pieces;
            }
        }

        // 工位尚未确定，仅统计数量
        let deriver = WaterTaskDeriver::new(&self.catalog, &self.settings);
        for order in self.orders.values() {
            for task in deriver.derive(order, |_| String::new(), &self.water_runtime) {
                if task.runtime.status == WaterTaskStatus::Done {
                    continue;
                }
                let module = task.kind.module();
                let amount = match module {
                    ModuleKind::Dumpling => task.quantity,
                    _ => 1,
                };
                *loads.entry((module, order.order_id.clone())).or_insert(0) += amount;
            }
            loads.insert((ModuleKind::Packaging, order.order_id.clone()), 1);
        }
        loads
    }

    /// 全量推导（路由 → 煎台推荐 → 水煮任务 → 状态索引）
    pub fn derive(&self, now: DateTime<Utc>) -> Derivation {
        let fry_entries: Vec<FryEntry> = self
            .orders
            .values()
            .flat_map(|o| derive_fry_entries(o, &self.catalog, self.split_orders.contains(&o.order_id)))
            .collect();

        let profiles: HashMap<&str, OrderProfile> = self
            .orders
            .values()
            .map(|o| (o.order_id.as_str(), OrderProfile::from_order(o, &self.catalog)))
            .collect();
        let active: HashMap<&str, bool> = self
            .orders
            .values()
            .map(|o| (o.order_id.as_str(), self.is_active(o)))
            .collect();
        let loads = self.workloads(&fry_entries);

        let mut routes = BTreeMap::new();
        for module in ModuleKind::ALL {
            let effective = StationRouter::effective_stations(&self.layout, module);
            let routable: Vec<RoutableOrder> = self
                .orders
                .values()
                .filter_map(|o| {
                    let workload = loads.get(&(module, o.order_id.clone())).copied()?;
                    let profile = profiles.get(o.order_id.as_str())?.clone();
                    Some(RoutableOrder {
                        order_id: o.order_id.clone(),
                        created_at: o.created_at,
                        profile,
                        workload,
                        active: active.get(o.order_id.as_str()).copied().unwrap_or(false),
                    })
                })
                .collect();
            let mut assignment = self.router.route(module, &routable, &effective.stations);
            assignment.fallback_used = effective.fallback_used;
            routes.insert(
                module,
                ModuleRoute {
                    stations: effective.stations,
                    assignment,
                },
            );
        }

        // 煎台资格: 规则匹配的煎台（无匹配则全部）
        let mut eligibility: HashMap<String, BTreeSet<String>> = HashMap::new();
        if let Some(griddle) = routes.get(&ModuleKind::Griddle) {
            for (order_id, profile) in &profiles {
                let ids = self
                    .router
                    .candidate_stations(&griddle.stations, profile)
                    .into_iter()
                    .map(|s| s.station_id.clone())
                    .collect();
                eligibility.insert(order_id.to_string(), ids);
            }
        }

        let station_ids = self.griddle_station_ids();
        let stations: Vec<&FryStationState> = station_ids
            .iter()
            .filter_map(|id| self.fry_stations.get(id))
            .collect();
        let fry_plan = self
            .fry_scheduler
            .recommend(&fry_entries, &stations, &eligibility, &self.fry_ledger);

        let deriver = WaterTaskDeriver::new(&self.catalog, &self.settings);
        let mut water_tasks = Vec::new();
        for order in self.orders.values() {
            let station_for = |module: ModuleKind| {
                routes
                    .get(&module)
                    .map(|r| r.station_for(&order.order_id))
                    .unwrap_or_default()
            };
            water_tasks.extend(deriver.derive(order, station_for, &self.water_runtime));
        }

        let mut index = StatusIndex::new();
        index.add_fry(&fry_entries, &stations, &self.fry_ledger, now);
        index.add_water(&water_tasks, now);

        Derivation {
            now,
            routes,
            fry_entries,
            fry_plan,
            water_tasks,
            index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::CatalogItem;
    use crate::domain::order::{OrderLine, OrderSubmission};
    use crate::domain::types::{PrepKind, ServiceMode};
    use chrono::TimeZone;

    #[test]
    fn test_griddle_fallback_station_created() {
        let orchestrator = KitchenOrchestrator::new(
            OrchestratorSettings::default(),
            Catalog::default(),
            KitchenLayout::default(),
        )
        .unwrap();
        let station = orchestrator.fry_station("GRIDDLE-FALLBACK").unwrap();
        assert_eq!(station.settings.capacity_pieces, 40);
    }

    #[test]
    fn test_derive_routes_every_module() {
        let catalog = Catalog::new(vec![CatalogItem::new("noodle-beef", "noodle", PrepKind::Noodle, 240)]);
        let mut orchestrator =
            KitchenOrchestrator::new(OrchestratorSettings::default(), catalog, KitchenLayout::default()).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        orchestrator
            .submit_order(
                OrderSubmission {
                    order_id: "A".to_string(),
                    created_at: now,
                    service_mode: ServiceMode::DineIn,
                    lines: vec![OrderLine::new("noodle-beef", 1)],
                    boxes: vec![],
                    note: None,
                },
                now,
            )
            .unwrap();

        let derivation = orchestrator.derive(now);
        assert_eq!(derivation.routes.len(), 4);
        assert_eq!(derivation.water_tasks.len(), 1);
        assert_eq!(derivation.water_tasks[0].station_id, "NOODLE-FALLBACK");
        assert!(derivation.route(ModuleKind::Noodle).unwrap().assignment.fallback_used);
    }
}
