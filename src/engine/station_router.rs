// ==========================================
// 餐饮出品编排系统 - 工位路由器
// ==========================================
// 规则: 订单按 (创建时间, 订单号) 升序处理
// 规则: 候选 = 规则匹配的工位；无匹配时回落到全部有效工位（订单永不落空）
// 规则: 选当前累计负载最低者，平局按声明顺序
// 规则: 仅未完成订单计入负载（已出餐/已打包不影响后续分配）
// 红线: 每轮从零重算，不持久化分配结果
// ==========================================

use crate::domain::station::{KitchenLayout, StationRule};
use crate::domain::types::ModuleKind;
use crate::engine::routing_policy::{OrderProfile, RoutingPolicyEvaluator};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{instrument, warn};

/// 参与路由的订单
#[derive(Debug, Clone)]
pub struct RoutableOrder {
    pub order_id: String,
    pub created_at: DateTime<Utc>,
    pub profile: OrderProfile,
    /// 本模块工作量（生产模块按只/件计，打包线按单计）
    pub workload: u32,
    /// 是否仍计入负载
    pub active: bool,
}

/// 单模块路由结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteAssignment {
    pub module: Option<ModuleKind>,
    /// 订单ID → 工位ID
    pub assignments: BTreeMap<String, String>,
    /// 工位ID → 累计负载
    pub loads: BTreeMap<String, u32>,
    /// 是否使用了兜底工位（配置缺口）
    pub fallback_used: bool,
}

impl RouteAssignment {
    pub fn station_of(&self, order_id: &str) -> Option<&str> {
        self.assignments.get(order_id).map(|s| s.as_str())
    }
}

/// 有效工位集合
#[derive(Debug, Clone)]
pub struct EffectiveStations {
    pub stations: Vec<StationRule>,
    pub fallback_used: bool,
}

// ==========================================
// StationRouter - 工位路由器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct StationRouter {
    evaluator: RoutingPolicyEvaluator,
}

impl StationRouter {
    pub fn new() -> Self {
        Self {
            evaluator: RoutingPolicyEvaluator::new(),
        }
    }

    /// 某模块的有效工位
    ///
    /// 配置缺口（无启用工位）时回落到一个兜底工位:
    /// 优先取声明的第一个工位，否则合成 `{MODULE}-FALLBACK`
    pub fn effective_stations(layout: &KitchenLayout, module: ModuleKind) -> EffectiveStations {
        let declared = layout.stations_of(module);
        let enabled: Vec<StationRule> = declared
            .iter()
            .filter(|s| s.enabled)
            .map(|s| (*s).clone())
            .collect();

        if !enabled.is_empty() {
            return EffectiveStations {
                stations: enabled,
                fallback_used: false,
            };
        }

        let fallback = match declared.first() {
            Some(first) => {
                let mut station = (*first).clone();
                station.enabled = true;
                station
            }
            None => StationRule::open(&format!("{}-FALLBACK", module), module),
        };
        warn!(
            module = %module,
            station_id = %fallback.station_id,
            "模块无启用工位，全部路由到兜底工位"
        );
        EffectiveStations {
            stations: vec![fallback],
            fallback_used: true,
        }
    }

    /// 订单的候选工位（匹配者，或全部有效工位）
    pub fn candidate_stations<'a>(
        &self,
        stations: &'a [StationRule],
        profile: &OrderProfile,
    ) -> Vec<&'a StationRule> {
        let matched: Vec<&StationRule> = stations
            .iter()
            .filter(|s| self.evaluator.evaluate(s, profile).is_match())
            .collect();
        if matched.is_empty() {
            stations.iter().collect()
        } else {
            matched
        }
    }

    /// 负载均衡路由
    ///
    /// # 参数
    /// - `module`: 模块
    /// - `orders`: 参与路由的订单（顺序无关，内部按 FIFO 排序）
    /// - `stations`: 有效工位（声明顺序）
    #[instrument(skip(self, orders, stations), fields(module = %module, orders = orders.len(), stations = stations.len()))]
    pub fn route(
        &self,
        module: ModuleKind,
        orders: &[RoutableOrder],
        stations: &[StationRule],
    ) -> RouteAssignment {
        let mut result = RouteAssignment {
            module: Some(module),
            ..Default::default()
        };
        for station in stations {
            result.loads.insert(station.station_id.clone(), 0);
        }
        if stations.is_empty() {
            return result;
        }

        let mut sorted: Vec<&RoutableOrder> = orders.iter().collect();
        sorted.sort_by(|a, b| {
            (a.created_at, a.order_id.as_str()).cmp(&(b.created_at, b.order_id.as_str()))
        });

        for order in sorted {
            let candidates = self.candidate_stations(stations, &order.profile);

            // 严格小于: 平局保留声明顺序在前者
            let mut best: Option<(&str, u32)> = None;
            for station in candidates {
                let load = result.loads.get(&station.station_id).copied().unwrap_or(0);
                match best {
                    Some((_, best_load)) if load >= best_load => {}
                    _ => best = Some((station.station_id.as_str(), load)),
                }
            }

            if let Some((station_id, _)) = best {
                let station_id = station_id.to_string();
                if order.active {
                    if let Some(load) = result.loads.get_mut(&station_id) {
                        *load += order.workload;
                    }
                }
                result.assignments.insert(order.order_id.clone(), station_id);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::station::RulePredicate;
    use crate::domain::types::ServiceMode;
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn routable(id: &str, minute: u32, categories: &[&str], workload: u32, active: bool) -> RoutableOrder {
        RoutableOrder {
            order_id: id.to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap(),
            profile: OrderProfile {
                categories: categories.iter().map(|c| c.to_string()).collect(),
                tags: BTreeSet::new(),
                service_mode: ServiceMode::Takeout,
            },
            workload,
            active,
        }
    }

    #[test]
    fn test_least_loaded_with_declaration_tie_break() {
        let router = StationRouter::new();
        let stations = vec![
            StationRule::open("N1", ModuleKind::Noodle),
            StationRule::open("N2", ModuleKind::Noodle),
        ];
        let orders = vec![
            routable("A", 0, &["noodle"], 3, true),
            routable("B", 1, &["noodle"], 1, true),
            routable("C", 2, &["noodle"], 1, true),
        ];

        let result = router.route(ModuleKind::Noodle, &orders, &stations);
        assert_eq!(result.station_of("A"), Some("N1"));
        assert_eq!(result.station_of("B"), Some("N2"));
        assert_eq!(result.station_of("C"), Some("N2"));
        assert_eq!(result.loads.get("N1"), Some(&3));
        assert_eq!(result.loads.get("N2"), Some(&2));
    }

    #[test]
    fn test_inactive_orders_do_not_add_load() {
        let router = StationRouter::new();
        let stations = vec![
            StationRule::open("P1", ModuleKind::Packaging),
            StationRule::open("P2", ModuleKind::Packaging),
        ];
        let orders = vec![
            routable("A", 0, &[], 1, false),
            routable("B", 1, &[], 1, true),
        ];

        let result = router.route(ModuleKind::Packaging, &orders, &stations);
        assert_eq!(result.station_of("A"), Some("P1"));
        assert_eq!(result.station_of("B"), Some("P1"));
    }

    #[test]
    fn test_unmatched_order_falls_back_to_all_stations() {
        let router = StationRouter::new();
        let stations = vec![
            StationRule::open("D1", ModuleKind::Dumpling)
                .with_predicate(RulePredicate::require_category("pork")),
        ];
        let orders = vec![routable("A", 0, &["veggie"], 10, true)];

        let result = router.route(ModuleKind::Dumpling, &orders, &stations);
        assert_eq!(result.station_of("A"), Some("D1"));
    }

    #[test]
    fn test_effective_stations_fallback() {
        let layout = KitchenLayout {
            stations: vec![StationRule::open("G1", ModuleKind::Griddle).disabled()],
            ..Default::default()
        };
        let griddle = StationRouter::effective_stations(&layout, ModuleKind::Griddle);
        assert!(griddle.fallback_used);
        assert_eq!(griddle.stations[0].station_id, "G1");
        assert!(griddle.stations[0].enabled);

        let noodle = StationRouter::effective_stations(&layout, ModuleKind::Noodle);
        assert!(noodle.fallback_used);
        assert_eq!(noodle.stations[0].station_id, "NOODLE-FALLBACK");
    }
}
