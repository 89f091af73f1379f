// ==========================================
// 餐饮出品编排系统 - 煎台批次推荐引擎
// ==========================================
// 红线: 推荐批次总只数 ≤ 工位容量
// 红线: 严格 FIFO，遇到第一个放不下的条目即停止（不跳号）
// 规则: 工位按声明顺序依次取用共享队列，已锁定/煎制中的工位不参与推荐
// 规则: 队首条目单独超容 → 推荐为空 + 标记阻塞，不丢弃
// ==========================================
// 输入: 待煎条目 + 工位状态（声明顺序）+ 订单可用工位 + 已煎台账
// 输出: 每工位推荐批次 + 阻塞条目
// ==========================================

use crate::domain::fry::{FryEntry, FryLedger, FryStationState};
use crate::domain::types::FryStationPhase;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, instrument};

/// 单工位推荐批次
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FryRecommendation {
    pub station_id: String,
    pub entry_ids: Vec<String>,
    pub total_pieces: u32,
    pub flavor_totals: BTreeMap<String, u32>,
    pub duration_secs: u32,
    /// 推荐为空时: 队首超容条目
    pub blocked_entry_id: Option<String>,
}

impl FryRecommendation {
    pub fn is_empty(&self) -> bool {
        self.entry_ids.is_empty()
    }
}

/// 全部工位的一轮推荐结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FryPlan {
    pub recommendations: BTreeMap<String, FryRecommendation>,
    /// 待煎队列（FIFO，已排除锁定与已煎条目）
    pub queue: Vec<String>,
    /// 超出所有可用工位容量的条目（需人工处理: 加容量或拆盒）
    pub blocked_entry_ids: Vec<String>,
}

impl FryPlan {
    pub fn recommendation(&self, station_id: &str) -> Option<&FryRecommendation> {
        self.recommendations.get(station_id)
    }
}

// ==========================================
// FryBatchScheduler - 批次推荐引擎
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct FryBatchScheduler;

impl FryBatchScheduler {
    pub fn new() -> Self {
        Self
    }

    /// 推荐批次（纯函数，每轮重算）
    ///
    /// # 参数
    /// - `entries`: 全部派生条目（顺序无关）
    /// - `stations`: 煎台状态（声明顺序）
    /// - `eligibility`: 订单ID → 可用工位ID；缺省表示全部工位可用
    /// - `ledger`: 已煎台账
    #[instrument(skip_all, fields(entries = entries.len(), stations = stations.len()))]
    pub fn recommend(
        &self,
        entries: &[FryEntry],
        stations: &[&FryStationState],
        eligibility: &HashMap<String, BTreeSet<String>>,
        ledger: &FryLedger,
    ) -> FryPlan {
        let reserved: HashSet<&str> = stations
            .iter()
            .filter_map(|s| s.locked_batch.as_ref())
            .flat_map(|b| b.entry_ids.iter().map(|id| id.as_str()))
            .collect();

        let mut pending: Vec<&FryEntry> = entries
            .iter()
            .filter(|e| !ledger.is_fried(&e.entry_id) && !reserved.contains(e.entry_id.as_str()))
            .collect();
        pending.sort_by(|a, b| a.priority_key().cmp(&b.priority_key()));

        let eligible = |entry: &FryEntry, station_id: &str| -> bool {
            eligibility
                .get(&entry.order_id)
                .map_or(true, |set| set.contains(station_id))
        };

        let mut plan = FryPlan {
            queue: pending.iter().map(|e| e.entry_id.clone()).collect(),
            ..Default::default()
        };

        let mut taken: HashSet<&str> = HashSet::new();
        for station in stations {
            if station.phase() != FryStationPhase::Unlocked {
                continue;
            }
            let capacity = station.settings.capacity_pieces;
            let mut rec = FryRecommendation {
                station_id: station.station_id.clone(),
                duration_secs: station.settings.default_cook_secs,
                ..Default::default()
            };
            let mut picked: Vec<&FryEntry> = Vec::new();

            for entry in &pending {
                if taken.contains(entry.entry_id.as_str()) || !eligible(*entry, &station.station_id) {
                    continue;
                }
                if rec.total_pieces + entry.pieces > capacity {
                    if rec.entry_ids.is_empty() {
                        rec.blocked_entry_id = Some(entry.entry_id.clone());
                    }
                    break;
                }
                picked.push(*entry);
                rec.entry_ids.push(entry.entry_id.clone());
                rec.total_pieces += entry.pieces;
                rec.duration_secs = rec.duration_secs.max(entry.required_cook_secs);
                for (flavor, pieces) in &entry.flavors {
                    *rec.flavor_totals.entry(flavor.clone()).or_insert(0) += pieces;
                }
            }

            for entry in picked {
                taken.insert(entry.entry_id.as_str());
            }
            debug!(
                station_id = %rec.station_id,
                entries = rec.entry_ids.len(),
                total_pieces = rec.total_pieces,
                blocked = ?rec.blocked_entry_id,
                "煎台推荐批次"
            );
            plan.recommendations.insert(station.station_id.clone(), rec);
        }

        // 全局阻塞: 超出全部可用工位的最大容量
        for entry in &pending {
            let max_capacity = stations
                .iter()
                .filter(|s| eligible(*entry, &s.station_id))
                .map(|s| s.settings.capacity_pieces)
                .max();
            let exceeds = match max_capacity {
                Some(cap) => entry.pieces > cap,
                None => false,
            };
            if exceeds {
                plan.blocked_entry_ids.push(entry.entry_id.clone());
            }
        }

        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::station::FryStationSettings;
    use chrono::{TimeZone, Utc};

    fn entry(id: &str, minute: u32, pieces: u32) -> FryEntry {
        FryEntry {
            entry_id: format!("{}#fry", id),
            order_id: id.to_string(),
            order_created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap(),
            sub_ordinal: 0,
            box_index: None,
            pieces,
            flavors: BTreeMap::from([("pork".to_string(), pieces)]),
            required_cook_secs: 420,
        }
    }

    fn station(id: &str, capacity: u32) -> FryStationState {
        FryStationState::new(
            id,
            FryStationSettings {
                capacity_pieces: capacity,
                default_cook_secs: 360,
            },
        )
    }

    #[test]
    fn test_stop_at_first_overflow() {
        let g1 = station("G1", 20);
        let entries = vec![entry("A", 0, 12), entry("B", 1, 10), entry("C", 2, 4)];
        let plan = FryBatchScheduler::new().recommend(&entries, &[&g1], &HashMap::new(), &FryLedger::default());

        let rec = plan.recommendation("G1").unwrap();
        assert_eq!(rec.entry_ids, vec!["A#fry".to_string()]);
        assert_eq!(rec.total_pieces, 12);
        assert_eq!(rec.duration_secs, 420);
    }

    #[test]
    fn test_oversized_head_blocks() {
        let g1 = station("G1", 20);
        let entries = vec![entry("A", 0, 30), entry("B", 1, 5)];
        let plan = FryBatchScheduler::new().recommend(&entries, &[&g1], &HashMap::new(), &FryLedger::default());

        let rec = plan.recommendation("G1").unwrap();
        assert!(rec.is_empty());
        assert_eq!(rec.blocked_entry_id.as_deref(), Some("A#fry"));
        assert_eq!(plan.blocked_entry_ids, vec!["A#fry".to_string()]);
    }

    #[test]
    fn test_eligibility_skips_foreign_orders() {
        let g1 = station("G1", 20);
        let g2 = station("G2", 20);
        let entries = vec![entry("A", 0, 8), entry("B", 1, 8)];
        let eligibility = HashMap::from([("A".to_string(), BTreeSet::from(["G2".to_string()]))]);
        let plan = FryBatchScheduler::new().recommend(&entries, &[&g1, &g2], &eligibility, &FryLedger::default());

        assert_eq!(plan.recommendation("G1").unwrap().entry_ids, vec!["B#fry".to_string()]);
        assert_eq!(plan.recommendation("G2").unwrap().entry_ids, vec!["A#fry".to_string()]);
    }

    #[test]
    fn test_fried_entries_excluded() {
        let g1 = station("G1", 20);
        let entries = vec![entry("A", 0, 8), entry("B", 1, 8)];
        let mut ledger = FryLedger::default();
        ledger.record(&["A#fry".to_string()], 8);
        let plan = FryBatchScheduler::new().recommend(&entries, &[&g1], &HashMap::new(), &ledger);

        assert_eq!(plan.queue, vec!["B#fry".to_string()]);
    }
}
