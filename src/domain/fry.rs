// ==========================================
// 餐饮出品编排系统 - 煎台领域模型
// ==========================================
// 红线: 锁定批次总只数 ≤ 工位容量
// 红线: 出锅只数累计单调增长；已煎条目随订单归档移除
// ==========================================

use crate::domain::station::FryStationSettings;
use crate::domain::timer::CookTimer;
use crate::domain::types::FryStationPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ==========================================
// FryEntry - 煎制条目（由订单派生）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FryEntry {
    pub entry_id: String,
    pub order_id: String,
    pub order_created_at: DateTime<Utc>,
    /// 订单内子单元序号（合并条目为 0，拆盒后按盒序从 1 开始）
    pub sub_ordinal: u32,
    /// 拆盒条目对应的盒序号
    pub box_index: Option<usize>,
    pub pieces: u32,
    /// 口味 → 只数
    pub flavors: BTreeMap<String, u32>,
    pub required_cook_secs: u32,
}

impl FryEntry {
    /// 优先级键: 创建顺序 → 订单号 → 子单元序号
    pub fn priority_key(&self) -> (DateTime<Utc>, &str, u32) {
        (self.order_created_at, self.order_id.as_str(), self.sub_ordinal)
    }
}

// ==========================================
// LockedBatch - 锁定批次快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedBatch {
    pub entry_ids: Vec<String>,
    pub total_pieces: u32,
    pub flavor_totals: BTreeMap<String, u32>,
    pub duration_secs: u32,
    pub locked_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

impl LockedBatch {
    pub fn timer(&self) -> Option<CookTimer> {
        self.started_at
            .map(|started| CookTimer::new(started, self.duration_secs))
    }

    pub fn contains(&self, entry_id: &str) -> bool {
        self.entry_ids.iter().any(|id| id == entry_id)
    }

    /// 从批次摘除指定条目
    ///
    /// 未开煎的批次同时扣减只数与口味；煎制中的批次实物已下锅，只摘除条目ID
    ///
    /// # 返回
    /// 是否有条目被摘除
    pub fn drop_entries(&mut self, entries: &[FryEntry]) -> bool {
        let before = self.entry_ids.len();
        let cooking = self.started_at.is_some();
        for entry in entries {
            let Some(pos) = self.entry_ids.iter().position(|id| *id == entry.entry_id) else {
                continue;
            };
            self.entry_ids.remove(pos);
            if cooking {
                continue;
            }
            self.total_pieces = self.total_pieces.saturating_sub(entry.pieces);
            for (flavor, pieces) in &entry.flavors {
                if let Some(total) = self.flavor_totals.get_mut(flavor) {
                    *total = total.saturating_sub(*pieces);
                }
            }
            self.flavor_totals.retain(|_, total| *total > 0);
        }
        self.entry_ids.len() != before
    }
}

// ==========================================
// FryStationState - 单个煎台工位状态
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FryStationState {
    pub station_id: String,
    pub settings: FryStationSettings,
    pub locked_batch: Option<LockedBatch>,
}

impl FryStationState {
    pub fn new(station_id: &str, settings: FryStationSettings) -> Self {
        Self {
            station_id: station_id.to_string(),
            settings,
            locked_batch: None,
        }
    }

    pub fn phase(&self) -> FryStationPhase {
        match &self.locked_batch {
            None => FryStationPhase::Unlocked,
            Some(batch) if batch.started_at.is_some() => FryStationPhase::Cooking,
            Some(_) => FryStationPhase::Locked,
        }
    }
}

// ==========================================
// FryLedger - 已煎台账
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FryLedger {
    pub fried_entry_ids: HashSet<String>,
    pub fried_pieces_total: u64,
}

impl FryLedger {
    pub fn is_fried(&self, entry_id: &str) -> bool {
        self.fried_entry_ids.contains(entry_id)
    }

    /// 记录一批出锅（只增不减）
    pub fn record(&mut self, entry_ids: &[String], pieces: u32) {
        for id in entry_ids {
            self.fried_entry_ids.insert(id.clone());
        }
        self.fried_pieces_total += u64::from(pieces);
    }

    /// 移除订单的已煎条目（归档时调用，累计只数不回退）
    pub fn forget_order(&mut self, order_id: &str) {
        let prefix = format!("{}#", order_id);
        self.fried_entry_ids.retain(|id| !id.starts_with(&prefix));
    }
}
