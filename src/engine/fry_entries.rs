// ==========================================
// 餐饮出品编排系统 - 煎制条目派生
// ==========================================
// 规则: 默认每单一个合并条目 `{order}#fry`
// 规则: 拆盒后每个含煎品的盒一个条目 `{order}#fry#box{n}`，散装行归 `{order}#fry#lines`
// 规则: 订单行只数 = 份数 × 每份只数；盒内行直接按只计
// 规则: 条目时长 = 条目内煎品基础时长的最大值
// ==========================================

use crate::domain::catalog::CatalogItem;
use crate::domain::fry::FryEntry;
use crate::domain::order::Order;
use crate::domain::types::PrepKind;
use crate::engine::catalog::Catalog;
use std::collections::BTreeMap;

/// 合并条目ID
pub fn combined_entry_id(order_id: &str) -> String {
    format!("{}#fry", order_id)
}

/// 拆盒条目ID（盒序号从 0 开始，ID 中从 1 开始）
pub fn box_entry_id(order_id: &str, box_index: usize) -> String {
    format!("{}#fry#box{}", order_id, box_index + 1)
}

/// 拆盒后散装行条目ID
pub fn lines_entry_id(order_id: &str) -> String {
    format!("{}#fry#lines", order_id)
}

fn griddle_item<'a>(catalog: &'a Catalog, item_id: &str) -> Option<&'a CatalogItem> {
    catalog
        .get(item_id)
        .filter(|item| item.prep_kind == PrepKind::Griddle)
}

/// 含煎品的盒序号
pub fn fry_relevant_boxes(order: &Order, catalog: &Catalog) -> Vec<usize> {
    order
        .boxes
        .iter()
        .enumerate()
        .filter(|(_, b)| {
            b.rows
                .iter()
                .any(|r| r.quantity > 0 && griddle_item(catalog, &r.item_id).is_some())
        })
        .map(|(i, _)| i)
        .collect()
}

/// 条目累加器
#[derive(Default)]
struct EntryAccumulator {
    pieces: u32,
    flavors: BTreeMap<String, u32>,
    required_cook_secs: u32,
}

impl EntryAccumulator {
    fn add(&mut self, item: &CatalogItem, pieces: u32) {
        if pieces == 0 {
            return;
        }
        self.pieces += pieces;
        *self.flavors.entry(item.flavor_key().to_string()).or_insert(0) += pieces;
        self.required_cook_secs = self.required_cook_secs.max(item.prep_duration_secs);
    }

    fn into_entry(self, order: &Order, entry_id: String, sub_ordinal: u32, box_index: Option<usize>) -> Option<FryEntry> {
        if self.pieces == 0 {
            return None;
        }
        Some(FryEntry {
            entry_id,
            order_id: order.order_id.clone(),
            order_created_at: order.created_at,
            sub_ordinal,
            box_index,
            pieces: self.pieces,
            flavors: self.flavors,
            required_cook_secs: self.required_cook_secs,
        })
    }
}

fn accumulate_lines(order: &Order, catalog: &Catalog, acc: &mut EntryAccumulator) {
    for line in &order.lines {
        if let Some(item) = griddle_item(catalog, &line.item_id) {
            acc.add(item, line.quantity * item.pieces_per_unit);
        }
    }
}

fn accumulate_box(order: &Order, catalog: &Catalog, box_index: usize, acc: &mut EntryAccumulator) {
    if let Some(order_box) = order.boxes.get(box_index) {
        for row in &order_box.rows {
            if let Some(item) = griddle_item(catalog, &row.item_id) {
                acc.add(item, row.quantity);
            }
        }
    }
}

/// 派生订单的煎制条目
///
/// # 参数
/// - `split`: 订单是否已被人工拆盒
pub fn derive_fry_entries(order: &Order, catalog: &Catalog, split: bool) -> Vec<FryEntry> {
    let boxes = fry_relevant_boxes(order, catalog);

    if !split {
        let mut acc = EntryAccumulator::default();
        accumulate_lines(order, catalog, &mut acc);
        for &i in &boxes {
            accumulate_box(order, catalog, i, &mut acc);
        }
        return acc
            .into_entry(order, combined_entry_id(&order.order_id), 0, None)
            .into_iter()
            .collect();
    }

    let mut entries = Vec::new();
    let mut lines_acc = EntryAccumulator::default();
    accumulate_lines(order, catalog, &mut lines_acc);
    if let Some(entry) = lines_acc.into_entry(order, lines_entry_id(&order.order_id), 0, None) {
        entries.push(entry);
    }
    for &i in &boxes {
        let mut acc = EntryAccumulator::default();
        accumulate_box(order, catalog, i, &mut acc);
        if let Some(entry) = acc.into_entry(order, box_entry_id(&order.order_id, i), i as u32 + 1, Some(i)) {
            entries.push(entry);
        }
    }
    entries
}

/// 订单行的煎制条目ID
pub fn line_backing_entry_id(order_id: &str, split: bool) -> String {
    if split {
        lines_entry_id(order_id)
    } else {
        combined_entry_id(order_id)
    }
}

/// 盒的煎制条目ID
pub fn box_backing_entry_id(order_id: &str, box_index: usize, split: bool) -> String {
    if split {
        box_entry_id(order_id, box_index)
    } else {
        combined_entry_id(order_id)
    }
}
