// ==========================================
// 餐饮出品编排系统 - 打包清单聚合器
// ==========================================
// 红线: 清单项读取时推导，不存储；同样输入两次读取结果相同
// 红线: 生效状态 = 人工覆写 ?? 推导状态
// 规则: 直出 → 可打包；煎/煮 → 按依赖条目/任务聚合
// 聚合: 任一依赖无法解析 → 异常；全部完成 → 可打包；
//       任一制作中 → 制作中（ETA = 最大剩余，进度 = 制作中均值）；否则排队中
// ==========================================

use crate::domain::checklist::{ChecklistGroup, ChecklistItem, OrderChecklistView};
use crate::domain::fry::{FryEntry, FryLedger, FryStationState};
use crate::domain::order::Order;
use crate::domain::types::{ChecklistPart, ChecklistSource, ChecklistStatus, PrepKind, WaterTaskStatus};
use crate::domain::water::WaterTask;
use crate::engine::catalog::Catalog;
use crate::engine::error::{OrchestratorError, OrchestratorResult};
use crate::engine::fry_entries::{box_backing_entry_id, line_backing_entry_id};
use crate::engine::water_deriver::{box_row_task_id, box_task_id, line_part_task_id, line_task_id};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

// ==========================================
// 依赖状态索引（条目ID/任务ID → 状态）
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackingState {
    Queued,
    Cooking { remaining_secs: i64, progress: f64 },
    Done,
}

#[derive(Debug, Clone, Default)]
pub struct StatusIndex {
    states: HashMap<String, BackingState>,
}

impl StatusIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, state: BackingState) {
        self.states.insert(id.to_string(), state);
    }

    pub fn get(&self, id: &str) -> Option<BackingState> {
        self.states.get(id).copied()
    }

    /// 收录煎制条目状态
    ///
    /// 已煎 → 完成；在煎制中批次 → 制作中；其余派生条目 → 排队中
    pub fn add_fry(
        &mut self,
        entries: &[FryEntry],
        stations: &[&FryStationState],
        ledger: &FryLedger,
        now: DateTime<Utc>,
    ) {
        for entry in entries {
            self.insert(&entry.entry_id, BackingState::Queued);
        }
        for station in stations {
            let Some(batch) = station.locked_batch.as_ref() else {
                continue;
            };
            let state = match batch.timer() {
                Some(timer) => BackingState::Cooking {
                    remaining_secs: timer.remaining_secs(now),
                    progress: timer.progress(now),
                },
                None => BackingState::Queued,
            };
            for id in &batch.entry_ids {
                self.insert(id, state);
            }
        }
        for id in &ledger.fried_entry_ids {
            self.insert(id, BackingState::Done);
        }
    }

    /// 收录水煮任务状态
    pub fn add_water(&mut self, tasks: &[WaterTask], now: DateTime<Utc>) {
        for task in tasks {
            let state = match (task.runtime.status, task.timer()) {
                (WaterTaskStatus::Done, _) => BackingState::Done,
                (WaterTaskStatus::Cooking, Some(timer)) => BackingState::Cooking {
                    remaining_secs: timer.remaining_secs(now),
                    progress: timer.progress(now),
                },
                _ => BackingState::Queued,
            };
            self.insert(&task.task_id, state);
        }
    }

    /// 聚合多个依赖 → (状态, ETA, 进度)
    pub fn aggregate(&self, ids: &[String]) -> (ChecklistStatus, Option<i64>, Option<f64>) {
        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get(id) {
                Some(state) => resolved.push(state),
                None => return (ChecklistStatus::Issue, None, None),
            }
        }
        if resolved.is_empty() {
            return (ChecklistStatus::Issue, None, None);
        }
        if resolved.iter().all(|s| *s == BackingState::Done) {
            return (ChecklistStatus::Ready, None, None);
        }

        let cooking: Vec<(i64, f64)> = resolved
            .iter()
            .filter_map(|s| match s {
                BackingState::Cooking {
                    remaining_secs,
                    progress,
                } => Some((*remaining_secs, *progress)),
                _ => None,
            })
            .collect();
        if cooking.is_empty() {
            return (ChecklistStatus::Queued, None, None);
        }

        let eta = cooking.iter().map(|(r, _)| (*r).max(0)).max();
        let progress = cooking.iter().map(|(_, p)| *p).sum::<f64>() / cooking.len() as f64;
        (ChecklistStatus::InProgress, eta, Some(progress))
    }
}

/// 清单推导上下文
pub struct ChecklistContext<'a> {
    pub catalog: &'a Catalog,
    pub index: &'a StatusIndex,
    /// 订单是否已拆盒
    pub split: bool,
    /// 清单项键 → 人工覆写
    pub overrides: Option<&'a HashMap<String, ChecklistStatus>>,
}

// ==========================================
// ChecklistAggregator - 清单聚合器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecklistAggregator;

impl ChecklistAggregator {
    pub fn new() -> Self {
        Self
    }

    #[allow(clippy::too_many_arguments)]
    fn make_item(
        &self,
        ctx: &ChecklistContext<'_>,
        group_key: &str,
        key_suffix: &str,
        part: ChecklistPart,
        label: String,
        quantity: u32,
        source: ChecklistSource,
        backing_ids: Vec<String>,
    ) -> ChecklistItem {
        let (base_status, eta_secs, progress) = match source {
            ChecklistSource::Direct => (ChecklistStatus::Ready, None, None),
            _ => ctx.index.aggregate(&backing_ids),
        };
        let item_key = format!("{}:{}", group_key, key_suffix);
        let override_status = ctx
            .overrides
            .and_then(|o| o.get(&item_key))
            .copied();
        ChecklistItem {
            item_key,
            group_key: group_key.to_string(),
            part,
            label,
            quantity,
            source,
            backing_ids,
            base_status,
            override_status,
            eta_secs,
            progress,
        }
    }

    /// 推导单订单清单
    pub fn build(&self, order: &Order, ctx: &ChecklistContext<'_>) -> OrderChecklistView {
        let order_id = order.order_id.as_str();
        let mut groups = Vec::new();

        for (i, line) in order.lines.iter().enumerate() {
            let group_key = format!("line:{}", i);
            let item = ctx.catalog.get(&line.item_id);
            let name = item.map(|c| c.name.clone()).unwrap_or_else(|| line.item_id.clone());
            let whole = ChecklistPart::Whole.to_string();

            let items = match item.map(|c| (c.prep_kind, c.pieces_per_unit)) {
                // 目录缺失: 无法解析
                None => vec![ChecklistItem {
                    base_status: ChecklistStatus::Issue,
                    ..self.make_item(ctx, &group_key, &whole, ChecklistPart::Whole, name.clone(), line.quantity, ChecklistSource::Direct, Vec::new())
                }],
                Some((PrepKind::Direct, _)) => vec![self.make_item(
                    ctx, &group_key, &whole, ChecklistPart::Whole, name.clone(), line.quantity,
                    ChecklistSource::Direct, Vec::new(),
                )],
                Some((PrepKind::Griddle, per_unit)) => vec![self.make_item(
                    ctx, &group_key, &whole, ChecklistPart::Whole, name.clone(), line.quantity * per_unit,
                    ChecklistSource::Griddle, vec![line_backing_entry_id(order_id, ctx.split)],
                )],
                Some((PrepKind::SoupDumpling, per_unit)) => vec![
                    self.make_item(
                        ctx, &group_key, &ChecklistPart::Food.to_string(), ChecklistPart::Food,
                        format!("{} · 饺子", name), line.quantity * per_unit, ChecklistSource::Water,
                        vec![line_part_task_id(order_id, i, ChecklistPart::Food)],
                    ),
                    self.make_item(
                        ctx, &group_key, &ChecklistPart::Soup.to_string(), ChecklistPart::Soup,
                        format!("{} · 汤", name), line.quantity, ChecklistSource::Water,
                        vec![line_part_task_id(order_id, i, ChecklistPart::Soup)],
                    ),
                ],
                Some((PrepKind::Dumpling, per_unit)) => vec![self.make_item(
                    ctx, &group_key, &whole, ChecklistPart::Whole, name.clone(), line.quantity * per_unit,
                    ChecklistSource::Water, vec![line_task_id(order_id, i)],
                )],
                Some(_) => vec![self.make_item(
                    ctx, &group_key, &whole, ChecklistPart::Whole, name.clone(), line.quantity,
                    ChecklistSource::Water, vec![line_task_id(order_id, i)],
                )],
            };

            groups.push(ChecklistGroup {
                group_key,
                label: format!("{} × {}", name, line.quantity),
                items,
            });
        }

        for (b, order_box) in order.boxes.iter().enumerate() {
            let group_key = format!("box:{}", b);
            let mut griddle_qty = 0u32;
            let mut water_qty = 0u32;
            let mut direct_qty = 0u32;
            let mut water_ids: Vec<String> = Vec::new();
            let mut has_box_dumpling = false;
            let mut unresolved = false;

            for (r, row) in order_box.rows.iter().enumerate() {
                match ctx.catalog.get(&row.item_id).map(|c| c.prep_kind) {
                    None => unresolved = true,
                    Some(PrepKind::Direct) => direct_qty += row.quantity,
                    Some(PrepKind::Griddle) => griddle_qty += row.quantity,
                    Some(PrepKind::Dumpling) | Some(PrepKind::SoupDumpling) => {
                        water_qty += row.quantity;
                        has_box_dumpling = true;
                    }
                    Some(_) => {
                        water_qty += row.quantity;
                        if row.quantity > 0 {
                            water_ids.push(box_row_task_id(order_id, b, r));
                        }
                    }
                }
            }
            if has_box_dumpling {
                water_ids.push(box_task_id(order_id, b));
            }

            let mut items = Vec::new();
            if griddle_qty > 0 {
                items.push(self.make_item(
                    ctx, &group_key, "griddle", ChecklistPart::Whole, "煎品".to_string(), griddle_qty,
                    ChecklistSource::Griddle, vec![box_backing_entry_id(order_id, b, ctx.split)],
                ));
            }
            if water_qty > 0 {
                items.push(self.make_item(
                    ctx, &group_key, "water", ChecklistPart::Whole, "煮品".to_string(), water_qty,
                    ChecklistSource::Water, water_ids,
                ));
            }
            if direct_qty > 0 || unresolved {
                let mut direct = self.make_item(
                    ctx, &group_key, "direct", ChecklistPart::Whole, "直出".to_string(), direct_qty,
                    ChecklistSource::Direct, Vec::new(),
                );
                if unresolved {
                    direct.base_status = ChecklistStatus::Issue;
                }
                items.push(direct);
            }

            groups.push(ChecklistGroup {
                label: order_box
                    .label
                    .clone()
                    .unwrap_or_else(|| format!("第{}盒", b + 1)),
                group_key,
                items,
            });
        }

        OrderChecklistView {
            order_id: order.order_id.clone(),
            created_at: order.created_at,
            service_status: order.service_status,
            groups,
        }
    }

    /// 切换打包状态
    ///
    /// # 返回
    /// 新的覆写值（None 表示清除覆写）
    ///
    /// # 规则
    /// - 已打包 → 清除覆写
    /// - 排队中 → 须二次确认
    /// - 其余 → 覆写为已打包
    pub fn toggle(
        &self,
        order_id: &str,
        item: &ChecklistItem,
        confirmed: bool,
    ) -> OrchestratorResult<Option<ChecklistStatus>> {
        match item.effective_status() {
            ChecklistStatus::Packed => Ok(None),
            ChecklistStatus::Queued if !confirmed => Err(OrchestratorError::ConfirmationRequired {
                order_id: order_id.to_string(),
                item_key: item.item_key.clone(),
            }),
            _ => Ok(Some(ChecklistStatus::Packed)),
        }
    }

    /// 打包线置顶队列
    ///
    /// # 参数
    /// - `waiting`: 该打包线的待打包订单
    /// - `pins`: 置顶记录（先置顶在前）
    /// - `limit`: 展示数（至少 1）
    pub fn select_top_queue(&self, waiting: &[&Order], pins: &[String], limit: usize) -> Vec<String> {
        let limit = limit.max(1);
        let waiting_ids: HashSet<&str> = waiting.iter().map(|o| o.order_id.as_str()).collect();

        let mut selected: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for pinned in pins.iter().rev() {
            if waiting_ids.contains(pinned.as_str()) && seen.insert(pinned.as_str()) {
                selected.push(pinned.clone());
            }
        }

        let mut rest: Vec<&Order> = waiting
            .iter()
            .copied()
            .filter(|o| !seen.contains(o.order_id.as_str()))
            .collect();
        rest.sort_by(|a, b| a.fifo_key().cmp(&b.fifo_key()));
        selected.extend(rest.into_iter().map(|o| o.order_id.clone()));

        selected.truncate(limit);
        selected
    }
}
