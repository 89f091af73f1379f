// ==========================================
// 餐饮出品编排系统 - 水煮任务派生
// ==========================================
// 规则: 订单行先于盒派生，订单内序号连续
// 规则: 饺子行 / 面行 / 加热行 → 一个任务 `{order}#L{n}`
// 规则: 汤饺行 → 饺子 `{order}#L{n}#food`（数量 = 每碗只数 × 份数）+ 汤 `{order}#L{n}#soup`
// 规则: 饺子盒 → 一个任务 `{order}#B{n}`（数量 = 盒内饺子只数之和）
// 规则: 盒内面/加热行 → 每行一个任务 `{order}#B{n}#R{m}`
// 规则: 饺子不占勺位；面/加热占勺位
// ==========================================

use crate::config::settings::OrchestratorSettings;
use crate::domain::catalog::CatalogItem;
use crate::domain::order::Order;
use crate::domain::types::{ChecklistPart, ModuleKind, PrepKind, WaterTaskKind};
use crate::domain::water::{TaskOrigin, WaterTask, WaterTaskRuntime};
use crate::engine::catalog::Catalog;
use std::collections::HashMap;

pub fn line_task_id(order_id: &str, line_index: usize) -> String {
    format!("{}#L{}", order_id, line_index + 1)
}

pub fn line_part_task_id(order_id: &str, line_index: usize, part: ChecklistPart) -> String {
    format!("{}#L{}#{}", order_id, line_index + 1, part)
}

pub fn box_task_id(order_id: &str, box_index: usize) -> String {
    format!("{}#B{}", order_id, box_index + 1)
}

pub fn box_row_task_id(order_id: &str, box_index: usize, row_index: usize) -> String {
    format!("{}#B{}#R{}", order_id, box_index + 1, row_index + 1)
}

/// 出品方式 → 水煮任务类型（非水煮品项为 None）
fn task_kind(prep_kind: PrepKind) -> Option<WaterTaskKind> {
    match prep_kind {
        PrepKind::Dumpling | PrepKind::SoupDumpling => Some(WaterTaskKind::Dumpling),
        PrepKind::Noodle => Some(WaterTaskKind::Noodle),
        PrepKind::SideHeat | PrepKind::SoupDrink => Some(WaterTaskKind::SideHeat),
        PrepKind::Direct | PrepKind::Griddle => None,
    }
}

/// 单个任务的派生参数
struct TaskSpec {
    task_id: String,
    origin: TaskOrigin,
    part: ChecklistPart,
    kind: WaterTaskKind,
    item_id: String,
    quantity: u32,
    base_secs: u32,
}

// ==========================================
// WaterTaskDeriver - 水煮任务派生器
// ==========================================
pub struct WaterTaskDeriver<'a> {
    catalog: &'a Catalog,
    settings: &'a OrchestratorSettings,
}

impl<'a> WaterTaskDeriver<'a> {
    pub fn new(catalog: &'a Catalog, settings: &'a OrchestratorSettings) -> Self {
        Self { catalog, settings }
    }

    /// 按数量放大的所需时长
    pub fn required_duration(&self, kind: WaterTaskKind, base_secs: u32, quantity: u32) -> u32 {
        let scaling = match kind {
            WaterTaskKind::Dumpling => self.settings.dumpling_scaling,
            WaterTaskKind::Noodle => self.settings.noodle_scaling,
            WaterTaskKind::SideHeat => self.settings.side_heat_scaling,
        };
        scaling.apply(base_secs, quantity)
    }

    fn water_item(&self, item_id: &str) -> Option<(&'a CatalogItem, WaterTaskKind)> {
        let catalog = self.catalog;
        catalog
            .get(item_id)
            .and_then(|item| task_kind(item.prep_kind).map(|kind| (item, kind)))
    }

    fn collect_specs(&self, order: &Order) -> Vec<TaskSpec> {
        let mut specs = Vec::new();
        let order_id = order.order_id.as_str();

        for (i, line) in order.lines.iter().enumerate() {
            if line.quantity == 0 {
                continue;
            }
            let Some((item, kind)) = self.water_item(&line.item_id) else {
                continue;
            };

            if item.prep_kind == PrepKind::SoupDumpling {
                specs.push(TaskSpec {
                    task_id: line_part_task_id(order_id, i, ChecklistPart::Food),
                    origin: TaskOrigin::Line(i),
                    part: ChecklistPart::Food,
                    kind: WaterTaskKind::Dumpling,
                    item_id: item.item_id.clone(),
                    quantity: item.pieces_per_unit * line.quantity,
                    base_secs: item.prep_duration_secs,
                });
                specs.push(TaskSpec {
                    task_id: line_part_task_id(order_id, i, ChecklistPart::Soup),
                    origin: TaskOrigin::Line(i),
                    part: ChecklistPart::Soup,
                    kind: WaterTaskKind::SideHeat,
                    item_id: item.item_id.clone(),
                    quantity: line.quantity,
                    base_secs: self.settings.soup_heat_secs,
                });
                continue;
            }

            let quantity = match kind {
                WaterTaskKind::Dumpling => item.pieces_per_unit * line.quantity,
                _ => line.quantity,
            };
            specs.push(TaskSpec {
                task_id: line_task_id(order_id, i),
                origin: TaskOrigin::Line(i),
                part: ChecklistPart::Whole,
                kind,
                item_id: item.item_id.clone(),
                quantity,
                base_secs: item.prep_duration_secs,
            });
        }

        for (b, order_box) in order.boxes.iter().enumerate() {
            // 盒内饺子合并为一个任务
            let mut dumpling_qty = 0u32;
            let mut dumpling_base = 0u32;
            let mut dumpling_item: Option<&str> = None;

            for (r, row) in order_box.rows.iter().enumerate() {
                if row.quantity == 0 {
                    continue;
                }
                let Some((item, kind)) = self.water_item(&row.item_id) else {
                    continue;
                };
                if kind == WaterTaskKind::Dumpling {
                    dumpling_qty += row.quantity;
                    dumpling_base = dumpling_base.max(item.prep_duration_secs);
                    dumpling_item.get_or_insert(item.item_id.as_str());
                } else {
                    specs.push(TaskSpec {
                        task_id: box_row_task_id(order_id, b, r),
                        origin: TaskOrigin::Box(b),
                        part: ChecklistPart::Whole,
                        kind,
                        item_id: item.item_id.clone(),
                        quantity: row.quantity,
                        base_secs: item.prep_duration_secs,
                    });
                }
            }

            if let Some(item_id) = dumpling_item {
                specs.push(TaskSpec {
                    task_id: box_task_id(order_id, b),
                    origin: TaskOrigin::Box(b),
                    part: ChecklistPart::Whole,
                    kind: WaterTaskKind::Dumpling,
                    item_id: item_id.to_string(),
                    quantity: dumpling_qty,
                    base_secs: dumpling_base,
                });
            }
        }

        specs
    }

    /// 派生订单的水煮任务
    ///
    /// # 参数
    /// - `station_for`: 模块 → 本单路由到的工位
    /// - `runtime`: 任务运行时状态（缺省为排队中）
    pub fn derive<F>(
        &self,
        order: &Order,
        station_for: F,
        runtime: &HashMap<String, WaterTaskRuntime>,
    ) -> Vec<WaterTask>
    where
        F: Fn(ModuleKind) -> String,
    {
        self.collect_specs(order)
            .into_iter()
            .enumerate()
            .map(|(ordinal, spec)| {
                let state = runtime.get(&spec.task_id).cloned().unwrap_or_default();
                let station_id = state
                    .station_id
                    .clone()
                    .unwrap_or_else(|| station_for(spec.kind.module()));
                WaterTask {
                    order_id: order.order_id.clone(),
                    order_created_at: order.created_at,
                    ordinal: ordinal as u32,
                    origin: spec.origin,
                    part: spec.part,
                    station_id,
                    kind: spec.kind,
                    required_secs: self.required_duration(spec.kind, spec.base_secs, spec.quantity),
                    requires_ladle: spec.kind.requires_ladle(),
                    item_id: spec.item_id,
                    quantity: spec.quantity,
                    task_id: spec.task_id,
                    runtime: state,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{BoxRow, OrderBox, OrderLine, OrderSubmission};
    use crate::domain::types::ServiceMode;
    use chrono::{TimeZone, Utc};

    fn catalog() -> Catalog {
        Catalog::new(vec![
            CatalogItem::new("dump-pork", "dumpling", PrepKind::Dumpling, 360),
            CatalogItem::new("soup-dump", "dumpling", PrepKind::SoupDumpling, 300).with_pieces_per_unit(8),
            CatalogItem::new("noodle-beef", "noodle", PrepKind::Noodle, 240),
            CatalogItem::new("miso", "soup", PrepKind::SoupDrink, 90),
            CatalogItem::new("cola", "drink", PrepKind::Direct, 0),
        ])
    }

    fn station(module: ModuleKind) -> String {
        match module {
            ModuleKind::Dumpling => "D1".to_string(),
            _ => "N1".to_string(),
        }
    }

    #[test]
    fn test_derive_lines_then_boxes() {
        let order = Order::from_submission(OrderSubmission {
            order_id: "A".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            service_mode: ServiceMode::DineIn,
            lines: vec![
                OrderLine::new("noodle-beef", 2),
                OrderLine::new("soup-dump", 2),
                OrderLine::new("cola", 1),
            ],
            boxes: vec![OrderBox::new(
                None,
                vec![BoxRow::new("dump-pork", 12), BoxRow::new("dump-pork", 6), BoxRow::new("miso", 1)],
            )],
            note: None,
        });
        let catalog = catalog();
        let settings = OrchestratorSettings::default();
        let deriver = WaterTaskDeriver::new(&catalog, &settings);
        let tasks = deriver.derive(&order, station, &HashMap::new());

        let ids: Vec<&str> = tasks.iter().map(|t| t.task_id.as_str()).collect();
        assert_eq!(ids, vec!["A#L1", "A#L2#food", "A#L2#soup", "A#B1#R3", "A#B1"]);

        assert_eq!(tasks[0].station_id, "N1");
        assert!(tasks[0].requires_ladle);
        assert_eq!(tasks[0].required_secs, 260);

        assert_eq!(tasks[1].quantity, 16);
        assert!(!tasks[1].requires_ladle);
        assert_eq!(tasks[1].station_id, "D1");
        assert_eq!(tasks[2].kind, WaterTaskKind::SideHeat);
        assert_eq!(tasks[2].station_id, "N1");

        let dumpling_box = &tasks[4];
        assert_eq!(dumpling_box.quantity, 18);
        assert_eq!(dumpling_box.required_secs, 390);
        assert_eq!(dumpling_box.ordinal, 4);
    }

    #[test]
    fn test_pinned_station_wins() {
        let order = Order::from_submission(OrderSubmission {
            order_id: "A".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            service_mode: ServiceMode::DineIn,
            lines: vec![OrderLine::new("noodle-beef", 1)],
            boxes: vec![],
            note: None,
        });
        let catalog = catalog();
        let settings = OrchestratorSettings::default();
        let deriver = WaterTaskDeriver::new(&catalog, &settings);
        let runtime = HashMap::from([(
            "A#L1".to_string(),
            WaterTaskRuntime {
                station_id: Some("N2".to_string()),
                ..Default::default()
            },
        )]);
        let tasks = deriver.derive(&order, station, &runtime);
        assert_eq!(tasks[0].station_id, "N2");
    }
}
