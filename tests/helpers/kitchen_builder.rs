// ==========================================
// 测试数据构建器 - 目录 / 布局 / 订单
// ==========================================

use chrono::{DateTime, Duration, TimeZone, Utc};
use kitchen_orchestrator::config::OrchestratorSettings;
use kitchen_orchestrator::domain::{
    BoxRow, CatalogItem, FryStationConfig, FryStationSettings, KitchenLayout, ModuleKind,
    OrderBox, OrderLine, OrderSubmission, PrepKind, ServiceMode, StationRule, WaterStationConfig,
};
use kitchen_orchestrator::engine::{Catalog, KitchenOrchestrator};

/// 基准时间
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub fn at_secs(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

pub fn at_minute(minute: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(minute)
}

// ==========================================
// 目录
// ==========================================

/// 标准测试目录
///
/// - pot-pork / pot-leek: 煎饺（按只）
/// - dump-pork: 水饺（按只）
/// - soup-dump: 汤饺（每碗 8 只）
/// - noodle-beef: 牛肉面
/// - egg-side: 加热小食
/// - tea: 直出饮品
pub fn standard_catalog() -> Catalog {
    Catalog::new(vec![
        CatalogItem::new("pot-pork", "potsticker", PrepKind::Griddle, 420)
            .with_flavor("pork")
            .with_name("猪肉锅贴"),
        CatalogItem::new("pot-leek", "potsticker", PrepKind::Griddle, 480)
            .with_flavor("leek")
            .with_name("韭菜锅贴"),
        CatalogItem::new("dump-pork", "dumpling", PrepKind::Dumpling, 300).with_name("猪肉水饺"),
        CatalogItem::new("soup-dump", "dumpling", PrepKind::SoupDumpling, 300)
            .with_pieces_per_unit(8)
            .with_name("汤饺"),
        CatalogItem::new("noodle-beef", "noodle", PrepKind::Noodle, 240)
            .with_tags(&["spicy"])
            .with_name("牛肉面"),
        CatalogItem::new("egg-side", "side", PrepKind::SideHeat, 90).with_name("卤蛋"),
        CatalogItem::new("tea", "drink", PrepKind::Direct, 0).with_name("酸梅汤"),
    ])
}

// ==========================================
// 布局
// ==========================================

pub struct LayoutBuilder {
    layout: KitchenLayout,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self {
            layout: KitchenLayout::default(),
        }
    }

    pub fn griddle(mut self, station_id: &str, capacity_pieces: u32, default_cook_secs: u32) -> Self {
        self.layout
            .stations
            .push(StationRule::open(station_id, ModuleKind::Griddle));
        self.layout.fry_stations.push(FryStationConfig {
            station_id: station_id.to_string(),
            settings: FryStationSettings {
                capacity_pieces,
                default_cook_secs,
            },
        });
        self
    }

    pub fn noodle(mut self, station_id: &str, ladle_slots: u8) -> Self {
        self.layout
            .stations
            .push(StationRule::open(station_id, ModuleKind::Noodle));
        self.layout.water_stations.push(WaterStationConfig {
            station_id: station_id.to_string(),
            ladle_slots,
        });
        self
    }

    pub fn dumpling(mut self, station_id: &str) -> Self {
        self.layout
            .stations
            .push(StationRule::open(station_id, ModuleKind::Dumpling));
        self
    }

    pub fn lane(mut self, lane_id: &str) -> Self {
        self.layout
            .stations
            .push(StationRule::open(lane_id, ModuleKind::Packaging));
        self
    }

    pub fn station(mut self, rule: StationRule) -> Self {
        self.layout.stations.push(rule);
        self
    }

    pub fn build(self) -> KitchenLayout {
        self.layout
    }
}

// ==========================================
// 订单
// ==========================================

pub struct OrderBuilder {
    submission: OrderSubmission,
}

impl OrderBuilder {
    pub fn new(order_id: &str) -> Self {
        Self {
            submission: OrderSubmission {
                order_id: order_id.to_string(),
                created_at: t0(),
                service_mode: ServiceMode::Takeout,
                lines: Vec::new(),
                boxes: Vec::new(),
                note: None,
            },
        }
    }

    /// 下单时间 = 基准 + minute 分钟
    pub fn minute(mut self, minute: i64) -> Self {
        self.submission.created_at = at_minute(minute);
        self
    }

    pub fn mode(mut self, mode: ServiceMode) -> Self {
        self.submission.service_mode = mode;
        self
    }

    pub fn line(mut self, item_id: &str, quantity: u32) -> Self {
        self.submission.lines.push(OrderLine::new(item_id, quantity));
        self
    }

    pub fn boxed(mut self, label: &str, rows: &[(&str, u32)]) -> Self {
        let rows = rows.iter().map(|(item, qty)| BoxRow::new(item, *qty)).collect();
        self.submission.boxes.push(OrderBox::new(Some(label), rows));
        self
    }

    pub fn note(mut self, note: &str) -> Self {
        self.submission.note = Some(note.to_string());
        self
    }

    pub fn build(self) -> OrderSubmission {
        self.submission
    }
}

// ==========================================
// 编排器
// ==========================================

pub fn orchestrator(layout: KitchenLayout) -> KitchenOrchestrator {
    KitchenOrchestrator::new(OrchestratorSettings::default(), standard_catalog(), layout).unwrap()
}

pub fn orchestrator_with(settings: OrchestratorSettings, layout: KitchenLayout) -> KitchenOrchestrator {
    KitchenOrchestrator::new(settings, standard_catalog(), layout).unwrap()
}

/// 依次提交订单（提交时间取 t0）
pub fn submit_all(engine: &mut KitchenOrchestrator, orders: Vec<OrderSubmission>) {
    for order in orders {
        engine.submit_order(order, t0()).unwrap();
    }
}
