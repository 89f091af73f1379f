use super::{Derivation, KitchenOrchestrator};
use crate::domain::checklist::OrderChecklistView;
use crate::domain::order::Order;
use crate::domain::types::{ChecklistStatus, ModuleKind};
use crate::engine::checklist::ChecklistContext;
use crate::engine::error::{OrchestratorError, OrchestratorResult};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

impl KitchenOrchestrator {
    /// 基于一轮推导结果构建订单清单
    pub(super) fn checklist_from(&self, order: &Order, derivation: &Derivation) -> OrderChecklistView {
        let ctx = ChecklistContext {
            catalog: &self.catalog,
            index: &derivation.index,
            split: self.split_orders.contains(&order.order_id),
            overrides: self.overrides.get(&order.order_id),
        };
        self.checklist.build(order, &ctx)
    }

    /// 打包线的待打包订单（未出餐且未全部打包）
    pub(super) fn lane_waiting_orders<'a>(&'a self, lane_id: &str, derivation: &Derivation) -> Vec<&'a Order> {
        let Some(route) = derivation.route(ModuleKind::Packaging) else {
            return Vec::new();
        };
        self.orders
            .values()
            .filter(|o| route.station_for(&o.order_id) == lane_id)
            .filter(|o| self.is_active(o))
            .collect()
    }

    fn require_lane(&self, lane_id: &str, derivation: &Derivation) -> OrchestratorResult<()> {
        let known = derivation
            .route(ModuleKind::Packaging)
            .map_or(false, |r| r.stations.iter().any(|s| s.station_id == lane_id));
        if known {
            Ok(())
        } else {
            Err(OrchestratorError::StationNotFound(lane_id.to_string()))
        }
    }

    /// 单订单清单视图
    pub fn order_checklist(&self, order_id: &str, now: DateTime<Utc>) -> OrchestratorResult<OrderChecklistView> {
        let order = self.require_order(order_id)?;
        let derivation = self.derive(now);
        Ok(self.checklist_from(order, &derivation))
    }

    /// 切换清单项打包状态
    ///
    /// # 参数
    /// - `confirmed`: 排队中的项已完成二次确认
    ///
    /// # 返回
    /// 切换后的生效状态
    pub fn toggle_checklist_item(
        &mut self,
        order_id: &str,
        item_key: &str,
        confirmed: bool,
        now: DateTime<Utc>,
    ) -> OrchestratorResult<ChecklistStatus> {
        let view = self.order_checklist(order_id, now)?;
        let item = view
            .item(item_key)
            .ok_or_else(|| OrchestratorError::ChecklistItemNotFound {
                order_id: order_id.to_string(),
                item_key: item_key.to_string(),
            })?;
        let next = self.checklist.toggle(order_id, item, confirmed)?;
        let effective = next.unwrap_or(item.base_status);

        let overrides = self.overrides.entry(order_id.to_string()).or_default();
        match next {
            Some(status) => {
                overrides.insert(item_key.to_string(), status);
            }
            None => {
                overrides.remove(item_key);
            }
        }
        if overrides.is_empty() {
            self.overrides.remove(order_id);
        }

        debug!(order_id = %order_id, item_key = %item_key, status = %effective, "清单项已切换");
        Ok(effective)
    }

    /// 置顶订单到打包线
    pub fn pin_order(&mut self, lane_id: &str, order_id: &str, now: DateTime<Utc>) -> OrchestratorResult<()> {
        self.require_order(order_id)?;
        let derivation = self.derive(now);
        self.require_lane(lane_id, &derivation)?;

        let pins = self.pins.entry(lane_id.to_string()).or_default();
        pins.retain(|id| id != order_id);
        pins.push(order_id.to_string());
        info!(lane_id = %lane_id, order_id = %order_id, "订单已置顶");
        Ok(())
    }

    /// 取消置顶
    pub fn unpin_order(&mut self, lane_id: &str, order_id: &str) -> OrchestratorResult<()> {
        let removed = match self.pins.get_mut(lane_id) {
            Some(pins) => {
                let before = pins.len();
                pins.retain(|id| id != order_id);
                before != pins.len()
            }
            None => false,
        };
        if !removed {
            return Err(OrchestratorError::OrderNotFound(order_id.to_string()));
        }
        Ok(())
    }

    pub fn pinned_orders(&self, lane_id: &str) -> &[String] {
        self.pins.get(lane_id).map(|p| p.as_slice()).unwrap_or(&[])
    }
}
