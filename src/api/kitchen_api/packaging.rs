// ==========================================
// KitchenApi - 打包线操作
// ==========================================

use serde_json::json;

use super::KitchenApi;
use crate::api::error::{ApiError, ApiResult};
use crate::api::tap_gate::TapOutcome;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::types::ChecklistStatus;
use crate::engine::error::OrchestratorError;
use crate::engine::views::PackagingLaneView;

impl KitchenApi {
    /// 切换清单项打包状态
    ///
    /// 排队中的项需在窗口内连击确认；未确认时返回 ConfirmationPending
    ///
    /// # 返回
    /// 切换后的生效状态
    pub fn toggle_packed(&self, order_id: &str, item_key: &str, actor: &str) -> ApiResult<ChecklistStatus> {
        let now = self.now();
        let mut engine = self.engine()?;

        let status = match engine.toggle_checklist_item(order_id, item_key, false, now) {
            Ok(status) => status,
            Err(OrchestratorError::ConfirmationRequired { .. }) => {
                let gate_key = format!("{}#{}", order_id, item_key);
                let outcome = self
                    .packed_confirm_gate
                    .lock()
                    .map_err(|e| ApiError::InternalError(format!("门控锁获取失败: {}", e)))?
                    .tap(&gate_key, now);
                match outcome {
                    TapOutcome::Confirmed => engine.toggle_checklist_item(order_id, item_key, true, now)?,
                    TapOutcome::Pending { remaining } => {
                        return Err(ApiError::ConfirmationPending {
                            action: format!("排队项打包 {}", gate_key),
                            remaining,
                        });
                    }
                }
            }
            Err(e) => return Err(e.into()),
        };
        drop(engine);

        self.record(
            ActionLog::new(ActionType::TogglePacked, actor)
                .order(order_id)
                .entity(item_key)
                .payload(json!({ "status": status })),
        );
        Ok(status)
    }

    pub fn pin_order(&self, lane_id: &str, order_id: &str, actor: &str) -> ApiResult<()> {
        self.engine()?.pin_order(lane_id, order_id, self.now())?;
        self.record(
            ActionLog::new(ActionType::PinOrder, actor)
                .station(lane_id)
                .order(order_id),
        );
        Ok(())
    }

    pub fn unpin_order(&self, lane_id: &str, order_id: &str, actor: &str) -> ApiResult<()> {
        self.engine()?.unpin_order(lane_id, order_id)?;
        self.record(
            ActionLog::new(ActionType::UnpinOrder, actor)
                .station(lane_id)
                .order(order_id),
        );
        Ok(())
    }

    pub fn packaging_lane_views(&self) -> ApiResult<Vec<PackagingLaneView>> {
        Ok(self.engine()?.packaging_lane_views(self.now()))
    }
}
