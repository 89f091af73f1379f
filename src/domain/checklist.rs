// ==========================================
// 餐饮出品编排系统 - 打包清单领域模型
// ==========================================
// 红线: 清单项不存储，读取时由条目/任务状态推导
// 红线: 生效状态 = 人工覆写 ?? 推导状态
// ==========================================

use crate::domain::types::{ChecklistPart, ChecklistSource, ChecklistStatus, ServiceStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ChecklistItem - 打包清单项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// 清单项键（分组键 + 部位），覆写以此为键
    pub item_key: String,
    pub group_key: String,
    pub part: ChecklistPart,
    pub label: String,
    pub quantity: u32,
    pub source: ChecklistSource,
    /// 依赖的煎制条目/水煮任务ID
    pub backing_ids: Vec<String>,
    pub base_status: ChecklistStatus,
    pub override_status: Option<ChecklistStatus>,
    /// 制作中: 最大剩余秒数
    pub eta_secs: Option<i64>,
    /// 制作中: 平均进度
    pub progress: Option<f64>,
}

impl ChecklistItem {
    pub fn effective_status(&self) -> ChecklistStatus {
        self.override_status.unwrap_or(self.base_status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistGroup {
    pub group_key: String,
    pub label: String,
    pub items: Vec<ChecklistItem>,
}

// ==========================================
// OrderChecklistView - 单订单清单视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderChecklistView {
    pub order_id: String,
    pub created_at: DateTime<Utc>,
    pub service_status: ServiceStatus,
    pub groups: Vec<ChecklistGroup>,
}

impl OrderChecklistView {
    pub fn items(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.groups.iter().flat_map(|g| g.items.iter())
    }

    pub fn item(&self, item_key: &str) -> Option<&ChecklistItem> {
        self.items().find(|i| i.item_key == item_key)
    }

    /// 全部可打包（或已打包）
    pub fn is_ready_to_pack(&self) -> bool {
        self.items().all(|i| {
            matches!(
                i.effective_status(),
                ChecklistStatus::Ready | ChecklistStatus::Packed
            )
        })
    }

    pub fn is_fully_packed(&self) -> bool {
        self.items().all(|i| i.effective_status() == ChecklistStatus::Packed)
    }
}
