// ==========================================
// 餐饮出品编排系统 - 订单领域模型
// ==========================================
// 红线: 订单提交后不可变，仅允许追加流程备注、变更服务状态
// 生命周期: 提交 → 待取餐 → 已出餐 → (人工发起, 延迟) 归档
// ==========================================

use crate::domain::types::{ServiceMode, ServiceStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// OrderSubmission - 订单提交载荷（入站）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSubmission {
    pub order_id: String,
    pub created_at: DateTime<Utc>,
    pub service_mode: ServiceMode,
    #[serde(default)]
    pub lines: Vec<OrderLine>,
    #[serde(default)]
    pub boxes: Vec<OrderBox>,
    pub note: Option<String>,
}

/// 订单行（按份计数）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: String,
    pub quantity: u32,
}

/// 盒装选择（一盒内按口味/品项拆行，按只计数）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBox {
    pub label: Option<String>,
    pub rows: Vec<BoxRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxRow {
    pub item_id: String,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(item_id: &str, quantity: u32) -> Self {
        Self {
            item_id: item_id.to_string(),
            quantity,
        }
    }
}

impl OrderBox {
    pub fn new(label: Option<&str>, rows: Vec<BoxRow>) -> Self {
        Self {
            label: label.map(|s| s.to_string()),
            rows,
        }
    }
}

impl BoxRow {
    pub fn new(item_id: &str, quantity: u32) -> Self {
        Self {
            item_id: item_id.to_string(),
            quantity,
        }
    }
}

// ==========================================
// Order - 在途订单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    // ===== 提交时冻结 =====
    pub order_id: String,
    pub created_at: DateTime<Utc>,
    pub service_mode: ServiceMode,
    pub lines: Vec<OrderLine>,
    pub boxes: Vec<OrderBox>,
    pub note: Option<String>,

    // ===== 可变部分 =====
    pub workflow_notes: Vec<String>,
    pub service_status: ServiceStatus,
}

impl Order {
    pub fn from_submission(submission: OrderSubmission) -> Self {
        Self {
            order_id: submission.order_id,
            created_at: submission.created_at,
            service_mode: submission.service_mode,
            lines: submission.lines,
            boxes: submission.boxes,
            note: submission.note,
            workflow_notes: Vec::new(),
            service_status: ServiceStatus::WaitingPickup,
        }
    }

    /// FIFO 排序键: (创建时间, 订单号)
    pub fn fifo_key(&self) -> (DateTime<Utc>, &str) {
        (self.created_at, self.order_id.as_str())
    }

    pub fn is_served(&self) -> bool {
        self.service_status == ServiceStatus::Served
    }

    /// 追加流程备注（唯一允许的内容变更）
    pub fn append_workflow_note(&mut self, note: &str) {
        let trimmed = note.trim();
        if !trimmed.is_empty() {
            self.workflow_notes.push(trimmed.to_string());
        }
    }

    /// 订单内引用到的全部品项ID（行 + 盒内行）
    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .map(|l| l.item_id.as_str())
            .chain(self.boxes.iter().flat_map(|b| b.rows.iter().map(|r| r.item_id.as_str())))
    }
}

/// 按 FIFO 键排序后的订单引用
pub fn sorted_by_fifo<'a, I>(orders: I) -> Vec<&'a Order>
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut sorted: Vec<&Order> = orders.into_iter().collect();
    sorted.sort_by(|a, b| a.fifo_key().cmp(&b.fifo_key()));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn order(id: &str, minute: u32) -> Order {
        Order::from_submission(OrderSubmission {
            order_id: id.to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap(),
            service_mode: ServiceMode::Takeout,
            lines: vec![OrderLine::new("noodle-beef", 1)],
            boxes: vec![],
            note: None,
        })
    }

    #[test]
    fn test_fifo_sort_ties_broken_by_id() {
        let a = order("B", 1);
        let b = order("A", 1);
        let c = order("C", 0);
        let sorted = sorted_by_fifo([&a, &b, &c]);
        let ids: Vec<&str> = sorted.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_append_workflow_note_skips_blank() {
        let mut o = order("A", 0);
        o.append_workflow_note("  ");
        o.append_workflow_note(" 少辣 ");
        assert_eq!(o.workflow_notes, vec!["少辣".to_string()]);
    }
}
