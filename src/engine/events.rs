// ==========================================
// 餐饮出品编排系统 - 引擎层事件发布
// ==========================================
// 职责: 定义出站事件发布 trait（出餐、归档、重置、布局变更）
// 说明: Engine 层定义 trait，记录方（归档仓储等）实现适配器
// 红线: 发布失败只记日志，不回滚引擎状态
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 事件类型
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestratorEventType {
    /// 订单进入编排
    OrderSubmitted,
    /// 服务状态变更（待取餐 → 已出餐）
    ServiceStatusChanged,
    /// 订单归档（载荷为订单快照）
    OrderArchived,
    /// 外部重置信号生效
    WorkflowReset,
    /// 工位布局变更
    LayoutChanged,
}

impl OrchestratorEventType {
    pub fn as_str(&self) -> &str {
        match self {
            OrchestratorEventType::OrderSubmitted => "OrderSubmitted",
            OrchestratorEventType::ServiceStatusChanged => "ServiceStatusChanged",
            OrchestratorEventType::OrderArchived => "OrderArchived",
            OrchestratorEventType::WorkflowReset => "WorkflowReset",
            OrchestratorEventType::LayoutChanged => "LayoutChanged",
        }
    }
}

/// 编排事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorEvent {
    pub event_id: String,
    pub event_type: OrchestratorEventType,
    /// 关联订单（全局事件为 None）
    pub order_id: Option<String>,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl OrchestratorEvent {
    /// 订单级事件
    pub fn for_order(
        event_type: OrchestratorEventType,
        order_id: &str,
        payload: serde_json::Value,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            event_type,
            order_id: Some(order_id.to_string()),
            payload,
            occurred_at,
        }
    }

    /// 全局事件
    pub fn global(
        event_type: OrchestratorEventType,
        payload: serde_json::Value,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            event_type,
            order_id: None,
            payload,
            occurred_at,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 编排事件发布者
///
/// # 实现说明
/// - `repository::ArchiveEventRecorder` 将归档事件落库
pub trait OrchestratorEventPublisher: Send + Sync {
    /// 发布事件
    ///
    /// # 返回
    /// - `Ok(id)`: 记录ID（如果支持）或空字符串
    /// - `Err`: 发布失败
    fn publish(&self, event: OrchestratorEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者（单元测试用）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl OrchestratorEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: OrchestratorEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - event_type={}, order_id={:?}",
            event.event_type.as_str(),
            event.order_id
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn OrchestratorEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn OrchestratorEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    pub fn publish(&self, event: OrchestratorEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - event_type={}",
                    event.event_type.as_str()
                );
                Ok(String::new())
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}
