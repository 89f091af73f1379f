// ==========================================
// 餐饮出品编排系统 - 定时刷新任务
// ==========================================
// 职责: 落实到期归档 → 轮询外部重置版本号 → 重算总览
// 说明: tokio interval 驱动，watch 通道通知停止
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::KitchenApi;
use crate::config::OrchestratorConfigReader;

/// 单轮刷新结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub archived: Vec<String>,
    pub reset_applied: bool,
    pub active_orders: usize,
}

/// 执行一轮刷新
pub async fn tick_once(
    kitchen_api: &KitchenApi,
    config: &dyn OrchestratorConfigReader,
) -> TickReport {
    let mut report = TickReport::default();

    match kitchen_api.flush_due_archives(Utc::now()) {
        Ok(archived) => {
            if !archived.is_empty() {
                info!(count = archived.len(), "到期订单已归档");
            }
            report.archived = archived;
        }
        Err(e) => warn!(error = %e, "归档落实失败"),
    }

    match config.get_workflow_reset_version().await {
        Ok(version) => match kitchen_api.apply_reset_version(version) {
            Ok(applied) => report.reset_applied = applied,
            Err(e) => warn!(error = %e, "重置版本号应用失败"),
        },
        Err(e) => warn!(error = %e, "重置版本号读取失败"),
    }

    match kitchen_api.overview() {
        Ok(overview) => {
            report.active_orders = overview.active_orders;
            debug!(
                active_orders = overview.active_orders,
                pending_archives = overview.pending_archives,
                queue_depth = overview.griddle.queue_depth,
                "总览已重算"
            );
        }
        Err(e) => warn!(error = %e, "总览重算失败"),
    }

    report
}

/// 定时刷新主循环（收到 shutdown=true 或发送端关闭即退出）
pub async fn run_ticker(
    kitchen_api: Arc<KitchenApi>,
    config: Arc<dyn OrchestratorConfigReader>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(period_ms = period.as_millis() as u64, "定时刷新任务启动");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                tick_once(&kitchen_api, config.as_ref()).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("定时刷新任务已停止");
}
