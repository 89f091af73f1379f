// ==========================================
// 餐饮出品编排系统 - 连击确认门控
// ==========================================
// 职责: N 次点按须落在时间窗口内才放行（强制出锅 / 排队项打包确认）
// 说明: 手势判定在引擎外部，引擎只接收 force / confirmed 标志
// ==========================================

use crate::config::settings::TapGateSettings;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// 单次点按结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// 达到次数，放行（计数清零）
    Confirmed,
    /// 尚需点按次数
    Pending { remaining: u32 },
}

// ==========================================
// TapConfirmGate
// ==========================================
#[derive(Debug, Clone)]
pub struct TapConfirmGate {
    taps: u32,
    window: Duration,
    /// 目标键 → 窗口内点按时间
    history: HashMap<String, Vec<DateTime<Utc>>>,
}

impl TapConfirmGate {
    pub fn new(settings: TapGateSettings) -> Self {
        Self {
            taps: settings.taps.max(1),
            window: Duration::milliseconds(settings.window_ms as i64),
            history: HashMap::new(),
        }
    }

    /// 记录一次点按
    ///
    /// # 参数
    /// - `key`: 目标（任务ID / 订单ID#清单项键）
    pub fn tap(&mut self, key: &str, now: DateTime<Utc>) -> TapOutcome {
        self.prune(now);
        let window = self.window;
        let taps = self.history.entry(key.to_string()).or_default();
        // 首次点按起算窗口，超窗则重新计数
        if let Some(first) = taps.first() {
            if now - *first > window || now < *first {
                taps.clear();
            }
        }
        taps.push(now);

        let count = taps.len() as u32;
        if count >= self.taps {
            self.history.remove(key);
            TapOutcome::Confirmed
        } else {
            TapOutcome::Pending {
                remaining: self.taps - count,
            }
        }
    }

    /// 丢弃某目标的点按记录
    pub fn reset(&mut self, key: &str) {
        self.history.remove(key);
    }

    /// 丢弃某订单下全部目标的点按记录（键以 `订单ID#` 开头）
    pub fn forget_order(&mut self, order_id: &str) {
        let prefix = format!("{}#", order_id);
        self.history.retain(|key, _| !key.starts_with(&prefix));
    }

    /// 尚在等待确认的目标数
    pub fn pending_keys(&self) -> usize {
        self.history.len()
    }

    /// 清空全部记录（流程重置）
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// 清理所有已超窗的记录
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.history
            .retain(|_, taps| taps.first().map_or(false, |first| now - *first <= window));
    }
}
