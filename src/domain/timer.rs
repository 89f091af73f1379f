// ==========================================
// 餐饮出品编排系统 - 计时器值对象
// ==========================================
// 说明: 所有倒计时都由 (开始时间, 时长) 在读取时推导，不存剩余时间
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookTimer {
    pub started_at: DateTime<Utc>,
    pub duration_secs: u32,
}

impl CookTimer {
    pub fn new(started_at: DateTime<Utc>, duration_secs: u32) -> Self {
        Self {
            started_at,
            duration_secs,
        }
    }

    /// 已用时长（毫秒，时钟回拨时取 0）
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_milliseconds().max(0)
    }

    /// 剩余秒数（向上取整，可为负表示超时）
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        let remaining_ms = i64::from(self.duration_secs) * 1000 - self.elapsed_ms(now);
        if remaining_ms > 0 {
            (remaining_ms + 999) / 1000
        } else {
            remaining_ms / 1000
        }
    }

    /// 是否已到时（剩余 ≤ 0）
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.elapsed_ms(now) >= i64::from(self.duration_secs) * 1000
    }

    /// 进度比例 [0, 1]
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        if self.duration_secs == 0 {
            return 1.0;
        }
        let ratio = self.elapsed_ms(now) as f64 / (f64::from(self.duration_secs) * 1000.0);
        ratio.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_timer_countdown() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let timer = CookTimer::new(start, 60);

        assert_eq!(timer.remaining_secs(start), 60);
        assert_eq!(timer.remaining_secs(start + Duration::milliseconds(500)), 60);
        assert_eq!(timer.remaining_secs(start + Duration::seconds(59)), 1);
        assert!(!timer.is_due(start + Duration::seconds(59)));
        assert!(timer.is_due(start + Duration::seconds(60)));
        assert_eq!(timer.remaining_secs(start + Duration::seconds(75)), -15);
        assert!((timer.progress(start + Duration::seconds(30)) - 0.5).abs() < 1e-9);
        assert_eq!(timer.progress(start + Duration::seconds(600)), 1.0);
    }

    #[test]
    fn test_clock_skew_is_clamped() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let timer = CookTimer::new(start, 10);
        assert_eq!(timer.elapsed_ms(start - Duration::seconds(5)), 0);
        assert_eq!(timer.progress(start - Duration::seconds(5)), 0.0);
    }
}
