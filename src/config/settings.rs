// ==========================================
// 餐饮出品编排系统 - 编排参数
// ==========================================
// 职责: 编排引擎运行参数（默认值 + config_kv 覆写）
// 存储: config_kv 表 key = orchestrator_settings (JSON)
// ==========================================

use serde::{Deserialize, Serialize};

/// 水煮任务时长规则: 基础时长 + ((数量 - 1) / 单位数量) × 步进秒数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationScaling {
    pub unit_size: u32,
    pub step_secs: u32,
}

impl DurationScaling {
    pub fn new(unit_size: u32, step_secs: u32) -> Self {
        Self { unit_size, step_secs }
    }

    /// 按数量放大后的时长
    pub fn apply(&self, base_secs: u32, quantity: u32) -> u32 {
        let unit = self.unit_size.max(1);
        let extra_units = quantity.saturating_sub(1) / unit;
        base_secs.saturating_add(extra_units.saturating_mul(self.step_secs))
    }
}

/// 连击确认手势参数（N 次点击须落在窗口内）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapGateSettings {
    pub taps: u32,
    pub window_ms: u64,
}

// ==========================================
// OrchestratorSettings - 编排参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    // ===== 煎台 =====
    /// 新工位默认容量（只）
    pub fry_default_capacity: u32,
    /// 新工位默认煎制时长（秒）
    pub fry_default_cook_secs: u32,

    // ===== 水煮 =====
    /// 未配置工位的默认勺位数
    pub default_ladle_slots: u8,
    pub dumpling_scaling: DurationScaling,
    pub noodle_scaling: DurationScaling,
    pub side_heat_scaling: DurationScaling,
    /// 汤饺汤底加热时长（秒）
    pub soup_heat_secs: u32,
    pub capture_min: u32,
    pub capture_default: u32,
    pub capture_max: u32,

    // ===== 打包 =====
    pub top_queue_limit: usize,
    /// 归档防抖宽限（毫秒）
    pub archive_grace_ms: u64,

    // ===== 刷新 =====
    pub tick_interval_ms: u64,

    // ===== 手势门控（引擎外部） =====
    pub force_finish_gate: TapGateSettings,
    pub packed_confirm_gate: TapGateSettings,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            fry_default_capacity: 40,
            fry_default_cook_secs: 420,
            default_ladle_slots: 4,
            dumpling_scaling: DurationScaling::new(10, 30),
            noodle_scaling: DurationScaling::new(1, 20),
            side_heat_scaling: DurationScaling::new(2, 15),
            soup_heat_secs: 120,
            capture_min: 20,
            capture_default: 40,
            capture_max: 100,
            top_queue_limit: 3,
            archive_grace_ms: 8_000,
            tick_interval_ms: 1_000,
            force_finish_gate: TapGateSettings {
                taps: 3,
                window_ms: 420,
            },
            packed_confirm_gate: TapGateSettings {
                taps: 2,
                window_ms: 600,
            },
        }
    }
}

impl OrchestratorSettings {
    /// 参数校验
    pub fn validate(&self) -> Result<(), String> {
        if self.fry_default_capacity == 0 || self.fry_default_cook_secs == 0 {
            return Err("煎台默认容量/时长必须大于0".to_string());
        }
        if self.default_ladle_slots == 0 {
            return Err("默认勺位数必须大于0".to_string());
        }
        if !(self.capture_min <= self.capture_default && self.capture_default <= self.capture_max) {
            return Err(format!(
                "批量下锅目标区间无效: min={}, default={}, max={}",
                self.capture_min, self.capture_default, self.capture_max
            ));
        }
        if self.top_queue_limit == 0 {
            return Err("打包队列展示数必须 ≥ 1".to_string());
        }
        if self.tick_interval_ms == 0 {
            return Err("刷新间隔必须大于0".to_string());
        }
        Ok(())
    }
}
