// ==========================================
// 餐饮出品编排系统 - 工位与路由规则领域模型
// ==========================================
// 职责: 工位路由规则（品类/标签谓词、ANY/ALL、否决）与工位产能参数
// 红线: 仅通过配置变更，运行时可热替换
// ==========================================

use crate::domain::types::{MatchMode, ModuleKind, PredicateMode, ServiceMode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ==========================================
// 规则谓词（标签化变体）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredicateTarget {
    Category(String),
    Tag(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePredicate {
    pub target: PredicateTarget,
    pub mode: PredicateMode,
}

impl RulePredicate {
    pub fn require_category(category: &str) -> Self {
        Self {
            target: PredicateTarget::Category(category.to_string()),
            mode: PredicateMode::Require,
        }
    }

    pub fn exclude_category(category: &str) -> Self {
        Self {
            target: PredicateTarget::Category(category.to_string()),
            mode: PredicateMode::Exclude,
        }
    }

    pub fn require_tag(tag: &str) -> Self {
        Self {
            target: PredicateTarget::Tag(tag.to_string()),
            mode: PredicateMode::Require,
        }
    }

    pub fn exclude_tag(tag: &str) -> Self {
        Self {
            target: PredicateTarget::Tag(tag.to_string()),
            mode: PredicateMode::Exclude,
        }
    }
}

// ==========================================
// StationRule - 工位/打包线路由规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRule {
    pub station_id: String,
    pub name: String,
    pub enabled: bool,
    pub module: ModuleKind,
    /// 服务方式过滤（空表示不限）
    #[serde(default)]
    pub service_modes: Vec<ServiceMode>,
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(default)]
    pub predicates: Vec<RulePredicate>,
}

impl StationRule {
    /// 无条件工位（接收一切未被否决的订单）
    pub fn open(station_id: &str, module: ModuleKind) -> Self {
        Self {
            station_id: station_id.to_string(),
            name: station_id.to_string(),
            enabled: true,
            module,
            service_modes: Vec::new(),
            match_mode: MatchMode::Any,
            predicates: Vec::new(),
        }
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn with_predicate(mut self, predicate: RulePredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn with_service_modes(mut self, modes: &[ServiceMode]) -> Self {
        self.service_modes = modes.to_vec();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

// ==========================================
// 工位产能参数
// ==========================================

/// 煎台参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FryStationSettings {
    /// 单锅容量（只）
    pub capacity_pieces: u32,
    /// 默认煎制时长（秒）
    pub default_cook_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FryStationConfig {
    pub station_id: String,
    #[serde(flatten)]
    pub settings: FryStationSettings,
}

/// 水煮工位参数（勺位数）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterStationConfig {
    pub station_id: String,
    pub ladle_slots: u8,
}

// ==========================================
// KitchenLayout - 工位布局（规则 + 产能）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KitchenLayout {
    #[serde(default)]
    pub stations: Vec<StationRule>,
    #[serde(default)]
    pub fry_stations: Vec<FryStationConfig>,
    #[serde(default)]
    pub water_stations: Vec<WaterStationConfig>,
}

impl KitchenLayout {
    /// 某模块下的工位（声明顺序）
    pub fn stations_of(&self, module: ModuleKind) -> Vec<&StationRule> {
        self.stations.iter().filter(|s| s.module == module).collect()
    }

    pub fn station(&self, station_id: &str) -> Option<&StationRule> {
        self.stations.iter().find(|s| s.station_id == station_id)
    }

    pub fn fry_settings(&self, station_id: &str) -> Option<FryStationSettings> {
        self.fry_stations
            .iter()
            .find(|c| c.station_id == station_id)
            .map(|c| c.settings)
    }

    pub fn ladle_slots(&self, station_id: &str) -> Option<u8> {
        self.water_stations
            .iter()
            .find(|c| c.station_id == station_id)
            .map(|c| c.ladle_slots)
    }

    /// 结构校验（重复ID、非法产能）
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for station in &self.stations {
            if station.station_id.trim().is_empty() {
                return Err("工位ID不能为空".to_string());
            }
            if !seen.insert(station.station_id.as_str()) {
                return Err(format!("工位ID重复: {}", station.station_id));
            }
        }
        for fry in &self.fry_stations {
            if fry.settings.capacity_pieces == 0 {
                return Err(format!("煎台容量必须大于0: {}", fry.station_id));
            }
            if fry.settings.default_cook_secs == 0 {
                return Err(format!("煎台默认时长必须大于0: {}", fry.station_id));
            }
        }
        for water in &self.water_stations {
            if water.ladle_slots == 0 {
                return Err(format!("勺位数必须大于0: {}", water.station_id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let layout = KitchenLayout {
            stations: vec![
                StationRule::open("G1", ModuleKind::Griddle),
                StationRule::open("G1", ModuleKind::Noodle),
            ],
            ..Default::default()
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_predicate_serde_shape() {
        let p = RulePredicate::exclude_tag("spicy");
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"kind\":\"TAG\""));
        assert!(json.contains("\"mode\":\"EXCLUDE\""));
        let back: RulePredicate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
