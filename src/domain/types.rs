// ==========================================
// 餐饮出品编排系统 - 领域类型定义
// ==========================================
// 职责: 出品/打包流程中的枚举与状态类型
// 序列化格式: SCREAMING_SNAKE_CASE (与配置/归档记录一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 服务方式 (Service Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceMode {
    DineIn,   // 堂食
    Takeout,  // 自取
    Delivery, // 外送
}

impl ServiceMode {
    /// 宽松解析（导入适配器使用）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "DINE_IN" | "DINEIN" | "堂食" => Some(ServiceMode::DineIn),
            "TAKEOUT" | "TAKE_OUT" | "PICKUP" | "自取" | "外带" => Some(ServiceMode::Takeout),
            "DELIVERY" | "外送" | "外卖" => Some(ServiceMode::Delivery),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceMode::DineIn => write!(f, "DINE_IN"),
            ServiceMode::Takeout => write!(f, "TAKEOUT"),
            ServiceMode::Delivery => write!(f, "DELIVERY"),
        }
    }
}

// ==========================================
// 工位模块 (Module)
// ==========================================
// 生产模块: 煎台 / 饺子锅 / 面锅；打包模块: 打包线
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModuleKind {
    Griddle,   // 煎台
    Dumpling,  // 饺子锅
    Noodle,    // 面锅（带勺位）
    Packaging, // 打包线
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 4] = [
        ModuleKind::Griddle,
        ModuleKind::Dumpling,
        ModuleKind::Noodle,
        ModuleKind::Packaging,
    ];

    /// 是否生产模块（负载按件数/份数计）
    pub fn is_production(&self) -> bool {
        !matches!(self, ModuleKind::Packaging)
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleKind::Griddle => write!(f, "GRIDDLE"),
            ModuleKind::Dumpling => write!(f, "DUMPLING"),
            ModuleKind::Noodle => write!(f, "NOODLE"),
            ModuleKind::Packaging => write!(f, "PACKAGING"),
        }
    }
}

// ==========================================
// 规则匹配模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchMode {
    #[default]
    Any, // 任一正向条件成立
    All, // 全部正向条件成立
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Any => write!(f, "ANY"),
            MatchMode::All => write!(f, "ALL"),
        }
    }
}

/// 单个谓词的作用方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredicateMode {
    Require, // 正向条件
    Exclude, // 否决条件
    #[default]
    Ignore,  // 不参与判定
}

// ==========================================
// 出品方式 (Prep Kind)
// ==========================================
// 决定订单行/盒内行进入哪条生产链
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrepKind {
    Direct,       // 直出（无需加热）
    Griddle,      // 煎制（锅贴/煎饺）
    Dumpling,     // 水煮饺子
    SoupDumpling, // 汤饺（饺子 + 汤两部分）
    Noodle,       // 面
    SideHeat,     // 加热小菜
    SoupDrink,    // 加热汤品/饮品
}

impl PrepKind {
    /// 对应的生产模块（直出为 None）
    pub fn module(&self) -> Option<ModuleKind> {
        match self {
            PrepKind::Direct => None,
            PrepKind::Griddle => Some(ModuleKind::Griddle),
            PrepKind::Dumpling | PrepKind::SoupDumpling => Some(ModuleKind::Dumpling),
            PrepKind::Noodle | PrepKind::SideHeat | PrepKind::SoupDrink => Some(ModuleKind::Noodle),
        }
    }
}

impl fmt::Display for PrepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrepKind::Direct => write!(f, "DIRECT"),
            PrepKind::Griddle => write!(f, "GRIDDLE"),
            PrepKind::Dumpling => write!(f, "DUMPLING"),
            PrepKind::SoupDumpling => write!(f, "SOUP_DUMPLING"),
            PrepKind::Noodle => write!(f, "NOODLE"),
            PrepKind::SideHeat => write!(f, "SIDE_HEAT"),
            PrepKind::SoupDrink => write!(f, "SOUP_DRINK"),
        }
    }
}

// ==========================================
// 订单服务状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    #[default]
    WaitingPickup, // 待取餐
    Served,        // 已出餐
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::WaitingPickup => write!(f, "WAITING_PICKUP"),
            ServiceStatus::Served => write!(f, "SERVED"),
        }
    }
}

// ==========================================
// 煎台工位状态
// ==========================================
// UNLOCKED(仅推荐) → LOCKED(批次冻结) → COOKING(计时中) → UNLOCKED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FryStationPhase {
    Unlocked,
    Locked,
    Cooking,
}

impl fmt::Display for FryStationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FryStationPhase::Unlocked => write!(f, "UNLOCKED"),
            FryStationPhase::Locked => write!(f, "LOCKED"),
            FryStationPhase::Cooking => write!(f, "COOKING"),
        }
    }
}

// ==========================================
// 水煮任务
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaterTaskKind {
    Dumpling, // 饺子（散煮，不占勺位）
    Noodle,   // 面（占勺位）
    SideHeat, // 小菜/汤品加热（占勺位）
}

impl WaterTaskKind {
    pub fn requires_ladle(&self) -> bool {
        !matches!(self, WaterTaskKind::Dumpling)
    }

    /// 所属模块（饺子锅 / 面锅）
    pub fn module(&self) -> ModuleKind {
        match self {
            WaterTaskKind::Dumpling => ModuleKind::Dumpling,
            WaterTaskKind::Noodle | WaterTaskKind::SideHeat => ModuleKind::Noodle,
        }
    }
}

impl fmt::Display for WaterTaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaterTaskKind::Dumpling => write!(f, "DUMPLING"),
            WaterTaskKind::Noodle => write!(f, "NOODLE"),
            WaterTaskKind::SideHeat => write!(f, "SIDE_HEAT"),
        }
    }
}

/// 水煮任务状态: QUEUED → COOKING → DONE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaterTaskStatus {
    #[default]
    Queued,
    Cooking,
    Done,
}

impl fmt::Display for WaterTaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaterTaskStatus::Queued => write!(f, "QUEUED"),
            WaterTaskStatus::Cooking => write!(f, "COOKING"),
            WaterTaskStatus::Done => write!(f, "DONE"),
        }
    }
}

// ==========================================
// 打包清单
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChecklistSource {
    Direct,  // 直出
    Griddle, // 依赖煎台条目
    Water,   // 依赖水煮任务
}

impl fmt::Display for ChecklistSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecklistSource::Direct => write!(f, "DIRECT"),
            ChecklistSource::Griddle => write!(f, "GRIDDLE"),
            ChecklistSource::Water => write!(f, "WATER"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChecklistStatus {
    Queued,     // 排队中
    InProgress, // 制作中
    Ready,      // 可打包
    Packed,     // 已打包（仅由人工覆写产生）
    Issue,      // 异常（依赖无法解析）
}

impl fmt::Display for ChecklistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecklistStatus::Queued => write!(f, "QUEUED"),
            ChecklistStatus::InProgress => write!(f, "IN_PROGRESS"),
            ChecklistStatus::Ready => write!(f, "READY"),
            ChecklistStatus::Packed => write!(f, "PACKED"),
            ChecklistStatus::Issue => write!(f, "ISSUE"),
        }
    }
}

/// 清单项在分组内的部位（汤饺拆为 饺子/汤）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChecklistPart {
    Whole,
    Food,
    Soup,
}

impl fmt::Display for ChecklistPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecklistPart::Whole => write!(f, "whole"),
            ChecklistPart::Food => write!(f, "food"),
            ChecklistPart::Soup => write!(f, "soup"),
        }
    }
}
