// ==========================================
// 餐饮出品编排系统 - 菜品目录领域模型
// ==========================================
// 说明: 目录由外部维护，编排器只读取
// 用途: 路由（品类/标签）、任务派生（出品方式/时长/每份只数）
// ==========================================

use crate::domain::types::PrepKind;
use serde::{Deserialize, Serialize};

// ==========================================
// CatalogItem - 目录品项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub item_id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub prep_kind: PrepKind,
    /// 基础制作时长（秒）
    pub prep_duration_secs: u32,
    /// 每份只数（煎饺/水饺按只计；汤饺为每碗只数）
    #[serde(default = "default_pieces_per_unit")]
    pub pieces_per_unit: u32,
    /// 口味标签（煎台口味拆分用）
    pub flavor: Option<String>,
    /// 依赖的其它品项（可售性解析）
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// 人工估清
    #[serde(default)]
    pub sold_out: bool,
}

fn default_pieces_per_unit() -> u32 {
    1
}

impl CatalogItem {
    pub fn new(item_id: &str, category: &str, prep_kind: PrepKind, prep_duration_secs: u32) -> Self {
        Self {
            item_id: item_id.to_string(),
            name: item_id.to_string(),
            category: category.to_string(),
            tags: Vec::new(),
            prep_kind,
            prep_duration_secs,
            pieces_per_unit: 1,
            flavor: None,
            depends_on: Vec::new(),
            sold_out: false,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_pieces_per_unit(mut self, pieces: u32) -> Self {
        self.pieces_per_unit = pieces.max(1);
        self
    }

    pub fn with_flavor(mut self, flavor: &str) -> Self {
        self.flavor = Some(flavor.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_dependencies(mut self, deps: &[&str]) -> Self {
        self.depends_on = deps.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn sold_out(mut self) -> Self {
        self.sold_out = true;
        self
    }

    /// 口味键（无口味时回落到品项名）
    pub fn flavor_key(&self) -> &str {
        self.flavor.as_deref().unwrap_or(self.name.as_str())
    }
}
