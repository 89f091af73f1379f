// ==========================================
// 餐饮出品编排系统 - 可售性解析器
// ==========================================
// 规则: 生效可售性 = 人工估清 ?? 依赖链全部可售
// 规则: 依赖成环视为不可售（不循环）
// 说明: 每次解析按品项ID记忆化；解析器生命周期 = 单次推导
// ==========================================

use crate::engine::catalog::Catalog;
use std::collections::{HashMap, HashSet};

/// AvailabilityResolver - 可售性解析器
pub struct AvailabilityResolver<'a> {
    catalog: &'a Catalog,
    memo: HashMap<String, bool>,
}

impl<'a> AvailabilityResolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            memo: HashMap::new(),
        }
    }

    /// 品项是否可售
    pub fn is_available(&mut self, item_id: &str) -> bool {
        let mut visiting = HashSet::new();
        self.resolve(item_id, &mut visiting)
    }

    fn resolve(&mut self, item_id: &str, visiting: &mut HashSet<String>) -> bool {
        if let Some(cached) = self.memo.get(item_id) {
            return *cached;
        }

        // 环: 当前链路上再次遇到
        if !visiting.insert(item_id.to_string()) {
            return false;
        }

        let catalog = self.catalog;
        let available = match catalog.get(item_id) {
            None => false,
            Some(item) if item.sold_out => false,
            Some(item) => item
                .depends_on
                .iter()
                .all(|dep| self.resolve(dep, visiting)),
        };

        visiting.remove(item_id);
        self.memo.insert(item_id.to_string(), available);
        available
    }
}
