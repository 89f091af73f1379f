// ==========================================
// 餐饮出品编排系统 - 目录映射器
// ==========================================
// 职责: 外部商品编码/名称 → 内部品项ID
// 顺序: 别名表(编码) → 别名表(名称) → 目录按ID查询 → 目录按名称查询
// 说明: 去重后并发查询外部目录
// ==========================================

use crate::engine::catalog::CatalogLookup;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::order_importer_trait::ForeignOrderRow;
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// 映射键（编码, 名称）
type MappingKey = (Option<String>, Option<String>);

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

pub struct CatalogMapper {
    /// 外部编码/名称（小写）→ 内部品项ID
    aliases: HashMap<String, String>,
    lookup: Arc<dyn CatalogLookup>,
}

impl CatalogMapper {
    pub fn new(lookup: Arc<dyn CatalogLookup>) -> Self {
        Self {
            aliases: HashMap::new(),
            lookup,
        }
    }

    /// 添加别名（外部编码或名称 → 内部品项ID）
    pub fn with_alias(mut self, foreign: &str, item_id: &str) -> Self {
        self.aliases.insert(normalize(foreign), item_id.to_string());
        self
    }

    pub fn with_aliases(mut self, aliases: HashMap<String, String>) -> Self {
        for (foreign, item_id) in aliases {
            self.aliases.insert(normalize(&foreign), item_id);
        }
        self
    }

    fn alias_for(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| self.aliases.get(&normalize(v)).cloned())
    }

    async fn resolve_one(&self, key: &MappingKey) -> ImportResult<Option<String>> {
        let (code, name) = key;
        if let Some(item_id) = self
            .alias_for(code.as_deref())
            .or_else(|| self.alias_for(name.as_deref()))
        {
            return Ok(Some(item_id));
        }

        if let Some(code) = code {
            let found = self
                .lookup
                .lookup(code.trim())
                .await
                .map_err(|e| ImportError::CatalogLookupError(e.to_string()))?;
            if let Some(item) = found {
                return Ok(Some(item.item_id));
            }
        }
        if let Some(name) = name {
            let found = self
                .lookup
                .lookup_by_name(name)
                .await
                .map_err(|e| ImportError::CatalogLookupError(e.to_string()))?;
            if let Some(item) = found {
                return Ok(Some(item.item_id));
            }
        }
        Ok(None)
    }

    /// 批量映射
    ///
    /// # 返回
    /// 行号 → 内部品项ID（None 表示无法映射）
    pub async fn resolve(&self, rows: &[ForeignOrderRow]) -> ImportResult<HashMap<usize, Option<String>>> {
        let keys: BTreeSet<MappingKey> = rows
            .iter()
            .map(|r| (r.foreign_code.clone(), r.foreign_name.clone()))
            .collect();
        let keys: Vec<MappingKey> = keys.into_iter().collect();

        let results = join_all(keys.iter().map(|key| self.resolve_one(key))).await;
        let mut resolved: HashMap<MappingKey, Option<String>> = HashMap::new();
        for (key, result) in keys.into_iter().zip(results) {
            resolved.insert(key, result?);
        }
        debug!(unique_keys = resolved.len(), rows = rows.len(), "目录映射完成");

        Ok(rows
            .iter()
            .map(|r| {
                let key = (r.foreign_code.clone(), r.foreign_name.clone());
                (r.row_number, resolved.get(&key).cloned().flatten())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::CatalogItem;
    use crate::domain::types::PrepKind;
    use crate::engine::catalog::Catalog;

    fn foreign(row_number: usize, code: Option<&str>, name: Option<&str>) -> ForeignOrderRow {
        ForeignOrderRow {
            row_number,
            order_ref: "A".to_string(),
            created_at: None,
            service_mode: None,
            foreign_code: code.map(|s| s.to_string()),
            foreign_name: name.map(|s| s.to_string()),
            quantity: 1,
            box_label: None,
            note: None,
        }
    }

    fn catalog() -> Arc<dyn CatalogLookup> {
        Arc::new(Catalog::new(vec![
            CatalogItem::new("noodle-beef", "noodle", PrepKind::Noodle, 240).with_name("牛肉面"),
            CatalogItem::new("gz-pork", "griddle", PrepKind::Griddle, 420),
        ]))
    }

    #[tokio::test]
    async fn test_resolve_by_alias_id_and_name() {
        let mapper = CatalogMapper::new(catalog()).with_alias("POS-101", "gz-pork");
        let rows = vec![
            foreign(1, Some("POS-101"), None),
            foreign(2, Some("noodle-beef"), None),
            foreign(3, None, Some(" 牛肉面 ")),
            foreign(4, Some("UNKNOWN"), Some("神秘菜")),
        ];

        let resolved = mapper.resolve(&rows).await.unwrap();
        assert_eq!(resolved[&1].as_deref(), Some("gz-pork"));
        assert_eq!(resolved[&2].as_deref(), Some("noodle-beef"));
        assert_eq!(resolved[&3].as_deref(), Some("noodle-beef"));
        assert_eq!(resolved[&4], None);
    }
}
