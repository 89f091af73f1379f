// ==========================================
// 餐饮出品编排系统 - 目录查询
// ==========================================
// 职责: 品项ID → {品类, 标签, 出品方式, 时长}
// 说明: 目录编辑不在本系统范围内；外部目录通过 CatalogLookup 接入
// ==========================================

use crate::domain::catalog::CatalogItem;
use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;

// ==========================================
// CatalogLookup Trait - 外部目录接口
// ==========================================
// 实现者: Catalog（内存快照）或外部目录服务适配器
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// 按品项ID查询
    async fn lookup(&self, item_id: &str) -> Result<Option<CatalogItem>, Box<dyn Error + Send + Sync>>;

    /// 按外部名称查询（导入适配器映射用）
    async fn lookup_by_name(
        &self,
        name: &str,
    ) -> Result<Option<CatalogItem>, Box<dyn Error + Send + Sync>>;
}

// ==========================================
// Catalog - 目录内存快照
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: HashMap<String, CatalogItem>,
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items: items.into_iter().map(|i| (i.item_id.clone(), i)).collect(),
        }
    }

    pub fn get(&self, item_id: &str) -> Option<&CatalogItem> {
        self.items.get(item_id)
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.items.contains_key(item_id)
    }

    pub fn upsert(&mut self, item: CatalogItem) {
        self.items.insert(item.item_id.clone(), item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.values()
    }

    /// 名称匹配（忽略大小写与首尾空白）
    pub fn find_by_name(&self, name: &str) -> Option<&CatalogItem> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.items
            .values()
            .find(|i| i.name.trim().to_lowercase() == needle)
    }
}

#[async_trait]
impl CatalogLookup for Catalog {
    async fn lookup(&self, item_id: &str) -> Result<Option<CatalogItem>, Box<dyn Error + Send + Sync>> {
        Ok(self.get(item_id).cloned())
    }

    async fn lookup_by_name(
        &self,
        name: &str,
    ) -> Result<Option<CatalogItem>, Box<dyn Error + Send + Sync>> {
        Ok(self.find_by_name(name).cloned())
    }
}
