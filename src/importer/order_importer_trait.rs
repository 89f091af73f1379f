// ==========================================
// 餐饮出品编排系统 - 订单导入 Trait 定义
// ==========================================
// 流程: 解析文件 → 字段映射 → 目录映射 → 组装订单 → (整批)提交
// 红线: 导入只产出提交载荷，不直接修改编排状态
// ==========================================

use crate::domain::order::OrderSubmission;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;

/// 原始行记录（列名 → 值）
pub type RawRow = HashMap<String, String>;

// ==========================================
// ForeignOrderRow - 外部订单行（映射中间结构）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignOrderRow {
    /// 文件内行号（从 1 开始，不含表头）
    pub row_number: usize,
    pub order_ref: String,
    pub created_at: Option<DateTime<Utc>>,
    pub service_mode: Option<String>,
    /// 外部商品编码
    pub foreign_code: Option<String>,
    /// 外部商品名称
    pub foreign_name: Option<String>,
    pub quantity: u32,
    /// 盒标签（有值则归入该盒，数量按只计）
    pub box_label: Option<String>,
    pub note: Option<String>,
}

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 行记录列表（跳过全空行）
    /// - Err: 文件读取错误、格式错误
    fn parse_to_raw_records(&self, file_path: &Path) -> Result<Vec<RawRow>, Box<dyn Error + Send + Sync>>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 实现者: OrderFieldMapper
pub trait FieldMapper: Send + Sync {
    /// 将原始行记录映射为外部订单行
    fn map_to_foreign_row(
        &self,
        row: RawRow,
        row_number: usize,
    ) -> Result<ForeignOrderRow, Box<dyn Error + Send + Sync>>;
}

// ==========================================
// ImportOutcome - 导入结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub batch_id: String,
    /// 按订单号首次出现顺序排列
    pub submissions: Vec<OrderSubmission>,
    pub total_rows: usize,
}

// ==========================================
// OrderImporter Trait - 导入流程编排
// ==========================================
// 实现者: OrderImporterImpl
#[async_trait]
pub trait OrderImporter: Send + Sync {
    /// 从文件产出整批提交载荷
    ///
    /// # 参数
    /// - file_path: .csv / .xlsx / .xls
    /// - default_created_at: 行内缺少下单时间时使用
    ///
    /// # 返回
    /// - Err(ImportError::UnmappedLines): 任一行无法映射，整批不产出
    async fn import_file(
        &self,
        file_path: &Path,
        default_created_at: DateTime<Utc>,
    ) -> ImportResult<ImportOutcome>;
}
