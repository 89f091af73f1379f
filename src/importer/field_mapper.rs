// ==========================================
// 餐饮出品编排系统 - 字段映射器实现
// ==========================================
// 职责: 外部订单列 → 标准字段 + 类型转换
// 说明: 同一字段支持多个列名（中英文别名）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::order_importer_trait::{FieldMapper, ForeignOrderRow, RawRow};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::error::Error;

// ===== 标准字段 =====
const FIELD_ORDER_REF: &str = "订单号";
const FIELD_CREATED_AT: &str = "下单时间";
const FIELD_SERVICE_MODE: &str = "服务方式";
const FIELD_CODE: &str = "商品编码";
const FIELD_NAME: &str = "商品名称";
const FIELD_QUANTITY: &str = "数量";
const FIELD_BOX: &str = "盒号";
const FIELD_NOTE: &str = "备注";

pub struct OrderFieldMapper;

impl FieldMapper for OrderFieldMapper {
    fn map_to_foreign_row(
        &self,
        row: RawRow,
        row_number: usize,
    ) -> Result<ForeignOrderRow, Box<dyn Error + Send + Sync>> {
        let order_ref = self
            .get_string(&row, FIELD_ORDER_REF)
            .ok_or_else(|| ImportError::MissingField {
                row: row_number,
                field: FIELD_ORDER_REF.to_string(),
            })?;

        let foreign_code = self.get_string(&row, FIELD_CODE);
        let foreign_name = self.get_string(&row, FIELD_NAME);
        if foreign_code.is_none() && foreign_name.is_none() {
            return Err(Box::new(ImportError::MissingField {
                row: row_number,
                field: format!("{}/{}", FIELD_CODE, FIELD_NAME),
            }));
        }

        Ok(ForeignOrderRow {
            row_number,
            order_ref,
            created_at: self.parse_datetime(&row, FIELD_CREATED_AT, row_number)?,
            service_mode: self.get_string(&row, FIELD_SERVICE_MODE),
            foreign_code,
            foreign_name,
            quantity: self.parse_quantity(&row, row_number)?,
            box_label: self.get_string(&row, FIELD_BOX),
            note: self.get_string(&row, FIELD_NOTE),
        })
    }
}

impl OrderFieldMapper {
    /// 提取字符串字段，支持多个可能的列名（别名）
    fn get_string(&self, row: &RawRow, key: &str) -> Option<String> {
        let aliases: &[&str] = match key {
            FIELD_ORDER_REF => &["订单号", "order_id", "order_no", "单号"],
            FIELD_CREATED_AT => &["下单时间", "created_at", "order_time"],
            FIELD_SERVICE_MODE => &["服务方式", "service_mode", "就餐方式"],
            FIELD_CODE => &["商品编码", "sku", "item_code"],
            FIELD_NAME => &["商品名称", "item_name", "菜品"],
            FIELD_QUANTITY => &["数量", "quantity", "qty"],
            FIELD_BOX => &["盒号", "box", "box_label"],
            FIELD_NOTE => &["备注", "note", "remark"],
            _ => &[],
        };

        aliases
            .iter()
            .chain(std::iter::once(&key))
            .filter_map(|alias| row.get(*alias))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(|v| v.to_string())
    }

    /// 解析数量（必填，正整数）
    fn parse_quantity(&self, row: &RawRow, row_number: usize) -> ImportResult<u32> {
        let value = self
            .get_string(row, FIELD_QUANTITY)
            .ok_or_else(|| ImportError::MissingField {
                row: row_number,
                field: FIELD_QUANTITY.to_string(),
            })?;

        // Excel 数值单元格会带 ".0"
        let normalized = value.strip_suffix(".0").unwrap_or(&value);
        normalized
            .parse::<u32>()
            .map_err(|_| ImportError::TypeConversionError {
                row: row_number,
                field: FIELD_QUANTITY.to_string(),
                message: format!("无法解析为正整数: {}", value),
            })
    }

    /// 解析时间（RFC3339 或 `YYYY-MM-DD HH:MM:SS`，后者按 UTC）
    fn parse_datetime(
        &self,
        row: &RawRow,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<DateTime<Utc>>> {
        let Some(value) = self.get_string(row, key) else {
            return Ok(None);
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
            return Ok(Some(dt.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(&value, "%Y-%m-%d %H:%M:%S")
            .map(|naive| Some(naive.and_utc()))
            .map_err(|_| ImportError::TypeConversionError {
                row: row_number,
                field: key.to_string(),
                message: format!("无法解析为时间: {}", value),
            })
    }
}
