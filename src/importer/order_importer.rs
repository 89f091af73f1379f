// ==========================================
// 餐饮出品编排系统 - 订单导入器实现
// ==========================================
// 流程: 解析 → 字段映射 → 目录映射 → 按订单号组装
// 红线: 任一行无法映射，整批不产出（返回 UnmappedLines 供人工处理）
// ==========================================

use crate::domain::order::{BoxRow, OrderBox, OrderLine, OrderSubmission};
use crate::domain::types::ServiceMode;
use crate::importer::catalog_mapper::CatalogMapper;
use crate::importer::error::{ImportError, ImportResult, UnmappedLine};
use crate::importer::order_importer_trait::{
    FieldMapper, FileParser, ForeignOrderRow, ImportOutcome, OrderImporter,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// 组件错误还原为 ImportError
fn into_import_error(err: Box<dyn Error + Send + Sync>) -> ImportError {
    match err.downcast::<ImportError>() {
        Ok(import_err) => *import_err,
        Err(other) => ImportError::InternalError(other.to_string()),
    }
}

// ==========================================
// OrderImporterImpl
// ==========================================
pub struct OrderImporterImpl {
    file_parser: Box<dyn FileParser>,
    field_mapper: Box<dyn FieldMapper>,
    catalog_mapper: CatalogMapper,
}

impl OrderImporterImpl {
    pub fn new(
        file_parser: Box<dyn FileParser>,
        field_mapper: Box<dyn FieldMapper>,
        catalog_mapper: CatalogMapper,
    ) -> Self {
        Self {
            file_parser,
            field_mapper,
            catalog_mapper,
        }
    }

    /// 行 → 外部订单行（遇到首个错误即返回）
    fn map_rows(&self, file_path: &Path) -> ImportResult<Vec<ForeignOrderRow>> {
        let records = self
            .file_parser
            .parse_to_raw_records(file_path)
            .map_err(into_import_error)?;
        if records.is_empty() {
            return Err(ImportError::EmptyFile);
        }

        records
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| {
                self.field_mapper
                    .map_to_foreign_row(raw, idx + 1)
                    .map_err(into_import_error)
            })
            .collect()
    }

    /// 按订单号分组（保持首次出现顺序）并组装提交载荷
    fn assemble(
        &self,
        rows: Vec<ForeignOrderRow>,
        item_ids: &HashMap<usize, String>,
        default_created_at: DateTime<Utc>,
    ) -> ImportResult<Vec<OrderSubmission>> {
        let mut order_refs: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<ForeignOrderRow>> = HashMap::new();
        for row in rows {
            if !groups.contains_key(&row.order_ref) {
                order_refs.push(row.order_ref.clone());
            }
            groups.entry(row.order_ref.clone()).or_default().push(row);
        }

        let mut submissions = Vec::with_capacity(order_refs.len());
        for order_ref in order_refs {
            let group = groups.remove(&order_ref).unwrap_or_default();
            submissions.push(Self::assemble_order(&order_ref, group, item_ids, default_created_at)?);
        }
        Ok(submissions)
    }

    fn assemble_order(
        order_ref: &str,
        rows: Vec<ForeignOrderRow>,
        item_ids: &HashMap<usize, String>,
        default_created_at: DateTime<Utc>,
    ) -> ImportResult<OrderSubmission> {
        let mut created_at: Option<DateTime<Utc>> = None;
        let mut service_mode: Option<ServiceMode> = None;
        let mut note: Option<String> = None;
        let mut lines: Vec<OrderLine> = Vec::new();
        let mut box_labels: Vec<String> = Vec::new();
        let mut box_rows: HashMap<String, Vec<BoxRow>> = HashMap::new();

        for row in rows {
            if let Some(ts) = row.created_at {
                match created_at {
                    Some(existing) if existing != ts => {
                        return Err(ImportError::InconsistentOrder {
                            order_ref: order_ref.to_string(),
                            row: row.row_number,
                            message: format!("下单时间不一致: {} / {}", existing, ts),
                        });
                    }
                    _ => created_at = Some(ts),
                }
            }

            if let Some(raw_mode) = row.service_mode.as_deref() {
                let mode = ServiceMode::parse(raw_mode).ok_or_else(|| ImportError::TypeConversionError {
                    row: row.row_number,
                    field: "服务方式".to_string(),
                    message: format!("无法识别: {}", raw_mode),
                })?;
                match service_mode {
                    Some(existing) if existing != mode => {
                        return Err(ImportError::InconsistentOrder {
                            order_ref: order_ref.to_string(),
                            row: row.row_number,
                            message: format!("服务方式不一致: {} / {}", existing, mode),
                        });
                    }
                    _ => service_mode = Some(mode),
                }
            }

            if note.is_none() {
                note = row.note.clone();
            }

            let item_id = item_ids.get(&row.row_number).cloned().ok_or_else(|| {
                ImportError::InternalError(format!("行 {} 缺少目录映射结果", row.row_number))
            })?;

            match row.box_label {
                Some(label) => {
                    if !box_rows.contains_key(&label) {
                        box_labels.push(label.clone());
                    }
                    box_rows
                        .entry(label)
                        .or_default()
                        .push(BoxRow::new(&item_id, row.quantity));
                }
                None => lines.push(OrderLine::new(&item_id, row.quantity)),
            }
        }

        let boxes = box_labels
            .into_iter()
            .map(|label| {
                let rows = box_rows.remove(&label).unwrap_or_default();
                OrderBox::new(Some(&label), rows)
            })
            .collect();

        Ok(OrderSubmission {
            order_id: order_ref.to_string(),
            created_at: created_at.unwrap_or(default_created_at),
            service_mode: service_mode.unwrap_or(ServiceMode::DineIn),
            lines,
            boxes,
            note,
        })
    }
}

#[async_trait]
impl OrderImporter for OrderImporterImpl {
    #[instrument(skip(self, file_path), fields(batch_id))]
    async fn import_file(
        &self,
        file_path: &Path,
        default_created_at: DateTime<Utc>,
    ) -> ImportResult<ImportOutcome> {
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(file_path = %file_path.display(), "开始导入订单文件");

        let rows = self.map_rows(file_path)?;
        let total_rows = rows.len();

        let resolved = self.catalog_mapper.resolve(&rows).await?;
        let mut item_ids: HashMap<usize, String> = HashMap::new();
        let mut unmapped: Vec<UnmappedLine> = Vec::new();
        for row in &rows {
            match resolved.get(&row.row_number).cloned().flatten() {
                Some(item_id) => {
                    item_ids.insert(row.row_number, item_id);
                }
                None => unmapped.push(UnmappedLine {
                    row_number: row.row_number,
                    order_ref: row.order_ref.clone(),
                    foreign_code: row.foreign_code.clone(),
                    foreign_name: row.foreign_name.clone(),
                    reason: "目录中无匹配品项".to_string(),
                }),
            }
        }

        if !unmapped.is_empty() {
            warn!(unmapped = unmapped.len(), total_rows, "存在无法映射的行，整批未提交");
            return Err(ImportError::UnmappedLines(unmapped));
        }

        let submissions = self.assemble(rows, &item_ids, default_created_at)?;
        info!(orders = submissions.len(), total_rows, "订单文件导入完成");

        Ok(ImportOutcome {
            batch_id,
            submissions,
            total_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::CatalogItem;
    use crate::domain::types::PrepKind;
    use crate::engine::catalog::Catalog;
    use crate::importer::field_mapper::OrderFieldMapper;
    use crate::importer::file_parser::UniversalFileParser;
    use chrono::TimeZone;
    use std::io::Write;
    use std::sync::Arc;

    fn importer() -> OrderImporterImpl {
        let catalog = Catalog::new(vec![
            CatalogItem::new("gz-pork", "potsticker", PrepKind::Griddle, 420).with_name("猪肉锅贴"),
            CatalogItem::new("noodle-beef", "noodle", PrepKind::Noodle, 240).with_name("牛肉面"),
        ]);
        OrderImporterImpl::new(
            Box::new(UniversalFileParser),
            Box::new(OrderFieldMapper),
            CatalogMapper::new(Arc::new(catalog)).with_alias("POS-GZ", "gz-pork"),
        )
    }

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_import_groups_rows_by_order() {
        let file = write_csv(
            "订单号,服务方式,商品编码,商品名称,数量,盒号\n\
             B,外卖,POS-GZ,,6,1\n\
             A,堂食,,牛肉面,1,\n\
             B,外卖,POS-GZ,,4,2\n\
             B,外卖,,牛肉面,2,\n",
        );
        let default_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let outcome = importer().import_file(file.path(), default_at).await.unwrap();
        assert_eq!(outcome.total_rows, 4);
        assert_eq!(outcome.submissions.len(), 2);

        let b = &outcome.submissions[0];
        assert_eq!(b.order_id, "B");
        assert_eq!(b.service_mode, ServiceMode::Delivery);
        assert_eq!(b.created_at, default_at);
        assert_eq!(b.boxes.len(), 2);
        assert_eq!(b.boxes[0].label.as_deref(), Some("1"));
        assert_eq!(b.boxes[0].rows, vec![BoxRow::new("gz-pork", 6)]);
        assert_eq!(b.lines, vec![OrderLine::new("noodle-beef", 2)]);

        assert_eq!(outcome.submissions[1].order_id, "A");
        assert_eq!(outcome.submissions[1].service_mode, ServiceMode::DineIn);
    }

    #[tokio::test]
    async fn test_unmapped_row_rejects_whole_batch() {
        let file = write_csv(
            "订单号,商品编码,商品名称,数量\n\
             A,POS-GZ,,6\n\
             A,POS-404,神秘菜,1\n",
        );

        let err = importer().import_file(file.path(), Utc::now()).await.unwrap_err();
        let unmapped = err.unmapped_lines();
        assert_eq!(unmapped.len(), 1);
        assert_eq!(unmapped[0].row_number, 2);
        assert_eq!(unmapped[0].foreign_code.as_deref(), Some("POS-404"));
    }

    #[tokio::test]
    async fn test_inconsistent_service_mode_rejected() {
        let file = write_csv(
            "订单号,服务方式,商品编码,数量\n\
             A,堂食,POS-GZ,6\n\
             A,外卖,POS-GZ,6\n",
        );

        let err = importer().import_file(file.path(), Utc::now()).await.unwrap_err();
        assert!(matches!(err, ImportError::InconsistentOrder { row: 2, .. }));
    }
}
