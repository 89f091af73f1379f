// ==========================================
// 餐饮出品编排系统 - 导入层
// ==========================================
// 职责: 外部订单文件 → 订单提交载荷
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod catalog_mapper;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod order_importer;
pub mod order_importer_trait;

// 重导出核心类型
pub use catalog_mapper::CatalogMapper;
pub use error::{ImportError, ImportResult, UnmappedLine};
pub use field_mapper::OrderFieldMapper;
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use order_importer::OrderImporterImpl;

// 重导出 Trait 接口
pub use order_importer_trait::{FieldMapper, FileParser, ForeignOrderRow, ImportOutcome, OrderImporter, RawRow};
