// ==========================================
// 餐饮出品编排系统 - 导入模块错误类型
// ==========================================
// 红线: 任一行无法映射到目录，整批不提交
// 工具: thiserror 派生宏
// ==========================================

use serde::Serialize;
use thiserror::Error;

/// 无法映射到目录的外部订单行（返回给人工处理）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmappedLine {
    pub row_number: usize,
    pub order_ref: String,
    pub foreign_code: Option<String>,
    pub foreign_name: Option<String>,
    pub reason: String,
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("文件无数据行")]
    EmptyFile,

    // ===== 数据映射错误 =====
    #[error("必填字段缺失 (行 {row}, 字段 {field})")]
    MissingField { row: usize, field: String },

    #[error("类型转换失败 (行 {row}, 字段 {field}): {message}")]
    TypeConversionError {
        row: usize,
        field: String,
        message: String,
    },

    #[error("同一订单的行信息冲突 (订单 {order_ref}, 行 {row}): {message}")]
    InconsistentOrder {
        order_ref: String,
        row: usize,
        message: String,
    },

    // ===== 目录映射 =====
    #[error("目录查询失败: {0}")]
    CatalogLookupError(String),

    #[error("存在 {} 行无法映射到目录，整批未提交", .0.len())]
    UnmappedLines(Vec<UnmappedLine>),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 无法映射的行（仅 UnmappedLines 有值）
    pub fn unmapped_lines(&self) -> &[UnmappedLine] {
        match self {
            ImportError::UnmappedLines(lines) => lines,
            _ => &[],
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
