// ==========================================
// 餐饮出品编排系统 - API层错误类型
// ==========================================
// 职责: 将引擎/仓储/导入错误转换为前端可读的错误消息
// 红线: 所有错误信息必须包含显式原因
// ==========================================

use crate::engine::error::OrchestratorError;
use crate::importer::error::{ImportError, UnmappedLine};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效的状态转换: entity={entity}, from={from}, to={to}")]
    InvalidStateTransition {
        entity: String,
        from: String,
        to: String,
    },

    /// 需要连续点按确认（剩余次数）
    #[error("需要再点按{remaining}次确认: {action}")]
    ConfirmationPending { action: String, remaining: u32 },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("存在 {} 行无法映射到目录，整批未提交", .0.len())]
    UnmappedLines(Vec<UnmappedLine>),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 OrchestratorError 转换
// ==========================================
impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::OrderNotFound(_)
            | OrchestratorError::StationNotFound(_)
            | OrchestratorError::TaskNotFound(_)
            | OrchestratorError::ChecklistItemNotFound { .. } => ApiError::NotFound(err.to_string()),

            OrchestratorError::InvalidOrder { .. }
            | OrchestratorError::UnknownItem { .. }
            | OrchestratorError::SlotOutOfRange { .. }
            | OrchestratorError::SlotRequired { .. }
            | OrchestratorError::InvalidCaptureTarget { .. } => ApiError::InvalidInput(err.to_string()),

            OrchestratorError::InvalidStateTransition { entity, from, to } => {
                ApiError::InvalidStateTransition { entity, from, to }
            }

            OrchestratorError::InvalidConfig(msg) => ApiError::ConfigError(msg),

            _ => ApiError::BusinessRuleViolation(err.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::UnmappedLines(lines) => ApiError::UnmappedLines(lines),
            ImportError::FileNotFound(path) => ApiError::NotFound(format!("文件不存在: {}", path)),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestrator_error_conversion() {
        let api_err: ApiError = OrchestratorError::OrderNotFound("A".to_string()).into();
        assert!(matches!(api_err, ApiError::NotFound(ref msg) if msg.contains("A")));

        let api_err: ApiError = OrchestratorError::AlreadyLocked {
            station_id: "G1".to_string(),
        }
        .into();
        assert!(matches!(api_err, ApiError::BusinessRuleViolation(_)));

        let api_err: ApiError = OrchestratorError::InvalidStateTransition {
            entity: "G1".to_string(),
            from: "IDLE".to_string(),
            to: "FRYING".to_string(),
        }
        .into();
        match api_err {
            ApiError::InvalidStateTransition { entity, .. } => assert_eq!(entity, "G1"),
            _ => panic!("Expected InvalidStateTransition"),
        }
    }

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "OrderArchive".to_string(),
            id: "A001".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("OrderArchive"));
                assert!(msg.contains("A001"));
            }
            _ => panic!("Expected NotFound"),
        }
    }

    #[test]
    fn test_unmapped_lines_preserved() {
        let import_err = ImportError::UnmappedLines(vec![UnmappedLine {
            row_number: 2,
            order_ref: "A".to_string(),
            foreign_code: Some("X".to_string()),
            foreign_name: None,
            reason: "目录中无匹配品项".to_string(),
        }]);
        let api_err: ApiError = import_err.into();
        match api_err {
            ApiError::UnmappedLines(lines) => assert_eq!(lines[0].row_number, 2),
            _ => panic!("Expected UnmappedLines"),
        }
    }
}
