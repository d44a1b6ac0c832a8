// ==========================================
// 工程报价系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把下层错误归入对外的错误分类
// 分类: 校验失败 / 引用完整性 / 未找到 / 存储故障（均不重试）
// ==========================================

use crate::engine::EngineError;
use crate::i18n::t_with_args;
use crate::importer::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;
use tracing::error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 调用方错误（4xx，不产生部分写入）
    // ==========================================
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    /// 材料仍被报价明细引用，拒绝删除
    #[error("引用完整性违反: {entity}(id={id}) 仍被 {referenced_by} 条报价明细引用")]
    ReferentialIntegrityViolation {
        entity: String,
        id: String,
        referenced_by: i64,
    },

    #[error("资源未找到: {entity}(id={id})")]
    NotFound { entity: String, id: String },

    // ==========================================
    // 导入错误（文件级）
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 服务端错误（5xx，对外不透明）
    // ==========================================
    #[error("存储故障: {0}")]
    StorageFault(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// HTTP 等价状态码
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::ValidationError(_) | ApiError::ImportError(_) => 400,
            ApiError::NotFound { .. } => 404,
            ApiError::ReferentialIntegrityViolation { .. } => 409,
            ApiError::StorageFault(_) | ApiError::InternalError(_) | ApiError::Other(_) => 500,
        }
    }

    /// 面向操作员的本地化文案（存储故障不暴露细节）
    pub fn user_message(&self) -> String {
        match self {
            ApiError::ValidationError(detail) => {
                t_with_args("error.validation", &[("detail", detail.as_str())])
            }
            ApiError::ReferentialIntegrityViolation { referenced_by, .. } => {
                let count = referenced_by.to_string();
                t_with_args("error.referential_integrity", &[("count", count.as_str())])
            }
            ApiError::NotFound { entity, id } => t_with_args(
                "error.not_found",
                &[("entity", entity.as_str()), ("id", id.as_str())],
            ),
            ApiError::ImportError(detail) => {
                t_with_args("error.import", &[("detail", detail.as_str())])
            }
            ApiError::StorageFault(_) | ApiError::InternalError(_) | ApiError::Other(_) => {
                t_with_args("error.storage", &[])
            }
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            RepositoryError::ReferentialIntegrityViolation {
                entity,
                id,
                referenced_by,
            } => ApiError::ReferentialIntegrityViolation {
                entity,
                id,
                referenced_by,
            },
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),

            // 明细引用不存在的报价单/材料
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("引用的记录不存在: {}", msg))
            }
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("唯一约束违反: {}", msg))
            }

            // 存储故障：在转换点记录，不吞掉
            RepositoryError::LockError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => {
                error!(error = %msg, "存储故障");
                ApiError::StorageFault(msg)
            }
            RepositoryError::InternalError(msg) => {
                error!(error = %msg, "仓储内部错误");
                ApiError::InternalError(msg)
            }
            RepositoryError::Other(err) => {
                error!(error = %err, "仓储未分类错误");
                ApiError::Other(err)
            }
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::DatabaseError(msg) => {
                error!(error = %msg, "导入落库故障");
                ApiError::StorageFault(msg)
            }
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(err) => ApiError::Other(err),
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
    fn test_status_codes() {
        assert_eq!(ApiError::ValidationError("x".into()).status_code(), 400);
        assert_eq!(
            ApiError::NotFound {
                entity: "Quotation".into(),
                id: "q1".into()
            }
            .status_code(),
            404
        );
        assert_eq!(
            ApiError::ReferentialIntegrityViolation {
                entity: "Material".into(),
                id: "m1".into(),
                referenced_by: 2
            }
            .status_code(),
            409
        );
        assert_eq!(ApiError::StorageFault("disk".into()).status_code(), 500);
    }

    #[test]
    fn test_repository_error_mapping() {
        let err: ApiError = RepositoryError::not_found("Material", "m1").into();
        assert!(matches!(err, ApiError::NotFound { ref id, .. } if id == "m1"));

        let err: ApiError = RepositoryError::ReferentialIntegrityViolation {
            entity: "Material".into(),
            id: "m1".into(),
            referenced_by: 3,
        }
        .into();
        assert!(matches!(
            err,
            ApiError::ReferentialIntegrityViolation { referenced_by: 3, .. }
        ));

        let err: ApiError = RepositoryError::DatabaseQueryError("disk I/O".into()).into();
        assert!(matches!(err, ApiError::StorageFault(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_engine_error_is_validation() {
        let err: ApiError = EngineError::InvalidQuantity(-1.0).into();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_import_error_mapping() {
        let err: ApiError = ImportError::UnsupportedFormat("pdf".into()).into();
        assert!(matches!(err, ApiError::ImportError(_)));

        let err: ApiError = ImportError::DatabaseError("locked".into()).into();
        assert!(matches!(err, ApiError::StorageFault(_)));
    }
}
