// ==========================================
// 矿山设备车队决策支持系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为用户友好的错误消息
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 过滤条件未匹配到任何设备时的提示
pub const NO_DATA_FOR_FILTER: &str = "Данных по выбранному фильтру не найдено";

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 过滤条件无匹配设备
    pub fn no_data_for_filter() -> Self {
        ApiError::NotFound(NO_DATA_FOR_FILTER.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
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
            RepositoryError::InvalidValue { field, message } => {
                ApiError::DatabaseError(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_message() {
        let err = ApiError::no_data_for_filter();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), NO_DATA_FOR_FILTER);
    }

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "Machine".to_string(),
            id: "42".to_string(),
        };
        match ApiError::from(repo_err) {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Machine"));
                assert!(msg.contains("42"));
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let repo_err = RepositoryError::LockError("poisoned".to_string());
        assert!(matches!(
            ApiError::from(repo_err),
            ApiError::DatabaseConnectionError(_)
        ));

        let repo_err = RepositoryError::InvalidValue {
            field: "date_period".to_string(),
            message: "bad".to_string(),
        };
        match ApiError::from(repo_err) {
            ApiError::DatabaseError(msg) => assert!(msg.contains("date_period")),
            other => panic!("Expected DatabaseError, got {:?}", other),
        }
    }
}
