//! 数据库错误映射工具
//!
//! 提供统一的 SQLx 错误到 AppError 的转换

use cpq_errors::AppError;

/// PostgreSQL 唯一约束冲突
pub const UNIQUE_VIOLATION: &str = "23505";

/// 将 SQLx 错误转换为 AppError，区分不同错误类型
///
/// `context` 描述失败的操作，会进入错误信息（仅日志可见）。
pub fn map_sqlx_error(context: &str, e: sqlx::Error) -> AppError {
    if is_unique_violation(&e) {
        return AppError::conflict(format!("{}: duplicate entry violates unique constraint", context));
    }

    match e {
        sqlx::Error::RowNotFound => AppError::not_found(format!("{}: record not found", context)),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23503") => {
                AppError::validation(format!("{}: foreign key constraint violation", context))
            }
            Some("23514") => AppError::validation(format!("{}: check constraint violation", context)),
            Some("23502") => {
                AppError::validation(format!("{}: not null constraint violation", context))
            }
            Some(code) => AppError::database(format!("{} ({}): {}", context, code, db_err)),
            None => AppError::database(format!("{}: {}", context, db_err)),
        },
        sqlx::Error::PoolTimedOut => {
            AppError::internal(format!("{}: database connection pool timeout", context))
        }
        sqlx::Error::PoolClosed => {
            AppError::internal(format!("{}: database connection pool is closed", context))
        }
        other => AppError::database(format!("{}: {}", context, other)),
    }
}

/// 判断是否为唯一约束冲突
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION))
}
