//! 可空外键认领原语
//!
//! "先写者胜"：在行锁下读取可空列，仅当其为 NULL 时写入候选值（compare-and-swap）。
//! 并发认领同一行时，后到的事务会阻塞在 `FOR UPDATE` 上，等前者提交后读到非空值。

use cpq_errors::{AppError, AppResult};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::map_sqlx_error;

/// 认领结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// 本事务写入了候选值
    Claimed(i64),
    /// 已被其他值持有，未做修改
    AlreadyHeld(i64),
}

impl ClaimOutcome {
    pub fn holder(&self) -> i64 {
        match self {
            ClaimOutcome::Claimed(v) | ClaimOutcome::AlreadyHeld(v) => *v,
        }
    }

    pub fn is_claimed(&self) -> bool {
        matches!(self, ClaimOutcome::Claimed(_))
    }
}

/// 针对某张表某个可空 BIGINT 列的认领描述
///
/// 表名和列名必须是编译期常量，值全部通过绑定参数传入。
#[derive(Debug, Clone, Copy)]
pub struct NullableClaim {
    table: &'static str,
    key_column: &'static str,
    tenant_column: &'static str,
    claim_column: &'static str,
}

impl NullableClaim {
    pub const fn new(
        table: &'static str,
        key_column: &'static str,
        tenant_column: &'static str,
        claim_column: &'static str,
    ) -> Self {
        Self {
            table,
            key_column,
            tenant_column,
            claim_column,
        }
    }

    fn lock_sql(&self) -> String {
        format!(
            "SELECT {claim} FROM {table} WHERE {key} = $1 AND {tenant} = $2 FOR UPDATE",
            claim = self.claim_column,
            table = self.table,
            key = self.key_column,
            tenant = self.tenant_column,
        )
    }

    fn claim_sql(&self) -> String {
        format!(
            "UPDATE {table} SET {claim} = $3 \
             WHERE {key} = $1 AND {tenant} = $2 AND {claim} IS NULL \
             RETURNING {claim}",
            claim = self.claim_column,
            table = self.table,
            key = self.key_column,
            tenant = self.tenant_column,
        )
    }

    /// 加行锁读取当前持有者
    ///
    /// 行不存在返回 `None`；行存在返回 `Some(当前值)`。
    pub async fn lock(
        &self,
        conn: &mut PgConnection,
        key: i64,
        tenant_id: Uuid,
    ) -> AppResult<Option<Option<i64>>> {
        let row: Option<(Option<i64>,)> = sqlx::query_as(&self.lock_sql())
            .bind(key)
            .bind(tenant_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("lock claim row", e))?;

        Ok(row.map(|(holder,)| holder))
    }

    /// 在行锁下认领
    ///
    /// 必须在事务内调用，锁持有到事务结束。
    pub async fn claim(
        &self,
        conn: &mut PgConnection,
        key: i64,
        tenant_id: Uuid,
        candidate: i64,
    ) -> AppResult<ClaimOutcome> {
        match self.lock(conn, key, tenant_id).await? {
            None => Err(AppError::not_found(format!(
                "{} {} not found",
                self.table, key
            ))),
            Some(Some(holder)) => Ok(ClaimOutcome::AlreadyHeld(holder)),
            Some(None) => {
                let claimed: Option<(i64,)> = sqlx::query_as(&self.claim_sql())
                    .bind(key)
                    .bind(tenant_id)
                    .bind(candidate)
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(|e| map_sqlx_error("claim row", e))?;

                match claimed {
                    Some((holder,)) => Ok(ClaimOutcome::Claimed(holder)),
                    // 行锁已持有，NULL 不可能被并发改写
                    None => Err(AppError::internal(format!(
                        "claim on {} {} lost under row lock",
                        self.table, key
                    ))),
                }
            }
        }
    }
}
