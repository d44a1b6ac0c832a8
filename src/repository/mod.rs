// ==========================================
// 工程报价系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod line_item_repo;
pub mod material_repo;
pub mod quotation_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use line_item_repo::LineItemRepository;
pub use material_repo::{MaterialRepository, DEFAULT_SEARCH_LIMIT};
pub use quotation_repo::QuotationRepository;

use chrono::{DateTime, Utc};

/// 解析 RFC 3339 时间戳列
pub(crate) fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
