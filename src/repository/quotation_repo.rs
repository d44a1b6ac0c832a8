// ==========================================
// 工程报价系统 - 报价单仓储
// ==========================================
// 职责: 管理 cotizaciones 表
// 红线: 删除报价单必须先删除其全部明细，再删除报价单行
// ==========================================

use crate::domain::quotation::{NewQuotation, Quotation};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::parse_timestamp;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const QUOTATION_COLUMNS: &str = r#"
    id, nombre_proyecto, cliente, valor_dia_mo, dias_trabajados, cantidad_personas,
    margen_materiales, margen_mo, margen_general, created_at
"#;

// ==========================================
// QuotationRepository - 报价单仓储
// ==========================================
pub struct QuotationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl QuotationRepository {
    /// 创建新的 QuotationRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建报价单
    ///
    /// # 返回
    /// - `Ok(id)`: 新报价单 id
    pub fn insert(&self, quotation: &NewQuotation) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let id = Uuid::new_v4().to_string();

        conn.execute(
            r#"INSERT INTO cotizaciones (
                id, nombre_proyecto, cliente, valor_dia_mo, dias_trabajados, cantidad_personas,
                margen_materiales, margen_mo, margen_general, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
            params![
                id,
                quotation.nombre_proyecto,
                quotation.cliente,
                quotation.valor_dia_mo,
                quotation.dias_trabajados,
                quotation.cantidad_personas,
                quotation.margen_materiales,
                quotation.margen_mo,
                quotation.margen_general,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(id)
    }

    /// 按 id 查询报价单
    ///
    /// # 返回
    /// - `Ok(Some(Quotation))`: 找到
    /// - `Ok(None)`: 未找到
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Quotation>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM cotizaciones WHERE id = ?1", QUOTATION_COLUMNS);

        match conn.query_row(&sql, params![id], map_quotation_row) {
            Ok(q) => Ok(Some(q)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按 id 查询报价单，不存在时返回 NotFound
    pub fn get(&self, id: &str) -> RepositoryResult<Quotation> {
        self.find_by_id(id)?
            .ok_or_else(|| RepositoryError::not_found("Quotation", id))
    }

    /// 查询所有报价单，按创建时间降序
    pub fn list_all(&self) -> RepositoryResult<Vec<Quotation>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM cotizaciones ORDER BY created_at DESC, id",
            QUOTATION_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let quotations = stmt
            .query_map([], map_quotation_row)?
            .collect::<Result<Vec<Quotation>, _>>()?;

        Ok(quotations)
    }

    /// 删除报价单（先删明细，再删报价单行）
    ///
    /// # 返回
    /// - `Ok(n)`: 删除成功，n 为级联删除的明细数
    /// - `Err(NotFound)`: 报价单不存在（不做任何删除）
    pub fn delete(&self, id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let exists: i64 = tx.query_row(
            "SELECT COUNT(*) FROM cotizaciones WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepositoryError::not_found("Quotation", id));
        }

        let items_deleted = tx.execute(
            "DELETE FROM items_cotizacion WHERE cotizacion_id = ?1",
            params![id],
        )?;
        tx.execute("DELETE FROM cotizaciones WHERE id = ?1", params![id])?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(items_deleted)
    }
}

/// 映射数据库行到 Quotation
fn map_quotation_row(row: &rusqlite::Row) -> rusqlite::Result<Quotation> {
    Ok(Quotation {
        id: row.get(0)?,
        nombre_proyecto: row.get(1)?,
        cliente: row.get(2)?,
        valor_dia_mo: row.get(3)?,
        dias_trabajados: row.get(4)?,
        cantidad_personas: row.get(5)?,
        margen_materiales: row.get(6)?,
        margen_mo: row.get(7)?,
        margen_general: row.get(8)?,
        created_at: parse_timestamp(row, 9)?,
    })
}
