// ==========================================
// 工程报价系统 - 报价明细仓储
// ==========================================
// 职责: 管理 items_cotizacion 表
// 红线: precio_congelado 只在插入时写入，任何更新语句都不得触及
// ==========================================

use crate::domain::quotation::{LineItem, LineItemView};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::parse_timestamp;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// LineItemRepository - 报价明细仓储
// ==========================================
pub struct LineItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LineItemRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入明细（冻结价随记录一并写入）
    ///
    /// # 返回
    /// - `Ok(id)`: 明细 id
    /// - `Err(ForeignKeyViolation)`: 报价单或材料不存在
    pub fn insert(&self, item: &LineItem) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO items_cotizacion (
                id, cotizacion_id, material_id, cantidad, precio_congelado, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                item.id,
                item.cotizacion_id,
                item.material_id,
                item.cantidad,
                item.precio_congelado,
                item.created_at.to_rfc3339(),
            ],
        )?;

        Ok(item.id.clone())
    }

    /// 按 id 查询明细
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<LineItem>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT id, cotizacion_id, material_id, cantidad, precio_congelado, created_at
               FROM items_cotizacion
               WHERE id = ?1"#,
            params![id],
            map_line_item_row,
        ) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询报价单的全部明细（JOIN 材料展示字段），按加入顺序
    pub fn list_for_quotation(&self, cotizacion_id: &str) -> RepositoryResult<Vec<LineItemView>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT i.id, i.cotizacion_id, i.material_id, i.cantidad, i.precio_congelado, i.created_at,
                      m.nombre, m.marca, m.unidad, m.codigo_1
               FROM items_cotizacion i
               JOIN materiales m ON m.id = i.material_id
               WHERE i.cotizacion_id = ?1
               ORDER BY i.rowid"#,
        )?;

        let views = stmt
            .query_map(params![cotizacion_id], |row| {
                Ok(LineItemView {
                    item: map_line_item_row(row)?,
                    nombre: row.get(6)?,
                    marca: row.get(7)?,
                    unidad: row.get(8)?,
                    codigo_1: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<LineItemView>, _>>()?;

        Ok(views)
    }

    /// 修改数量（唯一允许的原地更新）
    pub fn update_quantity(&self, id: &str, cantidad: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE items_cotizacion SET cantidad = ?1 WHERE id = ?2",
            params![cantidad, id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("LineItem", id));
        }
        Ok(())
    }

    /// 删除单条明细
    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM items_cotizacion WHERE id = ?1", params![id])?;

        if affected == 0 {
            return Err(RepositoryError::not_found("LineItem", id));
        }
        Ok(())
    }
}

/// 映射数据库行到 LineItem（前 6 列）
fn map_line_item_row(row: &rusqlite::Row) -> rusqlite::Result<LineItem> {
    Ok(LineItem {
        id: row.get(0)?,
        cotizacion_id: row.get(1)?,
        material_id: row.get(2)?,
        cantidad: row.get(3)?,
        precio_congelado: row.get(4)?,
        created_at: parse_timestamp(row, 5)?,
    })
}
