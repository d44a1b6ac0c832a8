// ==========================================
// 工程报价系统 - 材料目录仓储
// ==========================================
// 职责: 管理 materiales 表的 CRUD 操作
// 红线: 删除被报价明细引用的材料必须拒绝（不可静默忽略）
// ==========================================

use crate::db::UNICODE_LOWER_FN;
use crate::domain::material::{Material, NewMaterial};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::parse_timestamp;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// 目录检索默认返回上限
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

const MATERIAL_COLUMNS: &str = r#"
    id, nombre, marca, codigo_1, codigo_2, unidad,
    valor_int, valor_normal, created_at, updated_at
"#;

// ==========================================
// MaterialRepository - 材料目录仓储
// ==========================================
pub struct MaterialRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaterialRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入材料
    ///
    /// # 返回
    /// - Ok(String): 新材料 id
    pub fn insert(&self, material: &NewMaterial) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO materiales (
                id, nombre, marca, codigo_1, codigo_2, unidad,
                valor_int, valor_normal, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                id,
                material.nombre,
                material.marca,
                material.codigo_1,
                material.codigo_2,
                material.unidad,
                material.valor_int,
                material.valor_normal,
                now,
                now,
            ],
        )?;

        Ok(id)
    }

    /// 按 id 查询材料
    ///
    /// # 返回
    /// - Ok(Some(Material)): 找到记录
    /// - Ok(None): 未找到记录
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Material>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM materiales WHERE id = ?1", MATERIAL_COLUMNS);

        match conn.query_row(&sql, params![id], map_material_row) {
            Ok(material) => Ok(Some(material)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 检索材料（名称或编码1包含关键字，按 Unicode 不区分大小写）
    ///
    /// # 参数
    /// - filter: 关键字；空串返回全部（受 limit 限制）
    /// - limit: 返回上限
    pub fn search(&self, filter: &str, limit: usize) -> RepositoryResult<Vec<Material>> {
        let conn = self.get_conn()?;
        let pattern = format!("%{}%", escape_like(&filter.trim().to_lowercase()));
        let sql = format!(
            r#"
            SELECT {cols}
            FROM materiales
            WHERE {lower}(nombre) LIKE ?1 ESCAPE '\'
               OR {lower}(codigo_1) LIKE ?1 ESCAPE '\'
            ORDER BY nombre, id
            LIMIT ?2
            "#,
            cols = MATERIAL_COLUMNS,
            lower = UNICODE_LOWER_FN
        );

        let mut stmt = conn.prepare(&sql)?;
        let materials = stmt
            .query_map(params![pattern, limit as i64], map_material_row)?
            .collect::<Result<Vec<Material>, _>>()?;

        Ok(materials)
    }

    /// 更新材料价格（目录维护）
    ///
    /// 说明: 不触及任何报价明细的冻结价
    pub fn update_prices(&self, id: &str, valor_int: f64, valor_normal: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE materiales SET valor_int = ?1, valor_normal = ?2, updated_at = ?3 WHERE id = ?4",
            params![valor_int, valor_normal, Utc::now().to_rfc3339(), id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("Material", id));
        }
        Ok(())
    }

    /// 删除材料
    ///
    /// # 返回
    /// - Ok(()): 删除成功
    /// - Err(NotFound): 材料不存在
    /// - Err(ReferentialIntegrityViolation): 仍被报价明细引用，材料保持不变
    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let exists: i64 = tx.query_row(
            "SELECT COUNT(*) FROM materiales WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepositoryError::not_found("Material", id));
        }

        let referenced_by: i64 = tx.query_row(
            "SELECT COUNT(*) FROM items_cotizacion WHERE material_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if referenced_by > 0 {
            return Err(RepositoryError::ReferentialIntegrityViolation {
                entity: "Material".to_string(),
                id: id.to_string(),
                referenced_by,
            });
        }

        // 外键兜底：检查与删除之间若有新明细写入，由 RESTRICT 拦截
        tx.execute("DELETE FROM materiales WHERE id = ?1", params![id])
            .map_err(|e| match RepositoryError::from(e) {
                RepositoryError::ForeignKeyViolation(_) => {
                    RepositoryError::ReferentialIntegrityViolation {
                        entity: "Material".to_string(),
                        id: id.to_string(),
                        referenced_by: 1,
                    }
                }
                other => other,
            })?;

        tx.commit()?;
        Ok(())
    }
}

/// 映射数据库行到 Material
fn map_material_row(row: &rusqlite::Row) -> rusqlite::Result<Material> {
    Ok(Material {
        id: row.get(0)?,
        nombre: row.get(1)?,
        marca: row.get(2)?,
        codigo_1: row.get(3)?,
        codigo_2: row.get(4)?,
        unidad: row.get(5)?,
        valor_int: row.get(6)?,
        valor_normal: row.get(7)?,
        created_at: parse_timestamp(row, 8)?,
        updated_at: parse_timestamp(row, 9)?,
    })
}

/// 转义 LIKE 通配符，关键字按字面匹配
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
