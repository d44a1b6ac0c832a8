// ==========================================
// 工程报价系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键必须逐连接开启）
// - 统一 busy_timeout
// - 幂等建表：materiales / cotizaciones / items_cotizacion / config_kv
// ==========================================

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Unicode 小写函数名（SQLite 内置 lower()/LIKE 只处理 ASCII）
pub const UNICODE_LOWER_FN: &str = "unicode_lower";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启，items_cotizacion 的引用完整性依赖它
/// - busy_timeout 需要“每个连接”单独配置
/// - unicode_lower 为连接级自定义函数，目录检索依赖它做大小写无关匹配
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    conn.create_scalar_function(
        UNICODE_LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|v| v.to_lowercase()))
        },
    )?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
///
/// 说明：
/// - items_cotizacion 对两张主表均为 ON DELETE RESTRICT；
///   删除报价单时由仓储层先删明细，删除材料时由仓储层先检查引用
/// - 三个利润率字段允许为 NULL，计算时回退到默认值
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS materiales (
            id TEXT PRIMARY KEY,
            nombre TEXT NOT NULL,
            marca TEXT NOT NULL,
            codigo_1 TEXT,
            codigo_2 TEXT,
            unidad TEXT NOT NULL,
            valor_int REAL NOT NULL,
            valor_normal REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_materiales_nombre ON materiales(nombre);
        CREATE INDEX IF NOT EXISTS idx_materiales_codigo_1 ON materiales(codigo_1);

        CREATE TABLE IF NOT EXISTS cotizaciones (
            id TEXT PRIMARY KEY,
            nombre_proyecto TEXT NOT NULL,
            cliente TEXT,
            valor_dia_mo REAL NOT NULL DEFAULT 0,
            dias_trabajados REAL NOT NULL DEFAULT 0,
            cantidad_personas REAL NOT NULL DEFAULT 0,
            margen_materiales REAL,
            margen_mo REAL,
            margen_general REAL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS items_cotizacion (
            id TEXT PRIMARY KEY,
            cotizacion_id TEXT NOT NULL REFERENCES cotizaciones(id) ON DELETE RESTRICT,
            material_id TEXT NOT NULL REFERENCES materiales(id) ON DELETE RESTRICT,
            cantidad REAL NOT NULL,
            precio_congelado REAL NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_items_cotizacion_cotizacion ON items_cotizacion(cotizacion_id);
        CREATE INDEX IF NOT EXISTS idx_items_cotizacion_material ON items_cotizacion(material_id);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_unicode_lower_registered() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        let lowered: String = conn
            .query_row("SELECT unicode_lower('CAÑERÍA Ø')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(lowered, "cañería ø");

        let null: Option<String> = conn
            .query_row("SELECT unicode_lower(NULL)", [], |row| row.get(0))
            .unwrap();
        assert!(null.is_none());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
