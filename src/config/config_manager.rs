// ==========================================
// 工程报价系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (scope_id + key → value)
// ==========================================

use crate::config::pricing_config::{ColumnSynonyms, MarginDefaults, PricingConfigReader};
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// 配置键
pub mod config_keys {
    pub const MARGIN_DEFAULT_MATERIALS: &str = "margin.default_materials";
    pub const MARGIN_DEFAULT_LABOR: &str = "margin.default_labor";
    pub const MARGIN_DEFAULT_GENERAL: &str = "margin.default_general";
    pub const IMPORT_COLUMN_SYNONYMS: &str = "import.column_synonyms";
}

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;

        Ok(())
    }

    /// 读取数值配置；缺失或无法解析时返回默认值
    fn get_f64_or_default(&self, key: &str, default: f64) -> Result<f64, Box<dyn Error>> {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => {
                    warn!(key = key, value = %raw, default = default, "配置值格式错误，使用默认值");
                    Ok(default)
                }
            },
        }
    }
}

impl PricingConfigReader for ConfigManager {
    fn get_margin_defaults(&self) -> Result<MarginDefaults, Box<dyn Error>> {
        let fallback = MarginDefaults::default();
        Ok(MarginDefaults {
            materials: self
                .get_f64_or_default(config_keys::MARGIN_DEFAULT_MATERIALS, fallback.materials)?,
            labor: self.get_f64_or_default(config_keys::MARGIN_DEFAULT_LABOR, fallback.labor)?,
            general: self
                .get_f64_or_default(config_keys::MARGIN_DEFAULT_GENERAL, fallback.general)?,
        })
    }

    fn get_column_synonyms(&self) -> Result<ColumnSynonyms, Box<dyn Error>> {
        match self.get_global_config_value(config_keys::IMPORT_COLUMN_SYNONYMS)? {
            None => Ok(ColumnSynonyms::default()),
            Some(raw) => match serde_json::from_str::<ColumnSynonyms>(&raw) {
                Ok(synonyms) => Ok(synonyms),
                Err(e) => {
                    warn!(error = %e, "列名同义词配置无法解析，使用默认同义词表");
                    Ok(ColumnSynonyms::default())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_empty_table_yields_defaults() {
        let cm = manager();
        assert_eq!(cm.get_margin_defaults().unwrap(), MarginDefaults::default());
        assert_eq!(cm.get_column_synonyms().unwrap(), ColumnSynonyms::default());
    }

    #[test]
    fn test_margin_override() {
        let cm = manager();
        cm.set_global_config_value(config_keys::MARGIN_DEFAULT_GENERAL, "30")
            .unwrap();
        cm.set_global_config_value(config_keys::MARGIN_DEFAULT_LABOR, "abc")
            .unwrap();

        let d = cm.get_margin_defaults().unwrap();
        assert_eq!(d.general, 30.0);
        assert_eq!(d.labor, 25.0);
        assert_eq!(d.materials, 18.0);
    }

    #[test]
    fn test_synonym_override() {
        let cm = manager();
        cm.set_global_config_value(
            config_keys::IMPORT_COLUMN_SYNONYMS,
            r#"{"valor_int":["Costo","valor_int"]}"#,
        )
        .unwrap();

        let s = cm.get_column_synonyms().unwrap();
        assert_eq!(s.valor_int, vec!["Costo".to_string(), "valor_int".to_string()]);
        assert_eq!(s.nombre, ColumnSynonyms::default().nombre);
    }
}
