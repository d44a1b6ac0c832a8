// ==========================================
// 工程报价系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接和API实例
// ==========================================

use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{CatalogApi, ImportApi, QuotationApi};
use crate::config::{ConfigManager, PricingConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::MarginCascadeCalculator;
use crate::importer::{ColumnSynonymResolver, MaterialImporterImpl};
use crate::repository::{LineItemRepository, MaterialRepository, QuotationRepository};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "COTIZADOR_DB";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 材料目录API
    pub catalog_api: Arc<CatalogApi>,

    /// 报价单API
    pub quotation_api: Arc<QuotationApi>,

    /// 目录导入API
    pub import_api: Arc<ImportApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并幂等建表
    /// 2. 从 config_kv 读取默认利润率与列名同义词
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn =
            open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;

        Self::from_connection(db_path, Arc::new(Mutex::new(conn)))
    }

    /// 从已初始化的共享连接构造，计价配置取自 config_kv
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> Result<Self, String> {
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));
        Self::with_pricing_config(db_path, conn, config_manager.clone(), config_manager.as_ref())
    }

    /// 使用指定的计价配置来源构造（测试与嵌入场景）
    pub fn with_pricing_config(
        db_path: String,
        conn: Arc<Mutex<Connection>>,
        config_manager: Arc<ConfigManager>,
        pricing: &dyn PricingConfigReader,
    ) -> Result<Self, String> {
        // ==========================================
        // 配置
        // ==========================================
        let margins = pricing
            .get_margin_defaults()
            .map_err(|e| format!("读取默认利润率失败: {}", e))?;
        let synonyms = pricing
            .get_column_synonyms()
            .map_err(|e| format!("读取列名同义词失败: {}", e))?;
        tracing::debug!(?margins, "默认利润率已加载");

        // ==========================================
        // Repository层
        // ==========================================
        let material_repo = Arc::new(MaterialRepository::from_connection(conn.clone()));
        let quotation_repo = Arc::new(QuotationRepository::new(conn.clone()));
        let line_item_repo = Arc::new(LineItemRepository::new(conn));

        // ==========================================
        // API层
        // ==========================================
        let catalog_api = Arc::new(CatalogApi::new(material_repo.clone()));
        let quotation_api = Arc::new(QuotationApi::new(
            quotation_repo,
            line_item_repo,
            material_repo.clone(),
            MarginCascadeCalculator::new(margins),
        ));
        let importer = MaterialImporterImpl::with_resolver(
            material_repo,
            Box::new(ColumnSynonymResolver::new(synonyms)),
        );
        let import_api = Arc::new(ImportApi::new(importer));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            catalog_api,
            quotation_api,
            import_api,
            config_manager,
        })
    }
}

/// 默认数据库路径
///
/// 优先级: COTIZADOR_DB 环境变量 > 用户数据目录/cotizador/cotizador.db > ./cotizador.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./cotizador.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("cotizador");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("cotizador.db");
        }
    }

    path.to_string_lossy().to_string()
}
