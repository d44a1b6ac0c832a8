// ==========================================
// 工程报价系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 材料目录 + 报价单 + 三级利润率计算
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "es");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与值对象
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 计价规则
pub mod engine;

// 导入层 - 价目表导入
pub mod importer;

// 配置层 - 默认利润率 / 列名同义词
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    AppliedMargins, ImportReport, LineItem, LineItemView, Material, NewMaterial, NewQuotation,
    Quotation, QuotationSummary, RowResolution,
};

// 引擎
pub use engine::{MarginCascadeCalculator, PriceSnapshotCapture};

// 导入
pub use importer::{resolve_import_row, ColumnSynonymResolver};

// API
pub use api::{ApiError, ApiResult, CatalogApi, ImportApi, QuotationApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Cotizador";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
