// ==========================================
// 工程报价系统 - 配置层
// ==========================================
// 职责: 默认利润率、导入同义词表的加载与覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod pricing_config;

// 重导出
pub use config_manager::{config_keys, ConfigManager};
pub use pricing_config::{ColumnSynonyms, MarginDefaults, PricingConfigReader, StaticPricingConfig};
