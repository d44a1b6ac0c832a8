// ==========================================
// 工程报价系统 - API 层
// ==========================================
// 职责: 对外业务接口（HTTP/桌面外壳调用的边界）
// ==========================================

pub mod catalog_api;
pub mod error;
pub mod import_api;
pub mod quotation_api;

// 重导出核心类型
pub use catalog_api::CatalogApi;
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse};
pub use quotation_api::{QuotationApi, QuotationDetail};
