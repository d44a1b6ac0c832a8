// ==========================================
// 工程报价系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与值对象
// 红线: 不含数据访问逻辑,不含计算逻辑
// ==========================================

pub mod import;
pub mod material;
pub mod quotation;
pub mod summary;

// 重导出核心类型
pub use import::{ImportReport, RowError, RowResolution, SkipReason};
pub use material::{Material, NewMaterial, DEFAULT_BRAND, DEFAULT_UNIT};
pub use quotation::{LineItem, LineItemView, NewQuotation, Quotation};
pub use summary::{AppliedMargins, QuotationSummary};
