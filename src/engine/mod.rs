// ==========================================
// 工程报价系统 - 引擎层
// ==========================================
// 职责: 计价规则（价格快照、利润率级联）
// 红线: Engine 不拼 SQL，纯函数，无共享可变状态
// ==========================================

pub mod error;
pub mod margin_cascade;
pub mod price_snapshot;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use margin_cascade::{
    compute_summary, round_currency, CascadeBreakdown, MarginCascadeCalculator,
};
pub use price_snapshot::{validate_quantity, PriceSnapshotCapture};
