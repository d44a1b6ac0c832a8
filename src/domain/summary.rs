// ==========================================
// 工程报价系统 - 报价汇总
// ==========================================
// 输出: Margin Cascade 计算结果（展示口径，金额取整）
// ==========================================

use serde::{Deserialize, Serialize};

/// 实际参与计算的利润率（百分比，不取整）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedMargins {
    pub materials: f64,
    pub labor: f64,
    pub general: f64,
}

/// 报价汇总
///
/// 金额字段均四舍五入到整数货币单位；中间计算链不取整。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationSummary {
    pub cost_materials: i64,
    pub cost_labor: i64,
    pub sale_materials: i64,
    pub sale_labor: i64,
    pub net_subtotal: i64,
    pub final_total: i64,
    pub realized_profit: i64,
    pub margins: AppliedMargins,
    pub line_count: usize,
}
