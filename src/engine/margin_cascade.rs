// ==========================================
// 工程报价系统 - 三级利润率计算引擎
// ==========================================
// 输入: 报价单参数 + 明细冻结价
// 输出: 成本 / 售价 / 利润汇总
// ==========================================
// 计算顺序（固定，不可调换）:
// 1. 材料直接成本 = Σ 冻结价 × 数量
// 2. 人工直接成本 = 日单价 × 天数 × 人数
// 3. 材料售价 = 材料成本 × (1 + 材料利润率/100)
// 4. 人工售价 = 人工成本 × (1 + 人工利润率/100)
// 5. 净小计 = 材料售价 + 人工售价
// 6. 总价 = 净小计 × (1 + 总体利润率/100)   ← 在已加价小计上再加价
// 7. 实现利润 = 总价 − (材料成本 + 人工成本)
// ==========================================

use crate::config::MarginDefaults;
use crate::domain::quotation::{LineItem, Quotation};
use crate::domain::summary::{AppliedMargins, QuotationSummary};

// ==========================================
// CascadeBreakdown - 未取整的中间计算链
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeBreakdown {
    pub direct_materials_cost: f64,
    pub direct_labor_cost: f64,
    pub sale_materials: f64,
    pub sale_labor: f64,
    pub net_subtotal: f64,
    pub final_total: f64,
    pub realized_profit: f64,
    pub margins: AppliedMargins,
    pub line_count: usize,
}

impl CascadeBreakdown {
    /// 转为展示口径（金额四舍五入到整数，利润率原样回显）
    pub fn to_summary(&self) -> QuotationSummary {
        QuotationSummary {
            cost_materials: round_currency(self.direct_materials_cost),
            cost_labor: round_currency(self.direct_labor_cost),
            sale_materials: round_currency(self.sale_materials),
            sale_labor: round_currency(self.sale_labor),
            net_subtotal: round_currency(self.net_subtotal),
            final_total: round_currency(self.final_total),
            realized_profit: round_currency(self.realized_profit),
            margins: self.margins,
            line_count: self.line_count,
        }
    }
}

// ==========================================
// MarginCascadeCalculator - 利润率级联计算器
// ==========================================
// 红线: 无状态纯函数，同样输入得到同样输出
#[derive(Debug, Clone, Default)]
pub struct MarginCascadeCalculator {
    defaults: MarginDefaults,
}

impl MarginCascadeCalculator {
    /// 创建计算器
    ///
    /// # 参数
    /// - defaults: 报价单利润率为空时使用的默认值
    pub fn new(defaults: MarginDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> MarginDefaults {
        self.defaults
    }

    /// 解析实际使用的利润率（空值回退到默认值）
    pub fn resolve_margins(&self, quotation: &Quotation) -> AppliedMargins {
        AppliedMargins {
            materials: quotation.margen_materiales.unwrap_or(self.defaults.materials),
            labor: quotation.margen_mo.unwrap_or(self.defaults.labor),
            general: quotation.margen_general.unwrap_or(self.defaults.general),
        }
    }

    /// 计算完整的未取整计算链
    pub fn compute_breakdown(&self, quotation: &Quotation, line_items: &[LineItem]) -> CascadeBreakdown {
        let margins = self.resolve_margins(quotation);

        let direct_materials_cost: f64 = line_items.iter().map(LineItem::direct_cost).sum();
        let direct_labor_cost =
            quotation.valor_dia_mo * quotation.dias_trabajados * quotation.cantidad_personas;

        let sale_materials = apply_margin(direct_materials_cost, margins.materials);
        let sale_labor = apply_margin(direct_labor_cost, margins.labor);
        let net_subtotal = sale_materials + sale_labor;
        let final_total = apply_margin(net_subtotal, margins.general);
        let realized_profit = final_total - (direct_materials_cost + direct_labor_cost);

        CascadeBreakdown {
            direct_materials_cost,
            direct_labor_cost,
            sale_materials,
            sale_labor,
            net_subtotal,
            final_total,
            realized_profit,
            margins,
            line_count: line_items.len(),
        }
    }

    /// 计算报价汇总（展示口径）
    pub fn compute_summary(&self, quotation: &Quotation, line_items: &[LineItem]) -> QuotationSummary {
        self.compute_breakdown(quotation, line_items).to_summary()
    }
}

/// 以内置默认利润率（18/25/20）计算报价汇总
pub fn compute_summary(quotation: &Quotation, line_items: &[LineItem]) -> QuotationSummary {
    MarginCascadeCalculator::default().compute_summary(quotation, line_items)
}

/// 在金额上加百分比利润率
fn apply_margin(amount: f64, margin_pct: f64) -> f64 {
    amount * (1.0 + margin_pct / 100.0)
}

/// 四舍五入到整数货币单位（.5 远离零）
///
/// 超出 i64 范围（含 ±inf）时饱和为 `i64::MAX` / `i64::MIN`，NaN 记为 0。
/// 展示值只在这一步取整，内部金额保持 f64。
pub fn round_currency(value: f64) -> i64 {
    value.round() as i64
}
