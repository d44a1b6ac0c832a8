// ==========================================
// 工程报价系统 - 报价单领域模型
// ==========================================
// 对齐: cotizaciones / items_cotizacion 表
// 红线: 明细的 precio_congelado 是加入时的价格副本，
//       之后不得再从材料当前价格同步
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Quotation - 报价单（项目）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quotation {
    // ===== 主键 =====
    pub id: String,

    // ===== 项目信息 =====
    pub nombre_proyecto: String,
    pub cliente: Option<String>,

    // ===== 人工参数 =====
    pub valor_dia_mo: f64,      // 人工日单价
    pub dias_trabajados: f64,   // 工作天数
    pub cantidad_personas: f64, // 人数

    // ===== 利润率（百分比，NULL 时按默认值计算）=====
    pub margen_materiales: Option<f64>,
    pub margen_mo: Option<f64>,
    pub margen_general: Option<f64>,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
}

// ==========================================
// NewQuotation - 创建报价单参数
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewQuotation {
    pub nombre_proyecto: String,
    #[serde(default)]
    pub cliente: Option<String>,
    #[serde(default)]
    pub valor_dia_mo: f64,
    #[serde(default)]
    pub dias_trabajados: f64,
    #[serde(default)]
    pub cantidad_personas: f64,
    #[serde(default)]
    pub margen_materiales: Option<f64>,
    #[serde(default)]
    pub margen_mo: Option<f64>,
    #[serde(default)]
    pub margen_general: Option<f64>,
}

impl NewQuotation {
    pub fn into_quotation(self, id: String, now: DateTime<Utc>) -> Quotation {
        Quotation {
            id,
            nombre_proyecto: self.nombre_proyecto,
            cliente: self.cliente,
            valor_dia_mo: self.valor_dia_mo,
            dias_trabajados: self.dias_trabajados,
            cantidad_personas: self.cantidad_personas,
            margen_materiales: self.margen_materiales,
            margen_mo: self.margen_mo,
            margen_general: self.margen_general,
            created_at: now,
        }
    }
}

// ==========================================
// LineItem - 报价明细
// ==========================================
// 生命周期: 归属唯一报价单；对材料仅持有 id 引用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub cotizacion_id: String,
    pub material_id: String,
    pub cantidad: f64,         // 数量（可为小数）
    pub precio_congelado: f64, // 冻结单价
    pub created_at: DateTime<Utc>,
}

impl LineItem {
    /// 明细直接成本（未加利润）
    pub fn direct_cost(&self) -> f64 {
        self.precio_congelado * self.cantidad
    }
}

// ==========================================
// LineItemView - 明细 + 材料展示字段
// ==========================================
// 用途: listLineItemsForQuotation 的返回行（JOIN materiales）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemView {
    #[serde(flatten)]
    pub item: LineItem,
    pub nombre: String,
    pub marca: String,
    pub unidad: String,
    pub codigo_1: Option<String>,
}
