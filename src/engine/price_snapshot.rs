// ==========================================
// 工程报价系统 - 价格快照捕获
// ==========================================
// 职责: 材料加入报价单时，把调用方给出的单价复制进明细
// 红线: 冻结价取自调用时刻的入参，不在提交时重新查询目录；
//       明细创建后不再随材料价格变动
// ==========================================

use crate::domain::material::Material;
use crate::domain::quotation::LineItem;
use crate::engine::error::{EngineError, EngineResult};
use chrono::Utc;
use uuid::Uuid;

// ==========================================
// PriceSnapshotCapture - 价格快照捕获
// ==========================================
// 红线: 无状态，只构造明细，不落库
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceSnapshotCapture;

impl PriceSnapshotCapture {
    pub fn new() -> Self {
        Self
    }

    /// 按调用方给出的单价构造明细
    ///
    /// # 参数
    /// - cotizacion_id: 所属报价单
    /// - material_id: 引用材料
    /// - cantidad: 数量（有限且非负）
    /// - unit_price: 选择时读到的单价（有限数）
    ///
    /// # 返回
    /// - Ok(LineItem): 冻结价 == unit_price
    /// - Err(EngineError): 数量/单价不是合法数值
    pub fn capture(
        &self,
        cotizacion_id: &str,
        material_id: &str,
        cantidad: f64,
        unit_price: f64,
    ) -> EngineResult<LineItem> {
        validate_quantity(cantidad)?;
        if !unit_price.is_finite() {
            return Err(EngineError::InvalidUnitPrice(unit_price));
        }

        Ok(LineItem {
            id: Uuid::new_v4().to_string(),
            cotizacion_id: cotizacion_id.to_string(),
            material_id: material_id.to_string(),
            cantidad,
            precio_congelado: unit_price,
            created_at: Utc::now(),
        })
    }

    /// 按材料当前内部价构造明细（目录选择场景）
    pub fn capture_from_material(
        &self,
        cotizacion_id: &str,
        material: &Material,
        cantidad: f64,
    ) -> EngineResult<LineItem> {
        self.capture(cotizacion_id, &material.id, cantidad, material.valor_int)
    }
}

/// 校验数量（有限且非负）
pub fn validate_quantity(cantidad: f64) -> EngineResult<()> {
    if !cantidad.is_finite() || cantidad < 0.0 {
        return Err(EngineError::InvalidQuantity(cantidad));
    }
    Ok(())
}
