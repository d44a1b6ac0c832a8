// ==========================================
// 工程报价系统 - 报价单 API
// ==========================================
// 职责: 报价单生命周期、明细维护、汇总计算
// 红线: 明细冻结价在加入时确定，之后只允许修改数量
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::quotation::{LineItem, LineItemView, NewQuotation, Quotation};
use crate::domain::summary::QuotationSummary;
use crate::engine::{validate_quantity, MarginCascadeCalculator, PriceSnapshotCapture};
use crate::repository::{
    LineItemRepository, MaterialRepository, QuotationRepository, RepositoryError,
};

// ==========================================
// QuotationDetail - 报价单完整视图
// ==========================================
/// 报价单 + 明细（含材料展示字段）+ 汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotationDetail {
    pub quotation: Quotation,
    pub items: Vec<LineItemView>,
    pub summary: QuotationSummary,
}

// ==========================================
// QuotationApi - 报价单 API
// ==========================================
pub struct QuotationApi {
    quotation_repo: Arc<QuotationRepository>,
    line_item_repo: Arc<LineItemRepository>,
    material_repo: Arc<MaterialRepository>,
    calculator: MarginCascadeCalculator,
    snapshot: PriceSnapshotCapture,
}

impl QuotationApi {
    /// 创建新的 QuotationApi 实例
    ///
    /// # 参数
    /// - calculator: 已注入默认利润率的级联计算器
    pub fn new(
        quotation_repo: Arc<QuotationRepository>,
        line_item_repo: Arc<LineItemRepository>,
        material_repo: Arc<MaterialRepository>,
        calculator: MarginCascadeCalculator,
    ) -> Self {
        Self {
            quotation_repo,
            line_item_repo,
            material_repo,
            calculator,
            snapshot: PriceSnapshotCapture::new(),
        }
    }

    // ==========================================
    // 报价单生命周期
    // ==========================================

    /// 创建报价单
    ///
    /// # 返回
    /// - Ok(String): 新报价单 id
    /// - Err(ValidationError): 项目名为空、人工参数为负或非有限数、利润率非有限数
    pub fn create_quotation(&self, quotation: NewQuotation) -> ApiResult<String> {
        validate_new_quotation(&quotation)?;

        let id = self.quotation_repo.insert(&quotation)?;
        info!(
            cotizacion_id = %id,
            nombre_proyecto = %quotation.nombre_proyecto,
            "报价单已创建"
        );
        Ok(id)
    }

    pub fn get_quotation(&self, id: &str) -> ApiResult<Quotation> {
        Ok(self.quotation_repo.get(id)?)
    }

    /// 报价单列表（按创建时间倒序）
    pub fn list_quotations(&self) -> ApiResult<Vec<Quotation>> {
        Ok(self.quotation_repo.list_all()?)
    }

    /// 删除报价单（先删明细，再删报价单行）
    pub fn delete_quotation(&self, id: &str) -> ApiResult<()> {
        let removed_items = self.quotation_repo.delete(id)?;
        info!(cotizacion_id = %id, removed_items, "报价单已删除");
        Ok(())
    }

    // ==========================================
    // 明细维护
    // ==========================================

    /// 加入明细（冻结价 = 调用方给出的单价）
    ///
    /// # 参数
    /// - unit_price: 选择材料时读到的单价，提交时不再重新查询目录
    ///
    /// # 返回
    /// - Err(NotFound): 报价单或材料不存在
    /// - Err(ValidationError): 数量/单价不是合法数值
    #[instrument(skip(self))]
    pub fn add_line_item(
        &self,
        cotizacion_id: &str,
        material_id: &str,
        cantidad: f64,
        unit_price: f64,
    ) -> ApiResult<String> {
        self.ensure_quotation(cotizacion_id)?;
        self.ensure_material(material_id)?;

        let item = self
            .snapshot
            .capture(cotizacion_id, material_id, cantidad, unit_price)?;
        self.persist_item(item)
    }

    /// 从目录选择加入明细（冻结价 = 材料当前内部价）
    #[instrument(skip(self))]
    pub fn add_catalog_item(
        &self,
        cotizacion_id: &str,
        material_id: &str,
        cantidad: f64,
    ) -> ApiResult<String> {
        self.ensure_quotation(cotizacion_id)?;
        let material = self
            .material_repo
            .find_by_id(material_id)?
            .ok_or_else(|| RepositoryError::not_found("Material", material_id))?;

        let item = self
            .snapshot
            .capture_from_material(cotizacion_id, &material, cantidad)?;
        self.persist_item(item)
    }

    /// 修改明细数量（冻结价不变）
    pub fn update_line_item_quantity(&self, item_id: &str, cantidad: f64) -> ApiResult<()> {
        validate_quantity(cantidad)?;
        self.line_item_repo.update_quantity(item_id, cantidad)?;
        debug!(item_id = %item_id, cantidad, "明细数量已更新");
        Ok(())
    }

    pub fn remove_line_item(&self, item_id: &str) -> ApiResult<()> {
        self.line_item_repo.delete(item_id)?;
        debug!(item_id = %item_id, "明细已删除");
        Ok(())
    }

    /// 报价单明细（按加入顺序，含材料展示字段）
    pub fn list_line_items(&self, cotizacion_id: &str) -> ApiResult<Vec<LineItemView>> {
        self.ensure_quotation(cotizacion_id)?;
        Ok(self.line_item_repo.list_for_quotation(cotizacion_id)?)
    }

    // ==========================================
    // 汇总
    // ==========================================

    /// 计算报价汇总
    pub fn get_summary(&self, cotizacion_id: &str) -> ApiResult<QuotationSummary> {
        Ok(self.get_detail(cotizacion_id)?.summary)
    }

    /// 报价单完整视图
    pub fn get_detail(&self, cotizacion_id: &str) -> ApiResult<QuotationDetail> {
        let quotation = self.quotation_repo.get(cotizacion_id)?;
        let items = self.line_item_repo.list_for_quotation(cotizacion_id)?;

        let line_items: Vec<LineItem> = items.iter().map(|v| v.item.clone()).collect();
        let summary = self.calculator.compute_summary(&quotation, &line_items);
        debug!(
            cotizacion_id = %cotizacion_id,
            line_count = summary.line_count,
            final_total = summary.final_total,
            "报价汇总已计算"
        );

        Ok(QuotationDetail {
            quotation,
            items,
            summary,
        })
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn ensure_quotation(&self, id: &str) -> ApiResult<()> {
        self.quotation_repo.get(id)?;
        Ok(())
    }

    fn ensure_material(&self, id: &str) -> ApiResult<()> {
        match self.material_repo.find_by_id(id)? {
            Some(_) => Ok(()),
            None => Err(RepositoryError::not_found("Material", id).into()),
        }
    }

    fn persist_item(&self, item: LineItem) -> ApiResult<String> {
        let id = self.line_item_repo.insert(&item)?;
        info!(
            item_id = %id,
            cotizacion_id = %item.cotizacion_id,
            material_id = %item.material_id,
            cantidad = item.cantidad,
            precio_congelado = item.precio_congelado,
            "明细已加入"
        );
        Ok(id)
    }
}

/// 报价单入参校验（整体拒绝，不做部分写入）
fn validate_new_quotation(q: &NewQuotation) -> ApiResult<()> {
    if q.nombre_proyecto.trim().is_empty() {
        return Err(ApiError::ValidationError("项目名称不能为空".to_string()));
    }

    let labor = [
        ("valor_dia_mo", q.valor_dia_mo),
        ("dias_trabajados", q.dias_trabajados),
        ("cantidad_personas", q.cantidad_personas),
    ];
    for (field, value) in labor {
        if !value.is_finite() || value < 0.0 {
            return Err(ApiError::ValidationError(format!(
                "{} 必须为有限的非负数: {}",
                field, value
            )));
        }
    }

    let margins = [
        ("margen_materiales", q.margen_materiales),
        ("margen_mo", q.margen_mo),
        ("margen_general", q.margen_general),
    ];
    for (field, value) in margins {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(ApiError::ValidationError(format!(
                    "{} 必须为有限数: {}",
                    field, v
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_schema, open_sqlite_connection};
    use crate::domain::material::NewMaterial;
    use std::sync::Mutex;

    fn setup() -> (QuotationApi, Arc<MaterialRepository>) {
        let conn = open_sqlite_connection(":memory:").unwrap();
        init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let material_repo = Arc::new(MaterialRepository::from_connection(conn.clone()));
        let api = QuotationApi::new(
            Arc::new(QuotationRepository::new(conn.clone())),
            Arc::new(LineItemRepository::new(conn)),
            material_repo.clone(),
            MarginCascadeCalculator::default(),
        );
        (api, material_repo)
    }

    fn sample_quotation() -> NewQuotation {
        NewQuotation {
            nombre_proyecto: "Remodelación Local 4".to_string(),
            cliente: Some("Ferretería Sur".to_string()),
            valor_dia_mo: 50_000.0,
            dias_trabajados: 10.0,
            cantidad_personas: 2.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_quotation_validation() {
        let (api, _) = setup();

        let mut blank = sample_quotation();
        blank.nombre_proyecto = " ".to_string();
        assert!(matches!(
            api.create_quotation(blank),
            Err(ApiError::ValidationError(_))
        ));

        let mut negative = sample_quotation();
        negative.dias_trabajados = -1.0;
        assert!(matches!(
            api.create_quotation(negative),
            Err(ApiError::ValidationError(_))
        ));

        let mut nan_margin = sample_quotation();
        nan_margin.margen_general = Some(f64::NAN);
        assert!(matches!(
            api.create_quotation(nan_margin),
            Err(ApiError::ValidationError(_))
        ));

        assert!(api.list_quotations().unwrap().is_empty());
    }

    #[test]
    fn test_add_line_item_uses_call_time_price() {
        let (api, materials) = setup();
        let q = api.create_quotation(sample_quotation()).unwrap();
        let m = materials.insert(&NewMaterial::new("Cable", 450.0)).unwrap();

        let item_id = api.add_line_item(&q, &m, 3.0, 400.0).unwrap();
        let items = api.list_line_items(&q).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item.id, item_id);
        assert_eq!(items[0].item.precio_congelado, 400.0);
        assert_eq!(items[0].nombre, "Cable");
    }

    #[test]
    fn test_add_line_item_unknown_ids() {
        let (api, materials) = setup();
        let q = api.create_quotation(sample_quotation()).unwrap();
        let m = materials.insert(&NewMaterial::new("Cable", 450.0)).unwrap();

        let err = api.add_line_item("missing", &m, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, ApiError::NotFound { ref entity, .. } if entity == "Quotation"));

        let err = api.add_line_item(&q, "missing", 1.0, 1.0).unwrap_err();
        assert!(matches!(err, ApiError::NotFound { ref entity, .. } if entity == "Material"));
    }

    #[test]
    fn test_add_line_item_rejects_negative_quantity() {
        let (api, materials) = setup();
        let q = api.create_quotation(sample_quotation()).unwrap();
        let m = materials.insert(&NewMaterial::new("Cable", 450.0)).unwrap();

        let err = api.add_line_item(&q, &m, -2.0, 450.0).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
        assert!(api.list_line_items(&q).unwrap().is_empty());
    }

    #[test]
    fn test_update_quantity_keeps_frozen_price() {
        let (api, materials) = setup();
        let q = api.create_quotation(sample_quotation()).unwrap();
        let m = materials.insert(&NewMaterial::new("Tubo", 1200.0)).unwrap();

        let item = api.add_catalog_item(&q, &m, 1.0).unwrap();
        materials.update_prices(&m, 9_999.0, 0.0).unwrap();
        api.update_line_item_quantity(&item, 2.5).unwrap();

        let items = api.list_line_items(&q).unwrap();
        assert_eq!(items[0].item.cantidad, 2.5);
        assert_eq!(items[0].item.precio_congelado, 1200.0);
    }

    #[test]
    fn test_summary_reference_example() {
        let (api, materials) = setup();
        let q = api.create_quotation(sample_quotation()).unwrap();
        let a = materials.insert(&NewMaterial::new("Tablero", 100_000.0)).unwrap();
        let b = materials.insert(&NewMaterial::new("Canaleta", 50_000.0)).unwrap();
        api.add_catalog_item(&q, &a, 3.0).unwrap();
        api.add_catalog_item(&q, &b, 4.0).unwrap();

        let summary = api.get_summary(&q).unwrap();
        assert_eq!(summary.cost_materials, 500_000);
        assert_eq!(summary.cost_labor, 1_000_000);
        assert_eq!(summary.sale_materials, 590_000);
        assert_eq!(summary.sale_labor, 1_250_000);
        assert_eq!(summary.net_subtotal, 1_840_000);
        assert_eq!(summary.final_total, 2_208_000);
        assert_eq!(summary.realized_profit, 708_000);
        assert_eq!(summary.line_count, 2);
    }

    #[test]
    fn test_remove_line_item() {
        let (api, materials) = setup();
        let q = api.create_quotation(sample_quotation()).unwrap();
        let m = materials.insert(&NewMaterial::new("Foco", 2990.0)).unwrap();
        let item = api.add_catalog_item(&q, &m, 1.0).unwrap();

        api.remove_line_item(&item).unwrap();
        assert!(api.list_line_items(&q).unwrap().is_empty());

        let err = api.remove_line_item(&item).unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
