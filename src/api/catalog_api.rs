// ==========================================
// 工程报价系统 - 材料目录 API
// ==========================================
// 职责: 材料查询、手工录入、改价、删除
// 约束: 改价只影响目录，已有报价明细的冻结价不变
// ==========================================

use std::sync::Arc;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::material::{Material, NewMaterial};
use crate::repository::{MaterialRepository, RepositoryError, DEFAULT_SEARCH_LIMIT};

// ==========================================
// CatalogApi - 材料目录 API
// ==========================================
pub struct CatalogApi {
    material_repo: Arc<MaterialRepository>,
}

impl CatalogApi {
    pub fn new(material_repo: Arc<MaterialRepository>) -> Self {
        Self { material_repo }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 搜索材料（名称或编码 1，不区分大小写的子串匹配，最多 50 条）
    ///
    /// # 参数
    /// - query: 过滤文本；None 或空串列出全部（受上限约束）
    pub fn search_materials(&self, query: Option<&str>) -> ApiResult<Vec<Material>> {
        let filter = query.map(str::trim).unwrap_or("");
        Ok(self.material_repo.search(filter, DEFAULT_SEARCH_LIMIT)?)
    }

    pub fn get_material(&self, id: &str) -> ApiResult<Material> {
        self.material_repo
            .find_by_id(id)?
            .ok_or_else(|| RepositoryError::not_found("Material", id).into())
    }

    // ==========================================
    // 维护接口
    // ==========================================

    /// 手工录入材料
    ///
    /// # 返回
    /// - Ok(String): 新材料 id
    /// - Err(ValidationError): 名称为空或价格不是有限的非负数
    pub fn create_material(&self, material: NewMaterial) -> ApiResult<String> {
        if material.nombre.trim().is_empty() {
            return Err(ApiError::ValidationError("材料名称不能为空".to_string()));
        }
        validate_price("valor_int", material.valor_int)?;
        validate_price("valor_normal", material.valor_normal)?;

        let id = self.material_repo.insert(&material)?;
        info!(material_id = %id, nombre = %material.nombre, "材料已录入");
        Ok(id)
    }

    /// 修改目录价格
    pub fn update_material_prices(
        &self,
        id: &str,
        valor_int: f64,
        valor_normal: f64,
    ) -> ApiResult<()> {
        validate_price("valor_int", valor_int)?;
        validate_price("valor_normal", valor_normal)?;

        self.material_repo.update_prices(id, valor_int, valor_normal)?;
        info!(material_id = %id, valor_int, valor_normal, "材料价格已更新");
        Ok(())
    }

    /// 删除材料
    ///
    /// # 返回
    /// - Err(ReferentialIntegrityViolation): 仍被报价明细引用，材料保持不变
    /// - Err(NotFound): 材料不存在
    pub fn delete_material(&self, id: &str) -> ApiResult<()> {
        match self.material_repo.delete(id) {
            Ok(()) => {
                info!(material_id = %id, "材料已删除");
                Ok(())
            }
            Err(e @ RepositoryError::ReferentialIntegrityViolation { .. }) => {
                warn!(material_id = %id, error = %e, "材料仍被引用，拒绝删除");
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_price(field: &str, value: f64) -> ApiResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::ValidationError(format!(
            "{} 必须为有限的非负数: {}",
            field, value
        )));
    }
    Ok(())
}
