// ==========================================
// 工程报价系统 - 材料领域模型
// ==========================================
// 对齐: materiales 表
// 用途: 目录维护（手工录入/批量导入）写入，报价单只按 id 引用
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 品牌缺省占位值
pub const DEFAULT_BRAND: &str = "Genérico";

/// 计量单位缺省值
pub const DEFAULT_UNIT: &str = "C/u";

// ==========================================
// Material - 目录材料
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    // ===== 主键 =====
    pub id: String,

    // ===== 基础信息 =====
    pub nombre: String,           // 名称
    pub marca: String,            // 品牌（缺省 DEFAULT_BRAND）
    pub codigo_1: Option<String>, // 目录编码 1（自由格式）
    pub codigo_2: Option<String>, // 目录编码 2（自由格式）
    pub unidad: String,           // 计量单位（缺省 DEFAULT_UNIT）

    // ===== 价格 =====
    pub valor_int: f64,    // 内部价（报价明细的冻结价来源）
    pub valor_normal: f64, // 标价（缺省 0）

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// NewMaterial - 待写入的材料
// ==========================================
// 来源: 手工录入 或 列名同义词解析器输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMaterial {
    pub nombre: String,
    #[serde(default = "default_brand")]
    pub marca: String,
    #[serde(default)]
    pub codigo_1: Option<String>,
    #[serde(default)]
    pub codigo_2: Option<String>,
    #[serde(default = "default_unit")]
    pub unidad: String,
    pub valor_int: f64,
    #[serde(default)]
    pub valor_normal: f64,
}

impl NewMaterial {
    /// 以必填字段构造，其余取缺省值
    pub fn new(nombre: impl Into<String>, valor_int: f64) -> Self {
        Self {
            nombre: nombre.into(),
            marca: DEFAULT_BRAND.to_string(),
            codigo_1: None,
            codigo_2: None,
            unidad: DEFAULT_UNIT.to_string(),
            valor_int,
            valor_normal: 0.0,
        }
    }

    /// 落库前的实体化（分配 id 与时间戳）
    pub fn into_material(self, id: String, now: DateTime<Utc>) -> Material {
        Material {
            id,
            nombre: self.nombre,
            marca: self.marca,
            codigo_1: self.codigo_1,
            codigo_2: self.codigo_2,
            unidad: self.unidad,
            valor_int: self.valor_int,
            valor_normal: self.valor_normal,
            created_at: now,
            updated_at: now,
        }
    }
}

fn default_brand() -> String {
    DEFAULT_BRAND.to_string()
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}
