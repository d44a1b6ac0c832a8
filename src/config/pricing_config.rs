// ==========================================
// 工程报价系统 - 计价与导入配置值
// ==========================================
// 职责: 默认利润率、导入列名同义词表
// 红线: 以显式配置值传入计算器/解析器，不在引擎中硬编码
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;

// ==========================================
// MarginDefaults - 默认利润率（百分比）
// ==========================================
// 报价单利润率字段为 NULL 时在计算前回退到这里
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginDefaults {
    pub materials: f64,
    pub labor: f64,
    pub general: f64,
}

impl Default for MarginDefaults {
    fn default() -> Self {
        Self {
            materials: 18.0,
            labor: 25.0,
            general: 20.0,
        }
    }
}

// ==========================================
// ColumnSynonyms - 导入列名同义词
// ==========================================
// 每个标准字段一个有序列表：大小写敏感，取第一个存在且非空的列
// 不做模糊匹配，标点/空格差异必须显式列出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSynonyms {
    pub nombre: Vec<String>,
    pub valor_int: Vec<String>,
    pub codigo_1: Vec<String>,
    pub codigo_2: Vec<String>,
    pub marca: Vec<String>,
    pub unidad: Vec<String>,
    pub valor_normal: Vec<String>,
}

impl Default for ColumnSynonyms {
    fn default() -> Self {
        fn list(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            nombre: list(&["nombre", "Nombre", "Descripcion"]),
            valor_int: list(&["valor_int", "Precio", "Valor Int."]),
            codigo_1: list(&["codigo_1", "Codigo"]),
            codigo_2: list(&["codigo_2", "Codigo 2"]),
            marca: list(&["marca", "Marca"]),
            unidad: list(&["unidad", "UN."]),
            valor_normal: list(&["valor_normal", "Valor Normal"]),
        }
    }
}

// ==========================================
// PricingConfigReader Trait
// ==========================================
// 实现者: ConfigManager（config_kv 表）、StaticPricingConfig（测试/嵌入）
pub trait PricingConfigReader: Send + Sync {
    /// 获取默认利润率
    ///
    /// # 默认值
    /// - 材料 18 / 人工 25 / 总体 20
    fn get_margin_defaults(&self) -> Result<MarginDefaults, Box<dyn Error>>;

    /// 获取导入列名同义词表
    fn get_column_synonyms(&self) -> Result<ColumnSynonyms, Box<dyn Error>>;
}

/// 固定配置（不读库）
#[derive(Debug, Clone, Default)]
pub struct StaticPricingConfig {
    pub margins: MarginDefaults,
    pub synonyms: ColumnSynonyms,
}

impl PricingConfigReader for StaticPricingConfig {
    fn get_margin_defaults(&self) -> Result<MarginDefaults, Box<dyn Error>> {
        Ok(self.margins)
    }

    fn get_column_synonyms(&self) -> Result<ColumnSynonyms, Box<dyn Error>> {
        Ok(self.synonyms.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_defaults() {
        let d = MarginDefaults::default();
        assert_eq!((d.materials, d.labor, d.general), (18.0, 25.0, 20.0));
    }

    #[test]
    fn test_partial_synonym_override_keeps_other_fields() {
        let s: ColumnSynonyms = serde_json::from_str(r#"{"nombre":["Item"]}"#).unwrap();
        assert_eq!(s.nombre, vec!["Item".to_string()]);
        assert_eq!(s.valor_int, ColumnSynonyms::default().valor_int);
    }
}
