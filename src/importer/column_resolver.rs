// ==========================================
// 工程报价系统 - 列名同义词解析器
// ==========================================
// 职责: 原始行（表头 → 文本）→ 候选材料
// 规则: 每个标准字段按同义词顺序取第一个存在且非空的列
//       名称与内部价缺一即跳过；缺省值 品牌=Genérico 单位=C/u 标价=0
// ==========================================

use crate::config::ColumnSynonyms;
use crate::domain::import::{RowResolution, SkipReason};
use crate::domain::material::{NewMaterial, DEFAULT_BRAND, DEFAULT_UNIT};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::material_importer_trait::{RawRow, RowResolver};

#[derive(Debug, Clone, Default)]
pub struct ColumnSynonymResolver {
    synonyms: ColumnSynonyms,
}

impl ColumnSynonymResolver {
    pub fn new(synonyms: ColumnSynonyms) -> Self {
        Self { synonyms }
    }

    pub fn synonyms(&self) -> &ColumnSynonyms {
        &self.synonyms
    }
}

impl RowResolver for ColumnSynonymResolver {
    fn resolve_row(&self, row: &RawRow, row_number: usize) -> ImportResult<RowResolution> {
        resolve_import_row(row, row_number, &self.synonyms)
    }
}

/// 解析单行（纯函数）
///
/// 数值列存在但无法解析时返回 TypeConversionError，由调用方记为行级失败
pub fn resolve_import_row(
    row: &RawRow,
    row_number: usize,
    synonyms: &ColumnSynonyms,
) -> ImportResult<RowResolution> {
    let nombre = first_present(row, &synonyms.nombre);
    let precio = first_present(row, &synonyms.valor_int);

    let (nombre, precio) = match (nombre, precio) {
        (Some(n), Some(p)) => (n, p),
        (None, None) => return Ok(RowResolution::Skip(SkipReason::MissingNameAndPrice)),
        (None, Some(_)) => return Ok(RowResolution::Skip(SkipReason::MissingName)),
        (Some(_), None) => return Ok(RowResolution::Skip(SkipReason::MissingPrice)),
    };

    let valor_int = parse_amount(precio, "valor_int", row_number)?;
    let valor_normal = match first_present(row, &synonyms.valor_normal) {
        Some(raw) => parse_amount(raw, "valor_normal", row_number)?,
        None => 0.0,
    };

    Ok(RowResolution::Accept(NewMaterial {
        nombre: nombre.to_string(),
        marca: first_present(row, &synonyms.marca)
            .unwrap_or(DEFAULT_BRAND)
            .to_string(),
        codigo_1: first_present(row, &synonyms.codigo_1).map(str::to_string),
        codigo_2: first_present(row, &synonyms.codigo_2).map(str::to_string),
        unidad: first_present(row, &synonyms.unidad)
            .unwrap_or(DEFAULT_UNIT)
            .to_string(),
        valor_int,
        valor_normal,
    }))
}

/// 按同义词顺序取第一个存在且去空白后非空的值
fn first_present<'a>(row: &'a RawRow, candidates: &[String]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|key| row.get(key))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

fn parse_amount(raw: &str, field: &str, row_number: usize) -> ImportResult<f64> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ImportError::TypeConversionError {
            row: row_number,
            field: field.to_string(),
            message: format!("无法解析为数值: {}", raw),
        }),
    }
}
