// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、应用状态、测试数据
// ==========================================

#![allow(dead_code)]

use cotizador::app::AppState;
use cotizador::db::{init_schema, open_sqlite_connection};
use cotizador::domain::{NewMaterial, NewQuotation};
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是合法 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 基于临时数据库创建应用状态
pub fn create_test_state() -> Result<(NamedTempFile, AppState), Box<dyn Error>> {
    let (temp_file, db_path) = create_test_db()?;
    let state = AppState::new(db_path)?;
    Ok((temp_file, state))
}

/// 标准测试报价单：日单价 50000，10 天，2 人，利润率留空
pub fn sample_quotation(nombre: &str) -> NewQuotation {
    NewQuotation {
        nombre_proyecto: nombre.to_string(),
        cliente: Some("Constructora Andes".to_string()),
        valor_dia_mo: 50_000.0,
        dias_trabajados: 10.0,
        cantidad_personas: 2.0,
        ..Default::default()
    }
}

pub fn sample_material(nombre: &str, valor_int: f64) -> NewMaterial {
    NewMaterial::new(nombre, valor_int)
}
