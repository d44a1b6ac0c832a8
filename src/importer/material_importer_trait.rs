// ==========================================
// 工程报价系统 - 目录导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 文件解析 → 列名同义词解析 → 逐行落库
// ==========================================

use crate::domain::import::{ImportReport, RowResolution};
use crate::domain::material::NewMaterial;
use crate::importer::error::ImportResult;
use crate::repository::RepositoryResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// 原始行记录（表头文本 → 单元格文本）
pub type RawRow = HashMap<String, String>;

/// 解析得到的一条数据行
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    /// 数据行号：从 1 开始，表头之后的第几行（空白行同样占号）
    pub row_number: usize,
    /// 行内容；无法解码的行只保留失败原因
    pub cells: Result<RawRow, String>,
}

impl SourceRow {
    pub fn new(row_number: usize, cells: RawRow) -> Self {
        Self {
            row_number,
            cells: Ok(cells),
        }
    }
}

// ==========================================
// MaterialImporter Trait
// ==========================================
// 用途: 目录批量导入主接口
// 实现者: MaterialImporterImpl
#[async_trait]
pub trait MaterialImporter: Send + Sync {
    /// 从文件导入（按扩展名选择解析器）
    ///
    /// # 返回
    /// - Ok(ImportReport): 导入报告（行级失败只记入报告）
    /// - Err: 文件不存在、格式不支持、无法解析
    async fn import_from_file(&self, file_path: &Path) -> ImportResult<ImportReport>;

    /// 从上传缓冲区导入
    ///
    /// # 参数
    /// - file_name: 原始文件名（用于识别格式）
    /// - bytes: 文件内容
    async fn import_from_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ImportReport>;

    /// 批量导入多个文件（并发执行，互不影响）
    ///
    /// # 返回
    /// - 与入参顺序一致的逐文件结果
    async fn batch_import(&self, file_paths: Vec<std::path::PathBuf>) -> Vec<Result<ImportReport, String>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为数据行（行级解码失败不影响其他行）
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<SourceRow>>;

    /// 解析内存中的文件内容为数据行
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<SourceRow>>;
}

// ==========================================
// RowResolver Trait
// ==========================================
// 用途: 把单行表头/值映射为候选材料
// 实现者: ColumnSynonymResolver
pub trait RowResolver: Send + Sync {
    /// 解析单行
    ///
    /// # 参数
    /// - row: 原始行记录
    /// - row_number: 行号（用于错误报告）
    ///
    /// # 返回
    /// - Ok(Accept): 候选材料
    /// - Ok(Skip): 必填字段缺失，跳过
    /// - Err: 数值格式错误
    fn resolve_row(&self, row: &RawRow, row_number: usize) -> ImportResult<RowResolution>;
}

// ==========================================
// CatalogWriter Trait
// ==========================================
// 用途: 导入落库接口（逐行插入）
// 实现者: MaterialRepository
pub trait CatalogWriter: Send + Sync {
    fn insert_material(&self, material: &NewMaterial) -> RepositoryResult<String>;
}
