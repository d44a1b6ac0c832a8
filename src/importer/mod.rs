// ==========================================
// 工程报价系统 - 导入层
// ==========================================
// 职责: 外部价目表导入材料目录
// 支持: Excel, CSV（文件路径或上传内容）
// ==========================================

// 模块声明
pub mod column_resolver;
pub mod error;
pub mod file_parser;
pub mod material_importer_impl;
pub mod material_importer_trait;

// 重导出核心类型
pub use column_resolver::{resolve_import_row, ColumnSynonymResolver};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use material_importer_impl::MaterialImporterImpl;

// 重导出 Trait 接口
pub use material_importer_trait::{
    CatalogWriter, FileParser, MaterialImporter, RawRow, RowResolver, SourceRow,
};
