// ==========================================
// 工程报价系统 - 目录导入器实现
// ==========================================
// 职责: 整合导入流程，从文件/上传内容到材料目录
// 流程: 解析 → 列名同义词解析 → 逐行落库
// 约束: 行级失败互相隔离，已插入的行不回滚
// ==========================================

use crate::domain::import::{ImportReport, RowError, RowResolution};
use crate::domain::material::NewMaterial;
use crate::importer::column_resolver::ColumnSynonymResolver;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::material_importer_trait::{
    CatalogWriter, MaterialImporter, RowResolver, SourceRow,
};
use crate::repository::{MaterialRepository, RepositoryResult};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// MaterialRepository 作为导入落库端
// ==========================================
impl CatalogWriter for MaterialRepository {
    fn insert_material(&self, material: &NewMaterial) -> RepositoryResult<String> {
        self.insert(material)
    }
}

// ==========================================
// MaterialImporterImpl - 目录导入器实现
// ==========================================
pub struct MaterialImporterImpl<W>
where
    W: CatalogWriter,
{
    // 落库端
    writer: Arc<W>,

    // 导入组件
    resolver: Box<dyn RowResolver>,
    file_parser: UniversalFileParser,
}

impl<W> MaterialImporterImpl<W>
where
    W: CatalogWriter,
{
    /// 使用默认同义词表创建导入器
    pub fn new(writer: Arc<W>) -> Self {
        Self::with_resolver(writer, Box::new(ColumnSynonymResolver::default()))
    }

    /// 使用自定义行解析器创建导入器
    pub fn with_resolver(writer: Arc<W>, resolver: Box<dyn RowResolver>) -> Self {
        Self {
            writer,
            resolver,
            file_parser: UniversalFileParser,
        }
    }

    /// 处理已解析的行（同步）
    ///
    /// # 参数
    /// - source: 来源标识（文件名）
    /// - rows: 解析得到的数据行（行号由解析器给出，空白行同样计入）
    ///
    /// # 返回
    /// - 导入报告：inserted + skipped + failed == total_rows
    pub fn import_rows(&self, source: &str, rows: Vec<SourceRow>) -> ImportReport {
        let started = Instant::now();
        let batch_id = Uuid::new_v4().to_string();

        let mut report = ImportReport {
            batch_id,
            source: source.to_string(),
            total_rows: rows.len(),
            inserted: 0,
            skipped: 0,
            failed: 0,
            row_errors: Vec::new(),
            elapsed_ms: 0,
        };

        for SourceRow { row_number, cells } in rows {
            let row = match cells {
                Ok(row) => row,
                Err(reason) => {
                    warn!(row = row_number, reason = %reason, "行解码失败");
                    report.failed += 1;
                    report.row_errors.push(RowError { row_number, reason });
                    continue;
                }
            };

            let candidate = match self.resolver.resolve_row(&row, row_number) {
                Ok(RowResolution::Accept(material)) => material,
                Ok(RowResolution::Skip(reason)) => {
                    debug!(row = row_number, reason = %reason, "跳过行");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(row = row_number, error = %e, "行解析失败");
                    report.failed += 1;
                    report.row_errors.push(RowError {
                        row_number,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match self.writer.insert_material(&candidate) {
                Ok(id) => {
                    debug!(row = row_number, material_id = %id, "材料已写入");
                    report.inserted += 1;
                }
                Err(e) => {
                    warn!(row = row_number, error = %e, "行写入失败");
                    report.failed += 1;
                    report.row_errors.push(RowError {
                        row_number,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.elapsed_ms = started.elapsed().as_millis() as i64;

        info!(
            batch_id = %report.batch_id,
            source = %report.source,
            total = report.total_rows,
            inserted = report.inserted,
            skipped = report.skipped,
            failed = report.failed,
            elapsed_ms = report.elapsed_ms,
            finished_at = %Utc::now().to_rfc3339(),
            "目录导入完成"
        );

        report
    }
}

#[async_trait::async_trait]
impl<W> MaterialImporter for MaterialImporterImpl<W>
where
    W: CatalogWriter + 'static,
{
    #[instrument(skip(self, file_path), fields(file = %file_path.display()))]
    async fn import_from_file(&self, file_path: &Path) -> ImportResult<ImportReport> {
        info!("开始导入目录文件");

        let rows = self.file_parser.parse(file_path).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;
        debug!(rows = rows.len(), "文件解析完成");

        let source = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.display().to_string());

        Ok(self.import_rows(&source, rows))
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn import_from_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ImportReport> {
        info!("开始导入上传内容");

        let rows = self.file_parser.parse_bytes(file_name, bytes).map_err(|e| {
            error!(error = %e, "上传内容解析失败");
            e
        })?;
        debug!(rows = rows.len(), "上传内容解析完成");

        Ok(self.import_rows(file_name, rows))
    }

    async fn batch_import(&self, file_paths: Vec<PathBuf>) -> Vec<Result<ImportReport, String>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量导入文件");

        let import_tasks = file_paths.iter().map(|path| async move {
            let path_str = path.display().to_string();
            match self.import_from_file(path).await {
                Ok(report) => {
                    info!(file = %path_str, inserted = report.inserted, "文件导入成功");
                    Ok(report)
                }
                Err(e) => {
                    error!(file = %path_str, error = %e, "文件导入失败");
                    Err(format!("文件 {} 导入失败: {}", path_str, e))
                }
            }
        });

        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::ImportError;
    use crate::importer::material_importer_trait::RawRow;
    use crate::repository::RepositoryError;
    use std::sync::Mutex;

    /// 内存落库端：记录插入内容，名称为 "FALLA" 的行模拟写入失败
    #[derive(Default)]
    struct RecordingWriter {
        inserted: Mutex<Vec<NewMaterial>>,
    }

    impl CatalogWriter for RecordingWriter {
        fn insert_material(&self, material: &NewMaterial) -> RepositoryResult<String> {
            if material.nombre == "FALLA" {
                return Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()));
            }
            let mut guard = self.inserted.lock().unwrap();
            guard.push(material.clone());
            Ok(format!("mat-{}", guard.len()))
        }
    }

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn numbered(rows: Vec<RawRow>) -> Vec<SourceRow> {
        rows.into_iter()
            .enumerate()
            .map(|(idx, cells)| SourceRow::new(idx + 1, cells))
            .collect()
    }

    #[test]
    fn test_import_rows_counts_and_isolation() {
        crate::logging::init_test();
        let writer = Arc::new(RecordingWriter::default());
        let importer = MaterialImporterImpl::new(writer.clone());

        let rows = numbered(vec![
            row(&[("nombre", "Cable"), ("valor_int", "450")]),
            row(&[("Codigo", "SOLO-CODIGO")]),
            row(&[("nombre", "FALLA"), ("valor_int", "1")]),
            row(&[("nombre", "Tubo"), ("valor_int", "abc")]),
            row(&[("Descripcion", "Foco"), ("Valor Int.", "2990")]),
        ]);

        let report = importer.import_rows("catalogo.csv", rows);

        assert_eq!(report.total_rows, 5);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.row_errors.len(), 2);
        assert_eq!(report.row_errors[0].row_number, 3);
        assert_eq!(report.row_errors[1].row_number, 4);

        let inserted = writer.inserted.lock().unwrap();
        assert_eq!(inserted[0].nombre, "Cable");
        assert_eq!(inserted[1].nombre, "Foco");
    }

    #[test]
    fn test_import_rows_reports_parser_row_numbers() {
        let importer = MaterialImporterImpl::new(Arc::new(RecordingWriter::default()));

        let rows = vec![
            SourceRow::new(1, row(&[("nombre", "A"), ("valor_int", "1")])),
            SourceRow::new(2, row(&[("nombre", ""), ("valor_int", "")])),
            SourceRow {
                row_number: 3,
                cells: Err("无效的 UTF-8 编码".to_string()),
            },
            SourceRow::new(4, row(&[("nombre", "B"), ("valor_int", "abc")])),
        ];

        let report = importer.import_rows("lista.csv", rows);

        assert_eq!(report.total_rows, 4);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 2);
        let failed_rows: Vec<usize> = report.row_errors.iter().map(|e| e.row_number).collect();
        assert_eq!(failed_rows, vec![3, 4]);
    }

    #[tokio::test]
    async fn test_import_from_bytes_csv() {
        let writer = Arc::new(RecordingWriter::default());
        let importer = MaterialImporterImpl::new(writer.clone());

        let data = "Nombre,Precio,UN.\nEnchufe,1500,C/u\nInterruptor,1800,C/u\n";
        let report = importer
            .import_from_bytes("lista.csv", data.as_bytes())
            .await
            .unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.source, "lista.csv");
        assert_eq!(writer.inserted.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_import_from_bytes_blank_rows_before_failing_row() {
        let importer = MaterialImporterImpl::new(Arc::new(RecordingWriter::default()));

        let data = "nombre,valor_int\nA,1\n,\n,\nB,abc\n";
        let report = importer
            .import_from_bytes("lista.csv", data.as_bytes())
            .await
            .unwrap();

        assert_eq!(report.total_rows, 4);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.row_errors.len(), 1);
        assert_eq!(report.row_errors[0].row_number, 4);
    }

    #[tokio::test]
    async fn test_import_from_bytes_undecodable_row_is_isolated() {
        let writer = Arc::new(RecordingWriter::default());
        let importer = MaterialImporterImpl::new(writer.clone());

        let data: &[u8] = b"nombre,valor_int\nCable,450\nCa\xF1o PVC,1200\nFoco,2990\n";
        let report = importer.import_from_bytes("lista.csv", data).await.unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.row_errors[0].row_number, 2);

        let names: Vec<String> = writer
            .inserted
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.nombre.clone())
            .collect();
        assert_eq!(names, vec!["Cable".to_string(), "Foco".to_string()]);
    }

    #[tokio::test]
    async fn test_import_from_bytes_unsupported_format() {
        let importer = MaterialImporterImpl::new(Arc::new(RecordingWriter::default()));
        let result = importer.import_from_bytes("lista.txt", b"nombre").await;
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_batch_import_keeps_order_and_isolates_files() {
        use std::io::Write;

        let mut good = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(good, "nombre,valor_int").unwrap();
        writeln!(good, "Cable,450").unwrap();

        let importer = MaterialImporterImpl::new(Arc::new(RecordingWriter::default()));
        let results = importer
            .batch_import(vec![
                good.path().to_path_buf(),
                PathBuf::from("no_existe.csv"),
            ])
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().inserted, 1);
        assert!(results[1].is_err());
    }
}
