// ==========================================
// 工程报价系统 - 目录导入 API
// ==========================================
// 职责: 封装价目表导入（文件路径 / 上传内容 / 批量文件）
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::error::ApiResult;
use crate::domain::import::ImportReport;
use crate::importer::{MaterialImporter, MaterialImporterImpl};
use crate::repository::MaterialRepository;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 面向操作员的结果文案
    pub message: String,
    /// 导入报告（计数、行级失败明细、耗时）
    pub report: ImportReport,
}

impl From<ImportReport> for ImportApiResponse {
    fn from(report: ImportReport) -> Self {
        Self {
            message: report.message(),
            report,
        }
    }
}

// ==========================================
// ImportApi - 目录导入 API
// ==========================================
pub struct ImportApi {
    importer: MaterialImporterImpl<MaterialRepository>,
}

impl ImportApi {
    pub fn new(importer: MaterialImporterImpl<MaterialRepository>) -> Self {
        Self { importer }
    }

    /// 从文件导入
    ///
    /// # 返回
    /// - Ok: 行级失败只记入报告
    /// - Err(ImportError): 文件不存在、格式不支持、无法解析
    pub async fn import_file(&self, file_path: &Path) -> ApiResult<ImportApiResponse> {
        let report = self.importer.import_from_file(file_path).await?;
        Ok(report.into())
    }

    /// 从上传内容导入（file_name 用于识别格式）
    pub async fn import_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> ApiResult<ImportApiResponse> {
        let report = self.importer.import_from_bytes(file_name, bytes).await?;
        Ok(report.into())
    }

    /// 批量导入（逐文件结果，顺序与入参一致）
    pub async fn import_files(
        &self,
        file_paths: Vec<PathBuf>,
    ) -> Vec<Result<ImportApiResponse, String>> {
        self.importer
            .batch_import(file_paths)
            .await
            .into_iter()
            .map(|r| r.map(ImportApiResponse::from))
            .collect()
    }
}
