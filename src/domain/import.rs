// ==========================================
// 工程报价系统 - 目录导入领域模型
// ==========================================
// 用途: 导入管道中间产物与结果报告
// 生命周期: 仅在一次导入调用内
// ==========================================

use crate::domain::material::NewMaterial;
use crate::i18n::t_with_args;
use serde::{Deserialize, Serialize};

// ==========================================
// RowResolution - 单行解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowResolution {
    /// 必填字段齐全，得到候选材料
    Accept(NewMaterial),
    /// 必填字段缺失，跳过（不是错误）
    Skip(SkipReason),
}

impl RowResolution {
    pub fn is_skip(&self) -> bool {
        matches!(self, RowResolution::Skip(_))
    }
}

/// 跳过原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    MissingName,
    MissingPrice,
    MissingNameAndPrice,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingName => write!(f, "缺少名称"),
            SkipReason::MissingPrice => write!(f, "缺少内部价"),
            SkipReason::MissingNameAndPrice => write!(f, "缺少名称和内部价"),
        }
    }
}

// ==========================================
// RowError - 单行失败明细
// ==========================================
// 行号从 1 开始，对应表头之后的数据行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub row_number: usize,
    pub reason: String,
}

// ==========================================
// ImportReport - 一次导入的汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub source: String,
    pub total_rows: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub row_errors: Vec<RowError>,
    pub elapsed_ms: i64,
}

impl ImportReport {
    /// 面向操作员的结果文案（按当前语言）
    pub fn message(&self) -> String {
        let count = self.inserted.to_string();
        t_with_args("import.success", &[("count", count.as_str())])
    }
}
