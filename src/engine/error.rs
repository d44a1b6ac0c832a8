// ==========================================
// 工程报价系统 - 引擎层错误类型
// ==========================================
// 说明: 利润率级联计算对数值输入是全函数，不产生错误；
//       这里只覆盖价格快照的结构性校验
// ==========================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("数量无效: {0}（必须为有限的非负数）")]
    InvalidQuantity(f64),

    #[error("单价无效: {0}（必须为有限数）")]
    InvalidUnitPrice(f64),
}

pub type EngineResult<T> = Result<T, EngineError>;
