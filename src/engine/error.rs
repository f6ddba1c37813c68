// ==========================================
// 牧场管理系统 - 引擎层错误类型
// ==========================================
// 四类错误: 校验 / 冲突 / 未找到 / 存储
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求结构不合法（例如缺少必填 ID）
    #[error("参数校验失败: {0}")]
    Validation(String),

    /// 违反唯一性约束（例如同一牲畜重复建立繁殖记录）
    #[error("数据冲突: {0}")]
    Conflict(String),

    /// 变更操作引用的实体不存在
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    /// 存储层失败，原样包装
    #[error("存储失败: {0}")]
    Storage(#[from] RepositoryError),
}

impl EngineError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
