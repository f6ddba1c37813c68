// ==========================================
// 牧场管理系统 - 应用层
// ==========================================
// 职责: 组装连接、配置、仓储、引擎与 API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
