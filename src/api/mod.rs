// ==========================================
// 牧场管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供请求处理层 / 命令行调用
// ==========================================

pub mod error;
pub mod herd_api;
pub mod production_api;
pub mod reproduction_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use herd_api::{AnimalRegistration, HerdApi, MilkCollectionReceipt};
pub use production_api::ProductionApi;
pub use reproduction_api::{PhaseCount, ReproductionApi};
