// ==========================================
// 牧场管理系统 - 引擎层
// ==========================================
// 职责: 繁殖周期状态机 + 产奶分析
// 红线: Engine 不拼 SQL，只通过存储 trait 访问数据
// ==========================================

pub mod error;
pub mod production_analytics;
pub mod reproduction_cycle;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use production_analytics::{BatchSyncOutcome, ProductionAnalytics};
pub use reproduction_cycle::ReproductionCycleManager;
