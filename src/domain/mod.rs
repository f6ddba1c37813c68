// ==========================================
// 牧场管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod animal;
pub mod milk;
pub mod reproduction;
pub mod types;

// 重导出核心类型
pub use animal::{Animal, Farm};
pub use milk::{AnimalStats, DateRange, MilkCollection, ProducerSummary};
pub use reproduction::{
    DryingPayload, LactationPayload, PhaseTransition, PregnancyPayload, ReproductionRecord,
    TransitionRequest,
};
pub use types::{BatchTier, ReproductionPhase, Sex};
