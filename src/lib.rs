// ==========================================
// 牧场管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 范围: 繁殖周期状态机 + 产奶分析（分群 / 高产排名）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BatchTier, ReproductionPhase, Sex};

// 领域实体
pub use domain::{
    Animal, AnimalStats, DateRange, Farm, MilkCollection, PhaseTransition, ProducerSummary,
    ReproductionRecord, TransitionRequest,
};

// 引擎
pub use engine::{BatchSyncOutcome, EngineError, ProductionAnalytics, ReproductionCycleManager};

// API
pub use api::{ApiError, HerdApi, ProductionApi, ReproductionApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "牧场管理系统";
