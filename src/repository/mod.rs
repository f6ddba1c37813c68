// ==========================================
// 牧场管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod animal_repo;
pub mod error;
pub mod milk_collection_repo;
pub mod reproduction_repo;
pub mod store;

// 重导出核心仓储
pub use animal_repo::{AnimalRepository, FarmRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use milk_collection_repo::MilkCollectionRepository;
pub use reproduction_repo::ReproductionRepository;
pub use store::{AnimalStore, MilkCollectionStore, ReproductionStore};
