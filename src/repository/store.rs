// ==========================================
// 牧场管理系统 - 记录存储接口
// ==========================================
// 职责: 定义引擎层依赖的数据访问接口（不包含业务逻辑）
// 实现者: *Repository（使用 rusqlite）
// 约定: 单条查询“未找到”返回 Ok(None)，与存储错误区分
// ==========================================

use crate::domain::animal::Animal;
use crate::domain::milk::{DateRange, MilkCollection};
use crate::domain::reproduction::ReproductionRecord;
use crate::domain::types::ReproductionPhase;
use crate::repository::error::RepositoryResult;

// ==========================================
// ReproductionStore - 繁殖记录存储
// ==========================================
pub trait ReproductionStore: Send + Sync {
    /// 插入记录，返回新分配的 ID
    ///
    /// 同一 animal_id 重复插入返回 UniqueConstraintViolation
    fn create(&self, record: &ReproductionRecord) -> RepositoryResult<i64>;

    fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ReproductionRecord>>;

    fn find_by_animal_id(&self, animal_id: i64) -> RepositoryResult<Option<ReproductionRecord>>;

    /// 通过牲畜归属关联牧场
    fn find_by_farm_id(&self, farm_id: i64) -> RepositoryResult<Vec<ReproductionRecord>>;

    fn find_by_phase(&self, phase: ReproductionPhase) -> RepositoryResult<Vec<ReproductionRecord>>;

    /// 整条覆盖
    fn update(&self, record: &ReproductionRecord) -> RepositoryResult<()>;

    fn delete(&self, id: i64) -> RepositoryResult<()>;
}

// ==========================================
// MilkCollectionStore - 挤奶记录存储
// ==========================================
pub trait MilkCollectionStore: Send + Sync {
    fn create(&self, collection: &MilkCollection) -> RepositoryResult<i64>;

    fn find_by_id(&self, id: i64) -> RepositoryResult<Option<MilkCollection>>;

    fn find_by_animal_id(&self, animal_id: i64) -> RepositoryResult<Vec<MilkCollection>>;

    /// 牧场范围查询，按 (collection_date, id) 升序返回
    ///
    /// range 两端都为空时不限日期
    fn find_by_farm_id(&self, farm_id: i64, range: DateRange) -> RepositoryResult<Vec<MilkCollection>>;
}

// ==========================================
// AnimalStore - 牲畜存储
// ==========================================
pub trait AnimalStore: Send + Sync {
    fn create(&self, animal: &Animal) -> RepositoryResult<i64>;

    fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Animal>>;

    fn find_by_farm_id(&self, farm_id: i64) -> RepositoryResult<Vec<Animal>>;

    fn update(&self, animal: &Animal) -> RepositoryResult<()>;
}
