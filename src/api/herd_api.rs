// ==========================================
// 牧场管理系统 - 牧群管理 API
// ==========================================
// 职责: 牧场/牲畜登记、挤奶记录录入与查询
// 录入或修正挤奶记录后同步牲畜产量分群；同步失败不影响已提交的读数
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::reproduction_api::require_positive;
use crate::domain::animal::{Animal, Farm};
use crate::domain::milk::{DateRange, MilkCollection};
use crate::domain::types::Sex;
use crate::engine::{BatchSyncOutcome, ProductionAnalytics};
use crate::repository::{
    AnimalRepository, AnimalStore, FarmRepository, MilkCollectionRepository, MilkCollectionStore,
};

// ==========================================
// HerdApi - 牧群管理 API
// ==========================================
pub struct HerdApi {
    farm_repo: Arc<FarmRepository>,
    animal_repo: Arc<AnimalRepository>,
    milk_repo: Arc<MilkCollectionRepository>,
    analytics: Arc<ProductionAnalytics>,
}

impl HerdApi {
    pub fn new(
        farm_repo: Arc<FarmRepository>,
        animal_repo: Arc<AnimalRepository>,
        milk_repo: Arc<MilkCollectionRepository>,
        analytics: Arc<ProductionAnalytics>,
    ) -> Self {
        Self {
            farm_repo,
            animal_repo,
            milk_repo,
            analytics,
        }
    }

    // ==========================================
    // 牧场 / 牲畜
    // ==========================================

    /// 登记牧场
    pub fn register_farm(&self, name: &str) -> ApiResult<Farm> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput("牧场名称不能为空".to_string()));
        }

        let mut farm = Farm {
            id: 0,
            name: name.to_string(),
            created_at: current_time(),
        };
        farm.id = self.farm_repo.create(&farm)?;

        info!(farm_id = farm.id, name = %farm.name, "牧场已登记");
        Ok(farm)
    }

    /// 登记牲畜（初始分群 Tier3）
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 牧场不存在
    /// - Err(ApiError::InvalidInput): 名称或耳标为空
    pub fn register_animal(&self, registration: AnimalRegistration) -> ApiResult<Animal> {
        require_positive("farm_id", registration.farm_id)?;
        if registration.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("牲畜名称不能为空".to_string()));
        }
        if registration.ear_tag.trim().is_empty() {
            return Err(ApiError::InvalidInput("耳标不能为空".to_string()));
        }
        if self.farm_repo.find_by_id(registration.farm_id)?.is_none() {
            return Err(ApiError::NotFound(format!(
                "Farm(id={})不存在",
                registration.farm_id
            )));
        }

        let mut animal = Animal::new(
            registration.farm_id,
            registration.name.trim(),
            registration.ear_tag.trim(),
            registration.sex,
            current_time(),
        );
        animal.breed = registration.breed;
        animal.birth_date = registration.birth_date;
        animal.photo_url = registration.photo_url;
        animal.id = self.animal_repo.create(&animal)?;

        info!(
            animal_id = animal.id,
            farm_id = animal.farm_id,
            ear_tag = %animal.ear_tag,
            "牲畜已登记"
        );
        Ok(animal)
    }

    pub fn get_animal(&self, animal_id: i64) -> ApiResult<Option<Animal>> {
        require_positive("animal_id", animal_id)?;
        Ok(self.animal_repo.find_by_id(animal_id)?)
    }

    pub fn list_animals(&self, farm_id: i64) -> ApiResult<Vec<Animal>> {
        require_positive("farm_id", farm_id)?;
        Ok(self.animal_repo.find_by_farm_id(farm_id)?)
    }

    // ==========================================
    // 挤奶记录
    // ==========================================

    /// 录入挤奶记录并同步分群
    ///
    /// # 参数
    /// - animal_id: 牲畜ID
    /// - liters: 产奶量（升），必须为非负有限数
    /// - collection_date: 挤奶日期
    ///
    /// # 返回
    /// 读数写入成功即返回回执；分群同步失败时 `batch` 为 None，可稍后重试同步
    pub fn record_milk_collection(
        &self,
        animal_id: i64,
        liters: f64,
        collection_date: NaiveDate,
    ) -> ApiResult<MilkCollectionReceipt> {
        require_positive("animal_id", animal_id)?;
        validate_liters(liters)?;
        self.require_animal(animal_id)?;

        let mut collection =
            MilkCollection::new(animal_id, liters, collection_date, current_time());
        collection.id = self.milk_repo.create(&collection)?;

        info!(
            collection_id = collection.id,
            animal_id,
            liters,
            collection_date = %collection_date,
            "挤奶记录已录入"
        );

        let batch = self.sync_batch(animal_id);
        Ok(MilkCollectionReceipt { collection, batch })
    }

    /// 修正挤奶记录（产量/日期）并重新同步分群
    pub fn correct_milk_collection(
        &self,
        collection_id: i64,
        liters: f64,
        collection_date: NaiveDate,
    ) -> ApiResult<MilkCollectionReceipt> {
        require_positive("collection_id", collection_id)?;
        validate_liters(liters)?;

        let mut collection = self.milk_repo.find_by_id(collection_id)?.ok_or_else(|| {
            ApiError::NotFound(format!("MilkCollection(id={})不存在", collection_id))
        })?;
        collection.liters = liters;
        collection.collection_date = collection_date;
        collection.updated_at = current_time();
        self.milk_repo.update(&collection)?;

        info!(collection_id, animal_id = collection.animal_id, liters, "挤奶记录已修正");

        let batch = self.sync_batch(collection.animal_id);
        Ok(MilkCollectionReceipt { collection, batch })
    }

    /// 查询牧场挤奶记录（日期区间两端可选）
    pub fn list_milk_collections(
        &self,
        farm_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ApiResult<Vec<MilkCollection>> {
        require_positive("farm_id", farm_id)?;
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ApiError::InvalidInput(format!(
                    "开始日期不能晚于结束日期: {} > {}",
                    s, e
                )));
            }
        }
        Ok(self
            .milk_repo
            .find_by_farm_id(farm_id, DateRange { start, end })?)
    }

    pub fn list_animal_milk_collections(&self, animal_id: i64) -> ApiResult<Vec<MilkCollection>> {
        require_positive("animal_id", animal_id)?;
        Ok(self.milk_repo.find_by_animal_id(animal_id)?)
    }

    /// 读数已提交后的分群同步，失败只记日志
    fn sync_batch(&self, animal_id: i64) -> Option<BatchSyncOutcome> {
        match self.analytics.update_animal_batch(animal_id) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                warn!(animal_id, error = %err, "分群同步失败，读数已保存");
                None
            }
        }
    }

    fn require_animal(&self, animal_id: i64) -> ApiResult<Animal> {
        self.animal_repo
            .find_by_id(animal_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Animal(id={})不存在", animal_id)))
    }
}

// ==========================================
// DTO 定义
// ==========================================

/// 牲畜登记请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalRegistration {
    pub farm_id: i64,
    pub name: String,
    pub ear_tag: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default = "default_sex")]
    pub sex: Sex,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl AnimalRegistration {
    /// 仅含必填字段的母畜登记请求
    pub fn new(farm_id: i64, name: impl Into<String>, ear_tag: impl Into<String>) -> Self {
        Self {
            farm_id,
            name: name.into(),
            ear_tag: ear_tag.into(),
            breed: None,
            sex: Sex::Female,
            birth_date: None,
            photo_url: None,
        }
    }
}

fn default_sex() -> Sex {
    Sex::Female
}

/// 挤奶记录写入结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilkCollectionReceipt {
    pub collection: MilkCollection,
    /// 分群同步结果；同步失败时为 None
    pub batch: Option<BatchSyncOutcome>,
}

fn validate_liters(liters: f64) -> ApiResult<()> {
    if !liters.is_finite() || liters < 0.0 {
        return Err(ApiError::InvalidInput(format!("产奶量必须为非负数: {}", liters)));
    }
    Ok(())
}

fn current_time() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_with_schema;
    use crate::domain::types::BatchTier;
    use crate::repository::{RepositoryError, RepositoryResult};
    use rusqlite::Connection;
    use std::sync::Mutex;

    /// 所有读取都失败的挤奶记录存储
    struct OfflineMilkStore;

    impl MilkCollectionStore for OfflineMilkStore {
        fn create(&self, _: &MilkCollection) -> RepositoryResult<i64> {
            Err(RepositoryError::DatabaseConnectionError("offline".to_string()))
        }
        fn find_by_id(&self, _: i64) -> RepositoryResult<Option<MilkCollection>> {
            Err(RepositoryError::DatabaseConnectionError("offline".to_string()))
        }
        fn find_by_animal_id(&self, _: i64) -> RepositoryResult<Vec<MilkCollection>> {
            Err(RepositoryError::DatabaseConnectionError("offline".to_string()))
        }
        fn find_by_farm_id(&self, _: i64, _: DateRange) -> RepositoryResult<Vec<MilkCollection>> {
            Err(RepositoryError::DatabaseConnectionError("offline".to_string()))
        }
    }

    fn herd_api(offline_analytics: bool) -> HerdApi {
        let conn: Arc<Mutex<Connection>> =
            Arc::new(Mutex::new(open_in_memory_with_schema().unwrap()));
        let animal_repo = Arc::new(AnimalRepository::new(conn.clone()));
        let milk_repo = Arc::new(MilkCollectionRepository::new(conn.clone()));
        let analytics = if offline_analytics {
            ProductionAnalytics::new(animal_repo.clone(), Arc::new(OfflineMilkStore))
        } else {
            ProductionAnalytics::new(animal_repo.clone(), milk_repo.clone())
        };
        HerdApi::new(
            Arc::new(FarmRepository::new(conn)),
            animal_repo,
            milk_repo,
            Arc::new(analytics),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reading_kept_when_batch_sync_fails() {
        let api = herd_api(true);
        let farm = api.register_farm("断网牧场").unwrap();
        let cow = api
            .register_animal(AnimalRegistration::new(farm.id, "阿福", "OFF-1"))
            .unwrap();

        let receipt = api.record_milk_collection(cow.id, 35.0, date(2026, 6, 1)).unwrap();
        assert!(receipt.collection.id > 0);
        assert_eq!(receipt.batch, None);

        // 读数已落库，分群保持原值
        let stored = api.list_animal_milk_collections(cow.id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].liters, 35.0);
        assert_eq!(
            api.get_animal(cow.id).unwrap().unwrap().current_batch,
            BatchTier::Tier3
        );

        let corrected = api
            .correct_milk_collection(receipt.collection.id, 12.0, date(2026, 6, 1))
            .unwrap();
        assert_eq!(corrected.batch, None);
        assert_eq!(api.list_animal_milk_collections(cow.id).unwrap()[0].liters, 12.0);
    }

    #[test]
    fn test_receipt_carries_batch_outcome() {
        let api = herd_api(false);
        let farm = api.register_farm("正常牧场").unwrap();
        let cow = api
            .register_animal(AnimalRegistration::new(farm.id, "阿宝", "ON-1"))
            .unwrap();

        let receipt = api.record_milk_collection(cow.id, 25.0, date(2026, 6, 1)).unwrap();
        assert_eq!(
            receipt.batch,
            Some(BatchSyncOutcome::Reclassified {
                from: BatchTier::Tier3,
                to: BatchTier::Tier2
            })
        );
    }
}
