// ==========================================
// 牧场管理系统 - 产奶分析引擎
// ==========================================
// 职责: 产量分群 + 分群同步 + 高产排名
// 输入: 牲畜 / 挤奶记录（来自存储）
// 输出: BatchTier / BatchSyncOutcome / ProducerSummary 列表
// ==========================================
// 排名口径（与历史报表保持一致）:
// - 平均产量 = 窗口内总量 / 读数条数（不是按天平均）
// - 泌乳天数 = (now - 首条读数日 0 点) 的小时数 / 24 + 偏移，不小于 0
// - 乳脂率为固定占位值
// 同总量按牲畜ID升序
// ==========================================

use crate::config::ProductionConfig;
use crate::domain::animal::Animal;
use crate::domain::milk::{AnimalStats, DateRange, MilkCollection, ProducerSummary};
use crate::domain::types::BatchTier;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::store::{AnimalStore, MilkCollectionStore};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ==========================================
// BatchSyncOutcome - 分群同步结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchSyncOutcome {
    /// 没有任何挤奶记录，分群保持不变
    NoReadings,
    /// 最新读数对应的分群与当前一致，未写库
    Unchanged { tier: BatchTier },
    /// 分群已更新
    Reclassified { from: BatchTier, to: BatchTier },
}

impl BatchSyncOutcome {
    /// 同步后的分群（无读数时为 None）
    pub fn tier(&self) -> Option<BatchTier> {
        match self {
            BatchSyncOutcome::NoReadings => None,
            BatchSyncOutcome::Unchanged { tier } => Some(*tier),
            BatchSyncOutcome::Reclassified { to, .. } => Some(*to),
        }
    }
}

// ==========================================
// ProductionAnalytics - 产奶分析引擎
// ==========================================
pub struct ProductionAnalytics {
    animal_store: Arc<dyn AnimalStore>,
    milk_store: Arc<dyn MilkCollectionStore>,
    config: ProductionConfig,
}

impl ProductionAnalytics {
    pub fn new(animal_store: Arc<dyn AnimalStore>, milk_store: Arc<dyn MilkCollectionStore>) -> Self {
        Self::with_config(animal_store, milk_store, ProductionConfig::default())
    }

    pub fn with_config(
        animal_store: Arc<dyn AnimalStore>,
        milk_store: Arc<dyn MilkCollectionStore>,
        config: ProductionConfig,
    ) -> Self {
        Self {
            animal_store,
            milk_store,
            config,
        }
    }

    pub fn config(&self) -> &ProductionConfig {
        &self.config
    }

    // ==========================================
    // 产量分群
    // ==========================================

    /// 按单次产奶量分群
    ///
    /// - liters > tier1_above_liters → Tier1
    /// - tier2_min_liters <= liters <= tier1_above_liters → Tier2
    /// - 其他（含 NaN）→ Tier3
    pub fn classify_by_liters(&self, liters: f64) -> BatchTier {
        BatchTier::from_liters_with(
            liters,
            self.config.tier1_above_liters,
            self.config.tier2_min_liters,
        )
    }

    // ==========================================
    // 分群同步
    // ==========================================

    /// 按最新一条挤奶记录重新计算牲畜分群
    ///
    /// # 参数
    /// - `animal_id`: 牲畜ID
    ///
    /// # 返回
    /// - Ok(NoReadings): 无读数，不写库
    /// - Ok(Unchanged): 分群未变，不写库
    /// - Ok(Reclassified): 分群已变更并写回
    /// - Err(NotFound): 牲畜不存在
    ///
    /// # 说明
    /// 每次调用都会扫描该牲畜的全部历史读数
    pub fn update_animal_batch(&self, animal_id: i64) -> EngineResult<BatchSyncOutcome> {
        self.update_animal_batch_at(animal_id, current_time())
    }

    pub fn update_animal_batch_at(
        &self,
        animal_id: i64,
        now: NaiveDateTime,
    ) -> EngineResult<BatchSyncOutcome> {
        let mut animal = self
            .animal_store
            .find_by_id(animal_id)?
            .ok_or_else(|| EngineError::not_found("Animal", animal_id))?;

        let readings = self.milk_store.find_by_animal_id(animal_id)?;
        let latest = match latest_reading(&readings) {
            Some(reading) => reading,
            None => {
                debug!(animal_id, "无挤奶记录，跳过分群同步");
                return Ok(BatchSyncOutcome::NoReadings);
            }
        };

        let tier = self.classify_by_liters(latest.liters);
        if tier == animal.current_batch {
            debug!(animal_id, tier = %tier, "分群未变化");
            return Ok(BatchSyncOutcome::Unchanged { tier });
        }

        let from = animal.current_batch;
        animal.current_batch = tier;
        animal.updated_at = now;
        self.animal_store.update(&animal)?;

        info!(
            animal_id,
            from = %from,
            to = %tier,
            liters = latest.liters,
            collection_date = %latest.collection_date,
            "牲畜分群已更新"
        );
        Ok(BatchSyncOutcome::Reclassified { from, to: tier })
    }

    // ==========================================
    // 高产排名
    // ==========================================

    /// 牧场窗口期高产排名
    ///
    /// # 参数
    /// - `farm_id`: 牧场ID（调用方已校验）
    /// - `window_days`: 窗口天数，窗口为 [今天 - window_days, 今天]
    /// - `limit`: 返回条数上限
    ///
    /// # 返回
    /// 按总产量降序的摘要列表；存储读取失败时整体失败，不返回部分结果
    pub fn top_producers(
        &self,
        farm_id: i64,
        window_days: i64,
        limit: usize,
    ) -> EngineResult<Vec<ProducerSummary>> {
        self.top_producers_at(farm_id, window_days, limit, current_time())
    }

    pub fn top_producers_at(
        &self,
        farm_id: i64,
        window_days: i64,
        limit: usize,
        now: NaiveDateTime,
    ) -> EngineResult<Vec<ProducerSummary>> {
        let range = DateRange::trailing(now.date(), window_days).ok_or_else(|| {
            EngineError::Validation(format!("窗口天数超出可表示的日期范围: {}", window_days))
        })?;
        let readings = self.milk_store.find_by_farm_id(farm_id, range)?;

        debug!(
            farm_id,
            window_days,
            reading_count = readings.len(),
            "加载窗口期挤奶记录"
        );

        if readings.is_empty() {
            return Ok(Vec::new());
        }

        let animals: HashMap<i64, Animal> = self
            .animal_store
            .find_by_farm_id(farm_id)?
            .into_iter()
            .map(|animal| (animal.id, animal))
            .collect();

        let mut ranking = self.accumulate(&readings, now);
        ranking.sort_by(|a, b| {
            b.total_liters
                .total_cmp(&a.total_liters)
                .then_with(|| a.animal_id.cmp(&b.animal_id))
        });

        let mut summaries = Vec::with_capacity(limit.min(ranking.len()));
        for stats in ranking {
            if summaries.len() >= limit {
                break;
            }
            match animals.get(&stats.animal_id) {
                Some(animal) => summaries.push(self.summarize(animal, &stats)),
                None => warn!(
                    farm_id,
                    animal_id = stats.animal_id,
                    "挤奶记录引用的牲畜不在该牧场，跳过"
                ),
            }
        }

        info!(farm_id, window_days, limit, returned = summaries.len(), "高产排名完成");
        Ok(summaries)
    }

    /// 按牲畜累加读数（读数已按日期、ID升序）
    fn accumulate(&self, readings: &[MilkCollection], now: NaiveDateTime) -> Vec<AnimalStats> {
        let mut index: HashMap<i64, usize> = HashMap::new();
        let mut stats: Vec<AnimalStats> = Vec::new();

        for reading in readings {
            let slot = *index.entry(reading.animal_id).or_insert_with(|| {
                stats.push(AnimalStats::seed(
                    reading.animal_id,
                    reading.collection_date,
                    self.days_in_lactation(reading.collection_date, now),
                ));
                stats.len() - 1
            });
            stats[slot].record(reading.liters, reading.collection_date);
        }

        stats
    }

    /// 泌乳天数估算: 首条读数日 0 点到 now 的整小时数 / 24 + 偏移，不小于 0
    pub fn days_in_lactation(&self, first_seen: NaiveDate, now: NaiveDateTime) -> i64 {
        let hours = (now - first_seen.and_time(chrono::NaiveTime::MIN)).num_hours();
        (hours / 24 + self.config.lactation_offset_days).max(0)
    }

    fn summarize(&self, animal: &Animal, stats: &AnimalStats) -> ProducerSummary {
        ProducerSummary {
            animal_id: animal.id,
            animal_name: animal.name.clone(),
            ear_tag: animal.ear_tag.clone(),
            photo_url: animal.photo_url.clone(),
            total_production: stats.total_liters,
            average_daily_production: stats.average_per_reading(),
            fat_content: self.config.placeholder_fat_content,
            last_collection_date: stats.last_collection_date.format("%Y-%m-%d").to_string(),
            days_in_lactation: stats.days_in_lactation,
        }
    }
}

/// 最新读数: 日期最大者；同一天取后入库（ID 较大）的一条
fn latest_reading(readings: &[MilkCollection]) -> Option<&MilkCollection> {
    readings
        .iter()
        .max_by_key(|reading| (reading.collection_date, reading.id))
}

fn current_time() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
