// ==========================================
// 牧场管理系统 - 繁殖周期管理器
// ==========================================
// 职责: 一头牲畜一条繁殖记录 + 繁殖阶段状态机
// 输入: 阶段切换请求（类型化载荷）
// 输出: 写回存储后的完整记录
// ==========================================
// 阶段: LACTATING / DRYING / EMPTY / PREGNANT，任意阶段可切换到任意阶段
// 并发: 读-改-写没有乐观锁，同一记录的并发更新以最后一次写入为准
// ==========================================

use crate::config::ReproductionConfig;
use crate::domain::reproduction::{PhaseTransition, ReproductionRecord, TransitionRequest};
use crate::domain::types::ReproductionPhase;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::error::RepositoryError;
use crate::repository::store::ReproductionStore;
use chrono::{Days, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tracing::{debug, info};

const ENTITY: &str = "ReproductionRecord";

// ==========================================
// ReproductionCycleManager - 繁殖周期管理器
// ==========================================
pub struct ReproductionCycleManager {
    store: Arc<dyn ReproductionStore>,
    config: ReproductionConfig,
}

impl ReproductionCycleManager {
    /// 使用默认配置（妊娠 283 天）
    pub fn new(store: Arc<dyn ReproductionStore>) -> Self {
        Self::with_config(store, ReproductionConfig::default())
    }

    pub fn with_config(store: Arc<dyn ReproductionStore>, config: ReproductionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ReproductionConfig {
        &self.config
    }

    // ==========================================
    // 创建
    // ==========================================

    /// 为牲畜建立繁殖记录
    ///
    /// # 参数
    /// - `animal_id`: 牲畜ID，必须 > 0
    /// - `initial_phase`: 初始阶段，缺省为 EMPTY
    ///
    /// # 返回
    /// - Ok(record): 已入库记录（带新 ID）
    /// - Err(Validation): animal_id 未设置
    /// - Err(Conflict): 该牲畜已有记录
    pub fn create_record(
        &self,
        animal_id: i64,
        initial_phase: Option<ReproductionPhase>,
    ) -> EngineResult<ReproductionRecord> {
        self.create_record_at(animal_id, initial_phase, current_time())
    }

    pub fn create_record_at(
        &self,
        animal_id: i64,
        initial_phase: Option<ReproductionPhase>,
        now: NaiveDateTime,
    ) -> EngineResult<ReproductionRecord> {
        if animal_id <= 0 {
            return Err(EngineError::Validation("animal_id 不能为空".to_string()));
        }

        if self.store.find_by_animal_id(animal_id)?.is_some() {
            return Err(duplicate_record(animal_id));
        }

        let mut record =
            ReproductionRecord::new(animal_id, initial_phase.unwrap_or_default(), now);

        // 检查与插入之间的竞争由唯一索引兜底
        record.id = self.store.create(&record).map_err(|e| match e {
            RepositoryError::UniqueConstraintViolation(_) => duplicate_record(animal_id),
            other => EngineError::Storage(other),
        })?;

        info!(
            record_id = record.id,
            animal_id,
            phase = %record.current_phase,
            "繁殖记录已创建"
        );
        Ok(record)
    }

    // ==========================================
    // 查询（未找到返回空结果，不报错）
    // ==========================================

    pub fn get_by_id(&self, id: i64) -> EngineResult<Option<ReproductionRecord>> {
        Ok(self.store.find_by_id(id)?)
    }

    pub fn get_by_animal_id(&self, animal_id: i64) -> EngineResult<Option<ReproductionRecord>> {
        Ok(self.store.find_by_animal_id(animal_id)?)
    }

    pub fn list_by_farm(&self, farm_id: i64) -> EngineResult<Vec<ReproductionRecord>> {
        Ok(self.store.find_by_farm_id(farm_id)?)
    }

    pub fn list_by_phase(&self, phase: ReproductionPhase) -> EngineResult<Vec<ReproductionRecord>> {
        Ok(self.store.find_by_phase(phase)?)
    }

    // ==========================================
    // 更新
    // ==========================================

    /// 整条覆盖更新
    ///
    /// 调用方需要带上完整记录（包括不变字段），这里只刷新 updated_at
    pub fn update_record(&self, record: ReproductionRecord) -> EngineResult<ReproductionRecord> {
        self.update_record_at(record, current_time())
    }

    pub fn update_record_at(
        &self,
        mut record: ReproductionRecord,
        now: NaiveDateTime,
    ) -> EngineResult<ReproductionRecord> {
        if record.id <= 0 {
            return Err(EngineError::Validation("记录 id 不能为空".to_string()));
        }

        if self.store.find_by_id(record.id)?.is_none() {
            return Err(EngineError::not_found(ENTITY, record.id));
        }

        record.updated_at = now;
        self.store.update(&record)?;

        info!(record_id = record.id, animal_id = record.animal_id, "繁殖记录已更新");
        Ok(record)
    }

    // ==========================================
    // 阶段切换
    // ==========================================

    /// 切换繁殖阶段
    ///
    /// # 规则
    /// - PREGNANT: 写入妊娠/配种信息；提供妊娠日期时推算预产期
    /// - LACTATING: 泌乳开始日期缺省为当天
    /// - DRYING: 干奶开始日期缺省为当天
    /// - EMPTY: 清空周期日期
    ///
    /// 写入失败时返回存储错误，修改只发生在本地副本上
    pub fn transition_phase(
        &self,
        animal_id: i64,
        request: impl Into<TransitionRequest>,
    ) -> EngineResult<ReproductionRecord> {
        self.transition_phase_at(animal_id, request, current_time())
    }

    pub fn transition_phase_at(
        &self,
        animal_id: i64,
        request: impl Into<TransitionRequest>,
        now: NaiveDateTime,
    ) -> EngineResult<ReproductionRecord> {
        let request = request.into();

        let current = self
            .store
            .find_by_animal_id(animal_id)?
            .ok_or_else(|| EngineError::not_found(ENTITY, format!("animal:{}", animal_id)))?;

        let from = current.current_phase;
        let mut record = current;
        self.apply_transition(&mut record, &request.transition, now.date())?;

        if let Some(observations) = request.observations {
            record.observations = Some(observations);
        }
        record.updated_at = now;

        self.store.update(&record)?;

        info!(
            record_id = record.id,
            animal_id,
            from = %from,
            to = %record.current_phase,
            "繁殖阶段已切换"
        );
        Ok(record)
    }

    /// 将切换载荷应用到记录上（不落库）
    ///
    /// 载荷中缺失的字段保持原值；预产期超出可表示日期范围时返回 Validation，记录不变
    pub fn apply_transition(
        &self,
        record: &mut ReproductionRecord,
        transition: &PhaseTransition,
        today: NaiveDate,
    ) -> EngineResult<()> {
        match transition {
            PhaseTransition::Pregnant(payload) => {
                if let Some(pregnancy_date) = payload.pregnancy_date {
                    let expected = self.expected_birth_date(pregnancy_date).ok_or_else(|| {
                        EngineError::Validation(format!(
                            "妊娠日期 {} 推算的预产期超出日期范围",
                            pregnancy_date
                        ))
                    })?;
                    record.pregnancy_date = Some(pregnancy_date);
                    record.expected_birth_date = Some(expected);
                    debug!(
                        animal_id = record.animal_id,
                        pregnancy_date = %pregnancy_date,
                        expected_birth_date = ?record.expected_birth_date,
                        "已推算预产期"
                    );
                }
                if let Some(insemination_date) = payload.insemination_date {
                    record.insemination_date = Some(insemination_date);
                }
                if let Some(insemination_type) = &payload.insemination_type {
                    record.insemination_type = Some(insemination_type.clone());
                }
                if let Some(confirmed) = payload.veterinary_confirmation {
                    record.veterinary_confirmation = confirmed;
                }
            }
            PhaseTransition::Lactating(payload) => {
                record.lactation_start_date = Some(payload.lactation_start_date.unwrap_or(today));
                if let Some(actual_birth_date) = payload.actual_birth_date {
                    record.actual_birth_date = Some(actual_birth_date);
                }
            }
            PhaseTransition::Drying(payload) => {
                record.dry_period_start_date = Some(payload.dry_period_start_date.unwrap_or(today));
                if let Some(lactation_end_date) = payload.lactation_end_date {
                    record.lactation_end_date = Some(lactation_end_date);
                }
            }
            PhaseTransition::Empty => record.clear_cycle_dates(),
        }

        record.current_phase = transition.target_phase();
        Ok(())
    }

    /// 预产期 = 妊娠日期 + 妊娠天数；结果超出日期范围时为 None
    pub fn expected_birth_date(&self, pregnancy_date: NaiveDate) -> Option<NaiveDate> {
        let days = u64::try_from(self.config.gestation_days).ok()?;
        pregnancy_date.checked_add_days(Days::new(days))
    }

    // ==========================================
    // 删除
    // ==========================================

    pub fn delete_record(&self, id: i64) -> EngineResult<()> {
        if self.store.find_by_id(id)?.is_none() {
            return Err(EngineError::not_found(ENTITY, id));
        }
        self.store.delete(id)?;

        info!(record_id = id, "繁殖记录已删除");
        Ok(())
    }
}

fn duplicate_record(animal_id: i64) -> EngineError {
    EngineError::Conflict(format!("牲畜 {} 已存在繁殖记录", animal_id))
}

fn current_time() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
