// ==========================================
// 牧场管理系统 - 繁殖管理 API
// ==========================================
// 职责: 繁殖记录增删改查、阶段切换、繁殖概况
// ==========================================

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::reproduction::{ReproductionRecord, TransitionRequest};
use crate::domain::types::ReproductionPhase;
use crate::engine::ReproductionCycleManager;
use crate::repository::ReproductionRepository;

// ==========================================
// ReproductionApi - 繁殖管理 API
// ==========================================

/// 繁殖管理API
///
/// 职责：
/// 1. 入参校验（ID 必须为正数）
/// 2. 委托 ReproductionCycleManager 执行状态机
/// 3. 繁殖概况统计（阶段分布、临产列表）
pub struct ReproductionApi {
    manager: Arc<ReproductionCycleManager>,
    reproduction_repo: Arc<ReproductionRepository>,
}

impl ReproductionApi {
    pub fn new(
        manager: Arc<ReproductionCycleManager>,
        reproduction_repo: Arc<ReproductionRepository>,
    ) -> Self {
        Self {
            manager,
            reproduction_repo,
        }
    }

    /// 为牲畜建立繁殖记录
    ///
    /// # 参数
    /// - animal_id: 牲畜ID
    /// - initial_phase: 初始阶段（缺省 EMPTY）
    ///
    /// # 返回
    /// - Ok(ReproductionRecord): 新记录
    /// - Err(ApiError::Conflict): 该牲畜已有记录
    pub fn create_record(
        &self,
        animal_id: i64,
        initial_phase: Option<ReproductionPhase>,
    ) -> ApiResult<ReproductionRecord> {
        require_positive("animal_id", animal_id)?;
        Ok(self.manager.create_record(animal_id, initial_phase)?)
    }

    pub fn get_record(&self, id: i64) -> ApiResult<Option<ReproductionRecord>> {
        require_positive("id", id)?;
        Ok(self.manager.get_by_id(id)?)
    }

    pub fn get_record_by_animal(&self, animal_id: i64) -> ApiResult<Option<ReproductionRecord>> {
        require_positive("animal_id", animal_id)?;
        Ok(self.manager.get_by_animal_id(animal_id)?)
    }

    pub fn list_by_farm(&self, farm_id: i64) -> ApiResult<Vec<ReproductionRecord>> {
        require_positive("farm_id", farm_id)?;
        Ok(self.manager.list_by_farm(farm_id)?)
    }

    /// 按阶段查询（阶段名不区分大小写）
    pub fn list_by_phase(&self, phase: &str) -> ApiResult<Vec<ReproductionRecord>> {
        let phase = ReproductionPhase::parse(phase)
            .ok_or_else(|| ApiError::InvalidInput(format!("未知繁殖阶段: {}", phase)))?;
        Ok(self.manager.list_by_phase(phase)?)
    }

    /// 整条覆盖更新
    pub fn update_record(&self, record: ReproductionRecord) -> ApiResult<ReproductionRecord> {
        require_positive("id", record.id)?;
        require_positive("animal_id", record.animal_id)?;
        Ok(self.manager.update_record(record)?)
    }

    /// 切换繁殖阶段
    ///
    /// # 参数
    /// - animal_id: 牲畜ID
    /// - request: 目标阶段 + 载荷
    pub fn transition_phase(
        &self,
        animal_id: i64,
        request: TransitionRequest,
    ) -> ApiResult<ReproductionRecord> {
        require_positive("animal_id", animal_id)?;
        Ok(self.manager.transition_phase(animal_id, request)?)
    }

    /// 从 JSON 请求体切换阶段
    ///
    /// 请求体形如 `{"phase": "DRYING", "dry_period_start_date": "2026-05-01"}`
    pub fn transition_phase_json(&self, animal_id: i64, body: &str) -> ApiResult<ReproductionRecord> {
        let request: TransitionRequest = serde_json::from_str(body)
            .map_err(|e| ApiError::InvalidInput(format!("阶段切换请求格式错误: {}", e)))?;
        self.transition_phase(animal_id, request)
    }

    pub fn delete_record(&self, id: i64) -> ApiResult<()> {
        require_positive("id", id)?;
        Ok(self.manager.delete_record(id)?)
    }

    // ==========================================
    // 繁殖概况
    // ==========================================

    /// 各阶段记录数（没有记录的阶段计为 0）
    pub fn phase_summary(&self) -> ApiResult<Vec<PhaseCount>> {
        let counts = self.reproduction_repo.count_by_phase()?;

        Ok(ReproductionPhase::all()
            .into_iter()
            .map(|phase| PhaseCount {
                phase,
                count: counts
                    .iter()
                    .find(|(p, _)| *p == phase)
                    .map_or(0, |(_, c)| *c),
            })
            .collect())
    }

    /// 未来 days 天内（含当天）预产的妊娠记录
    pub fn upcoming_births(&self, from: NaiveDate, days: i64) -> ApiResult<Vec<ReproductionRecord>> {
        let span = u64::try_from(days)
            .map_err(|_| ApiError::InvalidInput(format!("天数不能为负: {}", days)))?;
        let until = from.checked_add_days(Days::new(span)).ok_or_else(|| {
            ApiError::InvalidInput(format!("天数超出可表示的日期范围: {}", days))
        })?;
        Ok(self.reproduction_repo.find_due_between(from, until)?)
    }
}

// ==========================================
// DTO 定义
// ==========================================

/// 阶段分布
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCount {
    pub phase: ReproductionPhase,
    pub count: i64,
}

pub(crate) fn require_positive(field: &str, value: i64) -> ApiResult<()> {
    if value <= 0 {
        return Err(ApiError::InvalidInput(format!("{} 必须为正数: {}", field, value)));
    }
    Ok(())
}
