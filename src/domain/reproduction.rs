// ==========================================
// 牧场管理系统 - 繁殖记录领域模型
// ==========================================
// 对齐: reproduction_record 表
// 约束: 一头牲畜只有一条繁殖记录
// ==========================================

use crate::domain::types::ReproductionPhase;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ReproductionRecord - 繁殖记录
// ==========================================
// 只有切换到 EMPTY 时才会清空周期日期字段；
// 其他切换不会清理非当前阶段的字段，读取时不要假定它们有意义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReproductionRecord {
    pub id: i64,        // 记录ID (0 表示未入库)
    pub animal_id: i64, // 牲畜ID
    pub current_phase: ReproductionPhase,

    // ===== 配种 / 妊娠 =====
    pub insemination_date: Option<NaiveDate>,
    pub insemination_type: Option<String>, // 配种方式（自然交配 / 人工授精等，自由文本）
    pub pregnancy_date: Option<NaiveDate>,
    pub expected_birth_date: Option<NaiveDate>,
    pub actual_birth_date: Option<NaiveDate>,

    // ===== 泌乳 / 干奶 =====
    pub lactation_start_date: Option<NaiveDate>,
    pub lactation_end_date: Option<NaiveDate>,
    pub dry_period_start_date: Option<NaiveDate>,

    pub veterinary_confirmation: bool, // 兽医确认
    pub observations: Option<String>,  // 备注

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ReproductionRecord {
    /// 创建待入库记录
    pub fn new(animal_id: i64, phase: ReproductionPhase, now: NaiveDateTime) -> Self {
        Self {
            id: 0,
            animal_id,
            current_phase: phase,
            insemination_date: None,
            insemination_type: None,
            pregnancy_date: None,
            expected_birth_date: None,
            actual_birth_date: None,
            lactation_start_date: None,
            lactation_end_date: None,
            dry_period_start_date: None,
            veterinary_confirmation: false,
            observations: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 清空周期日期（回到空怀）
    ///
    /// 配种日期、配种方式、兽医确认与备注保留
    pub fn clear_cycle_dates(&mut self) {
        self.pregnancy_date = None;
        self.expected_birth_date = None;
        self.actual_birth_date = None;
        self.lactation_start_date = None;
        self.lactation_end_date = None;
        self.dry_period_start_date = None;
    }
}

// ==========================================
// 阶段切换载荷
// ==========================================
// 缺失的字段直接跳过，不视为错误

/// 妊娠载荷
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PregnancyPayload {
    pub pregnancy_date: Option<NaiveDate>,
    pub insemination_date: Option<NaiveDate>,
    pub insemination_type: Option<String>,
    pub veterinary_confirmation: Option<bool>,
}

/// 泌乳载荷
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LactationPayload {
    pub lactation_start_date: Option<NaiveDate>, // 缺省为当天
    pub actual_birth_date: Option<NaiveDate>,
}

/// 干奶载荷
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DryingPayload {
    pub dry_period_start_date: Option<NaiveDate>, // 缺省为当天
    pub lactation_end_date: Option<NaiveDate>,
}

/// 阶段切换（目标阶段 + 对应载荷）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseTransition {
    Pregnant(PregnancyPayload),
    Lactating(LactationPayload),
    Drying(DryingPayload),
    Empty,
}

impl PhaseTransition {
    /// 目标阶段
    pub fn target_phase(&self) -> ReproductionPhase {
        match self {
            PhaseTransition::Pregnant(_) => ReproductionPhase::Pregnant,
            PhaseTransition::Lactating(_) => ReproductionPhase::Lactating,
            PhaseTransition::Drying(_) => ReproductionPhase::Drying,
            PhaseTransition::Empty => ReproductionPhase::Empty,
        }
    }

    /// 不带载荷的切换
    pub fn bare(phase: ReproductionPhase) -> Self {
        match phase {
            ReproductionPhase::Pregnant => PhaseTransition::Pregnant(PregnancyPayload::default()),
            ReproductionPhase::Lactating => PhaseTransition::Lactating(LactationPayload::default()),
            ReproductionPhase::Drying => PhaseTransition::Drying(DryingPayload::default()),
            ReproductionPhase::Empty => PhaseTransition::Empty,
        }
    }
}

/// 阶段切换请求
///
/// JSON 形如 `{"phase": "PREGNANT", "pregnancy_date": "2026-03-01", "observations": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRequest {
    #[serde(flatten)]
    pub transition: PhaseTransition,
    /// 提供时覆盖备注
    #[serde(default)]
    pub observations: Option<String>,
}

impl TransitionRequest {
    pub fn new(transition: PhaseTransition) -> Self {
        Self {
            transition,
            observations: None,
        }
    }

    pub fn with_observations(mut self, observations: impl Into<String>) -> Self {
        self.observations = Some(observations.into());
        self
    }
}

impl From<PhaseTransition> for TransitionRequest {
    fn from(transition: PhaseTransition) -> Self {
        TransitionRequest::new(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_request_from_json() {
        let json = r#"{
            "phase": "PREGNANT",
            "pregnancy_date": "2026-03-01",
            "insemination_type": "ARTIFICIAL",
            "veterinary_confirmation": true,
            "observations": "B超确认"
        }"#;

        let request: TransitionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.observations.as_deref(), Some("B超确认"));
        match request.transition {
            PhaseTransition::Pregnant(payload) => {
                assert_eq!(payload.pregnancy_date, NaiveDate::from_ymd_opt(2026, 3, 1));
                assert_eq!(payload.insemination_type.as_deref(), Some("ARTIFICIAL"));
                assert_eq!(payload.veterinary_confirmation, Some(true));
                assert_eq!(payload.insemination_date, None);
            }
            other => panic!("Expected Pregnant, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_transition_from_json() {
        let request: TransitionRequest = serde_json::from_str(r#"{"phase": "EMPTY"}"#).unwrap();
        assert_eq!(request.transition, PhaseTransition::Empty);
        assert_eq!(request.observations, None);
    }

    #[test]
    fn test_unknown_phase_rejected() {
        let result = serde_json::from_str::<TransitionRequest>(r#"{"phase": "CALVING"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_bare_transition_targets_phase() {
        for phase in ReproductionPhase::all() {
            assert_eq!(PhaseTransition::bare(phase).target_phase(), phase);
        }
    }

    #[test]
    fn test_clear_cycle_dates_keeps_insemination() {
        let now = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let mut record = ReproductionRecord::new(7, ReproductionPhase::Pregnant, now);
        record.insemination_date = NaiveDate::from_ymd_opt(2025, 12, 1);
        record.pregnancy_date = NaiveDate::from_ymd_opt(2025, 12, 20);
        record.expected_birth_date = NaiveDate::from_ymd_opt(2026, 9, 29);

        record.clear_cycle_dates();

        assert_eq!(record.pregnancy_date, None);
        assert_eq!(record.expected_birth_date, None);
        assert_eq!(record.insemination_date, NaiveDate::from_ymd_opt(2025, 12, 1));
    }
}
