// ==========================================
// 牧场管理系统 - 领域类型定义
// ==========================================
// 繁殖阶段 / 产量分群 / 性别
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 繁殖阶段 (Reproduction Phase)
// ==========================================
// 四个阶段之间不设先后顺序，任意阶段可直接切换到任意阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReproductionPhase {
    Lactating, // 泌乳期
    Drying,    // 干奶期
    #[default]
    Empty,     // 空怀
    Pregnant,  // 妊娠
}

impl ReproductionPhase {
    /// 数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReproductionPhase::Lactating => "LACTATING",
            ReproductionPhase::Drying => "DRYING",
            ReproductionPhase::Empty => "EMPTY",
            ReproductionPhase::Pregnant => "PREGNANT",
        }
    }

    /// 从字符串解析阶段（大小写不敏感）
    ///
    /// 无法识别的值返回 None，由调用方决定如何处理
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LACTATING" => Some(ReproductionPhase::Lactating),
            "DRYING" => Some(ReproductionPhase::Drying),
            "EMPTY" => Some(ReproductionPhase::Empty),
            "PREGNANT" => Some(ReproductionPhase::Pregnant),
            _ => None,
        }
    }

    /// 全部阶段
    pub fn all() -> [ReproductionPhase; 4] {
        [
            ReproductionPhase::Lactating,
            ReproductionPhase::Drying,
            ReproductionPhase::Empty,
            ReproductionPhase::Pregnant,
        ]
    }
}

impl fmt::Display for ReproductionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 产量分群 (Batch Tier)
// ==========================================
// 依据最近一次挤奶量划分:
// - liters > 30.0          → Tier1
// - 20.0 <= liters <= 30.0 → Tier2（两端闭区间）
// - 其他                    → Tier3
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum BatchTier {
    Tier1 = 1, // 高产
    Tier2 = 2, // 中产
    Tier3 = 3, // 低产
}

/// Tier1 下限（严格大于）
pub const TIER1_ABOVE_LITERS: f64 = 30.0;
/// Tier2 下限（大于等于）
pub const TIER2_MIN_LITERS: f64 = 20.0;

impl BatchTier {
    /// 按默认阈值分群
    pub fn from_liters(liters: f64) -> Self {
        Self::from_liters_with(liters, TIER1_ABOVE_LITERS, TIER2_MIN_LITERS)
    }

    /// 按指定阈值分群
    ///
    /// NaN 不满足任何比较，落入 Tier3
    pub fn from_liters_with(liters: f64, tier1_above: f64, tier2_min: f64) -> Self {
        if liters > tier1_above {
            BatchTier::Tier1
        } else if liters >= tier2_min && liters <= tier1_above {
            BatchTier::Tier2
        } else {
            BatchTier::Tier3
        }
    }

    /// 数值表示（1-3）
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// 从数值解析
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            1 => Some(BatchTier::Tier1),
            2 => Some(BatchTier::Tier2),
            3 => Some(BatchTier::Tier3),
            _ => None,
        }
    }
}

impl From<BatchTier> for i32 {
    fn from(tier: BatchTier) -> Self {
        tier.as_i32()
    }
}

impl TryFrom<i32> for BatchTier {
    type Error = String;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        BatchTier::from_i32(v).ok_or_else(|| format!("无效的分群: {}", v))
    }
}

impl fmt::Display for BatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TIER{}", self.as_i32())
    }
}

// ==========================================
// 性别 (Sex)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Female, // 母
    Male,   // 公
}

impl Sex {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Sex::Female => "FEMALE",
            Sex::Male => "MALE",
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    /// 接受 FEMALE/MALE 及 F/M 缩写，大小写不敏感
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FEMALE" | "F" => Ok(Sex::Female),
            "MALE" | "M" => Ok(Sex::Male),
            _ => Err(format!("无效的性别: {}", s)),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
