// ==========================================
// 牧场管理系统 - 牧场与牲畜领域模型
// ==========================================
// 对齐: farm / animal 表
// ==========================================

use crate::domain::types::{BatchTier, Sex};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Farm - 牧场
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    pub id: i64,                   // 牧场ID (0 表示未入库)
    pub name: String,              // 牧场名称
    pub created_at: NaiveDateTime, // 创建时间
}

// ==========================================
// Animal - 牲畜
// ==========================================
// current_batch 由产量分群同步维护，登记时默认为 Tier3
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    // ===== 标识 =====
    pub id: i64,      // 牲畜ID (0 表示未入库)
    pub farm_id: i64, // 所属牧场
    pub name: String, // 名称
    pub ear_tag: String, // 耳标号

    // ===== 生物属性 =====
    pub breed: Option<String>,         // 品种
    pub sex: Sex,                      // 性别
    pub birth_date: Option<NaiveDate>, // 出生日期
    pub photo_url: Option<String>,     // 照片

    // ===== 分群 =====
    pub current_batch: BatchTier, // 当前产量分群

    // ===== 审计 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Animal {
    /// 创建待登记的牲畜（id=0，分群 Tier3）
    pub fn new(
        farm_id: i64,
        name: impl Into<String>,
        ear_tag: impl Into<String>,
        sex: Sex,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: 0,
            farm_id,
            name: name.into(),
            ear_tag: ear_tag.into(),
            breed: None,
            sex,
            birth_date: None,
            photo_url: None,
            current_batch: BatchTier::Tier3,
            created_at: now,
            updated_at: now,
        }
    }
}
