// ==========================================
// 牧场管理系统 - 挤奶记录与产量统计领域模型
// ==========================================
// 对齐: milk_collection 表
// AnimalStats / ProducerSummary 为派生数据，不落库
// ==========================================

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// MilkCollection - 挤奶记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilkCollection {
    pub id: i64,                    // 记录ID (0 表示未入库)
    pub animal_id: i64,             // 牲畜ID
    pub liters: f64,                // 产奶量（升）
    pub collection_date: NaiveDate, // 挤奶日期
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl MilkCollection {
    pub fn new(animal_id: i64, liters: f64, collection_date: NaiveDate, now: NaiveDateTime) -> Self {
        Self {
            id: 0,
            animal_id,
            liters,
            collection_date,
            created_at: now,
            updated_at: now,
        }
    }
}

// ==========================================
// DateRange - 日期区间（两端可选，闭区间）
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// 不限区间
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// 闭区间 [start, end]
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// 截止到 end 的 window_days 天窗口: [end - window_days, end]
    ///
    /// window_days 为负或起点超出可表示日期范围时返回 None
    pub fn trailing(end: NaiveDate, window_days: i64) -> Option<Self> {
        let days = u64::try_from(window_days).ok()?;
        let start = end.checked_sub_days(Days::new(days))?;
        Some(Self::between(start, end))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

// ==========================================
// AnimalStats - 单头牲畜产量累加器（单次请求内有效）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct AnimalStats {
    pub animal_id: i64,
    pub total_liters: f64,
    pub reading_count: u32,
    pub last_collection_date: NaiveDate,
    pub days_in_lactation: i64, // 估算值，见 ProductionAnalytics
}

impl AnimalStats {
    /// 首次见到该牲畜时建立累加器（尚未计入读数）
    pub fn seed(animal_id: i64, first_date: NaiveDate, days_in_lactation: i64) -> Self {
        Self {
            animal_id,
            total_liters: 0.0,
            reading_count: 0,
            last_collection_date: first_date,
            days_in_lactation,
        }
    }

    /// 计入一条读数
    pub fn record(&mut self, liters: f64, date: NaiveDate) {
        self.total_liters += liters;
        self.reading_count += 1;
        if date > self.last_collection_date {
            self.last_collection_date = date;
        }
    }

    /// 平均产量 = 总量 / 读数条数
    ///
    /// 按读数条数而非天数计算，与历史报表口径一致
    pub fn average_per_reading(&self) -> f64 {
        if self.reading_count == 0 {
            return 0.0;
        }
        self.total_liters / self.reading_count as f64
    }
}

// ==========================================
// ProducerSummary - 高产排名输出行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerSummary {
    pub animal_id: i64,
    pub animal_name: String,
    pub ear_tag: String,
    pub photo_url: Option<String>,
    pub total_production: f64,
    pub average_daily_production: f64,
    pub fat_content: f64,             // 固定占位值，不来自读数
    pub last_collection_date: String, // %Y-%m-%d
    pub days_in_lactation: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range_contains() {
        let range = DateRange::between(date(2026, 1, 1), date(2026, 1, 31));
        assert!(range.contains(date(2026, 1, 1)));
        assert!(range.contains(date(2026, 1, 31)));
        assert!(!range.contains(date(2026, 2, 1)));

        assert!(DateRange::unbounded().contains(date(1999, 12, 31)));

        let open_end = DateRange {
            start: Some(date(2026, 1, 10)),
            end: None,
        };
        assert!(open_end.contains(date(2030, 1, 1)));
        assert!(!open_end.contains(date(2026, 1, 9)));
    }

    #[test]
    fn test_trailing_window() {
        let range = DateRange::trailing(date(2026, 3, 31), 30).unwrap();
        assert_eq!(range.start, Some(date(2026, 3, 1)));
        assert_eq!(range.end, Some(date(2026, 3, 31)));
    }

    #[test]
    fn test_trailing_window_out_of_range() {
        assert_eq!(DateRange::trailing(date(2026, 3, 31), i64::MAX), None);
        assert_eq!(DateRange::trailing(date(2026, 3, 31), -1), None);
        assert_eq!(DateRange::trailing(NaiveDate::MIN, 1), None);

        let whole = DateRange::trailing(date(2026, 3, 31), 0).unwrap();
        assert_eq!(whole.start, whole.end);
    }

    #[test]
    fn test_animal_stats_accumulates() {
        let mut stats = AnimalStats::seed(1, date(2026, 1, 5), 60);
        stats.record(20.0, date(2026, 1, 5));
        stats.record(30.0, date(2026, 1, 7));
        stats.record(10.0, date(2026, 1, 6));

        assert_eq!(stats.reading_count, 3);
        assert_eq!(stats.total_liters, 60.0);
        assert_eq!(stats.last_collection_date, date(2026, 1, 7));
        assert_eq!(stats.average_per_reading(), 20.0);
    }
}
