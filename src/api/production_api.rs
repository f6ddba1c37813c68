// ==========================================
// 牧场管理系统 - 产奶分析 API
// ==========================================
// 职责: 产量分群、分群同步、高产排名
// 校验: farm_id / window_days / limit 必须为正数，缺省值来自配置
// ==========================================

use std::sync::Arc;

use chrono::Local;
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::api::reproduction_api::require_positive;
use crate::config::TopProducersDefaults;
use crate::domain::milk::{DateRange, ProducerSummary};
use crate::domain::types::BatchTier;
use crate::engine::{BatchSyncOutcome, ProductionAnalytics};

// ==========================================
// ProductionApi - 产奶分析 API
// ==========================================
pub struct ProductionApi {
    analytics: Arc<ProductionAnalytics>,
    defaults: TopProducersDefaults,
}

impl ProductionApi {
    pub fn new(analytics: Arc<ProductionAnalytics>, defaults: TopProducersDefaults) -> Self {
        Self { analytics, defaults }
    }

    /// 按产奶量分群
    pub fn classify_liters(&self, liters: f64) -> BatchTier {
        self.analytics.classify_by_liters(liters)
    }

    /// 按最新挤奶记录同步牲畜分群
    pub fn update_animal_batch(&self, animal_id: i64) -> ApiResult<BatchSyncOutcome> {
        require_positive("animal_id", animal_id)?;
        Ok(self.analytics.update_animal_batch(animal_id)?)
    }

    /// 高产排名
    ///
    /// # 参数
    /// - farm_id: 牧场ID
    /// - window_days: 统计窗口天数（None 使用配置默认值）
    /// - limit: 返回条数（None 使用配置默认值）
    ///
    /// # 返回
    /// - Ok(Vec<ProducerSummary>): 按总产量降序
    /// - Err(ApiError::InvalidInput): 参数非正数，或窗口起点超出可表示日期范围
    pub fn top_producers(
        &self,
        farm_id: i64,
        window_days: Option<i64>,
        limit: Option<i64>,
    ) -> ApiResult<Vec<ProducerSummary>> {
        require_positive("farm_id", farm_id)?;

        let window_days = window_days.unwrap_or(self.defaults.window_days);
        require_positive("window_days", window_days)?;
        if DateRange::trailing(Local::now().date_naive(), window_days).is_none() {
            return Err(ApiError::InvalidInput(format!(
                "window_days 超出可表示的日期范围: {}",
                window_days
            )));
        }

        let limit = match limit {
            Some(value) => {
                require_positive("limit", value)?;
                usize::try_from(value)
                    .map_err(|_| ApiError::InvalidInput(format!("limit 超出范围: {}", value)))?
            }
            None => self.defaults.limit,
        };

        debug!(farm_id, window_days, limit, "查询高产排名");
        Ok(self.analytics.top_producers(farm_id, window_days, limit)?)
    }

    pub fn defaults(&self) -> TopProducersDefaults {
        self.defaults
    }
}
