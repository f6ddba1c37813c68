// ==========================================
// 牧场管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::{TIER1_ABOVE_LITERS, TIER2_MIN_LITERS};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// 引擎配置
// ==========================================

/// 繁殖周期配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReproductionConfig {
    /// 妊娠天数（预产期 = 妊娠日期 + gestation_days）
    pub gestation_days: i64,
}

impl ReproductionConfig {
    /// 妊娠天数上限（任何家畜都不会超过）
    pub const MAX_GESTATION_DAYS: i64 = 1000;
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self { gestation_days: 283 }
    }
}

/// 产奶分析配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductionConfig {
    /// Tier1: 产量严格大于该值
    pub tier1_above_liters: f64,
    /// Tier2: 产量大于等于该值（且不超过 tier1_above_liters）
    pub tier2_min_liters: f64,
    /// 泌乳天数估算的固定偏移
    pub lactation_offset_days: i64,
    /// 乳脂率占位值
    pub placeholder_fat_content: f64,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            tier1_above_liters: TIER1_ABOVE_LITERS,
            tier2_min_liters: TIER2_MIN_LITERS,
            lactation_offset_days: 60,
            placeholder_fat_content: 3.5,
        }
    }
}

/// 高产排名默认查询参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopProducersDefaults {
    pub window_days: i64,
    pub limit: usize,
}

impl Default for TopProducersDefaults {
    fn default() -> Self {
        Self {
            window_days: 30,
            limit: 10,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 读取并解析配置值；不存在或格式错误时返回默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + Copy + std::fmt::Debug,
    {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = ?default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 写入 global 配置（UPSERT）
    pub fn set_config(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    // ===== 繁殖周期配置 =====

    /// 获取繁殖周期配置
    pub fn get_reproduction_config(&self) -> Result<ReproductionConfig, Box<dyn Error>> {
        let defaults = ReproductionConfig::default();
        let gestation_days =
            self.get_parsed_or_default(config_keys::GESTATION_DAYS, defaults.gestation_days)?;

        if gestation_days <= 0 {
            tracing::warn!(gestation_days, "妊娠天数必须为正数，使用默认值");
            return Ok(defaults);
        }
        if gestation_days > ReproductionConfig::MAX_GESTATION_DAYS {
            tracing::warn!(
                gestation_days,
                max = ReproductionConfig::MAX_GESTATION_DAYS,
                "妊娠天数超出上限，使用默认值"
            );
            return Ok(defaults);
        }
        Ok(ReproductionConfig { gestation_days })
    }

    // ===== 产奶分析配置 =====

    /// 获取产奶分析配置
    ///
    /// 分群阈值倒挂（tier2_min > tier1_above）时整体回退为默认阈值
    pub fn get_production_config(&self) -> Result<ProductionConfig, Box<dyn Error>> {
        let defaults = ProductionConfig::default();

        let mut config = ProductionConfig {
            tier1_above_liters: self
                .get_parsed_or_default(config_keys::BATCH_TIER1_ABOVE_LITERS, defaults.tier1_above_liters)?,
            tier2_min_liters: self
                .get_parsed_or_default(config_keys::BATCH_TIER2_MIN_LITERS, defaults.tier2_min_liters)?,
            lactation_offset_days: self
                .get_parsed_or_default(config_keys::LACTATION_OFFSET_DAYS, defaults.lactation_offset_days)?,
            placeholder_fat_content: self
                .get_parsed_or_default(config_keys::PLACEHOLDER_FAT_CONTENT, defaults.placeholder_fat_content)?,
        };

        if config.tier2_min_liters > config.tier1_above_liters {
            tracing::warn!(
                tier1_above = config.tier1_above_liters,
                tier2_min = config.tier2_min_liters,
                "分群阈值倒挂，使用默认阈值"
            );
            config.tier1_above_liters = defaults.tier1_above_liters;
            config.tier2_min_liters = defaults.tier2_min_liters;
        }

        Ok(config)
    }

    /// 获取高产排名默认参数
    pub fn get_top_producers_defaults(&self) -> Result<TopProducersDefaults, Box<dyn Error>> {
        let defaults = TopProducersDefaults::default();
        let window_days =
            self.get_parsed_or_default(config_keys::TOP_PRODUCERS_WINDOW_DAYS, defaults.window_days)?;
        let limit = self.get_parsed_or_default(config_keys::TOP_PRODUCERS_LIMIT, defaults.limit)?;

        Ok(TopProducersDefaults {
            window_days: if window_days > 0 { window_days } else { defaults.window_days },
            limit: if limit > 0 { limit } else { defaults.limit },
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 繁殖
    pub const GESTATION_DAYS: &str = "gestation_days";

    // 产量分群
    pub const BATCH_TIER1_ABOVE_LITERS: &str = "batch_tier1_above_liters";
    pub const BATCH_TIER2_MIN_LITERS: &str = "batch_tier2_min_liters";

    // 高产排名
    pub const LACTATION_OFFSET_DAYS: &str = "lactation_offset_days";
    pub const PLACEHOLDER_FAT_CONTENT: &str = "placeholder_fat_content";
    pub const TOP_PRODUCERS_WINDOW_DAYS: &str = "top_producers_window_days";
    pub const TOP_PRODUCERS_LIMIT: &str = "top_producers_limit";
}
