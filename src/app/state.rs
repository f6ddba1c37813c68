// ==========================================
// 牧场管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{HerdApi, ProductionApi, ReproductionApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{ProductionAnalytics, ReproductionCycleManager};
use crate::repository::{
    AnimalRepository, FarmRepository, MilkCollectionRepository, ReproductionRepository,
};

/// 环境变量: 显式指定数据库路径
pub const DB_PATH_ENV: &str = "FARM_RECORDS_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源（同一条 SQLite 连接）
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 繁殖管理API
    pub reproduction_api: Arc<ReproductionApi>,

    /// 产奶分析API
    pub production_api: Arc<ProductionApi>,

    /// 牧群管理API
    pub herd_api: Arc<HerdApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开连接并确保 schema 存在
    /// 2. 从 config_kv 加载引擎配置
    /// 3. 初始化 Repository / Engine / API
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 配置
        // ==========================================
        let config_manager = ConfigManager::from_connection(conn.clone())
            .map_err(|e| format!("无法初始化ConfigManager: {}", e))?;
        let reproduction_config = config_manager
            .get_reproduction_config()
            .map_err(|e| format!("读取繁殖配置失败: {}", e))?;
        let production_config = config_manager
            .get_production_config()
            .map_err(|e| format!("读取产奶配置失败: {}", e))?;
        let top_producers_defaults = config_manager
            .get_top_producers_defaults()
            .map_err(|e| format!("读取排名默认参数失败: {}", e))?;

        tracing::debug!(
            gestation_days = reproduction_config.gestation_days,
            tier1_above = production_config.tier1_above_liters,
            tier2_min = production_config.tier2_min_liters,
            "配置加载完成"
        );

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let farm_repo = Arc::new(FarmRepository::new(conn.clone()));
        let animal_repo = Arc::new(AnimalRepository::new(conn.clone()));
        let milk_repo = Arc::new(MilkCollectionRepository::new(conn.clone()));
        let reproduction_repo = Arc::new(ReproductionRepository::new(conn.clone()));

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let cycle_manager = Arc::new(ReproductionCycleManager::with_config(
            reproduction_repo.clone(),
            reproduction_config,
        ));
        let analytics = Arc::new(ProductionAnalytics::with_config(
            animal_repo.clone(),
            milk_repo.clone(),
            production_config,
        ));

        // ==========================================
        // 初始化API层
        // ==========================================
        let reproduction_api = Arc::new(ReproductionApi::new(cycle_manager, reproduction_repo));
        let production_api = Arc::new(ProductionApi::new(analytics.clone(), top_producers_defaults));
        let herd_api = Arc::new(HerdApi::new(farm_repo, animal_repo, milk_repo, analytics));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            reproduction_api,
            production_api,
            herd_api,
            config_manager: Arc::new(config_manager),
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: FARM_RECORDS_DB_PATH 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./farm_records.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("farm-records-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("farm-records");
        }

        // 目录创建失败时由后续打开数据库报错
        std::fs::create_dir_all(&path).ok();
        path = path.join("farm_records.db");
    }

    path.to_string_lossy().to_string()
}
