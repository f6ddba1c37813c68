// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证 config_kv 覆写能传递到引擎与 API 默认值
// ==========================================


use chrono::Local;
use farm_records::api::AnimalRegistration;
use farm_records::app::AppState;
use farm_records::config::{config_keys, ConfigManager, ProductionConfig, ReproductionConfig};
use farm_records::domain::{BatchTier, PhaseTransition, PregnancyPayload};
use test_helpers::{create_test_db, date};

#[test]
fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[test]
fn test_defaults_when_table_empty() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    assert_eq!(
        config_manager.get_reproduction_config().unwrap(),
        ReproductionConfig::default()
    );
    assert_eq!(
        config_manager.get_production_config().unwrap(),
        ProductionConfig::default()
    );
    assert_eq!(config_manager.get_global_config_value("gestation_days").unwrap(), None);
}

#[test]
fn test_overrides_reach_engines() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    {
        let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
        config_manager.set_config(config_keys::GESTATION_DAYS, "280").unwrap();
        config_manager.set_config(config_keys::BATCH_TIER1_ABOVE_LITERS, "25").unwrap();
        config_manager.set_config(config_keys::TOP_PRODUCERS_LIMIT, "1").unwrap();
    }

    let state = AppState::new(db_path).expect("无法初始化AppState");
    let farm = state.herd_api.register_farm("配置牧场").unwrap();
    let first = state
        .herd_api
        .register_animal(AnimalRegistration::new(farm.id, "一号", "C-1"))
        .unwrap();
    let second = state
        .herd_api
        .register_animal(AnimalRegistration::new(farm.id, "二号", "C-2"))
        .unwrap();

    // 26 升在默认阈值下是 Tier2，覆写后为 Tier1
    let today = Local::now().date_naive();
    let receipt = state
        .herd_api
        .record_milk_collection(first.id, 26.0, today)
        .unwrap();
    assert_eq!(receipt.batch.and_then(|b| b.tier()), Some(BatchTier::Tier1));
    state
        .herd_api
        .record_milk_collection(second.id, 12.0, today)
        .unwrap();

    // 默认 limit 被覆写为 1
    let ranking = state.production_api.top_producers(farm.id, None, None).unwrap();
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].animal_id, first.id);

    // 妊娠天数 280
    state.reproduction_api.create_record(first.id, None).unwrap();
    let record = state
        .reproduction_api
        .transition_phase(
            first.id,
            PhaseTransition::Pregnant(PregnancyPayload {
                pregnancy_date: Some(date(2026, 1, 1)),
                ..Default::default()
            })
            .into(),
        )
        .unwrap();
    assert_eq!(record.expected_birth_date, Some(date(2026, 10, 8)));
}

#[test]
fn test_malformed_values_fall_back() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    config_manager.set_config(config_keys::GESTATION_DAYS, "-5").unwrap();
    config_manager.set_config(config_keys::LACTATION_OFFSET_DAYS, "sixty").unwrap();
    config_manager.set_config(config_keys::TOP_PRODUCERS_WINDOW_DAYS, "0").unwrap();

    assert_eq!(config_manager.get_reproduction_config().unwrap().gestation_days, 283);
    assert_eq!(config_manager.get_production_config().unwrap().lactation_offset_days, 60);
    assert_eq!(config_manager.get_top_producers_defaults().unwrap().window_days, 30);

    config_manager.set_config(config_keys::GESTATION_DAYS, "99999999999").unwrap();
    assert_eq!(config_manager.get_reproduction_config().unwrap().gestation_days, 283);

    let snapshot = config_manager.get_config_snapshot().unwrap();
    assert!(snapshot.contains("sixty"));
}
