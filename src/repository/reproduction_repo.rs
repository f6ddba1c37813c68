// ==========================================
// 牧场管理系统 - 繁殖记录数据仓储
// ==========================================
// 对齐: reproduction_record 表
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::reproduction::ReproductionRecord;
use crate::domain::types::ReproductionPhase;
use crate::repository::error::{invalid_column, RepositoryError, RepositoryResult};
use crate::repository::store::ReproductionStore;
use rusqlite::{params, Connection, Params, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ReproductionRepository - 繁殖记录仓储
// ==========================================
/// 繁殖记录仓储
/// 职责: 管理 reproduction_record 表的 CRUD 操作
/// 红线: 不含业务逻辑，只负责数据访问
pub struct ReproductionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReproductionRepository {
    /// 从共享连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按谓词查询（谓词只使用绑定参数）
    fn query_records<P: Params>(
        conn: &Connection,
        predicate: &str,
        params: P,
    ) -> RepositoryResult<Vec<ReproductionRecord>> {
        let sql = format!(
            r#"
            SELECT
                r.id, r.animal_id, r.current_phase,
                r.insemination_date, r.insemination_type,
                r.pregnancy_date, r.expected_birth_date, r.actual_birth_date,
                r.lactation_start_date, r.lactation_end_date, r.dry_period_start_date,
                r.veterinary_confirmation, r.observations,
                r.created_at, r.updated_at
            FROM reproduction_record r
            {}
            ORDER BY r.id ASC
            "#,
            predicate
        );

        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params, map_record_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

impl ReproductionStore for ReproductionRepository {
    fn create(&self, record: &ReproductionRecord) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO reproduction_record (
                animal_id, current_phase,
                insemination_date, insemination_type,
                pregnancy_date, expected_birth_date, actual_birth_date,
                lactation_start_date, lactation_end_date, dry_period_start_date,
                veterinary_confirmation, observations,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                record.animal_id,
                record.current_phase.to_db_str(),
                record.insemination_date,
                record.insemination_type,
                record.pregnancy_date,
                record.expected_birth_date,
                record.actual_birth_date,
                record.lactation_start_date,
                record.lactation_end_date,
                record.dry_period_start_date,
                record.veterinary_confirmation,
                record.observations,
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ReproductionRecord>> {
        let conn = self.get_conn()?;
        let mut records = Self::query_records(&conn, "WHERE r.id = ?1", params![id])?;
        Ok(records.pop())
    }

    fn find_by_animal_id(&self, animal_id: i64) -> RepositoryResult<Option<ReproductionRecord>> {
        let conn = self.get_conn()?;
        let mut records =
            Self::query_records(&conn, "WHERE r.animal_id = ?1", params![animal_id])?;
        // 唯一索引保证至多一条
        Ok(records.pop())
    }

    fn find_by_farm_id(&self, farm_id: i64) -> RepositoryResult<Vec<ReproductionRecord>> {
        let conn = self.get_conn()?;
        Self::query_records(
            &conn,
            "JOIN animal a ON a.id = r.animal_id WHERE a.farm_id = ?1",
            params![farm_id],
        )
    }

    fn find_by_phase(&self, phase: ReproductionPhase) -> RepositoryResult<Vec<ReproductionRecord>> {
        let conn = self.get_conn()?;
        Self::query_records(
            &conn,
            "WHERE r.current_phase = ?1",
            params![phase.to_db_str()],
        )
    }

    fn update(&self, record: &ReproductionRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE reproduction_record SET
                animal_id = ?2,
                current_phase = ?3,
                insemination_date = ?4,
                insemination_type = ?5,
                pregnancy_date = ?6,
                expected_birth_date = ?7,
                actual_birth_date = ?8,
                lactation_start_date = ?9,
                lactation_end_date = ?10,
                dry_period_start_date = ?11,
                veterinary_confirmation = ?12,
                observations = ?13,
                created_at = ?14,
                updated_at = ?15
            WHERE id = ?1
            "#,
            params![
                record.id,
                record.animal_id,
                record.current_phase.to_db_str(),
                record.insemination_date,
                record.insemination_type,
                record.pregnancy_date,
                record.expected_birth_date,
                record.actual_birth_date,
                record.lactation_start_date,
                record.lactation_end_date,
                record.dry_period_start_date,
                record.veterinary_confirmation,
                record.observations,
                record.created_at,
                record.updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ReproductionRecord".to_string(),
                id: record.id.to_string(),
            });
        }
        Ok(())
    }

    fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM reproduction_record WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ReproductionRecord".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

// ==========================================
// 看板查询
// ==========================================
impl ReproductionRepository {
    /// 统计各阶段记录数
    pub fn count_by_phase(&self) -> RepositoryResult<Vec<(ReproductionPhase, i64)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT current_phase, COUNT(*) FROM reproduction_record GROUP BY current_phase ORDER BY current_phase",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let raw: String = row.get(0)?;
                let phase = ReproductionPhase::parse(&raw)
                    .ok_or_else(|| invalid_column(0, format!("未知繁殖阶段: {}", raw)))?;
                Ok((phase, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询预产期落在区间内的妊娠记录
    pub fn find_due_between(
        &self,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    ) -> RepositoryResult<Vec<ReproductionRecord>> {
        let conn = self.get_conn()?;
        Self::query_records(
            &conn,
            "WHERE r.current_phase = 'PREGNANT' AND r.expected_birth_date BETWEEN ?1 AND ?2",
            params![start, end],
        )
    }
}

fn map_record_row(row: &Row<'_>) -> rusqlite::Result<ReproductionRecord> {
    let raw_phase: String = row.get(2)?;
    let current_phase = ReproductionPhase::parse(&raw_phase)
        .ok_or_else(|| invalid_column(2, format!("未知繁殖阶段: {}", raw_phase)))?;

    Ok(ReproductionRecord {
        id: row.get(0)?,
        animal_id: row.get(1)?,
        current_phase,
        insemination_date: row.get(3)?,
        insemination_type: row.get(4)?,
        pregnancy_date: row.get(5)?,
        expected_birth_date: row.get(6)?,
        actual_birth_date: row.get(7)?,
        lactation_start_date: row.get(8)?,
        lactation_end_date: row.get(9)?,
        dry_period_start_date: row.get(10)?,
        veterinary_confirmation: row.get(11)?,
        observations: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_with_schema;
    use chrono::NaiveDate;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = open_in_memory_with_schema().unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO farm (id, name, created_at) VALUES (1, '一号牧场', '2026-01-01 00:00:00');
            INSERT INTO farm (id, name, created_at) VALUES (2, '二号牧场', '2026-01-01 00:00:00');
            INSERT INTO animal (id, farm_id, name, ear_tag, sex, created_at, updated_at)
                VALUES (1, 1, '花花', 'E001', 'FEMALE', '2026-01-01 00:00:00', '2026-01-01 00:00:00');
            INSERT INTO animal (id, farm_id, name, ear_tag, sex, created_at, updated_at)
                VALUES (2, 1, '白白', 'E002', 'FEMALE', '2026-01-01 00:00:00', '2026-01-01 00:00:00');
            INSERT INTO animal (id, farm_id, name, ear_tag, sex, created_at, updated_at)
                VALUES (3, 2, '黑黑', 'E003', 'FEMALE', '2026-01-01 00:00:00', '2026-01-01 00:00:00');
            "#,
        )
        .unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn make_record(animal_id: i64, phase: ReproductionPhase) -> ReproductionRecord {
        let now = NaiveDate::from_ymd_opt(2026, 2, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        ReproductionRecord::new(animal_id, phase, now)
    }

    #[test]
    fn test_create_and_find() {
        let repo = ReproductionRepository::new(setup_test_db());

        let mut record = make_record(1, ReproductionPhase::Pregnant);
        record.pregnancy_date = NaiveDate::from_ymd_opt(2026, 1, 10);
        record.veterinary_confirmation = true;
        record.observations = Some("状态良好".to_string());

        let id = repo.create(&record).unwrap();
        assert!(id > 0);

        let found = repo.find_by_id(id).unwrap().expect("应该能查询到记录");
        record.id = id;
        assert_eq!(found, record);

        let by_animal = repo.find_by_animal_id(1).unwrap();
        assert_eq!(by_animal.map(|r| r.id), Some(id));

        assert!(repo.find_by_id(999).unwrap().is_none());
        assert!(repo.find_by_animal_id(2).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_animal_rejected_by_store() {
        let repo = ReproductionRepository::new(setup_test_db());
        repo.create(&make_record(1, ReproductionPhase::Empty)).unwrap();

        let err = repo
            .create(&make_record(1, ReproductionPhase::Pregnant))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_find_by_farm_and_phase() {
        let repo = ReproductionRepository::new(setup_test_db());
        repo.create(&make_record(1, ReproductionPhase::Pregnant)).unwrap();
        repo.create(&make_record(2, ReproductionPhase::Lactating)).unwrap();
        repo.create(&make_record(3, ReproductionPhase::Pregnant)).unwrap();

        let farm1 = repo.find_by_farm_id(1).unwrap();
        assert_eq!(farm1.iter().map(|r| r.animal_id).collect::<Vec<_>>(), vec![1, 2]);

        let pregnant = repo.find_by_phase(ReproductionPhase::Pregnant).unwrap();
        assert_eq!(pregnant.iter().map(|r| r.animal_id).collect::<Vec<_>>(), vec![1, 3]);

        assert!(repo.find_by_farm_id(42).unwrap().is_empty());
        assert!(repo.find_by_phase(ReproductionPhase::Drying).unwrap().is_empty());

        let counts = repo.count_by_phase().unwrap();
        assert!(counts.contains(&(ReproductionPhase::Pregnant, 2)));
        assert!(counts.contains(&(ReproductionPhase::Lactating, 1)));
    }

    #[test]
    fn test_update_and_delete() {
        let repo = ReproductionRepository::new(setup_test_db());
        let id = repo.create(&make_record(1, ReproductionPhase::Empty)).unwrap();

        let mut record = repo.find_by_id(id).unwrap().unwrap();
        record.current_phase = ReproductionPhase::Drying;
        record.dry_period_start_date = NaiveDate::from_ymd_opt(2026, 2, 15);
        repo.update(&record).unwrap();

        let reloaded = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(reloaded.current_phase, ReproductionPhase::Drying);
        assert_eq!(reloaded.dry_period_start_date, NaiveDate::from_ymd_opt(2026, 2, 15));

        repo.delete(id).unwrap();
        assert!(repo.find_by_id(id).unwrap().is_none());

        let err = repo.delete(id).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_find_due_between() {
        let repo = ReproductionRepository::new(setup_test_db());
        let mut record = make_record(1, ReproductionPhase::Pregnant);
        record.expected_birth_date = NaiveDate::from_ymd_opt(2026, 10, 10);
        repo.create(&record).unwrap();

        let due = repo
            .find_due_between(
                NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 10, 31).unwrap(),
            )
            .unwrap();
        assert_eq!(due.len(), 1);

        let none = repo
            .find_due_between(
                NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 11, 30).unwrap(),
            )
            .unwrap();
        assert!(none.is_empty());
    }
}
