// ==========================================
// 牧场管理系统 - 牧场 / 牲畜数据仓储
// ==========================================
// 对齐: farm / animal 表
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::animal::{Animal, Farm};
use crate::domain::types::{BatchTier, Sex};
use crate::repository::error::{invalid_column, RepositoryError, RepositoryResult};
use crate::repository::store::AnimalStore;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// FarmRepository - 牧场仓储
// ==========================================
pub struct FarmRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FarmRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建牧场，返回新分配的 ID
    pub fn create(&self, farm: &Farm) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO farm (name, created_at) VALUES (?1, ?2)",
            params![farm.name, farm.created_at],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Farm>> {
        let conn = self.get_conn()?;
        let farm = conn
            .query_row(
                "SELECT id, name, created_at FROM farm WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Farm {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(farm)
    }
}

// ==========================================
// AnimalRepository - 牲畜仓储
// ==========================================
/// 牲畜仓储
/// 职责: 管理 animal 表的 CRUD 操作
pub struct AnimalRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AnimalRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl AnimalStore for AnimalRepository {
    fn create(&self, animal: &Animal) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO animal (
                farm_id, name, ear_tag, breed, sex, birth_date, photo_url,
                current_batch, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                animal.farm_id,
                animal.name,
                animal.ear_tag,
                animal.breed,
                animal.sex.to_db_str(),
                animal.birth_date,
                animal.photo_url,
                animal.current_batch.as_i32(),
                animal.created_at,
                animal.updated_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Animal>> {
        let conn = self.get_conn()?;
        let animal = conn
            .query_row(
                r#"
                SELECT id, farm_id, name, ear_tag, breed, sex, birth_date, photo_url,
                       current_batch, created_at, updated_at
                FROM animal
                WHERE id = ?1
                "#,
                params![id],
                map_animal_row,
            )
            .optional()?;
        Ok(animal)
    }

    fn find_by_farm_id(&self, farm_id: i64) -> RepositoryResult<Vec<Animal>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, farm_id, name, ear_tag, breed, sex, birth_date, photo_url,
                   current_batch, created_at, updated_at
            FROM animal
            WHERE farm_id = ?1
            ORDER BY id ASC
            "#,
        )?;
        let animals = stmt
            .query_map(params![farm_id], map_animal_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(animals)
    }

    fn update(&self, animal: &Animal) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE animal SET
                farm_id = ?2,
                name = ?3,
                ear_tag = ?4,
                breed = ?5,
                sex = ?6,
                birth_date = ?7,
                photo_url = ?8,
                current_batch = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
            params![
                animal.id,
                animal.farm_id,
                animal.name,
                animal.ear_tag,
                animal.breed,
                animal.sex.to_db_str(),
                animal.birth_date,
                animal.photo_url,
                animal.current_batch.as_i32(),
                animal.updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Animal".to_string(),
                id: animal.id.to_string(),
            });
        }
        Ok(())
    }
}

fn map_animal_row(row: &Row<'_>) -> rusqlite::Result<Animal> {
    let batch: i32 = row.get(8)?;
    let current_batch = BatchTier::from_i32(batch)
        .ok_or_else(|| invalid_column(8, format!("无效的分群: {}", batch)))?;
    let sex: Sex = row
        .get::<_, String>(5)?
        .parse()
        .map_err(|message| invalid_column(5, message))?;

    Ok(Animal {
        id: row.get(0)?,
        farm_id: row.get(1)?,
        name: row.get(2)?,
        ear_tag: row.get(3)?,
        breed: row.get(4)?,
        sex,
        birth_date: row.get(6)?,
        photo_url: row.get(7)?,
        current_batch,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_with_schema;
    use chrono::{NaiveDate, NaiveDateTime};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_farm_and_animal_roundtrip() {
        let conn = Arc::new(Mutex::new(open_in_memory_with_schema().unwrap()));
        let farm_repo = FarmRepository::new(conn.clone());
        let animal_repo = AnimalRepository::new(conn);

        let farm_id = farm_repo
            .create(&Farm {
                id: 0,
                name: "东山牧场".to_string(),
                created_at: now(),
            })
            .unwrap();
        assert_eq!(farm_repo.find_by_id(farm_id).unwrap().unwrap().name, "东山牧场");
        assert!(farm_repo.find_by_id(farm_id + 1).unwrap().is_none());

        let mut animal = Animal::new(farm_id, "小花", "CN-0001", Sex::Female, now());
        animal.breed = Some("荷斯坦".to_string());
        animal.birth_date = NaiveDate::from_ymd_opt(2022, 4, 18);

        let id = animal_repo.create(&animal).unwrap();
        let found = animal_repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(found.ear_tag, "CN-0001");
        assert_eq!(found.current_batch, BatchTier::Tier3);
        assert_eq!(found.birth_date, NaiveDate::from_ymd_opt(2022, 4, 18));

        let mut updated = found.clone();
        updated.current_batch = BatchTier::Tier1;
        animal_repo.update(&updated).unwrap();
        assert_eq!(
            animal_repo.find_by_id(id).unwrap().unwrap().current_batch,
            BatchTier::Tier1
        );

        assert_eq!(animal_repo.find_by_farm_id(farm_id).unwrap().len(), 1);
        assert!(animal_repo.find_by_farm_id(farm_id + 1).unwrap().is_empty());
    }

    #[test]
    fn test_animal_requires_existing_farm() {
        let conn = Arc::new(Mutex::new(open_in_memory_with_schema().unwrap()));
        let animal_repo = AnimalRepository::new(conn);

        let err = animal_repo
            .create(&Animal::new(99, "无主", "X-1", Sex::Female, now()))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
    }

    #[test]
    fn test_unknown_sex_in_row_is_field_error() {
        let conn = Arc::new(Mutex::new(open_in_memory_with_schema().unwrap()));
        conn.lock()
            .unwrap()
            .execute_batch(
                r#"
                INSERT INTO farm (id, name, created_at) VALUES (1, '牧场', '2026-03-01 06:00:00');
                INSERT INTO animal (id, farm_id, name, ear_tag, sex, created_at, updated_at)
                    VALUES (7, 1, '来历不明', 'X-7', 'BULL', '2026-03-01 06:00:00', '2026-03-01 06:00:00');
                "#,
            )
            .unwrap();
        let animal_repo = AnimalRepository::new(conn);

        match animal_repo.find_by_id(7).unwrap_err() {
            RepositoryError::FieldValueError { field, message } => {
                assert_eq!(field, "column#5");
                assert!(message.contains("BULL"));
            }
            other => panic!("Expected FieldValueError, got {:?}", other),
        }
        assert!(animal_repo.find_by_farm_id(1).is_err());
    }

    #[test]
    fn test_update_missing_animal() {
        let conn = Arc::new(Mutex::new(open_in_memory_with_schema().unwrap()));
        let animal_repo = AnimalRepository::new(conn);

        let mut ghost = Animal::new(1, "幽灵", "X-2", Sex::Female, now());
        ghost.id = 404;
        let err = animal_repo.update(&ghost).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
