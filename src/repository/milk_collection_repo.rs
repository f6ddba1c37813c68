// ==========================================
// 牧场管理系统 - 挤奶记录数据仓储
// ==========================================
// 对齐: milk_collection 表
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::milk::{DateRange, MilkCollection};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store::MilkCollectionStore;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// MilkCollectionRepository - 挤奶记录仓储
// ==========================================
pub struct MilkCollectionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MilkCollectionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 整条覆盖（挤奶记录创建后只能显式更新）
    pub fn update(&self, collection: &MilkCollection) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE milk_collection SET
                animal_id = ?2, liters = ?3, collection_date = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
            params![
                collection.id,
                collection.animal_id,
                collection.liters,
                collection.collection_date,
                collection.updated_at,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "MilkCollection".to_string(),
                id: collection.id.to_string(),
            });
        }
        Ok(())
    }
}

impl MilkCollectionStore for MilkCollectionRepository {
    fn create(&self, collection: &MilkCollection) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO milk_collection (animal_id, liters, collection_date, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                collection.animal_id,
                collection.liters,
                collection.collection_date,
                collection.created_at,
                collection.updated_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn find_by_id(&self, id: i64) -> RepositoryResult<Option<MilkCollection>> {
        let conn = self.get_conn()?;
        let collection = conn
            .query_row(
                r#"
                SELECT id, animal_id, liters, collection_date, created_at, updated_at
                FROM milk_collection
                WHERE id = ?1
                "#,
                params![id],
                map_collection_row,
            )
            .optional()?;
        Ok(collection)
    }

    fn find_by_animal_id(&self, animal_id: i64) -> RepositoryResult<Vec<MilkCollection>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, animal_id, liters, collection_date, created_at, updated_at
            FROM milk_collection
            WHERE animal_id = ?1
            ORDER BY collection_date ASC, id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![animal_id], map_collection_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn find_by_farm_id(&self, farm_id: i64, range: DateRange) -> RepositoryResult<Vec<MilkCollection>> {
        let conn = self.get_conn()?;

        // 日期条件按区间端点是否存在动态拼接，值一律走绑定参数
        let mut sql = String::from(
            r#"
            SELECT m.id, m.animal_id, m.liters, m.collection_date, m.created_at, m.updated_at
            FROM milk_collection m
            JOIN animal a ON a.id = m.animal_id
            WHERE a.farm_id = ?
            "#,
        );
        let mut bind: Vec<Box<dyn ToSql>> = vec![Box::new(farm_id)];
        if let Some(start) = range.start {
            sql.push_str(" AND m.collection_date >= ?");
            bind.push(Box::new(start));
        }
        if let Some(end) = range.end {
            sql.push_str(" AND m.collection_date <= ?");
            bind.push(Box::new(end));
        }
        sql.push_str(" ORDER BY m.collection_date ASC, m.id ASC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                rusqlite::params_from_iter(bind.iter().map(|b| b.as_ref())),
                map_collection_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn map_collection_row(row: &Row<'_>) -> rusqlite::Result<MilkCollection> {
    Ok(MilkCollection {
        id: row.get(0)?,
        animal_id: row.get(1)?,
        liters: row.get(2)?,
        collection_date: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_with_schema;
    use chrono::{NaiveDate, NaiveDateTime};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn now() -> NaiveDateTime {
        date(4, 1).and_hms_opt(5, 0, 0).unwrap()
    }

    fn setup() -> MilkCollectionRepository {
        let conn = open_in_memory_with_schema().unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO farm (id, name, created_at) VALUES (1, 'A', '2026-01-01 00:00:00');
            INSERT INTO farm (id, name, created_at) VALUES (2, 'B', '2026-01-01 00:00:00');
            INSERT INTO animal (id, farm_id, name, ear_tag, sex, created_at, updated_at)
                VALUES (10, 1, 'a', 'T10', 'FEMALE', '2026-01-01 00:00:00', '2026-01-01 00:00:00');
            INSERT INTO animal (id, farm_id, name, ear_tag, sex, created_at, updated_at)
                VALUES (20, 2, 'b', 'T20', 'FEMALE', '2026-01-01 00:00:00', '2026-01-01 00:00:00');
            "#,
        )
        .unwrap();
        MilkCollectionRepository::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_create_find_update() {
        let repo = setup();
        let id = repo.create(&MilkCollection::new(10, 21.5, date(3, 1), now())).unwrap();

        let mut found = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(found.liters, 21.5);
        assert_eq!(found.collection_date, date(3, 1));

        found.liters = 22.0;
        repo.update(&found).unwrap();
        assert_eq!(repo.find_by_id(id).unwrap().unwrap().liters, 22.0);
        assert!(repo.find_by_id(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_find_by_farm_with_range() {
        let repo = setup();
        repo.create(&MilkCollection::new(10, 10.0, date(3, 1), now())).unwrap();
        repo.create(&MilkCollection::new(10, 11.0, date(3, 15), now())).unwrap();
        repo.create(&MilkCollection::new(10, 12.0, date(3, 31), now())).unwrap();
        repo.create(&MilkCollection::new(20, 99.0, date(3, 15), now())).unwrap();

        let all = repo.find_by_farm_id(1, DateRange::unbounded()).unwrap();
        assert_eq!(all.len(), 3);

        let mid = repo
            .find_by_farm_id(1, DateRange::between(date(3, 2), date(3, 31)))
            .unwrap();
        assert_eq!(mid.iter().map(|c| c.liters).collect::<Vec<_>>(), vec![11.0, 12.0]);

        let until = repo
            .find_by_farm_id(
                1,
                DateRange {
                    start: None,
                    end: Some(date(3, 15)),
                },
            )
            .unwrap();
        assert_eq!(until.len(), 2);

        let other_farm = repo.find_by_farm_id(2, DateRange::unbounded()).unwrap();
        assert_eq!(other_farm.len(), 1);
        assert_eq!(other_farm[0].animal_id, 20);
    }

    #[test]
    fn test_find_by_animal_sorted_by_date() {
        let repo = setup();
        repo.create(&MilkCollection::new(10, 3.0, date(3, 3), now())).unwrap();
        repo.create(&MilkCollection::new(10, 1.0, date(3, 1), now())).unwrap();
        repo.create(&MilkCollection::new(10, 2.0, date(3, 2), now())).unwrap();

        let rows = repo.find_by_animal_id(10).unwrap();
        assert_eq!(rows.iter().map(|c| c.liters).collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
        assert!(repo.find_by_animal_id(20).unwrap().is_empty());
    }
}
