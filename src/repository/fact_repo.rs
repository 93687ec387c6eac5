// ==========================================
// 矿山设备车队决策支持系统 - 事实记录仓储
// ==========================================
// 职责: 按设备集合 + 日期范围读取成本 / 工时产量 / КТГ 记录
// 红线: Repository 不含业务逻辑（不区分实际/目标，由引擎处理）
// 约束: 日期范围按整日闭区间过滤
// ==========================================

use crate::domain::facts::{CostKind, CostRecord, CtfRecord, WorkTimeProductivityRecord};
use crate::domain::period::DateRange;
use crate::domain::types::CostCategory;
use crate::repository::db_utils::{build_in_clause, format_db_date, parse_db_date};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

// ==========================================
// FactRepository Trait
// ==========================================
// 实现者: SqliteFactRepository
#[async_trait]
pub trait FactRepository: Send + Sync {
    /// 成本记录（实际 + 目标）
    async fn find_costs(
        &self,
        machine_ids: &[i64],
        range: &DateRange,
    ) -> RepositoryResult<Vec<CostRecord>>;

    /// 工时与产量记录（实际 + 目标）
    async fn find_productivity(
        &self,
        machine_ids: &[i64],
        range: &DateRange,
    ) -> RepositoryResult<Vec<WorkTimeProductivityRecord>>;

    /// 技术完好率原始记录
    async fn find_ctf_records(
        &self,
        machine_ids: &[i64],
        range: &DateRange,
    ) -> RepositoryResult<Vec<CtfRecord>>;
}

// ==========================================
// SqliteFactRepository
// ==========================================
pub struct SqliteFactRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteFactRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 绑定参数: 起始日期、结束日期、设备 ID 列表
    fn range_params(machine_ids: &[i64], range: &DateRange) -> Vec<Value> {
        let mut values = Vec::with_capacity(machine_ids.len() + 2);
        values.push(Value::Text(format_db_date(range.start)));
        values.push(Value::Text(format_db_date(range.end)));
        values.extend(machine_ids.iter().map(|&id| Value::Integer(id)));
        values
    }
}

/// 解析必填日期列，失败返回 InvalidValue
fn required_date(field: &str, id: i64, raw: &str) -> RepositoryResult<NaiveDate> {
    parse_db_date(raw).ok_or_else(|| RepositoryError::InvalidValue {
        field: field.to_string(),
        message: format!("id={}, value={}", id, raw),
    })
}

#[async_trait]
impl FactRepository for SqliteFactRepository {
    async fn find_costs(
        &self,
        machine_ids: &[i64],
        range: &DateRange,
    ) -> RepositoryResult<Vec<CostRecord>> {
        if machine_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT
                c.id, c.machine_id, c.date_period, c.value, c.is_model,
                k.id, k.name, k.is_model, k.category
            FROM cost c
            JOIN costs_kind k ON k.id = c.kind_id
            WHERE date(c.date_period) BETWEEN ? AND ?
              AND {}
            ORDER BY date(c.date_period), c.machine_id, c.id
            "#,
            build_in_clause("c.machine_id", machine_ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(Self::range_params(machine_ids, range)),
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, bool>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, bool>(7)?,
                    row.get::<_, Option<String>>(8)?,
                ))
            },
        )?;

        let mut records = Vec::new();
        for row in rows {
            let (id, machine_id, date_raw, value, is_model, kind_id, kind_name, kind_model, category_raw) =
                row?;
            let category = match category_raw.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(raw) => {
                    let parsed = CostCategory::from_str(raw);
                    if parsed.is_none() {
                        warn!(kind_id = kind_id, category = raw, "未知成本类别，按未分类处理");
                    }
                    parsed
                }
            };
            records.push(CostRecord {
                id,
                machine_id,
                kind: CostKind {
                    id: kind_id,
                    name: kind_name,
                    is_model: kind_model,
                    category,
                },
                date_period: required_date("cost.date_period", id, &date_raw)?,
                value,
                is_model,
            });
        }

        debug!(machines = machine_ids.len(), rows = records.len(), "成本记录读取完成");
        Ok(records)
    }

    async fn find_productivity(
        &self,
        machine_ids: &[i64],
        range: &DateRange,
    ) -> RepositoryResult<Vec<WorkTimeProductivityRecord>> {
        if machine_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT id, machine_id, strategy_id, date_period, work_time, productivity, is_model
            FROM work_time_productivity
            WHERE date(date_period) BETWEEN ? AND ?
              AND {}
            ORDER BY date(date_period), machine_id, id
            "#,
            build_in_clause("machine_id", machine_ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(Self::range_params(machine_ids, range)),
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                    row.get::<_, bool>(6)?,
                ))
            },
        )?;

        let mut records = Vec::new();
        for row in rows {
            let (id, machine_id, strategy_id, date_raw, work_time, productivity, is_model) = row?;
            records.push(WorkTimeProductivityRecord {
                id,
                machine_id,
                strategy_id,
                date_period: required_date("work_time_productivity.date_period", id, &date_raw)?,
                work_time,
                productivity,
                is_model,
            });
        }

        debug!(machines = machine_ids.len(), rows = records.len(), "工时产量记录读取完成");
        Ok(records)
    }

    async fn find_ctf_records(
        &self,
        machine_ids: &[i64],
        range: &DateRange,
    ) -> RepositoryResult<Vec<CtfRecord>> {
        if machine_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT
                id, machine_id, date_period,
                worktime_f, worktime_c,
                planned_oatd_f, planned_oatd_c,
                unplanned_oatd_f, unplanned_oatd_c,
                tm_f, tm_c, tr_f, tr_c, mr_f, mr_c,
                unplanned_repair_f, unplanned_repair_c
            FROM ctf_record
            WHERE date(date_period) BETWEEN ? AND ?
              AND {}
            ORDER BY date(date_period), machine_id, id
            "#,
            build_in_clause("machine_id", machine_ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(Self::range_params(machine_ids, range)),
            |row| {
                Ok(CtfRecord {
                    id: row.get(0)?,
                    machine_id: row.get(1)?,
                    date_period: row
                        .get::<_, Option<String>>(2)?
                        .and_then(|s| parse_db_date(&s)),
                    worktime_f: row.get(3)?,
                    worktime_c: row.get(4)?,
                    planned_oatd_f: row.get(5)?,
                    planned_oatd_c: row.get(6)?,
                    unplanned_oatd_f: row.get(7)?,
                    unplanned_oatd_c: row.get(8)?,
                    tm_f: row.get(9)?,
                    tm_c: row.get(10)?,
                    tr_f: row.get(11)?,
                    tr_c: row.get(12)?,
                    mr_f: row.get(13)?,
                    mr_c: row.get(14)?,
                    unplanned_repair_f: row.get(15)?,
                    unplanned_repair_c: row.get(16)?,
                })
            },
        )?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;

        debug!(machines = machine_ids.len(), rows = records.len(), "КТГ 记录读取完成");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn setup() -> SqliteFactRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO costs_kind (id, name, is_model, category) VALUES
                (1, 'ТО', 0, 'MAINTENANCE_REPAIR'), (2, 'Прочее', 0, NULL), (3, 'ГСМ', 0, 'BOGUS');
            INSERT INTO cost (machine_id, kind_id, date_period, value, is_model) VALUES
                (1, 1, '2023-01-01', 100.0, 0),
                (1, 1, '2023-01-01', 80.0, 1),
                (1, 2, '2023-12-31T00:00:00', NULL, 0),
                (1, 3, '2024-01-01', 5.0, 0),
                (2, 1, '2023-06-01', 7.0, 0);
            INSERT INTO work_time_productivity (machine_id, strategy_id, date_period, work_time, productivity, is_model) VALUES
                (1, NULL, '2023-06-01', 300.0, 1000.0, 0),
                (1, NULL, '2022-12-31', 300.0, 1000.0, 0);
            INSERT INTO ctf_record (machine_id, date_period, worktime_f, tm_f) VALUES
                (1, '2023-03-01', 500.0, 10.0);
            "#,
        )
        .unwrap();
        SqliteFactRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn year_2023() -> DateRange {
        DateRange::new(d(2023, 1, 1), d(2023, 12, 31))
    }

    #[tokio::test]
    async fn test_costs_filtered_by_range_and_machines() {
        let repo = setup();
        let costs = repo.find_costs(&[1], &year_2023()).await.unwrap();
        assert_eq!(costs.len(), 3);
        assert!(costs.iter().all(|c| c.machine_id == 1));
        assert_eq!(costs[0].kind.category, Some(CostCategory::MaintenanceRepair));

        let last_day = costs.iter().find(|c| c.kind.id == 2).unwrap();
        assert_eq!(last_day.date_period, d(2023, 12, 31));
        assert_eq!(last_day.value, None);
        assert_eq!(last_day.kind.category, None);
    }

    #[tokio::test]
    async fn test_unknown_category_is_uncategorised() {
        let repo = setup();
        let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 31));
        let costs = repo.find_costs(&[1], &range).await.unwrap();
        assert_eq!(costs.len(), 1);
        assert_eq!(costs[0].kind.category, None);
    }

    #[tokio::test]
    async fn test_productivity_and_ctf() {
        let repo = setup();
        let rows = repo.find_productivity(&[1], &year_2023()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].productivity, Some(1000.0));

        let ctf = repo.find_ctf_records(&[1], &year_2023()).await.unwrap();
        assert_eq!(ctf.len(), 1);
        assert_eq!(ctf[0].fact_components().total(), 510.0);
    }

    #[tokio::test]
    async fn test_empty_machine_set() {
        let repo = setup();
        assert!(repo.find_costs(&[], &year_2023()).await.unwrap().is_empty());
    }
}
