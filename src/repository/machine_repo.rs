// ==========================================
// 矿山设备车队决策支持系统 - 设备筛选仓储
// ==========================================
// 职责: 设备选择条件 → 设备列表（关联型号/品牌/分类/当前工作面）
// 红线: Repository 不含业务逻辑
// 约束: 结果按设备 ID 升序，保证下游聚合顺序确定
// ==========================================

use crate::domain::machine::{
    Machine, MachineClass, MachineClassTree, MachineFace, MachineSelection, SelectionCriterion,
};
use crate::repository::db_utils::{build_in_clause, parse_db_date};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params_from_iter, Connection, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// MachineFilter Trait
// ==========================================
// 用途: 聚合接口解析设备范围
// 实现者: SqliteMachineRepository
#[async_trait]
pub trait MachineFilter: Send + Sync {
    /// 按选择条件解析设备
    ///
    /// # 返回
    /// - 未提供任何条件时返回空列表（不是"全部设备"）
    async fn resolve(&self, selection: &MachineSelection) -> RepositoryResult<Vec<Machine>>;

    /// 组织内某品牌的全部设备（行业对比队列）
    async fn find_by_mark(&self, organization_id: i64, mark_id: i64)
        -> RepositoryResult<Vec<Machine>>;

    /// 加载设备分类树
    async fn class_tree(&self) -> RepositoryResult<MachineClassTree>;
}

const MACHINE_SELECT: &str = r#"
    SELECT
        m.id, m.organization_id, m.inventory_number,
        m.price, m.date_entry, m.year_decommission,
        t.id, t.name,
        mk.id, mk.name,
        c.id, c.name, c.parent_id
    FROM machine m
    JOIN machine_type t ON t.id = m.machine_type_id
    JOIN machine_mark mk ON mk.id = t.mark_id
    JOIN machine_class c ON c.id = t.machine_class_id
    WHERE m.organization_id = ?
"#;

// ==========================================
// SqliteMachineRepository
// ==========================================
pub struct SqliteMachineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMachineRepository {
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

    /// 读取全部设备分类
    pub fn list_classes(&self) -> RepositoryResult<Vec<MachineClass>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, name, parent_id FROM machine_class ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(MachineClass {
                id: row.get(0)?,
                name: row.get(1)?,
                parent_id: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 按条件列查询设备
    ///
    /// # 参数
    /// - `organization_id`: 组织
    /// - `column`: 过滤列（如 "m.id"、"t.mark_id"）
    /// - `ids`: 过滤值
    fn query_machines(
        &self,
        organization_id: i64,
        column: &str,
        ids: &[i64],
    ) -> RepositoryResult<Vec<Machine>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut machines = {
            let conn = self.get_conn()?;
            let sql = format!(
                "{} AND {} ORDER BY m.id",
                MACHINE_SELECT,
                build_in_clause(column, ids.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let params = std::iter::once(organization_id).chain(ids.iter().copied());
            let rows = stmt.query_map(params_from_iter(params), map_machine_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let machine_ids: Vec<i64> = machines.iter().map(|m| m.id).collect();
        let faces = self.find_current_faces(&machine_ids)?;
        for machine in &mut machines {
            machine.current_zone = faces
                .get(&machine.id)
                .and_then(|f| f.zone_working.clone());
        }

        debug!(
            organization_id = organization_id,
            filter = column,
            requested = ids.len(),
            resolved = machines.len(),
            "设备筛选完成"
        );
        Ok(machines)
    }

    /// 每台设备的当前工作面（date_change 最大的换面记录）
    pub fn find_current_faces(
        &self,
        machine_ids: &[i64],
    ) -> RepositoryResult<HashMap<i64, MachineFace>> {
        if machine_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT
                mf.machine_id, mf.face_id, f.name, f.zone_working, mf.date_change,
                mf.machine_performance, mf.fuel_consumption, mf.average_speed
            FROM machine2face mf
            JOIN face f ON f.id = mf.face_id
            WHERE {}
            ORDER BY mf.machine_id, mf.date_change, mf.id
            "#,
            build_in_clause("mf.machine_id", machine_ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(machine_ids.iter()), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<f64>>(5)?,
                row.get::<_, Option<f64>>(6)?,
                row.get::<_, Option<f64>>(7)?,
            ))
        })?;

        // 按 date_change 升序遍历，后出现的覆盖先出现的
        let mut current: HashMap<i64, MachineFace> = HashMap::new();
        for row in rows {
            let (machine_id, face_id, face_name, zone_working, date_raw, perf, fuel, speed) = row?;
            let date_change =
                parse_db_date(&date_raw).ok_or_else(|| RepositoryError::InvalidValue {
                    field: "machine2face.date_change".to_string(),
                    message: format!("machine_id={}, value={}", machine_id, date_raw),
                })?;
            current.insert(
                machine_id,
                MachineFace {
                    machine_id,
                    face_id,
                    face_name,
                    zone_working,
                    date_change,
                    machine_performance: perf,
                    fuel_consumption: fuel,
                    average_speed: speed,
                },
            );
        }
        Ok(current)
    }
}

fn map_machine_row(row: &Row<'_>) -> rusqlite::Result<Machine> {
    Ok(Machine {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        inventory_number: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        price: row.get(3)?,
        date_entry: row
            .get::<_, Option<String>>(4)?
            .and_then(|s| parse_db_date(&s)),
        year_decommission: row.get(5)?,
        machine_type_id: row.get(6)?,
        machine_type_name: row.get(7)?,
        mark_id: row.get(8)?,
        mark_name: row.get(9)?,
        machine_class_id: row.get(10)?,
        machine_class_name: row.get(11)?,
        machine_class_parent_id: row.get(12)?,
        current_zone: None,
    })
}

#[async_trait]
impl MachineFilter for SqliteMachineRepository {
    async fn resolve(&self, selection: &MachineSelection) -> RepositoryResult<Vec<Machine>> {
        let org = selection.organization_id;
        match selection.criterion() {
            None => Ok(Vec::new()),
            Some(SelectionCriterion::Machines(ids)) => self.query_machines(org, "m.id", &ids),
            Some(SelectionCriterion::Types(ids)) => self.query_machines(org, "t.id", &ids),
            Some(SelectionCriterion::Marks(ids)) => self.query_machines(org, "t.mark_id", &ids),
            Some(SelectionCriterion::Classes(ids)) => {
                let tree = MachineClassTree::from_classes(self.list_classes()?);
                let expanded: Vec<i64> = tree.expand(&ids).into_iter().collect();
                self.query_machines(org, "t.machine_class_id", &expanded)
            }
        }
    }

    async fn find_by_mark(
        &self,
        organization_id: i64,
        mark_id: i64,
    ) -> RepositoryResult<Vec<Machine>> {
        self.query_machines(organization_id, "t.mark_id", &[mark_id])
    }

    async fn class_tree(&self) -> RepositoryResult<MachineClassTree> {
        Ok(MachineClassTree::from_classes(self.list_classes()?))
    }
}
