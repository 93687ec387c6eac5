// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用辅助函数
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use async_trait::async_trait;
use rusqlite::Connection;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use mining_fleet_tep::api::{AnalyticsRequest, CtfApi, TepApi};
use mining_fleet_tep::app::AppState;
use mining_fleet_tep::config::ConfigManager;
use mining_fleet_tep::domain::facts::{CostRecord, CtfRecord, WorkTimeProductivityRecord};
use mining_fleet_tep::domain::period::DateRange;
use mining_fleet_tep::repository::{
    FactRepository, MachineFilter, RepositoryResult, SqliteMachineRepository,
};

pub use super::test_data_builder::MachineBuilder;
pub use test_helpers::*;

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// `state` 与 `conn` 指向同一个临时数据库文件；`conn` 用于准备测试数据
pub struct ApiTestEnv {
    pub db_path: String,
    pub state: AppState,
    pub conn: Connection,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 空库 + 参考数据
    pub fn new() -> Result<Self, Box<dyn Error>> {
        mining_fleet_tep::logging::init_test();

        let (temp_file, db_path) = create_test_db()?;
        let state = AppState::new(db_path.clone())?;
        let conn = mining_fleet_tep::db::open_sqlite_connection(&db_path)?;
        seed_reference_data(&conn)?;

        Ok(Self {
            db_path,
            state,
            conn,
            _temp_file: temp_file,
        })
    }

    /// 标准车队（组织 1）
    ///
    /// - 1: ЭКГ-10 挖掘机，采矿工作面，2021-03 投运，价格 1000
    /// - 2: ЭКГ-10 挖掘机，剥离工作面，2022-01 投运，价格 2000
    /// - 3: D9 推土机（辅助），排土场，2020-07 投运，价格 500
    /// - 9: 组织 2 的 ЭКГ-10（不应出现在组织 1 的结果中）
    pub fn with_standard_fleet() -> Result<Self, Box<dyn Error>> {
        let env = Self::new()?;
        MachineBuilder::new(1, 20)
            .price(1000.0)
            .date_entry("2021-03-01")
            .insert(&env.conn)?;
        MachineBuilder::new(2, 20)
            .price(2000.0)
            .date_entry("2022-01-01")
            .insert(&env.conn)?;
        MachineBuilder::new(3, 22)
            .price(500.0)
            .date_entry("2020-07-01")
            .insert(&env.conn)?;
        MachineBuilder::new(9, 20)
            .organization(2)
            .price(1.0)
            .date_entry("2019-01-01")
            .insert(&env.conn)?;

        assign_face(&env.conn, 1, 1, "2021-03-01")?;
        assign_face(&env.conn, 2, 2, "2022-01-01")?;
        assign_face(&env.conn, 3, 3, "2020-07-01")?;
        Ok(env)
    }
}

// ==========================================
// 计数事实仓储
// ==========================================

/// 只记录调用次数、始终返回空结果的事实仓储
#[derive(Default)]
pub struct CountingFactRepository {
    calls: AtomicUsize,
}

impl CountingFactRepository {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl FactRepository for CountingFactRepository {
    async fn find_costs(
        &self,
        _machine_ids: &[i64],
        _range: &DateRange,
    ) -> RepositoryResult<Vec<CostRecord>> {
        self.hit();
        Ok(Vec::new())
    }

    async fn find_productivity(
        &self,
        _machine_ids: &[i64],
        _range: &DateRange,
    ) -> RepositoryResult<Vec<WorkTimeProductivityRecord>> {
        self.hit();
        Ok(Vec::new())
    }

    async fn find_ctf_records(
        &self,
        _machine_ids: &[i64],
        _range: &DateRange,
    ) -> RepositoryResult<Vec<CtfRecord>> {
        self.hit();
        Ok(Vec::new())
    }
}

impl ApiTestEnv {
    /// 真实设备过滤 + 计数事实仓储
    pub fn apis_with_counting_facts(
        &self,
    ) -> Result<(TepApi, CtfApi, Arc<CountingFactRepository>), Box<dyn Error>> {
        let conn = Arc::new(Mutex::new(mining_fleet_tep::db::open_sqlite_connection(
            &self.db_path,
        )?));
        let machine_filter: Arc<dyn MachineFilter> =
            Arc::new(SqliteMachineRepository::from_connection(conn.clone()));
        let config = Arc::new(ConfigManager::from_connection(conn)?);
        let facts = Arc::new(CountingFactRepository::default());
        let fact_repo: Arc<dyn FactRepository> = facts.clone();

        let tep_api = TepApi::new(machine_filter.clone(), fact_repo.clone(), config.clone());
        let ctf_api = CtfApi::new(machine_filter, fact_repo, config);
        Ok((tep_api, ctf_api, facts))
    }
}

/// 组织 1 的请求
pub fn request(start: &str, end: &str, breakdown: &str) -> AnalyticsRequest {
    AnalyticsRequest {
        organization_id: 1,
        date_start: start.to_string(),
        date_end: end.to_string(),
        breakdown_type: Some(breakdown.to_string()),
        ..AnalyticsRequest::default()
    }
}

/// 浮点比较
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
