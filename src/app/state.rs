// ==========================================
// 矿山设备车队决策支持系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ActivesApi, CtfApi, TepApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::{
    FactRepository, MachineFilter, SqliteFactRepository, SqliteMachineRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源，共用一个数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 技术经济指标API
    pub tep_api: Arc<TepApi>,

    /// 技术完好率API
    pub ctf_api: Arc<CtfApi>,

    /// 车队结构API
    pub actives_api: Arc<ActivesApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在则创建并建表）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let machine_filter: Arc<dyn MachineFilter> =
            Arc::new(SqliteMachineRepository::from_connection(conn.clone()));
        let fact_repo: Arc<dyn FactRepository> =
            Arc::new(SqliteFactRepository::from_connection(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let tep_api = Arc::new(TepApi::new(
            machine_filter.clone(),
            fact_repo.clone(),
            config_manager.clone(),
        ));
        let ctf_api = Arc::new(CtfApi::new(
            machine_filter.clone(),
            fact_repo,
            config_manager.clone(),
        ));
        let actives_api = Arc::new(ActivesApi::new(machine_filter, config_manager.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            tep_api,
            ctf_api,
            actives_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 MINING_FLEET_TEP_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("MINING_FLEET_TEP_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./mining_fleet_tep.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("mining-fleet-tep");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("mining_fleet_tep.db");
        }
    }
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }
}
