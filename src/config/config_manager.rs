// ==========================================
// 矿山设备车队决策支持系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 约束: 缺失键取默认值；已存储但格式错误的值报错，不静默回退
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::{BreakdownType, ZoneLabels};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::engine::service_life::DEFAULT_SERVICE_LIFE_MARGIN;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// AnalyticsSettings - 单次请求使用的配置快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSettings {
    pub service_life_margin: f64,
    pub zone_labels: ZoneLabels,
    pub default_breakdown: BreakdownType,
    pub main_class_id: i64,
    pub auxiliary_class_id: i64,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            service_life_margin: DEFAULT_SERVICE_LIFE_MARGIN,
            zone_labels: ZoneLabels::default(),
            default_breakdown: BreakdownType::Month,
            main_class_id: defaults::MAIN_CLASS_ID,
            auxiliary_class_id: defaults::AUXILIARY_CLASS_ID,
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
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
             VALUES ('global', 'GLOBAL', 'global')",
            [],
        )?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        serde_json::to_string(&json!(config_map))
            .map_err(|e| RepositoryError::InternalError(e.to_string()))
    }

    /// 读取并解析数值/ID 类配置
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|e| RepositoryError::InvalidValue {
                field: key.to_string(),
                message: format!("{} ({})", raw, e),
            }),
        }
    }

    fn get_label_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        match self.get_config_value(key)? {
            None => Ok(default.to_string()),
            Some(raw) if raw.trim().is_empty() => Err(RepositoryError::InvalidValue {
                field: key.to_string(),
                message: "空标签".to_string(),
            }),
            Some(raw) => Ok(raw.trim().to_string()),
        }
    }

    // ===== TEP 配置 =====

    /// 服役年限图表的安全系数
    pub async fn get_service_life_margin(&self) -> RepositoryResult<f64> {
        let margin =
            self.get_parsed_or_default(config_keys::SERVICE_LIFE_MARGIN, DEFAULT_SERVICE_LIFE_MARGIN)?;
        if !margin.is_finite() || margin <= 0.0 {
            return Err(RepositoryError::InvalidValue {
                field: config_keys::SERVICE_LIFE_MARGIN.to_string(),
                message: format!("必须为正数: {}", margin),
            });
        }
        Ok(margin)
    }

    /// 作业区标签（采矿 / 剥离）
    pub async fn get_zone_labels(&self) -> RepositoryResult<ZoneLabels> {
        let fallback = ZoneLabels::default();
        Ok(ZoneLabels {
            extraction: self
                .get_label_or_default(config_keys::EXTRACTION_ZONE_LABEL, &fallback.extraction)?,
            stripping: self
                .get_label_or_default(config_keys::STRIPPING_ZONE_LABEL, &fallback.stripping)?,
        })
    }

    /// 请求未指定粒度时使用的默认粒度
    pub async fn get_default_breakdown(&self) -> RepositoryResult<BreakdownType> {
        match self.get_config_value(config_keys::DEFAULT_BREAKDOWN)? {
            None => Ok(BreakdownType::Month),
            Some(raw) => BreakdownType::from_str(&raw).ok_or_else(|| RepositoryError::InvalidValue {
                field: config_keys::DEFAULT_BREAKDOWN.to_string(),
                message: raw.clone(),
            }),
        }
    }

    // ===== 车队结构配置 =====

    /// 主要设备分类 ID（其子树均为主要设备）
    pub async fn get_main_class_id(&self) -> RepositoryResult<i64> {
        self.get_parsed_or_default(config_keys::MAIN_CLASS_ID, defaults::MAIN_CLASS_ID)
    }

    /// 辅助设备分类 ID
    pub async fn get_auxiliary_class_id(&self) -> RepositoryResult<i64> {
        self.get_parsed_or_default(config_keys::AUXILIARY_CLASS_ID, defaults::AUXILIARY_CLASS_ID)
    }

    /// 一次读取全部分析配置
    pub async fn load_settings(&self) -> RepositoryResult<AnalyticsSettings> {
        Ok(AnalyticsSettings {
            service_life_margin: self.get_service_life_margin().await?,
            zone_labels: self.get_zone_labels().await?,
            default_breakdown: self.get_default_breakdown().await?,
            main_class_id: self.get_main_class_id().await?,
            auxiliary_class_id: self.get_auxiliary_class_id().await?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // TEP
    pub const SERVICE_LIFE_MARGIN: &str = "tep/service_life_margin";
    pub const EXTRACTION_ZONE_LABEL: &str = "tep/extraction_zone_label";
    pub const STRIPPING_ZONE_LABEL: &str = "tep/stripping_zone_label";
    pub const DEFAULT_BREAKDOWN: &str = "tep/default_breakdown";

    // 车队结构
    pub const MAIN_CLASS_ID: &str = "actives/main_class_id";
    pub const AUXILIARY_CLASS_ID: &str = "actives/auxiliary_class_id";
}

mod defaults {
    pub const MAIN_CLASS_ID: i64 = 2;
    pub const AUXILIARY_CLASS_ID: i64 = 3;
}
