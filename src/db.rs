// ==========================================
// 矿山设备车队决策支持系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发读写时的偶发 busy 错误
// - 提供幂等建表（测试库 / 本地演示库）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表（幂等）并登记 schema_version
///
/// 说明：
/// - 日期列统一为 ISO 文本 (YYYY-MM-DD)
/// - 唯一约束对应事实记录的自然键
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS machine_class (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            parent_id INTEGER REFERENCES machine_class(id)
        );

        CREATE TABLE IF NOT EXISTS machine_mark (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS machine_type (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            mark_id INTEGER NOT NULL REFERENCES machine_mark(id),
            machine_class_id INTEGER NOT NULL REFERENCES machine_class(id)
        );

        CREATE TABLE IF NOT EXISTS machine (
            id INTEGER PRIMARY KEY,
            organization_id INTEGER NOT NULL,
            machine_type_id INTEGER NOT NULL REFERENCES machine_type(id),
            inventory_number TEXT,
            price REAL,
            date_entry TEXT,
            year_decommission INTEGER
        );

        CREATE TABLE IF NOT EXISTS costs_kind (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            is_model INTEGER NOT NULL DEFAULT 0,
            category TEXT
        );

        CREATE TABLE IF NOT EXISTS cost (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            machine_id INTEGER NOT NULL REFERENCES machine(id),
            kind_id INTEGER NOT NULL REFERENCES costs_kind(id),
            date_period TEXT NOT NULL,
            value REAL,
            is_model INTEGER NOT NULL DEFAULT 0,
            UNIQUE (machine_id, kind_id, date_period, is_model)
        );

        CREATE TABLE IF NOT EXISTS work_time_productivity (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            machine_id INTEGER NOT NULL REFERENCES machine(id),
            strategy_id INTEGER,
            date_period TEXT NOT NULL,
            work_time REAL,
            productivity REAL,
            is_model INTEGER NOT NULL DEFAULT 0,
            UNIQUE (machine_id, date_period, is_model)
        );

        CREATE TABLE IF NOT EXISTS ctf_record (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            machine_id INTEGER NOT NULL REFERENCES machine(id),
            date_period TEXT,
            worktime_f REAL, worktime_c REAL,
            planned_oatd_f REAL, planned_oatd_c REAL,
            unplanned_oatd_f REAL, unplanned_oatd_c REAL,
            tm_f REAL, tm_c REAL,
            tr_f REAL, tr_c REAL,
            mr_f REAL, mr_c REAL,
            unplanned_repair_f REAL, unplanned_repair_c REAL,
            UNIQUE (machine_id, date_period)
        );

        CREATE TABLE IF NOT EXISTS face (
            id INTEGER PRIMARY KEY,
            organization_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            zone_working TEXT
        );

        CREATE TABLE IF NOT EXISTS machine2face (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            machine_id INTEGER NOT NULL REFERENCES machine(id),
            face_id INTEGER NOT NULL REFERENCES face(id),
            date_change TEXT NOT NULL,
            machine_performance REAL,
            fuel_consumption REAL,
            average_speed REAL
        );

        CREATE INDEX IF NOT EXISTS idx_cost_machine_period ON cost(machine_id, date_period);
        CREATE INDEX IF NOT EXISTS idx_wtp_machine_period ON work_time_productivity(machine_id, date_period);
        CREATE INDEX IF NOT EXISTS idx_ctf_machine_period ON ctf_record(machine_id, date_period);
        CREATE INDEX IF NOT EXISTS idx_m2f_machine_date ON machine2face(machine_id, date_change);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}
