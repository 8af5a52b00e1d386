// ==========================================
// 车队维修管理系统 - SQLite 连接初始化与迁移
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 + busy_timeout）
// - 建库脚本随二进制发布（migrations/），启动时幂等执行
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version（与 `migrations/v0.*.sql` 对齐）
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 按版本号排列的迁移脚本
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../migrations/v0.1_fleet_schema.sql"))];

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置；BEGIN IMMEDIATE 的写锁等待依赖它
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

/// 打开内存数据库并完成建库（单元测试 / 演示用）
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    run_migrations(&conn)?;
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

/// 执行尚未应用的迁移脚本
///
/// # 返回
/// - Ok(n): 本次新应用的迁移数量（已是最新则为 0）
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<usize> {
    let current = read_schema_version(conn)?.unwrap_or(0);
    let mut applied = 0;

    for (version, sql) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
        tx.commit()?;
        tracing::info!("已应用数据库迁移: v{}", version);
        applied += 1;
    }

    Ok(applied)
}

/// 检查 schema 版本，不一致时仅告警（不阻断启动）
pub fn warn_on_schema_mismatch(conn: &Connection) -> rusqlite::Result<()> {
    match read_schema_version(conn)? {
        Some(v) if v == CURRENT_SCHEMA_VERSION => {}
        Some(v) => tracing::warn!(
            "数据库 schema_version={} 与程序期望的 {} 不一致",
            v,
            CURRENT_SCHEMA_VERSION
        ),
        None => tracing::warn!("数据库缺少 schema_version 表，请先执行 migrate"),
    }
    Ok(())
}
