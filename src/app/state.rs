// ==========================================
// 车队维修管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享资源
// 启动顺序: 打开连接 → 迁移 → 读配置 → 设定语言 → 构建引擎
// ==========================================

use std::sync::{Arc, Mutex};

use anyhow::Context;
use rusqlite::Connection;

use crate::config::ConfigManager;
use crate::db::{open_sqlite_connection, run_migrations, warn_on_schema_mismatch};
use crate::engine::{EngineSettings, MaintenanceEngine, NotificationSink, SqliteNotificationSink};
use crate::i18n;
use crate::repository::NotificationRepository;

/// 应用状态
///
/// 同一个连接在引擎、配置和通知之间共享
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 维修一致性引擎
    pub engine: Arc<MaintenanceEngine>,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 通知仓储（读取收件箱、标记已读）
    pub notifications: Arc<NotificationRepository>,

    conn: Arc<Mutex<Connection>>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: String) -> anyhow::Result<Self> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .with_context(|| format!("无法打开数据库: {}", db_path))?;
        let applied = run_migrations(&conn).context("数据库迁移失败")?;
        if applied > 0 {
            tracing::info!("已执行迁移脚本: {} 个", applied);
        }
        if let Err(e) = warn_on_schema_mismatch(&conn) {
            tracing::warn!("schema_version 检查失败(将继续启动): {}", e);
        }

        Self::from_connection(db_path, Arc::new(Mutex::new(conn)))
    }

    /// 基于已迁移的连接组装应用状态
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> anyhow::Result<Self> {
        let config = Arc::new(ConfigManager::from_connection(conn.clone()));

        let locale = config.get_locale().context("读取语言配置失败")?;
        i18n::set_locale(&locale);

        let settings: EngineSettings = config.load_engine_settings().context("读取引擎配置失败")?;
        tracing::info!(
            "引擎配置: notifications_enabled={}, pms_overdue_grace_days={}, locale={}",
            settings.notifications_enabled,
            settings.pms_overdue_grace_days,
            locale
        );

        let sink: Arc<dyn NotificationSink> = Arc::new(SqliteNotificationSink::new(conn.clone()));
        let engine = Arc::new(MaintenanceEngine::new(conn.clone(), sink, settings));
        let notifications = Arc::new(NotificationRepository::new(conn.clone()));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            engine,
            config,
            notifications,
            conn,
        })
    }

    /// 共享连接（供迁移/诊断类命令使用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 FLEET_MAINT_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("FLEET_MAINT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./fleet_maintenance.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("fleet-maintenance");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("fleet_maintenance.db");
        }
    }

    path.to_string_lossy().to_string()
}
