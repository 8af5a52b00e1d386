// ==========================================
// 车队维修管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (scope_id = 'global')
// 约定: 配置值非法时记录告警并回退默认值，不阻断启动
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::EngineSettings;
use crate::repository::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

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
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        tracing::info!("配置已更新: {}={}", key, value);
        Ok(())
    }

    /// 所有 global 配置（按键排序）
    pub fn get_all(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global'")?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        Ok(pairs)
    }

    // ===== 类型化读取 =====

    /// 消息语言（默认 en）
    pub fn get_locale(&self) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(config_keys::LOCALE)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| defaults::LOCALE.to_string()))
    }

    /// 是否发送通知（默认 true）
    pub fn get_notifications_enabled(&self) -> RepositoryResult<bool> {
        let raw = match self.get_global_config_value(config_keys::NOTIFICATIONS_ENABLED)? {
            Some(v) => v,
            None => return Ok(defaults::NOTIFICATIONS_ENABLED),
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => {
                tracing::warn!(
                    "配置 {} 的值非法: {}，使用默认值 {}",
                    config_keys::NOTIFICATIONS_ENABLED,
                    other,
                    defaults::NOTIFICATIONS_ENABLED
                );
                Ok(defaults::NOTIFICATIONS_ENABLED)
            }
        }
    }

    /// 保养单逾期宽限天数（默认 0，取值 0..=MAX_PMS_OVERDUE_GRACE_DAYS）
    pub fn get_pms_overdue_grace_days(&self) -> RepositoryResult<i64> {
        let raw = match self.get_global_config_value(config_keys::PMS_OVERDUE_GRACE_DAYS)? {
            Some(v) => v,
            None => return Ok(defaults::PMS_OVERDUE_GRACE_DAYS),
        };
        match raw.trim().parse::<i64>() {
            Ok(days) if (0..=MAX_PMS_OVERDUE_GRACE_DAYS).contains(&days) => Ok(days),
            _ => {
                tracing::warn!(
                    "配置 {} 的值非法: {}，使用默认值 {}",
                    config_keys::PMS_OVERDUE_GRACE_DAYS,
                    raw,
                    defaults::PMS_OVERDUE_GRACE_DAYS
                );
                Ok(defaults::PMS_OVERDUE_GRACE_DAYS)
            }
        }
    }

    /// 加载引擎运行参数
    pub fn load_engine_settings(&self) -> RepositoryResult<EngineSettings> {
        Ok(EngineSettings {
            notifications_enabled: self.get_notifications_enabled()?,
            pms_overdue_grace_days: self.get_pms_overdue_grace_days()?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const LOCALE: &str = "locale";
    pub const NOTIFICATIONS_ENABLED: &str = "notifications_enabled";
    pub const PMS_OVERDUE_GRACE_DAYS: &str = "pms_overdue_grace_days";
}

/// 逾期宽限天数上限（十年）
pub const MAX_PMS_OVERDUE_GRACE_DAYS: i64 = 3650;

mod defaults {
    pub const LOCALE: &str = "en";
    pub const NOTIFICATIONS_ENABLED: bool = true;
    pub const PMS_OVERDUE_GRACE_DAYS: i64 = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn manager() -> ConfigManager {
        ConfigManager::from_connection(Arc::new(Mutex::new(open_in_memory().unwrap())))
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = manager();
        assert_eq!(config.get_locale().unwrap(), "en");
        assert_eq!(config.load_engine_settings().unwrap(), EngineSettings::default());
    }

    #[test]
    fn test_set_and_read_back() {
        let config = manager();
        config.set_global_config_value(config_keys::LOCALE, "zh-CN").unwrap();
        config
            .set_global_config_value(config_keys::NOTIFICATIONS_ENABLED, "false")
            .unwrap();
        config
            .set_global_config_value(config_keys::PMS_OVERDUE_GRACE_DAYS, "3")
            .unwrap();
        config
            .set_global_config_value(config_keys::PMS_OVERDUE_GRACE_DAYS, "7")
            .unwrap();

        assert_eq!(config.get_locale().unwrap(), "zh-CN");
        let settings = config.load_engine_settings().unwrap();
        assert!(!settings.notifications_enabled);
        assert_eq!(settings.pms_overdue_grace_days, 7);
        assert_eq!(config.get_all().unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = manager();
        config
            .set_global_config_value(config_keys::NOTIFICATIONS_ENABLED, "maybe")
            .unwrap();
        config
            .set_global_config_value(config_keys::PMS_OVERDUE_GRACE_DAYS, "-2")
            .unwrap();

        assert!(config.get_notifications_enabled().unwrap());
        assert_eq!(config.get_pms_overdue_grace_days().unwrap(), 0);
    }

    #[test]
    fn test_grace_days_above_limit_fall_back_to_default() {
        let config = manager();
        config
            .set_global_config_value(
                config_keys::PMS_OVERDUE_GRACE_DAYS,
                &MAX_PMS_OVERDUE_GRACE_DAYS.to_string(),
            )
            .unwrap();
        assert_eq!(
            config.get_pms_overdue_grace_days().unwrap(),
            MAX_PMS_OVERDUE_GRACE_DAYS
        );

        config
            .set_global_config_value(config_keys::PMS_OVERDUE_GRACE_DAYS, "100000000")
            .unwrap();
        assert_eq!(config.get_pms_overdue_grace_days().unwrap(), 0);
    }
}
