// ==========================================
// 车队维修管理系统 - 通知数据仓储
// ==========================================
// 通知在业务事务提交之后写入，因此本仓储自行持有连接
// ==========================================

use crate::domain::notification::{
    EntityRef, Notification, NotificationPriority, NotificationType, StoredNotification,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_mapping::{get_enum, new_id};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// NotificationRepository - 通知仓储
// ==========================================
pub struct NotificationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl NotificationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入通知
    ///
    /// # 返回
    /// - `Ok(notification_id)`
    pub fn insert(&self, notification: &Notification) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let notification_id = new_id();

        conn.execute(
            r#"
            INSERT INTO notifications (
                notification_id, recipient, notification_type, title, message, priority,
                related_entity_type, related_entity_id, is_read, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)
            "#,
            params![
                notification_id,
                notification.recipient,
                notification.notification_type.as_str(),
                notification.title,
                notification.message,
                notification.priority.as_str(),
                notification.related_entity.as_ref().map(|e| e.entity_type.clone()),
                notification.related_entity.as_ref().map(|e| e.entity_id.clone()),
                Utc::now().naive_utc(),
            ],
        )?;

        Ok(notification_id)
    }

    /// 查询收件人的通知（最新在前）
    pub fn find_by_recipient(
        &self,
        recipient: &str,
        unread_only: bool,
    ) -> RepositoryResult<Vec<StoredNotification>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT notification_id, recipient, notification_type, title, message, priority,
                   related_entity_type, related_entity_id, is_read, created_at
            FROM notifications
            WHERE recipient = ?1 AND (?2 = 0 OR is_read = 0)
            ORDER BY created_at DESC
            "#,
        )?;
        let rows = stmt
            .query_map(params![recipient, unread_only], map_notification)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 标记已读
    pub fn mark_read(&self, notification_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE notification_id = ?1",
            params![notification_id],
        )?;
        Ok(rows)
    }
}

fn map_notification(row: &Row<'_>) -> rusqlite::Result<StoredNotification> {
    let entity_type: Option<String> = row.get(6)?;
    let entity_id: Option<String> = row.get(7)?;
    let related_entity = match (entity_type, entity_id) {
        (Some(entity_type), Some(entity_id)) => Some(EntityRef {
            entity_type,
            entity_id,
        }),
        _ => None,
    };

    Ok(StoredNotification {
        notification_id: row.get(0)?,
        notification: Notification {
            recipient: row.get(1)?,
            notification_type: get_enum(row, 2, NotificationType::from_db_str)?,
            title: row.get(3)?,
            message: row.get(4)?,
            priority: get_enum(row, 5, NotificationPriority::from_db_str)?,
            related_entity,
        },
        is_read: row.get(8)?,
        created_at: row.get(9)?,
    })
}
