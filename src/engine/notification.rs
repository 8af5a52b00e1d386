// ==========================================
// 车队维修管理系统 - 通知旁路
// ==========================================
// 职责: 定义通知发送 trait，实现依赖倒置
// 说明: 引擎只依赖 NotificationSink，具体投递方式由装配层决定
// 红线: 通知发送失败只记录日志，不影响触发它的业务操作
// ==========================================

use crate::domain::notification::Notification;
use crate::engine::error::NotificationError;
use crate::repository::NotificationRepository;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// 通知发送 Trait
// ==========================================

/// 通知发送者
///
/// 引擎在事务提交、连接锁释放之后调用，实现可以自由访问数据库
pub trait NotificationSink: Send + Sync {
    /// 发送通知
    ///
    /// # 返回
    /// - `Ok(notification_id)`: 通知 ID（如果支持）或空字符串
    /// - `Err`: 发送失败（引擎只记录日志）
    fn notify(&self, notification: &Notification) -> Result<String, NotificationError>;
}

/// 空操作通知发送者
///
/// 用于不需要通知的场景（如命令行批处理、单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpNotificationSink;

impl NotificationSink for NoOpNotificationSink {
    fn notify(&self, notification: &Notification) -> Result<String, NotificationError> {
        tracing::debug!(
            "NoOpNotificationSink: 跳过通知 - recipient={}, type={}",
            notification.recipient,
            notification.notification_type.as_str()
        );
        Ok(String::new())
    }
}

// ==========================================
// SqliteNotificationSink - 落库通知
// ==========================================
pub struct SqliteNotificationSink {
    repo: NotificationRepository,
}

impl SqliteNotificationSink {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            repo: NotificationRepository::new(conn),
        }
    }
}

impl NotificationSink for SqliteNotificationSink {
    fn notify(&self, notification: &Notification) -> Result<String, NotificationError> {
        let id = self.repo.insert(notification)?;
        tracing::debug!(
            "通知已写入: id={}, recipient={}",
            id,
            notification.recipient
        );
        Ok(id)
    }
}

/// 发送通知并吞掉错误
pub(crate) fn dispatch_best_effort(sink: &dyn NotificationSink, notifications: Vec<Notification>) {
    for notification in notifications {
        if let Err(e) = sink.notify(&notification) {
            tracing::warn!(
                "通知发送失败（已忽略）: recipient={}, type={}, error={}",
                notification.recipient,
                notification.notification_type.as_str(),
                e
            );
        }
    }
}
