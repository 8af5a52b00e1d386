// ==========================================
// 车队维修管理系统 - 通知领域模型
// ==========================================
// 通知为尽力而为的旁路通道：发送失败不影响触发它的业务操作
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// NotificationType - 通知类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    VehicleStatusChanged,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::VehicleStatusChanged => "VEHICLE_STATUS_CHANGED",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "VEHICLE_STATUS_CHANGED" => Some(NotificationType::VehicleStatusChanged),
            _ => None,
        }
    }
}

// ==========================================
// NotificationPriority - 通知优先级
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "LOW",
            NotificationPriority::Medium => "MEDIUM",
            NotificationPriority::High => "HIGH",
            NotificationPriority::Urgent => "URGENT",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(NotificationPriority::Low),
            "MEDIUM" => Some(NotificationPriority::Medium),
            "HIGH" => Some(NotificationPriority::High),
            "URGENT" => Some(NotificationPriority::Urgent),
            _ => None,
        }
    }
}

/// 通知关联的实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: String, // vehicle / repair / pms ...
    pub entity_id: String,
}

impl EntityRef {
    pub fn vehicle(vehicle_id: &str) -> Self {
        Self {
            entity_type: "vehicle".to_string(),
            entity_id: vehicle_id.to_string(),
        }
    }
}

// ==========================================
// Notification - 待发送通知
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub related_entity: Option<EntityRef>,
}

// ==========================================
// StoredNotification - 已持久化通知
// ==========================================
// 对齐: notifications 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNotification {
    pub notification_id: String,
    pub notification: Notification,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}
