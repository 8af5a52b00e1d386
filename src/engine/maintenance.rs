// ==========================================
// 车队维修管理系统 - 维修一致性引擎
// ==========================================
// 职责: 车辆状态机 / 维修单与保养单保存流水线 /
//       检验报告审批 / 报废判定
// 红线: 每个写操作在一个 BEGIN IMMEDIATE 事务内完成
//       （校验读取 + 单据写入 + 车辆状态联动 + 状态历史），
//       要么全部提交，要么全部回滚
// 红线: 通知在事务提交、连接锁释放之后发送，失败只记日志
// ==========================================

mod cascade;
mod directory;
mod inspections;
mod pms;
mod repairs;
mod vehicles;

use crate::domain::notification::Notification;
use crate::engine::error::EngineResult;
use crate::engine::notification::{dispatch_best_effort, NotificationSink};
use crate::repository::RepositoryError;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

// ==========================================
// EngineSettings - 引擎运行参数
// ==========================================
// 由 config::ConfigManager 加载（见 app::AppState）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub notifications_enabled: bool,
    /// 保养单逾期宽限天数
    pub pms_overdue_grace_days: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            pms_overdue_grace_days: 0,
        }
    }
}

// ==========================================
// MaintenanceEngine
// ==========================================
pub struct MaintenanceEngine {
    conn: Arc<Mutex<Connection>>,
    sink: Arc<dyn NotificationSink>,
    settings: EngineSettings,
}

impl MaintenanceEngine {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        sink: Arc<dyn NotificationSink>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            conn,
            sink,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// 在写事务内执行操作
    ///
    /// 闭包返回 Err 时事务随 Transaction 析构回滚；
    /// 闭包收集的通知在提交成功后发送
    fn with_transaction<T, F>(&self, op: F) -> EngineResult<T>
    where
        F: FnOnce(&Transaction<'_>, &mut Vec<Notification>) -> EngineResult<T>,
    {
        let mut pending = Vec::new();
        let value = {
            let mut conn = self
                .conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let value = op(&tx, &mut pending)?;
            tx.commit()?;
            value
        };

        if self.settings.notifications_enabled {
            dispatch_best_effort(self.sink.as_ref(), pending);
        } else if !pending.is_empty() {
            tracing::debug!("通知已关闭，跳过 {} 条通知", pending.len());
        }
        Ok(value)
    }

    /// 只读查询
    fn with_connection<T, F>(&self, op: F) -> EngineResult<T>
    where
        F: FnOnce(&Connection) -> EngineResult<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        op(&*conn)
    }
}
