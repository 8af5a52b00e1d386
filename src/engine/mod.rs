// ==========================================
// 车队维修管理系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: 所有状态变更必须输出 reason
// ==========================================

pub mod error;
pub mod maintenance;
pub mod notification;
pub mod validation;
pub mod vehicle_status;

// 重导出核心引擎
pub use error::{
    EngineError, EngineResult, NotificationError, ValidationError, ValidationViolation,
    ViolationKind,
};
pub use maintenance::{EngineSettings, MaintenanceEngine};
pub use notification::{NoOpNotificationSink, NotificationSink, SqliteNotificationSink};
pub use validation::{SaveContext, WorkOrderValidator};
pub use vehicle_status::{
    StatusInputs, StatusReason, StatusTransition, VehicleStatusMachine, WorkActivity,
};
