// ==========================================
// 车队维修管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、值对象
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod driver;
pub mod inspection;
pub mod notification;
pub mod shop;
pub mod types;
pub mod vehicle;
pub mod work_order;

// 重导出核心类型
pub use driver::{Driver, NewDriver};
pub use inspection::{
    ApprovalState, ConditionRating, ConditionRatings, NewPostInspection, NewPreInspection,
    PostInspectionReport, PreInspectionReport, SatisfactionRatings, TestDriveResult,
};
pub use notification::{
    EntityRef, Notification, NotificationPriority, NotificationType, StoredNotification,
};
pub use shop::{NewRepairShop, RepairShop};
pub use types::{Actor, PmsStatus, RepairStatus, ReportType, VehicleStatus};
pub use vehicle::{DisposalAssessment, NewVehicle, StatusAudit, Vehicle, VehicleStatusChange};
pub use work_order::{
    MaintenanceRecord, NewPartItem, Pms, PmsDraft, PmsRepairDraft, PmsUpdate, RecordRef, Repair,
    RepairDraft, RepairOrigin, RepairPartItem, RepairUpdate,
};
