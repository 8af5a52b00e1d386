// ==========================================
// 车队维修管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约定: 业务仓储借用 &Connection，由引擎统一开启事务
// ==========================================

pub mod directory_repo;
pub mod error;
pub mod inspection_repo;
pub mod notification_repo;
pub mod pms_repo;
pub mod repair_repo;
pub(crate) mod row_mapping;
pub mod status_history_repo;
pub mod vehicle_repo;

// 重导出核心仓储
pub use directory_repo::{DriverRepository, ShopRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use inspection_repo::{InspectionUsageRepository, PostInspectionRepository, PreInspectionRepository};
pub use notification_repo::NotificationRepository;
pub use pms_repo::PmsRepository;
pub use repair_repo::{PartItemRepository, RepairRepository};
pub use status_history_repo::StatusHistoryRepository;
pub use vehicle_repo::VehicleRepository;
