// ==========================================
// 车队维修管理系统 - 车辆状态机
// ==========================================
// 纯函数: 不访问数据库，输入由引擎在事务内收集
// 规则（按顺序套用，后者可覆盖前者）:
//   1. 报废判定解除 且 当前为待报废 → 有进行中维修 ? 维修中 : 可用
//   2. 作业开始 且 当前为可用 → 维修中
//   3. 作业完成 且 无其他作业 且 非待报废 → 可用
//   4. 报废判定成立 → 待报废（优先级最高）
// ==========================================

use crate::domain::types::VehicleStatus;
use crate::i18n;
use serde::{Deserialize, Serialize};

/// 本次保存对作业状态的影响
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkActivity {
    /// 维修单进入 Ongoing / 保养单进入 In Progress
    Started,
    /// 维修单 / 保养单进入 Completed
    Completed,
    /// 作业状态未变化（删除、费用变化、市值变化等）
    Unchanged,
}

/// 状态机输入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusInputs {
    pub current: VehicleStatus,
    pub activity: WorkActivity,
    /// 除当前单据外，是否还有进行中的维修单或保养单
    pub other_active_work: bool,
    /// 是否存在进行中的维修单（用于解除待报废时的去向）
    pub ongoing_repair_exists: bool,
    /// 报废判定结果（None = 本次未重算或市值未设置）
    pub disposal: Option<bool>,
}

/// 自动状态变更原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusReason {
    WorkStarted,
    WorkCompleted,
    DisposalReached,
    DisposalCleared,
}

impl StatusReason {
    pub fn i18n_key(&self) -> &'static str {
        match self {
            StatusReason::WorkStarted => "status_reason.work_started",
            StatusReason::WorkCompleted => "status_reason.work_completed",
            StatusReason::DisposalReached => "status_reason.disposal_reached",
            StatusReason::DisposalCleared => "status_reason.disposal_cleared",
        }
    }

    /// 当前语言下的原因描述（写入审计列）
    pub fn describe(&self) -> String {
        i18n::t(self.i18n_key())
    }
}

/// 状态机输出
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub from: VehicleStatus,
    pub to: VehicleStatus,
    pub reason: StatusReason,
}

// ==========================================
// VehicleStatusMachine
// ==========================================
pub struct VehicleStatusMachine;

impl VehicleStatusMachine {
    /// 计算下一状态
    ///
    /// # 返回
    /// - Some(transition): 状态需要变化
    /// - None: 保持当前状态
    pub fn next(inputs: &StatusInputs) -> Option<StatusTransition> {
        let mut status = inputs.current;
        let mut reason = None;

        if inputs.disposal == Some(false) && status == VehicleStatus::ForDisposal {
            status = if inputs.ongoing_repair_exists {
                VehicleStatus::UnderRepair
            } else {
                VehicleStatus::Serviceable
            };
            reason = Some(StatusReason::DisposalCleared);
        }

        match inputs.activity {
            WorkActivity::Started if status == VehicleStatus::Serviceable => {
                status = VehicleStatus::UnderRepair;
                reason = Some(StatusReason::WorkStarted);
            }
            WorkActivity::Completed
                if !inputs.other_active_work
                    && status != VehicleStatus::ForDisposal
                    && status != VehicleStatus::Serviceable =>
            {
                status = VehicleStatus::Serviceable;
                reason = Some(StatusReason::WorkCompleted);
            }
            _ => {}
        }

        if inputs.disposal == Some(true) && status != VehicleStatus::ForDisposal {
            status = VehicleStatus::ForDisposal;
            reason = Some(StatusReason::DisposalReached);
        }

        match reason {
            Some(reason) if status != inputs.current => Some(StatusTransition {
                from: inputs.current,
                to: status,
                reason,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(current: VehicleStatus, activity: WorkActivity) -> StatusInputs {
        StatusInputs {
            current,
            activity,
            other_active_work: false,
            ongoing_repair_exists: false,
            disposal: None,
        }
    }

    #[test]
    fn test_work_started_on_serviceable_vehicle() {
        let t = VehicleStatusMachine::next(&inputs(VehicleStatus::Serviceable, WorkActivity::Started))
            .unwrap();
        assert_eq!(t.to, VehicleStatus::UnderRepair);
        assert_eq!(t.reason, StatusReason::WorkStarted);
    }

    #[test]
    fn test_work_started_does_not_touch_other_states() {
        for current in [
            VehicleStatus::UnderRepair,
            VehicleStatus::Unserviceable,
            VehicleStatus::ForDisposal,
        ] {
            assert_eq!(
                VehicleStatusMachine::next(&inputs(current, WorkActivity::Started)),
                None
            );
        }
    }

    #[test]
    fn test_completion_returns_to_serviceable_only_without_other_work() {
        let mut i = inputs(VehicleStatus::UnderRepair, WorkActivity::Completed);
        let t = VehicleStatusMachine::next(&i).unwrap();
        assert_eq!(t.to, VehicleStatus::Serviceable);
        assert_eq!(t.reason, StatusReason::WorkCompleted);

        i.other_active_work = true;
        assert_eq!(VehicleStatusMachine::next(&i), None);
    }

    #[test]
    fn test_disposal_overrides_completion() {
        let mut i = inputs(VehicleStatus::UnderRepair, WorkActivity::Completed);
        i.disposal = Some(true);

        let t = VehicleStatusMachine::next(&i).unwrap();
        assert_eq!(t.to, VehicleStatus::ForDisposal);
        assert_eq!(t.reason, StatusReason::DisposalReached);
    }

    #[test]
    fn test_disposal_vehicle_never_reverts_on_completion() {
        let mut i = inputs(VehicleStatus::ForDisposal, WorkActivity::Completed);
        assert_eq!(VehicleStatusMachine::next(&i), None);

        i.disposal = Some(true);
        assert_eq!(VehicleStatusMachine::next(&i), None);
    }

    #[test]
    fn test_disposal_cleared_goes_to_under_repair_or_serviceable() {
        let mut i = inputs(VehicleStatus::ForDisposal, WorkActivity::Unchanged);
        i.disposal = Some(false);
        let t = VehicleStatusMachine::next(&i).unwrap();
        assert_eq!(t.to, VehicleStatus::Serviceable);
        assert_eq!(t.reason, StatusReason::DisposalCleared);

        i.ongoing_repair_exists = true;
        assert_eq!(
            VehicleStatusMachine::next(&i).unwrap().to,
            VehicleStatus::UnderRepair
        );
    }

    #[test]
    fn test_disposal_not_applicable_keeps_status() {
        let i = inputs(VehicleStatus::ForDisposal, WorkActivity::Unchanged);
        assert_eq!(VehicleStatusMachine::next(&i), None);
    }
}
