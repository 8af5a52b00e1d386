// ==========================================
// 车辆状态联动测试
// ==========================================
// 职责: 验证维修/保养单保存后的车辆状态流转与报废判定
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod vehicle_status_test {
    use fleet_maintenance::domain::{PmsUpdate, RepairUpdate};
    use fleet_maintenance::engine::{EngineSettings, ViolationKind};
    use fleet_maintenance::{PmsStatus, ReportType, VehicleStatus};

    use crate::test_helpers::*;

    // ==========================================
    // 作业开始 / 结束
    // ==========================================

    #[test]
    fn test_ongoing_repair_moves_vehicle_under_repair() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0001", None);
        assert_eq!(vehicle.status, VehicleStatus::Serviceable);

        ongoing_repair(&env.engine, &vehicle.vehicle_id, 500);

        let vehicle = env.engine.get_vehicle(&vehicle.vehicle_id).unwrap();
        assert_eq!(vehicle.status, VehicleStatus::UnderRepair);
        let audit = vehicle.status_audit.unwrap();
        assert!(audit.changed_by.is_none());
        assert!(!audit.reason.is_empty());
    }

    #[test]
    fn test_completing_last_ongoing_repair_returns_vehicle_to_serviceable() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0002", None);
        let first = ongoing_repair(&env.engine, &vehicle.vehicle_id, 500);
        let second = ongoing_repair(&env.engine, &vehicle.vehicle_id, 700);

        // 还有其他进行中维修单，保持维修中
        complete_repair(&env.engine, &first);
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::UnderRepair
        );

        complete_repair(&env.engine, &second);
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::Serviceable
        );
    }

    #[test]
    fn test_in_progress_pms_blocks_return_to_serviceable() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0003", None);
        let pre = approved_pre_inspection(&env.engine, &vehicle.vehicle_id, ReportType::Pms);
        env.engine
            .create_pms(
                pms_draft(&vehicle.vehicle_id, Some(&pre.report_id), PmsStatus::InProgress),
                None,
            )
            .unwrap();
        let repair = ongoing_repair(&env.engine, &vehicle.vehicle_id, 400);

        complete_repair(&env.engine, &repair);
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::UnderRepair
        );
    }

    #[test]
    fn test_starting_pms_moves_serviceable_vehicle_under_repair() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0004", None);
        let pre = approved_pre_inspection(&env.engine, &vehicle.vehicle_id, ReportType::Pms);
        let pms = env
            .engine
            .create_pms(
                pms_draft(&vehicle.vehicle_id, Some(&pre.report_id), PmsStatus::Scheduled),
                None,
            )
            .unwrap();
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::Serviceable
        );

        let started = env
            .engine
            .update_pms(
                &pms.pms_id,
                PmsUpdate {
                    status: Some(PmsStatus::InProgress),
                    ..Default::default()
                },
                Some(&supervisor()),
            )
            .unwrap();
        assert!(started.started_at.is_some());
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::UnderRepair
        );

        // 完成保养 → 可用
        let post = approved_post_inspection(&env.engine, &vehicle.vehicle_id, &pre.report_id);
        env.engine
            .update_pms(
                &pms.pms_id,
                PmsUpdate {
                    status: Some(PmsStatus::Completed),
                    post_inspection_id: Some(post.report_id),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::Serviceable
        );
    }

    #[test]
    fn test_deleting_only_ongoing_repair_returns_vehicle_to_serviceable() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0005", None);
        let repair = ongoing_repair(&env.engine, &vehicle.vehicle_id, 300);

        env.engine.delete_repair(&repair.repair_id, Some(&supervisor())).unwrap();

        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::Serviceable
        );
    }

    // ==========================================
    // 报废判定
    // ==========================================

    #[test]
    fn test_abc_1234_scenario_marks_vehicle_for_disposal() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-1234", Some(1_000_000));

        completed_repair(&env.engine, &vehicle.vehicle_id, 600_000);

        let assessment = env.engine.disposal_assessment(&vehicle.vehicle_id).unwrap();
        assert_eq!(assessment.disposal_threshold, Some(dec(500_000)));
        assert_eq!(assessment.total_repair_costs, dec(600_000));
        assert!(assessment.is_for_disposal);
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::ForDisposal
        );
    }

    #[test]
    fn test_threshold_is_exceeded_only_above_half_market_value() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0006", Some(100_000));

        completed_repair(&env.engine, &vehicle.vehicle_id, 20_000);
        completed_repair(&env.engine, &vehicle.vehicle_id, 30_000);

        let assessment = env.engine.disposal_assessment(&vehicle.vehicle_id).unwrap();
        assert_eq!(assessment.total_repair_costs, dec(50_000));
        assert!(!assessment.is_for_disposal);
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::Serviceable
        );

        completed_repair(&env.engine, &vehicle.vehicle_id, 1);

        let assessment = env.engine.disposal_assessment(&vehicle.vehicle_id).unwrap();
        assert_eq!(assessment.total_repair_costs, dec(50_001));
        assert!(assessment.is_for_disposal);
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::ForDisposal
        );
    }

    #[test]
    fn test_ongoing_repairs_do_not_count_toward_disposal() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0007", Some(10_000));

        ongoing_repair(&env.engine, &vehicle.vehicle_id, 9_000);

        let assessment = env.engine.disposal_assessment(&vehicle.vehicle_id).unwrap();
        assert_eq!(assessment.total_repair_costs, dec(0));
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::UnderRepair
        );
    }

    #[test]
    fn test_no_market_value_means_no_disposal_check() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0008", None);

        completed_repair(&env.engine, &vehicle.vehicle_id, 5_000_000);

        let assessment = env.engine.disposal_assessment(&vehicle.vehicle_id).unwrap();
        assert!(!assessment.is_applicable());
        assert!(!assessment.is_for_disposal);
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::Serviceable
        );
    }

    #[test]
    fn test_disposal_vehicle_stays_for_disposal_when_more_work_completes() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0009", Some(1_000));
        completed_repair(&env.engine, &vehicle.vehicle_id, 600);

        let repair = ongoing_repair(&env.engine, &vehicle.vehicle_id, 10);
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::ForDisposal
        );
        complete_repair(&env.engine, &repair);
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::ForDisposal
        );
    }

    #[test]
    fn test_deleting_completed_repair_reverts_disposal() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0010", Some(100_000));
        completed_repair(&env.engine, &vehicle.vehicle_id, 40_000);
        let expensive = completed_repair(&env.engine, &vehicle.vehicle_id, 20_000);
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::ForDisposal
        );

        env.engine.delete_repair(&expensive.repair_id, None).unwrap();

        let assessment = env.engine.disposal_assessment(&vehicle.vehicle_id).unwrap();
        assert_eq!(assessment.total_repair_costs, dec(40_000));
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::Serviceable
        );
    }

    #[test]
    fn test_disposal_cleared_with_ongoing_repair_goes_under_repair() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0011", Some(100_000));
        let expensive = completed_repair(&env.engine, &vehicle.vehicle_id, 60_000);
        ongoing_repair(&env.engine, &vehicle.vehicle_id, 100);

        env.engine.delete_repair(&expensive.repair_id, None).unwrap();

        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::UnderRepair
        );
    }

    #[test]
    fn test_market_value_update_recomputes_disposal() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0012", None);
        completed_repair(&env.engine, &vehicle.vehicle_id, 30_000);

        let updated = env
            .engine
            .update_market_value(&vehicle.vehicle_id, Some(dec(50_000)))
            .unwrap();
        assert_eq!(updated.status, VehicleStatus::ForDisposal);

        let updated = env
            .engine
            .update_market_value(&vehicle.vehicle_id, Some(dec(80_000)))
            .unwrap();
        assert_eq!(updated.status, VehicleStatus::Serviceable);
    }

    #[test]
    fn test_completed_repair_cost_change_recomputes_disposal() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0013", Some(10_000));
        let repair = completed_repair(&env.engine, &vehicle.vehicle_id, 4_000);
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::Serviceable
        );

        env.engine
            .update_repair(
                &repair.repair_id,
                RepairUpdate {
                    labor_cost: Some(dec(6_000)),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::ForDisposal
        );
    }

    #[test]
    fn test_vehicle_list_rederives_disposal_status() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0014", Some(100_000));
        completed_repair(&env.engine, &vehicle.vehicle_id, 60_000);
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::ForDisposal
        );

        // 外部手工改库造成漂移
        {
            let conn = fleet_maintenance::db::open_sqlite_connection(&env.db_path).unwrap();
            conn.execute(
                "UPDATE vehicles SET status = 'SERVICEABLE' WHERE vehicle_id = ?1",
                [&vehicle.vehicle_id],
            )
            .unwrap();
        }

        let listed = env.engine.list_vehicles().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, VehicleStatus::ForDisposal);
    }

    // ==========================================
    // 手工状态变更与历史
    // ==========================================

    #[test]
    fn test_manual_status_change_records_actor_and_notifies() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0015", None);

        let changed = env
            .engine
            .change_vehicle_status(
                &vehicle.vehicle_id,
                VehicleStatus::Unserviceable,
                &supervisor(),
                "Flat tyre, waiting for parts",
            )
            .unwrap();

        assert_eq!(changed.status, VehicleStatus::Unserviceable);
        let audit = changed.status_audit.unwrap();
        assert_eq!(audit.changed_by.as_deref(), Some("maint.supervisor"));
        assert_eq!(audit.reason, "Flat tyre, waiting for parts");

        let sent = env.sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "maint.supervisor");
        assert!(sent[0].message.contains("ABC-0015"));

        let history = env.engine.status_history(&vehicle.vehicle_id).unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].is_automatic());
        assert_eq!(history[0].from_status, VehicleStatus::Serviceable);
        assert_eq!(history[0].to_status, VehicleStatus::Unserviceable);
    }

    #[test]
    fn test_manual_status_change_to_same_status_is_noop() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0016", None);

        env.engine
            .change_vehicle_status(&vehicle.vehicle_id, VehicleStatus::Serviceable, &supervisor(), "noop")
            .unwrap();

        assert!(env.sink.sent().is_empty());
        assert!(env.engine.status_history(&vehicle.vehicle_id).unwrap().is_empty());
    }

    #[test]
    fn test_notification_failure_does_not_abort_status_change() {
        let env = setup_test_env_with(EngineSettings::default(), RecordingNotificationSink::failing());
        let vehicle = register_vehicle(&env.engine, "ABC-0017", None);

        let changed = env
            .engine
            .change_vehicle_status(
                &vehicle.vehicle_id,
                VehicleStatus::ForDisposal,
                &supervisor(),
                "Accident write-off",
            )
            .unwrap();

        assert_eq!(changed.status, VehicleStatus::ForDisposal);
        assert_eq!(
            env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().status,
            VehicleStatus::ForDisposal
        );
    }

    #[test]
    fn test_notifications_can_be_disabled() {
        let settings = EngineSettings {
            notifications_enabled: false,
            ..EngineSettings::default()
        };
        let env = setup_test_env_with(settings, RecordingNotificationSink::default());
        let vehicle = register_vehicle(&env.engine, "ABC-0018", None);

        env.engine
            .change_vehicle_status(&vehicle.vehicle_id, VehicleStatus::Unserviceable, &supervisor(), "x")
            .unwrap();

        assert!(env.sink.sent().is_empty());
    }

    #[test]
    fn test_status_history_is_newest_first() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0019", None);
        let repair = ongoing_repair(&env.engine, &vehicle.vehicle_id, 100);
        complete_repair(&env.engine, &repair);

        let history = env.engine.status_history(&vehicle.vehicle_id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].to_status, VehicleStatus::Serviceable);
        assert_eq!(history[1].to_status, VehicleStatus::UnderRepair);
        assert!(history.iter().all(|h| h.is_automatic()));
    }

    #[test]
    fn test_completion_raises_vehicle_mileage() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "ABC-0020", None);
        let repair = ongoing_repair(&env.engine, &vehicle.vehicle_id, 100);
        env.engine
            .update_repair(
                &repair.repair_id,
                RepairUpdate {
                    odometer_km: Some(13_500),
                    ..Default::default()
                },
                None,
            )
            .unwrap();

        // 未完成时不回写
        assert_eq!(env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().mileage_km, 12_000);

        let repair = env.engine.get_repair(&repair.repair_id).unwrap();
        complete_repair(&env.engine, &repair);
        assert_eq!(env.engine.get_vehicle(&vehicle.vehicle_id).unwrap().mileage_km, 13_500);
    }

    #[test]
    fn test_duplicate_plate_is_rejected() {
        let env = setup_test_env();
        register_vehicle(&env.engine, "ABC-0021", None);

        let err = env
            .engine
            .register_vehicle(fleet_maintenance::domain::NewVehicle {
                plate_number: "ABC-0021".to_string(),
                vehicle_type: "Van".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(violation_kinds(&err), vec![ViolationKind::DuplicatePlate]);
    }

    #[test]
    fn test_refresh_all_statuses_reports_changed_count() {
        let env = setup_test_env();
        let a = register_vehicle(&env.engine, "ABC-0022", Some(10_000));
        register_vehicle(&env.engine, "ABC-0023", Some(10_000));
        completed_repair(&env.engine, &a.vehicle_id, 6_000);

        {
            let conn = fleet_maintenance::db::open_sqlite_connection(&env.db_path).unwrap();
            conn.execute(
                "UPDATE vehicles SET status = 'SERVICEABLE' WHERE vehicle_id = ?1",
                [&a.vehicle_id],
            )
            .unwrap();
        }

        assert_eq!(env.engine.refresh_all_statuses().unwrap(), 1);
        assert_eq!(env.engine.refresh_all_statuses().unwrap(), 0);
    }
}
