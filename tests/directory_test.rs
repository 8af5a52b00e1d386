// ==========================================
// 基础资料测试
// ==========================================
// 职责: 验证维修厂、驾驶员登记与引用完整性
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod directory_test {
    use fleet_maintenance::domain::driver::NewDriver;
    use fleet_maintenance::domain::shop::NewRepairShop;
    use fleet_maintenance::engine::EngineError;
    use fleet_maintenance::repository::RepositoryError;
    use fleet_maintenance::ReportType;

    use crate::test_helpers::*;

    fn driver(name: &str, license_no: &str) -> NewDriver {
        NewDriver {
            full_name: name.to_string(),
            license_no: license_no.to_string(),
            contact_no: None,
        }
    }

    #[test]
    fn test_shops_are_listed_by_name() {
        let env = setup_test_env();
        for name in ["Northside Motors", "  Eastgate Auto  "] {
            env.engine
                .create_shop(NewRepairShop {
                    name: name.to_string(),
                    address: None,
                    contact_no: Some("555-0100".to_string()),
                })
                .unwrap();
        }

        let names: Vec<_> = env
            .engine
            .list_shops()
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Eastgate Auto", "Northside Motors"]);
    }

    #[test]
    fn test_repair_references_registered_shop() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "DIR-0001", None);
        let shop = env
            .engine
            .create_shop(NewRepairShop {
                name: "Westend Garage".to_string(),
                address: Some("12 Harbour Rd".to_string()),
                contact_no: None,
            })
            .unwrap();

        let pre = approved_pre_inspection(&env.engine, &vehicle.vehicle_id, ReportType::Repair);
        let mut draft = repair_draft(&vehicle.vehicle_id, &pre.report_id);
        draft.shop_id = Some(shop.shop_id.clone());
        let repair = env.engine.create_repair(draft, None).unwrap();
        assert_eq!(repair.shop_id.as_deref(), Some(shop.shop_id.as_str()));

        let pre = approved_pre_inspection(&env.engine, &vehicle.vehicle_id, ReportType::Repair);
        let mut draft = repair_draft(&vehicle.vehicle_id, &pre.report_id);
        draft.shop_id = Some("no-such-shop".to_string());
        let err = env.engine.create_repair(draft, None).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
        assert_eq!(env.engine.repairs_for_vehicle(&vehicle.vehicle_id).unwrap().len(), 1);
    }

    #[test]
    fn test_driver_license_is_unique() {
        let env = setup_test_env();
        env.engine.create_driver(driver("Ana Cruz", "LIC-001")).unwrap();

        let err = env
            .engine
            .create_driver(driver("Ben Ortiz", "LIC-001"))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Repository(RepositoryError::UniqueConstraintViolation(_))
        ));
        assert_eq!(env.engine.list_drivers().unwrap().len(), 1);
    }

    #[test]
    fn test_assign_and_unassign_driver() {
        let env = setup_test_env();
        let vehicle = register_vehicle(&env.engine, "DIR-0002", None);
        let ana = env.engine.create_driver(driver("Ana Cruz", "LIC-002")).unwrap();

        let assigned = env
            .engine
            .assign_driver(&vehicle.vehicle_id, Some(&ana.driver_id))
            .unwrap();
        assert_eq!(assigned.assigned_driver_id.as_deref(), Some(ana.driver_id.as_str()));

        let err = env
            .engine
            .assign_driver(&vehicle.vehicle_id, Some("missing"))
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));

        let cleared = env.engine.assign_driver(&vehicle.vehicle_id, None).unwrap();
        assert!(cleared.assigned_driver_id.is_none());
    }
}
