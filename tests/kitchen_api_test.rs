// ==========================================
// 出品编排 API 集成测试
// ==========================================
// 职责: 验证连击确认门控、审计日志、归档落库、重置轮询、配置回写
// ==========================================


mod helpers;

#[cfg(test)]
mod kitchen_api_test {
    use crate::helpers::kitchen_builder::*;
    use crate::test_helpers::{create_test_db, memory_action_log_repo};
    use chrono::{Duration, Utc};
    use kitchen_orchestrator::api::{ApiError, KitchenApi};
    use kitchen_orchestrator::app::{tick_once, AppState};
    use kitchen_orchestrator::config::{OrchestratorConfigReader, OrchestratorSettings, TapGateSettings};
    use kitchen_orchestrator::domain::{ChecklistStatus, FryStationSettings};
    use std::sync::{Arc, Mutex};

    /// 门控窗口放宽到 60 秒，避免测试受执行耗时影响
    fn relaxed_api() -> KitchenApi {
        let mut settings = OrchestratorSettings::default();
        settings.force_finish_gate = TapGateSettings {
            taps: 3,
            window_ms: 60_000,
        };
        settings.packed_confirm_gate = TapGateSettings {
            taps: 2,
            window_ms: 60_000,
        };
        let engine = orchestrator_with(
            settings,
            LayoutBuilder::new()
                .griddle("G1", 40, 420)
                .noodle("N1", 2)
                .lane("P1")
                .build(),
        );
        KitchenApi::new(Arc::new(Mutex::new(engine)), memory_action_log_repo()).unwrap()
    }

    fn action_types(api: &KitchenApi, order_id: &str) -> Vec<String> {
        api.order_actions(order_id)
            .unwrap()
            .into_iter()
            .map(|log| log.action_type)
            .collect()
    }

    // ==========================================
    // 连击确认门控
    // ==========================================

    #[test]
    fn test_force_finish_requires_three_taps() {
        let api = relaxed_api();
        api.submit_order(OrderBuilder::new("A").line("noodle-beef", 1).build(), "cook")
            .unwrap();
        api.start_water_task("A#L1", Some(1), "cook").unwrap();

        match api.tap_force_finish("A#L1", "cook") {
            Err(ApiError::ConfirmationPending { remaining, .. }) => assert_eq!(remaining, 2),
            other => panic!("Expected ConfirmationPending, got {:?}", other),
        }
        match api.tap_force_finish("A#L1", "cook") {
            Err(ApiError::ConfirmationPending { remaining, .. }) => assert_eq!(remaining, 1),
            other => panic!("Expected ConfirmationPending, got {:?}", other),
        }
        api.tap_force_finish("A#L1", "cook").unwrap();

        let recent = api.recent_actions(10).unwrap();
        let forced = recent
            .iter()
            .find(|log| log.action_type == "FORCE_FINISH_TASK")
            .unwrap();
        assert_eq!(forced.entity_id.as_deref(), Some("A#L1"));
        assert_eq!(forced.actor, "cook");

        let checklist = api.order_checklist("A").unwrap();
        assert_eq!(
            checklist.item("line:0:whole").unwrap().base_status,
            ChecklistStatus::Ready
        );
    }

    #[test]
    fn test_queued_item_packed_after_double_tap() {
        let api = relaxed_api();
        api.submit_order(OrderBuilder::new("N").line("noodle-beef", 1).build(), "cashier")
            .unwrap();

        match api.toggle_packed("N", "line:0:whole", "packer") {
            Err(ApiError::ConfirmationPending { remaining, .. }) => assert_eq!(remaining, 1),
            other => panic!("Expected ConfirmationPending, got {:?}", other),
        }
        let status = api.toggle_packed("N", "line:0:whole", "packer").unwrap();
        assert_eq!(status, ChecklistStatus::Packed);

        let types = action_types(&api, "N");
        assert!(types.contains(&"SUBMIT_ORDER".to_string()));
        assert!(types.contains(&"TOGGLE_PACKED".to_string()));
    }

    #[test]
    fn test_ready_item_toggles_without_gate() {
        let api = relaxed_api();
        api.submit_order(OrderBuilder::new("D").line("tea", 1).build(), "cashier")
            .unwrap();
        assert_eq!(
            api.toggle_packed("D", "line:0:whole", "packer").unwrap(),
            ChecklistStatus::Packed
        );
        assert_eq!(
            api.toggle_packed("D", "line:0:whole", "packer").unwrap(),
            ChecklistStatus::Ready
        );
    }

    #[test]
    fn test_unconfirmed_taps_cleared_by_archive_and_expiry() {
        let api = relaxed_api();
        api.submit_order(
            OrderBuilder::new("A")
                .line("noodle-beef", 1)
                .line("pot-pork", 6)
                .build(),
            "cashier",
        )
        .unwrap();
        api.submit_order(OrderBuilder::new("B").line("noodle-beef", 1).build(), "cashier")
            .unwrap();
        api.start_water_task("A#L1", Some(1), "cook").unwrap();
        api.start_water_task("B#L1", Some(2), "cook").unwrap();

        assert!(api.tap_force_finish("A#L1", "cook").is_err());
        assert!(api.toggle_packed("A", "line:1:whole", "packer").is_err());
        assert!(api.tap_force_finish("B#L1", "cook").is_err());
        assert_eq!(api.pending_taps(), 3);

        let due_at = api.request_archive("A", "cashier").unwrap();
        assert_eq!(
            api.flush_due_archives(due_at + Duration::seconds(1)).unwrap(),
            vec!["A".to_string()]
        );
        assert_eq!(api.pending_taps(), 1);

        // 超窗的零散点按随刷新清理
        api.flush_due_archives(Utc::now() + Duration::minutes(2)).unwrap();
        assert_eq!(api.pending_taps(), 0);
    }

    // ==========================================
    // 错误映射
    // ==========================================

    #[test]
    fn test_engine_errors_mapped_for_callers() {
        let api = relaxed_api();
        assert!(matches!(api.order("missing"), Err(ApiError::NotFound(_))));
        assert!(matches!(
            api.mark_served("missing", "cashier"),
            Err(ApiError::NotFound(_))
        ));

        api.submit_order(OrderBuilder::new("A").line("tea", 1).build(), "cashier")
            .unwrap();
        api.mark_served("A", "cashier").unwrap();
        assert!(matches!(
            api.mark_served("A", "cashier"),
            Err(ApiError::InvalidStateTransition { .. })
        ));

        assert!(matches!(
            api.append_workflow_note("A", " ", "cashier"),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            api.start_water_task("A#L9", Some(1), "cook"),
            Err(ApiError::NotFound(_))
        ));
    }

    // ==========================================
    // 应用装配（临时数据库）
    // ==========================================

    #[tokio::test]
    async fn test_archive_flush_stores_snapshot() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let state = AppState::new(db_path, standard_catalog()).await.unwrap();
        let api = &state.kitchen_api;

        api.submit_order(OrderBuilder::new("A").line("tea", 1).build(), "cashier")
            .unwrap();
        let due_at = api.request_archive("A", "cashier").unwrap();
        assert!(api.flush_due_archives(due_at - Duration::seconds(1)).unwrap().is_empty());

        let archived = api.flush_due_archives(due_at + Duration::seconds(1)).unwrap();
        assert_eq!(archived, vec!["A".to_string()]);
        assert!(api.order("A").is_err());

        let record = state.archive_repo.find_by_order_id("A").unwrap().unwrap();
        assert_eq!(record.snapshot["order_id"], "A");

        let types = action_types(api, "A");
        assert!(types.contains(&"REQUEST_ARCHIVE".to_string()));
        assert!(types.contains(&"ARCHIVE_ORDER".to_string()));
    }

    #[tokio::test]
    async fn test_tick_applies_bumped_reset_version() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let state = AppState::new(db_path, standard_catalog()).await.unwrap();

        state
            .kitchen_api
            .submit_order(OrderBuilder::new("A").line("noodle-beef", 1).build(), "cashier")
            .unwrap();
        let report = tick_once(&state.kitchen_api, state.config_manager.as_ref()).await;
        assert!(!report.reset_applied);
        assert_eq!(report.active_orders, 1);

        assert_eq!(state.config_manager.bump_workflow_reset_version().unwrap(), 1);
        let report = tick_once(&state.kitchen_api, state.config_manager.as_ref()).await;
        assert!(report.reset_applied);
        assert_eq!(report.active_orders, 0);

        let report = tick_once(&state.kitchen_api, state.config_manager.as_ref()).await;
        assert!(!report.reset_applied);

        let recent = state.kitchen_api.recent_actions(5).unwrap();
        assert!(recent.iter().any(|log| log.action_type == "WORKFLOW_RESET"));
    }

    #[tokio::test]
    async fn test_fry_settings_written_back_to_config() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let state = AppState::new(db_path, standard_catalog()).await.unwrap();

        let settings = FryStationSettings {
            capacity_pieces: 24,
            default_cook_secs: 360,
        };
        state
            .kitchen_api
            .update_fry_settings("GRIDDLE-FALLBACK", settings, "manager")
            .unwrap();

        let stored = state.config_manager.get_kitchen_layout().await.unwrap();
        assert_eq!(stored.fry_settings("GRIDDLE-FALLBACK"), Some(settings));
    }

    #[tokio::test]
    async fn test_layout_survives_restart() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let layout = LayoutBuilder::new()
            .griddle("G1", 40, 420)
            .noodle("N1", 3)
            .lane("P1")
            .build();
        {
            let state = AppState::new(db_path.clone(), standard_catalog()).await.unwrap();
            state.kitchen_api.apply_layout(layout.clone(), "manager").unwrap();
            assert_eq!(state.config_manager.get_kitchen_layout().await.unwrap(), layout);
        }

        let state = AppState::new(db_path, standard_catalog()).await.unwrap();
        let views = state.kitchen_api.water_station_views().unwrap();
        assert!(views.iter().any(|v| v.station_id == "N1"));
        let started = Utc::now();
        assert!(state.kitchen_api.overview().unwrap().generated_at >= started);
    }
}
