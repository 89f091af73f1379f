// ==========================================
// 水煮任务集成测试
// ==========================================
// 职责: 验证勺位池、改位/退回、强制出锅、饺子批量下锅、汤饺拆分
// ==========================================

mod helpers;

#[cfg(test)]
mod water_task_test {
    use crate::helpers::kitchen_builder::*;
    use kitchen_orchestrator::domain::{ChecklistStatus, WaterTaskKind, WaterTaskStatus};
    use kitchen_orchestrator::engine::{KitchenOrchestrator, OrchestratorError};

    fn noodle_kitchen(slots: u8, orders: &[&str]) -> KitchenOrchestrator {
        let mut engine = orchestrator(LayoutBuilder::new().noodle("N1", slots).build());
        let submissions = orders
            .iter()
            .enumerate()
            .map(|(i, id)| {
                OrderBuilder::new(id)
                    .minute(i as i64)
                    .line("noodle-beef", 1)
                    .build()
            })
            .collect();
        submit_all(&mut engine, submissions);
        engine
    }

    fn dumpling_kitchen(quantities: &[u32]) -> KitchenOrchestrator {
        let mut engine = orchestrator(LayoutBuilder::new().dumpling("D1").build());
        let submissions = quantities
            .iter()
            .enumerate()
            .map(|(i, qty)| {
                OrderBuilder::new(&format!("O{}", i + 1))
                    .minute(i as i64)
                    .line("dump-pork", *qty)
                    .build()
            })
            .collect();
        submit_all(&mut engine, submissions);
        engine
    }

    // ==========================================
    // 勺位池
    // ==========================================

    #[test]
    fn test_third_noodle_waits_for_free_slot() {
        let mut engine = noodle_kitchen(2, &["A", "B", "C"]);

        engine.start_water_task("A#L1", Some(1), t0()).unwrap();
        engine.start_water_task("B#L1", Some(2), t0()).unwrap();

        let err = engine.start_water_task("C#L1", Some(1), t0()).unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::SlotOccupied { slot: 1, ref occupied_by, .. } if occupied_by == "A#L1"
        ));
        let err = engine.start_water_task("C#L1", Some(3), t0()).unwrap_err();
        assert!(matches!(err, OrchestratorError::SlotOutOfRange { capacity: 2, .. }));
        let err = engine.start_water_task("C#L1", None, t0()).unwrap_err();
        assert!(matches!(err, OrchestratorError::SlotRequired { .. }));

        engine.finish_water_task("A#L1", false, at_secs(240)).unwrap();
        engine.start_water_task("C#L1", Some(1), at_secs(240)).unwrap();

        let derivation = engine.derive(at_secs(240));
        let c = derivation.water_task("C#L1").unwrap();
        assert_eq!(c.runtime.status, WaterTaskStatus::Cooking);
        assert_eq!(c.runtime.slot, Some(1));
        assert_eq!(c.runtime.station_id.as_deref(), Some("N1"));
    }

    #[test]
    fn test_reassign_slot_keeps_start_time() {
        let mut engine = noodle_kitchen(3, &["A", "B"]);
        engine.start_water_task("A#L1", Some(1), t0()).unwrap();
        engine.start_water_task("B#L1", Some(2), t0()).unwrap();

        // 未解锁不能改位
        let err = engine.assign_ladle_slot("A#L1", 3, at_secs(30)).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidStateTransition { .. }));

        engine.unlock_water_task("A#L1", at_secs(30)).unwrap();
        let err = engine.assign_ladle_slot("A#L1", 2, at_secs(30)).unwrap_err();
        assert!(matches!(err, OrchestratorError::SlotOccupied { .. }));

        engine.assign_ladle_slot("A#L1", 3, at_secs(30)).unwrap();
        let derivation = engine.derive(at_secs(30));
        let a = derivation.water_task("A#L1").unwrap();
        assert_eq!(a.runtime.slot, Some(3));
        assert!(!a.runtime.slot_unlocked);
        assert_eq!(a.runtime.started_at, Some(t0()));
    }

    #[test]
    fn test_return_to_queue_requires_unlock() {
        let mut engine = noodle_kitchen(2, &["A"]);
        engine.start_water_task("A#L1", Some(1), t0()).unwrap();

        let err = engine.return_water_task("A#L1", at_secs(10)).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidStateTransition { .. }));

        engine.unlock_water_task("A#L1", at_secs(10)).unwrap();
        engine.return_water_task("A#L1", at_secs(10)).unwrap();

        let derivation = engine.derive(at_secs(10));
        let a = derivation.water_task("A#L1").unwrap();
        assert_eq!(a.runtime.status, WaterTaskStatus::Queued);
        assert_eq!(a.runtime.slot, None);
        assert!(a.runtime.started_at.is_none());
    }

    #[test]
    fn test_slot_never_held_by_two_cooking_tasks() {
        let mut engine = noodle_kitchen(2, &["A", "B", "C", "D"]);
        let attempts = [
            ("A#L1", 1u8),
            ("B#L1", 1),
            ("C#L1", 2),
            ("D#L1", 2),
            ("B#L1", 2),
        ];
        for (task_id, slot) in attempts {
            let _ = engine.start_water_task(task_id, Some(slot), t0());
        }

        let derivation = engine.derive(t0());
        let mut held: Vec<u8> = derivation
            .water_tasks
            .iter()
            .filter_map(|t| t.occupied_slot())
            .collect();
        held.sort_unstable();
        assert_eq!(held, vec![1, 2]);
    }

    // ==========================================
    // 出锅
    // ==========================================

    #[test]
    fn test_finish_requires_due_unless_forced() {
        let mut engine = noodle_kitchen(2, &["A"]);

        let err = engine.finish_water_task("A#L1", false, t0()).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidStateTransition { .. }));

        engine.start_water_task("A#L1", Some(1), t0()).unwrap();
        let err = engine.finish_water_task("A#L1", false, at_secs(100)).unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::NotFinished {
                remaining_secs: 140,
                ..
            }
        ));

        let forced = engine.finish_water_task("A#L1", true, at_secs(100)).unwrap();
        assert!(forced);

        let derivation = engine.derive(at_secs(100));
        let a = derivation.water_task("A#L1").unwrap();
        assert_eq!(a.runtime.status, WaterTaskStatus::Done);
        assert!(a.runtime.forced);
        assert_eq!(a.occupied_slot(), None);

        let err = engine.finish_water_task("A#L1", true, at_secs(110)).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidStateTransition { .. }));

        let view = engine.order_checklist("A", at_secs(110)).unwrap();
        assert_eq!(
            view.item("line:0:whole").unwrap().base_status,
            ChecklistStatus::Ready
        );
    }

    #[test]
    fn test_force_after_due_is_normal_finish() {
        let mut engine = noodle_kitchen(2, &["A"]);
        engine.start_water_task("A#L1", Some(1), t0()).unwrap();
        assert!(!engine.finish_water_task("A#L1", true, at_secs(300)).unwrap());
    }

    // ==========================================
    // 饺子批量下锅
    // ==========================================

    #[test]
    fn test_capture_fills_target_in_fifo_order() {
        let mut engine = dumpling_kitchen(&[15, 20, 30]);

        let captured = engine.capture_dumpling_batch("D1", Some(40), t0()).unwrap();
        assert_eq!(captured, vec!["O1#L1".to_string(), "O2#L1".to_string()]);

        let derivation = engine.derive(t0());
        assert_eq!(
            derivation.water_task("O3#L1").unwrap().runtime.status,
            WaterTaskStatus::Queued
        );
        assert_eq!(
            derivation.water_task("O1#L1").unwrap().runtime.status,
            WaterTaskStatus::Cooking
        );
    }

    #[test]
    fn test_capture_oversized_head_alone() {
        let mut engine = dumpling_kitchen(&[30, 5]);
        let captured = engine.capture_dumpling_batch("D1", Some(20), t0()).unwrap();
        assert_eq!(captured, vec!["O1#L1".to_string()]);
    }

    #[test]
    fn test_capture_rejects_bad_target_and_empty_queue() {
        let mut engine = dumpling_kitchen(&[10]);

        let err = engine.capture_dumpling_batch("D1", Some(10), t0()).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidCaptureTarget { .. }));
        let err = engine.capture_dumpling_batch("N9", None, t0()).unwrap_err();
        assert!(matches!(err, OrchestratorError::StationNotFound(_)));

        assert_eq!(
            engine.capture_dumpling_batch("D1", None, t0()).unwrap(),
            vec!["O1#L1".to_string()]
        );
        let err = engine.capture_dumpling_batch("D1", None, t0()).unwrap_err();
        assert!(matches!(err, OrchestratorError::NothingToCapture { .. }));
    }

    #[test]
    fn test_dumpling_task_needs_no_ladle() {
        let mut engine = dumpling_kitchen(&[12]);
        engine.start_water_task("O1#L1", None, t0()).unwrap();

        let derivation = engine.derive(t0());
        let task = derivation.water_task("O1#L1").unwrap();
        assert!(!task.requires_ladle);
        assert_eq!(task.occupied_slot(), None);
        // 12 只: 300 + ((12 - 1) / 10) × 30
        assert_eq!(task.required_secs, 330);
    }

    // ==========================================
    // 汤饺
    // ==========================================

    #[test]
    fn test_soup_dumpling_splits_into_food_and_soup() {
        let mut engine = orchestrator(LayoutBuilder::new().dumpling("D1").noodle("N1", 2).build());
        submit_all(
            &mut engine,
            vec![OrderBuilder::new("X").line("soup-dump", 2).build()],
        );

        let derivation = engine.derive(t0());
        let food = derivation.water_task("X#L1#food").unwrap();
        assert_eq!(food.kind, WaterTaskKind::Dumpling);
        assert_eq!(food.quantity, 16);
        assert_eq!(food.station_id, "D1");
        let soup = derivation.water_task("X#L1#soup").unwrap();
        assert_eq!(soup.kind, WaterTaskKind::SideHeat);
        assert_eq!(soup.quantity, 2);
        assert!(soup.requires_ladle);
        assert_eq!(soup.station_id, "N1");

        engine.capture_dumpling_batch("D1", Some(20), t0()).unwrap();
        engine.finish_water_task("X#L1#food", false, at_secs(600)).unwrap();

        let view = engine.order_checklist("X", at_secs(600)).unwrap();
        assert_eq!(
            view.item("line:0:food").unwrap().base_status,
            ChecklistStatus::Ready
        );
        assert_eq!(
            view.item("line:0:soup").unwrap().base_status,
            ChecklistStatus::Queued
        );
        assert!(!view.is_ready_to_pack());
    }
}
