// ==========================================
// 订单导入集成测试
// ==========================================
// 职责: 验证 CSV 导入整批提交、无法映射行整批拒绝、别名表生效
// ==========================================


mod helpers;

#[cfg(test)]
mod order_import_test {
    use crate::helpers::kitchen_builder::standard_catalog;
    use crate::test_helpers::create_test_db;
    use kitchen_orchestrator::api::ApiError;
    use kitchen_orchestrator::app::AppState;
    use kitchen_orchestrator::config::ConfigManager;
    use kitchen_orchestrator::domain::ServiceMode;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "订单号,下单时间,服务方式,商品编码,商品名称,数量,盒号,备注\n";

    fn write_csv(rows: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(HEADER.as_bytes()).unwrap();
        file.write_all(rows.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_import_commits_orders_in_file_order() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let state = AppState::new(db_path, standard_catalog()).await.unwrap();

        let csv = write_csv(
            "B,2026-03-01 12:05:00,外卖,noodle-beef,,1,,少辣\n\
             A,2026-03-01T12:00:00Z,堂食,,猪肉锅贴,6,,\n\
             B,2026-03-01 12:05:00,外卖,pot-leek,,4,盒1,\n\
             B,2026-03-01 12:05:00,外卖,tea,,1,盒1,\n",
        );
        let response = state
            .import_api
            .import_orders(csv.path(), "cashier")
            .await
            .unwrap();

        assert_eq!(response.total_rows, 4);
        assert_eq!(response.order_ids, vec!["B".to_string(), "A".to_string()]);
        assert!(!response.batch_id.is_empty());

        let b = state.kitchen_api.order("B").unwrap();
        assert_eq!(b.service_mode, ServiceMode::Delivery);
        assert_eq!(b.lines.len(), 1);
        assert_eq!(b.boxes.len(), 1);
        assert_eq!(b.boxes[0].rows.len(), 2);
        assert_eq!(b.note.as_deref(), Some("少辣"));

        let a = state.kitchen_api.order("A").unwrap();
        assert_eq!(a.lines[0].item_id, "pot-pork");
        assert_eq!(a.service_mode, ServiceMode::DineIn);

        let recent = state.kitchen_api.recent_actions(5).unwrap();
        let import_log = recent
            .iter()
            .find(|log| log.action_type == "IMPORT_ORDERS")
            .unwrap();
        assert_eq!(import_log.entity_id.as_deref(), Some(response.batch_id.as_str()));
    }

    #[tokio::test]
    async fn test_unmapped_row_rejects_whole_file() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let state = AppState::new(db_path, standard_catalog()).await.unwrap();

        let csv = write_csv(
            "A,,,tea,,1,,\n\
             B,,,POS-999,神秘套餐,1,,\n",
        );
        let err = state
            .import_api
            .import_orders(csv.path(), "cashier")
            .await
            .unwrap_err();

        match err {
            ApiError::UnmappedLines(lines) => {
                assert_eq!(lines.len(), 1);
                assert_eq!(lines[0].row_number, 2);
                assert_eq!(lines[0].foreign_code.as_deref(), Some("POS-999"));
            }
            other => panic!("Expected UnmappedLines, got {:?}", other),
        }
        assert!(state.kitchen_api.order("A").is_err());
        assert_eq!(state.kitchen_api.overview().unwrap().active_orders, 0);
    }

    #[tokio::test]
    async fn test_rejected_order_rejects_whole_file() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let state = AppState::new(db_path, standard_catalog()).await.unwrap();

        let csv = write_csv(
            "A,,,tea,,1,,\n\
             B#2,,,tea,,1,,\n",
        );
        let err = state
            .import_api
            .import_orders(csv.path(), "cashier")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(state.kitchen_api.order("A").is_err());
    }

    #[tokio::test]
    async fn test_stored_aliases_resolve_pos_codes() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let mut aliases = HashMap::new();
        aliases.insert("POS-101".to_string(), "dump-pork".to_string());
        ConfigManager::new(&db_path)
            .unwrap()
            .save_catalog_aliases(&aliases)
            .unwrap();

        let state = AppState::new(db_path, standard_catalog()).await.unwrap();
        let csv = write_csv("A,,自取,pos-101,,12,,\n");
        let response = state
            .import_api
            .import_orders(csv.path(), "cashier")
            .await
            .unwrap();
        assert_eq!(response.order_ids, vec!["A".to_string()]);

        let order = state.kitchen_api.order("A").unwrap();
        assert_eq!(order.lines[0].item_id, "dump-pork");
        assert_eq!(order.service_mode, ServiceMode::Takeout);
    }
}
