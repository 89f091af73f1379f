// ==========================================
// 订单导入API
// ==========================================
// 职责: 文件导入 → 整批提交到编排引擎
// 红线: 任一行无法映射或任一订单被拒，整批不提交
// ==========================================

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::ApiResult;
use crate::api::kitchen_api::KitchenApi;
use crate::importer::OrderImporter;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 导入批次ID
    pub batch_id: String,
    /// 文件数据行数
    pub total_rows: usize,
    /// 已提交订单（文件中首次出现顺序）
    pub order_ids: Vec<String>,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

// ==========================================
// ImportApi
// ==========================================
pub struct ImportApi {
    importer: Box<dyn OrderImporter>,
    kitchen_api: Arc<KitchenApi>,
}

impl ImportApi {
    pub fn new(importer: Box<dyn OrderImporter>, kitchen_api: Arc<KitchenApi>) -> Self {
        Self { importer, kitchen_api }
    }

    /// 导入订单文件（.csv / .xlsx / .xls）
    ///
    /// # 返回
    /// - Err(ApiError::UnmappedLines): 无法映射的行，交由人工处理
    pub async fn import_orders(&self, file_path: &Path, actor: &str) -> ApiResult<ImportApiResponse> {
        let start = Instant::now();
        let outcome = self.importer.import_file(file_path, Utc::now()).await?;

        let order_ids =
            self.kitchen_api
                .submit_orders(outcome.submissions, actor, Some(&outcome.batch_id))?;

        let elapsed_ms = start.elapsed().as_millis() as i64;
        info!(
            batch_id = %outcome.batch_id,
            orders = order_ids.len(),
            total_rows = outcome.total_rows,
            elapsed_ms,
            "订单导入并提交完成"
        );

        Ok(ImportApiResponse {
            batch_id: outcome.batch_id,
            total_rows: outcome.total_rows,
            order_ids,
            elapsed_ms,
        })
    }
}
