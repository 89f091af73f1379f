// ==========================================
// 餐饮出品编排系统 - 服务主入口
// ==========================================
// 流程: 日志 → 目录快照 → AppState → 定时刷新任务 → Ctrl-C 停止
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use kitchen_orchestrator::app::{get_default_db_path, run_ticker, AppState};
use kitchen_orchestrator::config::OrchestratorConfigReader;
use kitchen_orchestrator::domain::CatalogItem;
use kitchen_orchestrator::engine::Catalog;
use kitchen_orchestrator::logging;
use tokio::sync::watch;

/// 目录快照路径（环境变量 KITCHEN_ORCHESTRATOR_CATALOG，JSON 数组）
fn load_catalog() -> Result<Catalog> {
    let Ok(path) = std::env::var("KITCHEN_ORCHESTRATOR_CATALOG") else {
        tracing::warn!("未指定目录快照，使用空目录");
        return Ok(Catalog::default());
    };
    let path = PathBuf::from(path.trim());
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("无法读取目录快照: {}", path.display()))?;
    let items: Vec<CatalogItem> =
        serde_json::from_str(&raw).with_context(|| format!("目录快照格式错误: {}", path.display()))?;
    tracing::info!(items = items.len(), "目录快照已加载");
    Ok(Catalog::new(items))
}

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var("KITCHEN_ORCHESTRATOR_LOG_JSON").is_ok() {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{} v{}", kitchen_orchestrator::APP_NAME, kitchen_orchestrator::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let catalog = load_catalog()?;
    let state = AppState::new(db_path, catalog)
        .await
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;

    let settings = state
        .config_manager
        .get_orchestrator_settings()
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let period = Duration::from_millis(settings.tick_interval_ms);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let config: Arc<dyn OrchestratorConfigReader> = state.config_manager.clone();
    let ticker = tokio::spawn(run_ticker(state.kitchen_api.clone(), config, period, shutdown_rx));

    tokio::signal::ctrl_c().await.context("监听停止信号失败")?;
    tracing::info!("收到停止信号");

    shutdown_tx.send(true).context("通知定时任务停止失败")?;
    ticker.await.context("定时任务异常退出")?;

    tracing::info!("服务已退出");
    Ok(())
}
