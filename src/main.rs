// ==========================================
// 对话会议候选资格 - 服务主入口
// ==========================================
// 职责: 初始化日志与数据库,启动消费循环和定时任务,Ctrl-C 后停机
// ==========================================

use anyhow::Context;
use dialogmote_kandidat::app::{get_default_db_path, AppState};
use dialogmote_kandidat::logging;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", dialogmote_kandidat::APP_NAME, dialogmote_kandidat::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path)
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;
    tracing::info!(config = ?state.config, "AppState初始化成功");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = state.spawn_workers(shutdown_rx);
    tracing::info!(workers = handles.len(), "后台任务已启动");

    tokio::signal::ctrl_c()
        .await
        .context("无法监听停机信号")?;
    tracing::info!("收到停机信号,等待当前批次完成");

    // 接收端都已退出时发送失败,可以忽略
    let _ = shutdown_tx.send(true);
    for handle in handles {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "后台任务异常退出");
        }
    }

    tracing::info!("服务已停止");
    Ok(())
}
