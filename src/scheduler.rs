// ==========================================
// 对话会议候选资格 - 定时任务
// ==========================================
// 职责: 按固定间隔运行检查点评估与过期候选对账
// 说明: 同一任务串行执行,不与自身重叠；停机信号在两次运行之间检查
// ==========================================

use crate::engine::{CheckpointEvaluator, ReconciliationJob};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// 等待下一次运行；收到停机信号返回 false
async fn wait_next(interval: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return false;
    }
    let sender_dropped = tokio::select! {
        _ = tokio::time::sleep(interval) => false,
        changed = shutdown.changed() => changed.is_err(),
    };
    !sender_dropped && !*shutdown.borrow()
}

/// 检查点评估任务
pub async fn run_checkpoint_evaluator(
    evaluator: Arc<CheckpointEvaluator>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(interval_secs = interval.as_secs(), "检查点评估任务启动");

    loop {
        let today = Utc::now().date_naive();
        if let Err(e) = evaluator.run(today).await {
            tracing::warn!(error = %e, "检查点评估运行失败");
        }

        if !wait_next(interval, &mut shutdown).await {
            break;
        }
    }

    tracing::info!("检查点评估任务停止");
}

/// 过期候选对账任务（未配置截止时间时不运行）
pub async fn run_reconciliation(
    job: Arc<ReconciliationJob>,
    cutoff: Option<DateTime<Utc>>,
    batch_size: usize,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let Some(cutoff) = cutoff else {
        tracing::info!("未配置对账截止时间,对账任务停用");
        return;
    };
    tracing::info!(cutoff = %cutoff, interval_secs = interval.as_secs(), "对账任务启动");

    loop {
        if let Err(e) = job.run(cutoff, batch_size) {
            tracing::warn!(error = %e, "对账运行失败");
        }

        if !wait_next(interval, &mut shutdown).await {
            break;
        }
    }

    tracing::info!("对账任务停止");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_next_observes_shutdown() {
        let (tx, mut rx) = watch::channel(false);
        assert!(wait_next(Duration::from_millis(1), &mut rx).await);

        tx.send(true).unwrap();
        assert!(!wait_next(Duration::from_secs(60), &mut rx).await);
    }
}
