// ==========================================
// 对话会议候选资格 - 应用状态
// ==========================================
// 职责: 管理共享连接、仓储、引擎、发布者与消费者的装配
// 说明: 所有组件共享同一个 Arc<Mutex<Connection>>
// ==========================================

use crate::api::{AssessmentService, CandidacyApi};
use crate::client::{
    FollowUpCaseQuery, HttpFollowUpCaseClient, HttpIdentitySourceClient, IdentitySource,
};
use crate::config::{CandidacyConfig, ConfigManager};
use crate::consumer::{
    ConsumerRunner, FollowUpPeriodHandler, IdentityChangeHandler, MeetingStatusHandler,
    SqliteInbox, FOLLOW_UP_PERIOD_TOPIC, IDENTITY_CHANGED_TOPIC, MEETING_STATUS_TOPIC,
};
use crate::db::{init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::{
    CheckpointEvaluator, FollowUpIngestor, IdentityMergeHandler, MeetingReactor,
    OptionalPublisher, OutboxPublisher, ReconciliationJob,
};
use crate::repository::OutboxRepository;
use crate::scheduler;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct AppState {
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,
    pub config: CandidacyConfig,
    pub config_manager: Arc<ConfigManager>,

    // ===== 对外接口 =====
    pub candidacy_api: Arc<CandidacyApi>,
    pub assessment_service: Arc<AssessmentService>,

    // ===== 引擎 =====
    pub publisher: OptionalPublisher,
    pub ingestor: Arc<FollowUpIngestor>,
    pub evaluator: Arc<CheckpointEvaluator>,
    pub meeting_reactor: Arc<MeetingReactor>,
    pub reconciliation: Arc<ReconciliationJob>,
    pub identity_merge: Arc<IdentityMergeHandler>,

    // ===== 入站主题 =====
    pub follow_up_inbox: Arc<SqliteInbox>,
    pub meeting_inbox: Arc<SqliteInbox>,
    pub identity_inbox: Arc<SqliteInbox>,
}

impl AppState {
    /// 打开数据库、建表、读取配置,使用 HTTP 协作服务客户端
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState,数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        match read_schema_version(&conn) {
            Ok(Some(v)) if v == CURRENT_SCHEMA_VERSION => {}
            Ok(other) => tracing::warn!(found = ?other, expected = CURRENT_SCHEMA_VERSION, "schema_version 与代码不一致"),
            Err(e) => tracing::warn!("读取 schema_version 失败: {}", e),
        }
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));
        let config = config_manager
            .load_candidacy_config()
            .map_err(|e| format!("无法加载配置: {}", e))?;

        let follow_up: Arc<dyn FollowUpCaseQuery> =
            Arc::new(HttpFollowUpCaseClient::new(&config.follow_up_case_url));
        let identity_source: Arc<dyn IdentitySource> =
            Arc::new(HttpIdentitySourceClient::new(&config.identity_source_url));

        Ok(Self::assemble(db_path, conn, config_manager, config, follow_up, identity_source))
    }

    /// 用给定连接与协作服务装配（测试使用替身）
    pub fn with_collaborators(
        conn: Arc<Mutex<Connection>>,
        config: CandidacyConfig,
        follow_up: Arc<dyn FollowUpCaseQuery>,
        identity_source: Arc<dyn IdentitySource>,
    ) -> Self {
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));
        Self::assemble(
            ":memory:".to_string(),
            conn,
            config_manager,
            config,
            follow_up,
            identity_source,
        )
    }

    fn assemble(
        db_path: String,
        conn: Arc<Mutex<Connection>>,
        config_manager: Arc<ConfigManager>,
        config: CandidacyConfig,
        follow_up: Arc<dyn FollowUpCaseQuery>,
        identity_source: Arc<dyn IdentitySource>,
    ) -> Self {
        // 候选变更先写入 outbox,由转发进程投递
        let publisher = OptionalPublisher::with_publisher(Arc::new(OutboxPublisher::new(
            OutboxRepository::new(conn.clone()),
        )));

        let assessment_service = Arc::new(AssessmentService::new(conn.clone(), publisher.clone()));
        let candidacy_api = Arc::new(CandidacyApi::new(conn.clone(), assessment_service.clone()));

        let ingestor = Arc::new(FollowUpIngestor::new(conn.clone(), config.clone()));
        let evaluator = Arc::new(CheckpointEvaluator::new(
            conn.clone(),
            follow_up,
            publisher.clone(),
            config.clone(),
        ));
        let meeting_reactor = Arc::new(MeetingReactor::new(conn.clone(), publisher.clone()));
        let reconciliation = Arc::new(ReconciliationJob::new(conn.clone(), publisher.clone()));
        let identity_merge = Arc::new(IdentityMergeHandler::new(conn.clone(), identity_source));

        Self {
            follow_up_inbox: Arc::new(SqliteInbox::new(conn.clone(), FOLLOW_UP_PERIOD_TOPIC)),
            meeting_inbox: Arc::new(SqliteInbox::new(conn.clone(), MEETING_STATUS_TOPIC)),
            identity_inbox: Arc::new(SqliteInbox::new(conn.clone(), IDENTITY_CHANGED_TOPIC)),
            db_path,
            conn,
            config,
            config_manager,
            candidacy_api,
            assessment_service,
            publisher,
            ingestor,
            evaluator,
            meeting_reactor,
            reconciliation,
            identity_merge,
        }
    }

    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }

    /// 启动三个消费循环和两个定时任务
    pub fn spawn_workers(&self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let config = &self.config;
        let poll_interval = Duration::from_millis(config.consumer_poll_interval_ms);
        let backoff = Duration::from_secs(config.consumer_backoff_secs);

        let runners = vec![
            ConsumerRunner::new(
                self.follow_up_inbox.clone(),
                Arc::new(FollowUpPeriodHandler::new(self.ingestor.clone())),
                config.consumer_batch_size,
                poll_interval,
                backoff,
            ),
            ConsumerRunner::new(
                self.meeting_inbox.clone(),
                Arc::new(MeetingStatusHandler::new(self.meeting_reactor.clone())),
                config.consumer_batch_size,
                poll_interval,
                backoff,
            ),
            ConsumerRunner::new(
                self.identity_inbox.clone(),
                Arc::new(IdentityChangeHandler::new(self.identity_merge.clone())),
                config.consumer_batch_size,
                poll_interval,
                backoff,
            ),
        ];

        let mut handles: Vec<JoinHandle<()>> = runners
            .into_iter()
            .map(|runner| {
                let rx = shutdown.clone();
                tokio::spawn(async move {
                    runner.run(rx).await;
                })
            })
            .collect();

        handles.push(tokio::spawn(scheduler::run_checkpoint_evaluator(
            self.evaluator.clone(),
            Duration::from_secs(config.evaluator_interval_secs),
            shutdown.clone(),
        )));
        handles.push(tokio::spawn(scheduler::run_reconciliation(
            self.reconciliation.clone(),
            config.reconciliation_cutoff,
            config.reconciliation_batch_size,
            Duration::from_secs(config.reconciliation_interval_secs),
            shutdown,
        )));

        handles
    }
}

/// 默认数据库路径
///
/// 优先读取 KANDIDAT_DB_PATH,否则使用用户数据目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("KANDIDAT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./dialogmote_kandidat.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("dialogmote-kandidat");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("dialogmote_kandidat.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(path.ends_with(".db"));
    }
}
