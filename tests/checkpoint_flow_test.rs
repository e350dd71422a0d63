// ==========================================
// 检查点流程集成测试
// ==========================================
// 职责: 随访期入站 → 检查点计划 → 定时评估 → 候选变更发布
// ==========================================


#[cfg(test)]
mod checkpoint_flow_test {
    use chrono::{Duration, NaiveDate};
    use dialogmote_kandidat::config::CandidacyConfig;
    use dialogmote_kandidat::domain::{
        ChangeReason, Checkpoint, CheckpointStatus, MeetingEventType, MeetingStatus,
    };
    use dialogmote_kandidat::engine::{
        CheckpointEvaluator, FollowUpIngestor, MeetingReactor, OptionalPublisher,
    };
    use dialogmote_kandidat::repository::{
        CandidacyChangeRepository, CheckpointRepository, InboundRecord,
    };
    use rusqlite::Connection;
    use std::sync::{Arc, Mutex};

    use crate::test_helpers::{
        create_test_db, eligible_period, follow_up_payload, recording_publisher, today,
        FakeFollowUpCase, RecordingPublisher,
    };

    const PERSON: &str = "12345678910";

    struct Env {
        _db: tempfile::NamedTempFile,
        conn: Arc<Mutex<Connection>>,
        follow_up: Arc<FakeFollowUpCase>,
        recorder: Arc<RecordingPublisher>,
        ingestor: FollowUpIngestor,
        evaluator: CheckpointEvaluator,
    }

    fn setup() -> Env {
        dialogmote_kandidat::logging::init_test();
        let (db, conn) = create_test_db().unwrap();
        let follow_up = Arc::new(FakeFollowUpCase::default());
        let (recorder, publisher) = recording_publisher();
        let config = CandidacyConfig::default();

        Env {
            ingestor: FollowUpIngestor::new(conn.clone(), config.clone()),
            evaluator: CheckpointEvaluator::new(conn.clone(), follow_up.clone(), publisher, config),
            _db: db,
            conn,
            follow_up,
            recorder,
        }
    }

    fn inbound(payload: String) -> InboundRecord {
        InboundRecord {
            offset: 1,
            topic: "follow-up-period-updated".to_string(),
            key: Some(PERSON.to_string()),
            payload: Some(payload),
        }
    }

    // ==========================================
    // 场景: 满足资格的随访期在检查点日成为候选
    // ==========================================
    #[tokio::test]
    async fn test_checkpoint_resolves_candidate_and_publishes() {
        let env = setup();
        let checkpoint_day = today();
        let start = checkpoint_day - Duration::days(119);
        let period = eligible_period(start, 150);
        env.follow_up.set_periods(PERSON, vec![period.clone()]);

        // 随访期第 10 天入站
        let summary = env
            .ingestor
            .ingest_batch(
                &[inbound(follow_up_payload(PERSON, &[period]))],
                start + Duration::days(10),
            )
            .unwrap();
        assert_eq!(summary.checkpoints_planned, 1);

        let checkpoints = CheckpointRepository::new(env.conn.clone())
            .find_by_person(PERSON)
            .unwrap();
        assert_eq!(checkpoints[0].planned_date, checkpoint_day);

        let result = env.evaluator.run(checkpoint_day).await.unwrap();
        assert_eq!(result.candidates, 1);
        assert_eq!(result.failed, 0);

        let latest = CandidacyChangeRepository::new(env.conn.clone())
            .find_latest(PERSON)
            .unwrap()
            .unwrap();
        assert!(latest.kandidat);
        assert_eq!(latest.reason, ChangeReason::Checkpoint);
        assert_eq!(latest.period_start, Some(start));

        let messages = env.recorder.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].arsak, "STOPPUNKT");
        assert_eq!(messages[0].tilfelle_start, Some(start));

        let checkpoint = CheckpointRepository::new(env.conn.clone())
            .find_by_person(PERSON)
            .unwrap()
            .remove(0);
        assert_eq!(checkpoint.status, CheckpointStatus::Candidate);
        assert!(checkpoint.processed_at.is_some());
    }

    // ==========================================
    // 场景: 检查点前已有完成的会议 → 不是候选
    // ==========================================
    #[tokio::test]
    async fn test_completed_meeting_resolves_not_candidate() {
        let env = setup();
        let checkpoint_day = today();
        let start = checkpoint_day - Duration::days(119);
        env.follow_up
            .set_periods(PERSON, vec![eligible_period(start, 150)]);

        CheckpointRepository::new(env.conn.clone())
            .insert(&Checkpoint::planned(PERSON, checkpoint_day))
            .unwrap();

        let held_at = (start + Duration::days(60))
            .and_hms_opt(10, 0, 0)
            .unwrap()
            .and_utc();
        MeetingReactor::new(env.conn.clone(), OptionalPublisher::none())
            .react_batch(&[MeetingStatus::new(
                PERSON,
                MeetingEventType::Completed,
                held_at,
                held_at,
            )])
            .unwrap();

        let result = env.evaluator.run(checkpoint_day).await.unwrap();
        assert_eq!(result.not_candidates, 1);
        assert_eq!(result.candidates, 0);

        assert!(CandidacyChangeRepository::new(env.conn.clone())
            .find_history(PERSON)
            .unwrap()
            .is_empty());
        assert!(env.recorder.messages().is_empty());
    }

    // ==========================================
    // 重投产生的重复检查点只产生一次候选变更
    // ==========================================
    #[tokio::test]
    async fn test_duplicate_checkpoints_produce_single_change() {
        let env = setup();
        let checkpoint_day = today();
        let start = checkpoint_day - Duration::days(119);
        env.follow_up
            .set_periods(PERSON, vec![eligible_period(start, 150)]);

        let checkpoints = CheckpointRepository::new(env.conn.clone());
        checkpoints
            .insert(&Checkpoint::planned(PERSON, checkpoint_day))
            .unwrap();
        checkpoints
            .insert(&Checkpoint::planned(PERSON, checkpoint_day))
            .unwrap();

        let result = env.evaluator.run(checkpoint_day).await.unwrap();
        assert_eq!(result.updated, 2);
        assert_eq!(result.candidates, 1);
        assert_eq!(result.not_candidates, 1);
        assert_eq!(env.recorder.messages().len(), 1);

        // 已处理的检查点不再到期
        let rerun = env.evaluator.run(checkpoint_day).await.unwrap();
        assert_eq!(rerun.updated, 0);
    }

    // ==========================================
    // 评估窗口: 今天和昨天
    // ==========================================
    #[tokio::test]
    async fn test_evaluation_window_covers_yesterday_only() {
        let env = setup();
        let day = today();
        let checkpoints = CheckpointRepository::new(env.conn.clone());
        checkpoints
            .insert(&Checkpoint::planned(PERSON, day - Duration::days(1)))
            .unwrap();
        checkpoints
            .insert(&Checkpoint::planned("10987654321", day - Duration::days(2)))
            .unwrap();

        // 没有随访期 → NotCandidate
        let result = env.evaluator.run(day).await.unwrap();
        assert_eq!(result.updated, 1);
        assert_eq!(result.not_candidates, 1);

        let untouched = checkpoints.find_by_person("10987654321").unwrap();
        assert_eq!(untouched[0].status, CheckpointStatus::Planned);
    }

    // ==========================================
    // 死亡日期使随访期失去资格,不计划检查点
    // ==========================================
    #[test]
    fn test_deceased_worker_gets_no_checkpoint() {
        let env = setup();
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let payload = serde_json::json!({
            "personIdentNumber": PERSON,
            "oppfolgingstilfelleList": [{
                "start": "2025-01-01", "end": "2025-08-01",
                "arbeidstakerAtTilfelleEnd": true, "virksomhetsnummerList": []
            }],
            "dodsdato": "2025-03-01"
        })
        .to_string();

        let summary = env
            .ingestor
            .ingest_batch(&[inbound(payload)], start + Duration::days(5))
            .unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.checkpoints_planned, 0);
    }
}
