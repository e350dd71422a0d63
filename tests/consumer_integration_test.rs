// ==========================================
// 入站消费端到端测试
// ==========================================
// 职责: AppState 装配 → 入站主题 → 消费循环 → outbox
// ==========================================


#[cfg(test)]
mod consumer_integration_test {
    use chrono::{Duration, Utc};
    use dialogmote_kandidat::app::AppState;
    use dialogmote_kandidat::config::CandidacyConfig;
    use dialogmote_kandidat::consumer::{
        ConsumerError, ConsumerRunner, FollowUpPeriodHandler, MeetingStatusHandler,
    };
    use dialogmote_kandidat::domain::{CandidacyChange, ChangeReason, MeetingEventType};
    use dialogmote_kandidat::repository::{
        CandidacyChangeRepository, MeetingStatusRepository, OutboxRepository,
    };
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    use crate::test_helpers::{
        create_test_db, eligible_period, follow_up_payload, today, FakeFollowUpCase,
        FakeIdentitySource,
    };

    const PERSON: &str = "12345678910";

    fn setup() -> (tempfile::NamedTempFile, AppState, Arc<FakeFollowUpCase>) {
        let (db, conn) = create_test_db().unwrap();
        let follow_up = Arc::new(FakeFollowUpCase::default());
        let state = AppState::with_collaborators(
            conn,
            CandidacyConfig::default(),
            follow_up.clone(),
            Arc::new(FakeIdentitySource::default()),
        );
        (db, state, follow_up)
    }

    fn meeting_runner(state: &AppState) -> ConsumerRunner {
        ConsumerRunner::new(
            state.meeting_inbox.clone(),
            Arc::new(MeetingStatusHandler::new(state.meeting_reactor.clone())),
            100,
            StdDuration::from_millis(10),
            StdDuration::from_millis(10),
        )
    }

    fn meeting_payload(status: &str, at: chrono::DateTime<Utc>) -> String {
        serde_json::json!({
            "personIdent": PERSON,
            "statusEndringType": status,
            "dialogmoteTidspunkt": at,
            "endringTidspunkt": at,
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_meeting_topic_batch_is_processed_and_acked() {
        let (_db, state, _) = setup();
        CandidacyChangeRepository::new(state.conn.clone())
            .insert(&CandidacyChange::at(
                PERSON,
                ChangeReason::Checkpoint,
                Utc::now() - Duration::days(2),
            ))
            .unwrap();

        let now = Utc::now();
        let inbox = &state.meeting_inbox;
        inbox
            .append(Some(PERSON), Some(&meeting_payload("NYTT_TID_STED", now)))
            .unwrap();
        inbox
            .append(Some(PERSON), Some(&meeting_payload("AVLYST", now)))
            .unwrap();
        inbox
            .append(Some(PERSON), Some(&meeting_payload("FERDIGSTILT", now)))
            .unwrap();
        inbox.append(Some(PERSON), None).unwrap();

        let runner = meeting_runner(&state);
        let summary = runner.poll_once().await.unwrap().unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.tombstones, 1);
        assert_eq!(inbox.pending().unwrap(), 0);

        // 其他类型的事件同样落库
        let stored = MeetingStatusRepository::new(state.conn.clone())
            .find_by_person(PERSON)
            .unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored
            .iter()
            .any(|s| s.event_type == MeetingEventType::Other("AVLYST".to_string())));

        let overview = state.candidacy_api.candidacy_for_person(PERSON).unwrap();
        assert_eq!(overview.status.reason, Some(ChangeReason::MeetingCompleted));
        assert_eq!(OutboxRepository::new(state.conn.clone()).count().unwrap(), 1);

        assert!(runner.poll_once().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_record_fails_batch_without_ack() {
        let (_db, state, _) = setup();
        state
            .meeting_inbox
            .append(Some(PERSON), Some("{\"personIdent\": 42"))
            .unwrap();

        let runner = meeting_runner(&state);
        let err = runner.poll_once().await.unwrap_err();
        assert!(matches!(err, ConsumerError::Deserialize(_)));

        // 未确认,下次重新投递
        assert_eq!(state.meeting_inbox.pending().unwrap(), 1);
        assert!(runner.poll_once().await.is_err());
    }

    #[tokio::test]
    async fn test_follow_up_topic_to_published_candidacy() {
        let (_db, state, follow_up) = setup();
        let day = today();
        let start = day - Duration::days(119);
        let period = eligible_period(start, 200);
        follow_up.set_periods(PERSON, vec![period.clone()]);

        state
            .follow_up_inbox
            .append(Some(PERSON), Some(&follow_up_payload(PERSON, &[period])))
            .unwrap();

        let runner = ConsumerRunner::new(
            state.follow_up_inbox.clone(),
            Arc::new(FollowUpPeriodHandler::new(state.ingestor.clone())),
            100,
            StdDuration::from_millis(10),
            StdDuration::from_millis(10),
        );
        let summary = runner.poll_once().await.unwrap().unwrap();
        assert_eq!(summary.processed, 1);

        let result = state.evaluator.run(day).await.unwrap();
        assert_eq!(result.candidates, 1);

        let overview = state.candidacy_api.candidacy_for_person(PERSON).unwrap();
        assert!(overview.status.kandidat);

        let outbox = OutboxRepository::new(state.conn.clone())
            .find_by_person(PERSON)
            .unwrap();
        assert_eq!(outbox.len(), 1);
        assert!(outbox[0].payload.contains("STOPPUNKT"));
    }
}
