//! Integration tests for the polling loop
//!
//! The loop runs against scripted in-memory fakes of the status API and the
//! messenger, so every test is deterministic and offline.

use herald::api::StatusSource;
use herald::models::ReviewStatus;
use herald::notify::Messenger;
use herald::poller::{PollState, Poller, TickOutcome};
use herald::shutdown::Shutdown;
use herald::{HeraldError, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

const CHAT_ID: &str = "100500";
const APPROVED_TEXT: &str =
    "Изменился статус проверки работы \"hw_bot\". Работа проверена: ревьюеру всё понравилось. Ура!";

/// Status source replaying a fixed list of responses and recording every
/// `from_date` it was asked for.
#[derive(Default)]
struct FakeSource {
    responses: RefCell<VecDeque<Result<Value>>>,
    requested: RefCell<Vec<i64>>,
    stop_after: Option<(usize, Shutdown)>,
}

impl FakeSource {
    fn new(responses: Vec<Result<Value>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            ..Default::default()
        }
    }

    fn requested(&self) -> Vec<i64> {
        self.requested.borrow().clone()
    }
}

impl StatusSource for FakeSource {
    fn fetch(&self, from_date: i64) -> Result<Value> {
        self.requested.borrow_mut().push(from_date);
        if let Some((limit, shutdown)) = &self.stop_after {
            if self.requested.borrow().len() >= *limit {
                shutdown.request();
            }
        }
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({"homeworks": []})))
    }
}

#[derive(Default)]
struct FakeMessenger {
    sent: RefCell<Vec<(String, String)>>,
    failing: Cell<bool>,
}

impl FakeMessenger {
    fn texts(&self) -> Vec<String> {
        self.sent.borrow().iter().map(|(_, text)| text.clone()).collect()
    }
}

impl Messenger for FakeMessenger {
    fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        if self.failing.get() {
            return Err(HeraldError::Http {
                url: "https://api.telegram.test/bot<token>/sendMessage".to_string(),
                status: StatusCode::BAD_GATEWAY,
            });
        }
        self.sent
            .borrow_mut()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }
}

fn homeworks(status: &str) -> Value {
    json!({
        "homeworks": [{"homework_name": "hw_bot", "status": status}],
        "current_date": 1700000000
    })
}

fn server_down() -> HeraldError {
    HeraldError::Http {
        url: "https://practicum.test/api/".to_string(),
        status: StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn poller<'a>(source: &'a FakeSource, messenger: &'a FakeMessenger) -> Poller<'a> {
    Poller::new(
        source,
        messenger,
        CHAT_ID,
        Duration::from_millis(1),
        PollState::new(1_600_000_000),
    )
}

// ============================================================================
// STATUS TRANSITIONS
// ============================================================================

#[test]
fn test_reviewing_to_approved_sends_one_notification() {
    let source = FakeSource::new(vec![Ok(homeworks("approved"))]);
    let messenger = FakeMessenger::default();
    let mut poller = poller(&source, &messenger);

    let outcome = poller.tick();

    assert!(matches!(
        outcome,
        TickOutcome::Notified {
            delivered: true,
            ..
        }
    ));
    assert_eq!(
        messenger.sent.borrow().as_slice(),
        &[(CHAT_ID.to_string(), APPROVED_TEXT.to_string())]
    );
    assert_eq!(poller.state().last_status, ReviewStatus::Approved);
}

#[test]
fn test_repeated_status_is_announced_once() {
    let source = FakeSource::new(vec![
        Ok(homeworks("rejected")),
        Ok(homeworks("rejected")),
        Ok(homeworks("rejected")),
    ]);
    let messenger = FakeMessenger::default();
    let mut poller = poller(&source, &messenger);

    poller.tick();
    assert_eq!(poller.tick(), TickOutcome::Unchanged);
    assert_eq!(poller.tick(), TickOutcome::Unchanged);

    assert_eq!(messenger.texts().len(), 1);
    assert!(messenger.texts()[0].ends_with("Работа проверена: у ревьюера есть замечания."));
}

#[test]
fn test_every_transition_is_announced() {
    let source = FakeSource::new(vec![
        Ok(homeworks("rejected")),
        Ok(homeworks("reviewing")),
        Ok(homeworks("approved")),
    ]);
    let messenger = FakeMessenger::default();
    let mut poller = poller(&source, &messenger);

    for _ in 0..3 {
        poller.tick();
    }

    let texts = messenger.texts();
    assert_eq!(texts.len(), 3);
    assert!(texts[1].ends_with(ReviewStatus::Reviewing.verdict()));
    assert_eq!(texts[2], APPROVED_TEXT);
}

#[test]
fn test_empty_homeworks_sends_nothing() {
    let source = FakeSource::new(vec![Ok(json!({"homeworks": [], "current_date": 5}))]);
    let messenger = FakeMessenger::default();
    let mut poller = poller(&source, &messenger);

    assert_eq!(poller.tick(), TickOutcome::Unchanged);
    assert!(messenger.texts().is_empty());
    assert_eq!(poller.state().current_timestamp, 5);
}

#[test]
fn test_failed_delivery_still_records_status() {
    let source = FakeSource::new(vec![Ok(homeworks("approved")), Ok(homeworks("approved"))]);
    let messenger = FakeMessenger::default();
    messenger.failing.set(true);
    let mut poller = poller(&source, &messenger);

    let outcome = poller.tick();
    assert!(matches!(
        outcome,
        TickOutcome::Notified {
            delivered: false,
            ..
        }
    ));
    assert_eq!(poller.state().last_status, ReviewStatus::Approved);

    messenger.failing.set(false);
    assert_eq!(poller.tick(), TickOutcome::Unchanged);
    assert!(messenger.texts().is_empty());
}

// ============================================================================
// ERROR NOTIFICATIONS
// ============================================================================

#[test]
fn test_identical_consecutive_errors_notify_once() {
    let source = FakeSource::new(vec![Err(server_down()), Err(server_down())]);
    let messenger = FakeMessenger::default();
    let mut poller = poller(&source, &messenger);

    let first = poller.tick();
    let second = poller.tick();

    assert!(matches!(first, TickOutcome::Failed { reported: true, .. }));
    assert!(matches!(second, TickOutcome::Failed { reported: false, .. }));

    let texts = messenger.texts();
    assert_eq!(texts.len(), 1);
    assert_eq!(
        texts[0],
        "Сбой в работе программы: Эндпоинт https://practicum.test/api/ недоступен. Код ответа API: 500"
    );
}

#[test]
fn test_distinct_errors_are_each_reported() {
    let source = FakeSource::new(vec![
        Err(server_down()),
        Ok(json!({})),
        Ok(json!({"homeworks": "not-a-list"})),
        Ok(json!({"homeworks": "not-a-list"})),
    ]);
    let messenger = FakeMessenger::default();
    let mut poller = poller(&source, &messenger);

    for _ in 0..4 {
        poller.tick();
    }

    let texts = messenger.texts();
    assert_eq!(texts.len(), 3);
    assert!(texts.iter().all(|t| t.starts_with("Сбой в работе программы: ")));
    assert_eq!(
        poller.state().last_error_message.as_deref(),
        Some(texts[2].as_str())
    );
}

#[test]
fn test_same_error_after_recovery_stays_suppressed() {
    let source = FakeSource::new(vec![
        Err(server_down()),
        Ok(homeworks("reviewing")),
        Err(server_down()),
    ]);
    let messenger = FakeMessenger::default();
    let mut poller = poller(&source, &messenger);

    for _ in 0..3 {
        poller.tick();
    }

    assert_eq!(messenger.texts().len(), 1);
}

#[test]
fn test_unknown_status_is_reported_as_error() {
    let source = FakeSource::new(vec![Ok(homeworks("on_hold"))]);
    let messenger = FakeMessenger::default();
    let mut poller = poller(&source, &messenger);

    let outcome = poller.tick();

    assert!(matches!(outcome, TickOutcome::Failed { reported: true, .. }));
    assert_eq!(poller.state().last_status, ReviewStatus::Reviewing);
    assert!(messenger.texts()[0].contains("on_hold"));
}

#[test]
fn test_error_notification_failure_is_still_remembered() {
    let source = FakeSource::new(vec![Err(server_down()), Err(server_down())]);
    let messenger = FakeMessenger::default();
    messenger.failing.set(true);
    let mut poller = poller(&source, &messenger);

    assert!(matches!(poller.tick(), TickOutcome::Failed { reported: true, .. }));
    messenger.failing.set(false);
    assert!(matches!(poller.tick(), TickOutcome::Failed { reported: false, .. }));
    assert!(messenger.texts().is_empty());
}

// ============================================================================
// TIMESTAMP ADVANCEMENT
// ============================================================================

#[test]
fn test_current_date_becomes_next_from_date() {
    let source = FakeSource::new(vec![Ok(homeworks("reviewing")), Ok(json!({"homeworks": []}))]);
    let messenger = FakeMessenger::default();
    let mut poller = poller(&source, &messenger);

    poller.tick();
    poller.tick();

    assert_eq!(source.requested(), vec![1_600_000_000, 1_700_000_000]);
}

#[test]
fn test_missing_current_date_keeps_timestamp() {
    let source = FakeSource::new(vec![
        Ok(json!({"homeworks": []})),
        Ok(json!({"homeworks": []})),
    ]);
    let messenger = FakeMessenger::default();
    let mut poller = poller(&source, &messenger);

    poller.tick();
    poller.tick();

    assert_eq!(source.requested(), vec![1_600_000_000, 1_600_000_000]);
}

#[test]
fn test_failed_tick_keeps_timestamp() {
    let source = FakeSource::new(vec![
        Ok(json!({"homeworks": 1, "current_date": 1_700_000_000})),
        Ok(json!({"homeworks": []})),
    ]);
    let messenger = FakeMessenger::default();
    let mut poller = poller(&source, &messenger);

    poller.tick();
    poller.tick();

    assert_eq!(source.requested(), vec![1_600_000_000, 1_600_000_000]);
}

// ============================================================================
// RUN LOOP
// ============================================================================

#[test]
fn test_run_keeps_polling_after_failures_until_stopped() {
    let shutdown = Shutdown::new();
    let source = FakeSource {
        responses: RefCell::new(
            vec![Err(server_down()), Ok(homeworks("approved")), Err(server_down())].into(),
        ),
        stop_after: Some((3, shutdown.clone())),
        ..Default::default()
    };
    let messenger = FakeMessenger::default();
    let mut poller = poller(&source, &messenger);

    poller.run(&shutdown);

    assert_eq!(source.requested().len(), 3);
    // first error, approval, and the repeated error suppressed
    assert_eq!(messenger.texts().len(), 2);
    assert_eq!(messenger.texts()[1], APPROVED_TEXT);
}
