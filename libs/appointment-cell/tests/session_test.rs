use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};

use appointment_cell::models::BookingError;
use appointment_cell::services::{BookingCoordinator, BookingSession};
use auth_cell::SessionContext;
use doctor_cell::services::{FixedClock, SlotRepository};
use shared_config::ClaimProtocol;
use shared_database::InMemoryDocumentStore;
use shared_models::auth::Identity;
use shared_models::scheduling::Slot;

const DOCTOR: &str = "doc-1";

fn slot(id: &str, hour: u32, booked: bool) -> Slot {
    Slot {
        id: id.to_string(),
        doctor_id: DOCTOR.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(hour, 30, 0).unwrap(),
        is_booked: booked,
    }
}

fn store() -> Arc<InMemoryDocumentStore> {
    Arc::new(
        InMemoryDocumentStore::new()
            .with_slot(slot("s1", 10, false))
            .with_slot(slot("s2", 11, true))
            .with_slot(slot("s3", 12, false)),
    )
}

fn booking_session(store: Arc<InMemoryDocumentStore>, session: SessionContext) -> BookingSession {
    let now = NaiveDate::from_ymd_opt(2024, 5, 30)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let slots = SlotRepository::new(store.clone(), Duration::from_secs(5))
        .with_clock(Arc::new(FixedClock(now)));
    let coordinator = BookingCoordinator::new(store, ClaimProtocol::Conditional, Duration::from_secs(5));

    BookingSession::new(DOCTOR, session, slots, coordinator)
}

fn signed_in() -> SessionContext {
    SessionContext::signed_in(Identity::new("u1", Some("Mona Adel"), None))
}

fn ids(slots: &[Slot]) -> Vec<&str> {
    slots.iter().map(|s| s.id.as_str()).collect()
}

#[tokio::test]
async fn test_load_lists_only_open_slots() {
    let mut session = booking_session(store(), signed_in());
    let candidates = session.load().await;
    assert_eq!(ids(candidates), vec!["s1", "s3"]);
}

#[tokio::test]
async fn test_toggle_selects_and_deselects() {
    let mut session = booking_session(store(), signed_in());
    session.load().await;

    session.toggle_selection("s3");
    assert_eq!(session.selected_slot(), Some("s3"));
    assert_eq!(session.selection().time, NaiveTime::from_hms_opt(12, 0, 0));
    assert!(session.can_submit());

    session.toggle_selection("s3");
    assert_eq!(session.selected_slot(), None);
    assert!(!session.selection().is_complete());
}

#[tokio::test]
async fn test_toggle_ignores_non_candidates() {
    let mut session = booking_session(store(), signed_in());
    session.load().await;

    session.toggle_selection("s1");
    session.toggle_selection("s2");
    session.toggle_selection("nope");

    assert_eq!(session.selected_slot(), Some("s1"));
}

#[tokio::test]
async fn test_submit_prunes_claimed_slot() {
    let store = store();
    let mut session = booking_session(store.clone(), signed_in());
    session.load().await;
    session.toggle_selection("s1");

    let confirmation = session.submit().await.unwrap();

    assert_eq!(confirmation.slot_id, "s1");
    assert_eq!(ids(session.candidates()), vec!["s3"]);
    assert_eq!(session.selected_slot(), None);
    assert_eq!(store.bookings().await.len(), 1);
}

#[tokio::test]
async fn test_submit_of_taken_slot_returns_to_selection() {
    let store = store();
    let mut mine = booking_session(store.clone(), signed_in());
    let mut theirs = booking_session(
        store.clone(),
        SessionContext::signed_in(Identity::new("u2", None, None)),
    );
    mine.load().await;
    theirs.load().await;

    theirs.toggle_selection("s1");
    theirs.submit().await.unwrap();

    mine.toggle_selection("s1");
    assert_matches!(mine.submit().await, Err(BookingError::Unavailable));
    assert_eq!(ids(mine.candidates()), vec!["s3"]);
    assert_eq!(mine.selected_slot(), None);
}

#[tokio::test]
async fn test_submit_requires_sign_in() {
    let store = store();
    let context = signed_in();
    let mut session = booking_session(store.clone(), context.clone());
    session.load().await;
    session.toggle_selection("s1");
    store.clear_calls().await;

    context.sign_out();
    assert!(!session.can_submit());
    assert_matches!(session.submit().await, Err(BookingError::Validation(_)));

    // Selection survives so the patient can sign in and retry.
    assert_eq!(session.selected_slot(), Some("s1"));
    assert!(store.calls().await.is_empty());
}

#[tokio::test]
async fn test_store_error_keeps_state() {
    let store = store();
    let mut session = booking_session(store.clone(), signed_in());
    session.load().await;
    session.toggle_selection("s1");

    store.set_fail_writes(true);
    assert_matches!(session.submit().await, Err(BookingError::Store(_)));
    assert_eq!(ids(session.candidates()), vec!["s1", "s3"]);
    assert_eq!(session.selected_slot(), Some("s1"));
}

#[tokio::test]
async fn test_reload_drops_vanished_selection() {
    let store = store();
    let mut session = booking_session(store.clone(), signed_in());
    let mut other = booking_session(
        store.clone(),
        SessionContext::signed_in(Identity::new("u2", None, None)),
    );
    session.load().await;
    other.load().await;
    session.toggle_selection("s3");

    other.toggle_selection("s3");
    other.submit().await.unwrap();

    session.load().await;
    assert_eq!(ids(session.candidates()), vec!["s1"]);
    assert_eq!(session.selected_slot(), None);
}
