//! Ledger behaviour over the in-memory store.
//!
//! Concurrency tests run on a multi-threaded runtime so registrations really
//! race each other.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect
#![allow(clippy::panic)]

use eventreg_core::{
    ConfirmationPolicy, EventCatalog, EventId, LedgerError, RegistrationLedger,
    RegistrationStatus, UserId,
};
use eventreg_testing::fixtures::{in_memory_ledger, new_event, new_event_in};
use eventreg_testing::{InMemoryDatabase, test_clock};
use eventreg_core::Clock;
use proptest::prelude::*;
use std::time::Duration;

const ORGANIZER: UserId = UserId::new(1);

async fn event(db: &InMemoryDatabase, seats: u32) -> EventId {
    db.create_event(new_event("Workshop", seats), ORGANIZER, test_clock().now())
        .await
        .unwrap()
        .id
}

/// Spawn one `register` per user and split the outcomes.
async fn register_all(
    ledger: &RegistrationLedger,
    event_id: EventId,
    users: impl IntoIterator<Item = UserId>,
) -> (Vec<UserId>, Vec<UserId>) {
    let tasks: Vec<_> = users
        .into_iter()
        .map(|user| {
            let ledger = ledger.clone();
            tokio::spawn(async move { (user, ledger.register(event_id, user).await) })
        })
        .collect();

    let mut accepted = Vec::new();
    let mut refused = Vec::new();
    for joined in futures::future::join_all(tasks).await {
        match joined.expect("task panicked") {
            (user, Ok(_)) => accepted.push(user),
            (user, Err(LedgerError::CapacityExceeded { .. })) => refused.push(user),
            (_, Err(other)) => panic!("unexpected error: {other}"),
        }
    }
    (accepted, refused)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_registrations_fill_exactly_capacity() {
    let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
    let event_id = event(&db, 10).await;

    let (accepted, refused) = register_all(&ledger, event_id, (100..140).map(UserId::new)).await;

    assert_eq!(accepted.len(), 10);
    assert_eq!(refused.len(), 30);
    assert_eq!(ledger.confirmed_count(event_id).await.unwrap(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_duplicates_admit_one() {
    let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
    let event_id = event(&db, 5).await;
    let user = UserId::new(7);

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.register(event_id, user).await })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(LedgerError::AlreadyRegistered { .. })))
            .count(),
        15
    );
    assert_eq!(ledger.confirmed_count(event_id).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_events_do_not_share_capacity() {
    let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
    let small = event(&db, 1).await;
    let large = event(&db, 20).await;

    let (small_ok, _) = register_all(&ledger, small, (0..10).map(UserId::new)).await;
    let (large_ok, large_refused) = register_all(&ledger, large, (0..10).map(UserId::new)).await;

    assert_eq!(small_ok.len(), 1);
    assert_eq!(large_ok.len(), 10);
    assert!(large_refused.is_empty());
}

#[tokio::test]
async fn test_active_registrant_cannot_register_twice() {
    let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
    let event_id = event(&db, 3).await;

    ledger.register(event_id, UserId::new(2)).await.unwrap();
    let err = ledger.register(event_id, UserId::new(2)).await.unwrap_err();

    assert_eq!(
        err,
        LedgerError::AlreadyRegistered {
            event_id,
            user_id: UserId::new(2)
        }
    );
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_already_registered_wins_over_full_event() {
    let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
    let event_id = event(&db, 1).await;

    ledger.register(event_id, UserId::new(2)).await.unwrap();
    assert!(matches!(
        ledger.register(event_id, UserId::new(2)).await,
        Err(LedgerError::AlreadyRegistered { .. })
    ));
}

#[tokio::test]
async fn test_register_for_unknown_event() {
    let (_db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
    assert_eq!(
        ledger.register(EventId::new(404), UserId::new(2)).await.unwrap_err(),
        LedgerError::EventNotFound(EventId::new(404))
    );
}

#[tokio::test]
async fn test_cancel_missing_or_cancelled_registration() {
    let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
    let event_id = event(&db, 3).await;
    let user = UserId::new(2);

    assert!(matches!(
        ledger.cancel(event_id, user).await,
        Err(LedgerError::RegistrationNotFound { .. })
    ));
    assert!(matches!(
        ledger.cancel(EventId::new(404), user).await,
        Err(LedgerError::RegistrationNotFound { .. })
    ));

    ledger.register(event_id, user).await.unwrap();
    ledger.cancel(event_id, user).await.unwrap();

    assert!(matches!(
        ledger.cancel(event_id, user).await,
        Err(LedgerError::RegistrationNotFound { .. })
    ));
}

#[tokio::test]
async fn test_cancel_restores_count_and_allows_reregistration() {
    let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
    let event_id = event(&db, 2).await;
    let user = UserId::new(3);

    let before = ledger.confirmed_count(event_id).await.unwrap();
    let first = ledger.register(event_id, user).await.unwrap();
    ledger.cancel(event_id, user).await.unwrap();
    assert_eq!(ledger.confirmed_count(event_id).await.unwrap(), before);

    let again = ledger.register(event_id, user).await.unwrap();
    assert_eq!(again.id, first.id);
    assert_eq!(again.status, RegistrationStatus::Confirmed);
}

#[tokio::test]
async fn test_registrants_exclude_cancelled() {
    let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
    let event_id = event(&db, 5).await;

    for n in 2..5 {
        ledger.register(event_id, UserId::new(n)).await.unwrap();
    }
    ledger.cancel(event_id, UserId::new(3)).await.unwrap();

    let users: Vec<_> = ledger
        .list_registrants(event_id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.user_id)
        .collect();

    assert_eq!(users.len(), 2);
    assert!(!users.contains(&UserId::new(3)));
}

#[tokio::test]
async fn test_registrants_newest_first() {
    let db = InMemoryDatabase::new();
    let clock = test_clock();
    let ledger = RegistrationLedger::new(
        std::sync::Arc::new(db.clone()),
        std::sync::Arc::new(db.clone()),
        std::sync::Arc::new(clock.clone()),
        eventreg_core::LedgerConfig::default(),
    );
    let event_id = event(&db, 5).await;

    for n in 2..5 {
        ledger.register(event_id, UserId::new(n)).await.unwrap();
        clock.advance(chrono::Duration::seconds(1));
    }

    let users: Vec<_> = ledger
        .list_registrants(event_id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.user_id.value())
        .collect();
    assert_eq!(users, [4, 3, 2]);
}

#[tokio::test]
async fn test_list_registrants_for_unknown_event() {
    let (_db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
    assert_eq!(
        ledger.list_registrants(EventId::new(9)).await.unwrap_err(),
        LedgerError::EventNotFound(EventId::new(9))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_three_users_two_seats_scenario() {
    let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
    let event_id = event(&db, 2).await;

    let (confirmed, rejected) = register_all(
        &ledger,
        event_id,
        [UserId::new(10), UserId::new(11), UserId::new(12)],
    )
    .await;
    assert_eq!(confirmed.len(), 2);
    assert_eq!(rejected.len(), 1);
    assert_eq!(ledger.confirmed_count(event_id).await.unwrap(), 2);

    ledger.cancel(event_id, confirmed[0]).await.unwrap();
    assert_eq!(ledger.confirmed_count(event_id).await.unwrap(), 1);

    let registration = ledger.register(event_id, rejected[0]).await.unwrap();
    assert_eq!(registration.status, RegistrationStatus::Confirmed);
    assert_eq!(ledger.confirmed_count(event_id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_manual_confirmation_flow() {
    let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Manual);
    let event_id = event(&db, 1).await;

    let pending = ledger.register(event_id, UserId::new(2)).await.unwrap();
    assert_eq!(pending.status, RegistrationStatus::Pending);
    ledger.register(event_id, UserId::new(3)).await.unwrap();

    let availability = ledger.availability(event_id).await.unwrap();
    assert_eq!(availability.confirmed, 0);
    assert_eq!(availability.available(), 1);
    assert_eq!(ledger.list_registrants(event_id).await.unwrap().len(), 2);

    let confirmed = ledger.confirm(event_id, UserId::new(2)).await.unwrap();
    assert_eq!(confirmed.status, RegistrationStatus::Confirmed);
    assert_eq!(confirmed.id, pending.id);

    assert!(matches!(
        ledger.confirm(event_id, UserId::new(3)).await,
        Err(LedgerError::CapacityExceeded { .. })
    ));
    assert!(matches!(
        ledger.confirm(event_id, UserId::new(2)).await,
        Err(LedgerError::RegistrationNotPending { .. })
    ));
    assert!(matches!(
        ledger.confirm(event_id, UserId::new(99)).await,
        Err(LedgerError::RegistrationNotFound { .. })
    ));

    // A full event refuses new pending registrations too.
    assert!(matches!(
        ledger.register(event_id, UserId::new(4)).await,
        Err(LedgerError::CapacityExceeded { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_confirmations_respect_capacity() {
    let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Manual);
    let event_id = event(&db, 3).await;

    for n in 0..12 {
        ledger.register(event_id, UserId::new(n)).await.unwrap();
    }

    let tasks: Vec<_> = (0..12)
        .map(|n| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.confirm(event_id, UserId::new(n)).await })
        })
        .collect();
    let confirmed = futures::future::join_all(tasks)
        .await
        .into_iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();

    assert_eq!(confirmed, 3);
    assert_eq!(ledger.confirmed_count(event_id).await.unwrap(), 3);
}

#[tokio::test]
async fn test_registrations_for_user() {
    let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
    let now = test_clock().now();
    let user = UserId::new(5);

    let soon = db.create_event(new_event_in("Soon", 5, 1), ORGANIZER, now).await.unwrap();
    let later = db.create_event(new_event_in("Later", 5, 10), ORGANIZER, now).await.unwrap();
    let skipped = db.create_event(new_event_in("Skipped", 5, 5), ORGANIZER, now).await.unwrap();

    ledger.register(soon.id, user).await.unwrap();
    ledger.register(later.id, user).await.unwrap();
    ledger.register(skipped.id, user).await.unwrap();
    ledger.cancel(skipped.id, user).await.unwrap();
    ledger.register(soon.id, UserId::new(6)).await.unwrap();

    let mine = ledger.registrations_for_user(user).await.unwrap();
    let titles: Vec<_> = mine.iter().map(|r| r.event_title.as_str()).collect();
    assert_eq!(titles, ["Later", "Soon"]);
    assert_eq!(mine[0].location, "Main Hall");
}

#[tokio::test]
async fn test_store_outage_is_retryable_and_writes_nothing() {
    let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
    let event_id = event(&db, 2).await;

    db.set_unavailable(true);
    let err = ledger.register(event_id, UserId::new(2)).await.unwrap_err();
    assert!(matches!(err, LedgerError::Persistence(_)));
    assert!(err.is_retryable());

    db.set_unavailable(false);
    assert_eq!(ledger.confirmed_count(event_id).await.unwrap(), 0);
    assert!(db.registration(event_id, UserId::new(2)).await.is_none());
}

#[tokio::test]
async fn test_register_with_deadline_succeeds_when_uncontended() {
    let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
    let event_id = event(&db, 2).await;

    let registration = ledger
        .register_within(event_id, UserId::new(2), Some(Duration::from_secs(1)))
        .await
        .unwrap();
    assert_eq!(registration.status, RegistrationStatus::Confirmed);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// However many users race for however many seats, exactly
    /// `min(seats, users)` are admitted.
    #[test]
    fn prop_concurrent_registrations_admit_min_of_seats_and_users(
        seats in 1_u32..8,
        users in 1_i64..24,
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        let (accepted, refused) = runtime.block_on(async {
            let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
            let event_id = event(&db, seats).await;
            register_all(&ledger, event_id, (0..users).map(UserId::new)).await
        });

        let expected = usize::try_from(seats).unwrap().min(usize::try_from(users).unwrap());
        prop_assert_eq!(accepted.len(), expected);
        prop_assert_eq!(accepted.len() + refused.len(), usize::try_from(users).unwrap());
    }
}
