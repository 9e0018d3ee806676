//! Integration tests for presence transitions and broadcasts.

mod common;

use kinnect_realtime::event::ServerEvent;

use common::{drain, TestEngine};

#[tokio::test]
async fn first_session_broadcasts_online_to_everyone_else() {
    let app = TestEngine::new();
    let alice = app.users.add_user("alice");
    let bob = app.users.add_user("bob");
    let carol = app.users.add_user("carol");

    let (_alice_handle, mut alice_rx) = app.connect(alice).await;
    let (_bob_handle, mut bob_rx) = app.connect(bob).await;

    assert_eq!(drain(&mut alice_rx), vec![ServerEvent::UserOnline { user_id: bob }]);

    let (_carol_handle, mut carol_rx) = app.connect(carol).await;
    assert_eq!(drain(&mut alice_rx), vec![ServerEvent::UserOnline { user_id: carol }]);
    assert_eq!(drain(&mut bob_rx), vec![ServerEvent::UserOnline { user_id: carol }]);
    // The joining user never gets their own broadcast.
    assert!(drain(&mut carol_rx).is_empty());
}

#[tokio::test]
async fn additional_sessions_do_not_rebroadcast_online() {
    let app = TestEngine::new();
    let alice = app.users.add_user("alice");
    let bob = app.users.add_user("bob");

    let (_bob_handle, mut bob_rx) = app.connect(bob).await;
    let (_tab_one, _tab_one_rx) = app.connect(alice).await;
    let (_tab_two, _tab_two_rx) = app.connect(alice).await;
    let (_tab_three, _tab_three_rx) = app.connect(alice).await;

    let seen = drain(&mut bob_rx);
    assert_eq!(seen, vec![ServerEvent::UserOnline { user_id: alice }]);
}

#[tokio::test]
async fn offline_broadcasts_only_when_the_last_session_closes() {
    let app = TestEngine::new();
    let alice = app.users.add_user("alice");
    let bob = app.users.add_user("bob");

    let (_bob_handle, mut bob_rx) = app.connect(bob).await;
    let (tab_one, _tab_one_rx) = app.connect(alice).await;
    let (tab_two, _tab_two_rx) = app.connect(alice).await;
    drain(&mut bob_rx);

    app.engine.gateway.close(&tab_one).await;
    assert!(
        drain(&mut bob_rx).is_empty(),
        "one session left, still online"
    );
    assert!(app.engine.registry.is_online(alice));

    app.engine.gateway.close(&tab_two).await;
    let events = drain(&mut bob_rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        ServerEvent::UserOffline { user_id, .. } if user_id == alice
    ));
    assert!(!app.engine.registry.is_online(alice));
}

#[tokio::test]
async fn presence_is_persisted_best_effort() {
    let app = TestEngine::new();
    let alice = app.users.add_user("alice");
    let bob = app.users.add_user("bob");

    let (alice_handle, _alice_rx) = app.connect(alice).await;
    let (_bob_handle, _bob_rx) = app.connect(bob).await;

    let (online, _) = app.users.presence_of(alice).unwrap();
    assert!(online);

    app.engine.gateway.close(&alice_handle).await;

    let (online, last_seen) = app.users.presence_of(alice).unwrap();
    assert!(!online);
    assert!(last_seen.is_some(), "offline transition records last_seen");
}

#[tokio::test]
async fn offline_event_carries_last_seen() {
    let app = TestEngine::new();
    let alice = app.users.add_user("alice");
    let bob = app.users.add_user("bob");

    let (alice_handle, _alice_rx) = app.connect(alice).await;
    let (_bob_handle, mut bob_rx) = app.connect(bob).await;

    let before = chrono::Utc::now();
    app.engine.gateway.close(&alice_handle).await;

    let events = drain(&mut bob_rx);
    let ServerEvent::UserOffline { user_id, last_seen } = events[0] else {
        panic!("expected userOffline, got {:?}", events[0]);
    };
    assert_eq!(user_id, alice);
    assert!(last_seen >= before);
    assert_eq!(app.engine.registry.last_seen(alice), Some(last_seen));
}

#[tokio::test]
async fn closing_an_unbound_session_is_a_no_op() {
    let app = TestEngine::new();
    let bob = app.users.add_user("bob");

    let (_bob_handle, mut bob_rx) = app.connect(bob).await;
    let (stray, _stray_rx) = app.engine.gateway.open();

    app.engine.gateway.close(&stray).await;

    assert!(drain(&mut bob_rx).is_empty());
    assert_eq!(app.engine.registry.online_count(), 1);
}

#[tokio::test]
async fn registry_reports_online_users() {
    let app = TestEngine::new();
    let alice = app.users.add_user("alice");
    let bob = app.users.add_user("bob");

    let (_alice_handle, _alice_rx) = app.connect(alice).await;
    let (_bob_one, _bob_one_rx) = app.connect(bob).await;
    let (_bob_two, _bob_two_rx) = app.connect(bob).await;

    let mut online = app.engine.registry.online_user_ids();
    online.sort_by_key(|id| id.to_string());
    let mut expected = vec![alice, bob];
    expected.sort_by_key(|id| id.to_string());
    assert_eq!(online, expected);
    assert_eq!(app.engine.registry.online_count(), 2);
    assert_eq!(app.engine.registry.session_count(), 3);
}
