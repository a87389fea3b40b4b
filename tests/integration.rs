//! End-to-end tests with the in-memory provider and store.

use readify::{
    Authenticator, BookSummary, IdentityWatcher, MemoryAuthProvider, MemoryStore, MoodAnnotation,
    SubscriptionPhase, SyncConfig, SyncController, SyncNotice,
};
use std::sync::Arc;
use tempfile::TempDir;

struct App {
    provider: MemoryAuthProvider,
    store: MemoryStore,
    auth: Authenticator,
    controller: SyncController,
    _watcher: IdentityWatcher,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn app_with(provider: MemoryAuthProvider, store: MemoryStore, config: SyncConfig) -> App {
    init_tracing();
    let controller = SyncController::new(Arc::new(store.clone()), config).unwrap();
    let watcher = IdentityWatcher::start(&provider, controller.events());
    App {
        auth: Authenticator::new(Arc::new(provider.clone())),
        provider,
        store,
        controller,
        _watcher: watcher,
    }
}

fn app() -> App {
    let provider = MemoryAuthProvider::new();
    provider.add_account("Ada", "ada@example.com", "secret1");
    provider.add_account("Grace", "grace@example.com", "secret2");
    app_with(provider, MemoryStore::new(), SyncConfig::default())
}

fn book(title: &str) -> BookSummary {
    BookSummary {
        id: format!("vol-{title}"),
        title: title.to_string(),
        author: "Author".into(),
        cover_url: None,
        subjects: None,
        published_year: None,
    }
}

fn titles(controller: &SyncController) -> Vec<String> {
    controller
        .state()
        .library_records
        .iter()
        .map(|r| r.title.clone())
        .collect()
}

// --- Session Workflow ---

#[test]
fn test_startup_reports_signed_out() {
    let mut app = app();
    assert!(app.controller.state().is_loading);

    app.controller.pump();

    let state = app.controller.state();
    assert!(!state.is_loading);
    assert!(state.identity.is_none());
    assert_eq!(app.controller.subscriptions().phase(), SubscriptionPhase::Idle);
}

#[test]
fn test_reading_session_workflow() {
    let mut app = app();
    app.controller.pump();

    app.auth.sign_in("ada@example.com", "secret1").unwrap();
    app.controller.pump();

    let state = app.controller.state();
    assert_eq!(state.identity.as_ref().unwrap().display_name, "Ada");
    assert_eq!(app.controller.subscriptions().phase(), SubscriptionPhase::Active);
    assert_eq!(app.store.subscription_count(), 1);

    let mut mood = MoodAnnotation::default().with_color("#336699");
    mood.toggle_emotion("Inspired");
    app.controller.add_book(&book("Dune"), mood).unwrap();
    app.controller.pump();

    app.controller
        .add_book(&book("Emma"), MoodAnnotation::default())
        .unwrap();
    app.controller.pump();

    // Newest first, no optimistic duplicates left behind.
    assert_eq!(titles(&app.controller), vec!["Emma", "Dune"]);
    assert_eq!(app.store.documents("books").len(), 2);
    assert_eq!(app.controller.pending_inserts(), 0);

    let stats = app.controller.stats();
    assert_eq!(stats.total_books, 2);
    assert_eq!(stats.distinct_moods(), 2);
    assert_eq!(stats.emotion_counts["Inspired"], 1);
}

#[test]
fn test_optimistic_insert_converges_with_snapshot() {
    let mut app = app();
    app.auth.sign_in("ada@example.com", "secret1").unwrap();
    app.controller.pump();

    let notices = app.controller.listen();
    let ticket = app
        .controller
        .add_book(&book("Beloved"), MoodAnnotation::default())
        .unwrap();
    app.controller.pump();

    let notices = notices.drain();

    // The confirmed record is shown first, then the snapshot replaces it.
    let lengths: Vec<usize> = notices
        .iter()
        .filter_map(|n| match n {
            SyncNotice::StateChanged(state) => Some(state.library_records.len()),
            _ => None,
        })
        .collect();
    assert_eq!(lengths, vec![1, 1]);

    assert!(notices.iter().any(|n| matches!(
        n,
        SyncNotice::Inserted { ticket: t, .. } if *t == ticket
    )));

    let ids: Vec<_> = app
        .controller
        .state()
        .library_records
        .iter()
        .map(|r| r.id.clone())
        .collect();
    assert_eq!(ids.len(), 1);
    assert_eq!(ids[0].as_str(), app.store.documents("books")[0].id.as_str());
}

#[test]
fn test_libraries_are_isolated_per_user() {
    let mut app = app();

    app.auth.sign_in("ada@example.com", "secret1").unwrap();
    app.controller.pump();
    app.controller
        .add_book(&book("Dune"), MoodAnnotation::default())
        .unwrap();
    app.controller.pump();

    app.auth.sign_out().unwrap();
    app.controller.pump();
    assert!(app.controller.state().library_records.is_empty());
    assert_eq!(app.store.subscription_count(), 0);

    app.auth.sign_in("grace@example.com", "secret2").unwrap();
    app.controller.pump();
    assert!(app.controller.state().library_records.is_empty());

    app.controller
        .add_book(&book("Persuasion"), MoodAnnotation::default())
        .unwrap();
    app.controller.pump();
    assert_eq!(titles(&app.controller), vec!["Persuasion"]);

    // Switch straight back to Ada without signing out.
    app.auth.sign_in("ada@example.com", "secret1").unwrap();
    app.controller.pump();
    assert_eq!(titles(&app.controller), vec!["Dune"]);
    assert_eq!(app.store.subscription_count(), 1);

    let subs = app.controller.subscriptions();
    assert_eq!(subs.subscribe_count(), 3);
    assert_eq!(subs.unsubscribe_count(), 2);
}

#[test]
fn test_session_expiry_clears_library() {
    let mut app = app();
    app.auth.sign_in("ada@example.com", "secret1").unwrap();
    app.controller.pump();
    app.controller
        .add_book(&book("Dune"), MoodAnnotation::default())
        .unwrap();
    app.controller.pump();

    app.provider.expire_session();
    app.controller.pump();

    let state = app.controller.state();
    assert!(state.identity.is_none());
    assert!(state.library_records.is_empty());
    assert_eq!(app.controller.subscriptions().phase(), SubscriptionPhase::Idle);
}

#[test]
fn test_shutdown_releases_subscription() {
    let mut app = app();
    app.auth.sign_in("ada@example.com", "secret1").unwrap();
    app.controller.pump();

    let events = app.controller.events();
    events.shutdown();
    app.controller.run();

    assert_eq!(app.store.subscription_count(), 0);
    assert_eq!(app.controller.subscriptions().phase(), SubscriptionPhase::Idle);
}

// --- Local Cache ---

#[test]
fn test_cached_library_shown_before_first_snapshot() {
    let dir = TempDir::new().unwrap();
    let config = SyncConfig {
        cache_path: Some(dir.path().join("cache")),
        ..Default::default()
    };

    let provider = MemoryAuthProvider::new();
    provider.add_account("Ada", "ada@example.com", "secret1");

    {
        let mut app = app_with(provider.clone(), MemoryStore::new(), config.clone());
        app.auth.sign_in("ada@example.com", "secret1").unwrap();
        app.controller.pump();
        app.controller
            .add_book(&book("Dune"), MoodAnnotation::default())
            .unwrap();
        app.controller.pump();
    }

    // Restart while the session is still valid but the store is unreachable.
    let offline = MemoryStore::new();
    offline.fail_next_subscribe("unavailable");
    let mut app = app_with(provider, offline, config);

    assert_eq!(
        app.controller.cached_identity().map(|i| i.email),
        Some("ada@example.com".to_string())
    );

    app.controller.pump();

    assert_eq!(titles(&app.controller), vec!["Dune"]);
    assert_eq!(app.controller.subscriptions().phase(), SubscriptionPhase::Idle);
}

#[test]
fn test_sign_out_clears_cache() {
    let dir = TempDir::new().unwrap();
    let config = SyncConfig {
        cache_path: Some(dir.path().join("cache")),
        ..Default::default()
    };

    let provider = MemoryAuthProvider::new();
    provider.add_account("Ada", "ada@example.com", "secret1");
    let mut app = app_with(provider, MemoryStore::new(), config);

    app.auth.sign_in("ada@example.com", "secret1").unwrap();
    app.controller.pump();
    app.controller
        .add_book(&book("Dune"), MoodAnnotation::default())
        .unwrap();
    app.controller.pump();

    app.auth.sign_out().unwrap();
    app.controller.pump();

    assert!(app.controller.cached_identity().is_none());
}
