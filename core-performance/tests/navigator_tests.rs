//! Navigator behaviour as seen by the performance view.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::content::{ContentService, FetchedContent, SongRef};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::ui::ExitSignal;
use core_performance::{NavKey, PerformanceNavigator};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, PerformanceEvent};

fn setlist(n: usize) -> Vec<SongRef> {
    (0..n)
        .map(|i| {
            SongRef::new(format!("song-{i}"), format!("Tune {i}"))
                .with_remote_url(format!("http://x/{i}.pdf"))
        })
        .collect()
}

#[derive(Default)]
struct CountingExit(AtomicUsize);

impl ExitSignal for CountingExit {
    fn exit_requested(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn next_at_last_song_stays_put() {
    let mut nav = PerformanceNavigator::new(setlist(5));

    assert!(nav.go_to(4));
    assert!(!nav.next());

    assert_eq!(nav.current_index(), Some(4));
    assert!(!nav.can_go_next());
    assert!(nav.can_go_previous());
}

#[test]
fn go_to_reads_back_every_valid_index() {
    for len in 1..6 {
        let mut nav = PerformanceNavigator::new(setlist(len));
        for i in 0..len {
            nav.go_to(i);
            assert_eq!(nav.current_index(), Some(i));
        }

        let before = nav.current_index();
        assert!(!nav.go_to(len));
        assert!(!nav.go_to(usize::MAX));
        assert_eq!(nav.current_index(), before);
    }
}

#[test]
fn boundaries_are_idempotent() {
    let mut nav = PerformanceNavigator::new(setlist(3));

    for _ in 0..3 {
        nav.previous();
    }
    assert_eq!(nav.current_index(), Some(0));

    for _ in 0..10 {
        nav.next();
    }
    assert_eq!(nav.current_index(), Some(2));
    assert_eq!(nav.position_label(), "3 / 3");
}

#[test]
fn arrow_keys_step_and_escape_exits() {
    let exit = Arc::new(CountingExit::default());
    let mut nav = PerformanceNavigator::new(setlist(3)).with_exit_signal(exit.clone());

    assert!(nav.handle_key(&NavKey::from_key_name("ArrowRight")));
    assert!(nav.handle_key(&NavKey::from_key_name("ArrowRight")));
    assert_eq!(nav.current_index(), Some(2));

    // Handled even though there is nowhere further to go.
    assert!(nav.handle_key(&NavKey::ArrowRight));
    assert_eq!(nav.current_index(), Some(2));

    assert!(nav.handle_key(&NavKey::ArrowLeft));
    assert_eq!(nav.current_index(), Some(1));

    assert!(nav.handle_key(&NavKey::from_key_name("Escape")));
    assert_eq!(exit.0.load(Ordering::SeqCst), 1);
    assert_eq!(nav.current_index(), Some(1));

    assert!(!nav.handle_key(&NavKey::from_key_name("Enter")));
}

#[test]
fn navigation_publishes_events() {
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();
    let mut nav = PerformanceNavigator::new(setlist(3)).with_event_bus(bus);

    nav.next();
    nav.next();
    nav.next(); // already at the end
    nav.handle_key(&NavKey::Escape);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert_eq!(
        events,
        vec![
            CoreEvent::Performance(PerformanceEvent::SongChanged {
                index: 1,
                song_id: "song-1".into()
            }),
            CoreEvent::Performance(PerformanceEvent::SongChanged {
                index: 2,
                song_id: "song-2".into()
            }),
            CoreEvent::Performance(PerformanceEvent::ExitRequested),
        ]
    );
}

#[test]
fn replacing_songs_keeps_or_clamps_position() {
    let mut nav = PerformanceNavigator::new(setlist(4));
    nav.go_to(2);

    nav.set_songs(setlist(6));
    assert_eq!(nav.current_index(), Some(2));

    nav.set_songs(setlist(1));
    assert_eq!(nav.current_index(), Some(0));
    assert!(!nav.can_go_next());
    assert!(!nav.can_go_previous());
}

struct OfflineContent;

#[async_trait]
impl ContentService for OfflineContent {
    async fn fetch_content_bytes(&self, content_id: &str) -> BridgeResult<FetchedContent> {
        Err(BridgeError::NotFound(content_id.to_string()))
    }

    async fn list_songs(&self, _setlist_id: &str) -> BridgeResult<Vec<SongRef>> {
        Ok(Vec::new())
    }
}

#[test]
fn runtime_config_supplies_exit_signal_and_event_bus() {
    let exit = Arc::new(CountingExit::default());
    let config = CoreConfig::builder()
        .content_service(Arc::new(OfflineContent))
        .exit_signal(exit.clone())
        .build()
        .unwrap();
    let mut events = config.subscribe().unwrap();

    let mut nav = PerformanceNavigator::from_core_config(&config, setlist(2));
    nav.handle_key(&NavKey::ArrowRight);
    nav.handle_key(&NavKey::Escape);

    assert_eq!(exit.0.load(Ordering::SeqCst), 1);
    assert!(matches!(
        events.try_recv(),
        Some(Ok(CoreEvent::Performance(PerformanceEvent::SongChanged { index: 1, .. })))
    ));
    assert!(matches!(
        events.try_recv(),
        Some(Ok(CoreEvent::Performance(PerformanceEvent::ExitRequested)))
    ));
}

#[test]
fn disabled_events_leave_navigator_silent() {
    let config = CoreConfig::builder()
        .content_service(Arc::new(OfflineContent))
        .enable_events(false)
        .build()
        .unwrap();

    let mut nav = PerformanceNavigator::from_core_config(&config, setlist(2));
    assert!(nav.next());
    assert!(config.subscribe().is_none());
}
