//! Integration tests for the player: queue navigation, transport, EQ,
//! volume, event reconciliation, and failure handling

mod common;

use common::*;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use trio_audio::{EqPreset, MAX_GAIN_DB, MIN_GAIN_DB};
use trio_core::{LocalFileRef, MediaAction, RepeatMode, TrioError};
use trio_playback::{
    EngineState, MemoryFileProvider, MemorySettingsStore, PlaybackError, Player, VisualizerMode,
};

// ===== Next / Previous =====

#[tokio::test]
async fn next_at_end_without_repeat_is_noop() {
    let backend = TestBackend::new();
    let player = create_test_player(backend.clone());
    let tracks = three_tracks();

    player.play_track(tracks[2].clone(), Some(tracks.clone())).await.unwrap();
    let before = player.state();
    let load = player.engine().active_load_id();

    player.next().await.unwrap();

    assert_eq!(player.state(), before);
    assert_eq!(player.state().queue.index(), Some(2));
    assert!(player.state().playback.is_playing);
    assert_eq!(player.engine().active_load_id(), load);
    assert_eq!(backend.opened().len(), 1);
}

#[tokio::test]
async fn next_at_end_with_repeat_all_wraps() {
    let player = create_test_player(TestBackend::new());
    let tracks = three_tracks();
    player.set_repeat(RepeatMode::All);

    player.play_track(tracks[2].clone(), Some(tracks.clone())).await.unwrap();
    player.next().await.unwrap();

    let state = player.state();
    assert_eq!(state.queue.index(), Some(0));
    assert_eq!(current_title(&player).as_deref(), Some("a"));
    assert!(state.playback.is_playing);
    assert_eq!(player.engine().state(), EngineState::Playing);
}

#[tokio::test]
async fn next_on_empty_queue_is_noop() {
    let player = create_test_player(TestBackend::new());
    player.next().await.unwrap();
    assert_eq!(player.state().queue.index(), None);
    assert!(current_title(&player).is_none());
}

#[tokio::test]
async fn next_advances_in_order() {
    let player = create_test_player(TestBackend::new());
    let tracks = three_tracks();
    player.play_track(tracks[0].clone(), Some(tracks.clone())).await.unwrap();

    player.next().await.unwrap();
    assert_eq!(current_title(&player).as_deref(), Some("b"));
    player.next().await.unwrap();
    assert_eq!(current_title(&player).as_deref(), Some("c"));
    assert_eq!(player.state().playback.progress, Duration::ZERO);
}

#[tokio::test]
async fn shuffle_picks_any_index_in_range() {
    let player = create_test_player(TestBackend::new());
    let tracks = three_tracks();
    player.set_shuffle(true);
    player.play_track(tracks[2].clone(), Some(tracks.clone())).await.unwrap();

    let mut seen = std::collections::HashSet::new();
    for _ in 0..30 {
        player.next().await.unwrap();
        let index = player.state().queue.index().unwrap();
        assert!(index < 3);
        seen.insert(index);
    }
    // Repeat mode off does not stop shuffle at the end
    assert!(seen.len() > 1);
}

#[tokio::test]
async fn previous_early_in_track_restarts() {
    let player = create_test_player(TestBackend::new());
    let tracks = three_tracks();
    player.play_track(tracks[1].clone(), Some(tracks.clone())).await.unwrap();

    render_secs(&player, 1.5);
    assert_eq!(player.engine().position(), Duration::from_millis(1500));

    player.previous().await.unwrap();

    assert_eq!(player.state().queue.index(), Some(1));
    assert_eq!(current_title(&player).as_deref(), Some("b"));
    assert_eq!(player.engine().position(), Duration::ZERO);
    assert_eq!(player.state().playback.progress, Duration::ZERO);
}

#[tokio::test]
async fn previous_late_in_track_wraps_from_first_to_last() {
    let player = create_test_player(TestBackend::new());
    let tracks = three_tracks();
    player.play_track(tracks[0].clone(), Some(tracks.clone())).await.unwrap();
    assert_eq!(player.state().repeat, RepeatMode::Off);

    player.seek_to(Duration::from_secs(10));
    player.previous().await.unwrap();

    assert_eq!(player.state().queue.index(), Some(2));
    assert_eq!(current_title(&player).as_deref(), Some("c"));
}

#[tokio::test]
async fn play_index_jumps_and_ignores_out_of_range() {
    let player = create_test_player(TestBackend::new());
    let tracks = three_tracks();
    player.play_track(tracks[0].clone(), Some(tracks.clone())).await.unwrap();

    player.play_index(2).await.unwrap();
    assert_eq!(current_title(&player).as_deref(), Some("c"));

    player.play_index(9).await.unwrap();
    assert_eq!(player.state().queue.index(), Some(2));
}

// ===== Queue Editing =====

#[tokio::test]
async fn removing_current_last_entry_clamps_index() {
    let player = create_test_player(TestBackend::new());
    let tracks = three_tracks();
    player.play_track(tracks[2].clone(), Some(tracks.clone())).await.unwrap();

    player.remove_from_queue(2);
    assert_eq!(player.state().queue.len(), 2);
    assert_eq!(player.state().queue.index(), Some(1));

    player.remove_from_queue(0);
    player.remove_from_queue(0);
    assert_eq!(player.state().queue.index(), None);
    assert!(player.state().queue.is_empty());
}

#[tokio::test]
async fn removing_before_current_keeps_same_track() {
    let player = create_test_player(TestBackend::new());
    let tracks = three_tracks();
    player.play_track(tracks[1].clone(), Some(tracks.clone())).await.unwrap();

    player.remove_from_queue(0);
    let state = player.state();
    assert_eq!(state.queue.index(), Some(0));
    assert_eq!(state.queue.current().unwrap().title, "b");

    player.remove_from_queue(7);
    assert_eq!(player.state().queue.len(), 2);
}

#[tokio::test]
async fn reorder_to_same_position_changes_nothing() {
    let player = create_test_player(TestBackend::new());
    let tracks = three_tracks();
    player.play_track(tracks[1].clone(), Some(tracks.clone())).await.unwrap();
    let before = player.state().queue;

    for i in 0..3 {
        player.reorder_queue(i, i);
    }
    assert_eq!(player.state().queue, before);
}

#[tokio::test]
async fn reorder_keeps_cursor_on_current_track() {
    let player = create_test_player(TestBackend::new());
    let tracks = three_tracks();
    player.play_track(tracks[1].clone(), Some(tracks.clone())).await.unwrap();

    player.reorder_queue(1, 2);
    assert_eq!(player.state().queue.index(), Some(2));

    player.reorder_queue(0, 2);
    let queue = player.state().queue;
    assert_eq!(queue.index(), Some(1));
    assert_eq!(queue.current().unwrap().title, "b");
}

#[tokio::test]
async fn add_and_clear_leave_playback_alone() {
    let player = create_test_player(TestBackend::new());
    let tracks = three_tracks();
    player.play_track(tracks[0].clone(), Some(tracks.clone())).await.unwrap();

    player.add_to_queue(stream_track("d", 5));
    assert_eq!(player.state().queue.len(), 4);
    assert_eq!(player.state().queue.index(), Some(0));

    player.clear_queue();
    let state = player.state();
    assert_eq!(state.queue.index(), None);
    assert!(state.playback.is_playing);
    assert_eq!(current_title(&player).as_deref(), Some("a"));
    assert_eq!(player.engine().state(), EngineState::Playing);
}

// ===== Equalizer =====

#[tokio::test]
async fn eq_band_gain_is_clamped_and_marks_custom() {
    let player = create_test_player(TestBackend::new());

    player.set_eq_band(3, 20.0);
    assert_eq!(player.state().eq.gains[3], MAX_GAIN_DB);
    assert_eq!(player.engine().eq_gains()[3], MAX_GAIN_DB);

    player.set_eq_band(3, -20.0);
    assert_eq!(player.state().eq.gains[3], MIN_GAIN_DB);
    assert_eq!(player.engine().eq_gains()[3], MIN_GAIN_DB);

    player.apply_eq_preset(&EqPreset::rock());
    assert_eq!(player.state().eq.preset_name, "Rock");
    assert_eq!(player.engine().eq_gains(), EqPreset::rock().gains);

    player.set_eq_band(0, 1.0);
    assert_eq!(player.state().eq.preset_name, "Custom");
}

#[tokio::test]
async fn eq_band_out_of_range_is_ignored() {
    let player = create_test_player(TestBackend::new());
    let before = player.state();

    player.set_eq_band(10, 6.0);
    player.set_eq_band(usize::MAX, 6.0);

    assert_eq!(player.state(), before);
}

#[tokio::test]
async fn toggle_eq_bypasses_graph_and_restores_stored_gains() {
    let player = create_test_player(TestBackend::new());
    player.apply_eq_preset(&EqPreset::v_shape());
    let stored = player.state().eq.gains.clone();

    player.toggle_eq();
    assert!(!player.state().eq.enabled);
    assert!(player.engine().eq_gains().iter().all(|&g| g == 0.0));
    assert_eq!(player.state().eq.gains, stored);

    player.toggle_eq();
    assert!(player.state().eq.enabled);
    assert_eq!(player.engine().eq_gains(), stored);
}

#[tokio::test]
async fn eq_edits_while_disabled_apply_on_enable() {
    let player = create_test_player(TestBackend::new());
    player.toggle_eq();

    player.set_eq_band(5, 4.0);
    assert_eq!(player.engine().eq_gains()[5], 0.0);
    assert_eq!(player.state().eq.gains[5], 4.0);

    player.toggle_eq();
    assert_eq!(player.engine().eq_gains()[5], 4.0);
}

#[tokio::test]
async fn presets_and_reset() {
    let player = create_test_player(TestBackend::new());
    let names: Vec<String> = player.presets().into_iter().map(|p| p.name).collect();
    assert_eq!(names.len(), 8);
    assert!(names.iter().any(|n| n == "Bass Boost"));

    assert!(player.apply_eq_preset_named("Bass Boost"));
    assert!(!player.apply_eq_preset_named("Nope"));

    player.reset_eq();
    let state = player.state();
    assert_eq!(state.eq.preset_name, "Flat");
    assert!(state.eq.gains.iter().all(|&g| g == 0.0));
}

// ===== Volume =====

#[tokio::test]
async fn mute_round_trip_restores_exact_volume() {
    let player = create_test_player(TestBackend::new());
    player.set_volume(0.7);

    player.toggle_mute();
    assert!(player.state().playback.muted);
    assert_eq!(player.engine().volume(), 0.0);
    assert_eq!(player.state().playback.volume, 0.7);

    player.toggle_mute();
    assert!(!player.state().playback.muted);
    assert_eq!(player.engine().volume(), 0.7);
}

#[tokio::test]
async fn volume_is_clamped_and_survives_track_change() {
    let player = create_test_player(TestBackend::new());
    player.set_volume(3.0);
    assert_eq!(player.state().playback.volume, 1.0);

    player.set_volume(0.4);
    let tracks = three_tracks();
    player.play_track(tracks[0].clone(), Some(tracks.clone())).await.unwrap();
    player.next().await.unwrap();
    assert_eq!(player.engine().volume(), 0.4);
}

// ===== Track End =====

#[tokio::test]
async fn track_end_advances_to_next() {
    let player = create_test_player(TestBackend::new());
    let tracks = vec![stream_track("a", 1), stream_track("b", 1)];
    player.play_track(tracks[0].clone(), Some(tracks.clone())).await.unwrap();

    render_secs(&player, 1.5);
    player.process_pending_events().await;

    let state = player.state();
    assert_eq!(state.queue.index(), Some(1));
    assert_eq!(current_title(&player).as_deref(), Some("b"));
    assert!(state.playback.is_playing);
}

#[tokio::test]
async fn track_end_with_repeat_one_replays() {
    let player = create_test_player(TestBackend::new());
    let tracks = vec![stream_track("a", 1), stream_track("b", 1)];
    player.set_repeat(RepeatMode::One);
    player.play_track(tracks[0].clone(), Some(tracks.clone())).await.unwrap();
    let load = player.engine().active_load_id();

    render_secs(&player, 1.5);
    player.process_pending_events().await;

    let state = player.state();
    assert_eq!(state.queue.index(), Some(0));
    assert!(state.playback.is_playing);
    assert_eq!(player.engine().state(), EngineState::Playing);
    assert_eq!(player.engine().position(), Duration::ZERO);
    assert_eq!(player.engine().active_load_id(), load);
}

#[tokio::test]
async fn track_end_of_queue_stops() {
    let player = create_test_player(TestBackend::new());
    let tracks = vec![stream_track("a", 1)];
    player.play_track(tracks[0].clone(), Some(tracks.clone())).await.unwrap();

    render_secs(&player, 1.5);
    player.process_pending_events().await;

    let state = player.state();
    assert!(!state.playback.is_playing);
    assert_eq!(state.queue.index(), Some(0));
    assert_eq!(state.playback.progress, Duration::from_secs(1));
}

#[tokio::test]
async fn progress_events_update_state() {
    let player = create_test_player(TestBackend::new());
    let tracks = three_tracks();
    player.play_track(tracks[0].clone(), Some(tracks.clone())).await.unwrap();

    render_secs(&player, 1.0);
    player.process_pending_events().await;

    let state = player.state();
    assert_eq!(state.playback.progress, Duration::from_secs(1));
    assert_eq!(state.playback.duration, Duration::from_secs(20));
}

// ===== Failures =====

#[tokio::test]
async fn load_failure_is_reported_without_advancing() {
    let backend = TestBackend::new();
    let player = create_test_player(backend.clone());
    let broken = trio_core::Track::new(
        "broken",
        "x",
        "y",
        Duration::ZERO,
        trio_core::TrackSource::ResolvedStream {
            url: "https://cdn.test/fail.mp3".into(),
        },
    );
    let queue = vec![broken.clone(), stream_track("b", 5)];

    let err = player.play_track(broken, Some(queue)).await.unwrap_err();
    assert!(matches!(err, PlaybackError::Load(_)));

    player.process_pending_events().await;
    let state = player.state();
    assert_eq!(state.queue.index(), Some(0));
    assert!(!state.playback.is_playing);
    assert!(!state.ui.loading);
    assert!(state.ui.last_error.is_some());
    assert_eq!(player.engine().state(), EngineState::Ready);
    assert_eq!(backend.opened().len(), 1);

    player.dismiss_error();
    assert!(player.state().ui.last_error.is_none());
}

#[tokio::test]
async fn unresolvable_stream_leaves_state_untouched() {
    let resolver = ScriptedResolver::new(None);
    let player = Player::builder(TestBackend::new())
        .config(test_config())
        .resolver(resolver.clone())
        .build();
    let tracks = three_tracks();
    player.play_track(tracks[0].clone(), Some(tracks.clone())).await.unwrap();
    let before = player.state();

    let lost = catalog_track("lost");
    let err = player
        .play_track(lost.clone(), Some(vec![lost]))
        .await
        .unwrap_err();

    assert!(matches!(err, PlaybackError::Unresolvable(_)));
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    let after = player.state();
    assert_eq!(after.queue, before.queue);
    assert_eq!(after.playback, before.playback);
    assert!(after.ui.last_error.is_some());
}

#[tokio::test]
async fn catalog_track_without_resolver_is_unresolvable() {
    let player = create_test_player(TestBackend::new());
    let err = player
        .play_track(catalog_track("x"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PlaybackError::Unresolvable(_)));
    assert!(current_title(&player).is_none());
}

#[tokio::test]
async fn resolved_url_is_loaded() {
    let backend = TestBackend::new();
    let player = Player::builder(backend.clone())
        .config(test_config())
        .resolver(ScriptedResolver::new(Some("https://bridge.test/found?secs=3")))
        .build();

    player.play_track(catalog_track("song"), None).await.unwrap();

    assert_eq!(backend.opened(), vec!["https://bridge.test/found?secs=3".to_string()]);
    assert_eq!(player.state().playback.duration, Duration::from_secs(3));
    assert!(player.state().playback.is_playing);
}

#[tokio::test]
async fn invalid_track_is_rejected_before_any_change() {
    let player = create_test_player(TestBackend::new());
    let invalid = trio_core::Track::new(
        "empty",
        "x",
        "y",
        Duration::ZERO,
        trio_core::TrackSource::ResolvedStream { url: " ".into() },
    );
    let before = player.state();

    let err = player.play_track(invalid, None).await.unwrap_err();
    assert!(matches!(err, PlaybackError::Core(TrioError::InvalidTrack(_))));
    assert_eq!(player.state(), before);
}

#[tokio::test]
async fn initialization_failure_surfaces_to_caller() {
    let backend = TestBackend::new();
    backend.fail_context.store(true, Ordering::SeqCst);
    let player = create_test_player(backend);

    let err = player
        .play_track(stream_track("a", 5), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PlaybackError::Initialization(_)));
    assert_eq!(player.engine().state(), EngineState::Uninitialized);
    assert!(player.state().ui.last_error.is_some());
}

#[tokio::test]
async fn revoked_local_file_fails_load() {
    let files = Arc::new(MemoryFileProvider::new());
    files.insert(LocalFileRef::new("/music/ok.flac"), b"4".to_vec());
    let player = Player::builder(TestBackend::new())
        .config(test_config())
        .file_provider(files.clone())
        .build();

    player.play_track(local_track("/music/ok.flac"), None).await.unwrap();
    assert_eq!(player.state().playback.duration, Duration::from_secs(4));
    assert_eq!(player.engine().live_handles(), 1);

    files.revoke(&LocalFileRef::new("/music/ok.flac"));
    let err = player
        .play_track(local_track("/music/ok.flac"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PlaybackError::Load(_)));
    assert_eq!(player.engine().live_handles(), 0);
}

// ===== Races =====

#[tokio::test]
async fn newest_play_request_wins() {
    let backend = TestBackend::new();
    let player = create_test_player(backend.clone());
    let slow = stream_track("slow", 8);
    let slow = trio_core::Track {
        source: trio_core::TrackSource::ResolvedStream {
            url: "https://cdn.test/gated.mp3?secs=8".into(),
        },
        ..slow
    };

    let first = tokio::spawn({
        let player = player.clone();
        async move { player.play_track(slow, None).await }
    });
    while backend.opened().is_empty() {
        tokio::task::yield_now().await;
    }

    player.play_track(stream_track("fast", 2), None).await.unwrap();
    backend.release();
    first.await.unwrap().unwrap();
    player.process_pending_events().await;

    let state = player.state();
    assert_eq!(current_title(&player).as_deref(), Some("fast"));
    assert_eq!(state.playback.duration, Duration::from_secs(2));
    assert_eq!(player.engine().duration(), Duration::from_secs(2));
    assert!(state.playback.is_playing);
}

fn player_with_gated_resolver(resolver: Arc<ScriptedResolver>) -> Player {
    Player::builder(TestBackend::new())
        .config(test_config())
        .resolver(resolver)
        .build()
}

/// Start `next()` and wait until it is parked in the resolver
async fn pending_next(player: &Player, resolver: &ScriptedResolver) -> tokio::task::JoinHandle<()> {
    let pending = tokio::spawn({
        let player = player.clone();
        async move { player.next().await.unwrap() }
    });
    while resolver.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    pending
}

#[tokio::test]
async fn removal_during_pending_next_keeps_cursor_on_new_track() {
    let resolver = ScriptedResolver::gated(Some("https://cdn.test/c.mp3?secs=20"));
    let player = player_with_gated_resolver(resolver.clone());
    let queue = vec![stream_track("a", 20), catalog_track("c"), stream_track("d", 20)];
    player.play_track(queue[0].clone(), Some(queue.clone())).await.unwrap();

    let pending = pending_next(&player, &resolver).await;
    player.remove_from_queue(0);
    resolver.release();
    pending.await.unwrap();

    let state = player.state();
    assert_eq!(current_title(&player).as_deref(), Some("c"));
    assert_eq!(
        state.queue.current().map(|t| t.title.as_str()),
        Some("c")
    );
}

#[tokio::test]
async fn reorder_during_pending_next_keeps_cursor_on_new_track() {
    let resolver = ScriptedResolver::gated(Some("https://cdn.test/c.mp3?secs=20"));
    let player = player_with_gated_resolver(resolver.clone());
    let queue = vec![stream_track("a", 20), catalog_track("c"), stream_track("d", 20)];
    player.play_track(queue[0].clone(), Some(queue.clone())).await.unwrap();

    let pending = pending_next(&player, &resolver).await;
    player.reorder_queue(1, 2);
    resolver.release();
    pending.await.unwrap();

    let state = player.state();
    assert_eq!(current_title(&player).as_deref(), Some("c"));
    assert_eq!(
        state.queue.current().map(|t| t.title.as_str()),
        Some("c")
    );
}

#[tokio::test]
async fn track_removed_during_pending_next_leaves_cursor_alone() {
    let resolver = ScriptedResolver::gated(Some("https://cdn.test/c.mp3?secs=20"));
    let player = player_with_gated_resolver(resolver.clone());
    let queue = vec![stream_track("a", 20), catalog_track("c"), stream_track("d", 20)];
    player.play_track(queue[0].clone(), Some(queue.clone())).await.unwrap();

    let pending = pending_next(&player, &resolver).await;
    player.remove_from_queue(1);
    resolver.release();
    pending.await.unwrap();

    let state = player.state();
    assert_eq!(current_title(&player).as_deref(), Some("c"));
    assert_eq!(
        state.queue.current().map(|t| t.title.as_str()),
        Some("a")
    );
}

#[tokio::test]
async fn draining_while_event_loop_runs_does_not_wait() {
    let player = create_test_player(TestBackend::new());
    let events = player.spawn_event_loop();
    tokio::task::yield_now().await;

    let handled = tokio::time::timeout(Duration::from_secs(1), player.process_pending_events())
        .await
        .unwrap();
    assert_eq!(handled, 0);

    player.shutdown();
    events.await.unwrap();
}

// ===== Media Session =====

#[tokio::test]
async fn media_session_mirrors_and_controls_playback() {
    let media = Arc::new(RecordingMediaSession::default());
    let player = Player::builder(TestBackend::new())
        .config(test_config())
        .media_session(media.clone())
        .build();
    let tracks = three_tracks();

    player.play_track(tracks[0].clone(), Some(tracks.clone())).await.unwrap();
    assert_eq!(media.last_title().as_deref(), Some("a"));
    assert_eq!(media.playing.lock().unwrap().last(), Some(&true));

    media.trigger(MediaAction::NextTrack);
    player.process_pending_events().await;
    assert_eq!(current_title(&player).as_deref(), Some("b"));
    assert_eq!(media.last_title().as_deref(), Some("b"));

    media.trigger(MediaAction::SeekForward(Duration::from_secs(5)));
    media.trigger(MediaAction::Pause);
    player.process_pending_events().await;
    assert_eq!(player.engine().position(), Duration::from_secs(5));
    assert!(!player.state().playback.is_playing);
    assert_eq!(media.playing.lock().unwrap().last(), Some(&false));

    media.trigger(MediaAction::Play);
    player.process_pending_events().await;
    assert!(player.state().playback.is_playing);
}

#[tokio::test]
async fn huge_seek_forward_lands_at_track_end() {
    let media = Arc::new(RecordingMediaSession::default());
    let player = Player::builder(TestBackend::new())
        .config(test_config())
        .media_session(media.clone())
        .build();
    let tracks = three_tracks();
    player.play_track(tracks[0].clone(), Some(tracks.clone())).await.unwrap();
    render_secs(&player, 1.0);

    media.trigger(MediaAction::SeekForward(Duration::MAX));
    player.process_pending_events().await;

    assert_eq!(player.engine().position(), player.engine().duration());
    assert_eq!(current_title(&player).as_deref(), Some("a"));
}

#[tokio::test]
async fn event_loop_reconciles_in_background() {
    let player = create_test_player(TestBackend::new());
    let tracks = vec![stream_track("a", 1), stream_track("b", 1)];
    let handle = player.spawn_event_loop();

    player.play_track(tracks[0].clone(), Some(tracks.clone())).await.unwrap();
    render_secs(&player, 1.5);
    for _ in 0..100 {
        if current_title(&player).as_deref() == Some("b") {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(current_title(&player).as_deref(), Some("b"));

    player.shutdown();
    handle.await.unwrap();
    assert_eq!(player.engine().state(), EngineState::Uninitialized);
}

// ===== Observation =====

#[tokio::test]
async fn subscribers_receive_snapshots_until_dropped() {
    let player = create_test_player(TestBackend::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let subscription = player.subscribe(move |state| {
        sink.lock().unwrap().push(state.ui.visualizer);
    });

    player.set_visualizer(VisualizerMode::Wave);
    player.set_visualizer(VisualizerMode::Off);
    drop(subscription);
    player.set_visualizer(VisualizerMode::Bars);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![VisualizerMode::Wave, VisualizerMode::Off]
    );
}

#[tokio::test]
async fn shuffle_and_repeat_toggles() {
    let store = Arc::new(MemorySettingsStore::new());
    let player = Player::builder(TestBackend::new())
        .config(test_config())
        .settings(store.clone())
        .build();

    player.toggle_shuffle();
    player.cycle_repeat();
    player.cycle_repeat();
    let state = player.state();
    assert!(state.shuffle);
    assert_eq!(state.repeat, RepeatMode::One);

    player.flush_settings().await;
    let saved = store.current().unwrap();
    assert!(saved.shuffle);
    assert_eq!(saved.repeat, RepeatMode::One);
}
