//! Integration tests for input handling and shutdown.

mod common;

use std::time::Duration;

use serde_json::json;
use wraith_app::input::{self, PlayerInput};
use wraith_core::command::ActionCommand;
use wraith_dispatch::Submission;

#[tokio::test(start_paused = true)]
async fn test_mood_input_changes_anger() {
    let app = common::build_test_app(common::short_script(60_000));
    app.context.start().await.unwrap();

    let keep_going = app.context.handle_input(input::parse("insult"));
    app.context.handle_input(input::parse("apology"));

    assert!(keep_going);
    assert_eq!(app.context.mood().anger(), 5);
    assert_eq!(app.context.mood().snapshot().counters.kindness, 1);

    app.context.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_quit_is_recorded_and_ends_the_loop() {
    let app = common::build_test_app(common::short_script(60_000));
    app.context.start().await.unwrap();

    let keep_going = app.context.handle_input(PlayerInput::Quit);

    assert!(!keep_going);
    assert_eq!(app.context.mood().snapshot().counters.quit_attempts, 1);
    assert_eq!(app.context.mood().anger(), 20);

    app.context.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unknown_command_is_dropped() {
    let app = common::build_test_app(common::short_script(60_000));
    app.context.start().await.unwrap();

    app.context
        .handle_input(PlayerInput::Command(json!({ "action": "summon_demon" })));
    app.context.handle_input(input::parse("{ broken"));

    assert_eq!(app.context.engine().stats().dropped, 1);

    app.context.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_player_command_reaches_the_ui() {
    let mut app = common::build_test_app(common::short_script(60_000));
    app.context.start().await.unwrap();

    app.context
        .handle_input(input::parse(r#"{"action": "screen_shake", "params": {"intensity": 3}}"#));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let tags: Vec<String> = app
        .drain_ui()
        .into_iter()
        .filter_map(|request| match request {
            wraith_app::ui::UiRequest::Effect { tag, .. } => Some(tag),
            wraith_app::ui::UiRequest::Speech(_) => None,
        })
        .collect();
    assert_eq!(tags, vec!["screen_shake".to_owned()]);

    app.context.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_everything() {
    // Arrange
    let app = common::build_test_app(common::short_script(60_000));
    app.context.start().await.unwrap();

    // Act
    app.context.shutdown().await.unwrap();

    // Assert
    assert_eq!(app.context.engine().live_workers(), 0);
    assert!(!app.context.heartbeat().is_running());
    assert_eq!(
        app.context.engine().submit(ActionCommand::new("glitch")),
        Submission::Ignored
    );
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_app_frees_the_narrative() {
    // Arrange
    let app = common::build_test_app(common::short_script(60_000));
    app.context.start().await.unwrap();
    app.context.shutdown().await.unwrap();
    let narrative = app.context.narrative().downgrade();

    // Act: let the runtime reap the aborted phase tasks
    drop(app);
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Assert
    assert!(narrative.upgrade().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_second_start_is_rejected() {
    let app = common::build_test_app(common::short_script(60_000));
    app.context.start().await.unwrap();

    let result = app.context.start().await;

    assert!(result.is_err());

    app.context.shutdown().await.unwrap();
}
