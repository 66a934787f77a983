mod support;

use agent_backend::{FeedbackOutcome, TurnOutcome};
use agent_chat::app::{App, Message, TurnState};
use pretty_assertions::assert_eq;

use support::{log_texts, HostSpy};

#[test]
fn stale_outcomes_are_ignored_after_a_newer_turn_starts() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    app.submit("first", &mut host);
    let first = host.last_query_turn();
    app.on_turn_resolved(
        first,
        TurnOutcome::Answered {
            text: "first answer".to_string(),
        },
        &mut host,
    );

    app.submit("second", &mut host);
    let second = host.last_query_turn();
    assert!(second > first);

    let messages = app.messages().to_vec();
    let state = app.state();

    app.on_turn_resolved(
        first,
        TurnOutcome::Answered {
            text: "duplicate late answer".to_string(),
        },
        &mut host,
    );
    app.on_turn_resolved(first, TurnOutcome::Paused, &mut host);
    app.on_feedback_resolved(
        first,
        FeedbackOutcome::Answered {
            text: "bogus".to_string(),
        },
        &mut host,
    );

    assert_eq!(app.messages(), messages.as_slice());
    assert_eq!(app.state(), state);

    app.on_turn_resolved(
        second,
        TurnOutcome::Answered {
            text: "second answer".to_string(),
        },
        &mut host,
    );
    assert_eq!(
        app.messages().last(),
        Some(&Message::assistant("second answer"))
    );
    assert_eq!(app.state(), TurnState::Idle);
}

#[test]
fn outcomes_while_idle_are_ignored() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    app.on_turn_resolved(
        1,
        TurnOutcome::Answered {
            text: "nobody asked".to_string(),
        },
        &mut host,
    );
    app.on_turn_resolved(1, TurnOutcome::Paused, &mut host);

    assert!(app.messages().is_empty());
    assert!(app.logs().is_empty());
    assert_eq!(app.state(), TurnState::Idle);
}

#[test]
fn late_logs_after_resolution_append_without_touching_state() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    app.submit("hi", &mut host);
    let turn_id = host.last_query_turn();
    app.on_turn_resolved(
        turn_id,
        TurnOutcome::Answered {
            text: "hello".to_string(),
        },
        &mut host,
    );
    let messages = app.messages().to_vec();

    app.on_stream_log(turn_id, "trailing diagnostic".to_string(), &mut host);

    assert_eq!(log_texts(&app), vec!["trailing diagnostic".to_string()]);
    assert_eq!(app.messages(), messages.as_slice());
    assert_eq!(app.state(), TurnState::Idle);
}

#[test]
fn logs_from_superseded_or_closed_streams_are_dropped() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    app.submit("first", &mut host);
    let first = host.last_query_turn();
    app.on_turn_resolved(
        first,
        TurnOutcome::Answered {
            text: "a".to_string(),
        },
        &mut host,
    );
    app.submit("second", &mut host);
    let second = host.last_query_turn();

    app.on_stream_log(first, "from superseded stream".to_string(), &mut host);
    app.on_stream_log(second, "live".to_string(), &mut host);
    app.on_stream_closed(second, None);
    app.on_stream_log(second, "after closure".to_string(), &mut host);

    assert_eq!(log_texts(&app), vec!["live".to_string()]);
    assert_eq!(app.log_scope(), None);
}

#[test]
fn paused_stream_keeps_delivering_trailing_logs_during_feedback() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    app.submit("risky task", &mut host);
    let turn_id = host.last_query_turn();
    app.on_turn_resolved(turn_id, TurnOutcome::Paused, &mut host);
    app.submit_feedback("proceed", &mut host);

    app.on_stream_log(turn_id, "Tool finished: duckduckgo_search".to_string(), &mut host);

    assert_eq!(
        log_texts(&app).last().map(String::as_str),
        Some("Tool finished: duckduckgo_search")
    );
    assert!(app.is_sending());
}

#[test]
fn closing_a_stale_stream_does_not_clear_the_live_scope() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    app.submit("first", &mut host);
    let first = host.last_query_turn();
    app.on_turn_resolved(
        first,
        TurnOutcome::Failed {
            reason: "boom".to_string(),
        },
        &mut host,
    );
    app.submit("second", &mut host);
    let second = host.last_query_turn();

    app.on_stream_closed(first, Some("connection reset"));

    assert_eq!(app.log_scope(), Some(second));
}
