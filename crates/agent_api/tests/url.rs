use agent_api::normalize_base_url;
use agent_api::url::{chat_url, feedback_url, stream_url, validate_base_url, DEFAULT_BASE_URL};

#[test]
fn blank_base_url_falls_back_to_default() {
    assert_eq!(normalize_base_url("   "), DEFAULT_BASE_URL);
}

#[test]
fn trailing_slashes_are_trimmed_before_paths_are_appended() {
    assert_eq!(
        chat_url("http://agent.internal:8000///"),
        "http://agent.internal:8000/chat"
    );
    assert_eq!(
        feedback_url(" http://agent.internal:8000/ "),
        "http://agent.internal:8000/human-feedback"
    );
}

#[test]
fn stream_url_percent_encodes_parameters() {
    let url = stream_url("http://localhost:8000", "what is 1+1?", "thread_abc")
        .expect("stream url should build");

    assert_eq!(url.path(), "/stream");
    assert_eq!(
        url.query(),
        Some("query=what+is+1%2B1%3F&thread_id=thread_abc")
    );
}

#[test]
fn base_url_validation_requires_http_scheme() {
    assert!(validate_base_url("https://agent.example").is_ok());
    assert!(validate_base_url("file:///tmp/agent").is_err());
    assert!(validate_base_url("not a url").is_err());
}
