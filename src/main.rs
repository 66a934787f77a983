use std::io::{self, BufRead};
use std::sync::{Arc, Mutex};
use std::thread;

use agent_chat::app::App;
use agent_chat::backends;
use agent_chat::commands::HELP_TEXT;
use agent_chat::config::EnvConfig;
use agent_chat::event_loop::EventLoop;
use agent_chat::logging;
use agent_chat::runtime::RuntimeController;
use agent_chat::view::TranscriptView;
use agent_chat::wake::RuntimeWake;
use time::UtcOffset;

fn main() -> io::Result<()> {
    // Must be read before any thread is spawned.
    let clock_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let config = EnvConfig::from_env().map_err(io::Error::other)?;
    logging::init(&config).map_err(io::Error::other)?;

    let backend = backends::backend_from_config(&config).map_err(io::Error::other)?;
    let profile = backend.profile();

    let app = App::new();
    let session_id = app.session_id().clone();
    let app = Arc::new(Mutex::new(app));
    let wake = Arc::new(RuntimeWake::new());
    let controller = RuntimeController::new(app, backend, Arc::clone(&wake));

    let stdout = io::stdout();
    let mut event_loop = EventLoop::new(
        controller,
        Arc::clone(&wake),
        TranscriptView::with_clock_offset(clock_offset),
        stdout.lock(),
    );

    let endpoint = profile
        .endpoint
        .map(|endpoint| format!(" at {endpoint}"))
        .unwrap_or_default();
    event_loop.notice(&format!(
        "Session {session_id} ({} backend{endpoint})",
        profile.backend_id
    ))?;
    event_loop.notice(HELP_TEXT)?;

    spawn_stdin_reader(wake)?;
    event_loop.run()
}

fn spawn_stdin_reader(wake: Arc<RuntimeWake>) -> io::Result<()> {
    thread::Builder::new()
        .name("agent-chat-stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => wake.enqueue_input(line),
                    Err(error) => {
                        tracing::warn!(%error, "stdin read failed");
                        break;
                    }
                }
            }
            wake.close_input();
        })
        .map(drop)
}
