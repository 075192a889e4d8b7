//! The single shutdown path for interrupts.
//!
//! SIGINT, SIGTERM and SIGQUIT, and `Ctrl-C` read as a key event while the
//! terminal is in raw mode, all end in [`shutdown`].

use codex::tui::restore_terminal;

/// Exit status after an interrupt.
pub(crate) const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Restore the terminal and exit with [`INTERRUPTED_EXIT_CODE`].
pub(crate) fn shutdown() -> ! {
    restore_terminal();
    tracing::info!("interrupted, exiting");
    std::process::exit(INTERRUPTED_EXIT_CODE)
}

/// Watch for termination signals in the background.
pub(crate) fn spawn_signal_listener() {
    tokio::spawn(async {
        wait_for_signal().await;
        shutdown();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let streams = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::quit()),
    );
    let (Ok(mut interrupt), Ok(mut terminate), Ok(mut quit)) = streams else {
        tracing::debug!("could not install signal handlers");
        return std::future::pending().await;
    };
    tokio::select! {
        _ = interrupt.recv() => {}
        _ = terminate.recv() => {}
        _ = quit.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::debug!(%err, "could not install ctrl-c handler");
        std::future::pending::<()>().await;
    }
}
