use std::io;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::{event::ChangeEvent, render::Renderer, sink::Sink};

use super::config::Config;

/// Renders every change from `config` into `sink` until the subscription ends or `cancel` fires.
///
/// Subscription errors are logged and skipped. A failing sink stops the run.
///
/// `sink` may be a reference or an `Arc` to share it between runs.
pub async fn run<ConfigT: Config, S: Sink>(
    config: ConfigT,
    sink: S,
    cancel: CancellationToken,
) -> Result<RunStats, RunError> {
    let renderer = Renderer::new(config.policy());
    let mut stats = RunStats::default();
    log::info!("watching for changes with {:?}", renderer.policy());

    let mut sub = config.subscribe();
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                log::info!("cancelled, stopping");
                break;
            }
            next = sub.next() => next,
        };

        match next {
            None => {
                log::info!("subscription ended");
                break;
            }
            Some(Err(err)) => {
                stats.errors += 1;
                log::warn!("subscription error: {err}");
            }
            Some(Ok(event)) => {
                log::debug!(
                    "rendering {} for {}",
                    event_tag(&event),
                    event.subject().name().unwrap_or_default()
                );
                sink.write(&renderer.render(&event)).map_err(RunError::Sink)?;
                stats.events += 1;
            }
        }
    }

    Ok(stats)
}

fn event_tag(event: &ChangeEvent) -> &'static str {
    match event {
        ChangeEvent::Added(_) => "addition",
        ChangeEvent::Updated { .. } => "update",
        ChangeEvent::Deleted(_) => "deletion",
    }
}

/// Counters for a finished [`run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Events written to the sink.
    pub events: u64,
    /// Subscription errors skipped.
    pub errors: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to write to sink: {0}")]
    Sink(#[source] io::Error),
}
