//! Headless display: mirrors a remote authority over its HTTP mailbox and
//! logs what a screen would show.

use crate::config::AppConfig;
use crate::import::mock_pool;
use crate::mailbox::{HttpMailbox, Mailbox, MailboxResult, HTTP_TIMEOUT};
use crate::observer::Observer;
use crate::replica::Mirror;
use crate::rolling::RollingGrid;
use crate::types::DrawPhase;
use std::sync::Arc;

/// Run until Ctrl-C
pub async fn run(config: &AppConfig) -> MailboxResult<()> {
    let mailbox = HttpMailbox::new(&config.server_url, HTTP_TIMEOUT)?;
    tracing::info!(url = mailbox.url(), "Display polling authority");

    let mailbox: Arc<dyn Mailbox> = Arc::new(mailbox);
    let observer = Observer::spawn(initial_mirror(config), None, Some(mailbox), config.poll_interval);
    let grid = RollingGrid::spawn(observer.mirror(), config.spin);

    let mut mirror = observer.mirror();
    let mut views = grid.views();
    let mut last = mirror.borrow().clone();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = mirror.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = mirror.borrow_and_update().clone();
                announce(&last, &current);
                last = current;
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = views.borrow_and_update().clone();
                tracing::trace!(?frame, "Grid frame");
            }
            _ = &mut shutdown => {
                tracing::info!("Display shutting down");
                break;
            }
        }
    }

    drop(grid);
    observer.shutdown();
    Ok(())
}

/// Idle faces come from the demo pool until the first START_ROLL brings the
/// real one
fn initial_mirror(config: &AppConfig) -> Mirror {
    if config.mock_pool {
        let demo = mock_pool();
        Mirror::with_pool(demo.headers, demo.participants)
    } else {
        Mirror::default()
    }
}

fn announce(previous: &Mirror, current: &Mirror) {
    if current.background_color != previous.background_color {
        tracing::info!("Background is now {}", current.background_color);
    }

    if current.phase == previous.phase && current.last_sequence == previous.last_sequence {
        return;
    }

    match current.phase {
        DrawPhase::Rolling => tracing::info!(
            sequence = current.last_sequence,
            slots = current.display_count,
            pool = current.pool.len(),
            "Rolling"
        ),
        DrawPhase::Revealed => {
            tracing::info!(celebrate = current.celebrate, "Revealed {} winner(s)", current.winners.len());
            for (slot, winner) in current.winners.iter().enumerate() {
                tracing::info!(
                    slot = slot + 1,
                    "{}",
                    winner.display_fields(&current.headers).join(" | ")
                );
            }
        }
        DrawPhase::Idle => tracing::info!("Waiting for the next draw"),
    }
}
