use std::time::Duration;

use navigator_logging::nav_trace;
use tokio::time::Instant;

use crate::dom::Document;
use crate::host::HostSurface;
use crate::watcher::MutationRecord;

const MIN_POLL: Duration = Duration::from_millis(10);

/// Waits until `probe` finds something or `timeout` passes.
///
/// The document is re-probed after every mutation batch, and at least every
/// `poll` when the host stays quiet. Consumed records are appended to
/// `backlog` so the caller can still route them to the watcher.
pub async fn wait_for<H, T, F>(
    host: &mut H,
    timeout: Duration,
    poll: Duration,
    backlog: &mut Vec<MutationRecord>,
    mut probe: F,
) -> Option<T>
where
    H: HostSurface + ?Sized,
    F: FnMut(&Document) -> Option<T>,
{
    let deadline = Instant::now() + timeout;
    let poll = poll.max(MIN_POLL);
    loop {
        if let Some(found) = probe(host.document()) {
            return Some(found);
        }
        let now = Instant::now();
        if now >= deadline {
            nav_trace!("Gave up waiting after {:?}", timeout);
            return None;
        }
        let slice = (deadline - now).min(poll);
        backlog.extend(host.next_mutations(slice).await);
    }
}
