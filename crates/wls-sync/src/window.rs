use std::future::Future;

use futures_util::future::try_join_all;
use tracing::debug;
use wls_schemas::SyncError;

/// Run `f` over `items` in consecutive windows of `window`.
///
/// Calls inside a window run concurrently; the next window starts only when
/// every call in the current one has finished. The first error aborts the
/// whole run. Results keep input order.
pub async fn windowed<T, R, F, Fut>(
    items: &[T],
    window: usize,
    what: &'static str,
    f: F,
) -> Result<Vec<R>, SyncError>
where
    F: Fn(&T) -> Fut,
    Fut: Future<Output = Result<R, SyncError>>,
{
    let window = window.max(1);
    let mut out = Vec::with_capacity(items.len());
    for (batch, chunk) in items.chunks(window).enumerate() {
        debug!(what, batch, size = chunk.len(), "dispatching window");
        out.extend(try_join_all(chunk.iter().map(&f)).await?);
    }
    Ok(out)
}

/// Inclusive `[from, to]` ranges of at most `span` blocks covering
/// `start..=latest`. Empty when `start > latest`.
pub fn block_ranges(start: u64, latest: u64, span: u64) -> Vec<(u64, u64)> {
    let span = span.max(1);
    let mut out = Vec::new();
    let mut from = start;
    while from <= latest {
        let to = from.saturating_add(span - 1).min(latest);
        out.push((from, to));
        if to == u64::MAX {
            break;
        }
        from = to + 1;
    }
    out
}
