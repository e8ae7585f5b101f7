//! Bounded-attempt polling combinator
//!
//! Every bounded loop in the relay — provisioning attempts, inbox polling,
//! conversion readiness polling — runs through [`poll_until`]. The operation
//! reports each attempt as ready, pending, or fatally failed; the combinator
//! owns the attempt counting and the sleep between attempts. Exhaustion comes
//! back as a typed absence so each caller can map it to its own named
//! failure instead of a generic error.

use std::future::Future;
use std::time::Duration;

use crate::Result;

/// Outcome of a single attempt inside [`poll_until`]
#[derive(Debug)]
pub enum Attempt<T> {
    /// The awaited result is available; stop polling
    Ready(T),
    /// Not there yet; consume this attempt and try again after the interval
    Pending,
}

/// Run `op` up to `max_attempts` times, sleeping `interval` between attempts.
///
/// Returns `Ok(Some(value))` as soon as an attempt is [`Attempt::Ready`],
/// `Ok(None)` when the budget is exhausted with every attempt pending, and
/// `Err` immediately if an attempt fails fatally. No sleep happens after the
/// final attempt. The operation receives the 1-based attempt index for
/// logging.
pub async fn poll_until<T, F, Fut>(
    max_attempts: u32,
    interval: Duration,
    mut op: F,
) -> Result<Option<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Attempt<T>>>,
{
    for attempt in 1..=max_attempts {
        match op(attempt).await? {
            Attempt::Ready(value) => return Ok(Some(value)),
            Attempt::Pending => {
                if attempt < max_attempts && !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }

    Ok(None)
}
