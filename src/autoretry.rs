use std::{fmt::Debug, time::Duration};

use futures_util::Future;
use tronnet::{Context, NetError};

/// Retries a function up to `attempts` times with exponential backoff starting at `initial`.
///
/// Backoff sleeps honor the context, so retries stop as soon as the deadline passes or the
/// context is canceled.
pub async fn autoretry<T, E, Fut, Fun>(
    ctx: &Context,
    attempts: usize,
    initial: Duration,
    mut f: Fun,
) -> Result<T, E>
where
    E: Debug + From<NetError>,
    Fut: Future<Output = Result<T, E>>,
    Fun: FnMut() -> Fut,
{
    let mut sleep_interval = initial;
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(val) => return Ok(val),
            Err(err) if attempt >= attempts => return Err(err),
            Err(err) => {
                log::warn!("autoretrying ({}/{}) due to {:?}", attempt, attempts, err);
                ctx.sleep(sleep_interval).await?;
                sleep_interval *= 2;
                attempt += 1;
            }
        }
    }
}
