//! `imcache write`

use super::{DynCache, synthetic_message};
use crate::args::BatchArgs;
use crate::console::CliConsole;
use imcache_core::{CacheResult, CallContext, Message, MessageCache};
use std::time::Instant;

/// Write synthetic messages for the requested seq range
pub async fn write(
    cache: &DynCache,
    ctx: &CallContext,
    console: &CliConsole,
    args: &BatchArgs,
) -> CacheResult<()> {
    let messages: Vec<Message> = args
        .seqs()?
        .into_iter()
        .map(|seq| synthetic_message(&args.conversation, seq))
        .collect();

    console.info(&format!(
        "Writing {} messages to '{}' ({})",
        messages.len(),
        args.conversation,
        args.strategy
    ));

    let started = Instant::now();
    let result = cache
        .strategy(args.strategy)
        .set_messages(ctx, &args.conversation, &messages)
        .await;
    let elapsed = started.elapsed();

    match result {
        Ok(written) => {
            console.success(&format!(
                "Wrote {} messages to '{}' in {:.2?} ({})",
                written, args.conversation, elapsed, args.strategy
            ));
            Ok(())
        }
        Err(e) => {
            console.error(&format!(
                "Wrote {} of {} messages before failing: {}",
                e.partial,
                messages.len(),
                e.error
            ));
            Err(e.into())
        }
    }
}
