//! `imcache delete`

use super::DynCache;
use crate::args::BatchArgs;
use crate::console::CliConsole;
use imcache_core::{CacheResult, CallContext, MessageCache};

/// Remove the entries of the requested seq range
pub async fn delete(
    cache: &DynCache,
    ctx: &CallContext,
    console: &CliConsole,
    args: &BatchArgs,
) -> CacheResult<()> {
    let seqs = args.seqs()?;
    match cache
        .strategy(args.strategy)
        .delete_messages(ctx, &args.conversation, &seqs)
        .await
    {
        Ok(removed) => {
            console.success(&format!(
                "Removed {} of {} entries from '{}'",
                removed,
                seqs.len(),
                args.conversation
            ));
            Ok(())
        }
        Err(e) => {
            console.error(&format!(
                "Removed {} entries before failing: {}",
                e.partial, e.error
            ));
            Err(e.into())
        }
    }
}
