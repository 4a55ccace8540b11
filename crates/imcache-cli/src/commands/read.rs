//! `imcache read`

use super::{DynCache, content_preview};
use crate::args::BatchArgs;
use crate::console::CliConsole;
use colored::*;
use imcache_core::{
    BatchRead, CacheError, CacheResult, CallContext, Message, MessageCache, Strategy, UnifiedError,
};
use serde::Serialize;
use std::time::Instant;

/// Characters of message content shown per line
const PREVIEW_CHARS: usize = 60;

/// JSON form of a read
#[derive(Debug, Serialize)]
struct ReadReport<'a> {
    conversation_id: &'a str,
    strategy: Strategy,
    elapsed_ms: u128,
    messages: &'a [Message],
    failed_seqs: &'a [i64],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ReportError>,
}

#[derive(Debug, Serialize)]
struct ReportError {
    code: String,
    message: String,
}

impl From<&CacheError> for ReportError {
    fn from(error: &CacheError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Read the requested seq range and print what came back
pub async fn read(
    cache: &DynCache,
    ctx: &CallContext,
    console: &CliConsole,
    args: &BatchArgs,
    json: bool,
) -> CacheResult<()> {
    let seqs = args.seqs()?;
    let started = Instant::now();
    let result = cache
        .strategy(args.strategy)
        .get_messages(ctx, &args.conversation, &seqs)
        .await;
    let elapsed = started.elapsed();

    let (read, error) = match result {
        Ok(read) => (read, None),
        Err(e) => {
            let (error, partial) = e.into_parts();
            (partial, Some(error))
        }
    };

    if json {
        let report = ReadReport {
            conversation_id: &args.conversation,
            strategy: args.strategy,
            elapsed_ms: elapsed.as_millis(),
            messages: &read.messages,
            failed_seqs: &read.failed_seqs,
            error: error.as_ref().map(ReportError::from),
        };
        let text = serde_json::to_string_pretty(&report)?;
        println!("{}", text);
    } else {
        print_read(console, args, &read, elapsed);
    }

    match error {
        // Nothing cached is an answer, not a failure, for the CLI
        Some(e) if e.is_not_found() => {
            if !json {
                console.warn(&format!("Nothing cached for '{}' in the requested range", args.conversation));
            }
            Ok(())
        }
        Some(e) => {
            if !json {
                console.error(&format!("Read failed: {}", e));
            }
            Err(e)
        }
        None => Ok(()),
    }
}

fn print_read(console: &CliConsole, args: &BatchArgs, read: &BatchRead, elapsed: std::time::Duration) {
    console.print_header(&format!("Conversation '{}'", args.conversation));
    console.print_field("strategy", args.strategy);
    console.print_field("requested", args.count);
    console.print_field("found", read.messages.len().to_string().green());
    console.print_field("missing", read.failed_seqs.len());
    console.print_field("elapsed", format!("{:.2?}", elapsed));
    console.print_separator();

    for message in &read.messages {
        println!(
            "  {:>8}  {}  {}",
            message.seq.to_string().bold(),
            message.send_id.dimmed(),
            content_preview(message, PREVIEW_CHARS)
        );
    }
    console.print_seqs("missing seqs", &read.failed_seqs);
}
