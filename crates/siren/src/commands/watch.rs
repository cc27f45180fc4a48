//! Live notification watcher.
//!
//! Connects the lifecycle manager to the backend stream and prints one
//! line per notification change until Ctrl-C. Entries never disappear
//! on their own; a `closed` line only ever follows an acknowledged or
//! ignored alarm.

use std::time::Duration;

use chrono::Local;
use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;

use siren_core::{NotificationChange, NotificationEntry, Notifier, NotifierConfig};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    mut config: NotifierConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    config.reconnect.initial_delay = Duration::from_secs(args.reconnect_delay.max(1));

    let notifier = Notifier::new(config)?;
    let mut changes = notifier.changes();
    notifier.connect().await?;

    let color = output::should_color(&global.color);
    if !global.quiet {
        eprintln!(
            "Watching alarms at {} (Ctrl-C to exit)",
            notifier.config().url
        );
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            change = changes.recv() => match change {
                Ok(change) => print_change(&change, color),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notification feed lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    notifier.shutdown().await;
    Ok(())
}

// ── Rendering ───────────────────────────────────────────────────────

fn print_change(change: &NotificationChange, color: bool) {
    let stamp = Local::now().format("%H:%M:%S");
    let line = match change {
        NotificationChange::Opened(entry) => {
            format!("{stamp}  opened    {}", entry_line(entry, color))
        }
        NotificationChange::Updated(entry) => {
            format!("{stamp}  updated   {}", entry_line(entry, color))
        }
        NotificationChange::Resolving { key, action } => {
            format!("{stamp}  {action}… {key}")
        }
        NotificationChange::Resolved { key, action } => {
            format!("{stamp}  {action}d {key}")
        }
        NotificationChange::ActionFailed {
            key,
            action,
            message,
        } => {
            let text = format!("{stamp}  {action} failed for {key}: {message}");
            if color {
                text.red().to_string()
            } else {
                text
            }
        }
        NotificationChange::Closed { key } => format!("{stamp}  closed    {key}"),
    };
    println!("{line}");
}

fn entry_line(entry: &NotificationEntry, color: bool) -> String {
    format!(
        "{}  {} / {}  alarm={}  x{}",
        output::severity_label(entry.severity, color),
        entry.device_name,
        entry.alarm_type,
        entry.alarm_id,
        entry.occurrence_count,
    )
}
