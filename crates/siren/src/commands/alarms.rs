//! Alarm command handlers: list, ack, clear, stats.

use chrono::{DateTime, Utc};
use siren_api::{Alarm, AlarmClient, AlarmStats};
use siren_core::NotifierConfig;
use tabled::Tabled;

use crate::cli::{AlarmsArgs, AlarmsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::map_api_error;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct AlarmRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Type")]
    alarm_type: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Started")]
    started: String,
}

impl From<&Alarm> for AlarmRow {
    fn from(a: &Alarm) -> Self {
        Self {
            id: a.id.clone(),
            device: a
                .originator_name
                .clone()
                .or_else(|| a.originator.clone())
                .unwrap_or_else(|| "-".into()),
            alarm_type: a.alarm_type.clone(),
            severity: a.severity.to_string(),
            status: a.status.clone().unwrap_or_else(|| "-".into()),
            started: format_ts(a.start_ts),
        }
    }
}

#[derive(Tabled)]
struct StatsRow {
    #[tabled(rename = "Counter")]
    counter: String,
    #[tabled(rename = "Value")]
    value: u64,
}

fn format_ts(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: &NotifierConfig,
    args: AlarmsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let transport = transport_for(config);
    let client = AlarmClient::new(config.url.clone(), &transport)
        .map_err(|e| map_api_error(&config.url, e))?;

    match args.command {
        AlarmsCommand::List { unacknowledged } => {
            let alarms = if unacknowledged {
                client.list_unacknowledged().await
            } else {
                client.list_active().await
            }
            .map_err(|e| map_api_error(&config.url, e))?;

            let out = output::render_list(
                &global.output,
                &alarms,
                |a| AlarmRow::from(a),
                |a| a.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AlarmsCommand::Ack { id } => {
            let alarm = client
                .acknowledge(&id)
                .await
                .map_err(|e| classify_action_error(&config.url, &id, e))?;
            if !global.quiet {
                eprintln!("Alarm {} acknowledged", alarm.id);
            }
            Ok(())
        }

        AlarmsCommand::Clear { id } => {
            let alarm = client
                .clear_alarm(&id)
                .await
                .map_err(|e| classify_action_error(&config.url, &id, e))?;
            if !global.quiet {
                eprintln!("Alarm {} cleared", alarm.id);
            }
            Ok(())
        }

        AlarmsCommand::Stats => {
            let stats = client
                .stats()
                .await
                .map_err(|e| map_api_error(&config.url, e))?;

            let out = output::render_single(&global.output, &stats, stats_table, |s| {
                s.active.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

fn classify_action_error(url: &url::Url, id: &str, err: siren_api::Error) -> CliError {
    if err.is_not_found() {
        CliError::AlarmNotFound { id: id.to_owned() }
    } else {
        map_api_error(url, err)
    }
}

fn stats_table(stats: &AlarmStats) -> String {
    let mut rows = vec![
        StatsRow {
            counter: "total".into(),
            value: stats.total,
        },
        StatsRow {
            counter: "active".into(),
            value: stats.active,
        },
        StatsRow {
            counter: "unacknowledged".into(),
            value: stats.unacknowledged,
        },
        StatsRow {
            counter: "cleared".into(),
            value: stats.cleared,
        },
    ];
    let mut by_severity: Vec<_> = stats.by_severity.iter().collect();
    by_severity.sort_by(|a, b| a.0.cmp(b.0));
    for (severity, count) in by_severity {
        rows.push(StatsRow {
            counter: format!("severity/{severity}"),
            value: *count,
        });
    }
    tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string()
}

fn transport_for(config: &NotifierConfig) -> siren_api::TransportConfig {
    siren_api::TransportConfig {
        tls: if config.insecure {
            siren_api::TlsMode::DangerAcceptInvalid
        } else {
            siren_api::TlsMode::System
        },
        timeout: config.timeout,
    }
}
