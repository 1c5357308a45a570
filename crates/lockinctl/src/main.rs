//! lockinctl - Command-line client for lockind
//!
//! Starts lockdowns, types the unlock code and shows status over the
//! daemon's socket.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveTime, TimeZone};
use clap::{Parser, Subcommand};
use lockin_api::{Command, EventPayload, LockdownEnd, LockdownStatus, ResponsePayload};
use lockin_ipc::IpcClient;
use lockin_util::{default_socket_path, format_countdown, format_datetime_full};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lockinctl")]
#[command(about = "Control lockind focus lockdowns", long_about = None)]
struct Args {
    /// Socket path (or set LOCKIN_SOCKET env var)
    #[arg(short, long, env = "LOCKIN_SOCKET", default_value_os_t = default_socket_path())]
    socket: PathBuf,

    /// Print raw JSON payloads
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Show the current lockdown
    Status,

    /// Start a lockdown that blocks everything but the given domains
    Start {
        /// Length in minutes
        #[arg(short, long, conflicts_with = "until", required_unless_present = "until")]
        minutes: Option<i64>,

        /// End time, `HH:MM` today or RFC 3339
        #[arg(short, long)]
        until: Option<String>,

        /// Allowed domains
        allowlist: Vec<String>,
    },

    /// End the lockdown without the unlock code (admin only)
    Kill,

    /// Type the unlock code
    Unlock { code: String },

    /// Show the unlock code of the active lockdown
    Reveal,

    /// Replace the stored allow-list
    Allowlist { domains: Vec<String> },

    /// Stream events until interrupted
    Watch,

    /// Check that the daemon answers
    Ping,

    /// Show daemon health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut client = IpcClient::connect(&args.socket)
        .await
        .with_context(|| format!("Failed to connect to lockind at {:?}", args.socket))?;

    let command = match args.command {
        Cmd::Watch => return watch(client, args.json).await,
        Cmd::Status => Command::GetState,
        Cmd::Start {
            minutes,
            until,
            allowlist,
        } => {
            let end = match (minutes, until) {
                (Some(m), _) => LockdownEnd::AfterMinutes(m),
                (None, Some(raw)) => LockdownEnd::At(parse_until(&raw, Local::now())?),
                (None, None) => bail!("either --minutes or --until is required"),
            };
            Command::StartLockdown { end, allowlist }
        }
        Cmd::Kill => Command::StopLockdown,
        Cmd::Unlock { code } => Command::SubmitUnlock { candidate: code },
        Cmd::Reveal => Command::RevealSecret,
        Cmd::Allowlist { domains } => Command::SetAllowlist { allowlist: domains },
        Cmd::Ping => Command::Ping,
        Cmd::Health => Command::GetHealth,
    };

    debug!(command = ?command, "Sending command");
    let payload = client.call(command).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_payload(&payload);
    }
    Ok(())
}

async fn watch(client: IpcClient, json: bool) -> Result<()> {
    let mut events = client.subscribe().await?;
    loop {
        let event = events.next().await?;
        if json {
            println!("{}", serde_json::to_string(&event)?);
            continue;
        }
        match event.payload {
            EventPayload::StateChanged(status) => print_status(&status),
            EventPayload::LockdownStarted {
                end_time,
                allowlist,
                expanded_count,
            } => println!(
                "Lockdown started until {} ({} entries, {} hosts allowed)",
                format_datetime_full(&end_time),
                allowlist.len(),
                expanded_count
            ),
            EventPayload::LockdownEnded { reason } => println!("Lockdown ended ({:?})", reason),
            EventPayload::Shutdown => {
                println!("lockind is shutting down");
                return Ok(());
            }
        }
    }
}

fn print_payload(payload: &ResponsePayload) {
    match payload {
        ResponsePayload::State(status) => print_status(status),
        ResponsePayload::LockdownStarted { end_time, secret } => {
            println!("Locked in until {}", format_datetime_full(end_time));
            println!("Unlock code: {}", secret);
        }
        ResponsePayload::LockdownNotStarted => println!("End time already passed, nothing to do"),
        ResponsePayload::Stopped => println!("Lockdown ended"),
        ResponsePayload::NotActive => println!("No active lockdown"),
        ResponsePayload::Unlock(progress) if progress.complete => println!("Unlocked"),
        ResponsePayload::Unlock(progress) if progress.accepted => {
            println!("{}/{} characters correct", progress.typed, progress.total)
        }
        ResponsePayload::Unlock(_) => println!("Wrong code"),
        ResponsePayload::Secret { secret } => println!("{}", secret),
        ResponsePayload::AllowlistUpdated { allowlist } => {
            println!("Allow-list saved ({} entries)", allowlist.len())
        }
        ResponsePayload::Subscribed { client_id } => println!("Subscribed as {}", client_id),
        ResponsePayload::Unsubscribed => println!("Unsubscribed"),
        ResponsePayload::Health(health) => {
            println!("live: {}", health.live);
            println!("ready: {}", health.ready);
            println!("config loaded: {}", health.config_loaded);
            println!("rule sink ok: {}", health.rule_sink_ok);
            println!("store ok: {}", health.store_ok);
        }
        ResponsePayload::Pong => println!("pong"),
    }
}

fn print_status(status: &LockdownStatus) {
    match status.end_time {
        Some(end) if status.is_active() => {
            println!(
                "Locked in until {} ({} left)",
                format_datetime_full(&end),
                format_countdown(status.time_remaining)
            );
            if status.unlock.typed > 0 {
                println!(
                    "Unlock code: {}/{} typed",
                    status.unlock.typed, status.unlock.total
                );
            }
        }
        _ => println!("Idle"),
    }

    if status.allowlist.is_empty() {
        println!("Allow-list: (empty)");
    } else {
        println!("Allow-list: {}", status.allowlist.join(", "));
    }
}

/// `HH:MM` means the next such time, today or tomorrow
fn parse_until(raw: &str, now: DateTime<Local>) -> Result<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Local));
    }

    let time = NaiveTime::parse_from_str(raw, "%H:%M")
        .with_context(|| format!("Cannot parse end time '{}'", raw))?;

    let mut date = now.date_naive();
    if time <= now.time() {
        date = date.succ_opt().context("End date out of range")?;
    }

    Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .with_context(|| format!("'{}' does not exist in the local time zone", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 2, h, m, 0).unwrap()
    }

    #[test]
    fn test_until_later_today() {
        let end = parse_until("17:30", at(9, 0)).unwrap();
        assert_eq!(end, at(17, 30));
    }

    #[test]
    fn test_until_rolls_to_tomorrow() {
        let end = parse_until("08:00", at(9, 0)).unwrap();
        assert_eq!(end.date_naive(), at(9, 0).date_naive().succ_opt().unwrap());
        assert_eq!(end.hour(), 8);
    }

    #[test]
    fn test_until_rfc3339() {
        let end = parse_until("2025-06-02T12:00:00+00:00", at(9, 0)).unwrap();
        assert_eq!(end.timestamp(), 1748865600);
    }

    #[test]
    fn test_until_garbage() {
        assert!(parse_until("soon", at(9, 0)).is_err());
    }
}
