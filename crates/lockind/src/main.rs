//! lockind - The lockdown background service
//!
//! Wires together configuration, the session store, the rule file,
//! the alarm scheduler, the lockdown engine and the IPC server.

use anyhow::{Context, Result};
use clap::Parser;
use lockin_api::{Event, EventPayload, Response};
use lockin_config::{load_or_default, LockdownPolicy};
use lockin_core::{AliasTable, LockdownEngine, RecoverOutcome};
use lockin_host::{RuleFile, TokioScheduler};
use lockin_host_api::{Alarm, Scheduler};
use lockin_ipc::{IpcServer, ServerMessage};
use lockin_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use lockin_util::{database_path, default_config_path, LockinError, RateLimiter};
use lockind::{error_info, Dispatcher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// lockind - Time-boxed focus lockdowns
#[derive(Parser, Debug)]
#[command(name = "lockind")]
#[command(about = "Blocks everything but an allow-list until a lockdown ends", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/lockin/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set LOCKIN_SOCKET env var)
    #[arg(short, long, env = "LOCKIN_SOCKET")]
    socket: Option<PathBuf>,

    /// Data directory override (or set LOCKIN_DATA_DIR env var)
    #[arg(short, long, env = "LOCKIN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Rule file override
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    dispatcher: Arc<Dispatcher>,
    scheduler: Arc<TokioScheduler>,
    ipc: Arc<IpcServer>,
    store: Arc<dyn Store>,
    rate_limiter: RateLimiter,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        let config = load_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            alias_groups = config.aliases.groups.len(),
            default_allowlist = config.lockdown.default_allowlist.len(),
            "Configuration loaded"
        );

        let socket_path = args
            .socket
            .clone()
            .unwrap_or_else(|| config.service.socket_path.clone());
        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| config.service.data_dir.clone());
        let rules_path = args
            .rules
            .clone()
            .unwrap_or_else(|| config.service.rules_path.clone());

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        let db_path = database_path(&data_dir);
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted))?;
        store.append_audit(AuditEvent::new(AuditEventType::ConfigLoaded {
            alias_groups: config.aliases.groups.len(),
        }))?;

        let rule_sink = Arc::new(
            RuleFile::open(&rules_path)
                .with_context(|| format!("Failed to open rule file {:?}", rules_path))?,
        );
        info!(rules_path = %rule_sink.path().display(), "Rule file opened");
        let scheduler = Arc::new(TokioScheduler::new());

        let aliases = AliasTable::from_config(&config.aliases);
        let initial_allowlist = config
            .lockdown
            .default_allowlist
            .iter()
            .map(|d| d.as_str().to_string())
            .collect();

        let engine = LockdownEngine::new(
            store.clone(),
            rule_sink,
            scheduler.clone(),
            aliases,
            config.service.check_interval,
        )
        .with_initial_allowlist(initial_allowlist);

        match engine.recover(lockin_util::now()).await? {
            RecoverOutcome::Resumed { end_time } => {
                info!(end_time = %end_time, "Resumed lockdown from previous run");
            }
            RecoverOutcome::Expired => info!("Lockdown expired while the service was down"),
            outcome => debug!(outcome = ?outcome, "Recovery complete"),
        }

        let mut ipc = IpcServer::new(&socket_path);
        ipc.start().await?;

        info!(socket_path = %socket_path.display(), "IPC server started");

        let policy: LockdownPolicy = config.lockdown.clone();
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(engine), policy, true));

        // Rate limiter: 30 requests per second per client
        let rate_limiter = RateLimiter::new(30, Duration::from_secs(1));

        Ok(Self {
            dispatcher,
            scheduler,
            ipc: Arc::new(ipc),
            store,
            rate_limiter,
        })
    }

    async fn run(mut self) -> Result<()> {
        let mut alarms: mpsc::UnboundedReceiver<Alarm> = self.scheduler.subscribe();
        let ipc_ref = self.ipc.clone();
        let mut ipc_messages = ipc_ref
            .take_message_receiver()
            .await
            .context("IPC message receiver already taken")?;

        let ipc_accept = ipc_ref.clone();
        tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                error!(error = %e, "IPC server error");
            }
        });

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        // Recovery may already have produced events nobody has seen
        self.publish_events().await;

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }

                Some(alarm) = alarms.recv() => {
                    self.handle_alarm(alarm).await;
                }

                Some(msg) = ipc_messages.recv() => {
                    self.handle_ipc_message(msg).await;
                }
            }
        }

        info!("Shutting down lockind");

        // An active lockdown stays in the store and is resumed on next start
        self.ipc.broadcast_event(Event::new(EventPayload::Shutdown));
        self.ipc.shutdown();

        if let Err(e) = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStopped))
        {
            warn!(error = %e, "Failed to log service shutdown");
        }

        info!("Shutdown complete");
        Ok(())
    }

    async fn handle_alarm(&self, alarm: Alarm) {
        let now = lockin_util::now();
        match self.dispatcher.engine().on_alarm(&alarm.name, now).await {
            Ok(Some(outcome)) => debug!(alarm = %alarm.name, outcome = ?outcome, "Alarm handled"),
            Ok(None) => debug!(alarm = %alarm.name, "Ignoring unknown alarm"),
            Err(e) => error!(alarm = %alarm.name, error = %e, "Alarm handling failed"),
        }
        self.publish_events().await;
    }

    async fn publish_events(&self) {
        for event in self.dispatcher.take_events(lockin_util::now()).await {
            self.ipc.broadcast_event(event);
        }
    }

    async fn handle_ipc_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Request { client_id, request } => {
                if !self.rate_limiter.check(&client_id) {
                    let response =
                        Response::error(request.request_id, error_info(&LockinError::RateLimited));
                    let _ = self.ipc.send_response(&client_id, response).await;
                    return;
                }

                let Some(info) = self.ipc.get_client_info(&client_id).await else {
                    debug!(client_id = %client_id, "Request from a client that already left");
                    return;
                };

                let response = self
                    .dispatcher
                    .handle(&info, request.request_id, request.command, lockin_util::now())
                    .await;

                let _ = self.ipc.send_response(&client_id, response).await;
                self.publish_events().await;
            }

            ServerMessage::ClientConnected { client_id, info } => {
                info!(
                    client_id = %client_id,
                    role = ?info.role,
                    uid = ?info.uid,
                    "Client connected"
                );

                let _ = self.store.append_audit(AuditEvent::new(
                    AuditEventType::ClientConnected {
                        client_id: client_id.to_string(),
                        role: format!("{:?}", info.role),
                        uid: info.uid,
                    },
                ));
            }

            ServerMessage::ClientDisconnected { client_id } => {
                debug!(client_id = %client_id, "Client disconnected");

                let _ = self.store.append_audit(AuditEvent::new(
                    AuditEventType::ClientDisconnected {
                        client_id: client_id.to_string(),
                    },
                ));

                self.rate_limiter.remove_client(&client_id);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "lockind starting");
    if lockin_util::is_mock_time_active() {
        warn!(now = %lockin_util::now(), "Mock time is active, the wall clock is shifted");
    }

    let service = Service::new(&args).await?;
    service.run().await
}
