//! Simulator execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use nigiwai_shared::time::SystemClock;
use url::Url;

use crate::{
    connection::ConnectionFactory,
    domain::{JoinMode, JoinRequest, SelfSignedJoin},
    error::ValidationError,
    handshake::{SessionAcquirer, signing::parse_extra_attributes},
    report::{ConsoleReporter, Reporter},
    resolver::parse_http_url,
    signal::shutdown_signal,
    transport::TransportOptions,
    usecase::{
        BatchConfig, BatchSummary, ConnectionPool, LiveSessionPipeline, LivenessMonitor,
        MonitorConfig, SimulationUseCase,
    },
};

/// Tunables of one simulator run
#[derive(Debug, Clone, Default)]
pub struct SimulatorConfig {
    pub batch: BatchConfig,
    pub transport: TransportOptions,
    pub monitor: MonitorConfig,
    /// Print per-user progress
    pub verbose: bool,
    /// Connect here instead of deriving the endpoint from the join URL
    pub endpoint_override: Option<Url>,
}

/// Parse the participant count argument.
pub fn parse_participant_count(value: &str) -> Result<usize, ValidationError> {
    match value.trim().parse::<usize>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(ValidationError::InvalidParticipantCount(value.to_string())),
    }
}

/// Join mode of the `join` command.
pub fn join_mode(join_url: &str) -> Result<JoinMode, ValidationError> {
    parse_http_url(join_url)
        .map(JoinMode::ExternalUrl)
        .ok_or_else(|| ValidationError::InvalidJoinUrl(join_url.to_string()))
}

/// Join mode of the `custom-join` command.
///
/// # Arguments
///
/// * `userdata` - Extra join parameters as `"k=v,k=v"`
pub fn custom_join_mode(
    host: &str,
    meeting_id: &str,
    password: &str,
    secret: &str,
    userdata: Option<&str>,
) -> Result<JoinMode, ValidationError> {
    for (name, value) in [
        ("host", host),
        ("meeting-id", meeting_id),
        ("pw", password),
        ("secret", secret),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingParameter(name));
        }
    }
    let host =
        parse_http_url(host).ok_or_else(|| ValidationError::InvalidJoinUrl(host.to_string()))?;

    Ok(JoinMode::SelfSigned(SelfSignedJoin {
        host,
        meeting_id: meeting_id.to_string(),
        password: password.to_string(),
        secret: secret.to_string(),
        extra_attributes: userdata.map(parse_extra_attributes).unwrap_or_default(),
    }))
}

/// Wire up a simulation with a fresh, command-scoped connection pool.
pub fn build_simulation(config: &SimulatorConfig, reporter: Arc<dyn Reporter>) -> SimulationUseCase {
    let clock = Arc::new(SystemClock);
    let factory = ConnectionFactory::new(config.transport.clone(), clock.clone(), reporter.clone());
    let monitor = LivenessMonitor::new(config.monitor, clock);
    let mut pipeline =
        LiveSessionPipeline::new(SessionAcquirer::new(), factory, monitor, reporter.clone());
    if let Some(endpoint) = &config.endpoint_override {
        pipeline = pipeline.with_endpoint_override(endpoint.clone());
    }

    SimulationUseCase::new(
        Arc::new(pipeline),
        Arc::new(ConnectionPool::new()),
        reporter,
        config.batch,
    )
}

/// Create participants and keep them alive until `shutdown` resolves, then
/// stop every registered connection.
///
/// `shutdown` is watched from the start, so a ramp-up stuck on a hung
/// handshake can still be interrupted; the connections registered so far
/// are summarized and stopped.
///
/// # Returns
///
/// The number of connections stopped
pub async fn run_until_shutdown<S>(
    simulation: &SimulationUseCase,
    requests: Vec<JoinRequest>,
    reporter: &dyn Reporter,
    shutdown: S,
) -> usize
where
    S: Future<Output = ()>,
{
    let requested = requests.len();
    tokio::pin!(shutdown);

    tokio::select! {
        _ = simulation.create_batch(requests) => {
            reporter.announce("Press Ctrl+C to disconnect all participants");
            shutdown.await;
        }
        _ = &mut shutdown => {
            tracing::warn!("Interrupted while creating participants");
            let summary = BatchSummary {
                requested,
                active: simulation.pool().len().await,
            };
            reporter.announce(&summary.line());
        }
    }

    let stopped = simulation.pool().stop_all().await;
    reporter.announce(&format!("Terminated {} connection(s)", stopped));
    stopped
}

/// Create `count` participants, keep them alive until Ctrl+C, then stop them.
///
/// # Returns
///
/// The number of connections stopped
pub async fn run_simulation(mode: JoinMode, count: usize, config: SimulatorConfig) -> usize {
    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::new(config.verbose));
    let simulation = build_simulation(&config, reporter.clone());

    reporter.announce(&format!("Creating {} participant(s)...", count));
    let stopped = run_until_shutdown(
        &simulation,
        JoinRequest::batch(count, &mode),
        reporter.as_ref(),
        shutdown_signal(),
    )
    .await;

    // Let the scheduled transport shutdowns run before the runtime exits.
    tokio::time::sleep(simulation.pool().grace_delay() + Duration::from_millis(100)).await;

    stopped
}
