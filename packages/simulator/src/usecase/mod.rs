//! Use cases: per-user setup pipeline, join orchestration, liveness
//! monitoring and the connection pool.

pub mod join_orchestrator;
pub mod liveness;
pub mod pipeline;
pub mod pool;
pub mod simulation;

pub use join_orchestrator::{JoinOrchestrator, JoinOutcome};
pub use liveness::{LivenessMonitor, MonitorConfig, is_stale};
pub use pipeline::{LiveSessionPipeline, SessionPipeline};
pub use pool::{ConnectionPool, STOP_GRACE_DELAY};
pub use simulation::{BatchConfig, BatchSummary, SimulationUseCase, plan_batches};
