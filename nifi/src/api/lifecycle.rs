//! Run-state transitions shared by processors, ports and connection endpoints

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::client::Client;
use super::connections::ConnectionHand;
use super::ports::PortType;
use crate::error::{Error, Result};

/// Scheduled state of a processor, port or reporting task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Running,
    Stopped,
    Disabled,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunState::Running => "RUNNING",
            RunState::Stopped => "STOPPED",
            RunState::Disabled => "DISABLED",
        })
    }
}

/// Controller service state. The transitional states are reported by the
/// server while a service is being enabled or disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceState {
    Enabled,
    Enabling,
    Disabled,
    Disabling,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceState::Enabled => "ENABLED",
            ServiceState::Enabling => "ENABLING",
            ServiceState::Disabled => "DISABLED",
            ServiceState::Disabling => "DISABLING",
        })
    }
}

/// Failure policy of a single reconciliation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Propagate the error and stop the sequence.
    Abort,
    /// Log the error and carry on with the next step.
    Warn,
}

impl OnFailure {
    /// Applies the policy to the outcome of `step`.
    ///
    /// `Warn` turns a failure into `Ok(None)`; `Abort` wraps it as
    /// `Error::Transition`.
    pub fn handle<T>(self, step: &str, result: Result<T>) -> Result<Option<T>> {
        match self {
            OnFailure::Abort => required(step, result).map(Some),
            OnFailure::Warn => Ok(best_effort(step, result)),
        }
    }
}

/// Outcome of a step whose failure aborts the sequence.
pub fn required<T>(step: &str, result: Result<T>) -> Result<T> {
    result.map_err(|e| Error::transition(step, e))
}

/// Outcome of a step whose failure is only logged.
pub fn best_effort<T>(step: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Failed to {}: {}", step, e);
            None
        }
    }
}

/// Whether an endpoint was running before a sequence stopped it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopRecord {
    pub was_running: bool,
}

/// Entity sitting at one end of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Processor(String),
    InputPort(String),
    OutputPort(String),
    Funnel(String),
}

impl Endpoint {
    pub fn id(&self) -> &str {
        match self {
            Endpoint::Processor(id)
            | Endpoint::InputPort(id)
            | Endpoint::OutputPort(id)
            | Endpoint::Funnel(id) => id,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Processor(id) => write!(f, "processor {}", id),
            Endpoint::InputPort(id) => write!(f, "input port {}", id),
            Endpoint::OutputPort(id) => write!(f, "output port {}", id),
            Endpoint::Funnel(id) => write!(f, "funnel {}", id),
        }
    }
}

impl TryFrom<&ConnectionHand> for Endpoint {
    type Error = Error;

    fn try_from(hand: &ConnectionHand) -> Result<Self> {
        let id = hand.id.clone();
        match hand.hand_type.as_str() {
            "PROCESSOR" => Ok(Endpoint::Processor(id)),
            "INPUT_PORT" => Ok(Endpoint::InputPort(id)),
            "OUTPUT_PORT" => Ok(Endpoint::OutputPort(id)),
            "FUNNEL" => Ok(Endpoint::Funnel(id)),
            other => Err(Error::InvalidEndpoint(other.to_string())),
        }
    }
}

/// Start/stop capability of a connection endpoint.
#[async_trait]
pub trait EndpointControl {
    /// Starts the endpoint; no-op when already running.
    async fn start(&self, client: &Client) -> Result<()>;

    /// Stops the endpoint and reports whether it had been running.
    async fn stop(&self, client: &Client) -> Result<StopRecord>;

    /// Starts the endpoint again only if `record` says it was running.
    async fn restore(&self, client: &Client, record: StopRecord) -> Result<()> {
        if record.was_running {
            self.start(client).await
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EndpointControl for Endpoint {
    async fn start(&self, client: &Client) -> Result<()> {
        tracing::debug!("Starting connection endpoint {}", self);
        match self {
            Endpoint::Processor(id) => {
                let processor = client.processors().get(id).await?;
                client.processors().start(&processor).await.map(|_| ())
            }
            Endpoint::InputPort(id) => start_port(client, PortType::InputPort, id).await,
            Endpoint::OutputPort(id) => start_port(client, PortType::OutputPort, id).await,
            Endpoint::Funnel(_) => Ok(()),
        }
    }

    async fn stop(&self, client: &Client) -> Result<StopRecord> {
        tracing::debug!("Stopping connection endpoint {}", self);
        match self {
            Endpoint::Processor(id) => {
                let processor = client.processors().get(id).await?;
                let was_running = processor.component.state == Some(RunState::Running);
                client.processors().stop(&processor).await?;
                Ok(StopRecord { was_running })
            }
            Endpoint::InputPort(id) => stop_port(client, PortType::InputPort, id).await,
            Endpoint::OutputPort(id) => stop_port(client, PortType::OutputPort, id).await,
            Endpoint::Funnel(_) => Ok(StopRecord::default()),
        }
    }
}

/// Stops every endpoint in order, recording which ones were running.
pub async fn stop_all(
    client: &Client,
    endpoints: &[Endpoint],
    policy: OnFailure,
) -> Result<Vec<(Endpoint, StopRecord)>> {
    let mut stopped = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        let record = policy
            .handle(&format!("stop {}", endpoint), endpoint.stop(client).await)?
            .unwrap_or_default();
        stopped.push((endpoint.clone(), record));
    }
    Ok(stopped)
}

/// Starts again the endpoints that were running before `stop_all`.
pub async fn restore_all(
    client: &Client,
    stopped: &[(Endpoint, StopRecord)],
    policy: OnFailure,
) -> Result<()> {
    for (endpoint, record) in stopped {
        policy.handle(
            &format!("restart {}", endpoint),
            endpoint.restore(client, *record).await,
        )?;
    }
    Ok(())
}

/// Starts every endpoint regardless of its previous state.
pub async fn start_all(client: &Client, endpoints: &[Endpoint], policy: OnFailure) -> Result<()> {
    for endpoint in endpoints {
        policy.handle(&format!("start {}", endpoint), endpoint.start(client).await)?;
    }
    Ok(())
}

async fn start_port(client: &Client, port_type: PortType, id: &str) -> Result<()> {
    let port = client.ports(port_type).get(id).await?;
    client.ports(port_type).start(&port).await.map(|_| ())
}

async fn stop_port(client: &Client, port_type: PortType, id: &str) -> Result<StopRecord> {
    let port = client.ports(port_type).get(id).await?;
    let was_running = port.component.state == Some(RunState::Running);
    client.ports(port_type).stop(&port).await?;
    Ok(StopRecord { was_running })
}
