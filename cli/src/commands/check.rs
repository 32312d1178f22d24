//! Check command - probe a single port.

use std::net::IpAddr;

use anyhow::{bail, Result};
use portfinder_core::{FailureReason, PortFinder, ProbeOutcome, ProbeRequest};
use serde::Serialize;

/// Budget for the one probe; a bind normally returns well within it.
const CHECK_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
enum PortStatus {
    Free,
    InUse,
}

impl std::fmt::Display for PortStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortStatus::Free => write!(f, "free"),
            PortStatus::InUse => write!(f, "in use"),
        }
    }
}

#[derive(Debug, Serialize)]
struct CheckReport {
    port: u16,
    address: IpAddr,
    status: PortStatus,
}

/// Map a one-attempt outcome to a status; bind errors stay errors.
fn status_of(outcome: ProbeOutcome) -> Result<PortStatus> {
    match outcome {
        ProbeOutcome::Found { .. } => Ok(PortStatus::Free),
        ProbeOutcome::Failed {
            reason: FailureReason::Exhausted { .. },
        } => Ok(PortStatus::InUse),
        ProbeOutcome::Failed {
            reason: reason @ FailureReason::BindError { .. },
        } => bail!("Could not check port: {}", reason),
    }
}

pub async fn run(port: u16, address: Option<IpAddr>, json: bool) -> Result<()> {
    let mut request = ProbeRequest::new(port, 1, CHECK_TIMEOUT_MS)?;
    if let Some(address) = address {
        request = request.with_address(address)?;
    }

    let outcome = PortFinder::loopback().find_outcome(&request).await?;
    let status = status_of(outcome)?;

    if json {
        let report = CheckReport {
            port,
            address: request.address(),
            status,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Port {} on {} is {}", port, request.address(), status);
    }

    Ok(())
}
