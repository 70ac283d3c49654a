// ARC: Analyzing Network Configurations with Extended Topology Graphs
// Copyright (C) 2021  The ARC Authors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Verifiers
//!
//! Properties checked on the flow-specific graphs. Every verifier holds the map of graphs, one per
//! flow, and answers [`Verifier::verify`] for a single flow. [`verify_all`] checks every flow of
//! the map, optionally on a pool of worker threads.

mod always_blocked;
mod always_isolated;
mod always_reachable;
mod currently_blocked;
mod equivalent;

pub use always_blocked::AlwaysBlocked;
pub use always_isolated::AlwaysIsolated;
pub use always_reachable::AlwaysReachable;
pub use currently_blocked::CurrentlyBlocked;
pub use equivalent::Equivalent;

use crate::graphs::{TopologyGraph, VertexId};
use crate::maxflow::FlowError;
use crate::policy::Flow;
use crate::settings::Settings;
use log::*;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;
use thiserror::Error;

/// Flow-specific graphs, shared between verifiers and worker threads
pub type EtgMap<G> = Arc<BTreeMap<Flow, Arc<G>>>;

/// Errors while verifying a property
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifierError {
    /// There is no graph for the flow.
    #[error("No ETG for flow {0}")]
    NoEtg(Flow),
    /// The graph of the flow has no vertex for the flow source.
    #[error("No source vertex for flow {0}")]
    NoSourceVertex(Flow),
    /// The graph of the flow has no destination vertex.
    #[error("No destination vertex for flow {0}")]
    NoDestinationVertex(Flow),
    /// A worker thread failed.
    #[error("Verification task failed: {0}")]
    TaskFailed(String),
    /// The flow engine failed.
    #[error("Flow Error: {0}")]
    FlowError(#[from] FlowError),
}

/// # Verifier
///
/// A property, checked for one flow at a time.
pub trait Verifier: Send + Sync {
    /// Argument of the property, e.g. the number of tolerated failures
    type Arg: Clone + Send + Sync;

    /// Flows for which the verifier has a graph
    fn flows(&self) -> Vec<Flow>;

    /// Check the property for the flow.
    fn verify(&self, flow: &Flow, arg: &Self::Arg) -> Result<bool, VerifierError>;

    /// Name used in logs
    fn name(&self) -> &'static str;
}

/// Check the property for every flow of the verifier. With [`Settings::parallelize`], the flows
/// are distributed over [`Settings::threads`] workers. If any check fails, the error of the first
/// failing worker is returned.
pub fn verify_all<V>(
    verifier: Arc<V>,
    arg: &V::Arg,
    settings: &Settings,
) -> Result<BTreeMap<Flow, bool>, VerifierError>
where
    V: Verifier + 'static,
    V::Arg: 'static,
{
    let flows = verifier.flows();
    if !settings.parallelize {
        let mut results = BTreeMap::new();
        for flow in flows {
            let result = timed(verifier.as_ref(), &flow, arg, settings)?;
            results.insert(flow, result);
        }
        return Ok(results);
    }

    let queue = Arc::new(Mutex::new(flows.into_iter().collect::<VecDeque<Flow>>()));
    let n_threads = settings.threads();
    info!("Verifying {} on {} threads", verifier.name(), n_threads);

    let handles = (0..n_threads)
        .map(|_| {
            let v = verifier.clone();
            let q = queue.clone();
            let a = arg.clone();
            let s = settings.clone();
            thread::spawn(move || -> Result<Vec<(Flow, bool)>, VerifierError> {
                let mut results = Vec::new();
                loop {
                    let next = q
                        .lock()
                        .map_err(|_| VerifierError::TaskFailed("queue lock poisoned".into()))?
                        .pop_front();
                    let flow = match next {
                        Some(f) => f,
                        None => break,
                    };
                    let result = timed(v.as_ref(), &flow, &a, &s)?;
                    results.push((flow, result));
                }
                Ok(results)
            })
        })
        .collect::<Vec<_>>();

    let mut results = BTreeMap::new();
    let mut some_error = None;
    for handle in handles {
        match handle.join() {
            Ok(Ok(part)) => results.extend(part),
            Ok(Err(e)) => {
                error!("Verification task failed: {}", e);
                some_error.get_or_insert(e);
            }
            Err(_) => {
                error!("Verification worker panicked");
                some_error.get_or_insert(VerifierError::TaskFailed("worker panicked".into()));
            }
        }
    }
    match some_error {
        Some(e) => Err(e),
        None => Ok(results),
    }
}

fn timed<V: Verifier + ?Sized>(
    verifier: &V,
    flow: &Flow,
    arg: &V::Arg,
    settings: &Settings,
) -> Result<bool, VerifierError> {
    let start = Instant::now();
    let result = verifier.verify(flow, arg)?;
    if settings.per_flow_timing {
        info!("{} {} took {:?}: {}", verifier.name(), flow, start.elapsed(), result);
    }
    Ok(result)
}

/// Look up the graph of a flow together with its source and destination vertex.
pub(crate) fn endpoints<'a, G: TopologyGraph>(
    etgs: &'a BTreeMap<Flow, Arc<G>>,
    flow: &Flow,
) -> Result<(&'a G, VertexId, VertexId), VerifierError> {
    let etg = etgs.get(flow).ok_or_else(|| VerifierError::NoEtg(flow.clone()))?;
    let source = flow
        .source
        .as_ref()
        .and_then(|s| etg.etg().source_vertex(s))
        .ok_or_else(|| VerifierError::NoSourceVertex(flow.clone()))?;
    let destination = etg
        .etg()
        .destination_vertex()
        .ok_or_else(|| VerifierError::NoDestinationVertex(flow.clone()))?;
    Ok((etg.as_ref(), source, destination))
}
