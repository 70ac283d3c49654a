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

//! Module containing all error types

use crate::graphs::GeneratorError;
use crate::maxflow::FlowError;
use crate::network::{NetworkError, PrefixError};
use crate::policy::PolicyError;
use crate::verifiers::VerifierError;
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// Error propagated from the network model
    #[error("Network Error: {0}")]
    NetworkError(#[from] NetworkError),
    /// Error while evaluating a policy
    #[error("Policy Error: {0}")]
    PolicyError(#[from] PolicyError),
    /// Error while generating an extended topology graph
    #[error("Generator Error: {0}")]
    GeneratorError(#[from] GeneratorError),
    /// Error of the max-flow engine
    #[error("Flow Error: {0}")]
    FlowError(#[from] FlowError),
    /// Error while verifying a property
    #[error("Verifier Error: {0}")]
    VerifierError(#[from] VerifierError),
}

impl From<PrefixError> for Error {
    fn from(cause: PrefixError) -> Self {
        Self::NetworkError(NetworkError::PrefixError(cause))
    }
}
