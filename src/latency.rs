// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Simulated latency for authentication, scanning and payment processing.
//!
//! A [`LatencyGate`] holds at most one operation until its deadline passes.
//! While it is occupied the triggering control counts as disabled, so a
//! second submission is refused instead of queued. Started operations
//! cannot be cancelled; they always run to completion.

use crate::SessionError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Kinds of work that resolve after an artificial delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulatedOperation {
    Authentication,
    DocumentScan,
    PaymentProcessing,
    RecipientVerification,
}

/// Delay per [`SimulatedOperation`], in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    pub authentication_ms: u64,
    pub document_scan_ms: u64,
    pub payment_ms: u64,
    pub recipient_verification_ms: u64,
}

impl LatencyConfig {
    /// Every operation completes on the same tick it starts.
    pub fn instant() -> Self {
        Self {
            authentication_ms: 0,
            document_scan_ms: 0,
            payment_ms: 0,
            recipient_verification_ms: 0,
        }
    }

    pub fn delay(&self, operation: SimulatedOperation) -> Duration {
        let ms = match operation {
            SimulatedOperation::Authentication => self.authentication_ms,
            SimulatedOperation::DocumentScan => self.document_scan_ms,
            SimulatedOperation::PaymentProcessing => self.payment_ms,
            SimulatedOperation::RecipientVerification => self.recipient_verification_ms,
        };
        Duration::from_millis(ms)
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            authentication_ms: 800,
            document_scan_ms: 1800,
            payment_ms: 1500,
            recipient_verification_ms: 1200,
        }
    }
}

#[derive(Debug)]
struct InFlight<T> {
    operation: SimulatedOperation,
    payload: T,
    deadline: Instant,
}

/// One-slot holder for an operation waiting out its delay.
///
/// `T` carries whatever the owner needs to finish the operation.
#[derive(Debug)]
pub struct LatencyGate<T> {
    config: LatencyConfig,
    in_flight: Option<InFlight<T>>,
}

impl<T> LatencyGate<T> {
    pub fn new(config: LatencyConfig) -> Self {
        Self {
            config,
            in_flight: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn current(&self) -> Option<SimulatedOperation> {
        self.in_flight.as_ref().map(|f| f.operation)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.in_flight.as_ref().map(|f| f.deadline)
    }

    /// # Errors
    ///
    /// - [`SessionError::OperationInFlight`] - The gate is already occupied.
    pub fn start(
        &mut self,
        operation: SimulatedOperation,
        payload: T,
        now: Instant,
    ) -> Result<Instant, SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::OperationInFlight);
        }
        let deadline = now + self.config.delay(operation);
        self.in_flight = Some(InFlight {
            operation,
            payload,
            deadline,
        });
        Ok(deadline)
    }

    /// Releases the operation once `now` has reached its deadline.
    pub fn poll(&mut self, now: Instant) -> Option<(SimulatedOperation, T)> {
        if self.in_flight.as_ref()?.deadline > now {
            return None;
        }
        self.in_flight.take().map(|f| (f.operation, f.payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_start_is_refused() {
        let mut gate = LatencyGate::new(LatencyConfig::default());
        let now = Instant::now();
        gate.start(SimulatedOperation::PaymentProcessing, 1, now).unwrap();

        let result = gate.start(SimulatedOperation::PaymentProcessing, 2, now);
        assert_eq!(result, Err(SessionError::OperationInFlight));
        assert_eq!(gate.current(), Some(SimulatedOperation::PaymentProcessing));
    }

    #[test]
    fn poll_waits_for_deadline() {
        let mut gate = LatencyGate::new(LatencyConfig::default());
        let now = Instant::now();
        let deadline = gate.start(SimulatedOperation::Authentication, (), now).unwrap();
        assert_eq!(deadline, now + Duration::from_millis(800));

        assert!(gate.poll(now + Duration::from_millis(799)).is_none());
        assert!(gate.is_busy());

        let done = gate.poll(deadline);
        assert_eq!(done, Some((SimulatedOperation::Authentication, ())));
        assert!(!gate.is_busy());
    }

    #[test]
    fn instant_config_resolves_immediately() {
        let mut gate = LatencyGate::new(LatencyConfig::instant());
        let now = Instant::now();
        gate.start(SimulatedOperation::DocumentScan, "id", now).unwrap();
        assert_eq!(gate.poll(now), Some((SimulatedOperation::DocumentScan, "id")));
    }

    #[test]
    fn idle_gate_polls_nothing() {
        let mut gate: LatencyGate<()> = LatencyGate::new(LatencyConfig::default());
        assert!(gate.poll(Instant::now()).is_none());
        assert_eq!(gate.deadline(), None);
    }
}
