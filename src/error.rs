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

//! Error types for session operations.
//!
//! None of these are fatal. The navigator shows the message on the view
//! that raised it and lets the user correct the input.

use crate::base::{AppointmentId, ZoneId};
use crate::navigator::View;
use thiserror::Error;

/// Session operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Debit would take the wallet below zero
    #[error("insufficient wallet balance")]
    InsufficientFunds,

    /// Reschedule or cancel target does not exist
    #[error("appointment {0} not found")]
    AppointmentNotFound(AppointmentId),

    /// Active zone reference does not resolve
    #[error("unknown parking zone {0}")]
    UnknownZone(ZoneId),

    /// A required form field or scan is missing
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Utility payment with no bill selected
    #[error("nothing selected")]
    NothingSelected,

    /// A simulated operation is still running; the control is disabled
    #[error("another operation is in progress")]
    OperationInFlight,

    /// Intent requires a signed-in session
    #[error("not signed in")]
    NotAuthenticated,

    /// Intent has no meaning on the current view
    #[error("cannot {intent} from {from}")]
    InvalidTransition { from: View, intent: &'static str },
}
