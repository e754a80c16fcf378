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

//! # MUNAPP Core
//!
//! Orchestration core for a municipal services client. It sequences the
//! multi-step flows a citizen walks through (service registration, bill
//! payment, wallet top-up and transfer, appointment booking) and keeps the
//! in-memory ledger consistent across them.
//!
//! ## Core Components
//!
//! - [`Navigator`]: View state machine that dispatches user [`Intent`]s
//! - [`Ledger`]: Wallet balance, parking zones, notifications and appointments
//! - [`PaymentStaging`]: The single payment awaiting confirmation
//! - [`ConfirmationRecord`]: Receipt shown when a flow completes
//! - [`AppointmentBook`]: Booking, rescheduling and cancellation
//! - [`SessionError`]: Error types for rejected intents
//!
//! ## Example
//!
//! ```
//! use munapp_core::{Intent, Navigator, SessionConfig, View};
//! use rust_decimal_macros::dec;
//!
//! let mut nav = Navigator::new(SessionConfig::default().instant());
//! nav.dispatch(Intent::SubmitCredentials).unwrap();
//! nav.dispatch(Intent::Navigate(View::TopUp)).unwrap();
//!
//! // Top up the wallet
//! let view = nav
//!     .dispatch(Intent::ConfirmPayment { amount: Some(dec!(100)) })
//!     .unwrap();
//! assert_eq!(view, View::Confirmation);
//! assert_eq!(nav.ledger().balance(), dec!(600));
//! ```
//!
//! ## Concurrency
//!
//! A session is single-threaded. Operations that simulate latency hold the
//! [`latency::LatencyGate`] and every other intent is refused until they
//! finish.

pub mod appointment;
mod base;
pub mod catalog;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod flow;
pub mod latency;
mod ledger;
mod navigator;
mod staging;

pub use appointment::{Appointment, AppointmentBook, AppointmentStatus, BookingRequest};
pub use base::{AppointmentId, ConfirmationId, ZoneId};
pub use config::{ConfigError, SessionConfig};
pub use confirmation::{AssignmentDetails, ConfirmationKind, ConfirmationRecord, ReceiptType};
pub use error::SessionError;
pub use flow::{CaseDraft, CaseInput, DocumentKind, TransferDraft};
pub use latency::{LatencyConfig, SimulatedOperation};
pub use ledger::{Ledger, ParkingZone};
pub use navigator::{Intent, Navigator, ParseViewError, Screen, SessionSnapshot, View};
pub use staging::{PaymentStaging, PendingPayment};
