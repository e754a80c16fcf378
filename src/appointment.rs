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

//! Appointment scheduling.
//!
//! Appointments follow a small state machine:
//!
//! ```text
//!            ┌─reschedule─┐
//!            ▼            │
//!  book ──► Upcoming ─────┘
//!              │ └──cancel──► Cancelled
//!              ▼
//!          Completed ──cancel──► Cancelled
//! ```
//!
//! Cancelled records stay in the book as an audit trail and are never moved
//! back to `Upcoming`. Only upcoming appointments can be rescheduled; the
//! navigator refuses to open the reschedule screen for any other status.
//! Cancelling a `Completed` appointment is not guarded here; the caller owns
//! that policy.

use crate::SessionError;
use crate::base::AppointmentId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentStatus {
    Upcoming,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appointment {
    pub id: AppointmentId,
    pub service: String,
    pub date: String,
    pub time: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub status: AppointmentStatus,
}

/// Fields chosen on the booking screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub service: String,
    pub date: String,
    pub time: String,
    pub location: String,
}

impl BookingRequest {
    pub fn new(
        service: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            date: date.into(),
            time: time.into(),
            location: location.into(),
        }
    }

    /// First blank field, in the order the booking screen asks for them.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("service", &self.service),
            ("date", &self.date),
            ("time", &self.time),
            ("location", &self.location),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Ordered appointment list, most recently booked first.
#[derive(Debug, Clone, Default)]
pub struct AppointmentBook {
    appointments: Vec<Appointment>,
}

impl AppointmentBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a book from seed records, keeping their order.
    pub fn with_appointments(appointments: Vec<Appointment>) -> Self {
        Self { appointments }
    }

    pub fn list(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    pub fn get(&self, id: &AppointmentId) -> Option<&Appointment> {
        self.appointments.iter().find(|a| &a.id == id)
    }

    /// Creates a new `Upcoming` appointment at the front of the list.
    pub fn book(&mut self, request: BookingRequest) -> Appointment {
        let id = self.fresh_id();
        let appointment = Appointment {
            id,
            service: request.service,
            date: request.date,
            time: request.time,
            location: request.location,
            full_address: None,
            instructions: None,
            status: AppointmentStatus::Upcoming,
        };
        self.appointments.insert(0, appointment.clone());
        appointment
    }

    /// Moves an existing appointment to a new slot without changing its id
    /// or its position in the list.
    ///
    /// # Errors
    ///
    /// - [`SessionError::AppointmentNotFound`] - No appointment has this id.
    pub fn reschedule(
        &mut self,
        id: &AppointmentId,
        date: impl Into<String>,
        time: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Appointment, SessionError> {
        let appointment = self.get_mut(id)?;
        appointment.date = date.into();
        appointment.time = time.into();
        appointment.location = location.into();
        appointment.status = AppointmentStatus::Upcoming;
        Ok(appointment.clone())
    }

    /// Marks an appointment `Cancelled`. Cancelling twice is a no-op.
    ///
    /// # Errors
    ///
    /// - [`SessionError::AppointmentNotFound`] - No appointment has this id.
    pub fn cancel(&mut self, id: &AppointmentId) -> Result<(), SessionError> {
        self.get_mut(id)?.status = AppointmentStatus::Cancelled;
        Ok(())
    }

    fn get_mut(&mut self, id: &AppointmentId) -> Result<&mut Appointment, SessionError> {
        self.appointments
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| SessionError::AppointmentNotFound(id.clone()))
    }

    // Ids are random like receipt ids, but a clash here would merge two
    // records on reschedule, so redraw until unused.
    fn fresh_id(&self) -> AppointmentId {
        loop {
            let id = AppointmentId(format!("APT-{}", rand::random_range(1000..=9999)));
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}
