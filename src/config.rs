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

//! Session configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config.
//! Decimal amounts are written as strings:
//!
//! ```toml
//! initial_balance = "500"
//! service_fee = "150.00"
//! active_zone = "home-zone"
//!
//! [latency]
//! payment_ms = 0
//!
//! [[zones]]
//! id = "home-zone"
//! name = "Home"
//! sector = "Ciocana"
//! address = "Str. Mihai Eminescu 45"
//! is_subsidized = true
//! rules = "Free residential parking for eID verified citizens."
//! ```

use crate::appointment::{Appointment, AppointmentStatus};
use crate::base::{AppointmentId, ZoneId};
use crate::latency::LatencyConfig;
use crate::ledger::ParkingZone;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Wallet balance at sign-in.
    pub initial_balance: Decimal,
    /// Charged when a paid service registration is confirmed.
    pub service_fee: Decimal,
    pub zones: Vec<ParkingZone>,
    pub active_zone: ZoneId,
    /// Appointments present at sign-in, newest first.
    pub appointments: Vec<Appointment>,
    pub latency: LatencyConfig,
}

impl SessionConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Same config with every simulated delay set to zero.
    pub fn instant(mut self) -> Self {
        self.latency = LatencyConfig::instant();
        self
    }

    /// Checks the constraints serde cannot express.
    ///
    /// A stale `active_zone` is not an error; the ledger falls back to the
    /// first zone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_balance < Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "initial_balance must not be negative, got {}",
                self.initial_balance
            )));
        }
        if self.service_fee <= Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "service_fee must be positive, got {}",
                self.service_fee
            )));
        }
        if self.zones.is_empty() {
            return Err(ConfigError::Invalid("at least one parking zone is required".to_owned()));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_balance: dec!(500),
            service_fee: dec!(150.00),
            zones: default_zones(),
            active_zone: ZoneId::from("home-zone"),
            appointments: vec![seed_appointment()],
            latency: LatencyConfig::default(),
        }
    }
}

fn default_zones() -> Vec<ParkingZone> {
    vec![
        ParkingZone {
            id: ZoneId::from("home-zone"),
            name: "Home".to_owned(),
            sector: "Ciocana".to_owned(),
            address: "Str. Mihai Eminescu 45".to_owned(),
            is_subsidized: true,
            rules: "Free residential parking for eID verified citizens.".to_owned(),
        },
        ParkingZone {
            id: ZoneId::from("work-zone"),
            name: "Work".to_owned(),
            sector: "Centru".to_owned(),
            address: "Str. Ștefan cel Mare 202".to_owned(),
            is_subsidized: false,
            rules: "Standard rate: 10 MDL/hour. Work permit required.".to_owned(),
        },
    ]
}

fn seed_appointment() -> Appointment {
    Appointment {
        id: AppointmentId::from("APT-9921"),
        service: "Property Registration Inquiry".to_owned(),
        date: "Tomorrow, Oct 27".to_owned(),
        time: "10:00 AM".to_owned(),
        location: "Chisinau City Hall, Room 302".to_owned(),
        full_address: Some("Vlaicu Pârcălab St 83, Chișinău 2012, Moldova".to_owned()),
        instructions: Some(
            "Please bring your original property deed and a valid eID. \
             Go to the 3rd floor, turn right after the elevator."
                .to_owned(),
        ),
        status: AppointmentStatus::Upcoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.initial_balance, dec!(500));
        assert_eq!(config.zones.len(), 2);
        assert_eq!(config.appointments[0].id, AppointmentId::from("APT-9921"));
    }

    #[test]
    fn overrides_are_applied() {
        let config = SessionConfig::from_toml_str(
            r#"
            initial_balance = "50"
            service_fee = "75.50"

            [latency]
            payment_ms = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.initial_balance, dec!(50));
        assert_eq!(config.service_fee, dec!(75.50));
        assert_eq!(config.latency.payment_ms, 10);
        assert_eq!(config.latency.authentication_ms, 800);
    }

    #[test]
    fn zones_and_appointments_parse() {
        let config = SessionConfig::from_toml_str(
            r#"
            active_zone = "garage"

            [[zones]]
            id = "garage"
            name = "Garage"
            sector = "Botanica"
            address = "Str. Pădurii"
            is_subsidized = false
            rules = "Residential Zone"

            [[appointments]]
            id = "APT-1234"
            service = "Pension Application"
            date = "Monday, Oct 30"
            time = "09:00 AM"
            location = "CNAS Office"
            status = "Completed"
            "#,
        )
        .unwrap();
        assert_eq!(config.zones[0].id, ZoneId::from("garage"));
        assert_eq!(config.appointments[0].status, AppointmentStatus::Completed);
        assert_eq!(config.appointments[0].full_address, None);
    }

    #[test]
    fn negative_balance_is_rejected() {
        let result = SessionConfig::from_toml_str(r#"initial_balance = "-1""#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn empty_zone_list_is_rejected() {
        let result = SessionConfig::from_toml_str("zones = []");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = SessionConfig::from_toml_str("initial_balance = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "service_fee = \"99\"").unwrap();
        let config = SessionConfig::load(file.path()).unwrap();
        assert_eq!(config.service_fee, dec!(99));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = SessionConfig::load("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
