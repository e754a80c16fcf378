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

//! Session ledger store.
//!
//! Owns the wallet, the parking zones, the notification feed and the
//! appointment book. Every mutation either applies in full or returns an
//! error and leaves the store untouched.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use munapp_core::{Ledger, SessionConfig};
//!
//! let mut ledger = Ledger::new(&SessionConfig::default());
//! ledger.credit(dec!(100)).unwrap();
//! assert_eq!(ledger.balance(), dec!(600));
//! ```

use crate::SessionError;
use crate::appointment::AppointmentBook;
use crate::base::ZoneId;
use crate::config::SessionConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParkingZone {
    pub id: ZoneId,
    pub name: String,
    pub sector: String,
    pub address: String,
    pub is_subsidized: bool,
    pub rules: String,
}

impl ParkingZone {
    /// Label shown on the dashboard, e.g. `Home (Ciocana)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.sector)
    }
}

#[derive(Debug, Clone)]
struct WalletData {
    balance: Decimal,
    active_pass: Option<String>,
}

impl WalletData {
    fn new(balance: Decimal) -> Self {
        Self {
            balance,
            active_pass: None,
        }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= Decimal::ZERO,
            "Invariant violated: wallet balance went negative: {}",
            self.balance
        );
    }

    /// Increases the balance.
    fn credit(&mut self, amount: Decimal) -> Result<(), SessionError> {
        if amount <= Decimal::ZERO {
            return Err(SessionError::InvalidAmount);
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(SessionError::InvalidAmount)?;
        self.assert_invariants();
        Ok(())
    }

    /// Decreases the balance.
    fn debit(&mut self, amount: Decimal) -> Result<(), SessionError> {
        if amount <= Decimal::ZERO {
            return Err(SessionError::InvalidAmount);
        }
        if self.balance < amount {
            return Err(SessionError::InsufficientFunds);
        }
        self.balance -= amount;
        self.assert_invariants();
        Ok(())
    }
}

/// Session-scoped ledger.
#[derive(Debug, Clone)]
pub struct Ledger {
    wallet: WalletData,
    zones: Vec<ParkingZone>,
    active_zone_id: ZoneId,
    next_zone_seq: u32,
    /// Newest first.
    notifications: Vec<String>,
    appointments: AppointmentBook,
}

impl Ledger {
    pub fn new(config: &SessionConfig) -> Self {
        let mut ledger = Self {
            wallet: WalletData::new(config.initial_balance.max(Decimal::ZERO)),
            zones: config.zones.clone(),
            active_zone_id: config.active_zone.clone(),
            next_zone_seq: 1,
            notifications: Vec::new(),
            appointments: AppointmentBook::with_appointments(config.appointments.clone()),
        };
        if !ledger.zones.iter().any(|z| z.id == ledger.active_zone_id) {
            warn!(zone = %ledger.active_zone_id, "configured active zone not found, using first zone");
            ledger.reset_active_zone();
        }
        ledger
    }

    pub fn balance(&self) -> Decimal {
        self.wallet.balance
    }

    pub fn active_pass(&self) -> Option<&str> {
        self.wallet.active_pass.as_deref()
    }

    /// Adds funds to the wallet.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidAmount`] - Amount is zero or negative.
    pub fn credit(&mut self, amount: Decimal) -> Result<(), SessionError> {
        self.wallet.credit(amount)
    }

    /// Removes funds from the wallet.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidAmount`] - Amount is zero or negative.
    /// - [`SessionError::InsufficientFunds`] - Amount exceeds the balance.
    pub fn debit(&mut self, amount: Decimal) -> Result<(), SessionError> {
        self.wallet.debit(amount)
    }

    /// Debits the price and activates the pass as one step.
    pub fn purchase_pass(&mut self, name: &str, price: Decimal) -> Result<(), SessionError> {
        self.wallet.debit(price)?;
        self.wallet.active_pass = Some(name.to_owned());
        Ok(())
    }

    pub fn zones(&self) -> &[ParkingZone] {
        &self.zones
    }

    pub fn add_zone(&mut self, zone: ParkingZone) {
        self.zones.push(zone);
    }

    /// Returns the next `zone-{n}` id not already taken.
    pub fn next_zone_id(&mut self) -> ZoneId {
        loop {
            let id = ZoneId(format!("zone-{}", self.next_zone_seq));
            self.next_zone_seq += 1;
            if !self.zones.iter().any(|z| z.id == id) {
                return id;
            }
        }
    }

    /// # Errors
    ///
    /// - [`SessionError::UnknownZone`] - No zone has this id; the active
    ///   zone is left as it was.
    pub fn set_active_zone(&mut self, id: &ZoneId) -> Result<(), SessionError> {
        if !self.zones.iter().any(|z| &z.id == id) {
            return Err(SessionError::UnknownZone(id.clone()));
        }
        self.active_zone_id = id.clone();
        Ok(())
    }

    /// Points the active zone at the first zone, if any.
    pub fn reset_active_zone(&mut self) {
        if let Some(first) = self.zones.first() {
            self.active_zone_id = first.id.clone();
        }
    }

    /// Resolves the active zone, falling back to the first zone when the
    /// reference is stale.
    pub fn active_zone(&self) -> Option<&ParkingZone> {
        self.zones
            .iter()
            .find(|z| z.id == self.active_zone_id)
            .or_else(|| self.zones.first())
    }

    pub fn push_notification(&mut self, text: impl Into<String>) {
        self.notifications.insert(0, text.into());
    }

    pub fn notifications(&self) -> &[String] {
        &self.notifications
    }

    pub fn appointments(&self) -> &AppointmentBook {
        &self.appointments
    }

    pub fn appointments_mut(&mut self) -> &mut AppointmentBook {
        &mut self.appointments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // === WalletData Internal Tests ===

    #[test]
    fn wallet_data_credit_then_debit() {
        let mut data = WalletData::new(dec!(50.00));
        data.credit(dec!(25.50)).unwrap();
        data.debit(dec!(75.50)).unwrap();
        assert_eq!(data.balance, Decimal::ZERO);
    }

    #[test]
    fn wallet_data_rejects_non_positive_amounts() {
        let mut data = WalletData::new(dec!(50.00));
        assert_eq!(data.credit(Decimal::ZERO), Err(SessionError::InvalidAmount));
        assert_eq!(data.debit(dec!(-1)), Err(SessionError::InvalidAmount));
        assert_eq!(data.balance, dec!(50.00));
    }

    #[test]
    fn wallet_data_debit_insufficient_leaves_balance() {
        let mut data = WalletData::new(dec!(50.00));
        assert_eq!(data.debit(dec!(50.01)), Err(SessionError::InsufficientFunds));
        assert_eq!(data.balance, dec!(50.00));
    }

    #[test]
    fn wallet_data_credit_overflow_is_rejected() {
        let mut data = WalletData::new(dec!(500));
        assert_eq!(data.credit(Decimal::MAX), Err(SessionError::InvalidAmount));
        assert_eq!(data.balance, dec!(500));
    }

    // === Zone Tests ===

    #[test]
    fn stale_configured_zone_falls_back_to_first() {
        let config = SessionConfig {
            active_zone: ZoneId::from("gone"),
            ..SessionConfig::default()
        };
        let ledger = Ledger::new(&config);
        assert_eq!(ledger.active_zone().unwrap().id, ZoneId::from("home-zone"));
    }

    #[test]
    fn next_zone_id_skips_taken_ids() {
        let mut ledger = Ledger::new(&SessionConfig::default());
        ledger.add_zone(ParkingZone {
            id: ZoneId::from("zone-1"),
            name: "Garage".to_owned(),
            sector: "Botanica".to_owned(),
            address: "Str. Trandafirilor".to_owned(),
            is_subsidized: false,
            rules: "Residential Zone".to_owned(),
        });
        assert_eq!(ledger.next_zone_id(), ZoneId::from("zone-2"));
        assert_eq!(ledger.next_zone_id(), ZoneId::from("zone-3"));
    }

    #[test]
    fn failed_purchase_keeps_previous_pass() {
        let mut ledger = Ledger::new(&SessionConfig::default());
        ledger.purchase_pass("RTEC Single Ticket", dec!(6)).unwrap();
        let result = ledger.purchase_pass("RTEC Monthly Pass", dec!(10000));
        assert_eq!(result, Err(SessionError::InsufficientFunds));
        assert_eq!(ledger.active_pass(), Some("RTEC Single Ticket"));
        assert_eq!(ledger.balance(), dec!(494));
    }
}
