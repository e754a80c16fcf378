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

//! Ledger public API integration tests.

use munapp_core::{Ledger, ParkingZone, SessionConfig, SessionError, ZoneId};
use rust_decimal_macros::dec;

fn zone(id: &str, name: &str, sector: &str) -> ParkingZone {
    ParkingZone {
        id: ZoneId::from(id),
        name: name.to_owned(),
        sector: sector.to_owned(),
        address: "Selectable via Maps".to_owned(),
        is_subsidized: false,
        rules: "Residential Zone".to_owned(),
    }
}

#[test]
fn new_ledger_uses_config() {
    let ledger = Ledger::new(&SessionConfig::default());
    assert_eq!(ledger.balance(), dec!(500));
    assert_eq!(ledger.active_pass(), None);
    assert_eq!(ledger.zones().len(), 2);
    assert_eq!(ledger.active_zone().unwrap().id, ZoneId::from("home-zone"));
    assert_eq!(ledger.appointments().len(), 1);
    assert!(ledger.notifications().is_empty());
}

#[test]
fn stale_active_zone_falls_back_to_first() {
    let config = SessionConfig {
        active_zone: ZoneId::from("gone"),
        ..SessionConfig::default()
    };
    let ledger = Ledger::new(&config);
    assert_eq!(ledger.active_zone().unwrap().name, "Home");
}

#[test]
fn credit_and_debit() {
    let mut ledger = Ledger::new(&SessionConfig::default());
    ledger.credit(dec!(100.50)).unwrap();
    ledger.debit(dec!(0.50)).unwrap();
    assert_eq!(ledger.balance(), dec!(600));
}

#[test]
fn debit_entire_balance() {
    let mut ledger = Ledger::new(&SessionConfig::default());
    ledger.debit(dec!(500)).unwrap();
    assert_eq!(ledger.balance(), dec!(0));
    assert_eq!(ledger.debit(dec!(0.01)), Err(SessionError::InsufficientFunds));
}

#[test]
fn non_positive_amounts_are_rejected() {
    let mut ledger = Ledger::new(&SessionConfig::default());
    assert_eq!(ledger.credit(dec!(0)), Err(SessionError::InvalidAmount));
    assert_eq!(ledger.credit(dec!(-5)), Err(SessionError::InvalidAmount));
    assert_eq!(ledger.debit(dec!(0)), Err(SessionError::InvalidAmount));
    assert_eq!(ledger.balance(), dec!(500));
}

#[test]
fn failed_purchase_keeps_previous_pass() {
    let mut ledger = Ledger::new(&SessionConfig::default());
    ledger.purchase_pass("RTEC Monthly Pass", dec!(234)).unwrap();
    ledger.purchase_pass("PUA Monthly Pass", dec!(234)).unwrap();

    let result = ledger.purchase_pass("RTEC Single Ticket", dec!(500));

    assert_eq!(result, Err(SessionError::InsufficientFunds));
    assert_eq!(ledger.active_pass(), Some("PUA Monthly Pass"));
    assert_eq!(ledger.balance(), dec!(32));
}

#[test]
fn zone_ids_skip_taken() {
    let config = SessionConfig {
        zones: vec![zone("zone-1", "Garage", "Botanica")],
        active_zone: ZoneId::from("zone-1"),
        ..SessionConfig::default()
    };
    let mut ledger = Ledger::new(&config);

    assert_eq!(ledger.next_zone_id(), ZoneId::from("zone-2"));
    assert_eq!(ledger.next_zone_id(), ZoneId::from("zone-3"));
}

#[test]
fn set_active_zone_rejects_unknown_id() {
    let mut ledger = Ledger::new(&SessionConfig::default());
    ledger.set_active_zone(&ZoneId::from("work-zone")).unwrap();

    let result = ledger.set_active_zone(&ZoneId::from("moon"));

    assert_eq!(result, Err(SessionError::UnknownZone(ZoneId::from("moon"))));
    assert_eq!(ledger.active_zone().unwrap().id, ZoneId::from("work-zone"));

    ledger.reset_active_zone();
    assert_eq!(ledger.active_zone().unwrap().id, ZoneId::from("home-zone"));
}

#[test]
fn added_zone_can_be_activated() {
    let mut ledger = Ledger::new(&SessionConfig::default());
    let id = ledger.next_zone_id();
    ledger.add_zone(zone(id.as_str(), "Gym", "Rîșcani"));

    ledger.set_active_zone(&id).unwrap();
    assert_eq!(ledger.active_zone().unwrap().label(), "Gym (Rîșcani)");
}

#[test]
fn notifications_newest_first() {
    let mut ledger = Ledger::new(&SessionConfig::default());
    ledger.push_notification("first");
    ledger.push_notification("second");
    assert_eq!(ledger.notifications(), ["second", "first"]);
}
