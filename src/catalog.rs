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

//! Catalog items that views hand to the navigator.
//!
//! The catalogs themselves are inert data owned by the presentation layer.
//! The `default_*` functions return the stock Chișinău entries used by the
//! script driver and the tests.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Service selected on the Services screen that routes to the free parking finder.
pub const FREE_PARKING_FINDER: &str = "Free Parking Finder";
/// Service selected on the Services screen that routes to the wallet.
pub const TRANSPORT_PASS: &str = "Transport Pass";
/// Case title with its own form requirements.
pub const RESIDENCE_CHANGE: &str = "Residence Change";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Education,
    Social,
    Utility,
    Health,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceItem {
    pub title: String,
    pub description: String,
    pub is_free: bool,
    #[serde(default)]
    pub requires_id_scan: bool,
    pub category: Option<ServiceCategory>,
}

impl ServiceItem {
    pub fn new(
        title: &str,
        description: &str,
        is_free: bool,
        category: Option<ServiceCategory>,
    ) -> Self {
        Self {
            title: title.to_owned(),
            description: description.to_owned(),
            is_free,
            requires_id_scan: false,
            category,
        }
    }

    fn with_id_scan(mut self) -> Self {
        self.requires_id_scan = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransportProduct {
    pub name: String,
    pub price: Decimal,
}

impl TransportProduct {
    pub fn new(name: &str, price: Decimal) -> Self {
        Self {
            name: name.to_owned(),
            price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UtilityBill {
    pub id: String,
    pub provider: String,
    pub kind: String,
    pub amount: Decimal,
    pub due_date: String,
    #[serde(default)]
    pub is_overdue: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SpotAvailability {
    Available,
    HighDemand,
    Limited,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FreeParkingLocation {
    pub id: String,
    pub name: String,
    pub address: String,
    pub sector: String,
    pub spots: u32,
    pub status: SpotAvailability,
    #[serde(default)]
    pub is_suburb: bool,
}

pub fn default_services() -> Vec<ServiceItem> {
    use ServiceCategory::{Education, Health, Social, Utility};

    vec![
        ServiceItem::new(FREE_PARKING_FINDER, "Locate no-cost parking spots in the city", true, Some(Utility)),
        ServiceItem::new("Water & Sewerage", "Apă-Canal connection & metering", false, Some(Utility)),
        ServiceItem::new("Centralized Heating", "Termoelectrica service management", false, Some(Utility)),
        ServiceItem::new("Natural Gas", "Moldovagaz residential supply", false, Some(Utility)),
        ServiceItem::new("Electricity Supply", "Premier Energy residential contract", false, Some(Utility)),
        ServiceItem::new("Housing Stock", "Block maintenance & repairs (Î.M.G.F.L.)", false, Some(Utility)),
        ServiceItem::new("Local Taxes", "Property, land, and sanitation taxes", false, Some(Utility)),
        ServiceItem::new(TRANSPORT_PASS, "Monthly municipal transit pass", false, Some(Utility)),
        ServiceItem::new(RESIDENCE_CHANGE, "Update your registered domicile", false, None),
        ServiceItem::new("Pensions & Allowances", "Old-age, disability, or survivor pensions", true, Some(Social)).with_id_scan(),
        ServiceItem::new("Social Benefits", "Aid for low-income families and children", true, Some(Social)).with_id_scan(),
        ServiceItem::new("Cold Season Subsidies", "Energy compensation and heating aid", true, Some(Social)).with_id_scan(),
        ServiceItem::new("Kindergarten Registration", "Enroll child in municipal nursery", true, Some(Education)),
        ServiceItem::new("School Registration", "Enroll student in local school", true, Some(Education)),
        ServiceItem::new("Family Doctor Center (CMF)", "Primary healthcare assignment", true, Some(Health)),
        ServiceItem::new("Vulnerable Groups Support", "Specific aid for seniors and persons with disabilities", true, Some(Social)).with_id_scan(),
    ]
}

pub fn default_products() -> Vec<TransportProduct> {
    vec![
        TransportProduct::new("RTEC Monthly Pass", dec!(234)),
        TransportProduct::new("PUA Monthly Pass", dec!(234)),
        TransportProduct::new("RTEC Single Ticket", dec!(6)),
        TransportProduct::new("PUA Single Ticket", dec!(6)),
    ]
}

pub fn default_utility_bills() -> Vec<UtilityBill> {
    let bill = |id: &str, provider: &str, kind: &str, amount: Decimal, due_date: &str| UtilityBill {
        id: id.to_owned(),
        provider: provider.to_owned(),
        kind: kind.to_owned(),
        amount,
        due_date: due_date.to_owned(),
        is_overdue: false,
    };

    let mut heating = bill("heat", "Termoelectrica", "Centralized Heating", dec!(1200.00), "Oct 20");
    heating.is_overdue = true;

    vec![
        heating,
        bill("elec", "Premier Energy", "Electricity", dec!(450.20), "Nov 05"),
        bill("water", "Apă-Canal Chișinău", "Water & Sewerage", dec!(185.30), "Nov 02"),
        bill("gas", "Moldovagaz", "Natural Gas", dec!(390.50), "Nov 02"),
        bill("housing", "Infocom / Î.M.G.F.L.", "Housing Stock & Maintenance", dec!(210.00), "Oct 31"),
        bill("sanitation", "Regia Autosalubritate", "Sanitation Tax", dec!(30.00), "Oct 31"),
        bill("tax", "Direcția Impozite", "Local Property Tax", dec!(155.00), "Nov 15"),
    ]
}

pub fn default_parking_locations() -> Vec<FreeParkingLocation> {
    use SpotAvailability::{Available, HighDemand, Limited};

    let location = |id: &str, name: &str, address: &str, sector: &str, spots: u32, status, is_suburb| {
        FreeParkingLocation {
            id: id.to_owned(),
            name: name.to_owned(),
            address: address.to_owned(),
            sector: sector.to_owned(),
            spots,
            status,
            is_suburb,
        }
    };

    vec![
        location("FP-C1", "Mircea cel Bătrân Alley Public Spot", "Bulevardul Mircea cel Bătrân, Ciocana", "Ciocana", 45, Available, false),
        location("FP-C2", "Ginta Latină Market Perimeter", "Str. Ginta Latină 12", "Ciocana", 20, Limited, false),
        location("FP-B1", "Bubuieci Community Center Lot", "Str. Centrală 1, Bubuieci", "Ciocana", 30, Available, true),
        location("FP-CE1", "National Library Rear Area", "Str. 31 August 1989", "Centru", 12, HighDemand, false),
        location("FP-CE2", "Valea Morilor Cascades Parking", "Str. Grigore Alexandrescu", "Centru", 60, Available, false),
        location("FP-BO1", "Rose Valley Park Entrance", "Str. Trandafirilor", "Botanica", 40, Available, false),
        location("FP-BU2", "Alunelul Park Front", "Calea Ieșilor", "Buiucani", 50, Available, false),
        location("FP-GHI1", "Ghidighici Beach Entrance", "Str. Victoriei, Ghidighici", "Buiucani", 120, Available, true),
    ]
}

/// Looks up a catalog entry by title, case-insensitively.
pub fn find_service<'a>(services: &'a [ServiceItem], title: &str) -> Option<&'a ServiceItem> {
    services.iter().find(|s| s.title.eq_ignore_ascii_case(title))
}
