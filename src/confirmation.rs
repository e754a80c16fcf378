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

//! Receipts shown when a flow completes.
//!
//! | Kind | Prefix | Receipt type |
//! |------|--------|--------------|
//! | Free service registration | `SRV` | service |
//! | Transport product purchase | `TRN` | payment |
//! | Wallet top-up | `WAL` | payment |
//! | Any other payment | `MPAY` | payment |
//! | Wallet transfer | `XFR` | transfer |

use crate::base::ConfirmationId;
use crate::catalog::ServiceCategory;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfirmationKind {
    ServiceRegistration,
    ProductPurchase,
    WalletTopUp,
    Payment,
    Transfer,
}

impl ConfirmationKind {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::ServiceRegistration => "SRV",
            Self::ProductPurchase => "TRN",
            Self::WalletTopUp => "WAL",
            Self::Payment => "MPAY",
            Self::Transfer => "XFR",
        }
    }

    pub fn receipt_type(self) -> ReceiptType {
        match self {
            Self::ServiceRegistration => ReceiptType::Service,
            Self::Transfer => ReceiptType::Transfer,
            Self::ProductPurchase | Self::WalletTopUp | Self::Payment => ReceiptType::Payment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptType {
    Payment,
    Service,
    Transfer,
}

/// Where and when the citizen was assigned after a free registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct AssignmentDetails {
    pub time: Option<String>,
    pub office: Option<String>,
    pub street: Option<String>,
    pub professional: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationRecord {
    pub id: ConfirmationId,
    pub kind: ConfirmationKind,
    #[serde(rename = "type")]
    pub receipt_type: ReceiptType,
    pub title: String,
    pub description: String,
    /// Rescaled to two decimal places.
    pub amount: Option<Decimal>,
    pub details: Option<AssignmentDetails>,
}

impl ConfirmationRecord {
    pub fn build(
        kind: ConfirmationKind,
        title: impl Into<String>,
        description: impl Into<String>,
        amount: Option<Decimal>,
        details: Option<AssignmentDetails>,
    ) -> Self {
        Self {
            id: generate_id(kind),
            kind,
            receipt_type: kind.receipt_type(),
            title: title.into(),
            description: description.into(),
            amount: amount.map(to_cents),
            details,
        }
    }
}

/// `{PREFIX}-{10000..=99999}`.
pub fn generate_id(kind: ConfirmationKind) -> ConfirmationId {
    ConfirmationId(format!("{}-{}", kind.prefix(), rand::random_range(10_000..=99_999)))
}

/// Rounds to two places and pins the scale so `100` displays as `100.00`.
pub fn to_cents(amount: Decimal) -> Decimal {
    let mut cents = amount.round_dp(2);
    cents.rescale(2);
    cents
}

/// Simulated back-office assignment for a free registration.
///
/// Returns the details to print on the receipt and the notification to push,
/// or `None` for categories that get no assignment.
pub fn assignment_for(category: Option<ServiceCategory>) -> Option<(AssignmentDetails, String)> {
    match category? {
        ServiceCategory::Health => {
            let (time, doctor) = ("11:30 AM", "Dr. Elena Ionescu");
            let details = AssignmentDetails {
                time: Some(time.to_owned()),
                office: Some("Cabinet 204".to_owned()),
                street: Some("Str. Kiev 3".to_owned()),
                professional: Some(doctor.to_owned()),
            };
            Some((details, format!("Doctor assigned: {doctor} at {time}")))
        }
        ServiceCategory::Education => {
            let time = "09:00 AM (Monday)";
            let details = AssignmentDetails {
                time: Some(time.to_owned()),
                office: Some("Secretariat / Room 1".to_owned()),
                street: Some("Selected Institution Address".to_owned()),
                professional: None,
            };
            Some((details, format!("School intake scheduled for {time}")))
        }
        ServiceCategory::Social | ServiceCategory::Utility => None,
    }
}
