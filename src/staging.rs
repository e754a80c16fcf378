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

//! Single-slot staging area for the payment awaiting confirmation.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// Amount and description a flow asked the user to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct PendingPayment {
    pub amount: Decimal,
    pub description: String,
    pub is_product_purchase: bool,
    pub product_name: Option<String>,
}

impl PendingPayment {
    pub fn new(amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            amount,
            description: description.into(),
            is_product_purchase: false,
            product_name: None,
        }
    }

    /// Intent for buying a transport product; description is `Purchase: {name}`.
    pub fn product(name: &str, price: Decimal) -> Self {
        Self {
            amount: price,
            description: format!("Purchase: {name}"),
            is_product_purchase: true,
            product_name: Some(name.to_owned()),
        }
    }
}

/// Holds at most one [`PendingPayment`].
///
/// Only one flow is on screen at a time, so a later `stage` simply replaces
/// the earlier one.
#[derive(Debug, Default)]
pub struct PaymentStaging {
    slot: Option<PendingPayment>,
}

impl PaymentStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, payment: PendingPayment) {
        if let Some(previous) = self.slot.replace(payment) {
            debug!(description = %previous.description, "replaced staged payment");
        }
    }

    pub fn peek(&self) -> Option<&PendingPayment> {
        self.slot.as_ref()
    }

    pub fn is_staged(&self) -> bool {
        self.slot.is_some()
    }

    /// Takes the staged payment, leaving the slot empty.
    ///
    /// With nothing staged this returns a zero-amount payment with an empty
    /// description, so the confirmation view always has something to show.
    pub fn consume(&mut self) -> PendingPayment {
        self.slot.take().unwrap_or_default()
    }

    /// Drops the staged payment without applying it.
    pub fn clear(&mut self) {
        self.slot = None;
    }
}
