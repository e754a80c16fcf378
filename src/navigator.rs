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

//! View navigation.
//!
//! The [`Navigator`] is the central component: it owns the session ledger
//! and the payment staging slot, decides which screen is visible, and turns
//! user [`Intent`]s into ledger mutations followed by a screen transition.
//!
//! # Flows
//!
//! - **Services**: Services → CaseCreation → Confirmation (free) or
//!   Payment → Confirmation (fee).
//! - **Wallet**: TopUp → Confirmation (top-up), TopUp → Payment →
//!   Confirmation (product), Transfer → Confirmation.
//! - **Utilities**: Utilities → Payment → Confirmation.
//! - **Appointments**: Appointments → Book/RescheduleAppointment → Appointments.
//! - **Parking**: FreeParking → Map.
//!
//! # Failure
//!
//! A rejected intent leaves the screen untouched and stores the error text
//! as the screen's inline message.

use crate::SessionError;
use crate::appointment::{Appointment, AppointmentStatus, BookingRequest};
use crate::base::{AppointmentId, ZoneId};
use crate::catalog::{
    FREE_PARKING_FINDER, FreeParkingLocation, ServiceItem, TRANSPORT_PASS, TransportProduct,
    UtilityBill,
};
use crate::config::SessionConfig;
use crate::confirmation::{ConfirmationKind, ConfirmationRecord, assignment_for, to_cents};
use crate::flow::{CaseDraft, CaseInput, DocumentKind, TransferDraft};
use crate::latency::{LatencyGate, SimulatedOperation};
use crate::ledger::{Ledger, ParkingZone};
use crate::staging::{PaymentStaging, PendingPayment};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem;
use std::str::FromStr;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Every screen the application can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Login,
    Dashboard,
    Services,
    CaseCreation,
    Payment,
    CasesLedger,
    Appointments,
    BookAppointment,
    RescheduleAppointment,
    Profile,
    ParkingManagement,
    Settings,
    TopUp,
    Utilities,
    FreeParking,
    Map,
    Confirmation,
    Transfer,
    CivicTech,
    ImportantNumbers,
}

impl View {
    pub const ALL: [View; 20] = [
        View::Login,
        View::Dashboard,
        View::Services,
        View::CaseCreation,
        View::Payment,
        View::CasesLedger,
        View::Appointments,
        View::BookAppointment,
        View::RescheduleAppointment,
        View::Profile,
        View::ParkingManagement,
        View::Settings,
        View::TopUp,
        View::Utilities,
        View::FreeParking,
        View::Map,
        View::Confirmation,
        View::Transfer,
        View::CivicTech,
        View::ImportantNumbers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            View::Login => "login",
            View::Dashboard => "dashboard",
            View::Services => "services",
            View::CaseCreation => "case_creation",
            View::Payment => "payment",
            View::CasesLedger => "cases_ledger",
            View::Appointments => "appointments",
            View::BookAppointment => "book_appointment",
            View::RescheduleAppointment => "reschedule_appointment",
            View::Profile => "profile",
            View::ParkingManagement => "parking_management",
            View::Settings => "settings",
            View::TopUp => "top_up",
            View::Utilities => "utilities",
            View::FreeParking => "free_parking",
            View::Map => "map",
            View::Confirmation => "confirmation",
            View::Transfer => "transfer",
            View::CivicTech => "civic_tech",
            View::ImportantNumbers => "important_numbers",
        }
    }

    /// Views that can only be entered through a flow, never navigated to directly.
    pub fn needs_context(self) -> bool {
        matches!(
            self,
            View::Login
                | View::CaseCreation
                | View::Payment
                | View::RescheduleAppointment
                | View::Map
                | View::Confirmation
        )
    }

    /// Where `Back` leads. Payment is handled separately because it returns
    /// to whichever screen staged the payment.
    pub fn parent(self) -> View {
        match self {
            View::Login => View::Login,
            View::CaseCreation | View::FreeParking => View::Services,
            View::Map => View::FreeParking,
            View::Transfer => View::TopUp,
            View::BookAppointment | View::RescheduleAppointment => View::Appointments,
            View::ParkingManagement | View::Settings => View::Profile,
            _ => View::Dashboard,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown view: {0}")]
pub struct ParseViewError(pub String);

impl FromStr for View {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        View::ALL
            .into_iter()
            .find(|view| view.as_str() == wanted)
            .ok_or_else(|| ParseViewError(s.to_owned()))
    }
}

/// A view together with the context its flow requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
    Services,
    CaseCreation(CaseDraft),
    /// `return_to` is the screen that staged the payment.
    Payment { return_to: Box<Screen> },
    CasesLedger,
    Appointments,
    BookAppointment,
    RescheduleAppointment(Appointment),
    Profile,
    ParkingManagement,
    Settings,
    TopUp,
    Utilities,
    FreeParking,
    Map(FreeParkingLocation),
    Confirmation(ConfirmationRecord),
    Transfer(TransferDraft),
    CivicTech,
    ImportantNumbers,
}

impl Screen {
    pub fn view(&self) -> View {
        match self {
            Screen::Login => View::Login,
            Screen::Dashboard => View::Dashboard,
            Screen::Services => View::Services,
            Screen::CaseCreation(_) => View::CaseCreation,
            Screen::Payment { .. } => View::Payment,
            Screen::CasesLedger => View::CasesLedger,
            Screen::Appointments => View::Appointments,
            Screen::BookAppointment => View::BookAppointment,
            Screen::RescheduleAppointment(_) => View::RescheduleAppointment,
            Screen::Profile => View::Profile,
            Screen::ParkingManagement => View::ParkingManagement,
            Screen::Settings => View::Settings,
            Screen::TopUp => View::TopUp,
            Screen::Utilities => View::Utilities,
            Screen::FreeParking => View::FreeParking,
            Screen::Map(_) => View::Map,
            Screen::Confirmation(_) => View::Confirmation,
            Screen::Transfer(_) => View::Transfer,
            Screen::CivicTech => View::CivicTech,
            Screen::ImportantNumbers => View::ImportantNumbers,
        }
    }

    /// Screen for a view that needs no flow context.
    fn fresh(view: View) -> Option<Screen> {
        let screen = match view {
            View::Dashboard => Screen::Dashboard,
            View::Services => Screen::Services,
            View::CasesLedger => Screen::CasesLedger,
            View::Appointments => Screen::Appointments,
            View::BookAppointment => Screen::BookAppointment,
            View::Profile => Screen::Profile,
            View::ParkingManagement => Screen::ParkingManagement,
            View::Settings => Screen::Settings,
            View::TopUp => Screen::TopUp,
            View::Utilities => Screen::Utilities,
            View::FreeParking => Screen::FreeParking,
            View::Transfer => Screen::Transfer(TransferDraft::default()),
            View::CivicTech => Screen::CivicTech,
            View::ImportantNumbers => Screen::ImportantNumbers,
            View::Login
            | View::CaseCreation
            | View::Payment
            | View::RescheduleAppointment
            | View::Map
            | View::Confirmation => return None,
        };
        Some(screen)
    }
}

/// A user action delivered by a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SubmitCredentials,
    Logout,
    Navigate(View),
    Back,
    SelectService(ServiceItem),
    FillCase(CaseInput),
    ScanDocument(DocumentKind),
    ConfirmCase,
    PayUtilities(Vec<UtilityBill>),
    PurchaseProduct(TransportProduct),
    /// `amount` overrides the staged amount (top-up entry, edited payment).
    ConfirmPayment { amount: Option<Decimal> },
    VerifyRecipient(String),
    ConfirmTransfer { amount: Decimal, recipient: String },
    StartReschedule(AppointmentId),
    ConfirmBooking(BookingRequest),
    CancelAppointment(AppointmentId),
    NavigateToLocation(FreeParkingLocation),
    AddZone { name: String, sector: String },
    SetActiveZone(ZoneId),
    CloseConfirmation,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::SubmitCredentials => "sign in",
            Intent::Logout => "log out",
            Intent::Navigate(_) => "navigate",
            Intent::Back => "go back",
            Intent::SelectService(_) => "select a service",
            Intent::FillCase(_) => "fill the case form",
            Intent::ScanDocument(_) => "scan a document",
            Intent::ConfirmCase => "confirm the case",
            Intent::PayUtilities(_) => "pay utilities",
            Intent::PurchaseProduct(_) => "purchase a product",
            Intent::ConfirmPayment { .. } => "confirm payment",
            Intent::VerifyRecipient(_) => "verify the recipient",
            Intent::ConfirmTransfer { .. } => "confirm transfer",
            Intent::StartReschedule(_) => "reschedule",
            Intent::ConfirmBooking(_) => "confirm the booking",
            Intent::CancelAppointment(_) => "cancel an appointment",
            Intent::NavigateToLocation(_) => "open the map",
            Intent::AddZone { .. } => "add a zone",
            Intent::SetActiveZone(_) => "set the active zone",
            Intent::CloseConfirmation => "close the confirmation",
        }
    }
}

/// Work parked in the latency gate.
#[derive(Debug)]
enum Deferred {
    SignIn,
    Scan(DocumentKind),
    Payment { amount: Option<Decimal> },
    Verify(String),
}

/// Read-only state handed to views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub view: View,
    pub authenticated: bool,
    pub balance: Decimal,
    pub active_pass: Option<String>,
    pub active_zone: Option<String>,
    pub zones: Vec<ParkingZone>,
    pub appointments: Vec<Appointment>,
    pub notifications: Vec<String>,
    pub inline_message: Option<String>,
}

/// View state machine for one signed-in citizen.
///
/// # Invariants
///
/// - At most one payment is staged, and only while a flow is on its way to
///   or sitting on the Payment screen.
/// - At most one simulated operation is in flight; every intent is refused
///   until it completes.
/// - Rejected intents never change the screen or the ledger.
pub struct Navigator {
    config: SessionConfig,
    authenticated: bool,
    screen: Screen,
    ledger: Ledger,
    staging: PaymentStaging,
    gate: LatencyGate<Deferred>,
    inline_message: Option<String>,
}

impl Navigator {
    /// Starts a signed-out session on the Login screen.
    pub fn new(config: SessionConfig) -> Self {
        Navigator {
            authenticated: false,
            screen: Screen::Login,
            ledger: Ledger::new(&config),
            staging: PaymentStaging::new(),
            gate: LatencyGate::new(config.latency),
            inline_message: None,
            config,
        }
    }

    pub fn view(&self) -> View {
        self.screen.view()
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn pending_payment(&self) -> Option<&PendingPayment> {
        self.staging.peek()
    }

    pub fn confirmation(&self) -> Option<&ConfirmationRecord> {
        match &self.screen {
            Screen::Confirmation(record) => Some(record),
            _ => None,
        }
    }

    /// Message for the current screen after a rejected intent.
    pub fn inline_message(&self) -> Option<&str> {
        self.inline_message.as_deref()
    }

    pub fn in_flight(&self) -> Option<SimulatedOperation> {
        self.gate.current()
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// When the in-flight operation becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.gate.deadline()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            view: self.view(),
            authenticated: self.authenticated,
            balance: self.ledger.balance(),
            active_pass: self.ledger.active_pass().map(str::to_owned),
            active_zone: self.ledger.active_zone().map(ParkingZone::label),
            zones: self.ledger.zones().to_vec(),
            appointments: self.ledger.appointments().list().to_vec(),
            notifications: self.ledger.notifications().to_vec(),
            inline_message: self.inline_message.clone(),
        }
    }

    pub fn dispatch(&mut self, intent: Intent) -> Result<View, SessionError> {
        self.dispatch_at(intent, Instant::now())
    }

    /// Applies an intent and returns the view it left the session on.
    ///
    /// Deferred intents (sign-in, document scan, payment, recipient
    /// verification) start in the latency gate and finish here when their
    /// delay is zero, otherwise on a later [`Navigator::tick_at`].
    ///
    /// # Errors
    ///
    /// - [`SessionError::OperationInFlight`] - A deferred intent is still running.
    /// - [`SessionError::NotAuthenticated`] - Intent needs a signed-in session.
    /// - [`SessionError::InvalidTransition`] - Intent does not apply to the current view.
    /// - [`SessionError::InsufficientFunds`] - Transfer or purchase exceeds the balance.
    /// - [`SessionError::InvalidAmount`] - Non-positive transfer or top-up amount.
    /// - [`SessionError::MissingField`] - Form is incomplete.
    /// - [`SessionError::NothingSelected`] - Utility payment with no bills.
    /// - [`SessionError::AppointmentNotFound`] - Reschedule or cancel of an unknown id.
    pub fn dispatch_at(&mut self, intent: Intent, now: Instant) -> Result<View, SessionError> {
        let name = intent.name();
        let result = self.apply(intent, now).and_then(|()| self.advance(now));
        if let Err(e) = &result {
            debug!(intent = name, view = %self.view(), error = %e, "intent rejected");
        } else {
            debug!(intent = name, view = %self.view(), "intent applied");
        }
        self.settle(result)
    }

    pub fn tick(&mut self) -> Result<View, SessionError> {
        self.tick_at(Instant::now())
    }

    /// Completes the in-flight operation if its deadline has passed.
    pub fn tick_at(&mut self, now: Instant) -> Result<View, SessionError> {
        if !self.gate.is_busy() {
            return Ok(self.view());
        }
        let result = self.advance(now);
        self.settle(result)
    }

    fn settle(&mut self, result: Result<(), SessionError>) -> Result<View, SessionError> {
        match result {
            Ok(()) => {
                self.inline_message = None;
                Ok(self.view())
            }
            Err(e) => {
                self.inline_message = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn apply(&mut self, intent: Intent, now: Instant) -> Result<(), SessionError> {
        if self.gate.is_busy() {
            return Err(SessionError::OperationInFlight);
        }

        if !self.authenticated && intent != Intent::SubmitCredentials {
            return Err(SessionError::NotAuthenticated);
        }

        match intent {
            Intent::SubmitCredentials => {
                self.expect_view(&[View::Login], &intent)?;
                self.defer(SimulatedOperation::Authentication, Deferred::SignIn, now)
            }
            Intent::Logout => {
                info!("signed out");
                *self = Navigator::new(self.config.clone());
                Ok(())
            }
            Intent::Navigate(view) => self.navigate(view, &intent),
            Intent::Back => self.back(),
            Intent::SelectService(ref service) => {
                self.expect_view(&[View::Services], &intent)?;
                self.select_service(service.clone());
                Ok(())
            }
            Intent::FillCase(ref input) => {
                self.expect_view(&[View::CaseCreation], &intent)?;
                if let Screen::CaseCreation(draft) = &mut self.screen {
                    draft.apply(input.clone());
                }
                Ok(())
            }
            Intent::ScanDocument(kind) => {
                self.expect_view(&[View::CaseCreation], &intent)?;
                self.defer(SimulatedOperation::DocumentScan, Deferred::Scan(kind), now)
            }
            Intent::ConfirmCase => self.confirm_case(),
            Intent::PayUtilities(ref bills) => {
                self.expect_view(&[View::Utilities], &intent)?;
                self.stage_utilities(bills)
            }
            Intent::PurchaseProduct(ref product) => {
                self.expect_view(&[View::TopUp], &intent)?;
                self.staging
                    .stage(PendingPayment::product(&product.name, product.price));
                self.open_payment();
                Ok(())
            }
            Intent::ConfirmPayment { amount } => {
                self.expect_view(&[View::Payment, View::TopUp], &intent)?;
                if amount.is_some_and(|a| a <= Decimal::ZERO) {
                    return Err(SessionError::InvalidAmount);
                }
                self.defer(
                    SimulatedOperation::PaymentProcessing,
                    Deferred::Payment { amount },
                    now,
                )
            }
            Intent::VerifyRecipient(ref recipient) => {
                self.expect_view(&[View::Transfer], &intent)?;
                if recipient.trim().is_empty() {
                    return Err(SessionError::MissingField("recipient"));
                }
                self.defer(
                    SimulatedOperation::RecipientVerification,
                    Deferred::Verify(recipient.clone()),
                    now,
                )
            }
            Intent::ConfirmTransfer { amount, recipient } => {
                self.confirm_transfer(amount, &recipient)
            }
            Intent::StartReschedule(ref id) => {
                self.expect_view(&[View::Appointments], &intent)?;
                let appointment = self.ledger.appointments().get(id).cloned().ok_or_else(|| {
                    warn!(appointment = %id, "reschedule target not found");
                    SessionError::AppointmentNotFound(id.clone())
                })?;
                // Only upcoming appointments can be moved.
                if appointment.status != AppointmentStatus::Upcoming {
                    return Err(self.invalid(intent.name()));
                }
                self.screen = Screen::RescheduleAppointment(appointment);
                Ok(())
            }
            Intent::ConfirmBooking(request) => self.confirm_booking(request),
            Intent::CancelAppointment(ref id) => {
                self.expect_view(&[View::Appointments], &intent)?;
                self.ledger.appointments_mut().cancel(id).inspect_err(|_| {
                    warn!(appointment = %id, "cancel target not found");
                })?;
                info!(appointment = %id, "appointment cancelled");
                Ok(())
            }
            Intent::NavigateToLocation(ref location) => {
                self.expect_view(&[View::FreeParking], &intent)?;
                self.screen = Screen::Map(location.clone());
                Ok(())
            }
            Intent::AddZone { ref name, ref sector } => {
                self.expect_view(&[View::Profile], &intent)?;
                self.add_zone(name, sector)
            }
            Intent::SetActiveZone(ref id) => {
                self.expect_view(&[View::Profile, View::ParkingManagement], &intent)?;
                if let Err(e) = self.ledger.set_active_zone(id) {
                    warn!(zone = %id, error = %e, "falling back to first parking zone");
                    self.ledger.reset_active_zone();
                }
                Ok(())
            }
            Intent::CloseConfirmation => {
                self.expect_view(&[View::Confirmation], &intent)?;
                self.screen = Screen::Dashboard;
                Ok(())
            }
        }
    }

    fn expect_view(&self, allowed: &[View], intent: &Intent) -> Result<(), SessionError> {
        if allowed.contains(&self.view()) {
            Ok(())
        } else {
            Err(self.invalid(intent.name()))
        }
    }

    fn invalid(&self, intent: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            from: self.view(),
            intent,
        }
    }

    fn defer(
        &mut self,
        operation: SimulatedOperation,
        work: Deferred,
        now: Instant,
    ) -> Result<(), SessionError> {
        self.gate.start(operation, work, now)?;
        debug!(?operation, "simulated operation started");
        Ok(())
    }

    fn advance(&mut self, now: Instant) -> Result<(), SessionError> {
        let Some((operation, work)) = self.gate.poll(now) else {
            return Ok(());
        };
        debug!(?operation, "simulated operation completed");

        match work {
            Deferred::SignIn => {
                self.authenticated = true;
                self.screen = Screen::Dashboard;
                info!("signed in");
                Ok(())
            }
            Deferred::Scan(kind) => {
                if let Screen::CaseCreation(draft) = &mut self.screen {
                    draft.record_scan(kind);
                }
                Ok(())
            }
            Deferred::Payment { amount } => self.complete_payment(amount),
            Deferred::Verify(recipient) => {
                if let Screen::Transfer(draft) = &mut self.screen {
                    let label = TransferDraft::verification_label(&recipient);
                    draft.verified_recipient = Some(label.to_owned());
                }
                Ok(())
            }
        }
    }

    fn navigate(&mut self, view: View, intent: &Intent) -> Result<(), SessionError> {
        let screen = Screen::fresh(view).ok_or_else(|| self.invalid(intent.name()))?;
        self.leave_payment();
        self.screen = screen;
        Ok(())
    }

    fn back(&mut self) -> Result<(), SessionError> {
        if let Screen::Payment { return_to } = &mut self.screen {
            let previous = mem::replace(return_to.as_mut(), Screen::Dashboard);
            self.staging.clear();
            debug!(view = %previous.view(), "payment abandoned");
            self.screen = previous;
            return Ok(());
        }

        let parent = self.view().parent();
        let screen = Screen::fresh(parent).ok_or_else(|| self.invalid("go back"))?;
        self.screen = screen;
        Ok(())
    }

    /// Dropping the Payment screen abandons its staged payment.
    fn leave_payment(&mut self) {
        if self.view() == View::Payment {
            self.staging.clear();
        }
    }

    fn open_payment(&mut self) {
        let previous = mem::replace(&mut self.screen, Screen::Dashboard);
        self.screen = Screen::Payment {
            return_to: Box::new(previous),
        };
    }

    fn select_service(&mut self, service: ServiceItem) {
        self.screen = match service.title.as_str() {
            FREE_PARKING_FINDER => Screen::FreeParking,
            TRANSPORT_PASS => Screen::TopUp,
            _ => Screen::CaseCreation(CaseDraft::new(service)),
        };
    }

    fn confirm_case(&mut self) -> Result<(), SessionError> {
        let Screen::CaseCreation(draft) = &self.screen else {
            return Err(self.invalid("confirm the case"));
        };
        if let Some(field) = draft.missing_field() {
            return Err(SessionError::MissingField(field));
        }
        let service = draft.service.clone();

        if !service.is_free {
            let fee = self.config.service_fee;
            self.staging.stage(PendingPayment::new(
                fee,
                format!("Service Registration Fee: {}", service.title),
            ));
            self.open_payment();
            return Ok(());
        }

        let (details, notice) = assignment_for(service.category).unzip();
        if let Some(notice) = notice {
            self.ledger.push_notification(notice);
        }
        let record = ConfirmationRecord::build(
            ConfirmationKind::ServiceRegistration,
            "Registration Complete",
            format!(
                "Your request for {} has been confirmed. See assignment details below.",
                service.title
            ),
            None,
            details,
        );
        info!(service = %service.title, receipt = %record.id, "service registered");
        self.screen = Screen::Confirmation(record);
        Ok(())
    }

    fn stage_utilities(&mut self, bills: &[UtilityBill]) -> Result<(), SessionError> {
        if bills.is_empty() {
            return Err(SessionError::NothingSelected);
        }
        let total = bills
            .iter()
            .try_fold(Decimal::ZERO, |acc, b| acc.checked_add(b.amount))
            .ok_or(SessionError::InvalidAmount)?;
        let providers = bills
            .iter()
            .map(|b| b.provider.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        self.staging.stage(PendingPayment::new(
            to_cents(total),
            format!("Consolidated Utility Payment for: {providers}"),
        ));
        self.open_payment();
        Ok(())
    }

    fn complete_payment(&mut self, amount: Option<Decimal>) -> Result<(), SessionError> {
        let staged = self.staging.peek().cloned();
        let is_product = staged.as_ref().is_some_and(|p| p.is_product_purchase);

        let record = if is_product {
            let payment = staged.unwrap_or_default();
            let name = payment.product_name.clone().unwrap_or_default();
            self.ledger.purchase_pass(&name, payment.amount)?;
            self.staging.clear();
            info!(product = %name, price = %payment.amount, "transport product purchased");
            ConfirmationRecord::build(
                ConfirmationKind::ProductPurchase,
                "Pass Purchased",
                format!(
                    "You have successfully purchased: {name}. It is now active on your digital identity."
                ),
                Some(payment.amount),
                None,
            )
        } else if self.view() == View::TopUp {
            let value = amount
                .or(staged.map(|p| p.amount))
                .unwrap_or(Decimal::ZERO);
            self.ledger.credit(value)?;
            self.staging.clear();
            info!(amount = %value, balance = %self.ledger.balance(), "wallet topped up");
            ConfirmationRecord::build(
                ConfirmationKind::WalletTopUp,
                "Wallet Topped Up",
                format!(
                    "Your wallet balance has been updated. New balance: {} MDL.",
                    to_cents(self.ledger.balance())
                ),
                Some(value),
                None,
            )
        } else {
            let payment = self.staging.consume();
            let value = amount.unwrap_or(payment.amount);
            let description = if payment.description.is_empty() {
                "Municipal Service".to_owned()
            } else {
                payment.description
            };
            info!(amount = %value, %description, "payment completed");
            ConfirmationRecord::build(
                ConfirmationKind::Payment,
                "Payment Successful",
                format!("Transaction completed for: {description}."),
                Some(value),
                None,
            )
        };

        self.screen = Screen::Confirmation(record);
        Ok(())
    }

    fn confirm_transfer(&mut self, amount: Decimal, recipient: &str) -> Result<(), SessionError> {
        let Screen::Transfer(draft) = &self.screen else {
            return Err(self.invalid("confirm transfer"));
        };
        if amount <= Decimal::ZERO {
            return Err(SessionError::InvalidAmount);
        }
        if recipient.trim().is_empty() {
            return Err(SessionError::MissingField("recipient"));
        }
        let label = draft
            .verified_recipient
            .clone()
            .unwrap_or_else(|| recipient.to_owned());

        self.ledger.debit(amount)?;
        info!(amount = %amount, recipient = %label, "transfer sent");

        let record = ConfirmationRecord::build(
            ConfirmationKind::Transfer,
            "Transfer Sent",
            format!(
                "You have successfully transferred {} MDL to {label}.",
                to_cents(amount)
            ),
            Some(amount),
            None,
        );
        self.screen = Screen::Confirmation(record);
        Ok(())
    }

    fn confirm_booking(&mut self, mut request: BookingRequest) -> Result<(), SessionError> {
        match &self.screen {
            Screen::BookAppointment => {
                if let Some(field) = request.missing_field() {
                    return Err(SessionError::MissingField(field));
                }
                let appointment = self.ledger.appointments_mut().book(request);
                info!(appointment = %appointment.id, service = %appointment.service, "appointment booked");
            }
            Screen::RescheduleAppointment(existing) => {
                // The service is fixed when rescheduling.
                request.service = existing.service.clone();
                if let Some(field) = request.missing_field() {
                    return Err(SessionError::MissingField(field));
                }
                let id = existing.id.clone();
                let appointment = self
                    .ledger
                    .appointments_mut()
                    .reschedule(&id, request.date, request.time, request.location)
                    .inspect_err(|_| warn!(appointment = %id, "reschedule target not found"))?;
                info!(appointment = %appointment.id, date = %appointment.date, time = %appointment.time, "appointment rescheduled");
            }
            _ => return Err(self.invalid("confirm the booking")),
        }
        self.screen = Screen::Appointments;
        Ok(())
    }

    fn add_zone(&mut self, name: &str, sector: &str) -> Result<(), SessionError> {
        let name = name.trim();
        let sector = sector.trim();
        if name.is_empty() {
            return Err(SessionError::MissingField("zone name"));
        }
        if sector.is_empty() {
            return Err(SessionError::MissingField("sector"));
        }
        let id = self.ledger.next_zone_id();
        let rules = if sector == "Centru" {
            "Paid Zone (10 MDL/h)"
        } else {
            "Residential Zone"
        };
        info!(zone = %id, name, sector, "parking zone added");
        self.ledger.add_zone(ParkingZone {
            id,
            name: name.to_owned(),
            sector: sector.to_owned(),
            address: "Selectable via Maps".to_owned(),
            is_subsidized: sector == "Ciocana",
            rules: rules.to_owned(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn signed_in() -> Navigator {
        let mut nav = Navigator::new(SessionConfig::default().instant());
        nav.dispatch(Intent::SubmitCredentials).unwrap();
        nav
    }

    #[test]
    fn view_names_round_trip_through_from_str() {
        for view in View::ALL {
            assert_eq!(view.as_str().parse::<View>().unwrap(), view);
        }
        assert_eq!("Top-Up".parse::<View>().unwrap(), View::TopUp);
        assert!("nowhere".parse::<View>().is_err());
    }

    #[test]
    fn context_views_have_no_fresh_screen() {
        for view in View::ALL {
            assert_eq!(Screen::fresh(view).is_none(), view.needs_context(), "{view}");
            if let Some(screen) = Screen::fresh(view) {
                assert_eq!(screen.view(), view);
            }
        }
    }

    #[test]
    fn sign_in_waits_for_latency() {
        let mut nav = Navigator::new(SessionConfig::default());
        let start = Instant::now();

        let view = nav.dispatch_at(Intent::SubmitCredentials, start).unwrap();
        assert_eq!(view, View::Login);
        assert_eq!(nav.in_flight(), Some(SimulatedOperation::Authentication));

        // The login button is disabled while authenticating.
        let again = nav.dispatch_at(Intent::SubmitCredentials, start);
        assert_eq!(again, Err(SessionError::OperationInFlight));

        assert_eq!(nav.tick_at(start + Duration::from_millis(799)).unwrap(), View::Login);
        assert_eq!(nav.tick_at(start + Duration::from_millis(800)).unwrap(), View::Dashboard);
        assert!(nav.is_authenticated());
    }

    #[test]
    fn intents_require_authentication() {
        let mut nav = Navigator::new(SessionConfig::default().instant());
        let result = nav.dispatch(Intent::Navigate(View::Services));
        assert_eq!(result, Err(SessionError::NotAuthenticated));
        assert_eq!(nav.inline_message(), Some("not signed in"));
    }

    #[test]
    fn inline_message_clears_on_next_success() {
        let mut nav = signed_in();
        nav.dispatch(Intent::CloseConfirmation).unwrap_err();
        assert!(nav.inline_message().is_some());

        nav.dispatch(Intent::Navigate(View::Services)).unwrap();
        assert_eq!(nav.inline_message(), None);
    }

    #[test]
    fn back_follows_parent_chain() {
        let mut nav = signed_in();
        nav.dispatch(Intent::Navigate(View::Settings)).unwrap();
        assert_eq!(nav.dispatch(Intent::Back).unwrap(), View::Profile);
        assert_eq!(nav.dispatch(Intent::Back).unwrap(), View::Dashboard);

        nav.dispatch(Intent::Navigate(View::Transfer)).unwrap();
        assert_eq!(nav.dispatch(Intent::Back).unwrap(), View::TopUp);
    }

    #[test]
    fn document_scan_marks_draft() {
        let mut nav = signed_in();
        nav.dispatch(Intent::Navigate(View::Services)).unwrap();
        let service = crate::catalog::find_service(&crate::catalog::default_services(), "Social Benefits")
            .unwrap()
            .clone();
        nav.dispatch(Intent::SelectService(service)).unwrap();

        assert_eq!(
            nav.dispatch(Intent::ConfirmCase),
            Err(SessionError::MissingField("identity scan"))
        );
        nav.dispatch(Intent::ScanDocument(DocumentKind::Identity)).unwrap();
        match nav.screen() {
            Screen::CaseCreation(draft) => assert!(draft.identity_scanned),
            other => panic!("unexpected screen {other:?}"),
        }
        assert_eq!(nav.dispatch(Intent::ConfirmCase).unwrap(), View::Confirmation);
    }

    #[test]
    fn recipient_verification_sets_label() {
        let mut nav = signed_in();
        nav.dispatch(Intent::Navigate(View::Transfer)).unwrap();
        nav.dispatch(Intent::VerifyRecipient("2004012345678".to_owned())).unwrap();
        nav.dispatch(Intent::ConfirmTransfer {
            amount: dec!(20),
            recipient: "2004012345678".to_owned(),
        })
        .unwrap();

        let record = nav.confirmation().unwrap();
        assert!(record.description.ends_with("to ALEXANDRU M. (Verified eID)."));
        assert_eq!(nav.ledger().balance(), dec!(480));
    }

    #[test]
    fn snapshot_reflects_ledger() {
        let nav = signed_in();
        let snapshot = nav.snapshot();
        assert_eq!(snapshot.view, View::Dashboard);
        assert_eq!(snapshot.balance, dec!(500));
        assert_eq!(snapshot.active_zone.as_deref(), Some("Home (Ciocana)"));
        assert_eq!(snapshot.appointments.len(), 1);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["view"], "dashboard");
        assert_eq!(json["balance"], "500");
    }
}
