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

use clap::{Parser, ValueEnum};
use csv::{ReaderBuilder, Trim, Writer};
use munapp_core::catalog::{
    FreeParkingLocation, ServiceItem, TransportProduct, UtilityBill, default_parking_locations,
    default_products, default_services, default_utility_bills, find_service,
};
use munapp_core::{
    AppointmentId, AppointmentStatus, BookingRequest, CaseInput, ConfirmationRecord, DocumentKind,
    Intent, Navigator, ReceiptType, SessionConfig, SessionError, View, ZoneId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// MUNAPP session driver - Replay citizen actions from a CSV script
///
/// Runs every action against a fresh in-memory session and prints a CSV
/// report to stdout. Rejected actions are logged and skipped.
#[derive(Parser, Debug)]
#[command(name = "munapp-core")]
#[command(about = "Replays a script of citizen actions against an in-memory session", long_about = None)]
struct Args {
    /// Path to CSV script
    ///
    /// Expected format: action,arg,amount,date,time,location
    /// Example: cargo run -- script.csv --report wallet
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Session configuration (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Skip the simulated authentication, scan and payment delays
    #[arg(long)]
    instant: bool,

    /// Which report to print
    #[arg(long, value_enum, default_value_t = Report::Receipts)]
    report: Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Report {
    /// Every confirmation produced, in order
    Receipts,
    /// Final appointment list
    Appointments,
    /// Final wallet state
    Wallet,
}

fn main() {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match SessionConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => SessionConfig::default(),
    };
    let config = if args.instant { config.instant() } else { config };

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let run = match replay(BufReader::new(file), config) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("Error replaying script: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_report(&run, args.report, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Logs go to stderr so stdout stays valid CSV.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

#[derive(Error, Debug, PartialEq, Eq)]
enum ScriptError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("missing {0}")]
    Missing(&'static str),

    #[error("unknown {kind} '{value}'")]
    Unknown { kind: &'static str, value: String },
}

/// Catalog entries the script refers to by title or id.
struct Catalog {
    services: Vec<ServiceItem>,
    products: Vec<TransportProduct>,
    bills: Vec<UtilityBill>,
    locations: Vec<FreeParkingLocation>,
}

impl Catalog {
    fn stock() -> Self {
        Self {
            services: default_services(),
            products: default_products(),
            bills: default_utility_bills(),
            locations: default_parking_locations(),
        }
    }
}

/// Raw CSV record matching the script format.
///
/// Fields: `action, arg, amount, date, time, location`
#[derive(Debug, Deserialize)]
struct ScriptRecord {
    action: String,
    #[serde(default)]
    arg: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

impl ScriptRecord {
    fn arg(&self, what: &'static str) -> Result<String, ScriptError> {
        self.arg.clone().ok_or(ScriptError::Missing(what))
    }

    /// Converts a script row to the intent a view would send.
    fn into_intent(self, catalog: &Catalog) -> Result<Intent, ScriptError> {
        let intent = match self.action.to_lowercase().as_str() {
            "login" => Intent::SubmitCredentials,
            "logout" => Intent::Logout,
            "back" => Intent::Back,
            "navigate" => {
                let name = self.arg("view")?;
                let view = name.parse::<View>().map_err(|_| ScriptError::Unknown {
                    kind: "view",
                    value: name,
                })?;
                Intent::Navigate(view)
            }
            "select_service" => {
                let title = self.arg("service")?;
                let service = find_service(&catalog.services, &title)
                    .ok_or(ScriptError::Unknown {
                        kind: "service",
                        value: title.clone(),
                    })?;
                Intent::SelectService(service.clone())
            }
            "fill_case" => Intent::FillCase(parse_case_input(&self.arg("field:value")?)?),
            "scan" => {
                let kind = match self.arg("document")?.as_str() {
                    "identity" => DocumentKind::Identity,
                    "birth_certificate" => DocumentKind::BirthCertificate,
                    other => {
                        return Err(ScriptError::Unknown {
                            kind: "document",
                            value: other.to_owned(),
                        });
                    }
                };
                Intent::ScanDocument(kind)
            }
            "confirm_case" => Intent::ConfirmCase,
            "pay_utilities" => {
                let ids = self.arg("bill ids")?;
                let bills = ids
                    .split(';')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(|id| {
                        catalog
                            .bills
                            .iter()
                            .find(|b| b.id == id)
                            .cloned()
                            .ok_or_else(|| ScriptError::Unknown {
                                kind: "bill",
                                value: id.to_owned(),
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Intent::PayUtilities(bills)
            }
            "purchase" => {
                let name = self.arg("product")?;
                let product = catalog
                    .products
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(&name))
                    .cloned()
                    .ok_or(ScriptError::Unknown {
                        kind: "product",
                        value: name,
                    })?;
                Intent::PurchaseProduct(product)
            }
            "confirm_payment" => Intent::ConfirmPayment {
                amount: self.amount,
            },
            "verify_recipient" => Intent::VerifyRecipient(self.arg("recipient")?),
            "transfer" => Intent::ConfirmTransfer {
                recipient: self.arg("recipient")?,
                amount: self.amount.ok_or(ScriptError::Missing("amount"))?,
            },
            "reschedule" => Intent::StartReschedule(AppointmentId(self.arg("appointment id")?)),
            "book" => Intent::ConfirmBooking(BookingRequest::new(
                self.arg.unwrap_or_default(),
                self.date.unwrap_or_default(),
                self.time.unwrap_or_default(),
                self.location.unwrap_or_default(),
            )),
            "cancel" => Intent::CancelAppointment(AppointmentId(self.arg("appointment id")?)),
            "open_map" => {
                let id = self.arg("location id")?;
                let location = catalog
                    .locations
                    .iter()
                    .find(|l| l.id == id)
                    .cloned()
                    .ok_or(ScriptError::Unknown {
                        kind: "location",
                        value: id,
                    })?;
                Intent::NavigateToLocation(location)
            }
            "add_zone" => Intent::AddZone {
                name: self.arg("zone name")?,
                sector: self.location.ok_or(ScriptError::Missing("sector"))?,
            },
            "set_zone" => Intent::SetActiveZone(ZoneId(self.arg("zone id")?)),
            "close" => Intent::CloseConfirmation,
            _ => return Err(ScriptError::UnknownAction(self.action)),
        };
        Ok(intent)
    }
}

/// Parses `field:value`, e.g. `child_name:Ion Popescu`.
fn parse_case_input(raw: &str) -> Result<CaseInput, ScriptError> {
    let (field, value) = raw.split_once(':').ok_or(ScriptError::Missing("field:value"))?;
    let value = value.trim().to_owned();
    let input = match field.trim() {
        "institution" => CaseInput::Institution(value),
        "child_name" => CaseInput::ChildName(value),
        "child_eid" => CaseInput::ChildEid(value),
        "location" => CaseInput::Location(value),
        "new_address" => CaseInput::NewAddress(value),
        "change_reason" => CaseInput::ChangeReason(value),
        "comments" => CaseInput::Comments(value),
        other => {
            return Err(ScriptError::Unknown {
                kind: "case field",
                value: other.to_owned(),
            });
        }
    };
    Ok(input)
}

/// Session after a script has run, plus every receipt it produced.
struct Replay {
    navigator: Navigator,
    receipts: Vec<ConfirmationRecord>,
}

/// Replays a CSV script against a fresh session.
///
/// Rows that don't parse and intents the session rejects are logged and
/// skipped, so one bad row does not abort the run. Deferred operations
/// (sign-in, scans, payments) are waited out in real time unless the
/// config has instant latency.
///
/// # Example
///
/// ```csv
/// action,arg,amount,date,time,location
/// login,,,,,
/// navigate,top_up,,,,
/// confirm_payment,,100,,,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails.
fn replay<R: Read>(reader: R, config: SessionConfig) -> Result<Replay, csv::Error> {
    let catalog = Catalog::stock();
    let mut navigator = Navigator::new(config);
    let mut receipts: Vec<ConfirmationRecord> = Vec::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true) // trailing columns may be omitted
        .has_headers(true)
        .from_reader(reader);

    for (row, result) in rdr.deserialize::<ScriptRecord>().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(row, error = %e, "skipping malformed row");
                continue;
            }
        };

        let intent = match record.into_intent(&catalog) {
            Ok(intent) => intent,
            Err(e) => {
                warn!(row, error = %e, "skipping invalid action");
                continue;
            }
        };

        let before = navigator.view();
        let outcome = navigator.dispatch(intent);
        match run_to_completion(&mut navigator, outcome) {
            Ok(view) => debug!(row, %view, "row applied"),
            Err(e) => warn!(row, error = %e, "action rejected"),
        }

        if let Some(record) = new_confirmation(&navigator, before) {
            receipts.push(record.clone());
        }
    }

    Ok(Replay {
        navigator,
        receipts,
    })
}

/// Receipt produced by the last row, if the row moved the session onto the
/// Confirmation screen. Ids are random and may repeat, so they are not used
/// to tell receipts apart.
fn new_confirmation(navigator: &Navigator, before: View) -> Option<&ConfirmationRecord> {
    if before == View::Confirmation {
        return None;
    }
    navigator.confirmation()
}

/// Sleeps until the in-flight operation is due, then completes it.
fn run_to_completion(
    navigator: &mut Navigator,
    mut outcome: Result<View, SessionError>,
) -> Result<View, SessionError> {
    while let Some(deadline) = navigator.next_deadline() {
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
        outcome = navigator.tick();
    }
    outcome
}

#[derive(Debug, Serialize)]
struct ReceiptRow<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    receipt_type: ReceiptType,
    title: &'a str,
    amount: Option<Decimal>,
    description: &'a str,
    time: Option<&'a str>,
    office: Option<&'a str>,
    street: Option<&'a str>,
    professional: Option<&'a str>,
}

impl<'a> From<&'a ConfirmationRecord> for ReceiptRow<'a> {
    fn from(record: &'a ConfirmationRecord) -> Self {
        let details = record.details.as_ref();
        ReceiptRow {
            id: record.id.as_str(),
            receipt_type: record.receipt_type,
            title: &record.title,
            amount: record.amount,
            description: &record.description,
            time: details.and_then(|d| d.time.as_deref()),
            office: details.and_then(|d| d.office.as_deref()),
            street: details.and_then(|d| d.street.as_deref()),
            professional: details.and_then(|d| d.professional.as_deref()),
        }
    }
}

#[derive(Debug, Serialize)]
struct AppointmentRow<'a> {
    id: &'a str,
    service: &'a str,
    date: &'a str,
    time: &'a str,
    location: &'a str,
    status: AppointmentStatus,
}

#[derive(Debug, Serialize)]
struct WalletRow {
    balance: Decimal,
    active_pass: Option<String>,
    active_zone: Option<String>,
    zones: usize,
    appointments: usize,
    notifications: usize,
}

/// Writes the chosen report as CSV.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
fn write_report<W: Write>(run: &Replay, report: Report, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    match report {
        Report::Receipts => {
            for record in &run.receipts {
                wtr.serialize(ReceiptRow::from(record))?;
            }
        }
        Report::Appointments => {
            for appointment in run.navigator.ledger().appointments().list() {
                wtr.serialize(AppointmentRow {
                    id: appointment.id.as_str(),
                    service: &appointment.service,
                    date: &appointment.date,
                    time: &appointment.time,
                    location: &appointment.location,
                    status: appointment.status,
                })?;
            }
        }
        Report::Wallet => {
            let snapshot = run.navigator.snapshot();
            wtr.serialize(WalletRow {
                balance: snapshot.balance,
                active_pass: snapshot.active_pass,
                active_zone: snapshot.active_zone,
                zones: snapshot.zones.len(),
                appointments: snapshot.appointments.len(),
                notifications: snapshot.notifications.len(),
            })?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    const HEADER: &str = "action,arg,amount,date,time,location\n";

    fn run(script: &str) -> Replay {
        let csv = format!("{HEADER}{script}");
        replay(Cursor::new(csv), SessionConfig::default().instant()).unwrap()
    }

    #[test]
    fn top_up_script_credits_wallet() {
        let run = run("login,,,,,\n\
                       navigate,top_up,,,,\n\
                       confirm_payment,,100,,,\n");

        assert_eq!(run.navigator.ledger().balance(), dec!(600));
        assert_eq!(run.receipts.len(), 1);
        assert_eq!(run.receipts[0].id.prefix(), "WAL");
    }

    #[test]
    fn short_rows_are_accepted() {
        let run = run("login\nnavigate,transfer\ntransfer,Ion,25\n");
        assert_eq!(run.navigator.ledger().balance(), dec!(475));
        assert_eq!(run.receipts[0].id.prefix(), "XFR");
    }

    #[test]
    fn rejected_actions_are_skipped() {
        let run = run("login,,,,,\n\
                       navigate,transfer,,,,\n\
                       transfer,Ion,1000,,,\n\
                       transfer,Ion,50,,,\n");

        assert_eq!(run.navigator.ledger().balance(), dec!(450));
        assert_eq!(run.receipts.len(), 1);
    }

    #[test]
    fn unknown_actions_are_skipped() {
        let run = run("login,,,,,\n\
                       fly,,,,,\n\
                       navigate,nowhere,,,,\n\
                       navigate,services,,,,\n");
        assert_eq!(run.navigator.view(), View::Services);
    }

    #[test]
    fn utility_script_produces_generic_receipt() {
        let run = run("login,,,,,\n\
                       navigate,utilities,,,,\n\
                       pay_utilities,elec;water,,,,\n\
                       confirm_payment,,,,,\n\
                       close,,,,,\n");

        assert_eq!(run.receipts.len(), 1);
        let receipt = &run.receipts[0];
        assert_eq!(receipt.id.prefix(), "MPAY");
        assert_eq!(receipt.amount, Some(dec!(635.50)));
        assert!(receipt.description.contains("Premier Energy, Apă-Canal Chișinău"));
        assert_eq!(run.navigator.view(), View::Dashboard);
    }

    #[test]
    fn booking_script_reschedules_in_place() {
        let run = run("login,,,,,\n\
                       navigate,appointments,,,,\n\
                       reschedule,APT-9921,,,,\n\
                       book,,,\"Monday, Oct 30\",10:30 AM,Chisinau City Hall\n");

        let list = run.navigator.ledger().appointments().list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, AppointmentId::from("APT-9921"));
        assert_eq!(list[0].date, "Monday, Oct 30");
        assert_eq!(list[0].status, AppointmentStatus::Upcoming);
    }

    #[test]
    fn case_input_parsing() {
        assert_eq!(
            parse_case_input("child_name: Ion Popescu").unwrap(),
            CaseInput::ChildName("Ion Popescu".to_owned())
        );
        assert_eq!(
            parse_case_input("child_name"),
            Err(ScriptError::Missing("field:value"))
        );
        assert!(matches!(
            parse_case_input("shoe_size:42"),
            Err(ScriptError::Unknown { .. })
        ));
    }

    #[test]
    fn receipts_report_has_header_and_rows() {
        let run = run("login,,,,,\n\
                       navigate,services,,,,\n\
                       select_service,Family Doctor Center (CMF),,,,\n\
                       confirm_case,,,,,\n");

        let mut output = Vec::new();
        write_report(&run, Report::Receipts, &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.starts_with(
            "id,type,title,amount,description,time,office,street,professional\n"
        ));
        assert!(output.contains("SRV-"));
        assert!(output.contains("Dr. Elena Ionescu"));
    }

    #[test]
    fn receipt_detected_by_screen_change() {
        let mut nav = Navigator::new(SessionConfig::default().instant());
        nav.dispatch(Intent::SubmitCredentials).unwrap();
        nav.dispatch(Intent::Navigate(View::TopUp)).unwrap();
        nav.dispatch(Intent::ConfirmPayment {
            amount: Some(dec!(10)),
        })
        .unwrap();

        assert!(new_confirmation(&nav, View::TopUp).is_some());
        assert!(new_confirmation(&nav, View::Confirmation).is_none());
    }

    #[test]
    fn consecutive_receipts_are_all_reported() {
        let run = run("login,,,,,\n\
                       navigate,top_up,,,,\n\
                       confirm_payment,,10,,,\n\
                       close,,,,,\n\
                       navigate,top_up,,,,\n\
                       confirm_payment,,10,,,\n\
                       navigate,top_up,,,,\n\
                       confirm_payment,,10,,,\n\
                       back,,,,,\n");

        assert_eq!(run.receipts.len(), 3);
        assert_eq!(run.navigator.ledger().balance(), dec!(530));
    }

    #[test]
    fn wallet_report_single_row() {
        let run = run("login,,,,,\n");
        let mut output = Vec::new();
        write_report(&run, Report::Wallet, &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();

        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("balance,active_pass,active_zone,zones,appointments,notifications")
        );
        assert_eq!(lines.next(), Some("500,,Home (Ciocana),2,1,0"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn appointments_report_lists_seed() {
        let run = run("login,,,,,\n");
        let mut output = Vec::new();
        write_report(&run, Report::Appointments, &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("APT-9921,Property Registration Inquiry"));
        assert!(output.contains("Upcoming"));
    }
}
