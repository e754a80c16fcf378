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

//! Flow-scoped context carried by a screen while a multi-step task is open.

use crate::catalog::{RESIDENCE_CHANGE, ServiceCategory, ServiceItem};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentKind {
    Identity,
    BirthCertificate,
}

/// One edit on the case creation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseInput {
    Institution(String),
    ChildName(String),
    ChildEid(String),
    Location(String),
    NewAddress(String),
    ChangeReason(String),
    Comments(String),
}

/// Case being filled in for a selected service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseDraft {
    pub service: ServiceItem,
    pub institution: Option<String>,
    pub child_name: String,
    pub child_eid: String,
    pub location: String,
    pub new_address: String,
    pub change_reason: String,
    pub comments: String,
    pub identity_scanned: bool,
    pub birth_certificate_scanned: bool,
}

impl CaseDraft {
    pub const DEFAULT_LOCATION: &'static str = "Centru";

    pub fn new(service: ServiceItem) -> Self {
        Self {
            service,
            institution: None,
            child_name: String::new(),
            child_eid: String::new(),
            location: Self::DEFAULT_LOCATION.to_owned(),
            new_address: String::new(),
            change_reason: String::new(),
            comments: String::new(),
            identity_scanned: false,
            birth_certificate_scanned: false,
        }
    }

    pub fn apply(&mut self, input: CaseInput) {
        match input {
            CaseInput::Institution(id) => {
                self.institution = Some(id).filter(|id| !id.trim().is_empty());
            }
            CaseInput::ChildName(name) => self.child_name = name,
            CaseInput::ChildEid(eid) => self.child_eid = eid,
            // Institutions are listed per sector, so a new sector drops the pick.
            CaseInput::Location(location) => {
                if location != self.location {
                    self.institution = None;
                }
                self.location = location;
            }
            CaseInput::NewAddress(address) => self.new_address = address,
            CaseInput::ChangeReason(reason) => self.change_reason = reason,
            CaseInput::Comments(comments) => self.comments = comments,
        }
    }

    pub fn record_scan(&mut self, kind: DocumentKind) {
        match kind {
            DocumentKind::Identity => self.identity_scanned = true,
            DocumentKind::BirthCertificate => self.birth_certificate_scanned = true,
        }
    }

    /// First requirement still unmet, or `None` when the case can be confirmed.
    ///
    /// | Service | Requires |
    /// |---------|----------|
    /// | education | institution, child name, child eID, identity and birth certificate scans |
    /// | Residence Change | location, new address, reason, identity scan |
    /// | social | identity scan |
    pub fn missing_field(&self) -> Option<&'static str> {
        let blank = |value: &str| value.trim().is_empty();

        if self.service.category == Some(ServiceCategory::Education) {
            if self.institution.is_none() {
                return Some("institution");
            }
            if blank(&self.child_name) {
                return Some("child name");
            }
            if blank(&self.child_eid) {
                return Some("child eID");
            }
            if !self.identity_scanned {
                return Some("identity scan");
            }
            if !self.birth_certificate_scanned {
                return Some("birth certificate scan");
            }
            return None;
        }

        if self.service.title == RESIDENCE_CHANGE {
            if blank(&self.location) {
                return Some("location");
            }
            if blank(&self.new_address) {
                return Some("new address");
            }
            if blank(&self.change_reason) {
                return Some("change reason");
            }
            if !self.identity_scanned {
                return Some("identity scan");
            }
            return None;
        }

        if self.service.category == Some(ServiceCategory::Social) && !self.identity_scanned {
            return Some("identity scan");
        }
        None
    }
}

/// Transfer form state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferDraft {
    pub verified_recipient: Option<String>,
}

impl TransferDraft {
    /// Name the eID registry lookup resolves a recipient id to.
    pub fn verification_label(recipient: &str) -> &'static str {
        if recipient.chars().count() > 5 {
            "ALEXANDRU M. (Verified eID)"
        } else {
            "Recipient ID Valid"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{default_services, find_service};

    fn draft(title: &str) -> CaseDraft {
        let services = default_services();
        CaseDraft::new(find_service(&services, title).unwrap().clone())
    }

    #[test]
    fn health_case_has_no_requirements() {
        assert_eq!(draft("Family Doctor Center (CMF)").missing_field(), None);
    }

    #[test]
    fn enrollment_needs_every_field_and_both_scans() {
        let mut case = draft("School Registration");
        assert_eq!(case.missing_field(), Some("institution"));

        case.apply(CaseInput::Institution("S-C3".to_owned()));
        case.apply(CaseInput::ChildName("Ion".to_owned()));
        case.apply(CaseInput::ChildEid("2009001234567".to_owned()));
        assert_eq!(case.missing_field(), Some("identity scan"));

        case.record_scan(DocumentKind::Identity);
        assert_eq!(case.missing_field(), Some("birth certificate scan"));

        case.record_scan(DocumentKind::BirthCertificate);
        assert_eq!(case.missing_field(), None);
    }

    #[test]
    fn changing_sector_clears_institution() {
        let mut case = draft("Kindergarten Registration");
        case.apply(CaseInput::Institution("K-C2".to_owned()));
        case.apply(CaseInput::Location("Ciocana".to_owned()));
        assert_eq!(case.institution, None);
        assert_eq!(case.location, "Ciocana");
    }

    #[test]
    fn residence_change_requirements() {
        let mut case = draft(RESIDENCE_CHANGE);
        assert_eq!(case.missing_field(), Some("new address"));

        case.apply(CaseInput::NewAddress("Str. Ștefan cel Mare 10, ap. 5".to_owned()));
        case.apply(CaseInput::ChangeReason("Rental Lease Agreement".to_owned()));
        assert_eq!(case.missing_field(), Some("identity scan"));

        case.record_scan(DocumentKind::Identity);
        assert_eq!(case.missing_field(), None);
    }

    #[test]
    fn social_case_needs_identity_scan() {
        let mut case = draft("Social Benefits");
        assert_eq!(case.missing_field(), Some("identity scan"));
        case.record_scan(DocumentKind::Identity);
        assert_eq!(case.missing_field(), None);
    }

    #[test]
    fn verification_label_depends_on_id_length() {
        assert_eq!(
            TransferDraft::verification_label("2004012345678"),
            "ALEXANDRU M. (Verified eID)"
        );
        assert_eq!(TransferDraft::verification_label("12345"), "Recipient ID Valid");
    }
}
