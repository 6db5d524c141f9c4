//! Canonical insolvency extraction record.
//!
//! Every section has a `Default` impl that builds a fresh, fully-populated
//! value. Strings default to [`NOT_FOUND`], numbers and booleans to `None`
//! (serialized as `null`), dates to [`DateValue::default`], arrays to empty.
//! Serialization never omits a field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel for string fields the extractor could not resolve.
pub const NOT_FOUND: &str = "Not found";

/// Law governing the procedure when the document does not say otherwise.
pub const DEFAULT_LAW: &str = "Legea 85/2014";

/// Practitioner role assigned when the model reports an `appointedLiquidator`.
pub const LIQUIDATOR_ROLE: &str = "lichidator_judiciar";

pub fn not_found() -> String {
    NOT_FOUND.to_string()
}

/// Returns true for the sentinel or a blank string.
pub fn is_missing(value: &str) -> bool {
    value.trim().is_empty() || value == NOT_FOUND
}

/// A date as printed in the document plus its ISO form when it was resolvable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateValue {
    pub text: String,
    pub iso: Option<String>,
}

impl Default for DateValue {
    fn default() -> Self {
        Self {
            text: not_found(),
            iso: None,
        }
    }
}

impl DateValue {
    /// ISO date if present and non-blank.
    pub fn iso(&self) -> Option<&str> {
        self.iso.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Root normalized record returned for one scanned document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionResult {
    pub document: DocumentInfo,
    #[serde(rename = "case")]
    pub case_info: CaseInfo,
    pub parties: Parties,
    pub deadlines: Vec<Value>,
    pub claims: Claims,
    pub creditors_meeting: CreditorsMeeting,
    pub reports: Reports,
    pub compliance_flags: ComplianceFlags,
    pub other_important_info: String,
    pub raw_json: String,
}

impl Default for ExtractionResult {
    fn default() -> Self {
        Self {
            document: DocumentInfo::default(),
            case_info: CaseInfo::default(),
            parties: Parties::default(),
            deadlines: Vec::new(),
            claims: Claims::default(),
            creditors_meeting: CreditorsMeeting::default(),
            reports: Reports::default(),
            compliance_flags: ComplianceFlags::default(),
            other_important_info: not_found(),
            raw_json: String::new(),
        }
    }
}

// ============================================================================
// Document & case
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentInfo {
    /// One of the document type tokens, or anything the model emitted.
    pub doc_type: String,
    pub language: String,
    pub issuing_entity: String,
    pub document_number: String,
    pub document_date: DateValue,
    pub source_hints: String,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            doc_type: "other".to_string(),
            language: "ro".to_string(),
            issuing_entity: not_found(),
            document_number: not_found(),
            document_date: DateValue::default(),
            source_hints: not_found(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseInfo {
    pub case_number: String,
    pub court: Court,
    pub judge_syndic: String,
    pub procedure: Procedure,
    pub important_dates: ImportantDates,
}

impl Default for CaseInfo {
    fn default() -> Self {
        Self {
            case_number: not_found(),
            court: Court::default(),
            judge_syndic: not_found(),
            procedure: Procedure::default(),
            important_dates: ImportantDates::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Court {
    pub name: String,
    pub section: String,
    pub registry_address: String,
    pub registry_phone: String,
    pub registry_hours: String,
}

impl Default for Court {
    fn default() -> Self {
        Self {
            name: not_found(),
            section: not_found(),
            registry_address: not_found(),
            registry_phone: not_found(),
            registry_hours: not_found(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Procedure {
    pub law: String,
    pub procedure_type: String,
    pub stage: String,
    pub administration_right_lifted: Option<bool>,
    pub legal_basis_articles: Vec<Value>,
}

impl Default for Procedure {
    fn default() -> Self {
        Self {
            law: DEFAULT_LAW.to_string(),
            procedure_type: "other".to_string(),
            stage: "unknown".to_string(),
            administration_right_lifted: None,
            legal_basis_articles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportantDates {
    pub request_filed_date: DateValue,
    pub opening_date: DateValue,
    pub next_hearing_date_time: DateValue,
}

// ============================================================================
// Parties
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Parties {
    pub debtor: Debtor,
    pub practitioner: Practitioner,
    pub creditors: Vec<Value>,
}

/// Company under insolvency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Debtor {
    pub name: String,
    /// National tax id (CUI).
    pub cui: String,
    pub trade_register_no: String,
    pub address: String,
    pub locality: String,
    pub county: String,
    /// Administrator name(s), comma-separated when there are several.
    pub administrator: String,
    pub associate_or_shareholder: String,
    /// Industry code.
    pub caen: String,
    pub incorporation_year: String,
    pub share_capital_ron: Option<f64>,
}

impl Default for Debtor {
    fn default() -> Self {
        Self {
            name: not_found(),
            cui: not_found(),
            trade_register_no: not_found(),
            address: not_found(),
            locality: not_found(),
            county: not_found(),
            administrator: not_found(),
            associate_or_shareholder: not_found(),
            caen: not_found(),
            incorporation_year: not_found(),
            share_capital_ron: None,
        }
    }
}

/// Insolvency practitioner (administrator or liquidator) appointed on the case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Practitioner {
    pub role: String,
    pub name: String,
    pub fiscal_id: String,
    /// Registration number in the practitioners' register.
    pub rfo: String,
    pub representative: String,
    pub address: String,
    pub email: String,
    pub phone: String,
    pub fax: String,
    pub appointed_date: DateValue,
    pub confirmed_date: DateValue,
}

impl Default for Practitioner {
    fn default() -> Self {
        Self {
            role: not_found(),
            name: not_found(),
            fiscal_id: not_found(),
            rfo: not_found(),
            representative: not_found(),
            address: not_found(),
            email: not_found(),
            phone: not_found(),
            fax: not_found(),
            appointed_date: DateValue::default(),
            confirmed_date: DateValue::default(),
        }
    }
}

// ============================================================================
// Claims & creditors meeting
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Claims {
    pub table_type: String,
    pub table_date: DateValue,
    pub total_admitted_ron: Option<f64>,
    pub total_declared_ron: Option<f64>,
    pub currency: String,
    pub entries: Vec<Value>,
}

impl Default for Claims {
    fn default() -> Self {
        Self {
            table_type: "unknown".to_string(),
            table_date: DateValue::default(),
            total_admitted_ron: None,
            total_declared_ron: None,
            currency: not_found(),
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreditorsMeeting {
    pub meeting_date: DateValue,
    pub meeting_time: String,
    pub location: String,
    pub quorum_percent: Option<f64>,
    pub agenda: Vec<Value>,
    pub decisions: MeetingDecisions,
    pub voting_summary: String,
}

impl Default for CreditorsMeeting {
    fn default() -> Self {
        Self {
            meeting_date: DateValue::default(),
            meeting_time: not_found(),
            location: not_found(),
            quorum_percent: None,
            agenda: Vec::new(),
            decisions: MeetingDecisions::default(),
            voting_summary: not_found(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeetingDecisions {
    pub practitioner_confirmed: Option<bool>,
    pub committee_formed: Option<bool>,
    pub committee_notes: String,
    pub fee_approved: FeeApproval,
}

impl Default for MeetingDecisions {
    fn default() -> Self {
        Self {
            practitioner_confirmed: None,
            committee_formed: None,
            committee_notes: not_found(),
            fee_approved: FeeApproval::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeApproval {
    pub fixed_fee_ron: Option<f64>,
    pub vat_included: Option<bool>,
    pub success_fee_percent: Option<f64>,
    pub payment_source: String,
}

impl Default for FeeApproval {
    fn default() -> Self {
        Self {
            fixed_fee_ron: None,
            vat_included: None,
            success_fee_percent: None,
            payment_source: "unknown".to_string(),
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reports {
    pub art97: Art97Report,
    pub final_art167: FinalReport,
}

/// Report on the causes of insolvency (art. 97).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Art97Report {
    pub issued_date: DateValue,
    pub causes_of_insolvency: Vec<Value>,
    pub litigation_found: Option<bool>,
    pub avoidance_review: AvoidanceReview,
    pub liability_assessment_art169: LiabilityAssessment,
    pub financials: Financials,
}

impl Default for Art97Report {
    fn default() -> Self {
        Self {
            issued_date: DateValue::default(),
            causes_of_insolvency: Vec::new(),
            litigation_found: None,
            avoidance_review: AvoidanceReview::default(),
            liability_assessment_art169: LiabilityAssessment::default(),
            financials: Financials::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AvoidanceReview {
    pub reviewed: Option<bool>,
    pub suspicious_transactions_found: Option<bool>,
    pub actions_filed: Option<bool>,
    pub notes: String,
}

impl Default for AvoidanceReview {
    fn default() -> Self {
        Self {
            reviewed: None,
            suspicious_transactions_found: None,
            actions_filed: None,
            notes: not_found(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiabilityAssessment {
    pub reviewed: Option<bool>,
    pub culpable_persons_identified: Option<bool>,
    pub action_proposed_or_filed: Option<bool>,
    pub notes: String,
}

impl Default for LiabilityAssessment {
    fn default() -> Self {
        Self {
            reviewed: None,
            culpable_persons_identified: None,
            action_proposed_or_filed: None,
            notes: not_found(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Financials {
    pub years_covered: Vec<Value>,
    pub total_assets_ron: Option<f64>,
    pub total_liabilities_ron: Option<f64>,
    pub net_equity_ron: Option<f64>,
    pub cash_ron: Option<f64>,
    pub receivables_ron: Option<f64>,
    pub notes: String,
}

impl Default for Financials {
    fn default() -> Self {
        Self {
            years_covered: Vec::new(),
            total_assets_ron: None,
            total_liabilities_ron: None,
            net_equity_ron: None,
            cash_ron: None,
            receivables_ron: None,
            notes: not_found(),
        }
    }
}

/// Final report (art. 167).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinalReport {
    pub issued_date: DateValue,
    pub assets_identified: Option<bool>,
    pub saleable_assets_found: Option<bool>,
    pub sums_available_for_distribution_ron: Option<f64>,
    pub recovery_rate_percent: Option<f64>,
    pub final_balance_sheet_date: DateValue,
    pub closure_proposed: Option<bool>,
    pub closure_legal_basis: String,
    #[serde(rename = "deregistrationORCProposed")]
    pub deregistration_orc_proposed: Option<bool>,
    #[serde(rename = "practitionerFeeRequestedFromUNPIR")]
    pub practitioner_fee_requested_from_unpir: Option<bool>,
    pub notes: String,
}

impl Default for FinalReport {
    fn default() -> Self {
        Self {
            issued_date: DateValue::default(),
            assets_identified: None,
            saleable_assets_found: None,
            sums_available_for_distribution_ron: None,
            recovery_rate_percent: None,
            final_balance_sheet_date: DateValue::default(),
            closure_proposed: None,
            closure_legal_basis: not_found(),
            deregistration_orc_proposed: None,
            practitioner_fee_requested_from_unpir: None,
            notes: not_found(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComplianceFlags {
    pub administration_right_lifted: Option<bool>,
    pub individual_actions_suspended: Option<bool>,
    #[serde(rename = "publicationInBPIReferenced")]
    pub publication_in_bpi_referenced: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_serializes_every_top_level_key() {
        let json = serde_json::to_value(ExtractionResult::default()).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "document",
            "case",
            "parties",
            "deadlines",
            "claims",
            "creditorsMeeting",
            "reports",
            "complianceFlags",
            "otherImportantInfo",
            "rawJson",
        ] {
            assert!(obj.contains_key(key), "missing key {}", key);
        }
        assert_eq!(obj.len(), 10);
    }

    #[test]
    fn test_date_default_serializes_null_iso() {
        let json = serde_json::to_value(DateValue::default()).unwrap();
        assert_eq!(json, serde_json::json!({ "text": "Not found", "iso": null }));
    }

    #[test]
    fn test_acronym_field_names() {
        let json = serde_json::to_value(Reports::default()).unwrap();
        let final_report = &json["finalArt167"];
        assert!(final_report.get("deregistrationORCProposed").is_some());
        assert!(final_report.get("practitionerFeeRequestedFromUNPIR").is_some());

        let flags = serde_json::to_value(ComplianceFlags::default()).unwrap();
        assert!(flags.get("publicationInBPIReferenced").is_some());
    }

    #[test]
    fn test_partial_record_deserializes_with_defaults() {
        let parsed: ExtractionResult = serde_json::from_value(serde_json::json!({
            "case": { "procedure": { "stage": "opened" } }
        }))
        .unwrap();
        assert_eq!(parsed.case_info.procedure.stage, "opened");
        assert_eq!(parsed.case_info.procedure.law, DEFAULT_LAW);
        assert_eq!(parsed.document.language, "ro");
        assert_eq!(parsed.parties.debtor.name, NOT_FOUND);
    }

    #[test]
    fn test_is_missing() {
        assert!(is_missing(""));
        assert!(is_missing("   "));
        assert!(is_missing(NOT_FOUND));
        assert!(!is_missing("SC Alfa SRL"));
    }
}
