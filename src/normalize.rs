//! Normalization of raw model output into an [`ExtractionResult`].
//!
//! Each section is a pure function over a borrowed [`Fields`] view and a
//! fresh default instance. Legacy field names are accepted on input but the
//! canonical name always wins when both carry a value.

use serde_json::Value;
use tracing::debug;

use crate::coerce::{coerce_str, Fields};
use crate::schema::{
    not_found, Art97Report, AvoidanceReview, CaseInfo, Claims, ComplianceFlags, Court,
    CreditorsMeeting, Debtor, DocumentInfo, ExtractionResult, FeeApproval, FinalReport,
    Financials, ImportantDates, LiabilityAssessment, MeetingDecisions, Parties, Practitioner,
    Procedure, Reports, LIQUIDATOR_ROLE,
};

/// Build a fully-populated record from whatever the model returned.
///
/// `raw` may be `null` or any other non-object, in which case every section
/// takes its default. `raw_json` is preserved verbatim for audit.
pub fn normalize(raw: &Value, raw_json: &str) -> ExtractionResult {
    let root = Fields::of(Some(raw));
    let doc = root.object("document");
    let case = root.object("case");
    let parties = root.object("parties");

    let result = ExtractionResult {
        document: normalize_document(doc, case),
        case_info: normalize_case(case),
        parties: normalize_parties(parties, case),
        deadlines: root.list_or("deadlines", Vec::new()),
        claims: normalize_claims(root.object("claims")),
        creditors_meeting: normalize_creditors_meeting(root.object("creditorsMeeting")),
        reports: normalize_reports(root.object("reports")),
        compliance_flags: normalize_compliance_flags(root.object("complianceFlags")),
        other_important_info: root
            .get("otherImportantInfo")
            .map(coerce_str)
            .unwrap_or_else(not_found),
        raw_json: raw_json.to_string(),
    };

    debug!(
        "Normalized extraction: docType={}, stage={}, {} deadlines, {} creditors",
        result.document.doc_type,
        result.case_info.procedure.stage,
        result.deadlines.len(),
        result.parties.creditors.len()
    );

    result
}

// ============================================================================
// Document & case
// ============================================================================

fn normalize_document(doc: Fields<'_>, case: Fields<'_>) -> DocumentInfo {
    let d = DocumentInfo::default();
    DocumentInfo {
        doc_type: doc.first_text_or(&["docType", "type"], d.doc_type),
        language: doc.text_or("language", d.language),
        issuing_entity: doc.text_or("issuingEntity", d.issuing_entity),
        document_number: doc
            .str("documentNumber")
            .or_else(|| case.str("fileNumber"))
            .map(str::to_owned)
            .unwrap_or(d.document_number),
        document_date: doc.first_date(&["documentDate", "issuanceDate"]),
        source_hints: doc.text_or("sourceHints", d.source_hints),
    }
}

fn normalize_case(case: Fields<'_>) -> CaseInfo {
    let d = CaseInfo::default();
    CaseInfo {
        case_number: case.first_text_or(&["caseNumber", "fileNumber"], d.case_number),
        court: normalize_court(case.get("court")),
        judge_syndic: case.text_or("judgeSyndic", d.judge_syndic),
        procedure: normalize_procedure(case.object("procedure")),
        important_dates: normalize_important_dates(case.object("importantDates")),
    }
}

/// A bare string is taken as the court name.
fn normalize_court(raw: Option<&Value>) -> Court {
    let d = Court::default();
    if let Some(Value::String(name)) = raw {
        let name = name.trim();
        return Court {
            name: if name.is_empty() {
                d.name
            } else {
                name.to_string()
            },
            ..d
        };
    }

    let court = Fields::of(raw);
    Court {
        name: court.text_or("name", d.name),
        section: court.text_or("section", d.section),
        registry_address: court.text_or("registryAddress", d.registry_address),
        registry_phone: court.text_or("registryPhone", d.registry_phone),
        registry_hours: court.text_or("registryHours", d.registry_hours),
    }
}

fn normalize_procedure(procedure: Fields<'_>) -> Procedure {
    let d = Procedure::default();
    Procedure {
        law: procedure.text_or("law", d.law),
        procedure_type: procedure.first_text_or(&["procedureType", "type"], d.procedure_type),
        stage: procedure.text_or("stage", d.stage),
        administration_right_lifted: procedure.flag("administrationRightLifted"),
        legal_basis_articles: procedure.list_or("legalBasisArticles", d.legal_basis_articles),
    }
}

fn normalize_important_dates(dates: Fields<'_>) -> ImportantDates {
    ImportantDates {
        request_filed_date: dates.date("requestFiledDate"),
        opening_date: dates.date("openingDate"),
        next_hearing_date_time: dates.date("nextHearingDateTime"),
    }
}

// ============================================================================
// Parties
// ============================================================================

fn normalize_parties(parties: Fields<'_>, case: Fields<'_>) -> Parties {
    let d = Parties::default();
    Parties {
        debtor: normalize_debtor(parties, case),
        practitioner: normalize_practitioner(parties),
        creditors: parties.list_or("creditors", d.creditors),
    }
}

/// Structured `parties.debtor` wins; otherwise the debtor is assembled from a
/// bare-string `parties.debtor` plus the legacy `case.debtor` block.
fn normalize_debtor(parties: Fields<'_>, case: Fields<'_>) -> Debtor {
    let d = Debtor::default();
    let debtor = parties.object("debtor");

    if debtor.is_present() {
        let administrator = debtor
            .str("administrator")
            .map(str::to_owned)
            .or_else(|| join_administrators(parties.get("administrators")))
            .or_else(|| join_administrators(debtor.get("administrators")))
            .unwrap_or(d.administrator);

        return Debtor {
            name: debtor.text_or("name", d.name),
            cui: debtor.text_or("cui", d.cui),
            trade_register_no: debtor.text_or("tradeRegisterNo", d.trade_register_no),
            address: debtor.text_or("address", d.address),
            locality: debtor.text_or("locality", d.locality),
            county: debtor.text_or("county", d.county),
            administrator,
            associate_or_shareholder: debtor
                .text_or("associateOrShareholder", d.associate_or_shareholder),
            caen: debtor.text_or("caen", d.caen),
            incorporation_year: debtor.text_or("incorporationYear", d.incorporation_year),
            share_capital_ron: debtor.number("shareCapitalRon"),
        };
    }

    let legacy = case.object("debtor");
    let identifier = legacy.object("identifier");
    let name_from_parties = parties
        .get("debtor")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());

    Debtor {
        name: name_from_parties
            .or_else(|| legacy.str("name"))
            .map(str::to_owned)
            .unwrap_or(d.name),
        cui: identifier
            .str("cui")
            .or_else(|| legacy.str("cui"))
            .map(str::to_owned)
            .unwrap_or(d.cui),
        trade_register_no: identifier
            .str("registrationNumber")
            .or_else(|| legacy.str("registrationNumber"))
            .map(str::to_owned)
            .unwrap_or(d.trade_register_no),
        address: legacy.text_or("address", d.address),
        administrator: join_administrators(parties.get("administrators"))
            .unwrap_or(d.administrator),
        ..d
    }
}

/// Join a non-empty `administrators` array with `", "`.
fn join_administrators(raw: Option<&Value>) -> Option<String> {
    let names = raw?.as_array().filter(|a| !a.is_empty())?;
    Some(
        names
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// `parties.practitioner` wins; `parties.appointedLiquidator` is the legacy shape.
fn normalize_practitioner(parties: Fields<'_>) -> Practitioner {
    let d = Practitioner::default();
    let practitioner = parties.object("practitioner");

    if practitioner.is_present() {
        return Practitioner {
            role: practitioner.text_or("role", d.role),
            name: practitioner.text_or("name", d.name),
            fiscal_id: practitioner.text_or("fiscalId", d.fiscal_id),
            rfo: practitioner.text_or("rfo", d.rfo),
            representative: practitioner.text_or("representative", d.representative),
            address: practitioner.text_or("address", d.address),
            email: practitioner.text_or("email", d.email),
            phone: practitioner.text_or("phone", d.phone),
            fax: practitioner.text_or("fax", d.fax),
            appointed_date: practitioner.date("appointedDate"),
            confirmed_date: practitioner.date("confirmedDate"),
        };
    }

    let liquidator = parties.object("appointedLiquidator");
    if !liquidator.is_present() {
        return d;
    }
    let identifier = liquidator.object("identifier");

    Practitioner {
        role: LIQUIDATOR_ROLE.to_string(),
        name: liquidator.text_or("name", d.name),
        fiscal_id: identifier
            .str("fiscalCode")
            .or_else(|| liquidator.str("fiscalCode"))
            .map(str::to_owned)
            .unwrap_or(d.fiscal_id),
        rfo: identifier
            .str("registrationNumber")
            .or_else(|| liquidator.str("registrationNumber"))
            .map(str::to_owned)
            .unwrap_or(d.rfo),
        address: liquidator.first_text_or(&["headquarters", "address"], d.address),
        ..d
    }
}

// ============================================================================
// Merged sections
// ============================================================================

fn normalize_claims(claims: Fields<'_>) -> Claims {
    let d = Claims::default();
    Claims {
        table_type: claims.text_or("tableType", d.table_type),
        table_date: claims.date("tableDate"),
        total_admitted_ron: claims.number("totalAdmittedRon"),
        total_declared_ron: claims.number("totalDeclaredRon"),
        currency: claims.text_or("currency", d.currency),
        entries: claims.list_or("entries", d.entries),
    }
}

fn normalize_creditors_meeting(meeting: Fields<'_>) -> CreditorsMeeting {
    let d = CreditorsMeeting::default();
    CreditorsMeeting {
        meeting_date: meeting.first_date(&["meetingDate", "date"]),
        meeting_time: meeting.text_or("meetingTime", d.meeting_time),
        location: meeting.text_or("location", d.location),
        quorum_percent: meeting.number("quorumPercent"),
        agenda: meeting.list_or("agenda", d.agenda),
        decisions: normalize_decisions(meeting.object("decisions")),
        voting_summary: meeting.text_or("votingSummary", d.voting_summary),
    }
}

fn normalize_decisions(decisions: Fields<'_>) -> MeetingDecisions {
    let d = MeetingDecisions::default();
    let fee = decisions.object("feeApproved");
    let fee_default = FeeApproval::default();
    MeetingDecisions {
        practitioner_confirmed: decisions.flag("practitionerConfirmed"),
        committee_formed: decisions.flag("committeeFormed"),
        committee_notes: decisions.text_or("committeeNotes", d.committee_notes),
        fee_approved: FeeApproval {
            fixed_fee_ron: fee.number("fixedFeeRon"),
            vat_included: fee.flag("vatIncluded"),
            success_fee_percent: fee.number("successFeePercent"),
            payment_source: fee.text_or("paymentSource", fee_default.payment_source),
        },
    }
}

fn normalize_reports(reports: Fields<'_>) -> Reports {
    Reports {
        art97: normalize_art97(reports.object("art97")),
        final_art167: normalize_final_report(reports.object("finalArt167")),
    }
}

fn normalize_art97(report: Fields<'_>) -> Art97Report {
    let d = Art97Report::default();
    let avoidance = report.object("avoidanceReview");
    let liability = report.object("liabilityAssessmentArt169");
    let financials = report.object("financials");

    Art97Report {
        issued_date: report.date("issuedDate"),
        causes_of_insolvency: report.list_or("causesOfInsolvency", d.causes_of_insolvency),
        litigation_found: report.flag("litigationFound"),
        avoidance_review: AvoidanceReview {
            reviewed: avoidance.flag("reviewed"),
            suspicious_transactions_found: avoidance.flag("suspiciousTransactionsFound"),
            actions_filed: avoidance.flag("actionsFiled"),
            notes: avoidance.text_or("notes", d.avoidance_review.notes),
        },
        liability_assessment_art169: LiabilityAssessment {
            reviewed: liability.flag("reviewed"),
            culpable_persons_identified: liability.flag("culpablePersonsIdentified"),
            action_proposed_or_filed: liability.flag("actionProposedOrFiled"),
            notes: liability.text_or("notes", d.liability_assessment_art169.notes),
        },
        financials: Financials {
            years_covered: financials.list_or("yearsCovered", d.financials.years_covered),
            total_assets_ron: financials.number("totalAssetsRon"),
            total_liabilities_ron: financials.number("totalLiabilitiesRon"),
            net_equity_ron: financials.number("netEquityRon"),
            cash_ron: financials.number("cashRon"),
            receivables_ron: financials.number("receivablesRon"),
            notes: financials.text_or("notes", d.financials.notes),
        },
    }
}

fn normalize_final_report(report: Fields<'_>) -> FinalReport {
    let d = FinalReport::default();
    FinalReport {
        issued_date: report.date("issuedDate"),
        assets_identified: report.flag("assetsIdentified"),
        saleable_assets_found: report.flag("saleableAssetsFound"),
        sums_available_for_distribution_ron: report.number("sumsAvailableForDistributionRon"),
        recovery_rate_percent: report.number("recoveryRatePercent"),
        final_balance_sheet_date: report.date("finalBalanceSheetDate"),
        closure_proposed: report.flag("closureProposed"),
        closure_legal_basis: report.text_or("closureLegalBasis", d.closure_legal_basis),
        deregistration_orc_proposed: report.flag("deregistrationORCProposed"),
        practitioner_fee_requested_from_unpir: report.flag("practitionerFeeRequestedFromUNPIR"),
        notes: report.text_or("notes", d.notes),
    }
}

fn normalize_compliance_flags(flags: Fields<'_>) -> ComplianceFlags {
    ComplianceFlags {
        administration_right_lifted: flags.flag("administrationRightLifted"),
        individual_actions_suspended: flags.flag("individualActionsSuspended"),
        publication_in_bpi_referenced: flags.flag("publicationInBPIReferenced"),
    }
}
