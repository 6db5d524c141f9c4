//! Case-level views derived from a case's documents.
//!
//! Nothing here is stored: stage, deadlines and next hearing are recomputed
//! from the document list on every call.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::coerce::Fields;
use crate::schema::{DateValue, ExtractionResult};

/// One scanned document belonging to a case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsolvencyDocument {
    pub id: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub extraction: Option<ExtractionResult>,
}

/// Procedure stages under Legea 85/2014, in procedural order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureStage {
    Request,
    Opened,
    ClaimsWindow,
    PreliminaryTable,
    DefinitiveTable,
    Liquidation,
    FinalReport,
    ClosureRequested,
    Closed,
    Unknown,
}

impl ProcedureStage {
    /// Parse a stage token. Unrecognized tokens are [`ProcedureStage::Unknown`].
    pub fn parse(token: &str) -> Self {
        match token {
            "request" => Self::Request,
            "opened" => Self::Opened,
            "claims_window" => Self::ClaimsWindow,
            "preliminary_table" => Self::PreliminaryTable,
            "definitive_table" => Self::DefinitiveTable,
            "liquidation" => Self::Liquidation,
            "final_report" => Self::FinalReport,
            "closure_requested" => Self::ClosureRequested,
            "closed" => Self::Closed,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Opened => "opened",
            Self::ClaimsWindow => "claims_window",
            Self::PreliminaryTable => "preliminary_table",
            Self::DefinitiveTable => "definitive_table",
            Self::Liquidation => "liquidation",
            Self::FinalReport => "final_report",
            Self::ClosureRequested => "closure_requested",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        }
    }

    /// Position in the procedure; `Unknown` ranks below everything.
    pub fn rank(&self) -> i8 {
        match self {
            Self::Request => 0,
            Self::Opened => 1,
            Self::ClaimsWindow => 2,
            Self::PreliminaryTable => 3,
            Self::DefinitiveTable => 4,
            Self::Liquidation => 5,
            Self::FinalReport => 6,
            Self::ClosureRequested => 7,
            Self::Closed => 8,
            Self::Unknown => -1,
        }
    }

    /// Display label: `claims_window` → `Claims Window`.
    pub fn label(&self) -> String {
        if *self == Self::Unknown {
            return "Unknown".to_string();
        }
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Most advanced stage any document reports. Stages only move forward, so
/// later documents supersede earlier ones regardless of upload order.
pub fn derive_case_stage(documents: &[InsolvencyDocument]) -> ProcedureStage {
    let mut stage = ProcedureStage::Unknown;
    for extraction in documents.iter().filter_map(|d| d.extraction.as_ref()) {
        let candidate = ProcedureStage::parse(&extraction.case_info.procedure.stage);
        if candidate.rank() > stage.rank() {
            stage = candidate;
        }
    }
    stage
}

/// A deadline lifted out of one document, tagged with its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedDeadline {
    #[serde(rename = "type")]
    pub kind: String,
    pub date: DateValue,
    pub time: String,
    pub legal_basis: String,
    pub notes: String,
    pub source_doc_id: String,
}

impl AggregatedDeadline {
    /// Read one raw deadline entry. Non-object entries are skipped.
    fn from_raw(raw: &Value, source_doc_id: &str) -> Option<Self> {
        let entry = Fields::of(Some(raw));
        if !entry.is_present() {
            return None;
        }
        Some(Self {
            kind: entry.text("type"),
            date: deadline_date(entry.get("date")),
            time: entry.text("time"),
            legal_basis: entry.text("legalBasis"),
            notes: entry.text("notes"),
            source_doc_id: source_doc_id.to_string(),
        })
    }

    fn dedup_key(&self) -> (String, String, String) {
        let when = self
            .date
            .iso()
            .map(str::to_owned)
            .unwrap_or_else(|| self.date.text.clone());
        (self.kind.clone(), when, self.time.clone())
    }
}

/// All deadlines across the case, first occurrence kept, earliest first.
/// Entries without an ISO date keep their relative order at the end.
pub fn aggregate_deadlines(documents: &[InsolvencyDocument]) -> Vec<AggregatedDeadline> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    let mut skipped = 0usize;

    for document in documents {
        let Some(extraction) = document.extraction.as_ref() else {
            continue;
        };
        for raw in &extraction.deadlines {
            let Some(deadline) = AggregatedDeadline::from_raw(raw, &document.id) else {
                skipped += 1;
                continue;
            };
            if seen.insert(deadline.dedup_key()) {
                result.push(deadline);
            }
        }
    }

    result.sort_by(|a, b| compare_iso(a.date.iso(), b.date.iso()));

    debug!(
        "Aggregated {} deadline(s) from {} document(s), {} malformed entries skipped",
        result.len(),
        documents.len(),
        skipped
    );
    result
}

/// Date of a raw deadline entry. Unlike record dates, `text` and `iso` are
/// read independently, so `{ "iso": "2024-05-01" }` keeps its ISO date.
fn deadline_date(raw: Option<&Value>) -> DateValue {
    let fallback = DateValue::default();
    match raw {
        Some(Value::Object(_)) => {
            let date = Fields::of(raw);
            DateValue {
                text: date.text_or("text", fallback.text),
                iso: date.str("iso").map(str::to_owned),
            }
        }
        Some(Value::String(text)) if !text.trim().is_empty() => DateValue {
            text: text.clone(),
            iso: None,
        },
        _ => fallback,
    }
}

fn compare_iso(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Earliest hearing date across the case, from either the important dates
/// block or `next_hearing` deadlines.
pub fn next_hearing_iso(documents: &[InsolvencyDocument]) -> Option<String> {
    documents
        .iter()
        .filter_map(|d| d.extraction.as_ref())
        .flat_map(|extraction| {
            let from_dates = extraction
                .case_info
                .important_dates
                .next_hearing_date_time
                .iso()
                .map(str::to_owned);
            let from_deadlines = extraction.deadlines.iter().filter_map(|raw| {
                let entry = Fields::of(Some(raw));
                if entry.str("type") != Some("next_hearing") {
                    return None;
                }
                deadline_date(entry.get("date")).iso
            });
            from_dates.into_iter().chain(from_deadlines)
        })
        .min()
}
