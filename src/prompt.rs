//! System prompt for the insolvency document analyst.
//!
//! The output skeleton is rendered from [`ExtractionResult::default`] so the
//! prompt and the normalizer never disagree on key names.

use serde_json::{json, Value};

use crate::schema::ExtractionResult;

const INSTRUCTIONS: &str = r#"You are an expert Romanian insolvency (Legea 85/2014) document analyst.

You will be shown images of ONE insolvency-related document (court decision, notification, claims table, creditors meeting minutes, report art. 97, final report art. 167, etc.) for a Romanian case.

Your job:
1) Identify the document type.
2) Extract structured data into the EXACT JSON schema defined below.
3) Be precise: do not hallucinate. If unsure, use "Not found" or null.
4) Prefer the most explicit value. If multiple candidates exist, pick the most explicit and mention alternatives in otherImportantInfo.

Hard rules:
- Return ONLY a valid JSON object with EXACTLY these top-level keys:
  document, case, parties, deadlines, claims, creditorsMeeting, reports, complianceFlags, otherImportantInfo
- Do NOT add extra top-level keys.
- For any string field that cannot be determined: use "Not found".
- For any number field that cannot be determined: use null.
- For any boolean field that cannot be determined: use null.
- Dates: if you can confidently convert to ISO YYYY-MM-DD, put it in the "iso" field; always keep the original text in "text". Otherwise set "iso" to null.
- Amounts: numbers in RON where possible (e.g. "45.255 lei" -> 45255). If the currency is not RON, still parse the number and note the currency.
- Percentages: numeric 0..100 (e.g. "5%" -> 5).

DOCUMENT TYPES: court_opening_decision, notification_opening, report_art_97, claims_table_preliminary, claims_table_definitive, creditors_meeting_minutes, final_report_art_167, other

PROCEDURE TYPES: faliment_simplificat, faliment, insolventa, reorganizare, other

PROCEDURE STAGES: request, opened, claims_window, preliminary_table, definitive_table, liquidation, final_report, closure_requested, closed, unknown

DEADLINE TYPES: claims_submission, claims_verification_preliminary_table, definitive_table, creditors_meeting, appeal, opposition, next_hearing, other

CREDITOR TYPES (if inferable from table headings / legal rank): bugetar, salarial, garantat, chirografar, altul, unknown

CLAIMS RANK: if explicit, capture the legal rank text, e.g. "Creanțe bugetare (art. 161 alin. (1) pct. 5)". Otherwise "Not found".

CANONICAL KEY NAMES:
- document: "docType" (not "type"), "documentDate" (not "issuanceDate"), "documentNumber".
- case: "caseNumber" (not "fileNumber"); "court" is an object with "name", "section", "registryAddress", "registryPhone", "registryHours" (not a string).
- parties: "debtor" is an object; "practitioner" (not "appointedLiquidator").

Now output JSON with EXACTLY this schema:
"#;

/// Full system prompt: instructions followed by the output skeleton.
pub fn system_prompt() -> String {
    format!("{}{}", INSTRUCTIONS, output_skeleton())
}

/// Default record without `rawJson`, with one example element in each list
/// the model is expected to fill.
fn output_skeleton() -> String {
    let mut skeleton = serde_json::to_value(ExtractionResult::default()).unwrap_or(Value::Null);
    if let Some(root) = skeleton.as_object_mut() {
        root.remove("rawJson");
        root.insert(
            "deadlines".to_string(),
            json!([{
                "type": "claims_submission",
                "date": { "text": "Not found", "iso": null },
                "time": "Not found",
                "legalBasis": "Not found",
                "notes": "Not found"
            }]),
        );
    }
    if let Some(parties) = skeleton.get_mut("parties").and_then(Value::as_object_mut) {
        parties.insert(
            "creditors".to_string(),
            json!([{
                "name": "Not found",
                "creditorType": "unknown",
                "amountRon": null,
                "notes": "Not found"
            }]),
        );
    }
    if let Some(claims) = skeleton.get_mut("claims").and_then(Value::as_object_mut) {
        claims.insert(
            "entries".to_string(),
            json!([{
                "creditor": "Not found",
                "creditorType": "unknown",
                "rank": "Not found",
                "declaredRon": null,
                "admittedRon": null,
                "notes": "Not found"
            }]),
        );
    }
    serde_json::to_string_pretty(&skeleton).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_lists_canonical_keys_only() {
        let skeleton: Value = serde_json::from_str(&output_skeleton()).unwrap();
        let root = skeleton.as_object().unwrap();
        assert_eq!(root.len(), 9);
        assert!(root.get("rawJson").is_none());
        assert!(skeleton["document"].get("docType").is_some());
        assert!(skeleton["document"].get("type").is_none());
        assert!(skeleton["parties"].get("practitioner").is_some());
        assert_eq!(skeleton["deadlines"][0]["type"], "claims_submission");
    }

    #[test]
    fn test_prompt_ends_with_schema() {
        let prompt = system_prompt();
        assert!(prompt.starts_with("You are an expert Romanian insolvency"));
        assert!(prompt.trim_end().ends_with('}'));
    }
}
