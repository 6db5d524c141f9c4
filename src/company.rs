//! Known companies that extracted documents get attached to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{is_missing, Debtor};

/// A company the user already tracks. Never extracted directly; documents
/// are matched against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CompanyRecord")]
pub struct Company {
    pub id: String,
    pub name: String,
    /// National tax id as entered, e.g. `RO12345678`.
    pub national_id: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// Stored company shape. Older records carry the id as `cuiRo`;
/// `nationalId` wins when both are present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompanyRecord {
    id: String,
    name: String,
    #[serde(default)]
    national_id: Option<String>,
    #[serde(default)]
    cui_ro: Option<String>,
    #[serde(default)]
    address: String,
    #[serde(default)]
    assigned_to: Option<String>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    created_by: Option<String>,
}

impl From<CompanyRecord> for Company {
    fn from(record: CompanyRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            national_id: record.national_id.or(record.cui_ro).unwrap_or_default(),
            address: record.address,
            assigned_to: record.assigned_to,
            created_at: record.created_at,
            created_by: record.created_by,
        }
    }
}

impl Company {
    pub fn new(
        name: impl Into<String>,
        national_id: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            national_id: national_id.into(),
            address: address.into(),
            assigned_to: None,
            created_at: Utc::now(),
            created_by: None,
        }
    }

    /// Prefill a new company from a scanned debtor ("create from scan").
    ///
    /// Sentinel values are left blank. Returns `None` when the debtor has no name.
    pub fn from_debtor(debtor: &Debtor, created_by: Option<String>) -> Option<Self> {
        if is_missing(&debtor.name) {
            return None;
        }
        let keep = |value: &str| {
            if is_missing(value) {
                String::new()
            } else {
                value.trim().to_string()
            }
        };

        let mut company = Self::new(keep(&debtor.name), keep(&debtor.cui), keep(&debtor.address));
        company.created_by = created_by;
        Some(company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_debtor_skips_sentinels() {
        let debtor = Debtor {
            name: "ALFA CONSTRUCT SRL".to_string(),
            cui: "RO 12345678".to_string(),
            ..Debtor::default()
        };
        let company = Company::from_debtor(&debtor, Some("jon-doe".to_string())).unwrap();
        assert_eq!(company.name, "ALFA CONSTRUCT SRL");
        assert_eq!(company.national_id, "RO 12345678");
        assert_eq!(company.address, "");
        assert_eq!(company.created_by.as_deref(), Some("jon-doe"));
        assert!(Uuid::parse_str(&company.id).is_ok());
    }

    #[test]
    fn test_from_debtor_without_name() {
        assert!(Company::from_debtor(&Debtor::default(), None).is_none());
    }

    #[test]
    fn test_deserialize_legacy_id_key() {
        let company: Company = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "name": "Beta SRL",
            "cuiRo": "RO998877",
            "createdAt": "2025-01-10T09:30:00Z"
        }))
        .unwrap();
        assert_eq!(company.national_id, "RO998877");
        assert_eq!(company.address, "");
        assert_eq!(company.assigned_to, None);
    }

    #[test]
    fn test_canonical_id_key_wins_over_legacy() {
        let company: Company = serde_json::from_value(serde_json::json!({
            "id": "c2",
            "name": "Gama SRL",
            "nationalId": "RO111222",
            "cuiRo": "RO333444"
        }))
        .unwrap();
        assert_eq!(company.national_id, "RO111222");

        let json = serde_json::to_value(&company).unwrap();
        assert_eq!(json["nationalId"], "RO111222");
        assert!(json.get("cuiRo").is_none());
    }
}
