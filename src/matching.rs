//! Matching extracted parties against known companies.
//!
//! Two tiers: an exact national-id match is authoritative and short-circuits
//! everything else; a fuzzy name/id containment match is only consulted when
//! no exact match exists. Ambiguity at either tier yields `None` so the caller
//! asks a human.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::company::Company;
use crate::schema::{is_missing, NOT_FOUND};

/// ASCII digit runs long enough to be a tax id, short enough to skip phone
/// numbers glued together.
fn id_run_regex() -> &'static Regex {
    static ID_RUN: OnceLock<Regex> = OnceLock::new();
    ID_RUN.get_or_init(|| Regex::new(r"[0-9]{4,15}").expect("static regex"))
}

/// Lowercase, collapse whitespace, trim.
pub fn normalize_for_match(value: &str) -> String {
    value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Digits only, so `RO 12 34 56 78` and `12345678` compare equal.
pub fn normalize_national_id(value: &str) -> String {
    if value == NOT_FOUND {
        return String::new();
    }
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Distinct candidate ids found in free identifier text, in order of appearance.
pub fn candidate_ids(identifiers: &str) -> Vec<String> {
    if identifiers.trim().is_empty() || identifiers == NOT_FOUND {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    id_run_regex()
        .find_iter(identifiers)
        .map(|m| m.as_str().to_string())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Normalized id → company, with ids shared by several companies removed.
struct IdIndex<'a> {
    by_id: HashMap<String, &'a Company>,
    collided: HashSet<String>,
}

impl<'a> IdIndex<'a> {
    fn build(companies: &'a [Company]) -> Self {
        let mut by_id = HashMap::new();
        let mut collided = HashSet::new();

        for company in companies {
            let key = normalize_national_id(&company.national_id);
            if key.is_empty() || collided.contains(&key) {
                continue;
            }
            if by_id.remove(&key).is_some() {
                debug!("National id {} shared by several companies; excluded", key);
                collided.insert(key);
                continue;
            }
            by_id.insert(key, company);
        }

        Self { by_id, collided }
    }

    /// True when a candidate names an id held by several companies.
    fn hits_collision(&self, candidates: &[String]) -> bool {
        candidates.iter().any(|id| self.collided.contains(id))
    }

    /// Distinct companies hit by any of the candidate ids.
    fn lookup(&self, candidates: &[String]) -> Vec<&'a Company> {
        let mut hits: Vec<&'a Company> = Vec::new();
        for id in candidates {
            if let Some(&company) = self.by_id.get(id) {
                push_distinct(&mut hits, company);
            }
        }
        hits
    }
}

fn push_distinct<'a>(hits: &mut Vec<&'a Company>, company: &'a Company) {
    if !hits.iter().any(|c| std::ptr::eq(*c, company)) {
        hits.push(company);
    }
}

fn contains_company(list: &[&Company], company: &Company) -> bool {
    list.iter().any(|c| std::ptr::eq(*c, company))
}

/// Companies whose name contains (or is contained in) the extracted name, or
/// whose id appears in the identifier text.
pub fn suggest_companies<'a>(
    companies: &'a [Company],
    name: &str,
    identifiers: &str,
) -> Vec<&'a Company> {
    if is_missing(name) {
        return Vec::new();
    }
    let wanted = normalize_for_match(name);
    let identifiers = identifiers.to_lowercase();

    companies
        .iter()
        .filter(|company| {
            let candidate = normalize_for_match(&company.name);
            let name_match = !candidate.is_empty()
                && (candidate.contains(&wanted) || wanted.contains(&candidate));
            let id = company.national_id.trim();
            let id_match = !id.is_empty() && identifiers.contains(&id.to_lowercase());
            name_match || id_match
        })
        .collect()
}

/// Single company for one extracted party, or `None` when there is no match
/// or more than one.
///
/// An extracted id held by several companies also yields `None` and skips the
/// fuzzy tier, so a shared id never resolves to an arbitrary company.
pub fn best_match<'a>(
    companies: &'a [Company],
    extracted_name: &str,
    extracted_identifiers: &str,
) -> Option<&'a Company> {
    if companies.is_empty() || is_missing(extracted_name) {
        return None;
    }

    let index = IdIndex::build(companies);
    let candidates = candidate_ids(extracted_identifiers);
    let exact = index.lookup(&candidates);
    match exact.len() {
        1 => {
            debug!("Exact id match: {}", exact[0].id);
            return exact.into_iter().next();
        }
        0 => {}
        n => {
            debug!("{} companies matched by id; ambiguous", n);
            return None;
        }
    }

    if index.hits_collision(&candidates) {
        debug!("Extracted id is shared by several companies; ambiguous");
        return None;
    }

    let suggestions = suggest_companies(companies, extracted_name, extracted_identifiers);
    debug!("Fuzzy match for '{}': {} candidate(s)", extracted_name, suggestions.len());
    single(suggestions)
}

/// One named party of a document: display name plus free identifier text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartyRef<'s> {
    pub name: &'s str,
    pub identifiers: &'s str,
}

impl<'s> PartyRef<'s> {
    pub fn new(name: &'s str, identifiers: &'s str) -> Self {
        Self { name, identifiers }
    }
}

/// Match for a document naming two parties (e.g. beneficiary and contractor).
///
/// Exact ids from both sides are pooled first. Failing that, the fuzzy
/// suggestion sets decide: a single common company, then a single suggestion
/// from one side while the other has none, then two agreeing single
/// suggestions.
pub fn best_match_two_sided<'a>(
    companies: &'a [Company],
    first: PartyRef<'_>,
    second: PartyRef<'_>,
) -> Option<&'a Company> {
    if companies.is_empty() {
        return None;
    }

    let index = IdIndex::build(companies);
    let mut candidates = candidate_ids(first.identifiers);
    candidates.extend(candidate_ids(second.identifiers));
    let exact = index.lookup(&candidates);
    match exact.len() {
        1 => return exact.into_iter().next(),
        0 => {}
        n => {
            debug!("{} companies matched by id across both parties; ambiguous", n);
            return None;
        }
    }
    if index.hits_collision(&candidates) {
        return None;
    }

    let first_suggestions = suggest_companies(companies, first.name, first.identifiers);
    let second_suggestions = suggest_companies(companies, second.name, second.identifiers);

    let common: Vec<&Company> = companies
        .iter()
        .filter(|c| contains_company(&first_suggestions, c) && contains_company(&second_suggestions, c))
        .collect();
    if common.len() == 1 {
        return common.into_iter().next();
    }

    match (first_suggestions.as_slice(), second_suggestions.as_slice()) {
        ([only], []) | ([], [only]) => Some(*only),
        ([a], [b]) if std::ptr::eq(*a, *b) => Some(*a),
        _ => None,
    }
}

/// Search-box filter: normalized query in the name, or lowercase query in the id.
pub fn filter_companies<'a>(companies: &'a [Company], query: &str) -> Vec<&'a Company> {
    if query.trim().is_empty() {
        return companies.iter().collect();
    }
    let wanted = normalize_for_match(query);
    companies
        .iter()
        .filter(|c| {
            normalize_for_match(&c.name).contains(&wanted)
                || (!c.national_id.is_empty() && c.national_id.to_lowercase().contains(&wanted))
        })
        .collect()
}

fn single(mut matches: Vec<&Company>) -> Option<&Company> {
    if matches.len() == 1 {
        matches.pop()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(id: &str, name: &str, national_id: &str) -> Company {
        let mut c = Company::new(name, national_id, "");
        c.id = id.to_string();
        c
    }

    fn fixtures() -> Vec<Company> {
        vec![
            company("alfa", "Alfa Construct SRL", "12345678"),
            company("beta", "Beta Logistic SRL", "87654321"),
        ]
    }

    #[test]
    fn test_candidate_ids() {
        assert_eq!(
            candidate_ids("RO 12345678, J12/345/2010, ap. 12"),
            vec!["12345678", "2010"]
        );
        assert_eq!(candidate_ids("CUI 12345678 / RO12345678"), vec!["12345678"]);
        assert!(candidate_ids(NOT_FOUND).is_empty());
        assert!(candidate_ids("").is_empty());
    }

    #[test]
    fn test_candidate_ids_ascii_digits_only() {
        assert_eq!(candidate_ids("CUI \u{FF11}\u{FF12}\u{FF13}\u{FF14}5678"), vec!["5678"]);
        assert!(candidate_ids("\u{0661}\u{0662}\u{0663}\u{0664}\u{0665}").is_empty());
    }

    #[test]
    fn test_normalize_helpers() {
        assert_eq!(normalize_for_match("  ALFA   Construct\tSRL "), "alfa construct srl");
        assert_eq!(normalize_national_id("RO 12 34 56 78"), "12345678");
        assert_eq!(normalize_national_id(NOT_FOUND), "");
    }

    #[test]
    fn test_exact_id_beats_fuzzy_name() {
        let companies = fixtures();
        let matched = best_match(&companies, "Beta Logistic", "RO 12345678").unwrap();
        assert_eq!(matched.id, "alfa");
    }

    #[test]
    fn test_duplicate_ids_fail_closed() {
        let companies = vec![
            company("a", "Alfa SRL", "RO12345678"),
            company("b", "Alfa Grup SRL", "12345678"),
            company("c", "Gama SRL", "11112222"),
        ];
        assert!(best_match(&companies, "Alfa SRL", "CUI 12345678").is_none());
    }

    #[test]
    fn test_three_way_duplicate_stays_excluded() {
        let companies = vec![
            company("a", "Alfa SRL", "12345678"),
            company("b", "Beta SRL", "12345678"),
            company("c", "Gama SRL", "12345678"),
        ];
        assert!(best_match(&companies, "Delta SRL", "12345678").is_none());
    }

    #[test]
    fn test_duplicate_id_never_picked_by_containment() {
        let companies = vec![
            company("a", "Alfa SRL", "RO12345678"),
            company("b", "Beta SRL", "12345678"),
        ];
        // Only "b" would match on raw id containment; the shared id still wins.
        assert!(best_match(&companies, "Delta SRL", "CUI 12345678").is_none());
    }

    #[test]
    fn test_two_exact_hits_do_not_fall_through() {
        let companies = fixtures();
        assert!(best_match(&companies, "Alfa Construct SRL", "12345678 si 87654321").is_none());
    }

    #[test]
    fn test_fuzzy_name_match() {
        let companies = fixtures();
        let matched = best_match(&companies, "  BETA   logistic srl ", NOT_FOUND).unwrap();
        assert_eq!(matched.id, "beta");

        // Extracted name longer than the stored one.
        let matched = best_match(&companies, "SC Alfa Construct SRL - in faliment", "").unwrap();
        assert_eq!(matched.id, "alfa");
    }

    #[test]
    fn test_fuzzy_ambiguity_returns_none() {
        let companies = vec![
            company("a", "Alfa SRL", ""),
            company("b", "Alfa SRL Cluj", ""),
        ];
        assert!(best_match(&companies, "Alfa SRL", "").is_none());
    }

    #[test]
    fn test_missing_name_or_companies() {
        let companies = fixtures();
        assert!(best_match(&companies, NOT_FOUND, "12345678").is_none());
        assert!(best_match(&companies, "  ", "12345678").is_none());
        assert!(best_match(&[], "Alfa Construct SRL", "12345678").is_none());
    }

    #[test]
    fn test_blank_company_name_is_not_a_wildcard() {
        let companies = vec![company("blank", "   ", ""), company("alfa", "Alfa SRL", "")];
        assert_eq!(best_match(&companies, "Alfa SRL", "").unwrap().id, "alfa");
    }

    #[test]
    fn test_suggest_by_raw_id_containment() {
        let companies = vec![company("x", "Xenon SRL", "RO445566")];
        let suggestions = suggest_companies(&companies, "Alt nume", "cod fiscal ro445566");
        assert_eq!(suggestions.len(), 1);
    }

    #[test]
    fn test_two_sided_single_side() {
        let companies = fixtures();
        let matched = best_match_two_sided(
            &companies,
            PartyRef::new("Beta Logistic SRL", ""),
            PartyRef::new("Primaria Cluj", ""),
        )
        .unwrap();
        assert_eq!(matched.id, "beta");
    }

    #[test]
    fn test_two_sided_conflicting_sides() {
        let companies = fixtures();
        let matched = best_match_two_sided(
            &companies,
            PartyRef::new("Alfa Construct SRL", ""),
            PartyRef::new("Beta Logistic SRL", ""),
        );
        assert!(matched.is_none());
    }

    #[test]
    fn test_two_sided_intersection() {
        let companies = vec![company("a", "Alfa SRL", ""), company("b", "Beta SRL", "")];
        // First side hits both, second only "b".
        let matched = best_match_two_sided(
            &companies,
            PartyRef::new("Asocierea Alfa SRL si Beta SRL", ""),
            PartyRef::new("Beta SRL", ""),
        )
        .unwrap();
        assert_eq!(matched.id, "b");
    }

    #[test]
    fn test_two_sided_exact_ids_pooled() {
        let companies = fixtures();
        let matched = best_match_two_sided(
            &companies,
            PartyRef::new(NOT_FOUND, NOT_FOUND),
            PartyRef::new("Alfa Construct SRL", "RO 87654321"),
        )
        .unwrap();
        assert_eq!(matched.id, "beta");

        let ambiguous = best_match_two_sided(
            &companies,
            PartyRef::new("x", "12345678"),
            PartyRef::new("y", "87654321"),
        );
        assert!(ambiguous.is_none());
    }

    #[test]
    fn test_filter_companies() {
        let companies = fixtures();
        assert_eq!(filter_companies(&companies, "").len(), 2);
        assert_eq!(filter_companies(&companies, "  beta ")[0].id, "beta");
        assert_eq!(filter_companies(&companies, "8765")[0].id, "beta");
        assert!(filter_companies(&companies, "gama").is_empty());
    }
}
