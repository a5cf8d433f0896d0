//! Generates candidate email addresses for extracted people.

use crate::core::models::{EmailPattern, ExtractedPerson, LeadSource, NameParts, PatternInfo, PersonRecord};
use crate::utils::text::clean_text;

/// Keeps alphanumerics, apostrophes and hyphens, lower-cased.
fn sanitize_name_part(part: &str) -> String {
    part.trim()
        .replace(
            |c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'),
            "",
        )
        .to_lowercase()
}

/// Splits a free-text name into first/last tokens and their initials.
///
/// Returns `None` when the name has no usable token. A single token yields an
/// empty `last`.
pub fn split_name(full_name: &str) -> Option<NameParts> {
    let cleaned = clean_text(full_name);
    let tokens: Vec<String> = cleaned
        .split(' ')
        .map(sanitize_name_part)
        .filter(|t| !t.is_empty())
        .collect();

    let first = tokens.first()?.clone();
    let last = if tokens.len() > 1 {
        tokens.last().cloned().unwrap_or_default()
    } else {
        String::new()
    };
    let first_initial = first.chars().next().map(String::from).unwrap_or_default();
    let last_initial = last.chars().next().map(String::from).unwrap_or_default();

    Some(NameParts {
        first,
        last,
        first_initial,
        last_initial,
    })
}

/// Produces candidate records for `person` on `domain`.
///
/// With an inferred pattern exactly that template is used, otherwise every
/// template in [`EmailPattern::ALL`]. Templates that would render an empty
/// segment (no last name) are skipped instead of producing `.@domain`-style
/// addresses.
pub fn generate_candidates(
    person: &ExtractedPerson,
    domain: &str,
    pattern_info: &PatternInfo,
) -> Vec<PersonRecord> {
    let domain = domain.trim().to_lowercase();
    if domain.is_empty() {
        return Vec::new();
    }
    let Some(parts) = split_name(&person.name) else {
        tracing::debug!(target: "lead_pipeline", "No usable name tokens in '{}', no candidates.", person.name);
        return Vec::new();
    };

    let templates: Vec<EmailPattern> = match pattern_info.best_pattern {
        Some(best) => vec![best],
        None => EmailPattern::ALL.to_vec(),
    };

    let candidates: Vec<PersonRecord> = templates
        .iter()
        .filter_map(|template| template.local_part(&parts))
        .map(|local| PersonRecord {
            name: person.name.clone(),
            role: person.role.clone(),
            email: Some(format!("{}@{}", local, domain).to_lowercase()),
            source: LeadSource::Pattern,
        })
        .collect();

    tracing::trace!(target: "lead_pipeline",
        "Generated {} candidates for '{}' @ {}", candidates.len(), person.name, domain);
    candidates
}

/// True if `role` mentions any of `targets`, ignoring case.
pub fn matches_target_role(role: &str, targets: &[String]) -> bool {
    let role = role.to_lowercase();
    targets
        .iter()
        .map(|t| t.trim().to_lowercase())
        .any(|t| !t.is_empty() && role.contains(&t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn person(name: &str) -> ExtractedPerson {
        ExtractedPerson {
            name: name.to_string(),
            role: "Head of Growth".to_string(),
        }
    }

    fn emails(records: &[PersonRecord]) -> Vec<String> {
        records.iter().filter_map(|r| r.email.clone()).collect()
    }

    #[test]
    fn test_inferred_pattern_yields_single_candidate() {
        let info = PatternInfo {
            best_pattern: Some(EmailPattern::First),
            ..PatternInfo::default()
        };
        let out = generate_candidates(&person("Jane Doe"), "acme.co", &info);
        assert_eq!(emails(&out), vec!["jane@acme.co"]);
        assert_eq!(out[0].source, LeadSource::Pattern);
        assert_eq!(out[0].role, "Head of Growth");
    }

    #[test]
    fn test_fallback_set_without_pattern() {
        let out = generate_candidates(&person("Jane Doe"), "acme.co", &PatternInfo::default());
        assert_eq!(
            emails(&out),
            vec![
                "jane@acme.co",
                "jane.doe@acme.co",
                "jdoe@acme.co",
                "janed@acme.co",
                "j.doe@acme.co",
            ]
        );
    }

    #[test]
    fn test_single_token_skips_last_name_templates() {
        let out = generate_candidates(&person("Cher"), "acme.co", &PatternInfo::default());
        assert_eq!(emails(&out), vec!["cher@acme.co"]);

        let info = PatternInfo {
            best_pattern: Some(EmailPattern::FirstDotLast),
            ..PatternInfo::default()
        };
        assert!(generate_candidates(&person("Cher"), "acme.co", &info).is_empty());
    }

    #[test]
    fn test_empty_or_symbol_only_names() {
        let info = PatternInfo::default();
        assert!(generate_candidates(&person(""), "acme.co", &info).is_empty());
        assert!(generate_candidates(&person("   "), "acme.co", &info).is_empty());
        assert!(generate_candidates(&person("$%^"), "acme.co", &info).is_empty());
        assert!(generate_candidates(&person("Jane Doe"), "", &info).is_empty());
    }

    #[test]
    fn test_middle_names_and_punctuation() {
        let parts = split_name("  John  A.  Smith, ").unwrap();
        assert_eq!(parts.first, "john");
        assert_eq!(parts.last, "smith");
        assert_eq!(parts.first_initial, "j");
        assert_eq!(parts.last_initial, "s");
    }

    #[test]
    fn test_target_role_matching() {
        let targets = vec!["Marketing".to_string(), "CEO".to_string()];
        assert!(matches_target_role("VP of marketing", &targets));
        assert!(matches_target_role("Co-founder & CEO", &targets));
        assert!(!matches_target_role("Accountant", &targets));
        assert!(!matches_target_role("Marketing", &[]));
    }

    proptest! {
        #[test]
        fn prop_candidates_are_lower_case(name in "[A-Za-z]{1,8}( [A-Za-z]{1,8}){0,2}", domain in "[A-Za-z]{2,8}\\.(com|CO|io)") {
            let out = generate_candidates(&person(&name), &domain, &PatternInfo::default());
            for email in emails(&out) {
                prop_assert_eq!(email.clone(), email.to_lowercase());
            }
        }
    }
}
