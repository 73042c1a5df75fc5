//! Patterns for contact details and labeled profile links

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Phone numbers: optional country code, optional (area) code, up to four
/// digit groups and an optional `x123` extension
pub static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+\d{1,3}[-.\s]?)?(\(?\d{1,4}\)?[-.\s]?)?(\d{1,4}[-.\s]?){1,3}\d{1,4}(\s?x\d+)?")
        .expect("valid regex")
});

pub static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}(\.[a-zA-Z]{2,})?")
        .expect("valid regex")
});

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}[-./]\d{2}[-./]\d{2}$").expect("valid regex"));

/// Fewest digits a phone candidate needs before it is reported
const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

/// Label and pattern of every link category, in reporting order
///
/// Patterns are anchored when compiled, so an href must match as a whole.
const LINK_CATEGORY_SOURCES: &[(&str, &str)] = &[
    (
        "GitHub link",
        r"https?://(www\.)?github\.com/[a-zA-Z0-9_-]+(/[a-zA-Z0-9._-]+)*(\?[a-zA-Z0-9=&%]+)?",
    ),
    (
        "LinkedIn link",
        r"https?://(www\.)?linkedin\.com/(in|company)/[a-zA-Z0-9_-]+(/[a-zA-Z0-9._-]+)*/?",
    ),
    (
        "Social Media link",
        r"https?://(www\.)?(facebook|twitter|instagram|pinterest)\.com/[a-zA-Z0-9_-]+/?",
    ),
    ("Job Posting", r"https?://(www\.)?linkedin\.com/jobs/view/\d+/?"),
    (
        "Academic Publication",
        r"https?://(www\.)?researchgate\.net/publication/\d+[a-zA-Z0-9_-]*/?",
    ),
    (
        "Portfolio link",
        r"https?://(www\.)?([a-zA-Z0-9_-]+\.)+[a-zA-Z]{2,6}/(portfolio|projects|work|my-work|my-projects)/?[a-zA-Z0-9_-]*",
    ),
];

/// A compiled link category
#[derive(Debug)]
pub struct LinkCategory {
    pub label: &'static str,
    pattern: Regex,
}

impl LinkCategory {
    pub fn matches(&self, href: &str) -> bool {
        self.pattern.is_match(href)
    }
}

/// Compiled link categories
///
/// A pattern that fails to compile is logged and left out; the remaining
/// categories keep working.
pub static LINK_CATEGORIES: LazyLock<Vec<LinkCategory>> = LazyLock::new(|| {
    LINK_CATEGORY_SOURCES
        .iter()
        .filter_map(|&(label, source)| match Regex::new(&format!("^(?:{})$", source)) {
            Ok(pattern) => Some(LinkCategory { label, pattern }),
            Err(e) => {
                warn!(category = label, error = %e, "Skipping link category with invalid pattern");
                None
            }
        })
        .collect()
});

/// Finds phone numbers in free text
///
/// Raw pattern hits are trimmed of trailing separators and kept only when
/// they carry a plausible number of digits and do not look like a date.
pub fn find_phone_numbers(text: &str) -> Vec<String> {
    PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['-', '.', ' ', '\t', '\n']).trim())
        .filter(|candidate| is_plausible_phone(candidate))
        .map(str::to_string)
        .collect()
}

/// Finds email addresses in free text
pub fn find_emails(text: &str) -> Vec<String> {
    EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Labels of every category the href belongs to
pub fn categorize_link(href: &str) -> Vec<&'static str> {
    LINK_CATEGORIES
        .iter()
        .filter(|category| category.matches(href))
        .map(|category| category.label)
        .collect()
}

fn is_plausible_phone(candidate: &str) -> bool {
    let number = match candidate.split_once('x') {
        Some((number, _)) => number,
        None => candidate,
    };
    let digits = number.chars().filter(char::is_ascii_digit).count();

    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) && !ISO_DATE_RE.is_match(number.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_categories_compile() {
        assert_eq!(LINK_CATEGORIES.len(), LINK_CATEGORY_SOURCES.len());
    }

    #[test]
    fn test_international_phone_number() {
        let phones = find_phone_numbers("Call us at +1-415-555-0100 today");
        assert_eq!(phones.len(), 1);
        assert!(phones[0].contains("415-555-0100"));
    }

    #[test]
    fn test_phone_with_area_code_and_extension() {
        let phones = find_phone_numbers("Office: (415) 555 0100 x42");
        assert_eq!(phones.len(), 1);
        assert!(phones[0].ends_with("x42"));
    }

    #[test]
    fn test_short_numbers_are_not_phones() {
        assert!(find_phone_numbers("Founded in 1999 with 250 staff").is_empty());
    }

    #[test]
    fn test_dates_are_not_phones() {
        assert!(find_phone_numbers("Updated 2024-01-15").is_empty());
    }

    #[test]
    fn test_find_emails() {
        let emails = find_emails("Write to contact@example.com or sales@example.co.uk.");
        assert_eq!(
            emails,
            vec!["contact@example.com".to_string(), "sales@example.co.uk".to_string()]
        );
    }

    #[test]
    fn test_github_repository_link() {
        assert_eq!(
            categorize_link("https://github.com/acme/repo"),
            vec!["GitHub link"]
        );
        assert!(categorize_link("https://github.com/").is_empty());
    }

    #[test]
    fn test_linkedin_profile_and_company() {
        assert_eq!(
            categorize_link("https://www.linkedin.com/in/jane-doe"),
            vec!["LinkedIn link"]
        );
        assert_eq!(
            categorize_link("https://linkedin.com/company/acme"),
            vec!["LinkedIn link"]
        );
    }

    #[test]
    fn test_job_posting_is_not_a_profile() {
        assert_eq!(
            categorize_link("https://www.linkedin.com/jobs/view/123456"),
            vec!["Job Posting"]
        );
    }

    #[test]
    fn test_social_media_and_publication() {
        assert_eq!(
            categorize_link("https://twitter.com/acme"),
            vec!["Social Media link"]
        );
        assert_eq!(
            categorize_link("https://www.researchgate.net/publication/98765"),
            vec!["Academic Publication"]
        );
    }

    #[test]
    fn test_link_in_two_categories() {
        let labels = categorize_link("https://github.com/projects/acme");
        assert!(labels.contains(&"GitHub link"));
        assert!(labels.contains(&"Portfolio link"));
    }

    #[test]
    fn test_partial_match_is_rejected() {
        assert!(categorize_link("see https://github.com/acme/repo").is_empty());
    }
}
