use once_cell::sync::Lazy;
use regex::Regex;

static NEW_IC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{12}$").expect("valid regex"));
static OLD_IC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]\d{7}$").expect("valid regex"));
static PASSPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{1,2}\d{6,9}$").expect("valid regex"));

/// CCRIS identification type for a borrower or collateral owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdType {
    NewIc,
    OldIc,
    Passport,
    Business,
    Unknown,
}

impl IdType {
    pub fn code(self) -> &'static str {
        match self {
            IdType::NewIc => "01",
            IdType::OldIc => "02",
            IdType::Passport => "03",
            IdType::Business => "04",
            IdType::Unknown => "99",
        }
    }
}

/// Upper-case and drop the separators staff key into ID numbers
/// (`850101-14-5678` → `850101145678`).
pub fn normalize_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '-' | ' ' | '/'))
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn classify_id(raw: &str) -> (IdType, String) {
    let id = normalize_id(raw);
    let kind = if id.is_empty() {
        IdType::Unknown
    } else if NEW_IC.is_match(&id) {
        IdType::NewIc
    } else if OLD_IC.is_match(&id) {
        IdType::OldIc
    } else if PASSPORT.is_match(&id) {
        IdType::Passport
    } else {
        IdType::Business
    };
    (kind, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_shapes() {
        assert_eq!(
            classify_id("850101-14-5678"),
            (IdType::NewIc, "850101145678".to_string())
        );
        assert_eq!(classify_id("a1234567").0, IdType::OldIc);
        assert_eq!(classify_id("AB123456").0, IdType::Passport);
        assert_eq!(classify_id("K12345678").0, IdType::Passport);
        assert_eq!(
            classify_id("123456-K"),
            (IdType::Business, "123456K".to_string())
        );
        assert_eq!(classify_id("   ").0, IdType::Unknown);
        assert_eq!(IdType::Unknown.code(), "99");
    }

    #[test]
    fn separators_are_dropped_before_classifying() {
        assert_eq!(
            classify_id(" 900212-10-5566 "),
            (IdType::NewIc, "900212105566".to_string())
        );
        assert_eq!(normalize_id("a 123/45-67"), "A1234567");
        assert_eq!(classify_id("a 123/45-67").0, IdType::OldIc);
    }
}
