use std::sync::OnceLock;

use regex::Regex;

use crate::model::StyleClass;

static DIGITS: OnceLock<Regex> = OnceLock::new();

fn digits() -> &'static Regex {
    DIGITS.get_or_init(|| Regex::new("[0-9]+").expect("static pattern"))
}

/// A special event has a subject without any outline number. Empty subjects
/// are not special.
pub fn is_special(subject: &str) -> bool {
    !subject.is_empty() && !digits().is_match(subject)
}

/// Fill style for a row emitted when the band counter is at `counter`.
pub fn classify(subject: &str, counter: usize) -> StyleClass {
    if is_special(subject) {
        StyleClass::Special
    } else if counter % 2 == 0 {
        StyleClass::OrdinaryEven
    } else {
        StyleClass::OrdinaryOdd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_subjects_are_ordinary() {
        assert!(!is_special("12 Trusting God"));
        assert!(!is_special("Discurso nº 187"));
        assert!(!is_special("7"));
    }

    #[test]
    fn titled_subjects_are_special() {
        assert!(is_special("Family Worship"));
        assert!(is_special("Assembleia de Circuito"));
        assert!(is_special("   "));
    }

    #[test]
    fn empty_subject_falls_back_to_parity() {
        assert!(!is_special(""));
        assert_eq!(classify("", 2), StyleClass::OrdinaryEven);
        assert_eq!(classify("", 3), StyleClass::OrdinaryOdd);
    }

    #[test]
    fn special_overrides_parity() {
        assert_eq!(classify("Visita do Superintendente", 0), StyleClass::Special);
        assert_eq!(classify("Visita do Superintendente", 1), StyleClass::Special);
        assert_eq!(classify("45 Seguir", 1), StyleClass::OrdinaryOdd);
    }
}
