//! Line classification: does a line open a position record or a person
//! record?
//!
//! Both record types start with a numeric prefix in flattened table text.
//! Person lines carry a compound identifier (8-digit national id, a letter,
//! digits, letters, digits) followed by `SURNAMES, NAME`; position lines
//! carry a bare 6 to 8 digit code followed by the title. The comma and the
//! shape of the alphanumeric suffix are the only reliable discriminators.

use std::sync::LazyLock;

use regex::Regex;

/// Optional leading digit, then a 6-8 digit code directly followed by an
/// uppercase letter.
static POSITION_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d?\s*\d{6,8}[A-ZÁÉÍÓÚÑ]").expect("valid regex"));

/// Code followed by letter, digits, letters, digits: the compound
/// identifier shape that only person lines carry.
static COMPOUND_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{6,8}[A-Z]\d+[A-Z]+\d+").expect("valid regex"));

/// Compound identifier followed later by a comma (`SURNAMES, NAME`).
static COMPOUND_BEFORE_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{8}[A-Z]\d+[A-Z].*,").expect("valid regex"));

/// Civil-servant person line: identifier, uppercase surnames, comma, name.
static PERSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d{8}[A-Z]\d+[A-Z]+\d+[A-ZÁÉÍÓÚÑ\s]+,\s*[A-ZÁÉÍÓÚÑ]").expect("valid regex")
});

/// Labor-contract person line: a literal `L` precedes the trailing digits
/// of the identifier.
static LABOR_PERSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d{8}[A-Z]\d+L\d+[A-ZÁÉÍÓÚÑ\s]+,\s*[A-ZÁÉÍÓÚÑ]").expect("valid regex")
});

/// What kind of record a line opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// The line starts a position record.
    Position,
    /// The line starts a person (occupant) record.
    Person,
    /// Neither: headers, continuation lines, page furniture.
    Other,
}

/// Returns `true` if `line` opens a position record.
#[must_use]
pub fn is_position_line(line: &str) -> bool {
    if line.contains(',') && COMPOUND_BEFORE_COMMA_RE.is_match(line) {
        return false;
    }
    POSITION_START_RE.is_match(line) && !COMPOUND_PREFIX_RE.is_match(line)
}

/// Returns `true` if `line` opens a person record.
#[must_use]
pub fn is_person_line(line: &str) -> bool {
    PERSON_RE.is_match(line) || LABOR_PERSON_RE.is_match(line)
}

/// Classifies a line. Position lines take precedence, though the two
/// predicates never both hold for the same line.
#[must_use]
pub fn classify(line: &str) -> LineKind {
    if is_position_line(line) {
        LineKind::Position
    } else if is_person_line(line) {
        LineKind::Person
    } else {
        LineKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSITION: &str = "111111JEFE DE SERVICIO.... A1 P-A1 28 1 SEVILLA";
    const PREFIXED_POSITION: &str = "1 0111111JEFE DE NEGOCIADO.... C1 P-C1 18 1";
    const PERSON: &str = "12345678A1X123456PEREZ GARCIA, JUAN A2 PROVISIONAL";
    const LABOR_PERSON: &str = "87654321B2L34LOPEZ RUIZ, MARIA LABORAL";

    #[test]
    fn recognises_position_lines() {
        assert!(is_position_line(POSITION));
        assert!(is_position_line(PREFIXED_POSITION));
        assert_eq!(classify(POSITION), LineKind::Position);
    }

    #[test]
    fn recognises_person_lines() {
        assert!(is_person_line(PERSON));
        assert!(is_person_line(LABOR_PERSON));
        assert_eq!(classify(PERSON), LineKind::Person);
        assert_eq!(classify(LABOR_PERSON), LineKind::Person);
    }

    #[test]
    fn person_lines_are_not_position_lines() {
        assert!(!is_position_line(PERSON));
        assert!(!is_position_line(LABOR_PERSON));
    }

    #[test]
    fn compound_prefix_without_comma_is_not_a_position() {
        assert!(!is_position_line("12345678A1X123456PEREZ GARCIA JUAN"));
        assert!(!is_person_line("12345678A1X123456PEREZ GARCIA JUAN"));
    }

    #[test]
    fn code_followed_by_space_is_not_a_position() {
        assert!(!is_position_line("00123456 ADMINISTRATIVE ASSISTANT.... A2 P-A2 01 1"));
    }

    #[test]
    fn position_lines_are_not_person_lines() {
        assert!(!is_person_line(POSITION));
        assert!(!is_person_line(PREFIXED_POSITION));
    }

    #[test]
    fn other_lines_are_neither() {
        assert_eq!(classify("RELACIÓN DE PUESTOS DE TRABAJO"), LineKind::Other);
        assert_eq!(classify("Fecha: 01/02/2024"), LineKind::Other);
        assert_eq!(classify(""), LineKind::Other);
        assert_eq!(classify("12345 SHORT CODE"), LineKind::Other);
    }
}
