//! Field extractors.
//!
//! Each extractor is a pure function from a line (or, for the province, a
//! line plus its lookahead window) to an optional value. A miss is never an
//! error: unrecognised text simply yields `None`.
//!
//! Position-line extractors: [`extract_code`], [`extract_title`],
//! [`extract_grade`], [`extract_corps`], [`extract_province`],
//! [`extract_funding_status`]. Person-line extractors:
//! [`extract_occupant_name`], [`extract_national_id`],
//! [`extract_tenure_type`], bundled by [`extract_occupant`].

use std::sync::LazyLock;

use regex::Regex;
use roster_diff_roster_models::{FundingStatus, Province, TenureType};

use crate::rules::{PatternRule, RuleChain, collapse_whitespace};

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{6,8}").expect("valid regex"));

static NATIONAL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{8}[A-Z]").expect("valid regex"));

static PROVINCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(ALMER[IÍ]A|C[AÁ]DIZ|C[OÓ]RDOBA|GRANADA|HUELVA|JA[EÉ]N|M[AÁ]LAGA|SEVILLA|MADRID|SS\.?CC\.?|SERVICIOS CENTRALES)\b",
    )
    .expect("valid regex")
});

/// Dotted leader followed by two counts; the second is the funded count.
static DOTTED_COUNTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.+\s+(\d+)\s+(\d+)(?:\s|$)").expect("valid regex"));

/// Title rules, applied to the text after the position code. The title
/// ends at a dotted leader, a grade token or a pair of numbers.
static TITLE_RULES: LazyLock<RuleChain> = LazyLock::new(|| {
    RuleChain::new(vec![PatternRule::with_refine(
        "title_before_leader",
        r"^\s*([A-ZÁÉÍÓÚÑ][A-ZÁÉÍÓÚÑa-záéíóúñ\s./()ºª\-]+?)(?:\.{2,}|\s+[A-E]\d|\s+\d+\s+\d+)",
        refine_title,
    )])
});

static GRADE_RULES: LazyLock<RuleChain> = LazyLock::new(|| {
    RuleChain::new(vec![
        // Newer layouts: grade, space, corps code (`A1 P-A1`).
        PatternRule::new(
            "grade_spaced_corps",
            r"\s+([A-E]\d(?:-[A-E]\d)?)\s+P-[A-E]\d",
        ),
        // Older layouts glue the corps code to the grade (`A1P-A1`).
        PatternRule::new("grade_glued_corps", r"\s+([A-E]\d(?:-[A-E]\d)?)P-[A-E]\d"),
        // Labor positions use a roman-numeral group.
        PatternRule::new("grade_roman", r"\s+([IVX]+)\s+[A-Z]"),
    ])
});

static CORPS_RULES: LazyLock<RuleChain> = LazyLock::new(|| {
    RuleChain::new(vec![
        PatternRule::new("corps_code", r"(P-[A-E]\d+)[\s\w]"),
        // Legacy layout: roman grade, textual category, two-digit level.
        PatternRule::with_refine(
            "corps_legacy_category",
            r"[IVX]+\s+([A-ZÁÉÍÓÚÑ\s.]+?)\s+\d{2}\s+",
            refine_corps_category,
        ),
    ])
});

/// Person-line name: the text after the compound identifier, up to a grade
/// token, the civil-servant marker `FUNC.` or the labor marker `LABORAL`.
static OCCUPANT_RULES: LazyLock<RuleChain> = LazyLock::new(|| {
    RuleChain::new(vec![PatternRule::with_refine(
        "occupant_after_identifier",
        r"\d{8}[A-Z]\d+[A-Z]+\d+([A-ZÁÉÍÓÚÑ\s,.]+?)(?:\s+[A-E]\d|\s+FUNC\.|LABORAL|[A-E]\d+\s)",
        refine_occupant_name,
    )])
});

/// Tenure literals in check order. `PROVISIONAL` wins when both appear.
const TENURE_LITERALS: &[(&str, TenureType)] = &[
    ("PROVISIONAL", TenureType::Provisional),
    ("DEFINITIVO", TenureType::Permanent),
];

/// Literal marking an unfunded position in every layout that prints it.
const UNFUNDED_LITERAL: &str = "NO DOTADA";

/// Funding tiers in check order. The first tier that returns a status
/// decides; lines matching no tier are funded.
const FUNDING_RULES: &[(&str, fn(&str) -> Option<FundingStatus>)] = &[
    ("unfunded_literal", funding_from_literal),
    ("dotted_counts", funding_from_dotted_counts),
    ("trailing_n_flag", funding_from_trailing_flag),
];

fn refine_title(captured: &str) -> Option<String> {
    let title = captured.trim().trim_end_matches('.').trim();
    (title.chars().count() > 2).then(|| title.to_string())
}

fn refine_corps_category(captured: &str) -> Option<String> {
    let category = collapse_whitespace(captured);
    (category.chars().count() > 3).then_some(category)
}

fn refine_occupant_name(captured: &str) -> Option<String> {
    let name = collapse_whitespace(captured);
    (name.chars().count() > 5 && name.contains(',')).then_some(name)
}

fn funding_from_literal(line: &str) -> Option<FundingStatus> {
    line.to_uppercase()
        .contains(UNFUNDED_LITERAL)
        .then_some(FundingStatus::Unfunded)
}

fn funding_from_dotted_counts(line: &str) -> Option<FundingStatus> {
    let caps = DOTTED_COUNTS_RE.captures(line)?;
    Some(if &caps[2] == "0" {
        FundingStatus::Unfunded
    } else {
        FundingStatus::Funded
    })
}

// TODO: only the last two tokens are inspected. Check the sample corpus
// for layouts where the flag sits further left before widening this.
fn funding_from_trailing_flag(line: &str) -> Option<FundingStatus> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() > 2 && tokens[tokens.len() - 2..].contains(&"N") {
        return Some(FundingStatus::Unfunded);
    }
    None
}

/// First run of 6 to 8 digits in the line.
#[must_use]
pub fn extract_code(line: &str) -> Option<String> {
    CODE_RE.find(line).map(|m| m.as_str().to_string())
}

/// Position title: the text right after the code, cut at the first dotted
/// leader, grade token or pair of numbers. Titles shorter than 3 characters
/// are rejected.
#[must_use]
pub fn extract_title(line: &str) -> Option<String> {
    let code = CODE_RE.find(line)?;
    TITLE_RULES.first_match(&line[code.end()..])
}

/// Pay grade (`A1`, `A1-A2`, `IV`).
#[must_use]
pub fn extract_grade(line: &str) -> Option<String> {
    GRADE_RULES.first_match(line)
}

/// Corps code (`P-A11`) or, in legacy layouts, the textual category.
#[must_use]
pub fn extract_corps(line: &str) -> Option<String> {
    CORPS_RULES.first_match(line)
}

/// Province, searched in the position line first and then in each
/// lookahead line in order.
#[must_use]
pub fn extract_province<S: AsRef<str>>(line: &str, lookahead: &[S]) -> Province {
    std::iter::once(line)
        .chain(lookahead.iter().map(AsRef::as_ref))
        .find_map(|text| {
            PROVINCE_RE
                .captures(text)
                .and_then(|caps| Province::from_name(&caps[1]))
        })
        .unwrap_or(Province::Unspecified)
}

/// Funding status via the three format-era tiers: the explicit
/// `NO DOTADA` literal, the funded count after a dotted leader, and a lone
/// `N` among the last two tokens.
#[must_use]
pub fn extract_funding_status(line: &str) -> FundingStatus {
    FUNDING_RULES
        .iter()
        .find_map(|(name, rule)| {
            let status = rule(line)?;
            log::trace!("funding rule '{name}' matched: {status}");
            Some(status)
        })
        .unwrap_or(FundingStatus::Funded)
}

/// Holder name from a person line (`SURNAMES, NAME`).
#[must_use]
pub fn extract_occupant_name(line: &str) -> Option<String> {
    OCCUPANT_RULES.first_match(line)
}

/// First 8-digits-then-letter run in a person line.
#[must_use]
pub fn extract_national_id(line: &str) -> Option<String> {
    NATIONAL_ID_RE.find(line).map(|m| m.as_str().to_string())
}

/// Tenure literal anywhere in the line, case-insensitive.
#[must_use]
pub fn extract_tenure_type(line: &str) -> Option<TenureType> {
    let upper = line.to_uppercase();
    TENURE_LITERALS
        .iter()
        .find(|(literal, _)| upper.contains(literal))
        .map(|(_, tenure)| *tenure)
}

/// Fields read from a person line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupantFields {
    pub name: Option<String>,
    pub national_id: Option<String>,
    pub tenure_type: Option<TenureType>,
}

/// Applies every person-line extractor to `line`.
#[must_use]
pub fn extract_occupant(line: &str) -> OccupantFields {
    OccupantFields {
        name: extract_occupant_name(line),
        national_id: extract_national_id(line),
        tenure_type: extract_tenure_type(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = "00123456 ADMINISTRATIVE ASSISTANT.... A2 P-A2 01 1";
    const PERSON: &str = "12345678A1X123456PEREZ GARCIA, JUAN A2 PROVISIONAL";

    #[test]
    fn extracts_scenario_position_fields() {
        assert_eq!(extract_code(SCENARIO).as_deref(), Some("00123456"));
        assert_eq!(
            extract_title(SCENARIO).as_deref(),
            Some("ADMINISTRATIVE ASSISTANT")
        );
        assert_eq!(extract_grade(SCENARIO).as_deref(), Some("A2"));
        assert_eq!(extract_corps(SCENARIO).as_deref(), Some("P-A2"));
        assert_eq!(extract_funding_status(SCENARIO), FundingStatus::Funded);
    }

    #[test]
    fn code_takes_first_digit_run() {
        assert_eq!(
            extract_code("1 0111111JEFE DE NEGOCIADO").as_deref(),
            Some("0111111")
        );
        assert_eq!(extract_code("123456789X").as_deref(), Some("12345678"));
        assert_eq!(extract_code("12345 ONLY FIVE"), None);
    }

    #[test]
    fn title_stops_at_grade_token_or_number_pair() {
        assert_eq!(
            extract_title("111111JEFE DE SECCION A1 P-A1").as_deref(),
            Some("JEFE DE SECCION")
        );
        assert_eq!(
            extract_title("222222AUXILIAR ADMINISTRATIVO 1 1 SEVILLA").as_deref(),
            Some("AUXILIAR ADMINISTRATIVO")
        );
    }

    #[test]
    fn short_or_missing_titles_are_rejected() {
        assert_eq!(extract_title("111111AB.... A1 P-A1"), None);
        assert_eq!(extract_title("111111 12 13"), None);
        assert_eq!(extract_title("NO CODE HERE"), None);
    }

    #[test]
    fn grade_glued_to_corps_code() {
        assert_eq!(
            extract_grade("111111TECNICO.... A1-A2P-A11 28").as_deref(),
            Some("A1-A2")
        );
    }

    #[test]
    fn grade_roman_numeral_group() {
        assert_eq!(
            extract_grade("333333ORDENANZA.... V PERSONAL SUBALTERNO 14 1").as_deref(),
            Some("V")
        );
    }

    #[test]
    fn spaced_grade_wins_over_roman_numeral() {
        assert_eq!(
            extract_grade("111111JEFE.... IV X A1 P-A1 28").as_deref(),
            Some("A1")
        );
    }

    #[test]
    fn corps_legacy_category() {
        assert_eq!(
            extract_corps("333333ORDENANZA.... V PERSONAL  SUBALTERNO 14 1").as_deref(),
            Some("PERSONAL SUBALTERNO")
        );
        assert_eq!(extract_corps("333333ORDENANZA.... V ABC 14 1"), None);
        assert_eq!(extract_corps("333333ORDENANZA"), None);
    }

    #[test]
    fn province_found_in_position_line() {
        let lookahead: [&str; 0] = [];
        assert_eq!(
            extract_province("111111JEFE.... A1 P-A1 28 1 Sevilla", &lookahead),
            Province::Sevilla
        );
    }

    #[test]
    fn province_found_in_lookahead_window() {
        assert_eq!(
            extract_province(
                "111111JEFE.... A1 P-A1 28 1",
                &["CENTRO DIRECTIVO", "DELEGACION TERRITORIAL DE MÁLAGA"]
            ),
            Province::Malaga
        );
        assert_eq!(
            extract_province("111111JEFE", &["SERVICIOS CENTRALES"]),
            Province::CentralServices
        );
        assert_eq!(
            extract_province("111111JEFE", &["UNIDAD SS.CC. 2"]),
            Province::CentralServices
        );
    }

    #[test]
    fn province_unspecified_when_window_has_no_match() {
        assert_eq!(
            extract_province("111111JEFE", &["NOTHING", "HERE"]),
            Province::Unspecified
        );
    }

    #[test]
    fn province_requires_word_boundaries() {
        assert_eq!(
            extract_province("111111JEFE", &["GRANADAS"]),
            Province::Unspecified
        );
    }

    #[test]
    fn funding_unfunded_literal() {
        assert_eq!(
            extract_funding_status("111111JEFE.... A1 P-A1 no dotada"),
            FundingStatus::Unfunded
        );
    }

    #[test]
    fn funding_dotted_counts() {
        assert_eq!(
            extract_funding_status("111111JEFE DE SERVICIO...... 1 0 SEVILLA"),
            FundingStatus::Unfunded
        );
        assert_eq!(
            extract_funding_status("111111JEFE DE SERVICIO...... 1 1 SEVILLA"),
            FundingStatus::Funded
        );
    }

    #[test]
    fn funding_dotted_counts_at_end_of_line() {
        assert_eq!(
            extract_funding_status("333333ORDENANZA...... 1 0"),
            FundingStatus::Unfunded
        );
        assert_eq!(
            extract_funding_status("333333ORDENANZA...... 1 1"),
            FundingStatus::Funded
        );
    }

    #[test]
    fn funding_trailing_n_flag() {
        assert_eq!(
            extract_funding_status("111111JEFE A1 P-A1 28 N"),
            FundingStatus::Unfunded
        );
        assert_eq!(
            extract_funding_status("111111JEFE A1 P-A1 N 28"),
            FundingStatus::Unfunded
        );
        assert_eq!(
            extract_funding_status("111111JEFE N P-A1 28 1"),
            FundingStatus::Funded
        );
    }

    #[test]
    fn occupant_scenario() {
        let fields = extract_occupant(PERSON);
        assert_eq!(fields.name.as_deref(), Some("PEREZ GARCIA, JUAN"));
        assert_eq!(fields.national_id.as_deref(), Some("12345678A"));
        assert_eq!(fields.tenure_type, Some(TenureType::Provisional));
    }

    #[test]
    fn occupant_name_stops_at_markers() {
        assert_eq!(
            extract_occupant_name("87654321B2L34LOPEZ RUIZ, MARIA LABORAL FIJO").as_deref(),
            Some("LOPEZ RUIZ, MARIA")
        );
        assert_eq!(
            extract_occupant_name("87654321B2C34SANZ  MORA, ANA FUNC. DEFINITIVO").as_deref(),
            Some("SANZ MORA, ANA")
        );
    }

    #[test]
    fn occupant_name_requires_comma_and_length() {
        assert_eq!(extract_occupant_name("12345678A1X123456PEREZ A2 DEFINITIVO"), None);
        assert_eq!(extract_occupant_name("12345678A1X123456P, J A2"), None);
    }

    #[test]
    fn tenure_precedence_prefers_provisional() {
        assert_eq!(
            extract_tenure_type("... definitivo ... provisional"),
            Some(TenureType::Provisional)
        );
        assert_eq!(
            extract_tenure_type("12345678A1X1PEREZ, JUAN A1 DEFINITIVO"),
            Some(TenureType::Permanent)
        );
        assert_eq!(extract_tenure_type("12345678A1X1PEREZ, JUAN A1"), None);
    }
}
