//! Machine-readable zone (ICAO 9303 TD3) parsing and check digits.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// TD3 line length.
const TD3_LEN: usize = 44;
/// OCR often drops or duplicates a filler; lines this close are accepted.
const TD3_MIN_LEN: usize = 42;
const TD3_MAX_LEN: usize = 46;
/// Expiry years further than this in the future are read as last century.
const MAX_EXPIRY_YEARS_AHEAD: i32 = 15;

const WEIGHTS: [u32; 3] = [7, 3, 1];

/// ICAO check digit: weights 7-3-1, digits as-is, `A`-`Z` as 10-35,
/// filler `<` as 0.
pub fn check_digit(data: &str) -> u32 {
    data.chars()
        .enumerate()
        .map(|(i, c)| {
            let value = match c {
                '0'..='9' => c as u32 - '0' as u32,
                'A'..='Z' => c as u32 - 'A' as u32 + 10,
                _ => 0,
            };
            value * WEIGHTS[i % 3]
        })
        .sum::<u32>()
        % 10
}

fn digit_matches(data: &str, check: char) -> bool {
    check.to_digit(10) == Some(check_digit(data)) || (check == '<' && check_digit(data) == 0)
}

/// Results of the four TD3 check digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrzChecks {
    pub passport_number: bool,
    pub date_of_birth: bool,
    pub expiry_date: bool,
    pub composite: bool,
}

impl MrzChecks {
    pub fn all_valid(&self) -> bool {
        self.passport_number && self.date_of_birth && self.expiry_date && self.composite
    }
}

/// Fields decoded from a TD3 MRZ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrzData {
    pub line1: String,
    pub line2: String,
    pub document_code: String,
    pub issuing_country: String,
    pub surname: String,
    pub given_names: String,
    pub passport_number: String,
    pub nationality: String,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub personal_number: String,
    pub checks: MrzChecks,
}

/// Keep only MRZ alphabet characters; spaces inside a line are OCR noise.
fn clean_line(line: &str) -> String {
    line.to_uppercase()
        .chars()
        .map(|c| if c == '«' { '<' } else { c })
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '<')
        .collect()
}

fn fit_to_td3(line: &str) -> String {
    let mut fitted: String = line.chars().take(TD3_LEN).collect();
    while fitted.len() < TD3_LEN {
        fitted.push('<');
    }
    fitted
}

/// Locate the two TD3 lines in OCR text. Line 1 starts with `P`.
pub fn find_td3_lines(text: &str) -> Option<(String, String)> {
    let candidates: Vec<String> = text
        .lines()
        .filter(|l| l.contains('<') || l.trim().len() >= TD3_MIN_LEN)
        .map(clean_line)
        .filter(|l| (TD3_MIN_LEN..=TD3_MAX_LEN).contains(&l.len()))
        .collect();

    candidates.windows(2).find_map(|pair| {
        let (first, second) = (&pair[0], &pair[1]);
        (first.starts_with('P') && first.contains("<<"))
            .then(|| (fit_to_td3(first), fit_to_td3(second)))
    })
}

/// Letters OCR commonly reads in place of digits.
fn fix_digits(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'O' | 'Q' | 'D' => '0',
            'I' | 'L' => '1',
            'Z' => '2',
            'S' => '5',
            'B' => '8',
            other => other,
        })
        .collect()
}

fn slice(s: &str, from: usize, to: usize) -> &str {
    s.get(from..to).unwrap_or("")
}

/// Decode a YYMMDD MRZ date. Birth dates later than this year's YY belong
/// to the last century; expiry dates are in this century unless implausibly
/// far ahead.
pub fn mrz_date(yymmdd: &str, is_birth: bool, today: NaiveDate) -> Option<NaiveDate> {
    let digits = fix_digits(yymmdd);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let yy: i32 = digits[0..2].parse().ok()?;
    let month: u32 = digits[2..4].parse().ok()?;
    let day: u32 = digits[4..6].parse().ok()?;

    let current_yy = today.year() % 100;
    let century_now = today.year() - current_yy;
    let year = if is_birth {
        if yy > current_yy { century_now - 100 + yy } else { century_now + yy }
    } else {
        let candidate = century_now + yy;
        if candidate > today.year() + MAX_EXPIRY_YEARS_AHEAD { candidate - 100 } else { candidate }
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a TD3 MRZ out of OCR text, if one is present.
pub fn parse_td3(text: &str, today: NaiveDate) -> Option<MrzData> {
    let (line1, line2) = find_td3_lines(text)?;

    let document_code = slice(&line1, 0, 2).trim_end_matches('<').to_string();
    let issuing_country = slice(&line1, 2, 5).replace('<', "");
    let names = slice(&line1, 5, TD3_LEN);
    let (surname_raw, given_raw) = names.split_once("<<").unwrap_or((names, ""));
    let to_words = |s: &str| s.split('<').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ");

    let number_field = slice(&line2, 0, 9);
    let birth_field = slice(&line2, 13, 19);
    let expiry_field = slice(&line2, 21, 27);
    let check_at = |i: usize| line2.chars().nth(i).unwrap_or('<');

    let composite_data = format!(
        "{}{}{}",
        slice(&line2, 0, 10),
        slice(&line2, 13, 20),
        slice(&line2, 21, 43)
    );
    let checks = MrzChecks {
        passport_number: digit_matches(number_field, check_at(9)),
        date_of_birth: digit_matches(&fix_digits(birth_field), check_at(19)),
        expiry_date: digit_matches(&fix_digits(expiry_field), check_at(27)),
        composite: digit_matches(&composite_data, check_at(43)),
    };

    let sex = match check_at(20) {
        'M' => Some("M".to_string()),
        'F' => Some("F".to_string()),
        _ => None,
    };

    Some(MrzData {
        document_code,
        issuing_country,
        surname: to_words(surname_raw),
        given_names: to_words(given_raw),
        passport_number: number_field.replace('<', ""),
        nationality: slice(&line2, 10, 13).replace('<', ""),
        date_of_birth: mrz_date(birth_field, true, today),
        sex,
        expiry_date: mrz_date(expiry_field, false, today),
        personal_number: slice(&line2, 28, 42).replace('<', ""),
        checks,
        line1,
        line2,
    })
}
