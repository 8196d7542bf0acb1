use crate::parsing::fold_diacritics;

/// Honorifics dropped before comparing names.
const TITLES: &[&str] = &["MR", "MRS", "MS", "MISS", "DR", "PROF", "M", "MME", "MLLE"];

/// Canonical form of a person name: uppercase ASCII letters separated by
/// single spaces, titles removed.
///
/// Hyphens and other separators split tokens (`JEAN-PAUL` → `JEAN PAUL`);
/// apostrophes join them (`N'GUESSAN` → `NGUESSAN`).
pub fn normalize_name(name: &str) -> String {
    let folded = fold_diacritics(&name.to_uppercase());
    let cleaned: String = folded
        .chars()
        .filter(|c| !matches!(c, '\'' | '’' | '`'))
        .map(|c| if c.is_ascii_uppercase() { c } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .filter(|token| !TITLES.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Name tokens after normalization.
pub fn name_tokens(name: &str) -> Vec<String> {
    normalize_name(name)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_titles_accents_and_punctuation() {
        assert_eq!(normalize_name("Mme. Adjoua  Kouassi-Brou"), "ADJOUA KOUASSI BROU");
        assert_eq!(normalize_name("Dr Hélène N'Guessan"), "HELENE NGUESSAN");
        assert_eq!(normalize_name("  mr   john   smith "), "JOHN SMITH");
    }

    #[test]
    fn keeps_names_that_contain_title_letters() {
        assert_eq!(normalize_name("MSIMANGO MRISHO"), "MSIMANGO MRISHO");
    }

    #[test]
    fn drops_digits_and_mrz_filler() {
        assert_eq!(normalize_name("TESFAYE<<ABEBE<<<<"), "TESFAYE ABEBE");
        assert_eq!(normalize_name("J0HN"), "J HN");
    }

    #[test]
    fn tokens_split_on_spaces() {
        assert_eq!(name_tokens("Abebe Kebede"), vec!["ABEBE", "KEBEDE"]);
        assert!(name_tokens("Mr.").is_empty());
    }
}
