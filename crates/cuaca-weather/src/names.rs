//! Display-name cleanup for region names coming out of the region APIs.

/// Administrative prefixes removed before a name is used as a search term.
const ADMIN_PREFIXES: &[&str] = &["kabupaten", "kota", "kab.", "adm."];

/// Strip administrative prefixes ("Kabupaten", "Kota", "Kab.", "Adm.").
///
/// Matching is case-insensitive and applies to every word, so
/// `"KOTA ADM. JAKARTA SELATAN"` becomes `"JAKARTA SELATAN"`. A prefix is only
/// removed when something follows it.
pub fn clean_location_name(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let mut kept = Vec::with_capacity(words.len());

    for (i, word) in words.iter().enumerate() {
        let is_prefix = ADMIN_PREFIXES
            .iter()
            .any(|prefix| word.eq_ignore_ascii_case(prefix));
        if is_prefix && i + 1 < words.len() {
            continue;
        }
        kept.push(*word);
    }

    kept.join(" ")
}

/// Capitalize the first letter of each space-separated word, lowercase the rest.
pub fn title_case(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
