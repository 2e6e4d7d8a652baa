/// Folds Turkish letters to ASCII and lowercases, so "Beşiktaş", "BESIKTAS"
/// and "besiktas" compare equal.
pub fn normalize_team_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            'ç' | 'Ç' => 'c',
            'ğ' | 'Ğ' => 'g',
            'ı' | 'İ' => 'i',
            'ö' | 'Ö' => 'o',
            'ş' | 'Ş' => 's',
            'ü' | 'Ü' => 'u',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Picks the spelling used in `known` for `query`: an exact match wins,
/// otherwise the first name whose normalized form matches.
pub fn resolve_team_name<'a, I>(known: I, query: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let want = normalize_team_name(query);
    let mut fallback = None;
    for name in known {
        if name == query {
            return Some(name.to_string());
        }
        if fallback.is_none() && normalize_team_name(name) == want {
            fallback = Some(name.to_string());
        }
    }
    fallback
}
