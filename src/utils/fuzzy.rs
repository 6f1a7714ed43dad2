/// Lowercased ASCII alphanumerics only, so `Customer Groups` and
/// `customer_groups` compare equal.
pub fn normalize_token(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Distance between two already-normalized tokens in `[0, 1]`.
///
/// 0 is an exact match. When one token contains the other the distance is
/// below 0.5 and shrinks as the lengths converge; otherwise it is the edit
/// distance divided by the longer length.
pub fn normalized_distance(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 1.0;
    }
    if a == b {
        return 0.0;
    }
    let (la, lb) = (a.chars().count() as f64, b.chars().count() as f64);
    let longest = la.max(lb);
    if a.contains(b) || b.contains(a) {
        return 0.5 * (1.0 - la.min(lb) / longest);
    }
    (levenshtein(a, b) as f64 / longest).min(1.0)
}

/// Normalizes both sides, then scores them with [`normalized_distance`].
pub fn distance(query: &str, candidate: &str) -> f64 {
    normalized_distance(&normalize_token(query), &normalize_token(candidate))
}
