use crate::utils::fuzzy::distance;

/// Distance cut-off for "did you mean" hints on unknown names.
const SUGGEST_MAX_DISTANCE: f64 = 0.4;

pub fn suggest(input: &str, candidates: &[&str], limit: usize) -> Vec<String> {
    if input.trim().is_empty() || candidates.is_empty() {
        return Vec::new();
    }
    let limit = limit.max(1);

    let mut scored: Vec<(&str, f64)> = candidates
        .iter()
        .map(|candidate| (*candidate, distance(input, candidate)))
        .filter(|(_, score)| *score <= SUGGEST_MAX_DISTANCE)
        .collect();

    scored.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    let mut out: Vec<String> = Vec::new();
    for (cand, _) in scored {
        if out.iter().any(|existing| existing == cand) {
            continue;
        }
        out.push(cand.to_string());
        if out.len() >= limit {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::suggest;

    #[test]
    fn suggests_closest_tool_names_first() {
        let tools = ["odataQuery", "createCustomer", "createCustomerGroup"];
        assert_eq!(suggest("odataquerry", &tools, 3), vec!["odataQuery"]);
        assert_eq!(
            suggest("createcustomer", &tools, 3),
            vec!["createCustomer", "createCustomerGroup"]
        );
        assert!(suggest("ping", &tools, 3).is_empty());
    }
}
