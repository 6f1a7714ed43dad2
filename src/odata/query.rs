use serde_json::{Map, Value};
use url::form_urlencoded::byte_serialize;

/// System query options for a collection read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub filter: Option<String>,
    pub select: Vec<String>,
    pub top: Option<u64>,
    pub skip: Option<u64>,
    pub cross_company: bool,
}

impl QueryOptions {
    /// Query string without the leading `?`; empty when no option is set.
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(filter) = self.filter.as_deref().filter(|f| !f.is_empty()) {
            parts.push(format!("$filter={}", encode(filter)));
        }
        if !self.select.is_empty() {
            parts.push(format!("$select={}", encode(&self.select.join(","))));
        }
        if let Some(top) = self.top {
            parts.push(format!("$top={}", top));
        }
        if let Some(skip) = self.skip.filter(|s| *s > 0) {
            parts.push(format!("$skip={}", skip));
        }
        if self.cross_company {
            parts.push("cross-company=true".to_string());
        }
        parts.join("&")
    }

    pub fn apply(&self, collection_url: &str) -> String {
        let query = self.to_query_string();
        if query.is_empty() {
            collection_url.to_string()
        } else {
            format!("{}?{}", collection_url, query)
        }
    }
}

/// Turns `{field: value}` pairs into `field eq 'value' and ...`.
///
/// Strings are quoted with embedded quotes doubled; numbers and booleans are
/// emitted bare. Other value shapes are skipped.
pub fn build_filter(fields: &Map<String, Value>) -> Option<String> {
    let clauses: Vec<String> = fields
        .iter()
        .filter_map(|(key, value)| {
            let literal = match value {
                Value::String(s) => format!("'{}'", s.replace('\'', "''")),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some(format!("{} eq {}", key, literal))
        })
        .collect();
    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" and "))
    }
}

/// Percent-encodes a key predicate for use inside a path segment.
///
/// `=`, `'` and `,` stay literal so `Id='1',dataAreaId='usmf'` is readable on
/// the wire; `/`, `?`, `#` and the rest are escaped.
pub fn encode_key(key: &str) -> String {
    encode(key)
        .replace("%3D", "=")
        .replace("%27", "'")
        .replace("%2C", ",")
}

fn encode(value: &str) -> String {
    // byte_serialize writes spaces as '+' and a literal '+' as %2B.
    byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
