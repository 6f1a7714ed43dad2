use crate::constants::pagination::NEXT_LINK_FIELD;
use serde_json::Value;
use url::Url;

/// Where the next page starts, taken from `@odata.nextLink`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationContinuation {
    pub skip: u64,
}

impl PaginationContinuation {
    /// The raw next-page link of a payload, if the server sent one.
    pub fn next_link(payload: &Value) -> Option<&str> {
        payload
            .get(NEXT_LINK_FIELD)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn from_payload(payload: &Value) -> Option<Self> {
        Self::next_link(payload).and_then(Self::from_next_link)
    }

    /// Reads `$skip` (or a bare `skip`) from an absolute or relative link.
    pub fn from_next_link(link: &str) -> Option<Self> {
        let parsed = Url::parse(link)
            .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(link)))
            .ok()?;
        let skip = parsed
            .query_pairs()
            .find(|(key, _)| key == "$skip")
            .or_else(|| parsed.query_pairs().find(|(key, _)| key == "skip"))
            .and_then(|(_, value)| value.trim().parse().ok())?;
        Some(Self { skip })
    }

    pub fn hint(&self) -> String {
        format!(
            "\n\n---\n[INFO] More data is available. To get the next page, call the 'odataQuery' tool again with the parameter: \"skip\": {}.",
            self.skip
        )
    }

    pub fn notification(&self) -> String {
        format!("More data available. Next skip token is {}.", self.skip)
    }
}

/// Hint for a next link that carries no usable skip offset.
pub fn opaque_link_hint(link: &str) -> String {
    format!(
        "\n\n---\n[INFO] More data is available. The server returned a next page link without a skip offset: {}",
        link
    )
}
