pub mod auth {
    /// Seconds subtracted from `expires_in` so tokens are refreshed before they lapse.
    pub const EXPIRY_BUFFER_SECS: i64 = 60;
    pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
    pub const GRANT_TYPE: &str = "client_credentials";
}

pub mod network {
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
    pub const USER_AGENT: &str = concat!("d365-gateway/", env!("CARGO_PKG_VERSION"));
}

pub mod entities {
    /// Maximum accepted normalized distance (0 = exact, 1 = anything).
    pub const FUZZY_THRESHOLD: f64 = 0.6;
    pub const METADATA_PATH: &str = "data";
}

pub mod pagination {
    /// Page size requested from the server through the `Prefer` header.
    pub const MAX_PAGE_SIZE: usize = 100;
    /// `$top` applied by `odataQuery` when the caller does not pass one.
    pub const DEFAULT_TOP: u64 = 5;
    pub const NEXT_LINK_FIELD: &str = "@odata.nextLink";
}

pub mod messages {
    pub const NO_CONTENT: &str = "Operation successful (No Content).";
}

pub mod protocol {
    pub const PROTOCOL_VERSION: &str = "2025-06-18";
    pub const SERVER_NAME: &str = "d365-gateway";
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
}
