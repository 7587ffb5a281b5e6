use std::{fmt::Display, str::FromStr};
use tap_sqlite::types::BidderId;

// In order to test the correctness of our permission checks in our endpoints,
// we define a declarative permission scheme, which is encoded as plain text
// into the `Authorization: Bearer <...>` header. This allows us to easily
// construct "tokens" that exercise complex permission configurations.
#[derive(Default)]
pub struct Permissions {
    pub bidder_id: Option<BidderId>,
    pub extractor: bool,
    pub reviewer: Option<String>,
    pub admin: bool,
    pub settlement: bool,
}

impl Display for Permissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(bidder_id) = &self.bidder_id {
            parts.push(format!("bidder={bidder_id}"));
        }
        if self.extractor {
            parts.push("extractor".into());
        }
        if let Some(reviewer) = &self.reviewer {
            parts.push(format!("reviewer={reviewer}"));
        }
        if self.admin {
            parts.push("admin".into());
        }
        if self.settlement {
            parts.push("settlement".into());
        }
        write!(f, "{}", parts.join(";"))
    }
}

impl FromStr for Permissions {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut permissions = Permissions::default();
        for part in s.split(';').filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some(("bidder", id)) => {
                    permissions.bidder_id = Some(id.parse().map_err(|_| part.to_string())?);
                }
                Some(("reviewer", name)) => permissions.reviewer = Some(name.to_string()),
                None if part == "extractor" => permissions.extractor = true,
                None if part == "admin" => permissions.admin = true,
                None if part == "settlement" => permissions.settlement = true,
                _ => return Err(part.to_string()),
            }
        }
        Ok(permissions)
    }
}
