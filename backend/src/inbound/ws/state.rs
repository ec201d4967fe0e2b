//! Shared WebSocket adapter state.

use std::sync::Arc;

use url::{Origin, Url};

use crate::domain::ports::{IdentityProvider, ProfileStore};

/// Browser origins allowed to open the profile stream.
#[derive(Clone, Debug, Default)]
pub struct OriginAllowList {
    origins: Arc<[Origin]>,
}

impl OriginAllowList {
    /// Parse `http(s)://host[:port]` entries; paths are ignored.
    pub fn parse<I, S>(entries: I) -> Result<Self, url::ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let origins = entries
            .into_iter()
            .map(|entry| Url::parse(entry.as_ref()).map(|url| url.origin()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            origins: origins.into(),
        })
    }

    pub fn allows(&self, origin: &Url) -> bool {
        let origin = origin.origin();
        origin.is_tuple() && self.origins.contains(&origin)
    }
}

/// Dependency bundle for the profile stream.
#[derive(Clone)]
pub struct WsState {
    pub store: Arc<dyn ProfileStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub origins: OriginAllowList,
}

impl WsState {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        identity: Arc<dyn IdentityProvider>,
        origins: OriginAllowList,
    ) -> Self {
        Self {
            store,
            identity,
            origins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:3000", true)]
    #[case("http://localhost:3000/pricing", true)]
    #[case("http://localhost:3001", false)]
    #[case("https://localhost:3000", false)]
    #[case("https://app.healthsyntra.example", true)]
    #[case("https://app.healthsyntra.example.evil.com", false)]
    fn matches_scheme_host_and_port(#[case] origin: &str, #[case] allowed: bool) {
        let list = OriginAllowList::parse(["http://localhost:3000", "https://app.healthsyntra.example/"])
            .expect("allow-list");
        let origin = Url::parse(origin).expect("origin url");
        assert_eq!(list.allows(&origin), allowed);
    }

    #[rstest]
    fn rejects_unparsable_entries() {
        assert!(OriginAllowList::parse(["not a url"]).is_err());
    }

    #[rstest]
    fn empty_list_allows_nothing() {
        let origin = Url::parse("http://localhost:3000").expect("origin url");
        assert!(!OriginAllowList::default().allows(&origin));
    }
}
