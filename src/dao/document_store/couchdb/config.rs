use super::error::{CouchDaoError, CouchResult};

const DEFAULT_DATABASE: &str = "buzzboard";

/// Where the CouchDB document store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouchConfig {
    /// Server root without trailing slash, e.g. `http://localhost:5984`.
    pub base_url: String,
    /// Database holding the coordinator documents.
    pub database: String,
    /// Basic-auth user and password, used only when both are set.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Read `COUCH_BASE_URL`, `COUCH_DB`, `COUCH_USERNAME` and `COUCH_PASSWORD`.
    pub fn from_env() -> CouchResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CouchResult<Self> {
        let non_empty = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let base_url = non_empty("COUCH_BASE_URL").ok_or(CouchDaoError::NotConfigured {
            var: "COUCH_BASE_URL",
        })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            database: non_empty("COUCH_DB").unwrap_or_else(|| DEFAULT_DATABASE.into()),
            credentials: non_empty("COUCH_USERNAME").zip(non_empty("COUCH_PASSWORD")),
        })
    }

    /// URL of the configured database.
    pub fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn base_url_is_required() {
        let err = CouchConfig::from_lookup(lookup(&[("COUCH_DB", "games")])).unwrap_err();
        assert!(matches!(
            err,
            CouchDaoError::NotConfigured {
                var: "COUCH_BASE_URL"
            }
        ));
    }

    #[test]
    fn database_defaults_and_url_is_normalised() {
        let config =
            CouchConfig::from_lookup(lookup(&[("COUCH_BASE_URL", "http://couch:5984/")])).unwrap();
        assert_eq!(config.database_url(), "http://couch:5984/buzzboard");
        assert_eq!(config.credentials, None);
    }

    #[test]
    fn credentials_need_both_halves() {
        let partial = CouchConfig::from_lookup(lookup(&[
            ("COUCH_BASE_URL", "http://couch:5984"),
            ("COUCH_USERNAME", "host"),
        ]))
        .unwrap();
        assert_eq!(partial.credentials, None);

        let full = CouchConfig::from_lookup(lookup(&[
            ("COUCH_BASE_URL", "http://couch:5984"),
            ("COUCH_USERNAME", "host"),
            ("COUCH_PASSWORD", "secret"),
        ]))
        .unwrap();
        assert_eq!(full.credentials, Some(("host".into(), "secret".into())));
    }
}
