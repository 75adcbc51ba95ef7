use std::collections::BTreeMap;

use crate::errors::ServiceError;

/// Resolves a logical service name (e.g. `ms-reservas`) to a base URL.
pub trait ServiceResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Result<String, ServiceError>;
}

/// Resolver backed by the `remote.services` table of the configuration.
#[derive(Clone, Debug, Default)]
pub struct StaticServiceResolver {
    services: BTreeMap<String, String>,
}

impl StaticServiceResolver {
    pub fn new(services: BTreeMap<String, String>) -> Self {
        let services = services
            .into_iter()
            .map(|(name, url)| (name, url.trim().trim_end_matches('/').to_string()))
            .collect();
        Self { services }
    }

    pub fn from_config(cfg: &configs::RemoteConfig) -> Self {
        Self::new(cfg.services.clone())
    }

    pub fn with_service(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.services.insert(name.into(), url.trim_end_matches('/').to_string());
        self
    }
}

impl ServiceResolver for StaticServiceResolver {
    fn resolve(&self, name: &str) -> Result<String, ServiceError> {
        self.services
            .get(name)
            .cloned()
            .ok_or_else(|| ServiceError::unavailable(name, "no instance registered for this service"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_names_without_trailing_slash() {
        let r = StaticServiceResolver::default().with_service("ms-reservas", "http://10.0.0.5:8090/");
        assert_eq!(r.resolve("ms-reservas").expect("resolve"), "http://10.0.0.5:8090");
    }

    #[test]
    fn unknown_name_is_unavailable() {
        let r = StaticServiceResolver::default();
        assert!(matches!(r.resolve("ms-pagos"), Err(ServiceError::RemoteUnavailable { .. })));
    }
}
