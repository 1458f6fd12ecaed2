use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use tracing::debug;

use crate::error::{SnapError, SnapResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ManageOptions,
    ActivatePlugins,
    Read,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::ManageOptions => write!(f, "manage_options"),
            Capability::ActivatePlugins => write!(f, "activate_plugins"),
            Capability::Read => write!(f, "read"),
        }
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manage_options" => Ok(Capability::ManageOptions),
            "activate_plugins" => Ok(Capability::ActivatePlugins),
            "read" => Ok(Capability::Read),
            other => Err(format!("Unknown capability '{}'", other)),
        }
    }
}

/// The caller of an admin action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,
    pub capabilities: BTreeSet<Capability>,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: BTreeSet::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new("anonymous")
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn with_capabilities<I: IntoIterator<Item = Capability>>(mut self, caps: I) -> Self {
        self.capabilities.extend(caps);
        self
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// The single capability check shared by the dashboard and both export entry
/// points.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationPolicy {
    required: Capability,
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self {
            required: Capability::ManageOptions,
        }
    }
}

impl AuthorizationPolicy {
    pub fn requiring(required: Capability) -> Self {
        Self { required }
    }

    pub fn required(&self) -> Capability {
        self.required
    }

    pub fn authorize(&self, principal: &Principal) -> SnapResult<()> {
        if principal.can(self.required) {
            debug!(principal = %principal.name, capability = %self.required, "Authorized");
            Ok(())
        } else {
            Err(SnapError::permission_denied(&principal.name, self.required))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_round_trip_names() {
        for cap in [
            Capability::ManageOptions,
            Capability::ActivatePlugins,
            Capability::Read,
        ] {
            assert_eq!(cap.to_string().parse::<Capability>().unwrap(), cap);
        }
        assert!("edit_posts".parse::<Capability>().is_err());
    }

    #[test]
    fn test_capability_serde_name() {
        let json = serde_json::to_string(&Capability::ManageOptions).unwrap();
        assert_eq!(json, "\"manage_options\"");
    }

    #[test]
    fn test_policy_allows_admin() {
        let admin = Principal::new("admin").with_capability(Capability::ManageOptions);
        assert!(AuthorizationPolicy::default().authorize(&admin).is_ok());
    }

    #[test]
    fn test_policy_denies_without_capability() {
        let editor = Principal::new("editor").with_capabilities([Capability::Read]);
        let err = AuthorizationPolicy::default().authorize(&editor).unwrap_err();
        assert!(matches!(err, SnapError::PermissionDenied { .. }));

        let err = AuthorizationPolicy::default()
            .authorize(&Principal::anonymous())
            .unwrap_err();
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_custom_requirement() {
        let policy = AuthorizationPolicy::requiring(Capability::ActivatePlugins);
        let user = Principal::new("ops").with_capability(Capability::ActivatePlugins);
        assert!(policy.authorize(&user).is_ok());
        assert_eq!(policy.required(), Capability::ActivatePlugins);
    }
}
