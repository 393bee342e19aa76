//! Directory adapter configuration
//!
//! Connection and scoping settings for reading computer objects from Active
//! Directory over LDAP.

use ldap3::Scope;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::error::{AdError, AdResult};

/// Configuration for the Active Directory computer source.
#[derive(Debug, Deserialize)]
pub struct AdConfig {
    /// Domain controller hostname or IP address.
    pub host: String,

    /// LDAP port (389 for LDAP, 636 for LDAPS).
    #[serde(default = "default_ldap_port")]
    pub port: u16,

    /// Use SSL/TLS (LDAPS).
    #[serde(default)]
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on plain LDAP connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// Domain naming context (e.g., "DC=corp,DC=example,DC=com").
    pub base_dn: String,

    /// Bind DN or UPN used for authentication.
    pub bind_dn: String,

    /// Bind password.
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub bind_password: Option<SecretString>,

    /// Organizational units to search. Empty means the whole `base_dn`.
    #[serde(default)]
    pub search_bases: Vec<SearchBase>,

    /// Only return computers whose `operatingSystem` starts with this value.
    #[serde(default)]
    pub operating_system: Option<String>,

    /// Include computers with the ACCOUNTDISABLE bit set.
    #[serde(default = "default_include_disabled")]
    pub include_disabled: bool,

    /// Page size for paged searches.
    #[serde(default = "default_page_size")]
    pub page_size: i32,

    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,
}

fn default_ldap_port() -> u16 {
    389
}

fn default_include_disabled() -> bool {
    true
}

fn default_page_size() -> i32 {
    500
}

fn default_connection_timeout_secs() -> u64 {
    30
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()).map(SecretString::from))
}

impl AdConfig {
    /// Create a new config with required fields.
    pub fn new(
        host: impl Into<String>,
        base_dn: impl Into<String>,
        bind_dn: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: default_ldap_port(),
            use_ssl: false,
            use_starttls: false,
            base_dn: base_dn.into(),
            bind_dn: bind_dn.into(),
            bind_password: None,
            search_bases: Vec::new(),
            operating_system: None,
            include_disabled: default_include_disabled(),
            page_size: default_page_size(),
            connection_timeout_secs: default_connection_timeout_secs(),
        }
    }

    /// Set bind password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.bind_password = Some(SecretString::from(password.into()));
        self
    }

    /// Enable SSL (LDAPS).
    #[must_use]
    pub fn with_ssl(mut self) -> Self {
        self.use_ssl = true;
        self.port = 636;
        self
    }

    /// Restrict the search to an organizational unit.
    #[must_use]
    pub fn with_search_base(mut self, base: SearchBase) -> Self {
        self.search_bases.push(base);
        self
    }

    /// Restrict the search to an operating system prefix.
    #[must_use]
    pub fn with_operating_system(mut self, prefix: impl Into<String>) -> Self {
        self.operating_system = Some(prefix.into());
        self
    }

    /// Get the LDAP URL.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Search bases to query, falling back to the whole domain.
    #[must_use]
    pub fn effective_search_bases(&self) -> Vec<SearchBase> {
        if self.search_bases.is_empty() {
            vec![SearchBase::subtree(self.base_dn.clone())]
        } else {
            self.search_bases.clone()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AdResult<()> {
        if self.host.trim().is_empty() {
            return Err(AdError::Config("host is required".to_string()));
        }
        if self.base_dn.trim().is_empty() {
            return Err(AdError::Config("base_dn is required".to_string()));
        }
        if self.bind_dn.trim().is_empty() {
            return Err(AdError::Config("bind_dn is required".to_string()));
        }
        if self.use_ssl && self.use_starttls {
            return Err(AdError::Config(
                "cannot use both SSL and STARTTLS".to_string(),
            ));
        }
        if self.page_size <= 0 {
            return Err(AdError::Config("page_size must be positive".to_string()));
        }
        for base in &self.search_bases {
            base.scope()?;
        }
        Ok(())
    }
}

/// An organizational unit to search for computer objects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchBase {
    /// Search base DN (e.g., "OU=Workstations,DC=corp,DC=example,DC=com").
    pub dn: String,

    /// Search scope: "subtree" (default), "onelevel", or "base".
    #[serde(default = "default_subtree")]
    pub scope: String,

    /// Optional additional LDAP filter for this search base.
    #[serde(default)]
    pub filter: Option<String>,
}

fn default_subtree() -> String {
    "subtree".to_string()
}

impl SearchBase {
    /// Subtree search under `dn`.
    pub fn subtree(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            scope: default_subtree(),
            filter: None,
        }
    }

    /// Parse the configured scope.
    pub fn scope(&self) -> AdResult<Scope> {
        match self.scope.to_lowercase().as_str() {
            "subtree" | "sub" => Ok(Scope::Subtree),
            "onelevel" | "one" => Ok(Scope::OneLevel),
            "base" => Ok(Scope::Base),
            other => Err(AdError::Config(format!(
                "invalid search scope '{}' for {}",
                other, self.dn
            ))),
        }
    }
}
