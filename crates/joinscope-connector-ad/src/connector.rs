//! Active Directory computer source
//!
//! Implements [`DeviceInventorySource`] by paging through `computer` objects
//! under each configured search base.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use joinscope_core::{DeviceInventorySource, DeviceRecord, DeviceSource, SourceResult};
use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use secrecy::ExposeSecret;
use tracing::{debug, info, instrument, warn};

use crate::config::{AdConfig, SearchBase};
use crate::error::{AdError, AdResult};
use crate::mapping::{computer_attributes, is_disabled, map_computer_entry};

/// Directory device source backed by LDAP.
pub struct AdDeviceSource {
    config: AdConfig,
    display_name: String,
}

impl AdDeviceSource {
    /// Create a new source with the given configuration.
    pub fn new(config: AdConfig) -> AdResult<Self> {
        config.validate()?;
        let display_name = format!("Active Directory: {}", config.host);
        Ok(Self {
            config,
            display_name,
        })
    }

    pub fn config(&self) -> &AdConfig {
        &self.config
    }

    /// Open a connection and bind.
    async fn connect(&self) -> AdResult<Ldap> {
        let url = self.config.url();
        debug!(url = %url, "Connecting to domain controller");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(self.config.connection_timeout_secs))
            .set_starttls(self.config.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|source| AdError::Connect {
                url: url.clone(),
                source,
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let password = self
            .config
            .bind_password
            .as_ref()
            .map(|p| p.expose_secret())
            .unwrap_or("");

        debug!(bind_dn = %self.config.bind_dn, "Performing LDAP bind");
        let result = ldap.simple_bind(&self.config.bind_dn, password).await?;
        if result.rc != 0 {
            return Err(AdError::from_result("bind", &result));
        }

        Ok(ldap)
    }

    /// LDAP filter for one search base.
    pub fn search_filter(&self, base: &SearchBase) -> String {
        let mut parts = vec!["(objectClass=computer)".to_string()];
        if let Some(os) = self.config.operating_system.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("(operatingSystem={}*)", escape_ldap_value(os)));
        }
        if let Some(extra) = base.filter.as_deref().filter(|s| !s.is_empty()) {
            if extra.starts_with('(') {
                parts.push(extra.to_string());
            } else {
                parts.push(format!("({extra})"));
            }
        }
        if parts.len() == 1 {
            parts.remove(0)
        } else {
            format!("(&{})", parts.concat())
        }
    }

    /// Page through one search base.
    async fn search_base(&self, ldap: &mut Ldap, base: &SearchBase) -> AdResult<Vec<SearchEntry>> {
        let scope = base.scope()?;
        let filter = self.search_filter(base);
        debug!(base_dn = %base.dn, filter = %filter, "Searching computers");

        let adapters: Vec<Box<dyn Adapter<_, _>>> = vec![
            Box::new(EntriesOnly::new()),
            Box::new(PagedResults::new(self.config.page_size)),
        ];
        let mut stream = ldap
            .streaming_search_with(adapters, &base.dn, scope, &filter, computer_attributes())
            .await?;

        let mut entries = Vec::new();
        while let Some(entry) = stream.next().await? {
            entries.push(SearchEntry::construct(entry));
        }
        let result = stream.finish().await;
        if result.rc != 0 {
            return Err(AdError::from_result("search", &result));
        }

        debug!(base_dn = %base.dn, count = entries.len(), "Search base complete");
        Ok(entries)
    }

    /// Fetch and map every computer under the configured search bases.
    ///
    /// Overlapping search bases return each computer once.
    pub async fn fetch_computers(&self) -> AdResult<Vec<DeviceRecord>> {
        let mut ldap = self.connect().await?;
        let mut seen: HashSet<String> = HashSet::new();
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for base in self.config.effective_search_bases() {
            for entry in self.search_base(&mut ldap, &base).await? {
                if !seen.insert(entry.dn.to_lowercase()) {
                    continue;
                }
                match map_computer_entry(&entry) {
                    Some(record) if !self.config.include_disabled && is_disabled(&record) => {
                        skipped += 1;
                    }
                    Some(record) => records.push(record),
                    None => {
                        warn!(dn = %entry.dn, "Skipping computer entry without a name");
                        skipped += 1;
                    }
                }
            }
        }

        if let Err(e) = ldap.unbind().await {
            warn!(error = %e, "Error during LDAP unbind");
        }

        info!(
            host = %self.config.host,
            computers = records.len(),
            skipped,
            "Directory inventory fetched"
        );
        Ok(records)
    }
}

#[async_trait]
impl DeviceInventorySource for AdDeviceSource {
    fn source(&self) -> DeviceSource {
        DeviceSource::Directory
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    #[instrument(skip(self), fields(host = %self.config.host))]
    async fn test_connection(&self) -> SourceResult<()> {
        let mut ldap = self.connect().await?;
        let (entries, _) = ldap
            .search(&self.config.base_dn, Scope::Base, "(objectClass=*)", vec!["dn"])
            .await
            .map_err(AdError::from)?
            .success()
            .map_err(AdError::from)?;

        if entries.is_empty() {
            return Err(AdError::BaseNotFound(self.config.base_dn.clone()).into());
        }
        if let Err(e) = ldap.unbind().await {
            warn!(error = %e, "Error during LDAP unbind");
        }

        info!("Directory connection test successful");
        Ok(())
    }

    #[instrument(skip(self), fields(host = %self.config.host))]
    async fn fetch_devices(&self) -> SourceResult<Vec<DeviceRecord>> {
        Ok(self.fetch_computers().await?)
    }
}

impl std::fmt::Debug for AdDeviceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdDeviceSource")
            .field("display_name", &self.display_name)
            .field("config", &self.config)
            .finish()
    }
}

/// Escape special characters in LDAP filter values (RFC 4515).
fn escape_ldap_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}
