//! Host lifecycle: vhost files, certificates, and the domain existence check.
use std::{
    fs::{self, OpenOptions, ReadDir},
    io::{ErrorKind, Write},
    path::Path,
    sync::OnceLock,
};

use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::acme::{AcmeClient, AcmeCommand};
use crate::config::Settings;
use crate::constants::{CERT_DIR_MODE, MAX_DOMAIN_LEN};
use crate::error::{HostIndexError, ManageError};
use crate::index::{HostBinding, HostIndex};
use crate::layout::HostLayout;
use crate::privilege::{ensure_owned_dir, lookup_user};
use crate::restart::ServiceRestarter;
use crate::template::{VhostContext, templates};

fn domain_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
        )
        .expect("valid domain pattern")
    })
}

fn container_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("valid container pattern")
    })
}

fn container_name_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^\s*set \$containerName (\S+);").expect("valid vhost pattern")
    })
}

fn container_port_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^\s*set \$containerPort (\d+);").expect("valid vhost pattern")
    })
}

/// Rejects domains that are not plain DNS names.
///
/// Domains end up in paths and in nginx config text verbatim.
pub fn validate_domain(domain: &str) -> Result<(), ManageError> {
    if domain.is_empty() {
        return Err(ManageError::InvalidHost("domain must not be empty".into()));
    }
    if domain.len() > MAX_DOMAIN_LEN {
        return Err(ManageError::InvalidHost(format!(
            "domain is longer than {MAX_DOMAIN_LEN} characters"
        )));
    }
    if !domain_pattern().is_match(domain) {
        return Err(ManageError::InvalidHost(format!(
            "'{domain}' is not a valid domain name"
        )));
    }
    Ok(())
}

fn validate_container_name(name: &str) -> Result<(), ManageError> {
    if name.is_empty() {
        return Err(ManageError::InvalidHost(
            "container name must not be empty".into(),
        ));
    }
    if !container_pattern().is_match(name) {
        return Err(ManageError::InvalidHost(format!(
            "'{name}' is not a valid container name"
        )));
    }
    Ok(())
}

/// A domain bound to the container it proxies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    domain: String,
    container_name: String,
    container_port: u16,
}

impl HostRecord {
    /// Validates and builds a record.
    pub fn new(
        domain: impl Into<String>,
        container_name: impl Into<String>,
        container_port: u16,
    ) -> Result<Self, ManageError> {
        let domain = domain.into();
        let container_name = container_name.into();
        validate_domain(&domain)?;
        validate_container_name(&container_name)?;
        if container_port == 0 {
            return Err(ManageError::InvalidHost(
                "container port must be between 1 and 65535".into(),
            ));
        }
        Ok(Self {
            domain,
            container_name,
            container_port,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    pub fn container_port(&self) -> u16 {
        self.container_port
    }

    fn binding(&self) -> HostBinding {
        HostBinding::new(&self.container_name, self.container_port)
    }
}

/// Lazily enumerated domains that have a certificate directory.
///
/// Order follows the filesystem. Iterating again requires a new call to
/// [`HostManager::list`].
pub struct HostIter {
    entries: Option<ReadDir>,
}

impl Iterator for HostIter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let entries = self.entries.as_mut()?;
        for entry in entries.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable certificate entry: {err}");
                    continue;
                }
            };
            if !entry.path().is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => return Some(name),
                Err(name) => warn!("Skipping non UTF-8 certificate directory {name:?}"),
            }
        }
        None
    }
}

/// Per-domain outcome of a config recreation batch.
#[derive(Debug, Default)]
pub struct RecreateReport {
    pub recreated: Vec<String>,
    pub failed: Vec<(String, ManageError)>,
}

/// Owns the lifecycle of every host on the box.
#[derive(Debug, Clone)]
pub struct HostManager {
    layout: HostLayout,
    acme: AcmeClient,
    restarter: ServiceRestarter,
    index: HostIndex,
    web_server_service: String,
    web_server_user: String,
    reload_command: String,
}

impl HostManager {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            layout: HostLayout::from_settings(settings),
            acme: AcmeClient::new(&settings.acme_client),
            restarter: ServiceRestarter::new(&settings.supervisor_ctl),
            index: HostIndex::new(&settings.index_file),
            web_server_service: settings.web_server_service.clone(),
            web_server_user: settings.web_server_user.clone(),
            reload_command: settings.reload_command.clone(),
        }
    }

    pub fn layout(&self) -> &HostLayout {
        &self.layout
    }

    pub fn index(&self) -> &HostIndex {
        &self.index
    }

    /// A host exists exactly when its certificate directory does. Symlinks are
    /// followed, the same way [`HostManager::list`] sees them.
    pub fn host_exists(&self, domain: &str) -> bool {
        self.layout.cert_dir(domain).is_dir()
    }

    /// Provisions a host: HTTP block, certificate, then HTTPS block.
    ///
    /// Steps run strictly in order; the HTTP block must be live before issuance
    /// so the HTTP-01 challenge can be served. Any failure aborts and leaves
    /// earlier steps in place.
    pub fn add(&self, record: &HostRecord) -> Result<(), ManageError> {
        let domain = record.domain();
        if self.host_exists(domain) {
            return Err(ManageError::AlreadyExists {
                domain: domain.to_string(),
            });
        }

        let context = VhostContext::new(record, &self.layout);

        let challenge_dir = self.layout.challenge_dir(domain);
        fs::create_dir_all(&challenge_dir).map_err(|err| {
            ManageError::io(
                "Could not create directory for acme challenge",
                &challenge_dir,
                err,
            )
        })?;

        let vhost_file = self.layout.vhost_file(domain);
        fs::write(&vhost_file, templates().http.render(&context))
            .map_err(|err| ManageError::io("Could not write vhost file", &vhost_file, err))?;
        info!("Wrote HTTP block for '{domain}' to {}", vhost_file.display());
        self.reload_web_server();

        self.acme.run(&AcmeCommand::Issue {
            domain: domain.to_string(),
            webroot: self.layout.webroot(domain),
        })?;

        let owner = lookup_user(&self.web_server_user)?;
        ensure_owned_dir(&self.layout.cert_dir(domain), CERT_DIR_MODE, &owner)?;

        self.acme.run(&AcmeCommand::InstallCert {
            domain: domain.to_string(),
            cert_file: self.layout.cert_file(domain),
            key_file: self.layout.key_file(domain),
            fullchain_file: self.layout.fullchain_file(domain),
            reload_cmd: self.reload_command.clone(),
        })?;

        let mut file = OpenOptions::new()
            .append(true)
            .open(&vhost_file)
            .map_err(|err| ManageError::io("Could not open vhost file", &vhost_file, err))?;
        file.write_all(templates().https.render(&context).as_bytes())
            .map_err(|err| ManageError::io("Could not write vhost file", &vhost_file, err))?;
        info!("Appended HTTPS block for '{domain}'");
        self.reload_web_server();

        if let Err(err) = self.index.insert(domain, record.binding()) {
            warn!("Host '{domain}' is live but its binding was not recorded: {err}");
        }

        info!(
            "Host '{domain}' now proxies to {}:{}",
            record.container_name(),
            record.container_port()
        );
        Ok(())
    }

    /// Tears a host down. Only the existence check is fatal; every cleanup step
    /// after it is logged and skipped on failure.
    pub fn del(&self, domain: &str) -> Result<(), ManageError> {
        validate_domain(domain)?;
        if !self.host_exists(domain) {
            return Err(ManageError::NotFound {
                domain: domain.to_string(),
            });
        }

        let vhost_file = self.layout.vhost_file(domain);
        match fs::remove_file(&vhost_file) {
            Ok(()) => info!("Removed {}", vhost_file.display()),
            Err(err) => error!("Failed to remove vhost file {}: {err}", vhost_file.display()),
        }
        self.reload_web_server();

        for command in [
            AcmeCommand::Revoke {
                domain: domain.to_string(),
            },
            AcmeCommand::Remove {
                domain: domain.to_string(),
            },
        ] {
            if let Err(err) = self.acme.run(&command) {
                error!("{} for '{domain}' failed: {err}", command.step());
            }
        }

        remove_dir_if_exists(&self.layout.acme_state_dir(domain));
        remove_dir_if_exists(&self.layout.cert_dir(domain));

        match self.index.remove(domain) {
            Ok(_) | Err(HostIndexError::DomainNotFound) => {}
            Err(err) => warn!("Failed to drop '{domain}' from host index: {err}"),
        }

        info!("Host '{domain}' removed");
        Ok(())
    }

    /// Domains with an issued certificate. A missing certificate root yields
    /// nothing.
    pub fn list(&self) -> Result<HostIter, ManageError> {
        let root = self.layout.cert_root();
        match fs::read_dir(root) {
            Ok(entries) => Ok(HostIter {
                entries: Some(entries),
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("Certificate root {} does not exist", root.display());
                Ok(HostIter { entries: None })
            }
            Err(err) => Err(ManageError::io("Could not read certificate root", root, err)),
        }
    }

    /// Where a domain proxies to: the index first, then the existing vhost file.
    pub fn binding(&self, domain: &str) -> Result<HostBinding, ManageError> {
        match self.index.get(domain) {
            Ok(Some(binding)) => return Ok(binding),
            Ok(None) => {}
            Err(err) => warn!("Could not read host index: {err}"),
        }

        let vhost_file = self.layout.vhost_file(domain);
        let content = fs::read_to_string(&vhost_file)
            .map_err(|err| ManageError::io("Could not read vhost file", &vhost_file, err))?;
        let binding = parse_binding(&content).ok_or_else(|| ManageError::NoContainerBinding {
            domain: domain.to_string(),
        })?;

        debug!("Recovered binding for '{domain}' from {}", vhost_file.display());
        if let Err(err) = self.index.insert(domain, binding.clone()) {
            warn!("Failed to backfill host index for '{domain}': {err}");
        }
        Ok(binding)
    }

    /// Rewrites one existing vhost file from the templates. Does not reload.
    pub fn recreate_config(&self, domain: &str) -> Result<(), ManageError> {
        validate_domain(domain)?;
        if !self.host_exists(domain) {
            return Err(ManageError::NotFound {
                domain: domain.to_string(),
            });
        }

        let vhost_file = self.layout.vhost_file(domain);
        if !vhost_file.is_file() {
            return Err(ManageError::io(
                "Vhost file does not exist",
                &vhost_file,
                std::io::Error::from(ErrorKind::NotFound),
            ));
        }

        let binding = self.binding(domain)?;
        let record = HostRecord::new(domain, binding.container_name, binding.container_port)?;
        let context = VhostContext::new(&record, &self.layout);
        let templates = templates();

        let mut content = templates.http.render(&context);
        content.push_str(&templates.https.render(&context));
        fs::write(&vhost_file, content)
            .map_err(|err| ManageError::io("Could not write vhost file", &vhost_file, err))?;

        info!("Recreated {}", vhost_file.display());
        Ok(())
    }

    /// Recreates each domain's config, logging failures, then reloads once.
    pub fn recreate_configs<S: AsRef<str>>(&self, domains: &[S]) -> RecreateReport {
        let mut report = RecreateReport::default();
        for domain in domains {
            let domain = domain.as_ref();
            match self.recreate_config(domain) {
                Ok(()) => report.recreated.push(domain.to_string()),
                Err(err) => {
                    error!("Failed to recreate config for '{domain}': {err}");
                    report.failed.push((domain.to_string(), err));
                }
            }
        }
        self.reload_web_server();
        report
    }

    /// Recreates the config of every listed host.
    pub fn recreate_all_configs(&self) -> Result<RecreateReport, ManageError> {
        let domains: Vec<String> = self.list()?.collect();
        Ok(self.recreate_configs(&domains))
    }

    fn reload_web_server(&self) {
        self.restarter
            .restart_many(std::slice::from_ref(&self.web_server_service));
    }
}

/// Reads the container binding back out of a rendered HTTPS block.
fn parse_binding(vhost: &str) -> Option<HostBinding> {
    let name = container_name_line().captures(vhost)?.get(1)?.as_str();
    let port = container_port_line()
        .captures(vhost)?
        .get(1)?
        .as_str()
        .parse::<u16>()
        .ok()
        .filter(|port| *port > 0)?;
    validate_container_name(name).ok()?;
    Some(HostBinding::new(name, port))
}

fn remove_dir_if_exists(path: &Path) {
    if !path.exists() {
        info!("Directory {} does not exist. Skipping.", path.display());
        return;
    }
    match fs::remove_dir_all(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(err) => error!("Failed to remove {}: {err}", path.display()),
    }
}
