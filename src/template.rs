//! Virtual-host templates.
//!
//! Both templates are compiled once per process into a list of literal and
//! field segments. Rendering splices values in verbatim: domain and container
//! names are validated upstream and never escaped here.
use std::{str::FromStr, sync::OnceLock};

use strum_macros::{AsRefStr, EnumString};

use crate::host::HostRecord;
use crate::layout::HostLayout;

const HTTP_SOURCE: &str = r#"server {
    listen 80;
    server_name {{ domain }};

    location / {
        return 301 https://$host$request_uri;
    }

    location /.well-known/acme-challenge {
        alias {{ web_root }}/.well-known/acme-challenge;
        try_files $uri $uri/;
    }
}
"#;

const HTTPS_SOURCE: &str = r#"
server {
    listen 443 ssl;
    server_name {{ domain }};

    if ($host != "{{ domain }}") {
        return 403;
    }

    ssl_certificate {{ cert_dir }}/fullchain.pem;
    ssl_certificate_key {{ cert_dir }}/key.pem;

    error_log {{ log_dir }}/{{ domain }}.error.log;
    access_log {{ log_dir }}/{{ domain }}.log;

    keepalive_timeout 5;

    location @app {
        set $containerName {{ container_name }};
        set $containerPort {{ container_port }};
        proxy_pass http://$containerName:$containerPort;
        proxy_set_header Host $host;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_redirect off;
    }

    location / {
        try_files @app @app;
    }
}
"#;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Values a template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Domain,
    ContainerName,
    ContainerPort,
    WebRoot,
    CertDir,
    LogDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    Field(Field),
}

/// A compiled template.
#[derive(Debug, Clone)]
pub struct Template {
    name: &'static str,
    segments: Vec<Segment>,
}

/// Reasons a template source fails to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    Unterminated { template: &'static str, offset: usize },
    UnknownField { template: &'static str, field: String },
}

impl Template {
    /// Splits `source` into literal text and `{{ field }}` references.
    pub fn compile(name: &'static str, source: &'static str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                segments.push(Segment::Literal(&rest[..start]));
            }
            let after_open = &rest[start + OPEN.len()..];
            let end = after_open.find(CLOSE).ok_or(TemplateError::Unterminated {
                template: name,
                offset: offset + start,
            })?;
            let raw = after_open[..end].trim();
            let field = Field::from_str(raw).map_err(|_| TemplateError::UnknownField {
                template: name,
                field: raw.to_string(),
            })?;
            segments.push(Segment::Field(field));

            let consumed = start + OPEN.len() + end + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest));
        }

        Ok(Self { name, segments })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fields referenced by the template, in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(field) => Some(*field),
            Segment::Literal(_) => None,
        })
    }

    /// Renders the template. Output depends only on `context`.
    pub fn render(&self, context: &VhostContext) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => out.push_str(context.value(*field)),
            }
        }
        out
    }
}

/// Values rendered into the virtual-host templates for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VhostContext {
    domain: String,
    container_name: String,
    container_port: String,
    web_root: String,
    cert_dir: String,
    log_dir: String,
}

impl VhostContext {
    pub fn new(record: &HostRecord, layout: &HostLayout) -> Self {
        let domain = record.domain();
        Self {
            domain: domain.to_string(),
            container_name: record.container_name().to_string(),
            container_port: record.container_port().to_string(),
            web_root: layout.webroot(domain).display().to_string(),
            cert_dir: layout.cert_dir(domain).display().to_string(),
            log_dir: layout.log_dir().display().to_string(),
        }
    }

    fn value(&self, field: Field) -> &str {
        match field {
            Field::Domain => &self.domain,
            Field::ContainerName => &self.container_name,
            Field::ContainerPort => &self.container_port,
            Field::WebRoot => &self.web_root,
            Field::CertDir => &self.cert_dir,
            Field::LogDir => &self.log_dir,
        }
    }
}

/// The plaintext block and the TLS block of a virtual-host file.
#[derive(Debug)]
pub struct VhostTemplates {
    pub http: Template,
    pub https: Template,
}

static TEMPLATES: OnceLock<VhostTemplates> = OnceLock::new();

/// Compiles the built-in templates. Called once at startup; later calls are no-ops.
pub fn init() -> &'static VhostTemplates {
    TEMPLATES.get_or_init(|| VhostTemplates {
        http: Template::compile("http", HTTP_SOURCE).expect("built-in http template compiles"),
        https: Template::compile("https", HTTPS_SOURCE)
            .expect("built-in https template compiles"),
    })
}

/// The process-wide templates.
pub fn templates() -> &'static VhostTemplates {
    init()
}
