use crate::config::{Credentials, ServerAddress, ServerTopology};

pub const SCHEME: &str = "mongodb://";

/// Which credentials prefix a host in a replica-set address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPlacement {
    /// No server has its own credentials: shared ones (if any) appear once, up front.
    SharedLeading,
    /// At least one server has its own credentials: each host carries only its
    /// own, and hosts without any stay bare.
    PerServer,
}

/// Decide where credentials go.
///
/// | per-server creds on any host | placement        |
/// |------------------------------|------------------|
/// | no                           | `SharedLeading`  |
/// | yes                          | `PerServer`      |
#[must_use]
pub fn credential_placement(servers: &[ServerAddress]) -> CredentialPlacement {
    if servers.iter().any(|s| s.credentials.is_some()) {
        CredentialPlacement::PerServer
    } else {
        CredentialPlacement::SharedLeading
    }
}

// Everything outside the unreserved set is escaped, so the userinfo never
// contains `:`, `@`, `/`, `,`, `?` or `#` beyond its own separators.
fn userinfo(c: &Credentials) -> String {
    format!("{}:{}@", urlencoding::encode(&c.username), urlencoding::encode(&c.password))
}

/// Pre-built connection address: base (`scheme://...host:port/`) plus parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseAddress {
    pub base: String,
    pub params: Vec<(String, String)>,
}

impl BaseAddress {
    #[must_use]
    pub fn from_topology(topology: &ServerTopology) -> Self {
        match topology {
            ServerTopology::Single { server } => {
                let mut base = String::from(SCHEME);
                if let Some(c) = &server.credentials {
                    base.push_str(&userinfo(c));
                }
                base.push_str(&format!("{}:{}/", server.host, server.port));
                Self { base, params: Vec::new() }
            }
            ServerTopology::ReplicaSet { servers, name, ssl, auth_source, shared_credentials } => {
                let placement = credential_placement(servers);
                let mut base = String::from(SCHEME);
                if placement == CredentialPlacement::SharedLeading
                    && let Some(c) = shared_credentials
                {
                    base.push_str(&userinfo(c));
                }
                let hosts: Vec<String> = servers
                    .iter()
                    .map(|s| {
                        let creds = match placement {
                            CredentialPlacement::SharedLeading => None,
                            CredentialPlacement::PerServer => s.credentials.as_ref(),
                        };
                        let prefix = creds.map(userinfo).unwrap_or_default();
                        format!("{prefix}{}:{}", s.host, s.port)
                    })
                    .collect();
                base.push_str(&hosts.join(","));
                base.push('/');

                let mut params = Vec::new();
                if *ssl {
                    params.push(("ssl".to_string(), "true".to_string()));
                }
                params.push(("replicaSet".to_string(), name.clone()));
                if let Some(src) = auth_source {
                    params.push(("authSource".to_string(), src.clone()));
                }
                Self { base, params }
            }
        }
    }

    /// Full connection URL for one database.
    #[must_use]
    pub fn url_for(&self, database: &str) -> String {
        let mut url = format!("{}{database}", self.base);
        if !self.params.is_empty() {
            let query: Vec<String> = self.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    /// URL with every `user:pass@` segment removed, for logging.
    #[must_use]
    pub fn redacted_url_for(&self, database: &str) -> String {
        redact(&self.url_for(database))
    }
}

fn redact(url: &str) -> String {
    let Some(rest) = url.strip_prefix(SCHEME) else { return url.to_string() };
    let (hosts, tail) = rest.split_once('/').unwrap_or((rest, ""));
    let hosts: Vec<&str> =
        hosts.split(',').map(|h| h.rsplit_once('@').map_or(h, |(_, host)| host)).collect();
    format!("{SCHEME}{}/{tail}", hosts.join(","))
}
