use crate::error::Error;
use ipnetwork::IpNetwork;
use lazy_static::lazy_static;
use serde::{Deserialize, Deserializer};
use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds};
use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use trust_dns_server::client::rr::Name;

pub type Shared = Arc<Config>;

pub const ENV_DOMAIN: &str = "DOCKER_DOMAIN_DNS";
pub const ENV_DNS_IP: &str = "DOCKER_IP_DNS";
pub const ENV_DNS_PORT: &str = "DOCKER_PORT_DNS";
pub const ENV_REFRESH_INTERVAL: &str = "DOCKER_RELOAD_TIME_DNS";
pub const ENV_DOCKER_SOCKET: &str = "DOCKER_SOCKET_DNS";
pub const ENV_API_BIND: &str = "DOCKER_API_BIND_DNS";

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Zone suffix, stored without leading or trailing dots (e.g. `docker.lan`).
    #[serde(deserialize_with = "deserialize_domain")]
    pub domain: String,
    /// Address published for `ns1.<domain>` and its reverse entry.
    pub dns_ip: Ipv4Addr,
    pub dns_port: u16,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub refresh_interval: Duration,
    pub docker_socket: PathBuf,
    /// SOA admin mailbox. Defaults to `admin@<domain>`.
    pub ns_admin: Option<String>,
    pub api_bind_addr: Option<SocketAddr>,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub api_timeout: Duration,
    pub soa: SoaTimers,
}

#[serde_as]
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct SoaTimers {
    #[serde_as(as = "DurationSeconds<u64>")]
    pub refresh: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub retry: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub expire: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub minimum: Duration,
}

impl Default for SoaTimers {
    fn default() -> Self {
        SoaTimers {
            refresh: Duration::from_secs(2 * 60 * 60),
            retry: Duration::from_secs(30 * 60),
            expire: Duration::from_secs(14 * 24 * 60 * 60),
            minimum: Duration::from_secs(10 * 60),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            domain: "docker.lan".to_string(),
            dns_ip: Ipv4Addr::UNSPECIFIED,
            dns_port: 53,
            refresh_interval: Duration::from_millis(10_000),
            docker_socket: PathBuf::from("/var/run/docker.sock"),
            ns_admin: None,
            api_bind_addr: None,
            api_timeout: Duration::from_secs(10),
            soa: SoaTimers::default(),
        }
    }
}

lazy_static! {
    // NOTE(XXX): Once the "ip" feature has stabilized we can use Ipv6Addr.is_unique_local[0].
    //            Presently this feature is unstable so we home-roll. See also RFC 4193[1].
    // [0]: https://doc.rust-lang.org/std/net/struct.Ipv6Addr.html#method.is_unique_local
    // [1]: https://www.rfc-editor.org/rfc/rfc4193.html
    static ref IPV6_UNIQUE_LOCAL_NETWORK: IpNetwork = IpNetwork::from_str("fc00::/7").unwrap();
}

impl Config {
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        conf.validate()
    }

    /// Build a config from the process environment, falling back to defaults for unset
    /// variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup. Unset variables keep their default;
    /// set but malformed variables are an [`Error::InvalidConfig`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut conf = Config::default();
        if let Some(domain) = lookup(ENV_DOMAIN) {
            conf.domain = normalize_domain(&domain);
            if conf.domain.is_empty() {
                return Err(Error::InvalidConfig(ENV_DOMAIN.to_string(), domain));
            }
        }
        if let Some(ip) = lookup(ENV_DNS_IP) {
            conf.dns_ip = parse_var(ENV_DNS_IP, &ip)?;
        }
        if let Some(port) = lookup(ENV_DNS_PORT) {
            conf.dns_port = parse_var(ENV_DNS_PORT, &port)?;
        }
        if let Some(millis) = lookup(ENV_REFRESH_INTERVAL) {
            let parsed: u64 = parse_var(ENV_REFRESH_INTERVAL, &millis)?;
            if parsed == 0 {
                return Err(Error::InvalidConfig(ENV_REFRESH_INTERVAL.to_string(), millis));
            }
            conf.refresh_interval = Duration::from_millis(parsed);
        }
        if let Some(socket) = lookup(ENV_DOCKER_SOCKET) {
            conf.docker_socket = PathBuf::from(socket);
        }
        if let Some(addr) = lookup(ENV_API_BIND) {
            conf.api_bind_addr = Some(parse_var(ENV_API_BIND, &addr)?);
        }
        conf.validate()
    }

    /// Checks shared by every config source. The refresh interval must be non-zero and the API
    /// may only bind a private address.
    fn validate(self) -> Result<Self, Error> {
        if self.refresh_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "refresh_interval".to_string(),
                format!("{:?}", self.refresh_interval),
            ));
        }
        self.bind_addr_is_secure()?;
        Ok(self)
    }

    /// The UDP address the DNS listener binds. Always the wildcard address; `dns_ip` only
    /// decides what the zone advertises.
    #[must_use]
    pub fn dns_udp_bind_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.dns_port)
    }

    /// Qualify an unqualified host label with the zone suffix.
    #[must_use]
    pub fn qualify(&self, name: &str) -> String {
        format!("{name}.{}", self.domain)
    }

    #[must_use]
    pub fn ns_domain(&self) -> String {
        self.qualify("ns1")
    }

    pub fn zone_name(&self) -> Result<Name, Error> {
        Ok(Name::from_str(&format!("{}.", self.domain))?)
    }

    pub fn ns_name(&self) -> Result<Name, Error> {
        Ok(Name::from_str(&format!("{}.", self.ns_domain()))?)
    }

    pub fn ns_admin(&self) -> Result<Name, Error> {
        Ok(Name::from_str(&format!("{}.", self.sanitized_ns_admin()))?)
    }

    fn sanitized_ns_admin(&self) -> Cow<str> {
        let mailbox = match &self.ns_admin {
            Some(mailbox) => Cow::Borrowed(mailbox.as_str()),
            None => Cow::Owned(format!("admin@{}", self.domain)),
        };
        if let Some((user, domain)) = mailbox.split_once('@') {
            let user = user.replace('.', "\\.");
            return Cow::Owned(format!("{user}.{domain}"));
        }
        mailbox
    }

    fn bind_addr_is_secure(&self) -> Result<(), Error> {
        match self.api_bind_addr {
            None => Ok(()),
            Some(SocketAddr::V4(v4_addr)) => {
                let ip = v4_addr.ip();
                if !ip.is_loopback() && !ip.is_private() {
                    return Err(Error::InsecureAPIBind(IpAddr::V4(*ip)));
                }
                Ok(())
            }
            Some(SocketAddr::V6(v6_addr)) => {
                let ip = v6_addr.ip();
                if !ip.is_loopback() && !IPV6_UNIQUE_LOCAL_NETWORK.contains(IpAddr::V6(*ip)) {
                    return Err(Error::InsecureAPIBind(IpAddr::V6(*ip)));
                }
                Ok(())
            }
        }
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_matches('.').to_ascii_lowercase()
}

fn deserialize_domain<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let domain = normalize_domain(&raw);
    if domain.is_empty() {
        return Err(serde::de::Error::custom(format!("invalid domain \"{raw}\"")));
    }
    Ok(domain)
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let conf = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(conf.domain, "docker.lan");
        assert_eq!(conf.dns_ip, Ipv4Addr::UNSPECIFIED);
        assert_eq!(conf.dns_port, 53);
        assert_eq!(conf.refresh_interval, Duration::from_millis(10_000));
        assert_eq!(conf.docker_socket, PathBuf::from("/var/run/docker.sock"));
        assert!(conf.api_bind_addr.is_none());
        assert_eq!(
            conf.dns_udp_bind_addr(),
            "0.0.0.0:53".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn environment_overrides() {
        let conf = Config::from_lookup(lookup(&[
            (ENV_DOMAIN, ".Containers.Example"),
            (ENV_DNS_IP, "172.17.0.1"),
            (ENV_DNS_PORT, "5353"),
            (ENV_REFRESH_INTERVAL, "2500"),
            (ENV_API_BIND, "127.0.0.1:8053"),
        ]))
        .unwrap();
        assert_eq!(conf.domain, "containers.example");
        assert_eq!(conf.dns_ip, Ipv4Addr::new(172, 17, 0, 1));
        assert_eq!(conf.dns_port, 5353);
        assert_eq!(conf.refresh_interval, Duration::from_millis(2500));
        assert_eq!(conf.ns_domain(), "ns1.containers.example");
    }

    #[test]
    fn malformed_environment_names_the_variable() {
        let err = Config::from_lookup(lookup(&[(ENV_DNS_PORT, "domain")])).unwrap_err();
        match err {
            Error::InvalidConfig(key, value) => {
                assert_eq!(key, ENV_DNS_PORT);
                assert_eq!(value, "domain");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn public_api_bind_rejected() {
        let err = Config::from_lookup(lookup(&[(ENV_API_BIND, "8.8.8.8:80")])).unwrap_err();
        assert!(matches!(err, Error::InsecureAPIBind(_)));
        assert!(Config::from_lookup(lookup(&[(ENV_API_BIND, "[fd00::1]:80")])).is_ok());
    }

    #[test]
    fn json_fields_are_optional() {
        let conf: Config =
            serde_json::from_str(r#"{"domain": ".lab.lan", "refresh_interval": 500}"#).unwrap();
        assert_eq!(conf.domain, "lab.lan");
        assert_eq!(conf.refresh_interval, Duration::from_millis(500));
        assert_eq!(conf.soa, SoaTimers::default());
    }

    #[test]
    fn zero_refresh_interval_rejected() {
        let err = Config::from_lookup(lookup(&[(ENV_REFRESH_INTERVAL, "0")])).unwrap_err();
        match err {
            Error::InvalidConfig(key, value) => {
                assert_eq!(key, ENV_REFRESH_INTERVAL);
                assert_eq!(value, "0");
            }
            other => panic!("unexpected error {other:?}"),
        }

        let conf: Config = serde_json::from_str(r#"{"refresh_interval": 0}"#).unwrap();
        assert!(matches!(
            conf.validate(),
            Err(Error::InvalidConfig(key, _)) if key == "refresh_interval"
        ));
    }

    #[test]
    fn ns_admin_defaults_to_domain_mailbox() {
        let conf = Config::default();
        assert_eq!(conf.ns_admin().unwrap().to_string(), "admin.docker.lan.");

        let conf = Config {
            ns_admin: Some("dns.admin@example.com".to_string()),
            ..Config::default()
        };
        assert_eq!(conf.sanitized_ns_admin(), "dns\\.admin.example.com");
    }
}
