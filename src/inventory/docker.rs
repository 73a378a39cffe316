//! A Docker Engine API implementation of the [`Inventory`][super::Inventory] trait.
//!
//! Lists running containers with `GET /containers/json`, spoken as plain HTTP/1.1 over the
//! daemon's Unix socket. Only the fields needed for the zone are decoded:
//!
//! ```json
//! [ { "Names": ["/foo"],
//!     "NetworkSettings": { "Networks": { "bridge": { "IPAddress": "172.17.0.2" } } } } ]
//! ```
//!
//! A `Networks` value is normally one endpoint object, but some daemons and proxies report a
//! list of endpoints for the same network. Both shapes are accepted.
use crate::error::Error;
use crate::inventory::{ContainerSnapshot, Inventory, NetworkAttachment};
use hyper::body::Bytes;
use hyper::client::conn;
use hyper::header::HOST;
use hyper::{Body, Method, Request};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use tokio::net::UnixStream;

const CONTAINERS_PATH: &str = "/containers/json";

/// Lists containers from a Docker daemon.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct DockerInventory {
    socket_path: PathBuf,
}

impl DockerInventory {
    #[must_use]
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        DockerInventory {
            socket_path: socket_path.into(),
        }
    }

    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    async fn fetch(&self) -> Result<Bytes, Error> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut sender, connection) = conn::handshake(stream).await?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::debug!("docker connection closed with error: {err}");
            }
        });

        let request = Request::builder()
            .method(Method::GET)
            .uri(CONTAINERS_PATH)
            .header(HOST, "docker")
            .body(Body::empty())?;
        let response = sender.send_request(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::InventoryStatus(status));
        }
        Ok(hyper::body::to_bytes(response.into_body()).await?)
    }
}

#[async_trait::async_trait]
impl Inventory for DockerInventory {
    async fn list(&self) -> Result<Vec<ContainerSnapshot>, Error> {
        let body = self.fetch().await?;
        parse_listing(&body)
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct ContainerSummary {
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    network_settings: Option<NetworkSettings>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct NetworkSettings {
    #[serde(default)]
    networks: Option<BTreeMap<String, Endpoints>>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum Endpoints {
    One(EndpointSettings),
    Many(Vec<EndpointSettings>),
}

#[derive(Deserialize, Debug)]
struct EndpointSettings {
    #[serde(rename = "IPAddress", default)]
    ip_address: Option<String>,
}

impl Endpoints {
    fn into_vec(self) -> Vec<EndpointSettings> {
        match self {
            Endpoints::One(endpoint) => vec![endpoint],
            Endpoints::Many(endpoints) => endpoints,
        }
    }
}

/// Decode a `/containers/json` response body. Containers without a name are skipped, as are
/// endpoints without an IPv4 address (e.g. host networking).
pub(crate) fn parse_listing(body: &[u8]) -> Result<Vec<ContainerSnapshot>, Error> {
    let summaries: Vec<ContainerSummary> = serde_json::from_slice(body)?;
    Ok(summaries.into_iter().filter_map(snapshot).collect())
}

fn snapshot(summary: ContainerSummary) -> Option<ContainerSnapshot> {
    let Some(name) = container_name(&summary.names) else {
        tracing::warn!("skipping unnamed container in inventory: {:?}", summary.names);
        return None;
    };

    let networks = summary
        .network_settings
        .and_then(|settings| settings.networks)
        .unwrap_or_default()
        .into_iter()
        .map(|(network, endpoints)| NetworkAttachment {
            addresses: endpoints
                .into_vec()
                .into_iter()
                .filter_map(|endpoint| endpoint_address(&name, &network, endpoint))
                .collect(),
            network,
        })
        .collect();

    Some(ContainerSnapshot { name, networks })
}

// Docker reports names with a leading slash, e.g. "/foo".
fn container_name(names: &[String]) -> Option<String> {
    names
        .first()
        .and_then(|name| name.trim_start_matches('/').split('/').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn endpoint_address(container: &str, network: &str, endpoint: EndpointSettings) -> Option<Ipv4Addr> {
    let raw = endpoint.ip_address?;
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(ip) => Some(ip),
        Err(_) => {
            tracing::debug!("ignoring non-IPv4 address {raw} of {container} on {network}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_endpoint_networks() {
        let body = br#"[
            {"Id": "abc", "Names": ["/foo"], "State": "running",
             "NetworkSettings": {"Networks": {
                "bridge": {"IPAddress": "172.17.0.2", "Gateway": "172.17.0.1"},
                "backend": {"IPAddress": "10.5.0.3"}}}}
        ]"#;
        let containers = parse_listing(body).unwrap();
        assert_eq!(
            containers,
            vec![ContainerSnapshot {
                name: "foo".to_string(),
                networks: vec![
                    NetworkAttachment {
                        network: "backend".to_string(),
                        addresses: vec![Ipv4Addr::new(10, 5, 0, 3)],
                    },
                    NetworkAttachment {
                        network: "bridge".to_string(),
                        addresses: vec![Ipv4Addr::new(172, 17, 0, 2)],
                    },
                ],
            }]
        );
    }

    #[test]
    fn parses_endpoint_lists() {
        let body = br#"[
            {"Names": ["/bar"],
             "NetworkSettings": {"Networks": {
                "overlay": [{"IPAddress": "10.0.0.7"}, {"IPAddress": "10.0.0.8"}]}}}
        ]"#;
        let containers = parse_listing(body).unwrap();
        assert_eq!(
            containers[0].addresses().collect::<Vec<_>>(),
            vec![Ipv4Addr::new(10, 0, 0, 7), Ipv4Addr::new(10, 0, 0, 8)]
        );
    }

    #[test]
    fn drops_missing_and_non_ipv4_addresses() {
        let body = br#"[
            {"Names": ["/host-net"], "NetworkSettings": {"Networks": {"host": {"IPAddress": ""}}}},
            {"Names": ["/v6"], "NetworkSettings": {"Networks": {"v6": {"IPAddress": "fd00::2"}}}},
            {"Names": ["/bare"], "NetworkSettings": {"Networks": null}},
            {"Names": ["/nosettings"]}
        ]"#;
        let containers = parse_listing(body).unwrap();
        let names: Vec<&str> = containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["host-net", "v6", "bare", "nosettings"]);
        assert!(containers.iter().all(|c| c.addresses().next().is_none()));
    }

    #[test]
    fn skips_unnamed_containers() {
        let body = br#"[{"Names": []}, {"Names": ["/"]}, {"Names": ["/ok"]}]"#;
        let containers = parse_listing(body).unwrap();
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].name, "ok");
    }

    #[test]
    fn rejects_non_listing_body() {
        assert!(matches!(
            parse_listing(br#"{"message": "page not found"}"#),
            Err(Error::InvalidJSON(_))
        ));
    }

    #[tokio::test]
    async fn missing_socket_is_an_io_error() {
        let inventory = DockerInventory::new("/nonexistent/dockcrab-test.sock");
        assert!(matches!(inventory.list().await, Err(Error::IO(_))));
    }
}
