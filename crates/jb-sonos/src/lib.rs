//! Sonos speaker control for the jukebox.
//!
//! Speaks UPnP SOAP to a single speaker on its local control port. Only the
//! handful of `AVTransport` and `DeviceProperties` actions needed to play a
//! URI from a fresh queue, pause, resume and clear are implemented. Spotify
//! share links are recognised and enqueued through the Spotify service.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

mod share;
mod soap;

pub use share::{ShareKind, ShareLink};
use soap::extract_tag;

/// Default request timeout for control calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const CONTROL_PORT: u16 = 1400;
const AV_TRANSPORT_PATH: &str = "/MediaRenderer/AVTransport/Control";
const AV_TRANSPORT_SERVICE: &str = "urn:schemas-upnp-org:service:AVTransport:1";
const DEVICE_PROPERTIES_PATH: &str = "/DeviceProperties/Control";
const DEVICE_PROPERTIES_SERVICE: &str = "urn:schemas-upnp-org:service:DeviceProperties:1";
const DEVICE_DESCRIPTION_PATH: &str = "/xml/device_description.xml";

/// Sonos client errors.
#[derive(Debug, Error)]
pub enum SonosError {
    /// The configured host is unusable.
    #[error("invalid speaker host: {reason}")]
    InvalidHost { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The speaker answered with a UPnP fault.
    #[error("{action} rejected by speaker (UPnP error {code})")]
    Fault { action: &'static str, code: String },
    /// The speaker answered with an unexpected status.
    #[error("{action} failed with status {status}")]
    Status { action: &'static str, status: u16 },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Queue play modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    Normal,
    ShuffleNoRepeat,
}

impl PlayMode {
    pub const fn from_shuffle(shuffle: bool) -> Self {
        if shuffle {
            Self::ShuffleNoRepeat
        } else {
            Self::Normal
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::ShuffleNoRepeat => "SHUFFLE_NOREPEAT",
        }
    }
}

/// Client for one speaker.
pub struct SonosClient {
    http: reqwest::Client,
    base_url: String,
}

impl fmt::Debug for SonosClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SonosClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SonosClient {
    /// Creates a client for the speaker at `host` (IP address or hostname,
    /// optionally with a port).
    pub fn new(host: &str) -> Result<Self, SonosError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(SonosError::InvalidHost {
                reason: "host cannot be empty",
            });
        }
        if host.contains('/') {
            return Err(SonosError::InvalidHost {
                reason: "host must not contain a scheme or path",
            });
        }

        let base_url = if host.contains(':') {
            format!("http://{host}")
        } else {
            format!("http://{host}:{CONTROL_PORT}")
        };

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(SonosError::ClientBuild)?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the zone name configured on the speaker.
    pub async fn zone_name(&self) -> Result<String, SonosError> {
        let body = self
            .call(
                DEVICE_PROPERTIES_PATH,
                DEVICE_PROPERTIES_SERVICE,
                "GetZoneAttributes",
                &[],
            )
            .await?;
        extract_tag(&body, "CurrentZoneName")
            .ok_or_else(|| SonosError::InvalidResponse("missing CurrentZoneName".to_string()))
    }

    /// Returns the speaker UID (`RINCON_...`), needed to address its queue.
    pub async fn uid(&self) -> Result<String, SonosError> {
        let url = format!("{}{DEVICE_DESCRIPTION_PATH}", self.base_url);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SonosError::Status {
                action: "device description",
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        let udn = extract_tag(&body, "UDN")
            .ok_or_else(|| SonosError::InvalidResponse("missing UDN".to_string()))?;
        Ok(udn.trim_start_matches("uuid:").to_string())
    }

    /// Empties the queue.
    pub async fn clear_queue(&self) -> Result<(), SonosError> {
        self.transport("RemoveAllTracksFromQueue", &[]).await?;
        Ok(())
    }

    /// Appends `uri` to the queue and returns the position of the first added track.
    pub async fn add_uri_to_queue(&self, uri: &str) -> Result<u32, SonosError> {
        self.enqueue(uri, "").await
    }

    /// Appends a Spotify item to the queue and returns the position of the
    /// first added track.
    pub async fn add_share_link_to_queue(&self, link: &ShareLink) -> Result<u32, SonosError> {
        self.enqueue(&link.enqueue_uri(), &link.metadata()).await
    }

    async fn enqueue(&self, uri: &str, metadata: &str) -> Result<u32, SonosError> {
        let body = self
            .transport(
                "AddURIToQueue",
                &[
                    ("EnqueuedURI", uri),
                    ("EnqueuedURIMetaData", metadata),
                    ("DesiredFirstTrackNumberEnqueued", "1"),
                    ("EnqueueAsNext", "0"),
                ],
            )
            .await?;
        extract_tag(&body, "FirstTrackNumberEnqueued")
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| {
                SonosError::InvalidResponse("missing FirstTrackNumberEnqueued".to_string())
            })
    }

    pub async fn set_play_mode(&self, mode: PlayMode) -> Result<(), SonosError> {
        self.transport("SetPlayMode", &[("NewPlayMode", mode.as_str())])
            .await?;
        Ok(())
    }

    /// Switches the speaker to its queue and starts from the first track.
    pub async fn play_from_queue_start(&self) -> Result<(), SonosError> {
        let uid = self.uid().await?;
        let queue_uri = format!("x-rincon-queue:{uid}#0");
        self.transport(
            "SetAVTransportURI",
            &[("CurrentURI", &queue_uri), ("CurrentURIMetaData", "")],
        )
        .await?;
        self.transport("Seek", &[("Unit", "TRACK_NR"), ("Target", "1")])
            .await?;
        self.play().await
    }

    /// Replaces the queue with `uri` and starts playing it.
    ///
    /// Spotify share links and `spotify:` URIs go through the Spotify service;
    /// anything else is enqueued as-is.
    pub async fn play_uri(&self, uri: &str, shuffle: bool) -> Result<(), SonosError> {
        self.clear_queue().await?;
        let position = match ShareLink::parse(uri) {
            Some(link) => {
                tracing::debug!(uri, kind = link.kind().as_str(), "enqueuing share link");
                self.add_share_link_to_queue(&link).await?
            }
            None => self.add_uri_to_queue(uri).await?,
        };
        tracing::debug!(uri, position, "enqueued uri");
        self.set_play_mode(PlayMode::from_shuffle(shuffle)).await?;
        self.play_from_queue_start().await
    }

    pub async fn play(&self) -> Result<(), SonosError> {
        self.transport("Play", &[("Speed", "1")]).await?;
        Ok(())
    }

    pub async fn pause(&self) -> Result<(), SonosError> {
        self.transport("Pause", &[]).await?;
        Ok(())
    }

    async fn transport(
        &self,
        action: &'static str,
        args: &[(&str, &str)],
    ) -> Result<String, SonosError> {
        let mut all_args = vec![("InstanceID", "0")];
        all_args.extend_from_slice(args);
        self.call(AV_TRANSPORT_PATH, AV_TRANSPORT_SERVICE, action, &all_args)
            .await
    }

    async fn call(
        &self,
        path: &str,
        service: &str,
        action: &'static str,
        args: &[(&str, &str)],
    ) -> Result<String, SonosError> {
        let envelope = soap::envelope(service, action, args);
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .header("Content-Type", r#"text/xml; charset="utf-8""#)
            .header("SOAPACTION", format!("\"{service}#{action}\""))
            .body(envelope)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(soap::parse_fault(action, &body).unwrap_or(SonosError::Status {
                action,
                status: status.as_u16(),
            }));
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn client_rejects_empty_host() {
        assert!(matches!(
            SonosClient::new("  "),
            Err(SonosError::InvalidHost { .. })
        ));
    }

    #[test]
    fn client_rejects_url_host() {
        assert!(matches!(
            SonosClient::new("http://192.168.1.100"),
            Err(SonosError::InvalidHost { .. })
        ));
    }

    #[test]
    fn client_uses_control_port_by_default() {
        let client = SonosClient::new("192.168.1.100").unwrap();
        assert_eq!(client.base_url(), "http://192.168.1.100:1400");

        let client = SonosClient::new("127.0.0.1:8080").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn play_mode_follows_shuffle() {
        assert_eq!(PlayMode::from_shuffle(true).as_str(), "SHUFFLE_NOREPEAT");
        assert_eq!(PlayMode::from_shuffle(false).as_str(), "NORMAL");
    }

    /// A request seen by the fake speaker.
    #[derive(Debug, Clone)]
    struct Seen {
        action: String,
        body: String,
    }

    impl Seen {
        fn short_action(&self) -> &str {
            self.action.rsplit('#').next().unwrap_or_default()
        }
    }

    /// Minimal speaker answering every request with `reply(soap_action)`.
    async fn fake_speaker(reply: fn(&str) -> (u16, String)) -> (String, Arc<Mutex<Vec<Seen>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let mut raw = Vec::new();
                let mut buf = [0_u8; 4096];
                // Read headers, then the announced body length.
                let header_end = loop {
                    let n = stream.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break None;
                    }
                    raw.extend_from_slice(&buf[..n]);
                    if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                        break Some(pos + 4);
                    }
                };
                let Some(header_end) = header_end else {
                    continue;
                };
                let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
                let length = head
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                while raw.len() < header_end + length {
                    let n = stream.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    raw.extend_from_slice(&buf[..n]);
                }

                let action = head
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("soapaction")
                            .then(|| value.trim().trim_matches('"').to_string())
                    })
                    .unwrap_or_else(|| head.lines().next().unwrap_or_default().to_string());
                let body = String::from_utf8_lossy(&raw[header_end..]).to_string();
                log.lock().unwrap().push(Seen {
                    action: action.clone(),
                    body,
                });

                let (status, body) = reply(&action);
                let response = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: text/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.ok();
            }
        });

        (addr.to_string(), seen)
    }

    fn happy_speaker(action: &str) -> (u16, String) {
        if action.starts_with("GET /xml/device_description.xml") {
            return (
                200,
                "<root><device><UDN>uuid:RINCON_000E58A0B1C201400</UDN></device></root>"
                    .to_string(),
            );
        }
        if action.ends_with("#AddURIToQueue") {
            return (
                200,
                "<s:Envelope><s:Body><u:AddURIToQueueResponse><FirstTrackNumberEnqueued>1</FirstTrackNumberEnqueued></u:AddURIToQueueResponse></s:Body></s:Envelope>"
                    .to_string(),
            );
        }
        (200, "<s:Envelope><s:Body/></s:Envelope>".to_string())
    }

    #[tokio::test]
    async fn play_uri_rebuilds_queue_and_starts() {
        let (host, seen) = fake_speaker(happy_speaker).await;
        let client = SonosClient::new(&host).unwrap();

        client.play_uri("x-file-cifs://nas/album", true).await.unwrap();

        let seen = seen.lock().unwrap();
        let actions: Vec<&str> = seen.iter().map(Seen::short_action).collect();
        assert_eq!(
            actions,
            vec![
                "RemoveAllTracksFromQueue",
                "AddURIToQueue",
                "SetPlayMode",
                "GET /xml/device_description.xml HTTP/1.1",
                "SetAVTransportURI",
                "Seek",
                "Play",
            ]
        );
        assert!(seen[1].body.contains("<EnqueuedURI>x-file-cifs://nas/album</EnqueuedURI>"));
        assert!(seen[1].body.contains("<EnqueuedURIMetaData></EnqueuedURIMetaData>"));
    }

    #[tokio::test]
    async fn play_uri_enqueues_share_link_through_spotify() {
        let (host, seen) = fake_speaker(happy_speaker).await;
        let client = SonosClient::new(&host).unwrap();

        client
            .play_uri("https://open.spotify.com/album/1ATL5GLyefJaxhQzSPVrLX?si=x", false)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        let enqueue = seen
            .iter()
            .find(|request| request.short_action() == "AddURIToQueue")
            .unwrap();
        assert!(enqueue.body.contains(
            "<EnqueuedURI>x-rincon-cpcontainer:1004206cspotify%3aalbum%3a1ATL5GLyefJaxhQzSPVrLX</EnqueuedURI>"
        ));
        // The DIDL document travels escaped inside the SOAP argument.
        assert!(enqueue.body.contains(
            "&lt;upnp:class&gt;object.container.album.musicAlbum&lt;/upnp:class&gt;"
        ));
        assert!(enqueue.body.contains("SA_RINCON2311_X_#Svc2311-0-Token"));
        assert!(!enqueue.body.contains("open.spotify.com"));
        assert_eq!(seen.last().unwrap().short_action(), "Play");
    }

    #[tokio::test]
    async fn fault_carries_upnp_error_code() {
        fn failing(_action: &str) -> (u16, String) {
            (
                500,
                "<s:Envelope><s:Body><s:Fault><detail><UPnPError><errorCode>701</errorCode></UPnPError></detail></s:Fault></s:Body></s:Envelope>"
                    .to_string(),
            )
        }
        let (host, _seen) = fake_speaker(failing).await;
        let client = SonosClient::new(&host).unwrap();

        let err = client.pause().await.unwrap_err();

        assert!(matches!(
            err,
            SonosError::Fault { action: "Pause", ref code } if code == "701"
        ));
    }
}
