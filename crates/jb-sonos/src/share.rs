//! Spotify share links.
//!
//! Speakers cannot play `https://open.spotify.com/...` URLs directly. They are
//! enqueued through the Spotify music service with a service-specific URI and
//! a DIDL-Lite description of the item.

use std::sync::LazyLock;

use regex::Regex;

use crate::soap::escape_xml;

static SPOTIFY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"spotify.*[:/](album|episode|playlist|show|track)[:/](\w+)").unwrap()
});

/// Sonos service number of Spotify.
const SPOTIFY_SERVICE: u32 = 2311;

/// What a share link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareKind {
    Album,
    Episode,
    Playlist,
    Show,
    Track,
}

impl ShareKind {
    fn parse(kind: &str) -> Option<Self> {
        match kind {
            "album" => Some(Self::Album),
            "episode" => Some(Self::Episode),
            "playlist" => Some(Self::Playlist),
            "show" => Some(Self::Show),
            "track" => Some(Self::Track),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Album => "album",
            Self::Episode => "episode",
            Self::Playlist => "playlist",
            Self::Show => "show",
            Self::Track => "track",
        }
    }

    const fn uri_prefix(self) -> &'static str {
        match self {
            Self::Album => "x-rincon-cpcontainer:1004206c",
            Self::Playlist | Self::Show => "x-rincon-cpcontainer:1006206c",
            Self::Episode | Self::Track => "x-sonos-spotify:",
        }
    }

    const fn item_key(self) -> &'static str {
        match self {
            Self::Album => "00040000",
            Self::Playlist | Self::Show => "1006206c",
            Self::Episode | Self::Track => "00032020",
        }
    }

    const fn upnp_class(self) -> &'static str {
        match self {
            Self::Album => "object.container.album.musicAlbum",
            Self::Playlist | Self::Show => "object.container.playlistContainer",
            Self::Episode => "object.item.audioItem.podcast",
            Self::Track => "object.item.audioItem.musicTrack",
        }
    }
}

/// A Spotify item recognised in a library URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    kind: ShareKind,
    id: String,
}

impl ShareLink {
    /// Recognises share URLs such as `https://open.spotify.com/album/<id>?si=...`
    /// and canonical URIs such as `spotify:album:<id>`.
    pub fn parse(uri: &str) -> Option<Self> {
        let captures = SPOTIFY_RE.captures(uri)?;
        let kind = ShareKind::parse(captures.get(1)?.as_str())?;
        let id = captures.get(2)?.as_str().to_string();
        Some(Self { kind, id })
    }

    pub const fn kind(&self) -> ShareKind {
        self.kind
    }

    /// The `spotify:<kind>:<id>` form.
    pub fn canonical_uri(&self) -> String {
        format!("spotify:{}:{}", self.kind.as_str(), self.id)
    }

    fn encoded_uri(&self) -> String {
        self.canonical_uri().replace(':', "%3a")
    }

    /// URI to pass as `EnqueuedURI`.
    pub fn enqueue_uri(&self) -> String {
        format!("{}{}", self.kind.uri_prefix(), self.encoded_uri())
    }

    /// DIDL-Lite document to pass as `EnqueuedURIMetaData`.
    pub fn metadata(&self) -> String {
        let item_id = format!("{}{}", self.kind.item_key(), self.encoded_uri());
        format!(
            concat!(
                r#"<DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" "#,
                r#"xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/" "#,
                r#"xmlns:r="urn:schemas-rinconnetworks-com:metadata-1-0/" "#,
                r#"xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/">"#,
                r#"<item id="{id}" parentID="-1" restricted="true">"#,
                "<dc:title></dc:title><upnp:class>{class}</upnp:class>",
                r#"<desc id="cdudn" nameSpace="urn:schemas-rinconnetworks-com:metadata-1-0/">"#,
                "SA_RINCON{service}_X_#Svc{service}-0-Token</desc></item></DIDL-Lite>"
            ),
            id = escape_xml(&item_id),
            class = self.kind.upnp_class(),
            service = SPOTIFY_SERVICE,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_share_urls_and_canonical_uris() {
        let link =
            ShareLink::parse("https://open.spotify.com/album/1ATL5GLyefJaxhQzSPVrLX?si=abc")
                .unwrap();
        assert_eq!(link.kind(), ShareKind::Album);
        assert_eq!(link.canonical_uri(), "spotify:album:1ATL5GLyefJaxhQzSPVrLX");

        let link = ShareLink::parse("spotify:playlist:37i9dQZF1DXcBWIGoYBM5M").unwrap();
        assert_eq!(link.kind(), ShareKind::Playlist);
        assert_eq!(link.canonical_uri(), "spotify:playlist:37i9dQZF1DXcBWIGoYBM5M");
    }

    #[test]
    fn ignores_other_uris() {
        assert_eq!(ShareLink::parse("x-file-cifs://nas/music/album"), None);
        assert_eq!(ShareLink::parse("https://open.spotify.com/artist/123"), None);
        assert_eq!(ShareLink::parse("http://radio.example/stream.mp3"), None);
    }

    #[test]
    fn album_is_enqueued_as_container() {
        let link = ShareLink::parse("https://open.spotify.com/album/abc123").unwrap();

        assert_eq!(
            link.enqueue_uri(),
            "x-rincon-cpcontainer:1004206cspotify%3aalbum%3aabc123"
        );
        let metadata = link.metadata();
        assert!(metadata.contains(r#"<item id="00040000spotify%3aalbum%3aabc123""#));
        assert!(metadata.contains("<upnp:class>object.container.album.musicAlbum</upnp:class>"));
        assert!(metadata.contains("SA_RINCON2311_X_#Svc2311-0-Token"));
    }

    #[test]
    fn track_is_enqueued_as_item() {
        let link = ShareLink::parse("https://open.spotify.com/track/xyz").unwrap();

        assert_eq!(link.enqueue_uri(), "x-sonos-spotify:spotify%3atrack%3axyz");
        assert!(link.metadata().contains(r#"<item id="00032020spotify%3atrack%3axyz""#));
    }
}
