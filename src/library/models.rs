//! Library records and the payloads used to create and patch them.

use super::id::EntityId;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Entity kinds
// =============================================================================

/// The closed set of record kinds the library holds.
///
/// Also used as the favorite kind, since every record kind can be favorited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Artist,
    Album,
    Track,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Artist, EntityKind::Album, EntityKind::Track];

    pub fn to_db_str(&self) -> &'static str {
        match self {
            EntityKind::Artist => "artist",
            EntityKind::Album => "album",
            EntityKind::Track => "track",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "artist" => Some(EntityKind::Artist),
            "album" => Some(EntityKind::Album),
            "track" => Some(EntityKind::Track),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Artist => "Artist",
            EntityKind::Album => "Album",
            EntityKind::Track => "Track",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::from_db_str(s).ok_or_else(|| format!("Unknown entity kind '{}'", s))
    }
}

// =============================================================================
// Records
// =============================================================================

/// Common view over the three record kinds, used by the generic collection.
pub trait Entity: Clone {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;
    fn name(&self) -> &str;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: EntityId,
    pub name: String,
    pub has_award: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: EntityId,
    pub name: String,
    pub year: i32,
    pub artist_id: Option<EntityId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: EntityId,
    pub name: String,
    /// Duration in seconds.
    pub duration: u32,
    pub artist_id: Option<EntityId>,
    pub album_id: Option<EntityId>,
}

impl Entity for Artist {
    const KIND: EntityKind = EntityKind::Artist;

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for Album {
    const KIND: EntityKind = EntityKind::Album;

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for Track {
    const KIND: EntityKind = EntityKind::Track;

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Favorites with every stored id resolved to its current record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FavoritesView {
    pub artists: Vec<Artist>,
    pub albums: Vec<Album>,
    pub tracks: Vec<Track>,
}

// =============================================================================
// Create payloads
// =============================================================================

/// Foreign keys arrive as raw strings: an empty string means "no reference".
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArtist {
    pub name: String,
    #[serde(default, alias = "grammy")]
    pub has_award: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlbum {
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub artist_id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrack {
    pub name: String,
    pub duration: u32,
    #[serde(default)]
    pub artist_id: Option<String>,
    #[serde(default)]
    pub album_id: Option<String>,
}

// =============================================================================
// Partial updates
// =============================================================================

/// Absent fields are left untouched. For references, `Some(None)` (explicit
/// `null`) and `Some(Some(""))` both clear the reference.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "grammy")]
    pub has_award: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub artist_id: Option<Option<String>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub artist_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub album_id: Option<Option<String>>,
}

/// Distinguishes an explicit `null` from an absent field.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Normalizes a raw reference: blank means "no reference".
pub(crate) fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_parses_lowercase_path_segments() {
        assert_eq!("artist".parse::<EntityKind>().unwrap(), EntityKind::Artist);
        assert_eq!("album".parse::<EntityKind>().unwrap(), EntityKind::Album);
        assert_eq!("track".parse::<EntityKind>().unwrap(), EntityKind::Track);
        assert!("Artist".parse::<EntityKind>().is_err());
        assert!("playlist".parse::<EntityKind>().is_err());
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let absent: AlbumPatch = serde_json::from_str(r#"{"year": 2001}"#).unwrap();
        assert_eq!(absent.artist_id, None);
        assert_eq!(absent.year, Some(2001));

        let null: AlbumPatch = serde_json::from_str(r#"{"artistId": null}"#).unwrap();
        assert_eq!(null.artist_id, Some(None));

        let set: TrackPatch =
            serde_json::from_str(r#"{"albumId": "67e55044-10b1-426f-9247-bb680e5fe0c8"}"#)
                .unwrap();
        assert_eq!(
            set.album_id,
            Some(Some("67e55044-10b1-426f-9247-bb680e5fe0c8".to_string()))
        );
        assert_eq!(set.artist_id, None);
    }

    #[test]
    fn new_artist_accepts_grammy_alias() {
        let artist: NewArtist = serde_json::from_str(r#"{"name": "X", "grammy": true}"#).unwrap();
        assert!(artist.has_award);

        let artist: NewArtist = serde_json::from_str(r#"{"name": "X"}"#).unwrap();
        assert!(!artist.has_award);
    }

    #[test]
    fn records_serialize_camel_case() {
        let album = Album {
            id: EntityId::generate(),
            name: "Y".to_string(),
            year: 2000,
            artist_id: None,
        };
        let json = serde_json::to_value(&album).unwrap();
        assert_eq!(json["artistId"], serde_json::Value::Null);
        assert_eq!(json["year"], 2000);
    }
}
