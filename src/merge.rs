//! Album normalization.
//!
//! [`enrich_album`] folds a raw album object and its complete raw track listing
//! into the record served to tagging clients: the album JSON is kept as the
//! catalog sent it, `tracks` becomes the full listing and the derived fields go
//! under `mp3tag`. [`fill_missing`] and [`hydrate_tracks`] complete simplified
//! tracks with the full track objects. Nothing in here performs I/O.

use crate::{
    AlbumRecord, CatalogError, EnrichedAlbumRecord, GenreText, Result, TagFields, TrackRecord,
    UNKNOWN,
};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Key identifying elements of nested object lists during [`fill_missing`].
pub const ID_KEY: &str = "id";

/// Whether the tracks credit more than one distinct primary artist.
///
/// Tracks with no artists at all do not count towards either side.
pub fn is_complication(tracks: &[TrackRecord]) -> bool {
    let primary_artists: HashSet<&str> = tracks
        .iter()
        .filter_map(TrackRecord::primary_artist)
        .collect();
    primary_artists.len() > 1
}

/// Highest disc number among the tracks, or 1 when none carries one.
pub fn disc_total(tracks: &[TrackRecord]) -> u32 {
    tracks
        .iter()
        .filter_map(|track| track.disc_number)
        .max()
        .unwrap_or(1)
}

/// Best available copyright line for the album.
///
/// The catalog's own copyright text wins. Without one, a line is put together
/// from the release year and label; with no label either, the result is
/// [`UNKNOWN`].
pub fn copyright_line(album: &AlbumRecord) -> String {
    if let Some(text) = album
        .copyrights
        .iter()
        .map(|copyright| copyright.text.trim())
        .find(|text| !text.is_empty())
    {
        return text.to_string();
    }

    let label = album
        .label
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty());

    match (album.release_year(), label) {
        (Some(year), Some(label)) => format!("{year} {label}"),
        (None, Some(label)) => label.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Album genres followed by any inferred artist genres, blank and repeated
/// entries dropped, first occurrence order kept.
pub fn unified_genres(album: &AlbumRecord, artist_genres: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    album
        .genres
        .iter()
        .chain(artist_genres)
        .map(|genre| genre.trim())
        .filter(|genre| !genre.is_empty())
        .filter(|genre| seen.insert(genre.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Capitalize the first letter of each genre the way tag editors display them.
pub fn capitalize_genre(genre: &str) -> String {
    let mut chars = genre.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Derive the tag fields from typed views of an album and its tracks.
pub fn tag_fields(
    album: &AlbumRecord,
    tracks: &[TrackRecord],
    artist_genres: &[String],
) -> TagFields {
    let genres = unified_genres(album, artist_genres);
    TagFields {
        compilation: album.is_compilation().then_some(1),
        complication: is_complication(tracks),
        disc_total: disc_total(tracks),
        copyright: copyright_line(album),
        genre: genres
            .first()
            .cloned()
            .unwrap_or_else(|| UNKNOWN.to_string()),
        genres: genres
            .iter()
            .map(|genre| GenreText {
                text: capitalize_genre(genre),
            })
            .collect(),
    }
}

/// Build the enriched record from a raw album and its complete raw track listing.
///
/// `artist_genres` are consulted only after the album's own genres; pass an
/// empty slice to use the album's genres alone. Non-object entries of the
/// listing are kept in `tracks` but take no part in the derived fields. The
/// result depends on nothing but the inputs, so enriching the same album twice
/// yields identical output.
pub fn enrich_album(
    album: Value,
    tracks: Vec<Value>,
    artist_genres: &[String],
) -> Result<EnrichedAlbumRecord> {
    let view = AlbumRecord::from_value(&album)?;
    let track_views = tracks
        .iter()
        .filter(|track| track.is_object())
        .map(TrackRecord::from_value)
        .collect::<Result<Vec<_>>>()?;
    let tags = tag_fields(&view, &track_views, artist_genres);

    let Value::Object(mut album) = album else {
        return Err(CatalogError::Parse("album is not a JSON object".to_string()));
    };
    album.remove("mp3tag");
    let listing = complete_listing(album.remove("tracks"), tracks);
    album.insert("tracks".to_string(), listing);

    Ok(EnrichedAlbumRecord { album, tags })
}

/// Turn the embedded first page into one page holding every track.
///
/// Envelope fields such as `href` survive; the neighbour links are dropped.
fn complete_listing(embedded: Option<Value>, items: Vec<Value>) -> Value {
    let mut page = match embedded {
        Some(Value::Object(page)) => page,
        _ => Map::new(),
    };
    page.remove("next");
    page.remove("previous");

    let count = items.len();
    page.insert("items".to_string(), Value::Array(items));
    page.insert("total".to_string(), count.into());
    page.insert("limit".to_string(), count.into());
    page.insert("offset".to_string(), 0.into());
    Value::Object(page)
}

/// Whether a value counts as absent when filling from another object.
///
/// Booleans are never missing: a `false` is a known answer and is not
/// replaced, even though numeric 0 is.
pub fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Bool(_) => false,
    }
}

/// Recursively copy into `target` whatever `source` has and `target` lacks.
///
/// Existing values in `target` are never overwritten unless they are
/// [missing](is_missing). Nested objects are merged key by key, and lists whose
/// source elements are all objects carrying `id_key` are merged element-wise by
/// that key, with unknown source elements appended in source order.
pub fn fill_missing(target: &mut Map<String, Value>, source: &Map<String, Value>, id_key: &str) {
    for (key, source_value) in source {
        let Some(target_value) = target.get_mut(key) else {
            target.insert(key.clone(), source_value.clone());
            continue;
        };

        match (target_value, source_value) {
            (Value::Object(target_map), Value::Object(source_map)) => {
                fill_missing(target_map, source_map, id_key);
            }
            (Value::Array(target_items), Value::Array(source_items))
                if is_keyed_list(source_items, id_key) =>
            {
                fill_list_by_id(target_items, source_items, id_key);
            }
            (target_value, source_value) => {
                if is_missing(target_value) {
                    *target_value = source_value.clone();
                }
            }
        }
    }
}

fn is_keyed_list(items: &[Value], id_key: &str) -> bool {
    items
        .iter()
        .all(|item| item.as_object().is_some_and(|map| map.contains_key(id_key)))
}

fn fill_list_by_id(target: &mut Vec<Value>, source: &[Value], id_key: &str) {
    for source_item in source {
        let Some(source_map) = source_item.as_object() else {
            continue;
        };
        let source_id = &source_map[id_key];

        let existing = target.iter_mut().find_map(|item| {
            item.as_object_mut()
                .filter(|map| map.get(id_key) == Some(source_id))
        });

        match existing {
            Some(target_map) => fill_missing(target_map, source_map, id_key),
            None => target.push(source_item.clone()),
        }
    }
}

fn track_id(track: &Value) -> Option<&str> {
    track.get(ID_KEY)?.as_str()
}

/// Fill each simplified track with the matching full track object.
///
/// Full objects are matched by track id; tracks without an id or without a
/// matching object are left as they are. Order and length of `tracks` never
/// change.
pub fn hydrate_tracks(mut tracks: Vec<Value>, detailed: &[Value]) -> Vec<Value> {
    let by_id: HashMap<&str, &Map<String, Value>> = detailed
        .iter()
        .filter_map(|full| Some((track_id(full)?, full.as_object()?)))
        .collect();

    for track in &mut tracks {
        let Some(full) = track_id(track).and_then(|id| by_id.get(id).copied()) else {
            continue;
        };
        if let Value::Object(map) = track {
            fill_missing(map, full, ID_KEY);
        }
    }
    tracks
}

/// Distinct ids of the given tracks in listing order.
pub fn track_ids(tracks: &[Value]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tracks
        .iter()
        .filter_map(track_id)
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArtistRef, Copyright};
    use serde_json::json;

    fn track(name: &str, artist: Option<&str>, disc: Option<u32>) -> TrackRecord {
        let artists = artist.map(ArtistRef::named).into_iter().collect();
        let mut track = TrackRecord::new(name, artists);
        track.disc_number = disc;
        track
    }

    fn raw_track(id: &str, artist: &str, disc: u32) -> Value {
        json!({
            "id": id,
            "name": format!("Track {id}"),
            "artists": [{"name": artist}],
            "disc_number": disc,
            "preview_url": null
        })
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_complication_needs_two_primary_artists() {
        assert!(!is_complication(&[]));
        assert!(!is_complication(&[
            track("a", Some("Solo"), Some(1)),
            track("b", Some("Solo"), Some(1)),
        ]));
        assert!(is_complication(&[
            track("a", Some("One"), Some(1)),
            track("b", Some("Two"), Some(1)),
        ]));
    }

    #[test]
    fn test_complication_uses_first_listed_artist_only() {
        let mut featuring = track("b", Some("Solo"), Some(1));
        featuring.artists.push(ArtistRef::named("Guest"));

        assert!(!is_complication(&[
            track("a", Some("Solo"), Some(1)),
            featuring,
            track("c", None, Some(1)),
        ]));
    }

    #[test]
    fn test_disc_total() {
        assert_eq!(disc_total(&[]), 1);
        assert_eq!(disc_total(&[track("a", None, None)]), 1);
        assert_eq!(
            disc_total(&[
                track("a", None, Some(1)),
                track("b", None, Some(3)),
                track("c", None, Some(2)),
            ]),
            3
        );
    }

    #[test]
    fn test_copyright_prefers_catalog_text() {
        let mut album = AlbumRecord::new("a1", "Album");
        album.label = Some("Label".to_string());
        album.release_date = Some("2004-05-01".to_string());
        album.copyrights = vec![
            Copyright {
                text: "  ".to_string(),
                kind: Some("C".to_string()),
            },
            Copyright {
                text: "(P) 2004 Label Records".to_string(),
                kind: Some("P".to_string()),
            },
        ];
        assert_eq!(copyright_line(&album), "(P) 2004 Label Records");
    }

    #[test]
    fn test_copyright_fallbacks() {
        let mut album = AlbumRecord::new("a1", "Album");
        assert_eq!(copyright_line(&album), "Unknown");

        album.release_date = Some("2004".to_string());
        assert_eq!(copyright_line(&album), "Unknown");

        album.label = Some("Label".to_string());
        assert_eq!(copyright_line(&album), "2004 Label");

        album.release_date = None;
        assert_eq!(copyright_line(&album), "Label");
    }

    #[test]
    fn test_genre_sentinel_and_inference() {
        let mut album = AlbumRecord::new("a1", "Album");
        let tags = tag_fields(&album, &[], &[]);
        assert_eq!(tags.genre, "Unknown");
        assert!(tags.genres.is_empty());

        let inferred = vec!["art rock".to_string(), "Art Rock".to_string()];
        let tags = tag_fields(&album, &[], &inferred);
        assert_eq!(tags.genre, "art rock");
        assert_eq!(
            tags.genres,
            vec![GenreText {
                text: "Art rock".to_string()
            }]
        );

        album.genres = vec!["shoegaze".to_string()];
        let tags = tag_fields(&album, &[], &inferred);
        assert_eq!(tags.genre, "shoegaze");
        assert_eq!(tags.genres.len(), 2);
    }

    #[test]
    fn test_compilation_flag_follows_album_type() {
        let mut album = AlbumRecord::new("a1", "Album");
        assert_eq!(tag_fields(&album, &[], &[]).compilation, None);

        album.album_type = Some("single".to_string());
        assert_eq!(tag_fields(&album, &[], &[]).compilation, None);

        album.album_type = Some("compilation".to_string());
        assert_eq!(tag_fields(&album, &[], &[]).compilation, Some(1));

        let raw = json!({"id": "a1", "name": "Hits", "album_type": "compilation"});
        let value = serde_json::to_value(enrich_album(raw, Vec::new(), &[]).unwrap()).unwrap();
        assert_eq!(value["mp3tag"]["compilation"], 1);

        let raw = json!({"id": "a2", "name": "Debut", "album_type": "album"});
        let value = serde_json::to_value(enrich_album(raw, Vec::new(), &[]).unwrap()).unwrap();
        assert!(value["mp3tag"].get("compilation").is_none());
    }

    #[test]
    fn test_enrich_replaces_track_listing() {
        let album = json!({
            "id": "a1",
            "name": "Album",
            "label": null,
            "tracks": {
                "href": "https://api.example.com/tracks",
                "items": [raw_track("t1", "A", 1)],
                "total": 3, "limit": 1, "offset": 0,
                "next": "https://api.example.com/next",
                "previous": null
            }
        });
        let tracks = vec![
            raw_track("t1", "A", 1),
            raw_track("t2", "B", 1),
            raw_track("t3", "A", 2),
        ];
        let enriched = enrich_album(album, tracks, &[]).unwrap();
        let value = serde_json::to_value(&enriched).unwrap();

        assert_eq!(value["label"], Value::Null);
        assert!(value.get("artists").is_none());
        assert_eq!(value["tracks"]["total"], 3);
        assert_eq!(value["tracks"]["limit"], 3);
        assert_eq!(value["tracks"]["offset"], 0);
        assert!(value["tracks"].get("next").is_none());
        assert!(value["tracks"].get("previous").is_none());
        assert_eq!(value["tracks"]["href"], "https://api.example.com/tracks");
        assert_eq!(value["tracks"]["items"][2]["name"], "Track t3");
        assert_eq!(value["tracks"]["items"][0]["preview_url"], Value::Null);
        assert_eq!(value["mp3tag"]["complication"], true);
        assert_eq!(value["mp3tag"]["disc_total"], 2);
    }

    #[test]
    fn test_enrich_rejects_non_object_album() {
        let err = enrich_album(json!("album"), Vec::new(), &[]).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn test_enrich_is_idempotent() {
        let album = json!({"id": "a1", "name": "Album", "genres": ["jazz"], "popularity": 40});
        let tracks = vec![raw_track("t1", "X", 1), raw_track("t2", "Y", 2)];

        let first =
            serde_json::to_vec(&enrich_album(album.clone(), tracks.clone(), &[]).unwrap()).unwrap();
        let second = serde_json::to_vec(&enrich_album(album, tracks, &[]).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fill_missing_keeps_existing_values() {
        let mut target = object(json!({
            "name": "Short",
            "popularity": 0,
            "explicit": false,
            "preview_url": null,
            "album": {"id": "a1"},
        }));
        let source = object(json!({
            "name": "Long name",
            "popularity": 61,
            "explicit": true,
            "preview_url": "https://example.com/p.mp3",
            "album": {"id": "a1", "name": "Album"},
            "external_ids": {"isrc": "GBAYE0601498"},
        }));

        fill_missing(&mut target, &source, ID_KEY);

        assert_eq!(target["name"], "Short");
        assert_eq!(target["popularity"], 61);
        assert_eq!(target["explicit"], false);
        assert_eq!(target["preview_url"], "https://example.com/p.mp3");
        assert_eq!(target["album"]["name"], "Album");
        assert_eq!(target["external_ids"]["isrc"], "GBAYE0601498");
    }

    #[test]
    fn test_false_is_not_missing() {
        assert!(!is_missing(&json!(false)));
        assert!(!is_missing(&json!(true)));
        assert!(is_missing(&json!(0)));
        assert!(is_missing(&json!(0.0)));
        assert!(is_missing(&Value::Null));
        assert!(!is_missing(&json!(" ")));

        let mut target = object(json!({"explicit": false, "is_local": false}));
        fill_missing(&mut target, &object(json!({"explicit": true})), ID_KEY);
        assert_eq!(target["explicit"], false);
    }

    #[test]
    fn test_fill_missing_merges_lists_by_id() {
        let mut target = object(json!({
            "artists": [{"id": "x", "name": "X"}],
            "available_markets": ["US"],
        }));
        let source = object(json!({
            "artists": [
                {"id": "x", "name": "Other", "popularity": 5},
                {"id": "y", "name": "Y"}
            ],
            "available_markets": ["US", "GB"],
        }));

        fill_missing(&mut target, &source, ID_KEY);

        assert_eq!(
            target["artists"],
            json!([
                {"id": "x", "name": "X", "popularity": 5},
                {"id": "y", "name": "Y"}
            ])
        );
        assert_eq!(target["available_markets"], json!(["US"]));
    }

    #[test]
    fn test_hydrate_tracks_by_id() {
        let tracks = vec![
            raw_track("t1", "A", 1),
            raw_track("t2", "A", 1),
            json!({"name": "local", "artists": []}),
        ];
        let detailed = vec![
            json!({"id": "t2", "name": "two", "external_ids": {"isrc": "ISRC2"}, "popularity": 9}),
            json!({"id": "t1", "name": "one", "external_ids": {"isrc": "ISRC1"}}),
        ];

        let hydrated = hydrate_tracks(tracks, &detailed);

        assert_eq!(hydrated.len(), 3);
        assert_eq!(hydrated[0]["external_ids"]["isrc"], "ISRC1");
        assert_eq!(hydrated[0]["name"], "Track t1");
        assert_eq!(hydrated[1]["external_ids"]["isrc"], "ISRC2");
        assert_eq!(hydrated[1]["popularity"], 9);
        assert!(hydrated[2].get("external_ids").is_none());
    }

    #[test]
    fn test_track_ids_are_distinct() {
        let tracks = vec![
            json!({"id": "t1"}),
            json!({"name": "no id"}),
            json!({"id": "t1"}),
            json!({"id": "t2"}),
        ];
        assert_eq!(track_ids(&tracks), vec!["t1", "t2"]);
    }

    #[test]
    fn test_capitalize_genre() {
        assert_eq!(capitalize_genre("indie pop"), "Indie pop");
        assert_eq!(capitalize_genre(""), "");
        assert_eq!(capitalize_genre("électro"), "Électro");
    }
}
