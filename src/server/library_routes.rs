//! Artist, album, track and favorites endpoints.

use super::error::{ApiError, ApiResult};
use super::metrics;
use super::session::Session;
use super::state::{GuardedLibraryStore, ServerState};
use super::validation::JsonBody;
use crate::library::{
    Album, AlbumPatch, Artist, ArtistPatch, EntityKind, FavoritesView, NewAlbum, NewArtist,
    NewTrack, Track, TrackPatch,
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

#[derive(Serialize)]
struct FavoriteAddedResponse {
    message: String,
}

fn parse_favorite_kind(raw: &str) -> ApiResult<EntityKind> {
    raw.parse::<EntityKind>().map_err(ApiError::bad_request)
}

// =============================================================================
// Artists
// =============================================================================

async fn list_artists(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
) -> ApiResult<Json<Vec<Artist>>> {
    Ok(Json(library.list_artists()?))
}

async fn get_artist(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    Path(id): Path<String>,
) -> ApiResult<Json<Artist>> {
    Ok(Json(library.get_artist(&id)?))
}

async fn post_artist(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    JsonBody(body): JsonBody<NewArtist>,
) -> ApiResult<(StatusCode, Json<Artist>)> {
    let artist = library.create_artist(body)?;
    metrics::refresh_library_items(library.as_ref(), EntityKind::Artist);
    Ok((StatusCode::CREATED, Json(artist)))
}

async fn put_artist(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ArtistPatch>,
) -> ApiResult<Json<Artist>> {
    Ok(Json(library.update_artist(&id, body)?))
}

async fn delete_artist(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    delete_record(&library, EntityKind::Artist, &id)
}

// =============================================================================
// Albums
// =============================================================================

async fn list_albums(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
) -> ApiResult<Json<Vec<Album>>> {
    Ok(Json(library.list_albums()?))
}

async fn get_album(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    Path(id): Path<String>,
) -> ApiResult<Json<Album>> {
    Ok(Json(library.get_album(&id)?))
}

async fn post_album(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    JsonBody(body): JsonBody<NewAlbum>,
) -> ApiResult<(StatusCode, Json<Album>)> {
    let album = library.create_album(body)?;
    metrics::refresh_library_items(library.as_ref(), EntityKind::Album);
    Ok((StatusCode::CREATED, Json(album)))
}

async fn put_album(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<AlbumPatch>,
) -> ApiResult<Json<Album>> {
    Ok(Json(library.update_album(&id, body)?))
}

async fn delete_album(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    delete_record(&library, EntityKind::Album, &id)
}

// =============================================================================
// Tracks
// =============================================================================

async fn list_tracks(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
) -> ApiResult<Json<Vec<Track>>> {
    Ok(Json(library.list_tracks()?))
}

async fn get_track(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    Path(id): Path<String>,
) -> ApiResult<Json<Track>> {
    Ok(Json(library.get_track(&id)?))
}

async fn post_track(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    JsonBody(body): JsonBody<NewTrack>,
) -> ApiResult<(StatusCode, Json<Track>)> {
    let track = library.create_track(body)?;
    metrics::refresh_library_items(library.as_ref(), EntityKind::Track);
    Ok((StatusCode::CREATED, Json(track)))
}

async fn put_track(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<TrackPatch>,
) -> ApiResult<Json<Track>> {
    Ok(Json(library.update_track(&id, body)?))
}

async fn delete_track(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    delete_record(&library, EntityKind::Track, &id)
}

fn delete_record(library: &GuardedLibraryStore, kind: EntityKind, id: &str) -> ApiResult<StatusCode> {
    let report = library.delete(kind, id)?;
    metrics::record_cascade_fixups(kind, report.fixups());
    metrics::refresh_library_items(library.as_ref(), kind);
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Favorites
// =============================================================================

async fn get_favorites(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
) -> ApiResult<Json<FavoritesView>> {
    Ok(Json(library.list_favorites()?))
}

async fn post_favorite(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<FavoriteAddedResponse>)> {
    let kind = parse_favorite_kind(&kind)?;
    library.add_favorite(kind, &id)?;
    let body = FavoriteAddedResponse {
        message: format!("{} with id {} added to favorites", kind, id),
    };
    Ok((StatusCode::CREATED, Json(body)))
}

async fn delete_favorite(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let kind = parse_favorite_kind(&kind)?;
    library.remove_favorite(kind, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn make_library_routes(state: ServerState) -> Router {
    Router::new()
        .route("/artist", get(list_artists).post(post_artist))
        .route(
            "/artist/{id}",
            get(get_artist).put(put_artist).delete(delete_artist),
        )
        .route("/album", get(list_albums).post(post_album))
        .route(
            "/album/{id}",
            get(get_album).put(put_album).delete(delete_album),
        )
        .route("/track", get(list_tracks).post(post_track))
        .route(
            "/track/{id}",
            get(get_track).put(put_track).delete(delete_track),
        )
        .route("/favs", get(get_favorites))
        .route(
            "/favs/{kind}/{id}",
            post(post_favorite).delete(delete_favorite),
        )
        .with_state(state)
}
