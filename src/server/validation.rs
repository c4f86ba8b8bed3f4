//! Payload shape checks done before anything reaches a store.
//!
//! Stores still check references and name uniqueness themselves, since those
//! depend on current state.

use super::error::ApiError;
use crate::library::{AlbumPatch, ArtistPatch, NewAlbum, NewArtist, NewTrack, TrackPatch};
use crate::user::{CreateUserRequest, UpdatePasswordRequest};
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// `Json` whose rejections and validation failures are all `400 Bad Request`
/// with the regular error body.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        value.validate().map_err(ApiError::bad_request)?;
        Ok(JsonBody(value))
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("The {} cannot be empty.", field));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: i32) -> Result<(), String> {
    if value < 0 {
        return Err(format!("The {} cannot be negative.", field));
    }
    Ok(())
}

impl Validate for NewArtist {
    fn validate(&self) -> Result<(), String> {
        require_non_blank("name", &self.name)
    }
}

impl Validate for NewAlbum {
    fn validate(&self) -> Result<(), String> {
        require_non_blank("name", &self.name)?;
        require_non_negative("year", self.year)
    }
}

// Duration is unsigned, so a negative one already fails to deserialize.
impl Validate for NewTrack {
    fn validate(&self) -> Result<(), String> {
        require_non_blank("name", &self.name)
    }
}

impl Validate for ArtistPatch {
    fn validate(&self) -> Result<(), String> {
        match &self.name {
            Some(name) => require_non_blank("name", name),
            None => Ok(()),
        }
    }
}

impl Validate for AlbumPatch {
    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            require_non_blank("name", name)?;
        }
        match self.year {
            Some(year) => require_non_negative("year", year),
            None => Ok(()),
        }
    }
}

impl Validate for TrackPatch {
    fn validate(&self) -> Result<(), String> {
        match &self.name {
            Some(name) => require_non_blank("name", name),
            None => Ok(()),
        }
    }
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_blank("login", &self.login)?;
        require_non_blank("password", &self.password)
    }
}

impl Validate for UpdatePasswordRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_blank("old password", &self.old_password)?;
        require_non_blank("new password", &self.new_password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        let artist = NewArtist {
            name: "   ".to_string(),
            has_award: false,
        };
        assert!(artist.validate().is_err());

        let track = NewTrack {
            name: "T".to_string(),
            ..Default::default()
        };
        assert!(track.validate().is_ok());

        let patch = TrackPatch {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
        assert!(TrackPatch::default().validate().is_ok());
    }

    #[test]
    fn album_year_cannot_be_negative() {
        let album = NewAlbum {
            name: "Y".to_string(),
            year: -1,
            artist_id: None,
        };
        assert_eq!(
            album.validate(),
            Err("The year cannot be negative.".to_string())
        );

        let patch = AlbumPatch {
            year: Some(0),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn user_payloads_need_both_fields() {
        let request = CreateUserRequest {
            login: "alice".to_string(),
            password: "".to_string(),
        };
        assert!(request.validate().is_err());

        let request = UpdatePasswordRequest {
            old_password: "old".to_string(),
            new_password: "new".to_string(),
        };
        assert!(request.validate().is_ok());
    }
}
