//! Provider user payloads, normalized into [`ProfileData`].

use serde::Deserialize;
use serde_json::Value;

use super::config::ProfileShape;
use super::types::ProfileData;
use crate::media::{decode, DecodeError};

#[derive(Deserialize)]
struct GitHubUser {
    #[serde(default)]
    id: Value,
    login: Option<String>,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Deserialize)]
struct DropboxName {
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct DropboxAccount {
    account_id: Option<String>,
    name: Option<DropboxName>,
    email: Option<String>,
    profile_photo_url: Option<String>,
}

#[derive(Deserialize)]
struct FacebookPictureData {
    url: Option<String>,
}

#[derive(Deserialize)]
struct FacebookPicture {
    data: Option<FacebookPictureData>,
}

#[derive(Deserialize)]
struct FacebookUser {
    #[serde(default)]
    id: Value,
    name: Option<String>,
    email: Option<String>,
    picture: Option<FacebookPicture>,
}

#[derive(Deserialize)]
struct TwitterUser {
    id_str: Option<String>,
    #[serde(default)]
    id: Value,
    name: Option<String>,
    screen_name: Option<String>,
    email: Option<String>,
    profile_image_url_https: Option<String>,
}

/// Renders numeric or string identifiers as text; anything else is `""`.
/// Renders a string or numeric identifier; anything else is empty.
pub(crate) fn id_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn first_non_empty(primary: Option<String>, fallback: Option<String>) -> String {
    primary
        .filter(|s| !s.is_empty())
        .or(fallback)
        .unwrap_or_default()
}

/// Decodes a profile body according to `shape`.
pub fn normalize_profile(
    shape: ProfileShape,
    body: &[u8],
    content_type: Option<&str>,
) -> Result<ProfileData, DecodeError> {
    let profile = match shape {
        ProfileShape::GitHub => {
            let u: GitHubUser = decode(body, content_type)?;
            ProfileData {
                id: id_string(u.id),
                display_name: first_non_empty(u.name, u.login),
                email: u.email.unwrap_or_default(),
                avatar_url: u.avatar_url.unwrap_or_default(),
            }
        }
        ProfileShape::Dropbox => {
            let u: DropboxAccount = decode(body, content_type)?;
            ProfileData {
                id: u.account_id.unwrap_or_default(),
                display_name: u.name.and_then(|n| n.display_name).unwrap_or_default(),
                email: u.email.unwrap_or_default(),
                avatar_url: u.profile_photo_url.unwrap_or_default(),
            }
        }
        ProfileShape::Facebook => {
            let u: FacebookUser = decode(body, content_type)?;
            ProfileData {
                id: id_string(u.id),
                display_name: u.name.unwrap_or_default(),
                email: u.email.unwrap_or_default(),
                avatar_url: u
                    .picture
                    .and_then(|p| p.data)
                    .and_then(|d| d.url)
                    .unwrap_or_default(),
            }
        }
        ProfileShape::Twitter => {
            let u: TwitterUser = decode(body, content_type)?;
            ProfileData {
                id: u.id_str.unwrap_or_else(|| id_string(u.id)),
                display_name: first_non_empty(u.name, u.screen_name),
                email: u.email.unwrap_or_default(),
                avatar_url: u.profile_image_url_https.unwrap_or_default(),
            }
        }
    };
    Ok(profile)
}
