use crate::error::{ServiceError, ServiceResult};
use crate::helpers::{non_blank, OrNotFound};
use crate::models::post::{MediaKind, PostQuery, PostView};
use crate::models::profile::{CreateProfile, Profile, UpdateProfile, USERNAME_MAX};
use crate::services::media::{MediaStore, Upload, AVATARS};
use crate::services::posts::PostService;
use crate::services::profiles::ProfileService;

use super::Viewer;

#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub username: String,
    pub display_name: String,
    pub bio: String,
}

/// The viewer's profile, created with a placeholder username on first visit
/// if the auth backend hasn't provisioned one.
pub async fn own_profile<P: ProfileService>(store: &P, viewer: &Viewer) -> ServiceResult<Profile> {
    let user_id = viewer.require()?;
    if let Some(p) = store.get_profile(user_id).await? {
        return Ok(p);
    }

    let username = format!("player-{}", &user_id.simple().to_string()[..8]);
    tracing::info!(%user_id, %username, "provisioning profile");
    Ok(store
        .insert_profile(&CreateProfile {
            user_id,
            username,
            display_name: None,
        })
        .await?)
}

#[tracing::instrument(skip(store, viewer))]
pub async fn update_profile<P: ProfileService>(
    store: &P,
    viewer: &Viewer,
    edit: ProfileEdit,
) -> ServiceResult<Profile> {
    let user_id = viewer.require()?;
    store.get_profile(user_id).await.or_not_found("Profile")?;

    let username = non_blank(&edit.username).ok_or_else(|| ServiceError::validation("Username is required"))?;
    if username.chars().count() > USERNAME_MAX {
        return Err(ServiceError::validation(format!(
            "Username too long (max {USERNAME_MAX} characters)"
        )));
    }
    if let Some(other) = store.find_profile_by_username(&username).await? {
        if other.user_id != user_id {
            return Err(ServiceError::validation("Username taken"));
        }
    }

    Ok(store
        .update_profile(
            user_id,
            &UpdateProfile {
                username: Some(username),
                display_name: Some(edit.display_name.trim().to_string()),
                bio: Some(edit.bio.trim().to_string()),
                avatar_url: None,
            },
        )
        .await?)
}

#[tracing::instrument(skip_all, fields(viewer = ?viewer.user_id))]
pub async fn update_avatar<P: ProfileService>(
    store: &P,
    media: &dyn MediaStore,
    viewer: &Viewer,
    upload: Upload,
) -> ServiceResult<Profile> {
    let user_id = viewer.require()?;
    if MediaKind::from_content_type(&upload.content_type) != Some(MediaKind::Image) {
        return Err(ServiceError::validation("Avatar must be an image"));
    }
    store.get_profile(user_id).await.or_not_found("Profile")?;

    let url = media.put(AVATARS, &upload).await?;
    Ok(store
        .update_profile(
            user_id,
            &UpdateProfile {
                avatar_url: Some(url),
                ..Default::default()
            },
        )
        .await?)
}

#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub profile: Profile,
    pub posts: Vec<PostView>,
}

pub async fn profile_page<S: ProfileService + PostService>(
    store: &S,
    viewer: &Viewer,
) -> ServiceResult<ProfilePage> {
    let profile = own_profile(store, viewer).await?;
    let posts = store.list_posts(&PostQuery::by_author(profile.user_id)).await?;
    Ok(ProfilePage { profile, posts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::media::LocalMediaStore;
    use crate::services::memory::MemoryStore;
    use axum::body::Bytes;
    use uuid::Uuid;

    fn edit(username: &str) -> ProfileEdit {
        ProfileEdit {
            username: username.into(),
            display_name: " Link ".into(),
            bio: "Hero of time".into(),
        }
    }

    #[tokio::test]
    async fn first_visit_provisions_profile() {
        let store = MemoryStore::new();
        let viewer = Viewer::user(Uuid::now_v7());

        let p = own_profile(&store, &viewer).await.unwrap();
        assert!(p.username.starts_with("player-"));
        assert_eq!(own_profile(&store, &viewer).await.unwrap(), p);
    }

    #[tokio::test]
    async fn username_must_be_unique_and_present() {
        let store = MemoryStore::new();
        let link = Viewer::user(Uuid::now_v7());
        let zelda = Viewer::user(Uuid::now_v7());
        own_profile(&store, &link).await.unwrap();
        own_profile(&store, &zelda).await.unwrap();

        let p = update_profile(&store, &link, edit("link")).await.unwrap();
        assert_eq!(p.display_name.as_deref(), Some("Link"));

        for name in ["link", " "] {
            let err = update_profile(&store, &zelda, edit(name)).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{name}");
        }
        // Keeping your own name is fine.
        update_profile(&store, &link, edit("link")).await.unwrap();
    }

    #[tokio::test]
    async fn avatar_upload_updates_url() {
        let store = MemoryStore::new();
        let dir = tempfile::tempdir().unwrap();
        let media = LocalMediaStore::new(dir.path(), "/media");
        let viewer = Viewer::user(Uuid::now_v7());
        own_profile(&store, &viewer).await.unwrap();

        let upload = Upload {
            file_name: "me.webp".into(),
            content_type: "image/webp".into(),
            bytes: Bytes::from_static(b"RIFF"),
        };
        let p = update_avatar(&store, &media, &viewer, upload).await.unwrap();
        assert!(p.avatar_url.unwrap().starts_with("/media/avatars/"));
    }

    #[tokio::test]
    async fn username_wider_than_the_column_is_rejected() {
        let store = MemoryStore::new();
        let viewer = Viewer::user(Uuid::now_v7());
        let before = own_profile(&store, &viewer).await.unwrap();

        let err = update_profile(&store, &viewer, edit(&"x".repeat(50))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m.contains("too long")), "{err}");
        assert_eq!(store.get_profile(before.user_id).await.unwrap().unwrap().username, before.username);

        let p = update_profile(&store, &viewer, edit(&"x".repeat(USERNAME_MAX))).await.unwrap();
        assert_eq!(p.username.len(), USERNAME_MAX);
    }

    #[tokio::test]
    async fn renaming_frees_the_old_username() {
        let store = MemoryStore::new();
        let link = Viewer::user(Uuid::now_v7());
        let zelda = Viewer::user(Uuid::now_v7());
        own_profile(&store, &link).await.unwrap();
        own_profile(&store, &zelda).await.unwrap();

        update_profile(&store, &link, edit("hero")).await.unwrap();
        update_profile(&store, &link, edit("link")).await.unwrap();
        let p = update_profile(&store, &zelda, edit("hero")).await.unwrap();
        assert_eq!(p.username, "hero");
    }
}
