use axum::extract::{Multipart, State};
use axum::routing::{get, post};
use axum::{Form, Router};
use maud::{html, Markup};
use serde::Deserialize;

use crate::components::{self, layout, toast};
use crate::error::{AppError, ServiceError};
use crate::feed::profiles::{self as ops, ProfileEdit};
use crate::feed::Viewer;
use crate::services::Store;

use super::{AppState, FormParts};

async fn show<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
) -> Result<Markup, AppError> {
    let p = ops::profile_page(&st.store, &viewer).await?;
    Ok(layout::page("Profile", &viewer, components::profile::page(&p)))
}

#[derive(Debug, Deserialize)]
struct ProfileForm {
    username: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    bio: String,
}

async fn update<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    Form(f): Form<ProfileForm>,
) -> Result<Markup, AppError> {
    ops::own_profile(&st.store, &viewer).await?;
    let profile = ops::update_profile(
        &st.store,
        &viewer,
        ProfileEdit {
            username: f.username,
            display_name: f.display_name,
            bio: f.bio,
        },
    )
    .await?;
    Ok(html! {
        (components::profile::edit_form(&profile))
        (toast::success("Profile updated", ""))
    })
}

async fn avatar<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    multipart: Multipart,
) -> Result<Markup, AppError> {
    let mut form = FormParts::read(multipart).await?;
    let upload = form
        .take_file("avatar")
        .ok_or_else(|| ServiceError::validation("Choose an image to upload"))?;

    ops::own_profile(&st.store, &viewer).await?;
    let profile = ops::update_avatar(&st.store, st.media.as_ref(), &viewer, upload).await?;
    Ok(components::profile::avatar_form(&profile))
}

pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(show::<S>).post(update::<S>))
        .route("/avatar", post(avatar::<S>))
}
