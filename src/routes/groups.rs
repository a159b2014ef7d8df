use axum::extract::{Multipart, Path, Query, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use maud::Markup;
use serde::Deserialize;

use crate::components::{self, layout, toast};
use crate::error::AppError;
use crate::feed::groups::{self as ops, GroupDraft};
use crate::feed::Viewer;
use crate::helpers::non_blank;
use crate::services::Store;

use super::{redirect, AppState, FormParts};

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn directory<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    Query(params): Query<SearchParams>,
) -> Result<Markup, AppError> {
    let search = params.q.as_deref().and_then(non_blank);
    let groups = ops::list_groups(&st.store, search.as_deref()).await?;
    let joined = ops::joined_group_ids(&st.store, &viewer).await?;
    Ok(layout::page(
        "Groups",
        &viewer,
        components::group::directory(&groups, &joined, &viewer, search.as_deref()),
    ))
}

async fn create<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = FormParts::read(multipart).await?;
    let draft = GroupDraft {
        name: form.text("name").to_string(),
        description: form.text("description").to_string(),
    };
    let image = form.take_file("image");

    let group = ops::create_group(&st.store, st.media.as_ref(), &viewer, draft, image).await?;
    Ok(redirect(
        format!("/groups/{}", group.name),
        toast::success("Group created!", &format!("r/{} is ready", group.name)),
    ))
}

async fn page<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    Path(name): Path<String>,
) -> Result<Markup, AppError> {
    let p = ops::group_page(&st.store, &viewer, &name).await?;
    Ok(layout::page(
        &format!("r/{}", p.group.name),
        &viewer,
        components::group::page(&p, &viewer),
    ))
}

async fn join<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    Path(name): Path<String>,
) -> Result<Markup, AppError> {
    let group = ops::join_group(&st.store, &viewer, &name).await?;
    Ok(components::group::card(&group, Some(true)))
}

async fn leave<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    Path(name): Path<String>,
) -> Result<Markup, AppError> {
    let group = ops::leave_group(&st.store, &viewer, &name).await?;
    Ok(components::group::card(&group, Some(false)))
}

pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(directory::<S>).post(create::<S>))
        .route("/:name", get(page::<S>))
        .route("/:name/join", post(join::<S>))
        .route("/:name/leave", post(leave::<S>))
}
