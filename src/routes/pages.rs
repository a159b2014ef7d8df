use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use maud::{html, Markup};
use serde::Deserialize;

use crate::components::{self, layout};
use crate::error::AppError;
use crate::feed::{self, Viewer};
use crate::models::post::PostQuery;
use crate::services::Store;

use super::AppState;

async fn home<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
) -> Result<Markup, AppError> {
    let posts = feed::posts::feed(&st.store, &viewer, &PostQuery::newest(st.cfg.feed_limit)).await?;
    let popular = feed::groups::popular_groups(&st.store, st.cfg.sidebar_groups_limit).await?;
    let groups = match viewer.user_id {
        Some(_) => feed::groups::list_groups(&st.store, None).await?,
        None => Vec::new(),
    };

    Ok(layout::page(
        "Home",
        &viewer,
        html! {
            div.columns {
                section {
                    @if viewer.user_id.is_some() {
                        details.card {
                            summary { "Create Post" }
                            (components::post::create_form(&groups))
                        }
                    }
                    (components::post::list(&posts, "No posts yet. Be the first to post!"))
                }
                (components::group::popular(&popular))
            }
        },
    ))
}

async fn recent<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
) -> Result<Markup, AppError> {
    let posts = feed::posts::feed(&st.store, &viewer, &PostQuery::newest(st.cfg.recent_limit)).await?;
    Ok(layout::page(
        "Recent",
        &viewer,
        html! {
            h1 { "Recent Posts" }
            (components::post::list(&posts, "No posts yet"))
        },
    ))
}

#[derive(Debug, Default, Deserialize)]
struct TrendingParams {
    tab: Option<String>,
}

async fn trending<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    Query(params): Query<TrendingParams>,
) -> Result<Markup, AppError> {
    let board = feed::trending::trending(
        &st.store,
        st.cfg.trending_limit,
        st.cfg.popular_groups_limit,
    )
    .await?;
    let recent = params.tab.as_deref() == Some("recent");
    Ok(layout::page(
        "Trending",
        &viewer,
        components::trending::page(&board, recent),
    ))
}

async fn dashboard<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
) -> Result<Markup, AppError> {
    let d = feed::dashboard::dashboard(&st.store, &viewer, st.cfg.dashboard_limit).await?;
    Ok(layout::page("Dashboard", &viewer, components::dashboard::page(&d)))
}

pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(home::<S>))
        .route("/recent", get(recent::<S>))
        .route("/trending", get(trending::<S>))
        .route("/dashboard", get(dashboard::<S>))
}
