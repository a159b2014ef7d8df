use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Router};
use maud::{html, Markup};
use serde::Deserialize;
use uuid::Uuid;

use crate::components::{self, toast};
use crate::error::{AppError, ServiceError};
use crate::feed::comments::CommentSection;
use crate::feed::Viewer;
use crate::helpers::OrNotFound;
use crate::services::Store;

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SectionParams {
    #[serde(default)]
    collapse: bool,
}

/// The comment section swapped in under a post, expanded unless
/// `?collapse=true`.
pub async fn section<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    Path(post_id): Path<Uuid>,
    Query(params): Query<SectionParams>,
) -> Result<Markup, AppError> {
    st.store.get_post(post_id).await.or_not_found("Post")?;
    let mut s = CommentSection::load(&st.store, post_id).await?;
    if params.collapse {
        s.collapse();
    }
    Ok(components::comment::section(&s, &viewer))
}

/// The unchanged section, the error's status and a toast.
fn rejected(s: &CommentSection, viewer: &Viewer, title: &str, error: ServiceError) -> Response {
    let body = html! {
        (components::comment::section(s, viewer))
        (toast::error(title, &error.user_message()))
    };
    (error.status(), body).into_response()
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    content: String,
    #[serde(default)]
    parent_id: Option<Uuid>,
}

pub async fn add<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    Path(post_id): Path<Uuid>,
    Form(f): Form<CommentForm>,
) -> Result<Response, AppError> {
    st.store.get_post(post_id).await.or_not_found("Post")?;
    let mut s = CommentSection::load(&st.store, post_id).await?;

    match s.add(&st.store, &viewer, f.parent_id, &f.content).await {
        Ok(_) => Ok(components::comment::section(&s, &viewer).into_response()),
        Err(e) => Ok(rejected(&s, &viewer, "Comment not posted", e)),
    }
}

#[derive(Debug, Deserialize)]
struct EditForm {
    content: String,
}

async fn edit<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Form(f): Form<EditForm>,
) -> Result<Response, AppError> {
    let existing = st.store.get_comment(id).await.or_not_found("Comment")?;
    let mut s = CommentSection::load(&st.store, existing.post_id).await?;

    match s.edit(&st.store, &viewer, id, &f.content).await {
        Ok(_) => Ok(components::comment::section(&s, &viewer).into_response()),
        Err(e) => Ok(rejected(&s, &viewer, "Comment not updated", e)),
    }
}

async fn delete<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let existing = st.store.get_comment(id).await.or_not_found("Comment")?;
    let mut s = CommentSection::load(&st.store, existing.post_id).await?;

    match s.delete(&st.store, &viewer, id).await {
        Ok(()) => Ok(components::comment::section(&s, &viewer).into_response()),
        Err(e) => Ok(rejected(&s, &viewer, "Comment not deleted", e)),
    }
}

pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/:id/edit", post(edit::<S>))
        .route("/:id/delete", post(delete::<S>))
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use uuid::Uuid;

    use crate::error::ServiceError;
    use crate::feed::comments::CommentSection;
    use crate::feed::Viewer;
    use crate::models::comment::CommentQuery;
    use crate::models::group::CreateGroup;
    use crate::models::post::{CreatePost, MediaKind};
    use crate::models::profile::CreateProfile;
    use crate::routes::test_support::TestApp;
    use crate::services::comments::CommentService;
    use crate::services::groups::GroupService;
    use crate::services::posts::PostService;
    use crate::services::profiles::ProfileService;

    async fn seed(app: &TestApp, author: Uuid) -> Uuid {
        app.store
            .insert_profile(&CreateProfile {
                user_id: author,
                username: "madeline".into(),
                display_name: Some("Madeline".into()),
            })
            .await
            .unwrap();
        let group = app
            .store
            .insert_group(&CreateGroup {
                name: "celeste".into(),
                description: String::new(),
                image_url: None,
                created_by: author,
            })
            .await
            .unwrap();
        app.store
            .insert_post(&CreatePost {
                title: "Summit".into(),
                content: None,
                media_url: None,
                post_type: MediaKind::Text,
                tags: vec![],
                author_id: author,
                group_id: group.id,
            })
            .await
            .unwrap()
            .id
    }

    async fn comments(app: &TestApp, post_id: Uuid) -> usize {
        app.store
            .list_comments(&CommentQuery::for_post(post_id))
            .await
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn section_toggles_and_counts() {
        let app = TestApp::new();
        let post_id = seed(&app, Uuid::now_v7()).await;

        let (_, body) = app
            .get(&format!("/posts/{post_id}/comments?collapse=true"), None)
            .await;
        assert!(body.contains("0 comments"));

        let (status, body) = app.get(&format!("/posts/{post_id}/comments"), None).await;
        assert_eq!(status, 200);
        assert!(body.contains("No comments yet"));
    }

    #[tokio::test]
    async fn reply_renders_under_its_parent() {
        let app = TestApp::new();
        let author = Uuid::now_v7();
        let post_id = seed(&app, author).await;
        let uri = format!("/posts/{post_id}/comments");

        let (status, body) = app.post_form(&uri, Some(author), "content=Made+it").await;
        assert_eq!(status, 200);
        assert!(body.contains("1 comment "));
        assert!(body.contains("Reply to Madeline..."));

        let top = app.store.list_comments(&CommentQuery::for_post(post_id)).await.unwrap()[0]
            .comment
            .id;
        let (status, body) = app
            .post_form(&uri, Some(author), &format!("content=gg&parent_id={top}"))
            .await;
        assert_eq!(status, 200);
        assert!(body.contains("2 comments"));
    }

    #[tokio::test]
    async fn rejected_comment_keeps_the_section() {
        let app = TestApp::new();
        let author = Uuid::now_v7();
        let post_id = seed(&app, author).await;

        let (status, body) = app
            .post_form(&format!("/posts/{post_id}/comments"), Some(author), "content=+++")
            .await;

        assert_eq!(status, 422);
        assert!(body.contains(&format!("comments-{post_id}")));
        assert!(body.contains("Comment not posted"));
        assert_eq!(comments(&app, post_id).await, 0);
    }

    #[tokio::test]
    async fn strangers_cannot_delete() {
        let app = TestApp::new();
        let author = Uuid::now_v7();
        let post_id = seed(&app, author).await;
        app.post_form(&format!("/posts/{post_id}/comments"), Some(author), "content=mine")
            .await;
        let id = app.store.list_comments(&CommentQuery::for_post(post_id)).await.unwrap()[0]
            .comment
            .id;

        let (status, _) = app
            .post_form(&format!("/comments/{id}/delete"), Some(Uuid::now_v7()), "")
            .await;
        assert_eq!(status, 403);
        assert_eq!(comments(&app, post_id).await, 1);

        let (status, body) = app
            .post_form(&format!("/comments/{id}/edit"), Some(author), "content=edited")
            .await;
        assert_eq!(status, 200);
        assert!(body.contains("(edited)"));
    }

    #[tokio::test]
    async fn store_failure_toast_is_generic() {
        let post_id = Uuid::now_v7();
        let section = CommentSection::new(post_id);
        let error = ServiceError::from(anyhow!("duplicate key value violates \"comments_pkey\""));

        let res = super::rejected(&section, &Viewer::anonymous(), "Comment not posted", error);
        assert_eq!(res.status(), 500);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("Please try again"));
        assert!(!body.contains("comments_pkey"));
        assert!(body.contains(&format!("comments-{post_id}")));
    }
}
