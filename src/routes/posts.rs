use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use maud::{html, Markup};
use serde::Deserialize;
use uuid::Uuid;

use crate::components::{self, layout, toast};
use crate::error::AppError;
use crate::feed::posts::{self as ops, parse_tags, PostDraft};
use crate::feed::votes::{cast_vote, VoteRejected};
use crate::feed::Viewer;
use crate::models::vote::VoteDirection;
use crate::services::Store;

use super::{comments, redirect, AppState, FormParts};

async fn create<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = FormParts::read(multipart).await?;
    let group_id = Uuid::parse_str(form.text("group_id").trim()).ok();
    let draft = PostDraft {
        title: form.text("title").to_string(),
        content: form.text("content").to_string(),
        group_id,
        tags: parse_tags(form.text("tags")),
    };
    let upload = form.take_file("media");

    let post = ops::create_post(&st.store, st.media.as_ref(), &viewer, draft, upload).await?;
    Ok(redirect(
        format!("/posts/{}", post.id),
        toast::success("Post created!", "Your post has been published successfully."),
    ))
}

async fn detail<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<Markup, AppError> {
    let (view, tally) = ops::post_detail(&st.store, &viewer, id).await?;
    let is_author = viewer.is(view.post.author_id);
    Ok(layout::page(
        &view.post.title,
        &viewer,
        components::post::detail(&view, &tally, is_author),
    ))
}

#[derive(Debug, Deserialize)]
struct EditForm {
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tags: String,
}

async fn edit<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Form(f): Form<EditForm>,
) -> Result<Response, AppError> {
    let draft = PostDraft {
        title: f.title,
        content: f.content,
        group_id: None,
        tags: parse_tags(&f.tags),
    };
    let post = ops::edit_post(&st.store, &viewer, id, draft).await?;
    Ok(redirect(
        format!("/posts/{}", post.id),
        toast::success("Post updated", ""),
    ))
}

async fn delete<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    ops::delete_post(&st.store, &viewer, id).await?;
    Ok(redirect("/", toast::success("Post deleted", "")))
}

#[derive(Debug, Deserialize)]
struct VoteForm {
    direction: VoteDirection,
}

/// The pre-click controls with the error's status and a toast.
fn rejected_vote(post_id: Uuid, VoteRejected { rollback, error }: VoteRejected) -> Response {
    let body = html! {
        (components::post::vote_controls(post_id, &rollback))
        (toast::error("Vote not saved", &error.user_message()))
    };
    (error.status(), body).into_response()
}

/// Re-renders the controls, or the rolled-back ones when the vote fails.
async fn vote<S: Store>(
    State(st): State<AppState<S>>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Form(f): Form<VoteForm>,
) -> Result<Response, AppError> {
    let (_, before) = ops::post_detail(&st.store, &viewer, id).await?;

    match cast_vote(&st.store, &viewer, id, before, f.direction).await {
        Ok(after) => Ok(components::post::vote_controls(id, &after).into_response()),
        Err(rejected) => Ok(rejected_vote(id, rejected)),
    }
}

pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/", post(create::<S>))
        .route("/:id", get(detail::<S>))
        .route("/:id/edit", post(edit::<S>))
        .route("/:id/delete", post(delete::<S>))
        .route("/:id/vote", post(vote::<S>))
        .route(
            "/:id/comments",
            get(comments::section::<S>).post(comments::add::<S>),
        )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use crate::feed::groups::{create_group, GroupDraft};
    use crate::feed::Viewer;
    use crate::models::post::PostQuery;
    use crate::routes::test_support::TestApp;
    use crate::services::media::LocalMediaStore;
    use crate::services::posts::PostService;
    use crate::services::votes::VoteService;
    use crate::services::Svc;

    use crate::feed::votes::{cast_vote, VoteState, VoteTally};
    use crate::models::vote::{Vote, VoteDirection};
    use anyhow::anyhow;
    use axum::async_trait;

    async fn group(app: &TestApp, user: Uuid) -> Uuid {
        let dir = tempfile::tempdir().unwrap();
        let media = LocalMediaStore::new(dir.path(), "/media");
        create_group(
            &app.store,
            &media,
            &Viewer::user(user),
            GroupDraft {
                name: "Celeste".into(),
                description: String::new(),
            },
            None,
        )
        .await
        .unwrap()
        .id
    }

    async fn publish(app: &TestApp, user: Uuid) -> Uuid {
        let group_id = group(app, user).await.to_string();
        let (status, _) = app
            .post_multipart(
                "/posts",
                Some(user),
                &[
                    ("title", "B-side clear"),
                    ("group_id", group_id.as_str()),
                    ("tags", "#celeste, platformer"),
                ],
            )
            .await;
        assert_eq!(status, 200);
        app.store.list_posts(&PostQuery::default()).await.unwrap()[0].post.id
    }

    #[tokio::test]
    async fn create_post_from_multipart_form() {
        let app = TestApp::new();
        let user = Uuid::now_v7();
        let id = publish(&app, user).await;

        let view = app.store.get_post(id).await.unwrap().unwrap();
        assert_eq!(view.post.title, "B-side clear");
        assert_eq!(view.post.tags, vec!["celeste", "platformer"]);
        assert_eq!(view.group_name(), "celeste");
    }

    #[tokio::test]
    async fn create_post_without_title_shows_inline_error() {
        let app = TestApp::new();
        let user = Uuid::now_v7();
        let group_id = group(&app, user).await.to_string();

        let (status, body) = app
            .post_multipart(
                "/posts",
                Some(user),
                &[("title", "  "), ("group_id", group_id.as_str())],
            )
            .await;

        assert_eq!(status, 422);
        assert!(body.contains("Title is required"));
        assert!(app.store.list_posts(&PostQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn vote_round_trip_through_http() {
        let app = TestApp::new();
        let user = Uuid::now_v7();
        let id = publish(&app, user).await;
        let uri = format!("/posts/{id}/vote");

        let (status, body) = app.post_form(&uri, Some(user), "direction=up").await;
        assert_eq!(status, 200);
        assert!(body.contains("+1"));

        let (_, body) = app.post_form(&uri, Some(user), "direction=down").await;
        assert!(body.contains("-1"));
        let vote = app.store.find_vote(id, user).await.unwrap().unwrap();
        assert_eq!(vote.vote_type, -1);

        let (_, _) = app.post_form(&uri, Some(user), "direction=down").await;
        assert!(app.store.find_vote(id, user).await.unwrap().is_none());
        let post = app.store.get_post(id).await.unwrap().unwrap().post;
        assert_eq!((post.upvotes, post.downvotes), (0, 0));
    }

    #[tokio::test]
    async fn anonymous_vote_rolls_back() {
        let app = TestApp::new();
        let id = publish(&app, Uuid::now_v7()).await;

        let (status, body) = app
            .post_form(&format!("/posts/{id}/vote"), None, "direction=up")
            .await;

        assert_eq!(status, 403);
        assert!(body.contains("Vote not saved"));
        assert!(body.contains(&format!("votes-{id}")));
        let post = app.store.get_post(id).await.unwrap().unwrap().post;
        assert_eq!(post.upvotes, 0);
    }

    #[tokio::test]
    async fn only_the_author_can_delete() {
        let app = TestApp::new();
        let author = Uuid::now_v7();
        let id = publish(&app, author).await;

        let (status, _) = app
            .post_form(&format!("/posts/{id}/delete"), Some(Uuid::now_v7()), "")
            .await;
        assert_eq!(status, 403);
        assert!(app.store.get_post(id).await.unwrap().is_some());

        let (status, _) = app
            .post_form(&format!("/posts/{id}/delete"), Some(author), "")
            .await;
        assert_eq!(status, 200);
        assert!(app.store.get_post(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_post_is_404() {
        let app = TestApp::new();
        let (status, _) = app.get(&format!("/posts/{}", Uuid::now_v7()), None).await;
        assert_eq!(status, 404);
    }

    /// Vote store whose connection drops on every write.
    #[derive(Clone)]
    struct DroppedConnection;

    impl Svc for DroppedConnection {}

    #[async_trait]
    impl VoteService<anyhow::Error> for DroppedConnection {
        async fn find_vote(&self, _: Uuid, _: Uuid) -> anyhow::Result<Option<Vote>> {
            Ok(None)
        }

        async fn upsert_vote(&self, _: &Vote) -> anyhow::Result<Vote> {
            Err(anyhow!("connection reset"))
        }

        async fn delete_vote(&self, _: Uuid, _: Uuid) -> anyhow::Result<bool> {
            Err(anyhow!("connection reset"))
        }
    }

    #[tokio::test]
    async fn failed_vote_toast_hides_the_store_error() {
        let post_id = Uuid::now_v7();
        let before = VoteTally::new(3, 1, VoteState::Unvoted);
        let rejected = cast_vote(
            &DroppedConnection,
            &Viewer::user(Uuid::now_v7()),
            post_id,
            before,
            VoteDirection::Up,
        )
        .await
        .unwrap_err();

        let res = super::rejected_vote(post_id, rejected);
        assert_eq!(res.status(), 500);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("Vote not saved"));
        assert!(body.contains("Please try again"));
        assert!(!body.contains("connection reset"));
        assert!(body.contains(&format!("votes-{post_id}")));
    }
}
