pub mod comments;
pub mod groups;
pub mod pages;
pub mod posts;
pub mod profiles;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Multipart;
use axum::response::{IntoResponse, Response};
use axum::Router;
use maud::Markup;

use crate::config::FeedCfg;
use crate::error::ServiceError;
use crate::services::media::{MediaStore, Upload};
use crate::services::Store;

/// Shared by every handler; `S` is the record store backend.
#[derive(Clone)]
pub struct AppState<S> {
    pub store: S,
    pub media: Arc<dyn MediaStore>,
    pub cfg: Arc<FeedCfg>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, media: Arc<dyn MediaStore>, cfg: FeedCfg) -> Self {
        Self {
            store,
            media,
            cfg: Arc::new(cfg),
        }
    }
}

/// All forum routes. Static media is mounted by the caller.
pub fn router<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        .merge(pages::router::<S>())
        .nest("/posts", posts::router::<S>())
        .nest("/comments", comments::router::<S>())
        .nest("/groups", groups::router::<S>())
        .nest("/profile", profiles::router::<S>())
        .with_state(state)
}

/// htmx response header that makes the client navigate after a form post.
pub const HX_REDIRECT: &str = "hx-redirect";

/// Send the browser to `to`, carrying `toast` along.
pub fn redirect(to: impl Into<String>, toast: Markup) -> Response {
    ([(HX_REDIRECT, to.into())], toast).into_response()
}

/// Text fields and files of a multipart form.
#[derive(Debug, Default)]
pub struct FormParts {
    fields: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl FormParts {
    /// Reads the whole body. File inputs left empty are dropped.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ServiceError> {
        let mut parts = FormParts::default();
        while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await.map_err(bad_form)?;
                    if file_name.is_empty() || bytes.is_empty() {
                        continue;
                    }
                    parts.files.insert(
                        name,
                        Upload {
                            file_name,
                            content_type,
                            bytes,
                        },
                    );
                }
                None => {
                    let text = field.text().await.map_err(bad_form)?;
                    parts.fields.insert(name, text);
                }
            }
        }
        Ok(parts)
    }

    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}

fn bad_form(e: axum::extract::multipart::MultipartError) -> ServiceError {
    ServiceError::validation(format!("Could not read form: {}", e.body_text()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Request, Response};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::middleware::identity::USER_ID_HEADER;
    use crate::services::media::LocalMediaStore;
    use crate::services::memory::MemoryStore;

    pub struct TestApp {
        pub store: MemoryStore,
        pub router: Router,
        _media: tempfile::TempDir,
    }

    impl TestApp {
        pub fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store = MemoryStore::new();
            let media = Arc::new(LocalMediaStore::new(dir.path(), "/media"));
            let router = router(AppState::new(store.clone(), media, FeedCfg::default()));
            Self {
                store,
                router,
                _media: dir,
            }
        }

        pub async fn send(&self, req: Request<Body>) -> (u16, String) {
            let res: Response<Body> = self.router.clone().oneshot(req).await.unwrap();
            let status = res.status().as_u16();
            let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
            (status, String::from_utf8(bytes.to_vec()).unwrap())
        }

        pub async fn get(&self, uri: &str, user: Option<Uuid>) -> (u16, String) {
            let mut req = Request::get(uri);
            if let Some(u) = user {
                req = req.header(USER_ID_HEADER, u.to_string());
            }
            self.send(req.body(Body::empty()).unwrap()).await
        }

        pub async fn post_form(&self, uri: &str, user: Option<Uuid>, body: &str) -> (u16, String) {
            let mut req = Request::post(uri).header("content-type", "application/x-www-form-urlencoded");
            if let Some(u) = user {
                req = req.header(USER_ID_HEADER, u.to_string());
            }
            self.send(req.body(Body::from(body.to_string())).unwrap()).await
        }

        pub async fn post_multipart(
            &self,
            uri: &str,
            user: Option<Uuid>,
            fields: &[(&str, &str)],
        ) -> (u16, String) {
            const BOUNDARY: &str = "gamehub-test-boundary";
            let mut body = String::new();
            for (name, value) in fields {
                body.push_str(&format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                ));
            }
            body.push_str(&format!("--{BOUNDARY}--\r\n"));

            let mut req = Request::post(uri)
                .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"));
            if let Some(u) = user {
                req = req.header(USER_ID_HEADER, u.to_string());
            }
            self.send(req.body(Body::from(body)).unwrap()).await
        }
    }
}
