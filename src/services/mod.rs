pub mod comments;
pub mod groups;
pub mod media;
pub mod memory;
pub mod posts;
pub mod profiles;
pub mod votes;

use diesel_async::pooled_connection::deadpool;
use diesel_async::AsyncPgConnection;

use comments::CommentService;
use groups::GroupService;
use posts::PostService;
use profiles::ProfileService;
use votes::VoteService;

pub type Pool = deadpool::Pool<AsyncPgConnection>;

/// Marker for services that can live in router state.
pub trait Svc: Clone + Send + Sync + 'static {}

/// The whole record store the forum runs against.
pub trait Store: PostService + CommentService + VoteService + GroupService + ProfileService {}

impl<T> Store for T where T: PostService + CommentService + VoteService + GroupService + ProfileService {}

/// Postgres-backed store. Counters on `posts` and `groups` are kept by triggers.
#[derive(Clone)]
pub struct ForumServiceDb {
    db: Pool,
}

impl Svc for ForumServiceDb {}

impl ForumServiceDb {
    pub fn new(db: Pool) -> Self {
        Self { db }
    }
}
