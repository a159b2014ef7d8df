use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::helpers::{non_blank, OrNotFound};
use crate::models::group::{CreateGroup, Group, GroupOrder, GroupQuery, JoinGroup, NAME_MAX};
use crate::models::post::{MediaKind, PostQuery, PostView};
use crate::services::groups::GroupService;
use crate::services::media::{MediaStore, Upload, GROUP_IMAGES};
use crate::services::posts::PostService;
use crate::services::votes::VoteService;

use super::posts::feed;
use super::votes::VoteTally;
use super::Viewer;

#[derive(Debug, Clone, Default)]
pub struct GroupDraft {
    pub name: String,
    pub description: String,
}

/// Create a group and make its creator the first member.
#[tracing::instrument(skip_all, fields(viewer = ?viewer.user_id, name = %draft.name))]
pub async fn create_group<G: GroupService>(
    store: &G,
    media: &dyn MediaStore,
    viewer: &Viewer,
    draft: GroupDraft,
    image: Option<Upload>,
) -> ServiceResult<Group> {
    let creator = viewer.require()?;
    let name = non_blank(&draft.name)
        .ok_or_else(|| ServiceError::validation("Group name required"))?
        .to_lowercase();
    if name.chars().count() > NAME_MAX {
        return Err(ServiceError::validation(format!(
            "Group name too long (max {NAME_MAX} characters)"
        )));
    }
    if let Some(img) = &image {
        if MediaKind::from_content_type(&img.content_type) != Some(MediaKind::Image) {
            return Err(ServiceError::validation("Group image must be an image"));
        }
    }

    if store.find_group_by_name(&name).await?.is_some() {
        return Err(ServiceError::validation("Group name taken"));
    }

    let image_url = match &image {
        Some(img) => Some(media.put(GROUP_IMAGES, img).await?),
        None => None,
    };

    let group = store
        .insert_group(&CreateGroup {
            name,
            description: draft.description.trim().to_string(),
            image_url,
            created_by: creator,
        })
        .await?;
    let joined = store
        .insert_membership(&JoinGroup {
            group_id: group.id,
            user_id: creator,
        })
        .await;
    if let Err(e) = joined {
        // Every group has its creator as a member.
        if let Err(undo) = store.delete_group(group.id).await {
            tracing::error!(group_id = %group.id, error = %undo, "group left without its creator");
        }
        return Err(e.into());
    }

    tracing::info!(group_id = %group.id, "group created");
    // Re-read so the returned count includes the creator.
    Ok(store.get_group(group.id).await?.unwrap_or(group))
}

/// Groups are stored lowercased; path segments may not be.
async fn find_by_name<G: GroupService>(store: &G, name: &str) -> ServiceResult<Group> {
    store
        .find_group_by_name(&name.trim().to_lowercase())
        .await
        .or_not_found("Group")
}

async fn has_joined<G: GroupService>(store: &G, group_id: Uuid, user_id: Uuid) -> ServiceResult<bool> {
    Ok(store
        .memberships(user_id)
        .await?
        .iter()
        .any(|m| m.group_id == group_id))
}

#[tracing::instrument(skip(store, viewer))]
pub async fn join_group<G: GroupService>(store: &G, viewer: &Viewer, name: &str) -> ServiceResult<Group> {
    let user_id = viewer.require()?;
    let group = find_by_name(store, name).await?;

    if !has_joined(store, group.id, user_id).await? {
        store
            .insert_membership(&JoinGroup {
                group_id: group.id,
                user_id,
            })
            .await?;
    }
    store.get_group(group.id).await.or_not_found("Group")
}

#[tracing::instrument(skip(store, viewer))]
pub async fn leave_group<G: GroupService>(store: &G, viewer: &Viewer, name: &str) -> ServiceResult<Group> {
    let user_id = viewer.require()?;
    let group = find_by_name(store, name).await?;

    store.delete_membership(group.id, user_id).await?;
    store.get_group(group.id).await.or_not_found("Group")
}

/// Groups by member count, or alphabetically when filtered by `search` on
/// name or description.
pub async fn list_groups<G: GroupService>(store: &G, search: Option<&str>) -> ServiceResult<Vec<Group>> {
    let order = match search {
        Some(_) => GroupOrder::Name,
        None => GroupOrder::MemberCount,
    };
    let groups = store
        .list_groups(&GroupQuery {
            order,
            ..Default::default()
        })
        .await?;
    Ok(match search {
        Some(term) => groups.into_iter().filter(|g| g.matches(term)).collect(),
        None => groups,
    })
}

/// Ids of the groups `viewer` belongs to; empty when anonymous.
pub async fn joined_group_ids<G: GroupService>(store: &G, viewer: &Viewer) -> ServiceResult<Vec<Uuid>> {
    match viewer.user_id {
        Some(user_id) => Ok(store
            .memberships(user_id)
            .await?
            .into_iter()
            .map(|m| m.group_id)
            .collect()),
        None => Ok(Vec::new()),
    }
}

pub async fn popular_groups<G: GroupService>(store: &G, limit: i64) -> ServiceResult<Vec<Group>> {
    Ok(store.list_groups(&GroupQuery::popular(limit)).await?)
}

#[derive(Debug, Clone)]
pub struct GroupPage {
    pub group: Group,
    pub is_member: bool,
    pub posts: Vec<(PostView, VoteTally)>,
}

pub async fn group_page<S: GroupService + PostService + VoteService>(
    store: &S,
    viewer: &Viewer,
    name: &str,
) -> ServiceResult<GroupPage> {
    let group = find_by_name(store, name).await?;
    let is_member = match viewer.user_id {
        Some(user_id) => has_joined(store, group.id, user_id).await?,
        None => false,
    };
    let posts = feed(store, viewer, &PostQuery::in_group(group.id)).await?;
    Ok(GroupPage {
        group,
        is_member,
        posts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::media::LocalMediaStore;
    use crate::models::group::GroupMember;
    use crate::services::memory::MemoryStore;
    use crate::services::Svc;
    use anyhow::anyhow;
    use axum::async_trait;
    use axum::body::Bytes;

    fn draft(name: &str, description: &str) -> GroupDraft {
        GroupDraft {
            name: name.into(),
            description: description.into(),
        }
    }

    #[tokio::test]
    async fn creator_joins_and_name_is_lowercased() {
        let store = MemoryStore::new();
        let media = LocalMediaStore::new("unused", "/media");
        let viewer = Viewer::user(Uuid::now_v7());

        let group = create_group(&store, &media, &viewer, draft(" Minecraft ", "blocks"), None)
            .await
            .unwrap();

        assert_eq!(group.name, "minecraft");
        assert_eq!(group.member_count, 1);
        assert_eq!(joined_group_ids(&store, &viewer).await.unwrap(), vec![group.id]);
    }

    #[tokio::test]
    async fn duplicate_or_blank_names_are_rejected() {
        let store = MemoryStore::new();
        let media = LocalMediaStore::new("unused", "/media");
        let viewer = Viewer::user(Uuid::now_v7());
        create_group(&store, &media, &viewer, draft("minecraft", ""), None)
            .await
            .unwrap();

        for name in ["MineCraft", "   "] {
            let err = create_group(&store, &media, &viewer, draft(name, ""), None)
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{name}");
        }
    }

    #[tokio::test]
    async fn non_image_group_picture_is_rejected() {
        let store = MemoryStore::new();
        let media = LocalMediaStore::new("unused", "/media");
        let image = Upload {
            file_name: "clip.mp4".into(),
            content_type: "video/mp4".into(),
            bytes: Bytes::new(),
        };

        let err = create_group(&store, &media, &Viewer::user(Uuid::now_v7()), draft("clips", ""), Some(image))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn join_and_leave_track_member_count() {
        let store = MemoryStore::new();
        let media = LocalMediaStore::new("unused", "/media");
        create_group(&store, &media, &Viewer::user(Uuid::now_v7()), draft("esports", ""), None)
            .await
            .unwrap();
        let fan = Viewer::user(Uuid::now_v7());

        assert_eq!(join_group(&store, &fan, "esports").await.unwrap().member_count, 2);
        assert_eq!(join_group(&store, &fan, "esports").await.unwrap().member_count, 2);
        assert_eq!(leave_group(&store, &fan, "esports").await.unwrap().member_count, 1);

        let err = join_group(&store, &fan, "nope").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn search_matches_name_or_description() {
        let store = MemoryStore::new();
        let media = LocalMediaStore::new("unused", "/media");
        let viewer = Viewer::user(Uuid::now_v7());
        create_group(&store, &media, &viewer, draft("streamers", "Live content"), None)
            .await
            .unwrap();
        create_group(&store, &media, &viewer, draft("reviews", "Honest takes"), None)
            .await
            .unwrap();

        let names = |gs: Vec<Group>| gs.into_iter().map(|g| g.name).collect::<Vec<_>>();
        assert_eq!(names(list_groups(&store, Some("LIVE")).await.unwrap()), vec!["streamers"]);
        assert_eq!(names(list_groups(&store, Some("rev")).await.unwrap()), vec!["reviews"]);
        assert_eq!(list_groups(&store, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn names_wider_than_the_column_are_rejected() {
        let store = MemoryStore::new();
        let media = LocalMediaStore::new("unused", "/media");
        let viewer = Viewer::user(Uuid::now_v7());

        let err = create_group(&store, &media, &viewer, draft(&"g".repeat(100), ""), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m.contains("too long")), "{err}");

        // Counted in characters, not bytes.
        let name = "é".repeat(NAME_MAX);
        let group = create_group(&store, &media, &viewer, draft(&name, ""), None)
            .await
            .unwrap();
        assert_eq!(group.name.chars().count(), NAME_MAX);
    }

    #[tokio::test]
    async fn lookups_ignore_case() {
        let store = MemoryStore::new();
        let media = LocalMediaStore::new("unused", "/media");
        create_group(&store, &media, &Viewer::user(Uuid::now_v7()), draft("Celeste", ""), None)
            .await
            .unwrap();
        let fan = Viewer::user(Uuid::now_v7());

        assert_eq!(join_group(&store, &fan, "Celeste").await.unwrap().member_count, 2);
        let page = group_page(&store, &fan, "CELESTE").await.unwrap();
        assert!(page.is_member);
        assert_eq!(leave_group(&store, &fan, "celeste").await.unwrap().member_count, 1);
    }

    #[tokio::test]
    async fn search_results_are_alphabetical() {
        let store = MemoryStore::new();
        let media = LocalMediaStore::new("unused", "/media");
        let viewer = Viewer::user(Uuid::now_v7());
        for name in ["zelda", "metroid", "castlevania"] {
            create_group(&store, &media, &viewer, draft(name, "classic"), None)
                .await
                .unwrap();
        }
        join_group(&store, &Viewer::user(Uuid::now_v7()), "zelda").await.unwrap();

        let names = |gs: Vec<Group>| gs.into_iter().map(|g| g.name).collect::<Vec<_>>();
        assert_eq!(
            names(list_groups(&store, Some("classic")).await.unwrap()),
            vec!["castlevania", "metroid", "zelda"]
        );
        assert_eq!(names(list_groups(&store, None).await.unwrap())[0], "zelda");
    }

    /// Memory store whose membership writes always fail.
    #[derive(Clone, Default)]
    struct RefusesJoins(MemoryStore);

    impl Svc for RefusesJoins {}

    #[async_trait]
    impl GroupService<anyhow::Error> for RefusesJoins {
        async fn insert_group(&self, group: &CreateGroup) -> anyhow::Result<Group> {
            self.0.insert_group(group).await
        }

        async fn get_group(&self, id: Uuid) -> anyhow::Result<Option<Group>> {
            self.0.get_group(id).await
        }

        async fn find_group_by_name(&self, name: &str) -> anyhow::Result<Option<Group>> {
            self.0.find_group_by_name(name).await
        }

        async fn list_groups(&self, query: &GroupQuery) -> anyhow::Result<Vec<Group>> {
            self.0.list_groups(query).await
        }

        async fn delete_group(&self, id: Uuid) -> anyhow::Result<bool> {
            self.0.delete_group(id).await
        }

        async fn insert_membership(&self, _: &JoinGroup) -> anyhow::Result<GroupMember> {
            Err(anyhow!("connection reset"))
        }

        async fn delete_membership(&self, group_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
            self.0.delete_membership(group_id, user_id).await
        }

        async fn memberships(&self, user_id: Uuid) -> anyhow::Result<Vec<GroupMember>> {
            self.0.memberships(user_id).await
        }
    }

    #[tokio::test]
    async fn failed_creator_join_removes_the_group() {
        let store = RefusesJoins::default();
        let media = LocalMediaStore::new("unused", "/media");
        let viewer = Viewer::user(Uuid::now_v7());

        let err = create_group(&store, &media, &viewer, draft("tetris", ""), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Persistence(_)));
        assert!(store.find_group_by_name("tetris").await.unwrap().is_none());
        assert!(list_groups(&store, None).await.unwrap().is_empty());

        // The name is free again.
        create_group(&store.0, &media, &viewer, draft("tetris", ""), None)
            .await
            .unwrap();
    }
}
