use maud::{html, Markup};

use crate::feed::profiles::ProfilePage;
use crate::models::author::Author;
use crate::models::profile::Profile;

use super::avatar;

/// The edit form; swapped out for a fresh copy after each save.
pub fn edit_form(profile: &Profile) -> Markup {
    html! {
        form.card #profile-form hx-post="/profile" hx-target="#profile-form" hx-swap="outerHTML" {
            label for="username" { "Username" }
            input #username name="username" value=(profile.username) required;
            label for="display_name" { "Display name" }
            input #display_name name="display_name" value=[profile.display_name.as_deref()];
            label for="bio" { "Bio" }
            textarea #bio name="bio" rows="3" { (profile.bio.as_deref().unwrap_or_default()) }
            button type="submit" { "Save" }
        }
    }
}

pub fn avatar_form(profile: &Profile) -> Markup {
    html! {
        form #avatar-form hx-post="/profile/avatar" hx-encoding="multipart/form-data"
            hx-target="#avatar-form" hx-swap="outerHTML" {
            (avatar(&Author::from(profile)))
            input type="file" name="avatar" accept="image/*";
            button type="submit" { "Upload" }
        }
    }
}

pub fn page(p: &ProfilePage) -> Markup {
    let author = Author::from(&p.profile);
    html! {
        div.card.profile-header {
            (avatar_form(&p.profile))
            h1 { (author.display_name()) }
            p.muted { "@" (author.username()) }
            @if let Some(bio) = &p.profile.bio {
                p { (bio) }
            }
        }
        (edit_form(&p.profile))
        h2 { "Posts" }
        @if p.posts.is_empty() {
            (super::layout::empty("You haven't posted yet"))
        }
        @for post in &p.posts {
            (post)
        }
    }
}
