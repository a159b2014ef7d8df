use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::feed::Viewer;

pub fn page(title: &str, viewer: &Viewer, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " · GameHub" }
                script src="https://unpkg.com/htmx.org@1.9.12" {}
                // Error responses carry markup too (inline guidance, rolled-back controls).
                script {
                    (PreEscaped(r#"document.addEventListener("htmx:beforeSwap", function (e) {
    if (e.detail.xhr.status >= 400) { e.detail.shouldSwap = true; e.detail.isError = false; }
});"#))
                }
            }
            body {
                nav.navbar {
                    a.brand href="/" { "GameHub" }
                    a href="/trending" { "Trending" }
                    a href="/recent" { "Recent" }
                    a href="/groups" { "Groups" }
                    @if viewer.user_id.is_some() {
                        a href="/dashboard" { "Dashboard" }
                        a href="/profile" { "Profile" }
                    }
                }
                main.container { (body) }
                div #toasts {}
            }
        }
    }
}

/// Placeholder for lists with nothing in them.
pub fn empty(msg: &str) -> Markup {
    html! {
        div.card.empty { p.muted { (msg) } }
    }
}
