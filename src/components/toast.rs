use maud::{html, Markup};

/// Transient notification, appended to the page's toast area.
pub fn error(title: &str, description: &str) -> Markup {
    html! {
        div.toast.toast-destructive role="alert" hx-swap-oob="beforeend:#toasts" {
            strong { (title) }
            p { (description) }
        }
    }
}

pub fn success(title: &str, description: &str) -> Markup {
    html! {
        div.toast role="status" hx-swap-oob="beforeend:#toasts" {
            strong { (title) }
            p { (description) }
        }
    }
}

/// Guidance shown next to the form that failed validation.
pub fn inline_error(msg: &str) -> Markup {
    html! {
        p.form-error role="alert" { (msg) }
    }
}
