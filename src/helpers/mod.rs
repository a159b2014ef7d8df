use crate::error::{ServiceError, ServiceResult};

pub trait OrNotFound<T> {
    fn or_not_found(self, what: &str) -> ServiceResult<T>;
}

impl<T> OrNotFound<T> for Option<T> {
    fn or_not_found(self, what: &str) -> ServiceResult<T> {
        self.ok_or_else(|| ServiceError::not_found(what))
    }
}

impl<T> OrNotFound<T> for anyhow::Result<Option<T>> {
    fn or_not_found(self, what: &str) -> ServiceResult<T> {
        self?.or_not_found(what)
    }
}

/// Trimmed value, or `None` when only whitespace is left.
pub fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
