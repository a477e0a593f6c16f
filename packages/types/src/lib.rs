pub use anyhow::{Error, Result, anyhow, bail};
pub use serde_json::Value;
pub use serde_json as json;

pub mod utils;

pub fn create_id() -> String {
    cuid2::create_id()
}

/// Current UTC time without offset, as stored in the database.
pub fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = create_id();
        let b = create_id();
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }
}
