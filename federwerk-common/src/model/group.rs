use crate::model::Id;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::Display;
use thiserror::Error;

pub const GROUP_TITLE_MAX_LEN: usize = 200;
pub const GROUP_SLUG_MAX_LEN: usize = 200;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct GroupMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Group {
    pub id: Id<GroupMarker>,
    pub title: GroupTitle,
    pub slug: GroupSlug,
    pub description: String,
}

/// Payload for creating a group; the id is assigned by the store.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct GroupDraft {
    pub title: GroupTitle,
    pub slug: GroupSlug,
    pub description: String,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupTitle(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The group title is invalid: {0}")]
pub struct InvalidGroupTitleError(String);

impl GroupTitle {
    pub fn new(title: String) -> Result<Self, InvalidGroupTitleError> {
        if !title.trim().is_empty() && title.chars().count() <= GROUP_TITLE_MAX_LEN {
            Ok(GroupTitle(title))
        } else {
            Err(InvalidGroupTitleError(title))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for GroupTitle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        GroupTitle::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"GroupTitle"))
    }
}

/// URL-safe identifier a group timeline is addressed with.
///
/// Letters, digits, `-` and `_`, at most [`GROUP_SLUG_MAX_LEN`] characters.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupSlug(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The group slug is invalid: {0}")]
pub struct InvalidGroupSlugError(String);

impl GroupSlug {
    pub fn new(slug: String) -> Result<Self, InvalidGroupSlugError> {
        let legal_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_');

        if !slug.is_empty()
            && slug.chars().count() <= GROUP_SLUG_MAX_LEN
            && slug.chars().all(legal_char)
        {
            Ok(GroupSlug(slug))
        } else {
            Err(InvalidGroupSlugError(slug))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for GroupSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<'de> Deserialize<'de> for GroupSlug {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        GroupSlug::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"GroupSlug"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::group::{GROUP_SLUG_MAX_LEN, GroupSlug, GroupTitle};

    #[test]
    fn legal_slugs() {
        for slug in ["news", "fat-oops", "test_slug", "Group2"] {
            assert!(GroupSlug::new(slug.to_owned()).is_ok(), "{slug}");
        }

        assert!(GroupSlug::new("s".repeat(GROUP_SLUG_MAX_LEN)).is_ok());
    }

    #[test]
    fn illegal_slugs() {
        for slug in ["", "with space", "sla/sh", "dotted.slug"] {
            assert!(GroupSlug::new(slug.to_owned()).is_err(), "{slug}");
        }

        assert!(GroupSlug::new("s".repeat(GROUP_SLUG_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn titles() {
        assert!(GroupTitle::new("Graf Tolstoi fan club".to_owned()).is_ok());
        assert!(GroupTitle::new(String::new()).is_err());
        assert!(GroupTitle::new("  ".to_owned()).is_err());
        assert!(GroupTitle::new("t".repeat(201)).is_err());
    }
}
