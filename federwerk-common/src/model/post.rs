use crate::model::{
    Id,
    group::{Group, GroupMarker},
    user::User,
};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub text: PostText,
    pub created_at: UtcDateTime,
    pub author: User,
    pub group: Option<Group>,
    pub image: Option<String>,
}

/// Payload for creating or editing a post. The author and creation time are
/// never part of it; the author is the caller and the creation time is set
/// once by the store.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct PostDraft {
    pub text: PostText,
    #[serde(default)]
    pub group: Option<Id<GroupMarker>>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Body of a post. Must not be empty or whitespace only.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct PostText(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, thiserror::Error)]
#[error("The post text is blank")]
pub struct InvalidPostTextError;

impl PostText {
    pub fn new(text: String) -> Result<Self, InvalidPostTextError> {
        if text.trim().is_empty() {
            Err(InvalidPostTextError)
        } else {
            Ok(PostText(text))
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

impl<'de> Deserialize<'de> for PostText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        PostText::new(inner).map_err(|_| {
            Error::invalid_value(Unexpected::Str("<blank>"), &"a non-blank post text")
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::model::post::PostText;

    #[test]
    fn blank_text_is_rejected() {
        assert!(PostText::new(String::new()).is_err());
        assert!(PostText::new(" \n\t".to_owned()).is_err());
        assert!(PostText::new("Hello".to_owned()).is_ok());
    }
}
