use crate::model::{Id, post::PostMarker, user::User};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub post: Id<PostMarker>,
    pub author: User,
    pub text: CommentText,
    pub created_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct CommentDraft {
    pub text: CommentText,
}

/// Body of a comment. Must not be empty or whitespace only.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct CommentText(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, thiserror::Error)]
#[error("The comment text is blank")]
pub struct InvalidCommentTextError;

impl CommentText {
    pub fn new(text: String) -> Result<Self, InvalidCommentTextError> {
        if text.trim().is_empty() {
            Err(InvalidCommentTextError)
        } else {
            Ok(CommentText(text))
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

impl<'de> Deserialize<'de> for CommentText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        CommentText::new(inner).map_err(|_| {
            Error::invalid_value(Unexpected::Str("<blank>"), &"a non-blank comment text")
        })
    }
}
