pub mod comment;
pub mod group;
pub mod post;
pub mod session;
pub mod user;

use crate::model::{
    comment::InvalidCommentTextError,
    group::{InvalidGroupSlugError, InvalidGroupTitleError},
    post::InvalidPostTextError,
    session::InvalidSessionTokenHashError,
    user::InvalidUsernameError,
};
use derive_where::derive_where;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Username(#[from] InvalidUsernameError),
    #[error(transparent)]
    GroupTitle(#[from] InvalidGroupTitleError),
    #[error(transparent)]
    GroupSlug(#[from] InvalidGroupSlugError),
    #[error(transparent)]
    PostText(#[from] InvalidPostTextError),
    #[error(transparent)]
    CommentText(#[from] InvalidCommentTextError),
    #[error(transparent)]
    TokenHash(#[from] InvalidSessionTokenHashError),
}

/// Database-assigned identifier, tagged with a marker type so an id for one
/// entity cannot be passed where an id for another is expected.
#[derive_where(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Debug,
    Default,
    Hash,
    Serialize,
    Deserialize
)]
#[serde(transparent)]
pub struct Id<Marker>(u64, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(inner: u64) -> Self {
        Self(inner, PhantomData)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<u64> for Id<Marker> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for u64 {
    fn from(value: Id<Marker>) -> Self {
        value.get()
    }
}
