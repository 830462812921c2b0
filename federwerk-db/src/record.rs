use federwerk_common::model::{
    ModelValidationError,
    comment::{Comment, CommentText},
    group::{Group, GroupSlug, GroupTitle},
    post::{Post, PostText},
    session::Session,
    user::{User, Username},
};
use sqlx::FromRow;
use time::{PrimitiveDateTime, UtcDateTime};

/// Timestamps are stored as naive UTC; strip the zone before binding.
pub(crate) fn to_primitive(value: UtcDateTime) -> PrimitiveDateTime {
    PrimitiveDateTime::new(value.date(), value.time())
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_id: i64,
    pub username: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct CredentialsRecord {
    pub user_id: i64,
    pub username: String,
    pub password_hash: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct SessionRecord {
    pub user_id: i64,
    pub username: String,
    pub token_hash: Vec<u8>,
    pub created_at: PrimitiveDateTime,
    pub expires_at: PrimitiveDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct GroupRecord {
    pub group_id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// One timeline row: the post joined with its author and, when set, its group.
/// The group columns come from a LEFT JOIN and are all present or all NULL.
#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub post_id: i64,
    pub text: String,
    pub created_at: PrimitiveDateTime,
    pub image: Option<String>,
    pub user_id: i64,
    pub username: String,
    pub group_id: Option<i64>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
    pub group_description: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CommentRecord {
    pub comment_id: i64,
    pub post_id: i64,
    pub text: String,
    pub created_at: PrimitiveDateTime,
    pub user_id: i64,
    pub username: String,
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_id.cast_unsigned().into(),
            username: Username::new(value.username)?,
        })
    }
}

impl TryFrom<SessionRecord> for Session {
    type Error = ModelValidationError;

    fn try_from(value: SessionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: User {
                id: value.user_id.cast_unsigned().into(),
                username: Username::new(value.username)?,
            },
            token_hash: value.token_hash.into_boxed_slice().try_into()?,
            created_at: value.created_at.as_utc(),
            expires_at: value.expires_at.as_utc(),
        })
    }
}

impl TryFrom<GroupRecord> for Group {
    type Error = ModelValidationError;

    fn try_from(value: GroupRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.group_id.cast_unsigned().into(),
            title: GroupTitle::new(value.title)?,
            slug: GroupSlug::new(value.slug)?,
            description: value.description,
        })
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        let group = value
            .group_id
            .map(|group_id| {
                Ok::<_, ModelValidationError>(Group {
                    id: group_id.cast_unsigned().into(),
                    title: GroupTitle::new(value.group_title.unwrap_or_default())?,
                    slug: GroupSlug::new(value.group_slug.unwrap_or_default())?,
                    description: value.group_description.unwrap_or_default(),
                })
            })
            .transpose()?;

        Ok(Self {
            id: value.post_id.cast_unsigned().into(),
            text: PostText::new(value.text)?,
            created_at: value.created_at.as_utc(),
            author: User {
                id: value.user_id.cast_unsigned().into(),
                username: Username::new(value.username)?,
            },
            group,
            image: value.image,
        })
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.comment_id.cast_unsigned().into(),
            post: value.post_id.cast_unsigned().into(),
            author: User {
                id: value.user_id.cast_unsigned().into(),
                username: Username::new(value.username)?,
            },
            text: CommentText::new(value.text)?,
            created_at: value.created_at.as_utc(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::record::PostRecord;
    use federwerk_common::model::{ModelValidationError, post::Post};
    use time::macros::datetime;

    fn record() -> PostRecord {
        PostRecord {
            post_id: 3,
            text: "Hello".to_owned(),
            created_at: datetime!(2026-01-05 09:30),
            image: None,
            user_id: 1,
            username: "auth".to_owned(),
            group_id: None,
            group_title: None,
            group_slug: None,
            group_description: None,
        }
    }

    #[test]
    fn post_without_group() {
        let post = Post::try_from(record()).unwrap();

        assert_eq!(post.id, 3.into());
        assert_eq!(post.text.get(), "Hello");
        assert_eq!(post.author.username.get(), "auth");
        assert!(post.group.is_none());
    }

    #[test]
    fn post_with_group() {
        let mut record = record();
        record.group_id = Some(8);
        record.group_title = Some("News".to_owned());
        record.group_slug = Some("news".to_owned());
        record.group_description = Some("All the news".to_owned());

        let post = Post::try_from(record).unwrap();

        let group = post.group.unwrap();
        assert_eq!(group.id, 8.into());
        assert_eq!(group.slug.get(), "news");
    }

    #[test]
    fn invalid_stored_username_is_surfaced() {
        let mut record = record();
        record.username = "not a username".to_owned();

        assert!(matches!(
            Post::try_from(record),
            Err(ModelValidationError::Username(_))
        ));
    }
}
