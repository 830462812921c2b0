use crate::{
    page::{Page, PageLayout, PageRequest},
    record::{
        CommentRecord, CredentialsRecord, GroupRecord, PostRecord, SessionRecord, UserRecord,
        to_primitive,
    },
};
use federwerk_common::model::{
    Id, ModelValidationError,
    comment::{Comment, CommentDraft, CommentMarker},
    group::{Group, GroupDraft, GroupMarker, GroupSlug},
    post::{Post, PostDraft, PostMarker},
    session::{Session, SessionTokenHash},
    user::{User, UserMarker, Username},
};
use sqlx::{PgPool, postgres::PgPoolOptions, query, query_as, query_scalar};
use thiserror::Error;

pub use sqlx::migrate::MigrateError;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    /// Whether the underlying failure was a unique-constraint violation,
    /// e.g. a taken username.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Sqlx(sqlx::Error::Database(db_error))
                if db_error.code().as_deref() == Some("23505")
        )
    }
}

/// A user together with the stored password hash, for sign-in checks only.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Columns of one timeline row; every post query shares them.
const POST_SELECT: &str = "
    SELECT
        posts.post_id,
        posts.text,
        posts.created_at,
        posts.image,
        users.user_id,
        users.username,
        groups.group_id AS group_id,
        groups.title AS group_title,
        groups.slug AS group_slug,
        groups.description AS group_description
    FROM
        posts
        JOIN users USING (user_id)
        LEFT JOIN groups USING (group_id)
";

const POST_ORDER: &str = "ORDER BY posts.created_at DESC, posts.post_id DESC";

#[derive(Clone, Debug)]
pub struct DbClient {
    pool: PgPool,
    posts_per_page: u32,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool, posts_per_page: u32) -> Self {
        Self {
            pool,
            posts_per_page,
        }
    }

    pub async fn connect(database_url: &str, posts_per_page: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().connect(database_url).await?;

        Ok(Self::new(pool, posts_per_page))
    }

    /// Like [`DbClient::connect`], but without establishing a connection yet;
    /// the first query connects on demand.
    pub fn connect_lazy(database_url: &str, posts_per_page: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().connect_lazy(database_url)?;

        Ok(Self::new(pool, posts_per_page))
    }

    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!().run(&self.pool).await
    }

    pub async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<Id<UserMarker>> {
        let user_id = query_scalar::<_, i64>(
            "
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING user_id
            ",
        )
        .bind(username.get())
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_id.cast_unsigned().into())
    }

    pub async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT user_id, username
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record
            .map(User::try_from)
            .transpose()?;
        Ok(user)
    }

    pub async fn fetch_credentials(&self, username: &Username) -> Result<Option<UserCredentials>> {
        let record = query_as::<_, CredentialsRecord>(
            "
            SELECT user_id, username, password_hash
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username.get())
        .fetch_optional(&self.pool)
        .await?;

        let credentials = record
            .map(|record| {
                Ok::<_, ModelValidationError>(UserCredentials {
                    user: User {
                        id: record.user_id.cast_unsigned().into(),
                        username: Username::new(record.username)?,
                    },
                    password_hash: record.password_hash,
                })
            })
            .transpose()?;
        Ok(credentials)
    }

    pub async fn create_session(&self, session: &Session) -> Result<()> {
        query(
            "
            INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(session.token_hash.as_bytes())
        .bind(session.user.id.get().cast_signed())
        .bind(to_primitive(session.created_at))
        .bind(to_primitive(session.expires_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn fetch_session(&self, token_hash: &SessionTokenHash) -> Result<Option<Session>> {
        let record = query_as::<_, SessionRecord>(
            "
            SELECT
                sessions.user_id,
                users.username,
                sessions.token_hash,
                sessions.created_at,
                sessions.expires_at
            FROM
                sessions JOIN users USING (user_id)
            WHERE
                sessions.token_hash = $1
            ",
        )
        .bind(token_hash.as_bytes())
        .fetch_optional(&self.pool)
        .await?;

        let session = record
            .map(Session::try_from)
            .transpose()?;
        Ok(session)
    }

    pub async fn create_group(&self, draft: &GroupDraft) -> Result<Group> {
        let group_id = query_scalar::<_, i64>(
            "
            INSERT INTO groups (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING group_id
            ",
        )
        .bind(draft.title.get())
        .bind(draft.slug.get())
        .bind(&draft.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(Group {
            id: group_id.cast_unsigned().into(),
            title: draft.title.clone(),
            slug: draft.slug.clone(),
            description: draft.description.clone(),
        })
    }

    pub async fn fetch_group_by_slug(&self, slug: &GroupSlug) -> Result<Option<Group>> {
        let record = query_as::<_, GroupRecord>(
            "
            SELECT group_id, title, slug, description
            FROM groups
            WHERE slug = $1
            ",
        )
        .bind(slug.get())
        .fetch_optional(&self.pool)
        .await?;

        let group = record
            .map(Group::try_from)
            .transpose()?;
        Ok(group)
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        let records = query_as::<_, GroupRecord>(
            "
            SELECT group_id, title, slug, description
            FROM groups
            ORDER BY title DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let groups = records
            .into_iter()
            .map(|record| Group::try_from(record).map_err(DbError::from))
            .collect::<Result<_>>()?;
        Ok(groups)
    }

    pub async fn create_post(
        &self,
        author: Id<UserMarker>,
        draft: &PostDraft,
    ) -> Result<Id<PostMarker>> {
        let post_id = query_scalar::<_, i64>(
            "
            INSERT INTO posts (text, user_id, group_id, image)
            VALUES ($1, $2, $3, $4)
            RETURNING post_id
            ",
        )
        .bind(draft.text.get())
        .bind(author.get().cast_signed())
        .bind(draft.group.map(|group| group.get().cast_signed()))
        .bind(draft.image.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(post_id.cast_unsigned().into())
    }

    /// Replaces the editable fields of a post. The author and creation time
    /// never change.
    pub async fn update_post(&self, post: Id<PostMarker>, draft: &PostDraft) -> Result<()> {
        query(
            "
            UPDATE posts
            SET text = $2, group_id = $3, image = $4
            WHERE post_id = $1
            ",
        )
        .bind(post.get().cast_signed())
        .bind(draft.text.get())
        .bind(draft.group.map(|group| group.get().cast_signed()))
        .bind(draft.image.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete_post(&self, post: Id<PostMarker>) -> Result<()> {
        query("DELETE FROM posts WHERE post_id = $1")
            .bind(post.get().cast_signed())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn fetch_post(&self, post: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(&format!("{POST_SELECT} WHERE posts.post_id = $1"))
            .bind(post.get().cast_signed())
            .fetch_optional(&self.pool)
            .await?;

        let post = record
            .map(Post::try_from)
            .transpose()?;
        Ok(post)
    }

    pub async fn home_timeline(&self, requested: PageRequest) -> Result<Page<Post>> {
        let total = query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        let layout = PageLayout::new(total.cast_unsigned(), self.posts_per_page, requested);

        let records =
            query_as::<_, PostRecord>(&format!("{POST_SELECT} {POST_ORDER} LIMIT $1 OFFSET $2"))
                .bind(layout.limit())
                .bind(layout.offset())
                .fetch_all(&self.pool)
                .await?;

        Ok(Page::new(into_posts(records)?, layout))
    }

    pub async fn group_timeline(
        &self,
        group: Id<GroupMarker>,
        requested: PageRequest,
    ) -> Result<Page<Post>> {
        let total = query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE group_id = $1")
            .bind(group.get().cast_signed())
            .fetch_one(&self.pool)
            .await?;
        let layout = PageLayout::new(total.cast_unsigned(), self.posts_per_page, requested);

        let records = query_as::<_, PostRecord>(&format!(
            "{POST_SELECT} WHERE posts.group_id = $1 {POST_ORDER} LIMIT $2 OFFSET $3"
        ))
        .bind(group.get().cast_signed())
        .bind(layout.limit())
        .bind(layout.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(into_posts(records)?, layout))
    }

    pub async fn author_timeline(
        &self,
        author: Id<UserMarker>,
        requested: PageRequest,
    ) -> Result<Page<Post>> {
        let total = query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE user_id = $1")
            .bind(author.get().cast_signed())
            .fetch_one(&self.pool)
            .await?;
        let layout = PageLayout::new(total.cast_unsigned(), self.posts_per_page, requested);

        let records = query_as::<_, PostRecord>(&format!(
            "{POST_SELECT} WHERE posts.user_id = $1 {POST_ORDER} LIMIT $2 OFFSET $3"
        ))
        .bind(author.get().cast_signed())
        .bind(layout.limit())
        .bind(layout.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(into_posts(records)?, layout))
    }

    /// Posts by every author the user follows, as a single joined query.
    pub async fn followed_timeline(
        &self,
        user: Id<UserMarker>,
        requested: PageRequest,
    ) -> Result<Page<Post>> {
        let total = query_scalar::<_, i64>(
            "
            SELECT COUNT(*)
            FROM posts
                JOIN follows ON follows.author_id = posts.user_id
            WHERE follows.user_id = $1
            ",
        )
        .bind(user.get().cast_signed())
        .fetch_one(&self.pool)
        .await?;
        let layout = PageLayout::new(total.cast_unsigned(), self.posts_per_page, requested);

        let records = query_as::<_, PostRecord>(&format!(
            "
            {POST_SELECT}
                JOIN follows ON follows.author_id = posts.user_id
            WHERE follows.user_id = $1
            {POST_ORDER}
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(user.get().cast_signed())
        .bind(layout.limit())
        .bind(layout.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(into_posts(records)?, layout))
    }

    pub async fn create_comment(
        &self,
        post: Id<PostMarker>,
        author: Id<UserMarker>,
        draft: &CommentDraft,
    ) -> Result<Id<CommentMarker>> {
        let comment_id = query_scalar::<_, i64>(
            "
            INSERT INTO comments (post_id, user_id, text)
            VALUES ($1, $2, $3)
            RETURNING comment_id
            ",
        )
        .bind(post.get().cast_signed())
        .bind(author.get().cast_signed())
        .bind(draft.text.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(comment_id.cast_unsigned().into())
    }

    pub async fn post_comments(&self, post: Id<PostMarker>) -> Result<Vec<Comment>> {
        let records = query_as::<_, CommentRecord>(
            "
            SELECT
                comments.comment_id,
                comments.post_id,
                comments.text,
                comments.created_at,
                users.user_id,
                users.username
            FROM
                comments JOIN users USING (user_id)
            WHERE
                comments.post_id = $1
            ORDER BY
                comments.created_at DESC, comments.comment_id DESC
            ",
        )
        .bind(post.get().cast_signed())
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(|record| Comment::try_from(record).map_err(DbError::from))
            .collect::<Result<_>>()?;
        Ok(comments)
    }

    /// Create a follow edge if it does not exist yet. Following oneself and
    /// following an already-followed author are both no-ops, never errors.
    /// The upsert leaves the uniqueness check to the store, so there is no
    /// read-then-write race.
    pub async fn follow(&self, follower: Id<UserMarker>, author: Id<UserMarker>) -> Result<()> {
        if follower == author {
            return Ok(());
        }

        query(
            "
            INSERT INTO follows (user_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, author_id) DO NOTHING
            ",
        )
        .bind(follower.get().cast_signed())
        .bind(author.get().cast_signed())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a follow edge; a no-op when none exists.
    pub async fn unfollow(&self, follower: Id<UserMarker>, author: Id<UserMarker>) -> Result<()> {
        query(
            "
            DELETE FROM follows
            WHERE user_id = $1 AND author_id = $2
            ",
        )
        .bind(follower.get().cast_signed())
        .bind(author.get().cast_signed())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Always answered from the store; follow state is never cached.
    pub async fn is_following(
        &self,
        user: Id<UserMarker>,
        author: Id<UserMarker>,
    ) -> Result<bool> {
        let following = query_scalar::<_, bool>(
            "
            SELECT EXISTS (
                SELECT 1 FROM follows
                WHERE user_id = $1 AND author_id = $2
            )
            ",
        )
        .bind(user.get().cast_signed())
        .bind(author.get().cast_signed())
        .fetch_one(&self.pool)
        .await?;

        Ok(following)
    }
}

fn into_posts(records: Vec<PostRecord>) -> Result<Vec<Post>> {
    records
        .into_iter()
        .map(|record| Post::try_from(record).map_err(DbError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::client::DbClient;

    #[tokio::test]
    async fn self_follow_is_a_no_op() {
        // The pool never connects; the guard returns before any query runs.
        let db = DbClient::connect_lazy("postgres://localhost/federwerk", 10).unwrap();

        db.follow(1.into(), 1.into()).await.unwrap();
    }
}
