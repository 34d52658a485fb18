use serde::{Deserialize, Serialize};

use crate::models::{Comment, Follow, Group, Post};

pub const EMPTY_VALUE_DISPLAY: &str = "-empty-";
const DATE_FORMAT: &str = "%d %b %Y";
const DATETIME_FORMAT: &str = "%d %b %Y %H:%M";

// ----------------- Page Response -----------------
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GroupLink {
    pub title: String,
    pub slug: String,
}

/// A post as the feed and detail templates show it.
#[derive(Serialize, Debug, Clone)]
pub struct PostCard {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: String,
    pub author: String,
    pub group: Option<GroupLink>,
    pub image_url: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CommentCard {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub created: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct ProfileResponse {
    pub username: String,
    pub posts_count: i64,
    pub following: bool,
    pub is_self: bool,
}

impl From<Post> for PostCard {
    fn from(post: Post) -> Self {
        let title = post.to_string();
        let group = post.group().map(|(title, slug)| GroupLink {
            title: title.to_owned(),
            slug: slug.to_owned(),
        });
        PostCard {
            id: post.id,
            title,
            pub_date: post.pub_date.format(DATE_FORMAT).to_string(),
            image_url: post.image.as_deref().map(media_url),
            text: post.text,
            author: post.author_username,
            group,
        }
    }
}

impl From<Comment> for CommentCard {
    fn from(comment: Comment) -> Self {
        CommentCard {
            id: comment.id,
            author: comment.author_username,
            text: comment.text,
            created: comment.created.format(DATETIME_FORMAT).to_string(),
        }
    }
}

pub fn media_url(path: &str) -> String {
    format!("/media/{}", path)
}

// ----------------- Admin Response -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct AdminPostResponse {
    pub pk: i64,
    pub text: String,
    pub pub_date: String,
    pub author: String,
    pub group: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct AdminGroupResponse {
    pub pk: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct AdminCommentResponse {
    pub pk: i64,
    pub author: String,
    pub post: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct AdminFollowResponse {
    pub pk: i64,
    pub user: String,
    pub author: String,
}

fn or_empty(value: &str) -> String {
    if value.is_empty() {
        EMPTY_VALUE_DISPLAY.to_owned()
    } else {
        value.to_owned()
    }
}

impl From<Post> for AdminPostResponse {
    fn from(post: Post) -> Self {
        AdminPostResponse {
            pk: post.id,
            pub_date: post.pub_date.format("%Y-%m-%d %H:%M:%S").to_string(),
            group: or_empty(post.group_title.as_deref().unwrap_or_default()),
            author: post.author_username,
            text: or_empty(&post.text),
        }
    }
}

impl From<Group> for AdminGroupResponse {
    fn from(
        Group {
            id,
            title,
            slug,
            description,
        }: Group,
    ) -> Self {
        AdminGroupResponse {
            pk: id,
            title,
            slug,
            description: or_empty(&description),
        }
    }
}

impl AdminCommentResponse {
    /// `post` is the post's display text, as the admin list shows it.
    pub fn new(comment: Comment, post: String) -> Self {
        AdminCommentResponse {
            pk: comment.id,
            author: comment.author_username,
            post: or_empty(&post),
        }
    }
}

impl From<Follow> for AdminFollowResponse {
    fn from(follow: Follow) -> Self {
        AdminFollowResponse {
            pk: follow.id,
            user: follow.user_username,
            author: follow.author_username,
        }
    }
}
