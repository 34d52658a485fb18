use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

/// How many characters of a post's text stand in for the whole post.
pub const POST_TITLE_CHARS: usize = 15;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_staff: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post row joined with its author's username and its group, if any.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: NaiveDateTime,
    pub image: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    pub group_id: Option<i64>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub text: String,
    pub created: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Follow {
    pub id: i64,
    pub user_id: i64,
    pub user_username: String,
    pub author_id: i64,
    pub author_username: String,
}

/// Label and help text shown next to a post form field.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldMeta {
    pub name: &'static str,
    pub verbose_name: &'static str,
    pub help_text: &'static str,
}

pub const POST_FIELDS: [FieldMeta; 5] = [
    FieldMeta {
        name: "text",
        verbose_name: "Post text",
        help_text: "Enter the post text",
    },
    FieldMeta {
        name: "pub_date",
        verbose_name: "Publication date",
        help_text: "",
    },
    FieldMeta {
        name: "group",
        verbose_name: "Group",
        help_text: "Choose a group",
    },
    FieldMeta {
        name: "author",
        verbose_name: "Author",
        help_text: "",
    },
    FieldMeta {
        name: "image",
        verbose_name: "Image",
        help_text: "",
    },
];

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title: String = self.text.chars().take(POST_TITLE_CHARS).collect();
        f.write_str(&title)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

impl Post {
    pub fn group(&self) -> Option<(&str, &str)> {
        match (&self.group_title, &self.group_slug) {
            (Some(title), Some(slug)) => Some((title.as_str(), slug.as_str())),
            _ => None,
        }
    }
}
