//! Discussion posts: parsing the threaded view and flattening it.

use crate::{AssignmentContext, CanvasApi, GraderError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One discussion entry.
///
/// `replies` holds the nested thread exactly as Canvas returns it; after
/// [`flatten_posts`] every post has an empty `replies` list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Post {
    pub id: u64,
    pub author_id: Option<u64>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Post>,
}

impl Post {
    /// Converts a discussion entry, including its nested replies.
    ///
    /// Entries without an id or with an unparseable `created_at` yield
    /// `None`; see [`posts_from_entries`] for how their replies survive.
    pub fn from_json(entry: &Value) -> Option<Post> {
        let id = entry["id"].as_u64()?;
        let created_at = entry["created_at"]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))?;
        let replies = entry["replies"]
            .as_array()
            .map(|replies| posts_from_entries(replies))
            .unwrap_or_default();
        Some(Post {
            id,
            author_id: entry["user_id"].as_u64(),
            message: entry["message"].as_str().unwrap_or_default().to_string(),
            created_at,
            deleted: entry["deleted"].as_bool().unwrap_or(false),
            replies,
        })
    }

    fn is_gradable(&self) -> bool {
        !self.deleted && self.author_id.is_some() && !self.message.trim().is_empty()
    }
}

/// Converts a list of entries. An unusable entry is dropped but its replies
/// take its place in the list.
pub fn posts_from_entries(entries: &[Value]) -> Vec<Post> {
    let mut posts = Vec::new();
    for entry in entries {
        match Post::from_json(entry) {
            Some(post) => posts.push(post),
            None => {
                if let Some(replies) = entry["replies"].as_array() {
                    posts.extend(posts_from_entries(replies));
                }
            }
        }
    }
    posts
}

/// Flattens a thread depth-first, parents before their children.
pub fn flatten_posts(posts: Vec<Post>) -> Vec<Post> {
    fn recurse(list: Vec<Post>, flat: &mut Vec<Post>) {
        for mut post in list {
            let replies = std::mem::take(&mut post.replies);
            flat.push(post);
            recurse(replies, flat);
        }
    }
    let mut flat = Vec::new();
    recurse(posts, &mut flat);
    flat
}

/// Parses a `discussion_topics/:id/view` payload into a flat post list.
///
/// The payload's `view` array holds the top-level entries; some Canvas
/// versions also return a sibling `replies` array, which is appended.
pub fn posts_from_view(view: &Value) -> Vec<Post> {
    let top_level = ["view", "replies"]
        .iter()
        .filter_map(|key| view[*key].as_array())
        .flat_map(|entries| posts_from_entries(entries))
        .collect();
    flatten_posts(top_level)
}

/// Fetches and flattens every post of the context's discussion.
pub fn load_posts(
    api: &dyn CanvasApi,
    context: &AssignmentContext,
) -> Result<Vec<Post>, GraderError> {
    let view = api.fetch_discussion_view(context.course_id, context.discussion_id)?;
    let posts = posts_from_view(&view);
    log::info!(
        "discussion {} has {} posts",
        context.discussion_id,
        posts.len()
    );
    Ok(posts)
}

/// Groups gradable posts by author.
///
/// Deleted posts, posts without an author and blank posts are dropped.
/// Authors keep first-seen order; each author's posts are sorted oldest first.
pub fn group_by_author(posts: &[Post]) -> Vec<(u64, Vec<Post>)> {
    let mut order: Vec<u64> = Vec::new();
    let mut grouped: HashMap<u64, Vec<Post>> = HashMap::new();
    for post in posts.iter().filter(|post| post.is_gradable()) {
        let Some(author_id) = post.author_id else {
            continue;
        };
        grouped
            .entry(author_id)
            .or_insert_with(|| {
                order.push(author_id);
                Vec::new()
            })
            .push(post.clone());
    }
    order
        .into_iter()
        .filter_map(|author_id| {
            let mut posts = grouped.remove(&author_id)?;
            posts.sort_by_key(|post| post.created_at);
            Some((author_id, posts))
        })
        .collect()
}

/// The gradable posts of one student, oldest first.
pub fn posts_by_student(posts: &[Post], student_id: u64) -> Vec<Post> {
    group_by_author(posts)
        .into_iter()
        .find(|(author_id, _)| *author_id == student_id)
        .map(|(_, posts)| posts)
        .unwrap_or_default()
}
