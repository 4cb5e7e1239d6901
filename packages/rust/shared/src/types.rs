//! Core domain types for PageInsights page records.

use serde::{Deserialize, Serialize};

/// Maximum number of posts kept on a page record.
pub const MAX_POSTS: usize = 3;

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// A post excerpt embedded in a [`Page`]. Never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Truncated excerpt of the post text.
    pub content: String,
    /// Like count. The source hides it without login, so it is always a sentinel.
    pub likes: String,
    /// Comment count. Always a sentinel, same reason as `likes`.
    pub comments_count: String,
}

// ---------------------------------------------------------------------------
// PageProfile
// ---------------------------------------------------------------------------

/// Structured fields pulled out of rendered markup.
///
/// Every field is always set; extraction substitutes a sentinel literal for
/// anything it cannot find.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageProfile {
    pub name: String,
    pub description: String,
    pub followers: String,
    pub industry: String,
    pub profile_pic: String,
    pub posts: Vec<Post>,
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// The unit of storage and the unit of response.
///
/// Created once on the first request for its `page_id` and never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Caller-supplied identifier; unique key in the store.
    pub page_id: String,
    pub name: String,
    /// Canonical URL the page was rendered from.
    pub url: String,
    pub description: String,
    /// Follower count as rendered prose, e.g. "12,345 followers".
    pub followers: String,
    pub industry: String,
    pub profile_pic: String,
    #[serde(default)]
    pub posts: Vec<Post>,
    /// Generated summary. `None` only when summarization was never attempted.
    #[serde(default)]
    pub ai_summary: Option<String>,
}

impl Page {
    /// Assemble a page from extracted fields.
    pub fn from_profile(
        page_id: impl Into<String>,
        url: impl Into<String>,
        profile: PageProfile,
        ai_summary: Option<String>,
    ) -> Self {
        let mut posts = profile.posts;
        posts.truncate(MAX_POSTS);
        Self {
            page_id: page_id.into(),
            name: profile.name,
            url: url.into(),
            description: profile.description,
            followers: profile.followers,
            industry: profile.industry,
            profile_pic: profile.profile_pic,
            posts,
            ai_summary,
        }
    }
}
