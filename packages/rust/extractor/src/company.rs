//! Company page heuristics.
//!
//! Fixed class-name signatures taken from the public company page layout.
//! They are brittle by nature; swap in another [`PageExtractor`] when the
//! layout moves.

use pageinsights_shared::{MAX_POSTS, PageProfile, Post};
use scraper::{ElementRef, Html, Selector};

use super::PageExtractor;

const NAME_SELECTOR: &str = "h1";
const DESCRIPTION_SELECTOR: &str = "p";
/// The description paragraph's class list, exactly and in this order.
const DESCRIPTION_CLASSES: [&str; 2] = ["break-words", "white-space-pre-wrap"];
const INFO_SELECTOR: &str = "div.inline-block";
const POST_SELECTOR: &str = "div.attribution-recording-group";
const FALLBACK_POST_SELECTOR: &str = "p";

pub const DEFAULT_DESCRIPTION: &str = "Description not found.";
pub const DEFAULT_FOLLOWERS: &str = "Unknown";
pub const DEFAULT_INDUSTRY: &str = "Technology (Default)";
pub const DEFAULT_PROFILE_PIC: &str = "https://via.placeholder.com/150";

pub const POST_LIKES: &str = "N/A (Login Required)";
pub const POST_COMMENTS: &str = "N/A";

/// Characters kept from a post before the ellipsis.
pub const POST_EXCERPT_CHARS: usize = 150;
/// Appended to every post excerpt.
pub const POST_ELLIPSIS: &str = "...";
/// Posts whose trimmed text is this short or shorter are noise.
const MIN_POST_CHARS: usize = 20;
/// Paragraphs considered when no post containers exist.
const FALLBACK_POST_POOL: usize = 5;
/// Info texts this short or shorter are never an industry.
const MIN_INDUSTRY_CHARS: usize = 3;

/// Extractor for public organization ("company") pages.
pub struct CompanyPageExtractor;

impl PageExtractor for CompanyPageExtractor {
    fn extract(&self, doc: &Html, page_id: &str) -> PageProfile {
        let name = first_text(doc, NAME_SELECTOR).unwrap_or_else(|| page_id.to_string());

        let description =
            description_text(doc).unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

        let info_sel = Selector::parse(INFO_SELECTOR).unwrap();
        let (followers, industry) = classify_info_texts(doc.select(&info_sel).map(element_text));

        let profile_pic = profile_pic(doc, &name);
        let posts = extract_posts(doc);

        tracing::debug!(
            %name,
            %followers,
            %industry,
            posts = posts.len(),
            "extracted company page"
        );

        PageProfile {
            name,
            description,
            followers,
            industry,
            profile_pic,
            posts,
        }
    }

    fn name(&self) -> &str {
        "company"
    }
}

/// Split the inline info texts into `(followers, industry)`.
///
/// Scans every candidate in order with no early exit, so the last qualifying
/// text wins for both fields.
pub fn classify_info_texts<I, S>(texts: I) -> (String, String)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut followers = DEFAULT_FOLLOWERS.to_string();
    let mut industry = DEFAULT_INDUSTRY.to_string();

    for text in texts {
        let text = text.as_ref().trim();
        if text.contains("followers") {
            followers = text.to_string();
        } else if !text.contains("employees") && text.chars().count() > MIN_INDUSTRY_CHARS {
            industry = text.to_string();
        }
    }

    (followers, industry)
}

/// Build a post from raw candidate text, or `None` if it is too short.
pub fn post_from_text(text: &str) -> Option<Post> {
    let text = text.trim();
    if text.chars().count() <= MIN_POST_CHARS {
        return None;
    }

    let mut content: String = text.chars().take(POST_EXCERPT_CHARS).collect();
    content.push_str(POST_ELLIPSIS);

    Some(Post {
        content,
        likes: POST_LIKES.to_string(),
        comments_count: POST_COMMENTS.to_string(),
    })
}

/// First image whose alt text equals the page name; its non-empty `src` or the placeholder.
fn profile_pic(doc: &Html, name: &str) -> String {
    let img_sel = Selector::parse("img").unwrap();
    doc.select(&img_sel)
        .find(|el| el.value().attr("alt") == Some(name))
        .and_then(|el| el.value().attr("src"))
        .filter(|src| !src.is_empty())
        .unwrap_or(DEFAULT_PROFILE_PIC)
        .to_string()
}

/// Post containers, or the first few paragraphs when the page has none.
/// Only the first [`MAX_POSTS`] of the pool are considered before filtering.
fn extract_posts(doc: &Html) -> Vec<Post> {
    let post_sel = Selector::parse(POST_SELECTOR).unwrap();
    let mut pool: Vec<ElementRef<'_>> = doc.select(&post_sel).collect();

    if pool.is_empty() {
        let p_sel = Selector::parse(FALLBACK_POST_SELECTOR).unwrap();
        pool = doc.select(&p_sel).take(FALLBACK_POST_POOL).collect();
    }

    pool.into_iter()
        .take(MAX_POSTS)
        .filter_map(|el| post_from_text(&element_text(el)))
        .collect()
}

/// First paragraph whose class list is exactly [`DESCRIPTION_CLASSES`].
/// Extra classes or a different order do not match.
fn description_text(doc: &Html) -> Option<String> {
    let sel = Selector::parse(DESCRIPTION_SELECTOR).unwrap();
    doc.select(&sel)
        .find(|el| {
            el.value()
                .attr("class")
                .is_some_and(|classes| classes.split_whitespace().eq(DESCRIPTION_CLASSES))
        })
        .map(element_text)
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).unwrap();
    doc.select(&sel).next().map(element_text)
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
