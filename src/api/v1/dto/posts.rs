/*
 * Responsibility
 * - Posts / comments / likes request and response DTOs
 * - Ids are returned already encoded (internal bigint ids never leave the API)
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pagination::PageQuery;
use super::rules::{char_len_between, is_empty_or_http_url};

const MAX_TAGS: usize = 20;
const MAX_TAG_LEN: usize = 30;

#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    // not flattened: serde_urlencoded cannot feed numbers through #[serde(flatten)]
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub tag: Option<String>,
}

impl ListPostsQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub is_published: bool,
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_title(&self.title)?;
        validate_content(&self.content)?;
        validate_tags(&self.tags)?;
        validate_image(&self.image)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
    pub is_published: Option<bool>,
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(content) = &self.content {
            validate_content(content)?;
        }
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        if let Some(image) = &self.image {
            validate_image(image)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: String,
}

impl CreateCommentRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !char_len_between(self.content.trim(), 1, 500) {
            return Err("comment must be between 1 and 500 characters");
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), &'static str> {
    if !char_len_between(title.trim(), 1, 100) {
        return Err("title must be between 1 and 100 characters");
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), &'static str> {
    if content.trim().is_empty() || content.chars().count() > 5000 {
        return Err("content must be between 1 and 5000 characters");
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), &'static str> {
    if tags.len() > MAX_TAGS {
        return Err("at most 20 tags are allowed");
    }
    if tags.iter().any(|t| t.trim().chars().count() > MAX_TAG_LEN) {
        return Err("tags must be at most 30 characters");
    }
    Ok(())
}

fn validate_image(image: &str) -> Result<(), &'static str> {
    if image.len() > 2048 || !is_empty_or_http_url(image) {
        return Err("image must be an http(s) URL or empty");
    }
    Ok(())
}

/// Trimmed, blank entries dropped, duplicates removed (first occurrence wins).
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !out.iter().any(|seen| seen == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[derive(Debug, Serialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: AuthorSummary,
    pub tags: Vec<String>,
    pub image: String,
    pub is_published: bool,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    // Only filled in on single-post reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentResponse>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub like_count: i64,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub user: AuthorSummary,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(title: &str, content: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: title.into(),
            content: content.into(),
            tags: vec![],
            image: String::new(),
            is_published: false,
        }
    }

    #[test]
    fn create_requires_title_and_content() {
        assert!(create("Hello", "World").validate().is_ok());
        assert!(create("  ", "World").validate().is_err());
        assert!(create("Hello", "").validate().is_err());
        assert!(create(&"t".repeat(101), "World").validate().is_err());
        assert!(create("Hello", &"c".repeat(5001)).validate().is_err());
    }

    #[test]
    fn create_defaults_optional_fields() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"title":"Hi","content":"There"}"#).unwrap();
        assert!(req.tags.is_empty());
        assert_eq!(req.image, "");
        assert!(!req.is_published);
    }

    #[test]
    fn image_must_be_url_or_empty() {
        let mut req = create("Hello", "World");
        req.image = "not-a-url".into();
        assert!(req.validate().is_err());
        req.image = "https://example.com/cat.png".into();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let tags = vec![" rust ".to_string(), "".into(), "axum".into(), "rust".into()];
        assert_eq!(normalize_tags(&tags), vec!["rust", "axum"]);
    }

    #[test]
    fn empty_update_is_valid_but_blank_title_is_not() {
        let req: UpdatePostRequest = serde_json::from_str("{}").unwrap();
        assert!(req.validate().is_ok());
        let req: UpdatePostRequest = serde_json::from_str(r#"{"title":""}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn blank_search_and_tag_are_ignored() {
        let q = ListPostsQuery {
            search: Some("  ".into()),
            tag: Some(" rust ".into()),
            ..Default::default()
        };
        assert_eq!(q.search(), None);
        assert_eq!(q.tag(), Some("rust"));
    }

    fn post(comments: Option<Vec<CommentResponse>>) -> PostResponse {
        let author = AuthorSummary {
            id: Uuid::nil(),
            name: "Kay".into(),
            avatar: String::new(),
        };
        PostResponse {
            id: "abc".into(),
            title: "t".into(),
            content: "c".into(),
            author,
            tags: vec![],
            image: String::new(),
            is_published: true,
            view_count: 0,
            like_count: 0,
            comment_count: comments.as_ref().map_or(0, |c| c.len() as i64),
            comments,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn comments_appear_only_on_single_post_reads() {
        let listed = serde_json::to_value(post(None)).unwrap();
        assert!(listed.get("comments").is_none());

        let comment = CommentResponse {
            id: "c1".into(),
            post_id: "abc".into(),
            user: AuthorSummary {
                id: Uuid::nil(),
                name: "Lee".into(),
                avatar: "https://example.com/lee.png".into(),
            },
            content: "nice".into(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        let single = serde_json::to_value(post(Some(vec![comment]))).unwrap();
        assert_eq!(single["comments"][0]["user"]["name"], "Lee");
        assert_eq!(single["comments"][0]["user"]["avatar"], "https://example.com/lee.png");
        assert_eq!(single["comment_count"], 1);
    }
}
