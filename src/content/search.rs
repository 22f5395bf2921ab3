//! Title filter for the public blog list. Pure; re-run on every keystroke.

use super::Blog;

/// Case-insensitive substring match over titles. An empty term keeps
/// everything; a term that matches nothing yields an empty list.
pub fn filter_by_title<'a>(blogs: &'a [Blog], term: &str) -> Vec<&'a Blog> {
    let needle = term.to_lowercase();
    blogs
        .iter()
        .filter(|blog| blog.title.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn blog(title: &str) -> Blog {
        Blog {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: crate::content::slug::derive_slug(title),
            content: String::new(),
            cover_image: None,
            published_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let blogs = vec![blog("Rust Ownership"), blog("React Hooks"), blog("TRUSTED types")];
        let titles: Vec<&str> = filter_by_title(&blogs, "rust")
            .into_iter()
            .map(|b| b.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Rust Ownership", "TRUSTED types"]);
    }

    #[test]
    fn test_empty_term_keeps_all() {
        let blogs = vec![blog("One"), blog("Two")];
        assert_eq!(filter_by_title(&blogs, "").len(), 2);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let blogs = vec![blog("One"), blog("Two")];
        assert!(filter_by_title(&blogs, "zebra").is_empty());
        assert!(filter_by_title(&[], "anything").is_empty());
    }
}
