//! Splitting a story into reader pages

/// Paragraphs per page used by the story reader
pub const PARAGRAPHS_PER_PAGE: usize = 2;

/// Split `text` on blank lines and group the paragraphs into pages
///
/// Empty paragraphs are dropped. A `paragraphs_per_page` of zero is
/// treated as one.
///
/// # Examples
///
/// ```
/// use storymagic::story::pages::paginate;
///
/// let pages = paginate("One.\n\nTwo.\n\n\n\nThree.", 2);
/// assert_eq!(pages, vec!["One.\n\nTwo.".to_string(), "Three.".to_string()]);
/// ```
pub fn paginate(text: &str, paragraphs_per_page: usize) -> Vec<String> {
    let per_page = paragraphs_per_page.max(1);
    let normalized = text.replace("\r\n", "\n");
    let paragraphs: Vec<&str> = normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    paragraphs
        .chunks(per_page)
        .map(|chunk| chunk.join("\n\n"))
        .collect()
}
