//! Templated story used when the text model cannot answer

use super::ChildProfile;

/// Build the deterministic fallback story for `child`
///
/// Uses the first favorite book (or the general-adventure variant) and
/// mentions the child's interests when there are any.
pub fn fallback_story(child: &ChildProfile) -> String {
    let name = &child.name;
    let books = child.books();
    let first_book = books.first().map(String::as_str).unwrap_or(super::GENERAL_ADVENTURE);
    let general = first_book.contains("General Adventure");

    let opening = if general {
        format!(
            "Once upon a time, there was a brave child named {} who loved magical adventures.",
            name
        )
    } else {
        format!(
            "Once upon a time, there was a brave child named {} who loved reading {}.",
            name, first_book
        )
    };

    let discovery = if general {
        format!(
            "One magical day, {} discovered a secret door that led to an enchanted world!",
            name
        )
    } else {
        format!(
            "One magical day, {} discovered they could step right into their favorite story!",
            name
        )
    };

    let discovery = match child.interests.as_deref().map(str::trim) {
        Some(interests) if !interests.is_empty() => format!(
            "{} Their adventure included {}, making it even more special.",
            discovery, interests
        ),
        _ => discovery,
    };

    format!(
        "{opening}\n\n\
         {discovery}\n\n\
         {name} went on an incredible journey, made new friends, and learned that with courage and kindness, any adventure is possible.\n\n\
         When {name} returned home, they knew that the best stories are the ones where you believe in yourself.\n\n\
         The End! \u{1F31F}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(books: Vec<&str>, interests: Option<&str>) -> ChildProfile {
        ChildProfile {
            name: "Emma".to_string(),
            age: Some(7),
            favorite_books: books.into_iter().map(str::to_string).collect(),
            interests: interests.map(str::to_string),
            reading_level: None,
        }
    }

    #[test]
    fn test_fallback_uses_first_book() {
        let story = fallback_story(&profile(vec!["Matilda", "Holes"], Some("dragons")));
        assert!(story.starts_with(
            "Once upon a time, there was a brave child named Emma who loved reading Matilda."
        ));
        assert!(story.contains("step right into their favorite story"));
        assert!(story.contains("Their adventure included dragons"));
        assert!(!story.contains("Holes"));
        assert!(story.ends_with("The End! \u{1F31F}"));
    }

    #[test]
    fn test_fallback_general_adventure() {
        let story = fallback_story(&profile(vec![], None));
        assert!(story.contains("who loved magical adventures."));
        assert!(story.contains("secret door that led to an enchanted world"));
        assert!(!story.contains("Their adventure included"));
    }

    #[test]
    fn test_fallback_is_deterministic_and_paragraphed() {
        let child = profile(vec!["Matilda"], Some("robots"));
        assert_eq!(fallback_story(&child), fallback_story(&child));
        assert_eq!(fallback_story(&child).split("\n\n").count(), 5);
    }
}
