//! Story customization options
//!
//! The reader UI sends free-form strings; [`Customization::from_raw`] keeps
//! the recognized values and drops anything else, so an unknown mood or
//! theme never fails a request.

use super::keyword::keyword_enum;
use serde::{Deserialize, Serialize};

keyword_enum! {
    /// Child's reading level
    pub enum ReadingLevel {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
}

impl Default for ReadingLevel {
    fn default() -> Self {
        ReadingLevel::Intermediate
    }
}

keyword_enum! {
    /// Requested story length
    pub enum StoryLength {
        Short => "short",
        Medium => "medium",
        Long => "long",
    }
}

keyword_enum! {
    /// Overall mood of the story
    pub enum Mood {
        Adventurous => "adventurous",
        Calm => "calm",
        Funny => "funny",
        Educational => "educational",
        Magical => "magical",
    }
}

keyword_enum! {
    /// Illustration art style
    pub enum ArtStyle {
        Cartoon => "cartoon",
        Watercolor => "watercolor",
        Digital => "digital",
        Storybook => "storybook",
    }
}

impl Default for ArtStyle {
    fn default() -> Self {
        ArtStyle::Cartoon
    }
}

keyword_enum! {
    /// Adventure theme
    pub enum AdventureType {
        Fantasy => "fantasy",
        Space => "space",
        Underwater => "underwater",
        Forest => "forest",
        Dinosaur => "dinosaur",
        Superhero => "superhero",
        Pirate => "pirate",
        Ninja => "ninja",
        Wizard => "wizard",
        Princess => "princess",
        Robot => "robot",
        Alien => "alien",
        Jungle => "jungle",
        Arctic => "arctic",
        Desert => "desert",
        Mountain => "mountain",
        Circus => "circus",
        Farm => "farm",
        City => "city",
        Beach => "beach",
        Carnival => "carnival",
        Museum => "museum",
        Library => "library",
        Bakery => "bakery",
        Garden => "garden",
        Treehouse => "treehouse",
        Playground => "playground",
        School => "school",
        Hospital => "hospital",
        Fire => "fire",
        Police => "police",
        Vet => "vet",
        Chef => "chef",
        Artist => "artist",
        Musician => "musician",
        Dancer => "dancer",
        Inventor => "inventor",
        Detective => "detective",
        Time => "time",
        Fairy => "fairy",
        Dragon => "dragon",
        Unicorn => "unicorn",
        Mermaid => "mermaid",
        Ghost => "ghost",
        Monster => "monster",
        Toy => "toy",
        Candy => "candy",
        Ice => "ice",
        Volcano => "volcano",
        Cloud => "cloud",
        Rainbow => "rainbow",
    }
}

/// Customization record exactly as the client sent it
///
/// Echoed back unchanged in the generate-story response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCustomization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adventure_type: Option<String>,
    #[serde(default)]
    pub include_pictures: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art_style: Option<String>,
}

/// Parsed customization options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Customization {
    pub length: Option<StoryLength>,
    pub mood: Option<Mood>,
    pub adventure_type: Option<AdventureType>,
    pub include_pictures: bool,
    pub art_style: Option<ArtStyle>,
}

impl Customization {
    /// Keep recognized options, silently drop the rest
    pub fn from_raw(raw: &RawCustomization) -> Self {
        fn keep<T: std::str::FromStr>(value: &Option<String>) -> Option<T> {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .and_then(|v| v.parse().ok())
        }

        Self {
            length: keep(&raw.length),
            mood: keep(&raw.mood),
            adventure_type: keep(&raw.adventure_type),
            include_pictures: raw.include_pictures,
            art_style: keep(&raw.art_style),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adventure_catalog_size() {
        assert_eq!(AdventureType::ALL.len(), 51);
        assert_eq!("volcano".parse::<AdventureType>().unwrap(), AdventureType::Volcano);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ReadingLevel::default(), ReadingLevel::Intermediate);
        assert_eq!(ArtStyle::default(), ArtStyle::Cartoon);
    }

    #[test]
    fn test_from_raw_drops_unknown_values() {
        let raw = RawCustomization {
            length: Some("short".to_string()),
            mood: Some("grumpy".to_string()),
            adventure_type: Some("space".to_string()),
            include_pictures: true,
            art_style: Some("".to_string()),
        };
        let parsed = Customization::from_raw(&raw);
        assert_eq!(parsed.length, Some(StoryLength::Short));
        assert_eq!(parsed.mood, None);
        assert_eq!(parsed.adventure_type, Some(AdventureType::Space));
        assert!(parsed.include_pictures);
        assert_eq!(parsed.art_style, None);
    }

    #[test]
    fn test_raw_customization_camel_case() {
        let raw: RawCustomization = serde_json::from_str(
            r#"{"length":"long","adventureType":"pirate","includePictures":true,"artStyle":"digital"}"#,
        )
        .unwrap();
        assert_eq!(raw.adventure_type.as_deref(), Some("pirate"));
        assert_eq!(raw.art_style.as_deref(), Some("digital"));
        assert!(raw.include_pictures);

        let echoed = serde_json::to_value(&raw).unwrap();
        assert_eq!(echoed["adventureType"], "pirate");
        assert!(echoed.get("mood").is_none());
    }
}
