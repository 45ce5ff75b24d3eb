//! Story illustrations
//!
//! Pictures are returned as `data:image/svg+xml;base64,...` URLs. When
//! illustrations are enabled the text provider is asked to draw SVG scenes
//! for a few key moments of the story; anything it returns that is not an
//! SVG document is replaced with a themed placeholder. When disabled, a
//! cover and a theme card are produced locally.

use crate::config::IllustrationConfig;
use crate::error::{Result, StoryMagicError};
use crate::models::{AdventureType, ArtStyle, Customization};
use crate::providers::{CompletionOptions, Message, Provider};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

const WIDTH: u32 = 400;
const HEIGHT: u32 = 300;

/// A scene worth drawing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoryMoment {
    pub description: String,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub setting: String,
    #[serde(default)]
    pub action: String,
}

impl StoryMoment {
    fn new(description: String, mood: &str, setting: &str, action: &str) -> Self {
        Self {
            description,
            mood: mood.to_string(),
            setting: setting.to_string(),
            action: action.to_string(),
        }
    }
}

/// Visual theme for an adventure type
struct Theme {
    color: &'static str,
    icon: &'static str,
    scene_icons: &'static str,
    title: &'static str,
}

fn theme(adventure: Option<AdventureType>) -> Theme {
    match adventure {
        Some(AdventureType::Fantasy) => Theme {
            color: "#a55eea",
            icon: "🏰",
            scene_icons: "🏰🐉✨",
            title: "Fantasy Kingdom",
        },
        Some(AdventureType::Space) => Theme {
            color: "#3742fa",
            icon: "🚀",
            scene_icons: "🚀🌟👽",
            title: "Space Adventure",
        },
        Some(AdventureType::Underwater) => Theme {
            color: "#00d2d3",
            icon: "🌊",
            scene_icons: "🌊🐠🐙",
            title: "Ocean World",
        },
        Some(AdventureType::Forest) => Theme {
            color: "#2ed573",
            icon: "🌲",
            scene_icons: "🌲🦋🐿️",
            title: "Magic Forest",
        },
        Some(AdventureType::Dinosaur) => Theme {
            color: "#feca57",
            icon: "🦕",
            scene_icons: "🦕🌋🥚",
            title: "Dino Land",
        },
        Some(AdventureType::Superhero) => Theme {
            color: "#ff6b9d",
            icon: "🦸",
            scene_icons: "🦸💥🏙️",
            title: "Hero Mission",
        },
        _ => Theme {
            color: "#ff6b9d",
            icon: "✨",
            scene_icons: "✨🌟⭐",
            title: "Magic Adventure",
        },
    }
}

fn art_style_description(style: ArtStyle) -> &'static str {
    match style {
        ArtStyle::Cartoon => "cartoon style with bright colors, simple shapes, and bold outlines",
        ArtStyle::Watercolor => "watercolor style with soft, flowing colors and gentle brushstrokes",
        ArtStyle::Digital => "digital art style with vibrant colors, clean lines, and modern look",
        ArtStyle::Storybook => {
            "classic children's book illustration style with whimsical details"
        }
    }
}

/// Scenes used when the model does not pick any
pub fn default_moments(child_name: &str, adventure: Option<AdventureType>) -> Vec<StoryMoment> {
    let n = child_name;
    match adventure {
        Some(AdventureType::Fantasy) => vec![
            StoryMoment::new(
                format!("{} meeting a friendly dragon in a magical castle", n),
                "exciting and magical",
                "a colorful fantasy castle with towers and flags",
                "reaching out to touch a friendly dragon",
            ),
            StoryMoment::new(
                format!("{} casting a magic spell with a wand", n),
                "powerful and magical",
                "a magical forest with glowing trees",
                "holding a magic wand with sparkles around",
            ),
        ],
        Some(AdventureType::Space) => vec![
            StoryMoment::new(
                format!("{} piloting a colorful spaceship through the stars", n),
                "adventurous and exciting",
                "outer space with colorful planets and stars",
                "steering a spaceship with a big smile",
            ),
            StoryMoment::new(
                format!("{} meeting friendly aliens on a new planet", n),
                "curious and friendly",
                "an alien planet with strange but beautiful plants",
                "waving hello to colorful friendly aliens",
            ),
        ],
        Some(AdventureType::Underwater) => vec![
            StoryMoment::new(
                format!("{} swimming with dolphins and colorful fish", n),
                "joyful and peaceful",
                "underwater coral reef with bright colors",
                "swimming alongside dolphins and tropical fish",
            ),
            StoryMoment::new(
                format!("{} discovering a treasure chest on the ocean floor", n),
                "exciting and adventurous",
                "deep ocean floor with coral and sea plants",
                "opening a glowing treasure chest",
            ),
        ],
        Some(AdventureType::Forest) => vec![
            StoryMoment::new(
                format!("{} talking to wise forest animals", n),
                "peaceful and magical",
                "enchanted forest with tall trees and flowers",
                "sitting in a circle with talking animals",
            ),
            StoryMoment::new(
                format!("{} climbing a magical tree to reach the clouds", n),
                "adventurous and brave",
                "giant magical tree reaching into the sky",
                "climbing up a tree trunk with determination",
            ),
        ],
        Some(AdventureType::Dinosaur) => vec![
            StoryMoment::new(
                format!("{} riding on the back of a friendly dinosaur", n),
                "exciting and fun",
                "prehistoric landscape with volcanoes and plants",
                "riding on a colorful dinosaur with arms raised in joy",
            ),
            StoryMoment::new(
                format!("{} helping baby dinosaurs find their family", n),
                "caring and heroic",
                "dinosaur nesting ground with eggs and plants",
                "leading baby dinosaurs to their parents",
            ),
        ],
        Some(AdventureType::Superhero) => vec![
            StoryMoment::new(
                format!("{} flying through the sky with a colorful cape", n),
                "powerful and heroic",
                "city skyline with tall buildings and clouds",
                "flying with cape flowing and fist forward",
            ),
            StoryMoment::new(
                format!("{} using superpowers to help people", n),
                "heroic and kind",
                "city street with grateful people watching",
                "using superpowers to lift something heavy or stop danger",
            ),
        ],
        _ => vec![StoryMoment::new(
            format!("{} on a magical adventure", n),
            "exciting and magical",
            "a colorful magical world",
            "exploring with wonder and excitement",
        )],
    }
}

/// Escape text for use inside SVG markup
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap SVG markup in a base64 data URL
pub fn svg_data_url(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg.as_bytes()))
}

/// Cover card plus a card for the adventure theme
pub fn placeholder_images(child_name: &str, adventure: Option<AdventureType>) -> Vec<String> {
    let name = escape_xml(child_name);
    let theme = theme(adventure);

    let cover = format!(
        r##"<svg width="{WIDTH}" height="{HEIGHT}" xmlns="http://www.w3.org/2000/svg">
  <defs>
    <linearGradient id="coverGrad" x1="0%" y1="0%" x2="100%" y2="100%">
      <stop offset="0%" style="stop-color:#ff6b9d;stop-opacity:1" />
      <stop offset="50%" style="stop-color:#feca57;stop-opacity:1" />
      <stop offset="100%" style="stop-color:#2ed573;stop-opacity:1" />
    </linearGradient>
  </defs>
  <rect width="100%" height="100%" fill="url(#coverGrad)"/>
  <circle cx="200" cy="100" r="40" fill="white" opacity="0.8"/>
  <text x="200" y="110" text-anchor="middle" fill="#333" font-family="Arial" font-size="16" font-weight="bold">{name}</text>
  <text x="200" y="200" text-anchor="middle" fill="white" font-family="Arial" font-size="20" font-weight="bold">📚 Story Adventure</text>
  <circle cx="100" cy="50" r="3" fill="white" opacity="0.6"/>
  <circle cx="300" cy="80" r="4" fill="white" opacity="0.7"/>
  <circle cx="150" cy="250" r="2" fill="white" opacity="0.5"/>
  <circle cx="320" cy="220" r="3" fill="white" opacity="0.6"/>
</svg>"##
    );

    let adventure_card = format!(
        r##"<svg width="{WIDTH}" height="{HEIGHT}" xmlns="http://www.w3.org/2000/svg">
  <defs>
    <radialGradient id="adventureGrad" cx="50%" cy="50%" r="50%">
      <stop offset="0%" style="stop-color:{color};stop-opacity:0.8" />
      <stop offset="100%" style="stop-color:{color};stop-opacity:0.3" />
    </radialGradient>
  </defs>
  <rect width="100%" height="100%" fill="url(#adventureGrad)"/>
  <text x="200" y="150" text-anchor="middle" font-size="60">{icon}</text>
  <text x="200" y="200" text-anchor="middle" fill="white" font-family="Arial" font-size="18" font-weight="bold">{title}</text>
  <text x="200" y="230" text-anchor="middle" fill="white" font-family="Arial" font-size="14">Featuring {name}</text>
  <circle cx="80" cy="80" r="2" fill="white" opacity="0.8"/>
  <circle cx="320" cy="60" r="3" fill="white" opacity="0.6"/>
  <circle cx="60" cy="220" r="2" fill="white" opacity="0.7"/>
  <circle cx="340" cy="240" r="2" fill="white" opacity="0.5"/>
</svg>"##,
        color = theme.color,
        icon = theme.icon,
        title = theme.title,
    );

    vec![svg_data_url(&cover), svg_data_url(&adventure_card)]
}

/// Placeholder for one moment that could not be drawn
pub fn moment_placeholder(
    child_name: &str,
    moment: &StoryMoment,
    adventure: Option<AdventureType>,
) -> String {
    let theme = theme(adventure);
    let svg = format!(
        r##"<svg width="{WIDTH}" height="{HEIGHT}" xmlns="http://www.w3.org/2000/svg">
  <defs>
    <radialGradient id="momentGrad" cx="50%" cy="50%" r="60%">
      <stop offset="0%" style="stop-color:{color};stop-opacity:0.8" />
      <stop offset="100%" style="stop-color:{color};stop-opacity:0.3" />
    </radialGradient>
  </defs>
  <rect width="100%" height="100%" fill="url(#momentGrad)"/>
  <text x="200" y="80" text-anchor="middle" font-size="24">{icons}</text>
  <text x="200" y="140" text-anchor="middle" fill="white" font-family="Arial" font-size="16" font-weight="bold">{name}'s Adventure</text>
  <text x="200" y="170" text-anchor="middle" fill="white" font-family="Arial" font-size="12">{description}</text>
  <text x="200" y="220" text-anchor="middle" fill="white" font-family="Arial" font-size="10" opacity="0.8">🎨 Illustration Loading...</text>
  <circle cx="100" cy="50" r="2" fill="white" opacity="0.6"/>
  <circle cx="300" cy="70" r="3" fill="white" opacity="0.7"/>
  <circle cx="80" cy="250" r="2" fill="white" opacity="0.5"/>
  <circle cx="320" cy="230" r="2" fill="white" opacity="0.6"/>
</svg>"##,
        color = theme.color,
        icons = theme.scene_icons,
        name = escape_xml(child_name),
        description = escape_xml(&moment.description),
    );
    svg_data_url(&svg)
}

/// Produces the pictures attached to a story
#[derive(Clone)]
pub struct Illustrator {
    provider: Option<Arc<dyn Provider>>,
    config: IllustrationConfig,
    fences: Regex,
}

impl Illustrator {
    /// Create an illustrator; `provider` is only used when `config.enabled`
    ///
    /// # Errors
    ///
    /// Returns error if the fence-stripping pattern fails to compile
    pub fn new(provider: Option<Arc<dyn Provider>>, config: IllustrationConfig) -> Result<Self> {
        let fences = Regex::new(r"```(?:svg|xml|json)?\s*")
            .map_err(|e| StoryMagicError::Config(format!("Invalid fence pattern: {}", e)))?;
        Ok(Self {
            provider,
            config,
            fences,
        })
    }

    /// Pictures for a story, empty unless pictures were requested
    pub async fn illustrate(
        &self,
        child_name: &str,
        story: &str,
        customization: &Customization,
    ) -> Vec<String> {
        if !customization.include_pictures {
            return Vec::new();
        }

        let provider = match (&self.provider, self.config.enabled) {
            (Some(provider), true) => provider,
            _ => {
                tracing::debug!("Illustrations disabled, using placeholder images");
                return placeholder_images(child_name, customization.adventure_type);
            }
        };

        let moments = self
            .extract_moments(provider.as_ref(), child_name, story, customization)
            .await;
        let style = art_style_description(customization.art_style.unwrap_or_default());

        let mut images = Vec::new();
        for moment in moments.iter().take(self.config.max_images) {
            let image = match self.draw(provider.as_ref(), child_name, moment, style).await {
                Ok(svg) => svg_data_url(&svg),
                Err(e) => {
                    tracing::warn!("Illustration failed for '{}': {}", moment.description, e);
                    moment_placeholder(child_name, moment, customization.adventure_type)
                }
            };
            images.push(image);
        }

        tracing::info!("Generated {} illustrations", images.len());
        images
    }

    /// Ask the model for key scenes, falling back to the theme defaults
    async fn extract_moments(
        &self,
        provider: &dyn Provider,
        child_name: &str,
        story: &str,
        customization: &Customization,
    ) -> Vec<StoryMoment> {
        let prompt = format!(
            "Analyze this children's story and identify 2-3 key visual moments that would make great \
illustrations. For each moment, provide a description, mood, setting, and action.

Story: \"{story}\"

Return a JSON array with objects containing:
- description: Brief description of the scene
- mood: The emotional tone (exciting, magical, peaceful, etc.)
- setting: Where the scene takes place
- action: What {child_name} is doing in the scene

Focus on moments where {child_name} is actively doing something interesting or exciting. Make sure \
all moments are child-appropriate and positive."
        );

        let options = CompletionOptions {
            max_tokens: 600,
            temperature: 0.4,
        };
        let parsed = match provider.complete(&[Message::user(prompt)], &options).await {
            Ok(response) => {
                let cleaned = self.strip_fences(response.content());
                serde_json::from_str::<Vec<StoryMoment>>(&cleaned).ok()
            }
            Err(e) => {
                tracing::debug!("Moment extraction failed: {}", e);
                None
            }
        };

        match parsed {
            Some(moments) if !moments.is_empty() => moments.into_iter().take(3).collect(),
            _ => default_moments(child_name, customization.adventure_type),
        }
    }

    async fn draw(
        &self,
        provider: &dyn Provider,
        child_name: &str,
        moment: &StoryMoment,
        style: &str,
    ) -> Result<String> {
        let prompt = format!(
            "Create a detailed SVG illustration for a children's book showing: {description}.

Style: {style}
Character: A child named {child_name} should be the main focus
Mood: {mood}
Setting: {setting}
Action: {action}

Requirements:
- Size: {WIDTH}x{HEIGHT} pixels
- Child-friendly and colorful
- Show {child_name} as brave and heroic
- Include magical or adventure elements
- Safe and appropriate for children
- Use bright, engaging colors

Return only the complete SVG code without any explanation or markdown formatting.",
            description = moment.description,
            mood = moment.mood,
            setting = moment.setting,
            action = moment.action,
        );

        let options = CompletionOptions {
            max_tokens: 2000,
            temperature: 0.7,
        };
        let response = provider.complete(&[Message::user(prompt)], &options).await?;
        let svg = self.strip_fences(response.content());

        if svg.contains("<svg") && svg.contains("</svg>") {
            Ok(svg)
        } else {
            Err(StoryMagicError::Provider("Response is not an SVG document".to_string()).into())
        }
    }

    fn strip_fences(&self, text: &str) -> String {
        self.fences.replace_all(text, "").trim().to_string()
    }
}
