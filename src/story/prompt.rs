//! Prompt composition
//!
//! Turns a child profile and customization into the chat messages sent to
//! the text model, plus the sampling options for the request.

use super::{ChildProfile, GENERAL_ADVENTURE};
use crate::config::StoryConfig;
use crate::models::{AdventureType, Customization, Mood, ReadingLevel, StoryLength};
use crate::providers::{CompletionOptions, Message};

/// Age assumed when none is given
pub const DEFAULT_AGE: u32 = 8;

/// Interests used when none are given
pub const DEFAULT_INTERESTS: &str = "magical adventures and friendship";

const SYSTEM_PROMPT: &str = "You are a master children's story writer who creates magical, \
personalized stories that inspire and delight young readers. Your stories are always positive, \
age-appropriate, and make the child feel special and brave.";

const BASE_FEATURES: &str = "Include detailed character development, rich descriptions, and add \
a meaningful life lesson. Make it extra magical and engaging.";

/// Vocabulary and sentence complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplexityTier {
    Simple,
    Intermediate,
    Advanced,
}

impl ComplexityTier {
    /// An explicit advanced level wins; otherwise beginners and readers
    /// under eight get simple text
    pub fn for_reader(reading_level: Option<ReadingLevel>, age: u32) -> Self {
        match reading_level {
            Some(ReadingLevel::Advanced) => ComplexityTier::Advanced,
            Some(ReadingLevel::Beginner) => ComplexityTier::Simple,
            _ if age < DEFAULT_AGE => ComplexityTier::Simple,
            _ => ComplexityTier::Intermediate,
        }
    }

    fn guidance(&self) -> &'static str {
        match self {
            ComplexityTier::Simple => "Very simple vocabulary, short sentences, basic concepts",
            ComplexityTier::Intermediate => "Age-appropriate vocabulary with engaging descriptions",
            ComplexityTier::Advanced => "Rich vocabulary, complex sentences, deeper themes",
        }
    }
}

/// Target word range for a story length
pub fn word_range(length: Option<StoryLength>) -> (u32, u32) {
    match length {
        Some(StoryLength::Short) => (1000, 1500),
        Some(StoryLength::Long) => (2000, 3000),
        Some(StoryLength::Medium) | None => (1500, 2500),
    }
}

/// Sampling options: a smaller token budget for readers under eight
pub fn completion_options(age: u32, settings: &StoryConfig) -> CompletionOptions {
    CompletionOptions {
        max_tokens: if age < DEFAULT_AGE {
            settings.young_reader_max_tokens
        } else {
            settings.max_tokens
        },
        temperature: settings.temperature,
    }
}

pub fn mood_description(mood: Mood) -> &'static str {
    match mood {
        Mood::Adventurous => "Make it exciting and full of adventure with thrilling moments.",
        Mood::Calm => "Keep it peaceful and soothing with gentle, calming scenes.",
        Mood::Funny => "Make it humorous and silly with lots of laughs and funny situations.",
        Mood::Educational => {
            "Include educational elements and learning opportunities naturally woven into the story."
        }
        Mood::Magical => "Emphasize magical and mysterious elements with wonder and enchantment.",
    }
}

pub fn adventure_description(adventure: AdventureType) -> &'static str {
    use AdventureType::*;
    match adventure {
        Fantasy => "Set in a magical fantasy kingdom with castles, wizards, and mythical creatures.",
        Space => "Take place in outer space with planets, spaceships, and alien friends.",
        Underwater => "Happen in an underwater world with sea creatures and ocean adventures.",
        Forest => "Occur in a magical forest with talking animals and nature spirits.",
        Dinosaur => "Feature dinosaurs and prehistoric adventures in ancient times.",
        Superhero => "Include superhero elements with special powers and heroic missions.",
        Pirate => "Feature pirate adventures on the high seas with treasure hunts and ship battles.",
        Ninja => "Include ninja training, stealth missions, and martial arts adventures.",
        Wizard => "Take place in a magical wizard school with spells, potions, and magical creatures.",
        Princess => "Set in a royal castle with princess adventures, balls, and kingdom quests.",
        Robot => "Feature a futuristic world with helpful robots, technology, and sci-fi adventures.",
        Alien => "Take place on alien planets with friendly extraterrestrial beings and space exploration.",
        Jungle => "Occur in dense jungles with wild animals, ancient ruins, and nature adventures.",
        Arctic => "Set in the frozen Arctic with polar bears, penguins, and icy adventures.",
        Desert => "Take place in vast deserts with camels, oases, and ancient mysteries.",
        Mountain => "Feature mountain climbing, cave exploration, and high-altitude adventures.",
        Circus => "Include circus performances, acrobats, clowns, and carnival magic.",
        Farm => "Set on a working farm with friendly animals, crops, and rural adventures.",
        City => "Take place in a bustling city with skyscrapers, urban exploration, and city life.",
        Beach => "Feature beach adventures with sand castles, surfing, and ocean fun.",
        Carnival => "Include carnival rides, games, cotton candy, and festive celebrations.",
        Museum => "Set in museums with ancient artifacts, historical mysteries, and educational adventures.",
        Library => "Take place in magical libraries with enchanted books and literary adventures.",
        Bakery => "Feature baking adventures with delicious treats, recipes, and culinary magic.",
        Garden => "Set in beautiful gardens with flowers, butterflies, and nature discoveries.",
        Treehouse => "Include treehouse adventures with forest friends and elevated hideouts.",
        Playground => "Feature playground fun with swings, slides, and childhood games.",
        School => "Take place at school with classroom adventures, friends, and learning experiences.",
        Hospital => "Include medical adventures helping doctors, nurses, and patients.",
        Fire => "Feature firefighter adventures with rescue missions and emergency responses.",
        Police => "Include police work with crime solving, community help, and detective work.",
        Vet => "Set in veterinary clinics helping sick animals and pet care adventures.",
        Chef => "Feature cooking adventures in restaurant kitchens with delicious recipes.",
        Artist => "Include art creation, painting, sculpting, and creative expression adventures.",
        Musician => "Feature musical adventures with instruments, concerts, and song creation.",
        Dancer => "Include dance performances, choreography, and rhythmic adventures.",
        Inventor => "Set in invention labs with scientific experiments and creative innovations.",
        Detective => "Feature mystery solving, clue finding, and investigative adventures.",
        Time => "Include time travel adventures to different historical periods and future worlds.",
        Fairy => "Set in fairy realms with magical beings, pixie dust, and enchanted adventures.",
        Dragon => "Feature friendly dragons, dragon riding, and mythical creature adventures.",
        Unicorn => "Include unicorn magic, rainbow adventures, and mythical forest quests.",
        Mermaid => "Set in underwater mermaid kingdoms with ocean magic and sea adventures.",
        Ghost => "Feature friendly ghosts, haunted houses, and supernatural mystery adventures.",
        Monster => "Include silly monsters, monster friends, and fun creature adventures.",
        Toy => "Set in toy worlds where toys come to life for magical play adventures.",
        Candy => "Take place in candy lands with sweet treats and sugary adventures.",
        Ice => "Feature ice palaces, snow adventures, and frozen magical kingdoms.",
        Volcano => "Include volcano exploration, lava adventures, and geological discoveries.",
        Cloud => "Set in cloud kingdoms floating in the sky with aerial adventures.",
        Rainbow => "Feature rainbow bridges, color magic, and prismatic adventures.",
    }
}

fn special_features(customization: &Customization) -> String {
    let mut features = BASE_FEATURES.to_string();
    if let Some(mood) = customization.mood {
        features.push(' ');
        features.push_str(mood_description(mood));
    }
    if let Some(adventure) = customization.adventure_type {
        features.push(' ');
        features.push_str(adventure_description(adventure));
    }
    features
}

/// The user prompt for `child`
pub fn build_prompt(child: &ChildProfile, customization: &Customization) -> String {
    let age = child.age_or_default();
    let tier = ComplexityTier::for_reader(child.reading_level, age);
    let (min_words, max_words) = word_range(customization.length);
    let books = child.books();

    let book_guidance = if books.iter().any(|b| b.contains("General Adventure")) {
        "Create a general adventure story with magical elements, friendship, and courage themes"
    } else {
        "Incorporate themes, characters, or magical elements from these books - Make references that feel natural and exciting"
    };

    let age_text = child
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "around 8".to_string());
    let interests = child
        .interests
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_INTERESTS);
    let reading_level = child.reading_level.unwrap_or_default();
    let name = &child.name;

    format!(
        "Create a magical, personalized children's story with the following details:

MAIN CHARACTER: {name} (age {age_text})

FAVORITE BOOKS/THEMES: {books}
- {book_guidance}

CHILD'S INTERESTS: {interests}
- Weave these elements throughout the story
- Make them central to the plot

READING LEVEL: {reading_level}
STORY REQUIREMENTS:
- {guidance}
- {min_words}-{max_words} words - MAKE IT A LONG, DETAILED STORY with multiple chapters or scenes
- {features}
- {name} should be the brave hero of the story
- Include positive themes: courage, friendship, kindness, imagination
- Make it magical and exciting but age-appropriate
- Create multiple scenes and adventures within the story
- Develop the plot with detailed descriptions and dialogue
- Include character development and emotional moments
- End with a positive, inspiring message
- Use emojis sparingly (1-2 at the end)
- IMPORTANT: Write a comprehensive, lengthy story that fills multiple pages

TONE: Warm, magical, inspiring, and fun - like the best children's books

Create a complete story that will make {name} feel like the hero of their own magical adventure!",
        books = books.join(", "),
        guidance = tier.guidance(),
        features = special_features(customization),
    )
}

/// System and user messages for one story request
pub fn build_messages(child: &ChildProfile, customization: &Customization) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(build_prompt(child, customization)),
    ]
}
