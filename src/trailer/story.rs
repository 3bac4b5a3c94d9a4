//! Story Elements
//!
//! The five categories a trailer is built from, the current selection, and
//! the catalog of options the selection is drawn from. The catalog ships
//! with built-in lists; a directory of `<category>.json` files (each a JSON
//! array of strings) can replace any of them.

use std::collections::BTreeMap;
use std::path::Path;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Result, TrailerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryCategory {
    Genre,
    Setting,
    MainCharacter,
    Conflict,
    PlotTwist,
}

impl StoryCategory {
    pub const ALL: [StoryCategory; 5] = [
        Self::Genre,
        Self::Setting,
        Self::MainCharacter,
        Self::Conflict,
        Self::PlotTwist,
    ];

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Genre => "Genre",
            Self::Setting => "Setting",
            Self::MainCharacter => "Main Character",
            Self::Conflict => "Conflict",
            Self::PlotTwist => "Plot Twist",
        }
    }

    /// Snake-case key used for prompt placeholders and option files
    pub fn key(&self) -> &'static str {
        match self {
            Self::Genre => "genre",
            Self::Setting => "setting",
            Self::MainCharacter => "main_character",
            Self::Conflict => "conflict",
            Self::PlotTwist => "plot_twist",
        }
    }
}

impl std::fmt::Display for StoryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for StoryCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.key() == normalized)
            .ok_or_else(|| {
                format!(
                    "Unknown story category: {}. Valid values: genre, setting, main_character, conflict, plot_twist",
                    s
                )
            })
    }
}

/// One value per category; always holds all five
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryElementSelection {
    values: BTreeMap<StoryCategory, String>,
}

impl StoryElementSelection {
    /// Build from exactly one value per category
    pub fn new(values: [(StoryCategory, String); 5]) -> Result<Self> {
        let values: BTreeMap<_, _> = values.into_iter().collect();
        if values.len() != StoryCategory::ALL.len() {
            return Err(TrailerError::Config(
                "A selection needs exactly one value per story category".to_string(),
            ));
        }
        Ok(Self { values })
    }

    pub fn get(&self, category: StoryCategory) -> &str {
        self.values.get(&category).map(String::as_str).unwrap_or_default()
    }

    /// Replace one value. Blank values are rejected.
    pub fn set(&mut self, category: StoryCategory, value: &str) -> Result<()> {
        let value = value.trim();
        if value.is_empty() {
            return Err(TrailerError::Config(format!(
                "{} must not be empty",
                category.label()
            )));
        }
        self.values.insert(category, value.to_string());
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (StoryCategory, &str)> {
        self.values.iter().map(|(c, v)| (*c, v.as_str()))
    }

    /// Placeholder values for prompt rendering, keyed by [`StoryCategory::key`]
    pub fn prompt_values(&self) -> BTreeMap<&'static str, String> {
        self.iter().map(|(c, v)| (c.key(), v.to_string())).collect()
    }
}

/// Category → option list
#[derive(Debug, Clone)]
pub struct StoryElementCatalog {
    options: BTreeMap<StoryCategory, Vec<String>>,
}

impl Default for StoryElementCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StoryElementCatalog {
    pub fn builtin() -> Self {
        let options = StoryCategory::ALL
            .into_iter()
            .map(|c| (c, builtin_options(c).iter().map(|s| s.to_string()).collect()))
            .collect();
        Self { options }
    }

    /// Built-ins, with each category replaced by `<dir>/<key>.json` when present
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut catalog = Self::builtin();

        for category in StoryCategory::ALL {
            let path = dir.join(format!("{}.json", category.key()));
            if !path.exists() {
                continue;
            }

            let raw = std::fs::read_to_string(&path)?;
            let options: Vec<String> = serde_json::from_str(&raw)?;
            let options: Vec<String> = options
                .into_iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();

            if options.is_empty() {
                return Err(TrailerError::Config(format!(
                    "{} has no usable options",
                    path.display()
                )));
            }

            debug!("Loaded {} {} options from {}", options.len(), category, path.display());
            catalog.options.insert(category, options);
        }

        Ok(catalog)
    }

    pub fn options(&self, category: StoryCategory) -> &[String] {
        self.options.get(&category).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn pick<R: Rng + ?Sized>(&self, category: StoryCategory, rng: &mut R) -> String {
        // Option lists are never empty: built-ins are fixed and loaded lists are checked
        self.options(category)
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| category.label().to_string())
    }

    /// A fresh selection with every category drawn at random
    pub fn random_selection<R: Rng + ?Sized>(&self, rng: &mut R) -> StoryElementSelection {
        let values = StoryCategory::ALL
            .into_iter()
            .map(|c| (c, self.pick(c, rng)))
            .collect();
        StoryElementSelection { values }
    }
}

fn builtin_options(category: StoryCategory) -> &'static [&'static str] {
    match category {
        StoryCategory::Genre => &[
            "Sci-Fi",
            "Horror",
            "Romcom",
            "Mockumentary",
            "Psychological Thriller",
            "Musical About Taxes",
            "Noir Cooking Show",
            "Existential Slapstick",
            "Baroque Cyberpunk",
            "Surrealist Western",
            "Kaiju Rom-Com",
        ],
        StoryCategory::Setting => &[
            "Post-apocalyptic Walmart",
            "Medieval Times Restaurant",
            "Sentient IKEA",
            "Alien Planet Made of Cheese",
            "Underwater Burning Man",
            "Virtual Reality Retirement Home",
            "Time-Traveling Taco Truck",
            "Interdimensional DMV",
            "Tokyo During a Kaiju Attack",
            "B-Movie Spaceship Interior",
        ],
        StoryCategory::MainCharacter => &[
            "Depressed Superhero",
            "Conspiracy Theorist Grandma",
            "Incompetent Ninja",
            "Passive-Aggressive AI",
            "Vegan Vampire",
            "Narcoleptic Secret Agent",
            "Hypochondriac Immortal",
            "Lactose Intolerant Cheesemaker",
            "Misunderstood Gentle Kaiju",
            "Godzilla's Therapist",
        ],
        StoryCategory::Conflict => &[
            "War Against Sentient Mold",
            "Alien Invasion of Telemarketers",
            "Apocalyptic Coffee Shortage",
            "Outbreak of Excessive Politeness",
            "Hostile Takeover by Sarcastic AI",
            "Yoga Cult Uprising",
            "Global Hair Gel Shortage",
            "Kaiju Labor Union Strike",
            "The Birds, but with Penguins",
        ],
        StoryCategory::PlotTwist => &[
            "Everything Was Just a Cat's Dream",
            "Villain Is the Protagonist's Future Self",
            "Earth Is Flat (And It's a Pizza)",
            "It Was All a Timeshare Pitch",
            "All Characters Are the Same Person",
            "Narrator Was a Pathological Liar",
            "Civilization Is Run by Hamsters in People Suits",
            "Kaiju Were Cake All Along",
            "Dramatic Reveal of the Monster Suit Zipper",
        ],
    }
}
