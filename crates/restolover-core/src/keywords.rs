//! Keyword tables used by the query interpreter.
//!
//! The tables are ordered: the first speciality keyword (and the first city)
//! found in a query wins, so more specific surface forms must not be shadowed
//! by shorter ones earlier in the list. Tables are built once at startup,
//! either from the built-in French vocabulary or from a YAML file, and never
//! mutated afterwards.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Built-in speciality surface forms mapped to their canonical speciality name.
const SPECIALITY_KEYWORDS: &[(&str, &str)] = &[
    ("italien", "Italien"),
    ("italienne", "Italien"),
    ("italiennes", "Italien"),
    ("italiens", "Italien"),
    ("pizza", "Italien"),
    ("pasta", "Italien"),
    ("pâtes", "Italien"),
    ("français", "Français"),
    ("française", "Français"),
    ("françaises", "Français"),
    ("chinois", "Chinois"),
    ("chinoise", "Chinois"),
    ("chinoises", "Chinois"),
    ("japonais", "Japonais"),
    ("japonaise", "Japonais"),
    ("japonaises", "Japonais"),
    ("sushi", "Japonais"),
    ("thaï", "Thaï"),
    ("thaïlandais", "Thaï"),
    ("thaïlandaise", "Thaï"),
    ("indien", "Indien"),
    ("indienne", "Indien"),
    ("indiennes", "Indien"),
    ("mexicain", "Mexicain"),
    ("mexicaine", "Mexicain"),
    ("mexicaines", "Mexicain"),
    ("tacos", "Mexicain"),
    ("libanais", "Libanais"),
    ("libanaise", "Libanais"),
    ("libanaises", "Libanais"),
    ("grec", "Grec"),
    ("grecque", "Grec"),
    ("grecques", "Grec"),
    ("espagnol", "Espagnol"),
    ("espagnole", "Espagnol"),
    ("espagnoles", "Espagnol"),
    ("tapas", "Espagnol"),
    ("portugais", "Portugais"),
    ("portugaise", "Portugais"),
    ("portugaises", "Portugais"),
    ("marocain", "Marocain"),
    ("marocaine", "Marocain"),
    ("marocaines", "Marocain"),
    ("tunisien", "Tunisien"),
    ("tunisienne", "Tunisien"),
    ("tunisiennes", "Tunisien"),
    ("algérien", "Algérien"),
    ("algérienne", "Algérien"),
    ("algériennes", "Algérien"),
    ("turc", "Turc"),
    ("turque", "Turc"),
    ("turques", "Turc"),
    ("vietnamien", "Vietnamien"),
    ("vietnamienne", "Vietnamien"),
    ("vietnamiennes", "Vietnamien"),
    ("coréen", "Coréen"),
    ("coréenne", "Coréen"),
    ("coréennes", "Coréen"),
    ("fast-food", "Fast-food"),
    ("burger", "Fast-food"),
    ("hamburger", "Fast-food"),
    ("kebab", "Kebab"),
    ("kebabs", "Kebab"),
    ("pâtisserie", "Pâtisserie"),
    ("boulangerie", "Boulangerie"),
    ("café", "Café"),
    ("bar", "Bar"),
    ("brasserie", "Brasserie"),
    ("bistrot", "Bistrot"),
    ("gastronomique", "Gastronomique"),
    ("haute cuisine", "Gastronomique"),
    ("cuisine traditionnelle", "Traditionnel"),
    ("traditionnel", "Traditionnel"),
    ("traditionnelle", "Traditionnel"),
    ("traditionnelles", "Traditionnel"),
    ("traditionnels", "Traditionnel"),
];

/// Built-in French city names, roughly by population.
const CITY_KEYWORDS: &[&str] = &[
    "paris",
    "lyon",
    "marseille",
    "toulouse",
    "nice",
    "nantes",
    "strasbourg",
    "montpellier",
    "bordeaux",
    "lille",
    "rennes",
    "reims",
    "saint-étienne",
    "toulon",
    "angers",
    "grenoble",
    "dijon",
    "nîmes",
    "saint-denis",
    "le havre",
    "villeurbanne",
    "saint-paul",
    "metz",
    "besançon",
    "caen",
    "orléans",
    "mulhouse",
    "rouen",
    "boulogne-billancourt",
    "perpignan",
    "nancy",
    "argenteuil",
    "montreuil",
    "roubaix",
    "tourcoing",
    "nanterre",
    "avignon",
    "vitry-sur-seine",
    "créteil",
    "dunkerque",
    "poitiers",
    "asnières-sur-seine",
    "colombes",
    "versailles",
    "aulnay-sous-bois",
    "courbevoie",
    "cherbourg-en-cotentin",
    "rueil-malmaison",
    "bourges",
    "fort-de-france",
    "cannes",
    "aubervilliers",
    "calais",
    "béziers",
    "antibes",
    "saint-ouen",
    "colmar",
    "mérignac",
    "valence",
    "quimper",
    "drancy",
    "noisy-le-grand",
    "la rochelle",
    "beauvais",
    "sevran",
    "clichy-sous-bois",
    "bondy",
    "vannes",
    "sartrouville",
    "massy",
    "limoges",
    "meaux",
    "albi",
    "tarbes",
    "martigues",
    "bayonne",
    "belfort",
    "brive-la-gaillarde",
    "chambéry",
    "niort",
    "chalon-sur-saône",
    "sète",
    "saint-brieuc",
    "pau",
    "haguenau",
    "annecy",
    "caluire-et-cuire",
    "saint-malo",
    "boulogne-sur-mer",
    "blois",
    "carcassonne",
    "châteauroux",
    "cholet",
    "charleville-mézières",
    "évreux",
    "agen",
    "laval",
    "troyes",
    "clermont-ferrand",
    "tours",
    "le mans",
    "brest",
    "amiens",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialityKeyword {
    pub keyword: String,
    pub canonical: String,
}

/// Immutable, ordered keyword vocabulary for the query interpreter.
///
/// All keywords are stored lowercased and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTables {
    specialities: Vec<SpecialityKeyword>,
    cities: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct KeywordsFile {
    specialities: Vec<SpecialityKeyword>,
    cities: Vec<String>,
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KeywordTables {
    /// The built-in French vocabulary.
    #[must_use]
    pub fn builtin() -> Self {
        let specialities = SPECIALITY_KEYWORDS
            .iter()
            .map(|(keyword, canonical)| SpecialityKeyword {
                keyword: (*keyword).to_string(),
                canonical: (*canonical).to_string(),
            })
            .collect();
        let cities = CITY_KEYWORDS.iter().map(|c| (*c).to_string()).collect();
        Self {
            specialities,
            cities,
        }
    }

    /// Builds tables from caller-supplied entries, normalizing and validating them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if an entry is empty or a keyword
    /// appears twice in the same table.
    pub fn new(
        specialities: Vec<SpecialityKeyword>,
        cities: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let specialities: Vec<SpecialityKeyword> = specialities
            .into_iter()
            .map(|entry| SpecialityKeyword {
                keyword: entry.keyword.trim().to_lowercase(),
                canonical: entry.canonical.trim().to_string(),
            })
            .collect();
        let cities: Vec<String> = cities.iter().map(|c| c.trim().to_lowercase()).collect();

        let mut seen = HashSet::new();
        for entry in &specialities {
            if entry.keyword.is_empty() || entry.canonical.is_empty() {
                return Err(ConfigError::Validation(
                    "speciality keyword and canonical name must be non-empty".to_string(),
                ));
            }
            if !seen.insert(entry.keyword.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate speciality keyword: '{}'",
                    entry.keyword
                )));
            }
        }

        let mut seen = HashSet::new();
        for city in &cities {
            if city.is_empty() {
                return Err(ConfigError::Validation(
                    "city keyword must be non-empty".to_string(),
                ));
            }
            if !seen.insert(city.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate city keyword: '{city}'"
                )));
            }
        }

        Ok(Self {
            specialities,
            cities,
        })
    }

    #[must_use]
    pub fn specialities(&self) -> &[SpecialityKeyword] {
        &self.specialities
    }

    #[must_use]
    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// Distinct canonical speciality names in first-seen order.
    #[must_use]
    pub fn canonical_specialities(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.specialities
            .iter()
            .map(|entry| entry.canonical.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

/// Load and validate keyword tables from a YAML file.
///
/// ```yaml
/// specialities:
///   - { keyword: "pizza", canonical: "Italien" }
/// cities: ["paris", "lyon"]
/// ```
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_keyword_tables(path: &Path) -> Result<KeywordTables, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KeywordsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_keyword_tables(&content)
}

fn parse_keyword_tables(content: &str) -> Result<KeywordTables, ConfigError> {
    let file: KeywordsFile = serde_yaml::from_str(content)?;
    KeywordTables::new(file.specialities, file.cities)
}
