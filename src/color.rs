//! Category → color assignment shared by the tree and map figures.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};
use crate::metadata::MetadataTable;

pub const DEFAULT_COLOR_SEED: u64 = 927;
pub const FALLBACK_COLOR: &str = "rgb(100,100,100)";

/// Qualitative palette used by [`ColorSource::Cycling`] when no list is given.
pub const DEFAULT_PALETTE: [&str; 21] = [
    "rgb(31, 119, 180)",
    "rgb(255, 127, 14)",
    "rgb(44, 160, 44)",
    "rgb(214, 39, 40)",
    "rgb(148, 103, 189)",
    "rgb(140, 86, 75)",
    "rgb(227, 119, 194)",
    "rgb(127, 127, 127)",
    "rgb(188, 189, 34)",
    "rgb(23, 190, 207)",
    "rgb(240, 228, 66)",
    "rgb(65, 244, 47)",
    "rgb(255, 102, 152)",
    "rgb(204, 204, 204)",
    "rgb(200, 36, 17)",
    "rgb(114, 147, 203)",
    "rgb(83, 81, 84)",
    "rgb(147, 160, 61)",
    "rgb(169, 170, 68)",
    "rgb(193, 190, 70)",
    "rgb(93, 162, 233)",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ColorSource {
    /// One uniformly random `#rrggbb` per category from a seeded ChaCha8
    /// stream, which is portable across platforms and `rand` releases.
    Seeded { seed: u64 },
    /// Positional assignment; the list must cover every category.
    Palette(Vec<String>),
    /// Positional assignment that wraps around when categories outnumber colors.
    Cycling(Vec<String>),
}

impl Default for ColorSource {
    fn default() -> Self {
        ColorSource::Seeded {
            seed: DEFAULT_COLOR_SEED,
        }
    }
}

impl ColorSource {
    pub fn default_palette() -> Self {
        ColorSource::Cycling(DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect())
    }
}

/// Category labels mapped to colors, in first-seen order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColorMap {
    entries: Vec<(String, String)>,
}

impl ColorMap {
    /// Assign a color to every distinct category of `metadata`.
    pub fn from_metadata(metadata: &MetadataTable, source: &ColorSource) -> Result<Self> {
        Self::assign(&metadata.categories(), source)
    }

    pub fn assign<S: AsRef<str>>(categories: &[S], source: &ColorSource) -> Result<Self> {
        let colors: Vec<String> = match source {
            ColorSource::Seeded { seed } => {
                let mut rng = ChaCha8Rng::seed_from_u64(*seed);
                categories.iter().map(|_| random_hex(&mut rng)).collect()
            }
            ColorSource::Palette(palette) => {
                if palette.len() < categories.len() {
                    return Err(Error::config(format!(
                        "{} color(s) supplied for {} categories",
                        palette.len(),
                        categories.len()
                    )));
                }
                palette.iter().take(categories.len()).cloned().collect()
            }
            ColorSource::Cycling(palette) => {
                if palette.is_empty() && !categories.is_empty() {
                    return Err(Error::config("color palette is empty"));
                }
                (0..categories.len())
                    .map(|index| palette[index % palette.len()].clone())
                    .collect()
            }
        };

        let entries = categories
            .iter()
            .map(|category| category.as_ref().to_string())
            .zip(colors)
            .collect();
        Ok(Self { entries })
    }

    pub fn get(&self, category: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, color)| color.as_str())
    }

    /// Color for `category`, or the neutral gray for anything unseen.
    pub fn color_or_fallback(&self, category: &str) -> &str {
        self.get(category).unwrap_or(FALLBACK_COLOR)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, color)| (name.as_str(), color.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn random_hex(rng: &mut impl Rng) -> String {
    let (r, g, b): (u8, u8, u8) = (rng.gen(), rng.gen(), rng.gen());
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countries() -> Vec<&'static str> {
        vec!["Peru", "Chile", "Kenya"]
    }

    #[test]
    fn seeded_colors_are_reproducible() {
        let first = ColorMap::assign(&countries(), &ColorSource::default()).unwrap();
        let second = ColorMap::assign(&countries(), &ColorSource::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        for (_, color) in first.iter() {
            assert_eq!(color.len(), 7);
            assert!(color.starts_with('#'));
            assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn seeded_colors_follow_the_chacha8_stream() {
        let mut rng = ChaCha8Rng::seed_from_u64(DEFAULT_COLOR_SEED);
        let expected: Vec<String> = (0..3).map(|_| random_hex(&mut rng)).collect();
        let map = ColorMap::assign(&countries(), &ColorSource::default()).unwrap();
        let colors: Vec<&str> = map.iter().map(|(_, color)| color).collect();
        assert_eq!(colors, expected);
    }

    #[test]
    fn different_seeds_change_colors() {
        let a = ColorMap::assign(&countries(), &ColorSource::Seeded { seed: 927 }).unwrap();
        let b = ColorMap::assign(&countries(), &ColorSource::Seeded { seed: 928 }).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn palette_maps_positionally_in_first_seen_order() {
        let palette = ColorSource::Palette(vec![
            "red".to_string(),
            "green".to_string(),
            "blue".to_string(),
            "unused".to_string(),
        ]);
        let map = ColorMap::assign(&countries(), &palette).unwrap();
        assert_eq!(map.get("Peru"), Some("red"));
        assert_eq!(map.get("Chile"), Some("green"));
        assert_eq!(map.get("Kenya"), Some("blue"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn short_palette_is_a_configuration_error() {
        let palette = ColorSource::Palette(vec!["red".to_string(), "green".to_string()]);
        let err = ColorMap::assign(&countries(), &palette).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn default_palette_cycles() {
        let categories: Vec<String> = (0..23).map(|i| format!("c{i}")).collect();
        let map = ColorMap::assign(&categories, &ColorSource::default_palette()).unwrap();
        assert_eq!(map.get("c0"), Some(DEFAULT_PALETTE[0]));
        assert_eq!(map.get("c21"), Some(DEFAULT_PALETTE[0]));
        assert_eq!(map.get("c22"), Some(DEFAULT_PALETTE[1]));
    }

    #[test]
    fn unknown_category_falls_back_to_gray() {
        let map = ColorMap::assign(&countries(), &ColorSource::default()).unwrap();
        assert_eq!(map.color_or_fallback("Atlantis"), FALLBACK_COLOR);
        assert_ne!(map.color_or_fallback("Peru"), FALLBACK_COLOR);
    }
}
