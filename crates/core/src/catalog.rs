//! Fixed option lists for the cultural preferences step.

use serde::{Deserialize, Serialize};

const HOBBIES: &[&str] = &[
    "reading",
    "writing",
    "painting",
    "drawing",
    "photography",
    "cooking",
    "traveling",
    "gaming",
    "music",
    "sports",
    "jogos",
    "academia",
    "baking",
    "gardening",
    "hiking",
    "camping",
    "fishing",
    "hunting",
    "swimming",
    "surfing",
    "skiing",
    "snowboarding",
    "cycling",
    "running",
    "yoga",
    "meditation",
    "dancing",
    "singing",
    "playing-instrument",
    "collecting",
    "learning-languages",
    "woodworking",
    "knitting",
    "sewing",
    "pottery",
    "sculpting",
    "bird-watching",
    "astronomy",
    "chess",
    "board-games",
    "video-games",
    "puzzles",
    "volunteering",
    "podcasting",
    "blogging",
];

/// Movies and series share one genre list.
const GENRES: &[&str] = &[
    "action",
    "adventure",
    "animation",
    "comedy",
    "crime",
    "documentary",
    "drama",
    "fantasy",
    "horror",
    "mystery",
    "romance",
    "science-fiction",
    "thriller",
    "western",
];

/// One of the multi-select lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Catalog {
    Hobbies,
    MovieGenres,
    SeriesGenres,
}

impl Catalog {
    /// Option ids in display order.
    #[must_use]
    pub const fn options(self) -> &'static [&'static str] {
        match self {
            Self::Hobbies => HOBBIES,
            Self::MovieGenres | Self::SeriesGenres => GENRES,
        }
    }

    /// Whether `value` is one of the options.
    #[must_use]
    pub fn contains(self, value: &str) -> bool {
        self.options().contains(&value)
    }

    /// Trim and de-duplicate a selection, keeping the first occurrence order.
    ///
    /// # Errors
    ///
    /// Returns the first value that is not in the catalog.
    pub fn normalize(self, selection: &[String]) -> Result<Vec<String>, String> {
        let mut out: Vec<String> = Vec::with_capacity(selection.len());
        for raw in selection {
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }
            if !self.contains(value) {
                return Err(value.to_owned());
            }
            if !out.iter().any(|v| v == value) {
                out.push(value.to_owned());
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(Catalog::Hobbies.options().len(), 45);
        assert_eq!(Catalog::MovieGenres.options().len(), 14);
        assert_eq!(Catalog::SeriesGenres.options().len(), 14);
    }

    #[test]
    fn test_normalize_collapses_duplicates() {
        let picked = vec![
            "chess".to_owned(),
            " yoga ".to_owned(),
            "chess".to_owned(),
            String::new(),
        ];
        assert_eq!(
            Catalog::Hobbies.normalize(&picked).unwrap(),
            vec!["chess".to_owned(), "yoga".to_owned()]
        );
    }

    #[test]
    fn test_normalize_rejects_unknown() {
        let picked = vec!["drama".to_owned(), "opera".to_owned()];
        assert_eq!(
            Catalog::MovieGenres.normalize(&picked),
            Err("opera".to_owned())
        );
    }
}
