//! Static localized-title and series lookup tables.
//!
//! Loaded once at startup, read-only afterwards. Each entry pairs a
//! canonical English title with its localized editions per language, so a
//! query in one language can fall back to the canonical form when its
//! native marketplace comes up empty. The series table maps volume titles
//! to their series name and sibling volumes for series-level and
//! fuzzy-alias queries.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Bumped whenever the tables change shape or content.
pub const TABLE_VERSION: u32 = 3;

struct TitleEntry {
    canonical: &'static str,
    lang: &'static str,
    localized: &'static str,
}

/// (canonical English title, language, localized title) triples.
static TITLE_PAIRS: &[TitleEntry] = &[
    TitleEntry { canonical: "Mistborn", lang: "de", localized: "Kinder des Nebels" },
    TitleEntry { canonical: "The Well of Ascension", lang: "de", localized: "Krieger des Feuers" },
    TitleEntry { canonical: "The Hero of Ages", lang: "de", localized: "Herrscher des Lichts" },
    TitleEntry { canonical: "The Way of Kings", lang: "de", localized: "Der Weg der Könige" },
    TitleEntry { canonical: "Words of Radiance", lang: "de", localized: "Der Pfad der Winde" },
    TitleEntry { canonical: "Oathbringer", lang: "de", localized: "Die Worte des Lichts" },
    TitleEntry { canonical: "Warbreaker", lang: "de", localized: "Sturmklänge" },
    TitleEntry { canonical: "Elantris", lang: "de", localized: "Die Seele des Königs" },
    TitleEntry { canonical: "Mistborn", lang: "fr", localized: "Fils-des-Brumes" },
    TitleEntry { canonical: "The Way of Kings", lang: "fr", localized: "La Voie des Rois" },
    TitleEntry { canonical: "Mistborn", lang: "es", localized: "Nacidos de la Bruma" },
    TitleEntry { canonical: "The Name of the Wind", lang: "de", localized: "Der Name des Windes" },
    TitleEntry { canonical: "The Wise Man's Fear", lang: "de", localized: "Die Furcht des Weisen" },
    TitleEntry { canonical: "The Eye of the World", lang: "de", localized: "Die Suche nach dem Auge der Welt" },
];

struct SeriesEntry {
    series: &'static str,
    volumes: &'static [&'static str],
}

/// Series name plus the canonical titles of its volumes.
static SERIES: &[SeriesEntry] = &[
    SeriesEntry {
        series: "Mistborn",
        volumes: &["Mistborn", "The Final Empire", "The Well of Ascension", "The Hero of Ages"],
    },
    SeriesEntry {
        series: "The Stormlight Archive",
        volumes: &["The Way of Kings", "Words of Radiance", "Oathbringer", "Rhythm of War"],
    },
    SeriesEntry {
        series: "The Kingkiller Chronicle",
        volumes: &["The Name of the Wind", "The Wise Man's Fear"],
    },
    SeriesEntry {
        series: "The Wheel of Time",
        volumes: &["The Eye of the World", "The Great Hunt", "The Dragon Reborn"],
    },
];

/// lowercase localized title -> (canonical, language)
static BY_LOCALIZED: LazyLock<HashMap<String, (&'static str, &'static str)>> =
    LazyLock::new(|| {
        TITLE_PAIRS
            .iter()
            .map(|e| (e.localized.to_lowercase(), (e.canonical, e.lang)))
            .collect()
    });

/// lowercase volume title -> series name
static BY_VOLUME: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    SERIES
        .iter()
        .flat_map(|s| s.volumes.iter().map(move |v| (v.to_lowercase(), s.series)))
        .collect()
});

/// Canonical English title for a localized one, when a mapping exists.
pub fn canonical_for(localized: &str) -> Option<&'static str> {
    BY_LOCALIZED
        .get(localized.trim().to_lowercase().as_str())
        .map(|(canonical, _)| *canonical)
}

/// Language a localized title belongs to, used as a detection signal when
/// metadata carries no language code.
pub fn language_of(localized: &str) -> Option<&'static str> {
    BY_LOCALIZED
        .get(localized.trim().to_lowercase().as_str())
        .map(|(_, lang)| *lang)
}

/// Series name a volume title belongs to.
pub fn series_of(title: &str) -> Option<&'static str> {
    let key = title.trim().to_lowercase();
    BY_VOLUME.get(key.as_str()).copied().or_else(|| {
        // A localized volume title maps through its canonical form.
        canonical_for(title).and_then(|c| BY_VOLUME.get(c.to_lowercase().as_str()).copied())
    })
}

/// Sibling volume titles within the same series, excluding `title` itself.
pub fn series_aliases(title: &str) -> Vec<&'static str> {
    let Some(series) = series_of(title) else {
        return Vec::new();
    };
    let key = title.trim().to_lowercase();
    SERIES
        .iter()
        .find(|s| s.series == series)
        .map(|s| {
            s.volumes
                .iter()
                .copied()
                .filter(|v| v.to_lowercase() != key)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localized_maps_to_canonical() {
        assert_eq!(canonical_for("Kinder des Nebels"), Some("Mistborn"));
        assert_eq!(canonical_for("kinder des nebels"), Some("Mistborn"));
        assert_eq!(canonical_for("Nacidos de la Bruma"), Some("Mistborn"));
        assert_eq!(canonical_for("Mistborn"), None);
    }

    #[test]
    fn localized_title_carries_language_signal() {
        assert_eq!(language_of("Kinder des Nebels"), Some("de"));
        assert_eq!(language_of("La Voie des Rois"), Some("fr"));
        assert_eq!(language_of("Totally Unknown"), None);
    }

    #[test]
    fn volume_resolves_series() {
        assert_eq!(series_of("Mistborn"), Some("Mistborn"));
        assert_eq!(series_of("Words of Radiance"), Some("The Stormlight Archive"));
        assert_eq!(series_of("Kinder des Nebels"), Some("Mistborn"));
        assert_eq!(series_of("Nothing Here"), None);
    }

    #[test]
    fn aliases_exclude_self() {
        let aliases = series_aliases("Mistborn");
        assert!(aliases.contains(&"The Well of Ascension"));
        assert!(!aliases.contains(&"Mistborn"));
    }

    #[test]
    fn aliases_empty_without_series() {
        assert!(series_aliases("Standalone Novel").is_empty());
    }
}
