//! Query specifications handed to the media repositories.
//!
//! A [`MediaQuery`] describes which media to return and in what order. Each
//! repository translates it for its own backend.

use crate::entities::media::MediaEntry;

/// Number of related items shown next to a media detail.
pub const RELATED_MEDIA_LIMIT: u32 = 6;

/// A trimmed, non-empty search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword(String);

impl Keyword {
    /// Blank or whitespace-only input means "no keyword".
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Keyword(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive substring test.
    pub fn found_in(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.0.to_lowercase())
    }

    /// `%keyword%` with LIKE metacharacters escaped so they match literally.
    pub fn like_pattern(&self) -> String {
        let mut escaped = String::with_capacity(self.0.len() + 2);
        escaped.push('%');
        for c in self.0.chars() {
            if matches!(c, '\\' | '%' | '_') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped.push('%');
        escaped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaOrder {
    /// Upload time descending, id descending on ties.
    #[default]
    NewestFirst,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFilter {
    pub active_only: bool,
    pub city_id: Option<i64>,
    pub exclude_id: Option<i64>,
    /// Matches city name OR title OR description.
    pub keyword: Option<Keyword>,
}

impl Default for MediaFilter {
    fn default() -> Self {
        MediaFilter {
            active_only: true,
            city_id: None,
            exclude_id: None,
            keyword: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaQuery {
    pub filter: MediaFilter,
    pub order: MediaOrder,
    pub limit: Option<u32>,
}

impl MediaQuery {
    /// Every active media item.
    pub fn active() -> Self {
        MediaQuery::default()
    }

    pub fn search(keyword: Option<Keyword>) -> Self {
        MediaQuery {
            filter: MediaFilter {
                keyword,
                ..MediaFilter::default()
            },
            ..MediaQuery::default()
        }
    }

    pub fn for_city(city_id: i64) -> Self {
        MediaQuery {
            filter: MediaFilter {
                city_id: Some(city_id),
                ..MediaFilter::default()
            },
            ..MediaQuery::default()
        }
    }

    pub fn related(city_id: i64, exclude_id: i64, limit: u32) -> Self {
        MediaQuery {
            filter: MediaFilter {
                city_id: Some(city_id),
                exclude_id: Some(exclude_id),
                ..MediaFilter::default()
            },
            limit: Some(limit),
            ..MediaQuery::default()
        }
    }

    pub fn including_inactive(mut self) -> Self {
        self.filter.active_only = false;
        self
    }

    /// Evaluates the filter against a single entry; ordering and limit are
    /// applied by the caller.
    pub fn matches(&self, entry: &MediaEntry) -> bool {
        let filter = &self.filter;
        let media = &entry.media;

        if filter.active_only && !media.active {
            return false;
        }
        if filter.city_id.is_some_and(|id| media.city_id != id) {
            return false;
        }
        if filter.exclude_id.is_some_and(|id| media.id == id) {
            return false;
        }
        match &filter.keyword {
            Some(keyword) => {
                keyword.found_in(&entry.city_name)
                    || keyword.found_in(&media.title)
                    || keyword.found_in(&media.description)
            }
            None => true,
        }
    }

    /// Sorts and truncates entries that already passed [`MediaQuery::matches`].
    pub fn arrange(&self, mut entries: Vec<MediaEntry>) -> Vec<MediaEntry> {
        match self.order {
            MediaOrder::NewestFirst => entries.sort_by(|a, b| {
                b.media.uploaded_at
                    .cmp(&a.media.uploaded_at)
                    .then(b.media.id.cmp(&a.media.id))
            }),
        }
        if let Some(limit) = self.limit {
            entries.truncate(limit as usize);
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::media::Media;
    use chrono::{Duration, Utc};

    fn entry(id: i64, city_id: i64, city_name: &str, title: &str, minutes_ago: i64) -> MediaEntry {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        MediaEntry {
            media: Media {
                id,
                title: title.into(),
                description: "A view".into(),
                file_ref: format!("{id}.jpg"),
                city_id,
                active: true,
                uploaded_at: at,
                updated_at: at,
            },
            city_name: city_name.into(),
            city_state: "Norte".into(),
            city_country: "Portugal".into(),
        }
    }

    #[test]
    fn blank_keyword_is_no_keyword() {
        assert_eq!(Keyword::parse(Some("   ")), None);
        assert_eq!(Keyword::parse(None), None);
        assert_eq!(MediaQuery::search(Keyword::parse(Some(""))), MediaQuery::search(None));
        assert_eq!(Keyword::parse(Some(" porto ")).unwrap().as_str(), "porto");
    }

    #[test]
    fn keyword_matches_any_field_case_insensitively() {
        let query = MediaQuery::search(Keyword::parse(Some("PORTO")));

        assert!(query.matches(&entry(1, 1, "Porto", "Bridge", 1)));
        assert!(query.matches(&entry(2, 2, "Lisboa", "Day trip to porto", 1)));
        assert!(!query.matches(&entry(3, 2, "Lisboa", "Tram", 1)));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        let keyword = Keyword::parse(Some("100%_a\\b")).unwrap();
        assert_eq!(keyword.like_pattern(), "%100\\%\\_a\\\\b%");
    }

    #[test]
    fn related_excludes_and_limits_newest_first() {
        let query = MediaQuery::related(1, 7, 2);
        let entries: Vec<_> = vec![
            entry(5, 1, "Porto", "a", 30),
            entry(7, 1, "Porto", "b", 0),
            entry(8, 1, "Porto", "c", 10),
            entry(9, 2, "Braga", "d", 5),
            entry(10, 1, "Porto", "e", 20),
        ]
        .into_iter()
        .filter(|e| query.matches(e))
        .collect();

        let ids: Vec<i64> = query.arrange(entries).iter().map(|e| e.media.id).collect();
        assert_eq!(ids, vec![8, 10]);
    }

    #[test]
    fn inactive_media_only_visible_when_requested() {
        let mut hidden = entry(1, 1, "Porto", "a", 1);
        hidden.media.active = false;

        assert!(!MediaQuery::active().matches(&hidden));
        assert!(MediaQuery::active().including_inactive().matches(&hidden));
    }
}
