use serde::Serialize;

use crate::entities::{city::City, media::MediaResponse};
use crate::errors::AppError;
use crate::query::{Keyword, MediaQuery};
use crate::repositories::{city::CityRepository, media::MediaRepository};

#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub keyword: Option<String>,
    pub selected_city: Option<City>,
    pub media: Vec<MediaResponse>,
    pub total: usize,
}

pub struct SearchHandler<R>
where
    R: CityRepository + MediaRepository,
{
    pub repo: R,
}

impl<R> SearchHandler<R>
where
    R: CityRepository + MediaRepository,
{
    pub fn new(repo: R) -> Self {
        SearchHandler { repo }
    }

    /// Keyword search over city name, title and description.
    ///
    /// A blank keyword lists every active media item. When the keyword is exactly
    /// the name of an active city, that city is reported as `selected_city`.
    pub async fn search(&self, raw_keyword: Option<&str>) -> Result<SearchResult, AppError> {
        let keyword = Keyword::parse(raw_keyword);

        let selected_city = match &keyword {
            Some(k) => self.repo.find_active_city_by_name(k.as_str()).await?,
            None => None,
        };

        let media: Vec<MediaResponse> = self
            .repo
            .find_media(&MediaQuery::search(keyword.clone()))
            .await?
            .iter()
            .map(|entry| entry.to_response())
            .collect();

        tracing::debug!(
            keyword = keyword.as_ref().map(Keyword::as_str),
            results = media.len(),
            "Media search"
        );

        Ok(SearchResult {
            keyword: keyword.map(|k| k.as_str().to_string()),
            selected_city,
            total: media.len(),
            media,
        })
    }
}
