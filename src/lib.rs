mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;

pub use domain::{entities, query, upload, use_cases};
pub use interfaces::{handlers, repositories, routes};
pub use infrastructure::{cloudinary, db, storage, telemetry};

use repositories::any::AnyGalleryRepo;
use settings::AppConfig;
use storage::LocalMediaStorage;
use upload::{ContentSniffingClassifier, MediaValidator};
use use_cases::{cities::CityHandler, media::MediaHandler, search::SearchHandler};

pub struct AppState {
    pub city_handler: AppCityHandler,
    pub media_handler: AppMediaHandler,
    pub search_handler: AppSearchHandler,
    pub repo: AnyGalleryRepo,
}

pub type AppCityHandler = CityHandler<AnyGalleryRepo>;
pub type AppMediaHandler = MediaHandler<AnyGalleryRepo>;
pub type AppSearchHandler = SearchHandler<AnyGalleryRepo>;

impl AppState {
    pub fn new(config: &AppConfig, repo: AnyGalleryRepo) -> Self {
        let storage = LocalMediaStorage::new(&config.media_root);

        let mut validator = MediaValidator::new(config.upload_rules());
        if config.content_sniffing {
            validator = validator.with_classifier(ContentSniffingClassifier);
        }

        AppState {
            city_handler: CityHandler::new(repo.clone(), storage.clone()),
            media_handler: MediaHandler::new(repo.clone(), storage, validator),
            search_handler: SearchHandler::new(repo.clone()),
            repo,
        }
    }

    pub fn upload_rules(&self) -> &upload::UploadRules {
        self.media_handler.validator.rules()
    }
}
