use std::sync::Arc;

use qrstory_service::StoryService;

/// Shared handler state: the one owned service instance plus what the
/// redirect route needs from configuration.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<StoryService>,
    pub reveal_page: String,
}

impl AppState {
    pub fn new(service: StoryService, reveal_page: impl Into<String>) -> Self {
        Self::new_shared(Arc::new(service), reveal_page)
    }

    pub fn new_shared(service: Arc<StoryService>, reveal_page: impl Into<String>) -> Self {
        Self {
            service,
            reveal_page: reveal_page.into(),
        }
    }
}
