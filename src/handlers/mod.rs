pub mod bom;
pub mod common;
pub mod health;

use std::sync::Arc;

use crate::repositories::BomNodeResolver;
use crate::services::explosion_service::{BomExplosionService, ExplosionSettings};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub bom_explosion: Arc<BomExplosionService>,
    pub catalog: Arc<dyn BomNodeResolver>,
}

impl AppServices {
    pub fn new(catalog: Arc<dyn BomNodeResolver>, settings: ExplosionSettings) -> Self {
        let bom_explosion = Arc::new(BomExplosionService::new(catalog.clone(), settings));
        Self {
            bom_explosion,
            catalog,
        }
    }
}
