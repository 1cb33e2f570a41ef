//! Subcommand implementations.

use std::sync::Arc;

use proficio_core::parser::Dataset;
use proficio_core::service::CompetencyService;
use proficio_core::traits::{
    Authorizer, CompetencyCatalog, EnrollmentProvider, SignalSource, StatusStore,
};
use proficio_activities::standard_registry;
use proficio_store::MemoryStore;

pub mod forest;
pub mod overview;
pub mod rate;
pub mod report;
pub mod validate;

/// Stand up the in-memory engine over a parsed dataset.
pub(crate) fn open_service(dataset: &Dataset) -> (Arc<MemoryStore>, CompetencyService) {
    let store = Arc::new(MemoryStore::from_dataset(dataset));
    let signals: Arc<dyn SignalSource> = store.clone();
    let registry = Arc::new(standard_registry(signals));
    let catalog: Arc<dyn CompetencyCatalog> = store.clone();
    let statuses: Arc<dyn StatusStore> = store.clone();
    let enrollment: Arc<dyn EnrollmentProvider> = store.clone();
    let authorizer: Arc<dyn Authorizer> = store.clone();
    let service = CompetencyService::new(catalog, statuses, registry, enrollment, authorizer);
    (store, service)
}
