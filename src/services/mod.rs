//! Business logic services

pub mod catalog;
pub mod loans;
pub mod sessions;
pub mod users;

use std::sync::Arc;

use crate::repository::Repository;

use sessions::SessionStore;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub users: users::UsersService,
    pub sessions: Arc<dyn SessionStore>,
}

impl Services {
    /// Create all services with the given repository and session backend
    pub fn new(repository: Repository, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone()),
            users: users::UsersService::new(repository),
            sessions,
        }
    }
}
