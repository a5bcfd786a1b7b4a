//! Wiring: one shared stats cache and one service per entity type.

use std::{sync::Arc, time::Duration};

use common::pagination::PaginationRequest;
use configs::AppConfig;
use models::ManagedEntity;
use sea_orm::DatabaseConnection;

use crate::{
    cache::TtlCache,
    filter::FilterSpec,
    repository::{EntityRepository, StatusBreakdown},
    services::{
        appointment, customer, project, request, service_item, AppointmentService, CustomerService, DashboardService,
        EntityService, ProjectService, RequestService, ServiceItemService,
    },
};

pub struct Services {
    pub customers: Arc<CustomerService>,
    pub projects: Arc<ProjectService>,
    pub appointments: Arc<AppointmentService>,
    pub requests: Arc<RequestService>,
    pub service_items: Arc<ServiceItemService>,
    pub dashboard: DashboardService,
    pub cache: TtlCache<StatusBreakdown>,
    default_page_size: i64,
}

impl Services {
    pub fn new(db: DatabaseConnection, cfg: &AppConfig) -> Self {
        let cache = TtlCache::new(Duration::from_secs(cfg.cache.default_ttl_secs));
        let max = cfg.pagination.max_limit;

        let customers = Arc::new(build(&db, customer::filter_spec(), &cache, max));
        let projects = Arc::new(build(&db, project::filter_spec(), &cache, max));
        let appointments = Arc::new(build(&db, appointment::filter_spec(), &cache, max));
        let requests = Arc::new(build(&db, request::filter_spec(), &cache, max));
        let service_items = Arc::new(build(&db, service_item::filter_spec(), &cache, max));
        let dashboard = DashboardService::new(
            customers.clone(),
            projects.clone(),
            appointments.clone(),
            requests.clone(),
            service_items.clone(),
        );

        Self {
            customers,
            projects,
            appointments,
            requests,
            service_items,
            dashboard,
            cache,
            default_page_size: cfg.pagination.default_limit,
        }
    }

    /// Pagination request with the configured default page size.
    pub fn page(&self, page: Option<i64>, limit: Option<i64>) -> PaginationRequest {
        PaginationRequest::new(page.unwrap_or(1), limit.unwrap_or(self.default_page_size))
    }
}

fn build<E>(db: &DatabaseConnection, spec: FilterSpec<E>, cache: &TtlCache<StatusBreakdown>, max: i64) -> EntityService<E>
where
    E: ManagedEntity,
    E::Model: Sync,
{
    EntityService::new(EntityRepository::new(db.clone(), spec).with_max_page_size(max), cache.clone())
}
