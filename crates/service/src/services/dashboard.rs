use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use super::{AppointmentService, CustomerService, ProjectService, RequestService, ServiceItemService};
use crate::{errors::ServiceError, repository::StatusBreakdown};

#[derive(Clone, Debug, Serialize)]
pub struct DashboardSummary {
    pub customers: StatusBreakdown,
    pub projects: StatusBreakdown,
    pub appointments: StatusBreakdown,
    pub requests: StatusBreakdown,
    pub services: StatusBreakdown,
    pub generated_at: DateTime<Utc>,
}

/// Read-only roll-up over the entity services' cached stats.
#[derive(Clone)]
pub struct DashboardService {
    customers: Arc<CustomerService>,
    projects: Arc<ProjectService>,
    appointments: Arc<AppointmentService>,
    requests: Arc<RequestService>,
    services: Arc<ServiceItemService>,
}

impl DashboardService {
    pub fn new(
        customers: Arc<CustomerService>,
        projects: Arc<ProjectService>,
        appointments: Arc<AppointmentService>,
        requests: Arc<RequestService>,
        services: Arc<ServiceItemService>,
    ) -> Self {
        Self { customers, projects, appointments, requests, services }
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<DashboardSummary, ServiceError> {
        let (customers, projects, appointments, requests, services) = tokio::try_join!(
            self.customers.stats(),
            self.projects.stats(),
            self.appointments.stats(),
            self.requests.stats(),
            self.services.stats(),
        )?;
        Ok(DashboardSummary { customers, projects, appointments, requests, services, generated_at: Utc::now() })
    }
}
