pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use crate::services::{
    customer_service::CustomerService, job_offer_service::JobOfferService,
    message_service::MessageService, notification_service::NotificationService,
    professional_service::ProfessionalService,
};
use crate::store::LifecycleStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LifecycleStore>,
    pub customer_service: CustomerService,
    pub professional_service: ProfessionalService,
    pub job_offer_service: JobOfferService,
    pub message_service: MessageService,
    pub notification_service: NotificationService,
}

impl AppState {
    pub fn new(store: Arc<dyn LifecycleStore>, notification_service: NotificationService) -> Self {
        let customer_service = CustomerService::new(store.clone());
        let professional_service = ProfessionalService::new(store.clone());
        let job_offer_service = JobOfferService::new(
            store.clone(),
            professional_service.clone(),
            notification_service.clone(),
        );
        let message_service = MessageService::new(store.clone(), notification_service.clone());

        Self {
            store,
            customer_service,
            professional_service,
            job_offer_service,
            message_service,
            notification_service,
        }
    }
}
