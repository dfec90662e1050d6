pub mod customer_service;
pub mod job_offer_service;
pub mod message_service;
pub mod notification_service;
pub mod professional_service;
