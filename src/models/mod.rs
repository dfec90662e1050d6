pub mod customer;
pub mod event;
pub mod job_offer;
pub mod message;
pub mod professional;
