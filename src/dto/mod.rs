pub mod job_offer_dto;
pub mod message_dto;
pub mod registry_dto;
