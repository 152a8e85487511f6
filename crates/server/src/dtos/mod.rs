pub mod contact_dto;
pub mod fundraiser_dto;
pub mod payment_dto;
pub mod user_dto;
