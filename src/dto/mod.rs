pub mod application_dto;
pub mod listing_dto;
pub mod swipe_dto;
