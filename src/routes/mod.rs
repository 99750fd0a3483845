pub mod applications;
pub mod health;
pub mod listings;
pub mod notifications;
pub mod points;
pub mod swipe;
