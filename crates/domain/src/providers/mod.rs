pub mod apple;
pub mod google;
