mod event;
mod reminder;
mod status;
mod subscription;
mod sync;

pub mod dtos {
    pub use crate::event::dtos::*;
    pub use crate::sync::dtos::*;
}

pub use crate::event::api::*;
pub use crate::reminder::api::*;
pub use crate::status::api::*;
pub use crate::subscription::api::*;
pub use crate::sync::api::*;
