pub mod events;
pub mod show;
pub mod theme;
