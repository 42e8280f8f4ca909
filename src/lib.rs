pub mod banner;
pub mod blade;
pub mod config;
pub mod consts;
pub mod detect;
pub mod discord;
pub mod error;
pub mod history;
pub mod kie;
pub mod spinner;
pub mod terminal;
