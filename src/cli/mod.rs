//! CLI command handlers

pub mod commands;

pub use commands::{
    export, history_export, history_list, history_save, history_show, preview, verify,
};
