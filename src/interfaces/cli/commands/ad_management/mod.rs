//! Ad management commands

mod export;
mod helpers;
mod list;
mod modify;
mod show;

pub use export::export_ads;
pub use list::list_ads;
pub use modify::{delete_ad, toggle_ad};
pub use show::{show_ad, show_stats};
