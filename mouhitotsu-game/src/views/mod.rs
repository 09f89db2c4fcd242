//! Side-effect-free view models for a presentation layer.
//!
//! Every function here only reads the engine and static content; rendering,
//! colours beyond the raw profile triples, and layout stay with the caller.

pub mod gallery;
pub mod menu;
pub mod profile;
pub mod result;

pub use gallery::{AchievementCard, AchievementGallery, EndBadge, EndKind, achievement_gallery};
pub use menu::{MenuEntry, scenario_menu, score_label};
pub use profile::{ProfileCard, ProfileDetail, profile_cards, profile_screen_title};
pub use result::{Banner, ChoiceOption, ResultView, choice_options, finale_choices, result_view};
