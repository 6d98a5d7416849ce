pub mod preferences;
pub mod prompts;
pub mod advisor;

pub use preferences::{aggregate, PreferenceProfile, PriceRange};
pub use advisor::{Suggestion, SuggestionSet, TravelAdvisor};
