use wayfare_shared::Money;

use crate::preferences::PreferenceProfile;

pub const CHAT_SYSTEM: &str = "You are Wayfare's travel assistant. Help travellers plan trips: \
destinations, itineraries, budgets, transport and local customs. Keep answers concise and \
practical. If a question is not about travel, steer the conversation back politely.";

pub const SUGGESTIONS_SYSTEM: &str = "You recommend travel destinations. Reply with a JSON array \
only, no prose, where each element is an object with the keys \"destination\", \"country\", \
\"reason\" and \"bestMonth\".";

pub const VISA_SYSTEM: &str = "You summarise visa and entry requirements for travellers. State \
whether a visa is usually required, typical permitted stay, and documents to prepare. Remind \
the traveller to confirm with the official consulate before booking.";

pub const NEWS_SYSTEM: &str = "You brief travellers on a destination. Summarise current \
considerations a visitor should know: seasonal weather, safety advisories, events and \
transport disruptions. Say plainly when you are unsure whether information is current.";

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Describe a profile in plain text for the suggestions prompt.
pub fn suggestions_prompt(profile: &PreferenceProfile, count: usize) -> String {
    let mut lines = vec![format!("Suggest {} destinations for this traveller.", count)];

    if profile.is_empty() {
        lines.push("We know nothing about them yet; suggest popular, varied destinations.".to_string());
        return lines.join("\n");
    }

    let destinations = profile.top_destinations(5);
    if !destinations.is_empty() {
        lines.push(format!("Recently interested in: {}.", destinations.join(", ")));
    }
    let categories = profile.top_categories(5);
    if !categories.is_empty() {
        lines.push(format!("Favourite kinds of trip: {}.", categories.join(", ")));
    }
    let tags = profile.top_tags(8);
    if !tags.is_empty() {
        lines.push(format!("Stated preferences: {}.", tags.join(", ")));
    }

    let range = &profile.price_range;
    if let (Some(currency), Some(min), Some(max)) = (&range.currency, range.min, range.max) {
        lines.push(format!(
            "Typical spend between {} and {}.",
            Money::new(min, currency.as_str()),
            Money::new(max, currency.as_str())
        ));
    }
    if let Some(month) = profile.peak_month() {
        lines.push(format!("Usually travels in {}.", MONTHS[(month - 1) as usize]));
    }
    lines.push("Avoid repeating destinations they already looked at.".to_string());

    lines.join("\n")
}

pub fn visa_prompt(nationality: &str, destination: &str) -> String {
    format!(
        "A citizen of {} is planning a trip to {}. What are the entry requirements?",
        nationality, destination
    )
}

pub fn news_prompt(destination: &str) -> String {
    format!("What should a traveller heading to {} know right now?", destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::PriceRange;

    #[test]
    fn test_empty_profile_prompt() {
        let prompt = suggestions_prompt(&PreferenceProfile::default(), 3);
        assert!(prompt.starts_with("Suggest 3 destinations"));
        assert!(prompt.contains("know nothing"));
    }

    #[test]
    fn test_profile_details_reach_prompt() {
        let mut profile = PreferenceProfile {
            sample_size: 2,
            ..Default::default()
        };
        profile.destinations.insert("kyoto".to_string(), 2);
        profile.months[3] = 2;
        profile.price_range = PriceRange {
            currency: Some("USD".to_string()),
            min: Some(50_000),
            max: Some(125_050),
            average: Some(87_525.0),
        };

        let prompt = suggestions_prompt(&profile, 5);
        assert!(prompt.contains("kyoto"));
        assert!(prompt.contains("April"));
        assert!(prompt.contains("USD 500.00 and USD 1250.50"));

        profile.price_range.currency = Some("JPY".to_string());
        let prompt = suggestions_prompt(&profile, 5);
        assert!(prompt.contains("JPY 50000 and JPY 125050"));
    }
}
