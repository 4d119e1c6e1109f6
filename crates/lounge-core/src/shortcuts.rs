//! Canned questions offered next to the input box.

pub const GREETING: &str = "👋 Hello! I'm your Airport Lounge Assistant. Ask me about airport lounges around the world, access requirements, amenities, or anything else lounge-related! Try asking about lounges at a specific airport like 'What lounges are at Heathrow Airport?' or 'Tell me about lounges at Indira Gandhi Airport'.";

pub const SAMPLE_QUESTIONS: [&str; 4] = [
    "What lounges are available at JFK Airport?",
    "Do Priority Pass members have access to lounges at Dubai Airport?",
    "What amenities are offered at the Cathay Pacific lounge in Hong Kong?",
    "Are there any airport lounges with shower facilities in London Heathrow?",
];

pub const AMENITIES: [&str; 5] = [
    "Free WiFi",
    "Premium Drinks",
    "Buffet",
    "Shower Facilities",
    "24/7 Access",
];

pub fn amenity_query(label: &str) -> String {
    format!("Tell me about {} in airport lounges", label)
}
