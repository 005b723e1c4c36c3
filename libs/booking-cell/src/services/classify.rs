// libs/booking-cell/src/services/classify.rs
use crate::models::ServiceType;

const KEYWORD_TABLE: &[(ServiceType, &[&str])] = &[
    (ServiceType::Collision, &["collision", "accident", "crash", "dent", "bumper"]),
    (ServiceType::Paint, &["paint", "color", "scratch", "finish"]),
    (ServiceType::Mechanical, &["engine", "transmission", "brake", "mechanical"]),
    (ServiceType::Maintenance, &["maintenance", "service", "inspection", "check"]),
];

/// Simple keyword matching for service categorization. The first matching
/// category in table order wins; anything unmatched is `general`.
pub fn detect_service_type(text: &str) -> ServiceType {
    let text = text.to_lowercase();

    for (service_type, keywords) in KEYWORD_TABLE {
        if keywords.iter().any(|word| text.contains(word)) {
            return *service_type;
        }
    }

    ServiceType::General
}
