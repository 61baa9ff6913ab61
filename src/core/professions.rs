use std::collections::HashMap;

use crate::models::{
    CompanySize, InterestCategory, Posting, TeamRequirement, UserProfile, WorkEnvironment,
};

use InterestCategory::*;

/// Static map from Swiss apprenticeship profession labels to interest categories.
///
/// Lookup is case-sensitive on the exact label as it appears in scraped postings.
pub fn profession_interest_map() -> HashMap<&'static str, Vec<InterestCategory>> {
    HashMap::from([
        // Technical & IT
        ("Informatiker/in EFZ", vec![Technical]),
        ("Elektroniker/in EFZ", vec![Technical]),
        ("Polymechaniker/in EFZ", vec![Technical]),
        ("Automatiker/in EFZ", vec![Technical]),
        ("Anlagen- und Apparatebauer/in EFZ", vec![Technical]),
        // Business & Commerce
        ("Kaufmann/-frau EFZ", vec![Business]),
        ("Detailhandelsfachmann/-frau EFZ", vec![Business, Social]),
        ("Detailhandelsassistent/in EBA", vec![Business, Social]),
        ("Logistiker/in EFZ", vec![Business, Technical]),
        // Healthcare
        ("Fachmann/-frau Gesundheit EFZ", vec![Health, Social]),
        ("Medizinische/r Praxisassistent/in EFZ", vec![Health, Social]),
        ("Fachmann/-frau Apotheke EFZ", vec![Health, Business]),
        ("Tierpfleger/in EFZ", vec![Health, Nature]),
        // Gastronomy & Service
        ("Koch/Köchin EFZ", vec![Creative, Social]),
        ("Restaurantfachmann/-frau EFZ", vec![Social, Business]),
        // Creative & Design
        ("Grafiker/in EFZ", vec![Creative, Technical]),
        ("Polydesigner/in 3D EFZ", vec![Creative, Technical]),
        // Construction & Crafts
        ("Maurer/in EFZ", vec![Technical, Nature]),
        ("Zimmermann/Zimmerin EFZ", vec![Technical, Creative]),
        ("Elektroplaner/in EFZ", vec![Technical, Business]),
        ("Heizungsinstallateur/in EFZ", vec![Technical]),
        ("Metallbauer/in EFZ", vec![Technical, Creative]),
        ("Strassenbauer/in EFZ", vec![Technical, Nature]),
        // Nature & Environment
        ("Landwirt/in EFZ", vec![Nature, Technical]),
        ("Gärtner/in EFZ", vec![Nature, Creative]),
        ("Forstwart/in EFZ", vec![Nature, Sports]),
        // Finance & Administration
        ("Kaufmann/-frau EFZ Bank", vec![Business, Technical]),
        ("Kaufmann/-frau EFZ Treuhand", vec![Business, Technical]),
        // Sports & Fitness
        ("Sportfachmann/-frau EFZ", vec![Sports, Social]),
        // Other
        ("Fachmann/-frau Betriebsunterhalt EFZ", vec![Technical, Nature]),
        ("Müller/in EFZ", vec![Technical, Nature]),
    ])
}

/// Interest match for a profession: mean of the user's 1-5 ratings over the
/// profession's categories, normalized to [0,1]. Unknown professions score a
/// neutral 0.5.
pub fn interest_match(interests: &HashMap<InterestCategory, u8>, profession: &str) -> f64 {
    let map = profession_interest_map();

    let Some(categories) = map.get(profession) else {
        return 0.5;
    };
    if categories.is_empty() {
        return 0.5;
    }

    let total: f64 = categories
        .iter()
        .map(|c| interests.get(c).copied().unwrap_or(0) as f64)
        .sum();

    (total / categories.len() as f64 / 5.0).min(1.0)
}

/// Sector label -> lowercase keywords found in profession/company text
pub fn sector_keywords() -> HashMap<&'static str, Vec<&'static str>> {
    HashMap::from([
        ("gastronomy", vec!["koch", "restaurant", "hotel", "gastronomie", "service"]),
        ("retail", vec!["detailhandel", "verkauf", "laden", "shop"]),
        ("construction", vec!["bau", "maurer", "zimmermann", "installation"]),
        ("finance", vec!["bank", "versicherung", "finanzen"]),
        ("manufacturing", vec!["produktion", "fertigung", "fabrik"]),
        ("healthcare", vec!["gesundheit", "pflege", "medizin", "spital"]),
        ("it", vec!["informatik", "software", "computer"]),
        ("education", vec!["schule", "bildung", "ausbildung"]),
    ])
}

/// Check whether a posting falls into any of the user's avoided sectors
pub fn is_in_avoided_sector(posting: &Posting, avoid_sectors: &[String]) -> bool {
    let profession = posting.profession_or_title().to_lowercase();
    let company = posting
        .company_name
        .as_deref()
        .unwrap_or("")
        .to_lowercase();

    let keywords_by_sector = sector_keywords();

    avoid_sectors.iter().any(|sector| {
        keywords_by_sector
            .get(sector.as_str())
            .map(|keywords| {
                keywords
                    .iter()
                    .any(|kw| profession.contains(kw) || company.contains(kw))
            })
            .unwrap_or(false)
    })
}

/// Company-name keyword lists used to estimate company size
fn size_indicators() -> [(CompanySize, Vec<&'static str>); 3] {
    [
        (
            CompanySize::Small,
            vec!["gmbh", "ag", "einzelunternehmen", "praxis", "kanzlei"],
        ),
        (CompanySize::Medium, vec!["gruppe", "holding", "corporation"]),
        (
            CompanySize::Large,
            vec!["bank", "versicherung", "konzern", "international", "schweiz ag", "suisse"],
        ),
    ]
}

/// Estimate company size from the name; defaults to medium
pub fn estimate_company_size(company_name: &str) -> CompanySize {
    let lower = company_name.to_lowercase();

    for (size, indicators) in size_indicators() {
        if indicators.iter().any(|ind| lower.contains(ind)) {
            return size;
        }
    }

    CompanySize::Medium
}

/// Adjacency table for company sizes: small<->medium, medium<->large
pub fn sizes_compatible(preferred: CompanySize, estimated: CompanySize) -> bool {
    matches!(
        (preferred, estimated),
        (CompanySize::Small, CompanySize::Medium)
            | (CompanySize::Medium, CompanySize::Small)
            | (CompanySize::Medium, CompanySize::Large)
            | (CompanySize::Large, CompanySize::Medium)
    )
}

/// Infer the work environment from profession and description text
pub fn estimate_work_environment(profession: &str, description: &str) -> WorkEnvironment {
    let text = format!("{} {}", profession, description).to_lowercase();

    let office = ["büro", "office", "verwaltung", "computer"];
    let field = ["draussen", "outdoor", "bau", "garten", "strasse"];
    let workshop = ["werkstatt", "labor", "küche", "produktion"];

    if office.iter().any(|w| text.contains(w)) {
        WorkEnvironment::Office
    } else if field.iter().any(|w| text.contains(w)) {
        WorkEnvironment::Field
    } else if workshop.iter().any(|w| text.contains(w)) {
        WorkEnvironment::Workshop
    } else {
        WorkEnvironment::Mixed
    }
}

/// Infer whether a posting leans toward team or individual work
pub fn estimate_team_requirement(profession: &str, description: &str) -> TeamRequirement {
    let text = format!("{} {}", profession, description).to_lowercase();

    let team = ["team", "gruppe", "zusammenarbeit", "projekt"];
    let individual = ["selbständig", "eigenverantwortung", "individual"];

    if team.iter().any(|w| text.contains(w)) {
        TeamRequirement::Team
    } else if individual.iter().any(|w| text.contains(w)) {
        TeamRequirement::Individual
    } else {
        TeamRequirement::Mixed
    }
}

/// All profession labels known to the interest map, for suggestion endpoints
pub fn known_professions() -> Vec<&'static str> {
    let mut labels: Vec<&'static str> = profession_interest_map().keys().copied().collect();
    labels.sort_unstable();
    labels
}

/// Convenience for sector checks outside scoring
pub fn matches_avoided_sectors(profile: &UserProfile, posting: &Posting) -> bool {
    !profile.avoid_sectors.is_empty() && is_in_avoided_sector(posting, &profile.avoid_sectors)
}
