//! Profile reconciliation — folds one parse into the canonical profile.
//!
//! Pure: no I/O, no clock. Rules:
//! - skills accumulate (existing order first, case-insensitive dedup, first
//!   spelling wins)
//! - education / experience are replaced by the new parse only when it found
//!   entries; an empty section never erases what we already knew
//! - the resume reference always moves to the blob that was just parsed

use std::collections::HashSet;

use crate::models::profile::Profile;
use crate::parser_client::ParsedResume;

pub fn merge(existing: Option<&Profile>, parsed: &ParsedResume) -> Profile {
    let previous_skills = existing.map(|p| p.skills.as_slice()).unwrap_or_default();
    let mut seen = HashSet::new();
    let skills = previous_skills
        .iter()
        .chain(parsed.skills.iter())
        .filter(|skill| seen.insert(skill.to_lowercase()))
        .cloned()
        .collect();

    let education = match existing {
        Some(profile) if parsed.education.is_empty() => profile.education.clone(),
        _ => parsed.education.clone(),
    };
    let experience = match existing {
        Some(profile) if parsed.experience.is_empty() => profile.experience.clone(),
        _ => parsed.experience.clone(),
    };

    Profile {
        applicant_id: parsed.source.applicant_id(),
        resume_ref: parsed.source.clone(),
        skills,
        education,
        experience,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{DateRange, Education, Experience};
    use crate::storage::BlobRef;
    use uuid::Uuid;

    fn parsed(applicant: Uuid, doc: &[u8], skills: &[&str]) -> ParsedResume {
        ParsedResume {
            source: BlobRef::for_content(applicant, doc),
            name: Some("Grace Hopper".into()),
            email: None,
            phone: None,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            education: vec![],
            experience: vec![],
        }
    }

    fn school(name: &str) -> Education {
        Education {
            institution: name.into(),
            source_url: None,
        }
    }

    fn job(name: &str) -> Experience {
        Experience {
            employer: name.into(),
            source_url: None,
            date_range: DateRange::default(),
        }
    }

    #[test]
    fn test_first_merge_creates_profile() {
        let applicant = Uuid::new_v4();
        let mut first = parsed(applicant, b"v1", &["COBOL", "cobol", "Fortran"]);
        first.education = vec![school("Yale")];

        let profile = merge(None, &first);

        assert_eq!(profile.applicant_id, applicant);
        assert_eq!(profile.resume_ref, first.source);
        assert_eq!(profile.skills, vec!["COBOL", "Fortran"]);
        assert_eq!(profile.education, vec![school("Yale")]);
    }

    #[test]
    fn test_skills_union_keeps_existing_first() {
        let applicant = Uuid::new_v4();
        let existing = merge(None, &parsed(applicant, b"v1", &["Rust", "SQL"]));

        let merged = merge(Some(&existing), &parsed(applicant, b"v2", &["sql", "Kafka", "rust"]));

        assert_eq!(merged.skills, vec!["Rust", "SQL", "Kafka"]);
    }

    #[test]
    fn test_skills_merge_is_idempotent() {
        let applicant = Uuid::new_v4();
        let update = parsed(applicant, b"v2", &["Go", "Docker"]);
        let existing = merge(None, &parsed(applicant, b"v1", &["Rust"]));

        let once = merge(Some(&existing), &update);
        let twice = merge(Some(&once), &update);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_sections_do_not_erase_history() {
        let applicant = Uuid::new_v4();
        let mut first = parsed(applicant, b"v1", &["Rust"]);
        first.education = vec![school("MIT")];
        first.experience = vec![job("Acme")];
        let existing = merge(None, &first);

        let merged = merge(Some(&existing), &parsed(applicant, b"v2", &["Go"]));

        assert_eq!(merged.education, vec![school("MIT")]);
        assert_eq!(merged.experience, vec![job("Acme")]);
        assert_eq!(merged.resume_ref, BlobRef::for_content(applicant, b"v2"));
    }

    #[test]
    fn test_non_empty_sections_replace_wholesale() {
        let applicant = Uuid::new_v4();
        let mut first = parsed(applicant, b"v1", &[]);
        first.education = vec![school("MIT"), school("Stanford")];
        first.experience = vec![job("Acme")];
        let existing = merge(None, &first);

        let mut second = parsed(applicant, b"v2", &[]);
        second.education = vec![school("Berkeley")];
        second.experience = vec![job("Initech"), job("Globex")];
        let merged = merge(Some(&existing), &second);

        assert_eq!(merged.education, vec![school("Berkeley")]);
        assert_eq!(merged.experience, vec![job("Initech"), job("Globex")]);
    }
}
