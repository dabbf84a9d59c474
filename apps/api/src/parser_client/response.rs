use serde::{Deserialize, Serialize};

use super::ParseError;
use crate::models::profile::{DateRange, Education, Experience};
use crate::storage::BlobRef;

/// Body returned by the resume parsing service. Every field may be missing or
/// null; nothing here is trusted until [`ParserResponse::validate`] runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserResponse {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Option<Vec<String>>,
    pub education: Option<Vec<WireEducation>>,
    pub experience: Option<Vec<WireExperience>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireEducation {
    pub name: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireExperience {
    pub name: Option<String>,
    pub url: Option<String>,
    pub dates: Option<Vec<String>>,
}

/// One successful parse of one stored resume.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResume {
    pub source: BlobRef,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ParserResponse {
    /// Normalizes the response: trims strings, drops blank skills and
    /// nameless entries. A response with nothing resume-like left is an
    /// invalid document.
    pub fn validate(self, source: BlobRef) -> Result<ParsedResume, ParseError> {
        let skills: Vec<String> = self
            .skills
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| clean(Some(s)))
            .collect();

        let education: Vec<Education> = self
            .education
            .unwrap_or_default()
            .into_iter()
            .filter_map(|e| {
                Some(Education {
                    institution: clean(e.name)?,
                    source_url: clean(e.url),
                })
            })
            .collect();

        let experience: Vec<Experience> = self
            .experience
            .unwrap_or_default()
            .into_iter()
            .filter_map(|e| {
                let mut dates = e
                    .dates
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|d| clean(Some(d)));
                Some(Experience {
                    employer: clean(e.name)?,
                    source_url: clean(e.url),
                    date_range: DateRange {
                        start: dates.next(),
                        end: dates.next(),
                    },
                })
            })
            .collect();

        let parsed = ParsedResume {
            source,
            name: clean(self.name),
            email: clean(self.email),
            phone: clean(self.phone),
            skills,
            education,
            experience,
        };

        if parsed.name.is_none()
            && parsed.email.is_none()
            && parsed.skills.is_empty()
            && parsed.education.is_empty()
            && parsed.experience.is_empty()
        {
            return Err(ParseError::InvalidDocument(
                "parser found no resume content in the document".to_string(),
            ));
        }

        Ok(parsed)
    }
}
