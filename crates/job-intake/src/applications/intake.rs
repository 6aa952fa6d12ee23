use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use super::domain::{
    ApplicationId, ApplicationStatus, Branch, Gender, JobApplication, VerificationStatus,
    Verified,
};

/// Raw text fields as posted by the intake form.
///
/// Every field is optional at this layer; [`IntakeGuard`] decides which ones must be present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationForm {
    pub reg: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub cgpa: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub caste: Option<String>,
    pub gap_years: Option<String>,
    pub career_plans: Option<String>,
    pub ssc: Option<String>,
    pub ssc_school: Option<String>,
    pub hsc: Option<String>,
    pub hsc_school: Option<String>,
    pub branch: Option<String>,
    pub projects: Option<String>,
    pub internship: Option<String>,
    pub work_experience: Option<String>,
    pub skills: Option<String>,
    pub elective_subjects: Option<String>,
    pub communication_languages: Option<String>,
    pub references: Option<String>,
    pub research: Option<String>,
    pub certifications: Option<String>,
    pub workshops: Option<String>,
    pub achievements: Option<String>,
    pub linkedin_profile: Option<String>,
    pub github_profile: Option<String>,
    pub portfolio: Option<String>,
    pub preferred_location: Option<String>,
    pub notice_period: Option<String>,
    pub expected_salary: Option<String>,
    pub current_salary: Option<String>,
    pub availability: Option<String>,
    pub awards: Option<String>,
    pub hobbies: Option<String>,
    pub extra_curricular_activities: Option<String>,
    pub patents: Option<String>,
    pub professional_memberships: Option<String>,
    pub languages_known: Option<String>,
    pub marital_status: Option<String>,
    pub nationality: Option<String>,
    pub passport_number: Option<String>,
    pub visa_status: Option<String>,
    pub driving_license: Option<String>,
    pub disability: Option<String>,
    /// Reviewer sign-offs keyed by field name; only honored on update.
    #[serde(default)]
    pub verification_updates: BTreeMap<String, VerificationStatus>,
}

impl ApplicationForm {
    fn required_fields(&self) -> [(&'static str, Option<&str>); 40] {
        [
            ("reg", self.reg.as_deref()),
            ("fullName", self.full_name.as_deref()),
            ("email", self.email.as_deref()),
            ("phone", self.phone.as_deref()),
            ("cgpa", self.cgpa.as_deref()),
            ("dob", self.dob.as_deref()),
            ("gender", self.gender.as_deref()),
            ("address", self.address.as_deref()),
            ("caste", self.caste.as_deref()),
            ("gapYears", self.gap_years.as_deref()),
            ("careerPlans", self.career_plans.as_deref()),
            ("ssc", self.ssc.as_deref()),
            ("sscSchool", self.ssc_school.as_deref()),
            ("hsc", self.hsc.as_deref()),
            ("hscSchool", self.hsc_school.as_deref()),
            ("branch", self.branch.as_deref()),
            ("projects", self.projects.as_deref()),
            ("internship", self.internship.as_deref()),
            ("workExperience", self.work_experience.as_deref()),
            ("skills", self.skills.as_deref()),
            ("electiveSubjects", self.elective_subjects.as_deref()),
            ("communicationLanguages", self.communication_languages.as_deref()),
            ("references", self.references.as_deref()),
            ("research", self.research.as_deref()),
            ("preferredLocation", self.preferred_location.as_deref()),
            ("noticePeriod", self.notice_period.as_deref()),
            ("expectedSalary", self.expected_salary.as_deref()),
            ("currentSalary", self.current_salary.as_deref()),
            ("availability", self.availability.as_deref()),
            ("hobbies", self.hobbies.as_deref()),
            (
                "extraCurricularActivities",
                self.extra_curricular_activities.as_deref(),
            ),
            ("patents", self.patents.as_deref()),
            (
                "professionalMemberships",
                self.professional_memberships.as_deref(),
            ),
            ("languagesKnown", self.languages_known.as_deref()),
            ("maritalStatus", self.marital_status.as_deref()),
            ("nationality", self.nationality.as_deref()),
            ("passportNumber", self.passport_number.as_deref()),
            ("visaStatus", self.visa_status.as_deref()),
            ("drivingLicense", self.driving_license.as_deref()),
            ("disability", self.disability.as_deref()),
        ]
    }

    /// Names of required fields that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.required_fields()
            .into_iter()
            .filter(|(_, value)| is_blank(*value))
            .map(|(name, _)| name)
            .collect()
    }
}

/// Validation errors raised while turning a form into a record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntakeViolation {
    #[error("Please fill out the entire form!")]
    IncompleteForm { missing: Vec<&'static str> },
    #[error("Full Name Must Contain At Least 3 Characters!")]
    FullNameTooShort,
    #[error("Provide A Valid Email!")]
    InvalidEmail,
    #[error("Phone Number Must Contain At Least 10 Digits!")]
    PhoneTooShort,
    #[error("Phone Number Must Contain No More Than 15 Digits!")]
    PhoneTooLong,
    #[error("{label} Must Be A Number!")]
    NotANumber { label: &'static str },
    #[error("{label} Must Be At Least {min}!")]
    BelowMinimum { label: &'static str, min: f32 },
    #[error("{label} Must Be At Most {max}!")]
    AboveMaximum { label: &'static str, max: f32 },
    #[error("Date of Birth Must Be A Valid Date (YYYY-MM-DD)!")]
    InvalidDateOfBirth,
    #[error("`{value}` is not a valid enum value for path `gender`.")]
    InvalidGender { value: String },
    #[error("`{value}` is not a valid enum value for path `branch`.")]
    InvalidBranch { value: String },
}

const MIN_FULL_NAME_CHARS: usize = 3;
const MIN_PHONE_CHARS: usize = 10;
const MAX_PHONE_CHARS: usize = 15;
const CGPA_SCALE: f32 = 10.0;
const PERCENTAGE_SCALE: f32 = 100.0;

/// Guard responsible for producing validated [`JobApplication`] records from raw forms.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard;

impl IntakeGuard {
    pub fn new() -> Self {
        Self
    }

    /// Convert a complete form into a fresh record with unverified fields and no documents.
    pub fn application_from_form(
        &self,
        mut form: ApplicationForm,
        id: ApplicationId,
        created_at: DateTime<Utc>,
    ) -> Result<JobApplication, IntakeViolation> {
        let missing = form.missing_fields();
        if !missing.is_empty() {
            return Err(IntakeViolation::IncompleteForm { missing });
        }

        Ok(JobApplication {
            id,
            reg: Verified::unverified(take(&mut form.reg)),
            full_name: Verified::unverified(parse_full_name(&take(&mut form.full_name))?),
            email: Verified::unverified(parse_email(&take(&mut form.email))?),
            phone: Verified::unverified(parse_phone(&take(&mut form.phone))?),
            cgpa: Verified::unverified(parse_cgpa(&take(&mut form.cgpa))?),
            dob: Verified::unverified(parse_dob(&take(&mut form.dob))?),
            gender: Verified::unverified(parse_gender(&take(&mut form.gender))?),
            ssc: Verified::unverified(parse_percentage("SSC Percentage", &take(&mut form.ssc))?),
            hsc: Verified::unverified(parse_percentage("HSC Percentage", &take(&mut form.hsc))?),
            projects: Verified::unverified(take(&mut form.projects)),
            internship: Verified::unverified(take(&mut form.internship)),
            branch: Verified::unverified(parse_branch(&take(&mut form.branch))?),
            address: Verified::unverified(take(&mut form.address)),
            skills: Verified::unverified(take(&mut form.skills)),
            references: Verified::unverified(take(&mut form.references)),
            caste: take(&mut form.caste),
            gap_years: take(&mut form.gap_years),
            career_plans: take(&mut form.career_plans),
            ssc_school: take(&mut form.ssc_school),
            hsc_school: take(&mut form.hsc_school),
            work_experience: take(&mut form.work_experience),
            elective_subjects: take(&mut form.elective_subjects),
            communication_languages: take(&mut form.communication_languages),
            research: take(&mut form.research),
            preferred_location: take(&mut form.preferred_location),
            notice_period: take(&mut form.notice_period),
            expected_salary: take(&mut form.expected_salary),
            current_salary: take(&mut form.current_salary),
            availability: take(&mut form.availability),
            hobbies: take(&mut form.hobbies),
            extra_curricular_activities: take(&mut form.extra_curricular_activities),
            patents: take(&mut form.patents),
            professional_memberships: take(&mut form.professional_memberships),
            languages_known: take(&mut form.languages_known),
            marital_status: take(&mut form.marital_status),
            nationality: take(&mut form.nationality),
            passport_number: take(&mut form.passport_number),
            visa_status: take(&mut form.visa_status),
            driving_license: take(&mut form.driving_license),
            disability: take(&mut form.disability),
            linkedin_profile: take_optional(&mut form.linkedin_profile),
            github_profile: take_optional(&mut form.github_profile),
            portfolio: take_optional(&mut form.portfolio),
            certifications: take_optional(&mut form.certifications),
            workshops: take_optional(&mut form.workshops),
            achievements: take_optional(&mut form.achievements),
            awards: take_optional(&mut form.awards),
            resume: None,
            id_card: None,
            cgpa_proof: None,
            ssc_proof: None,
            hsc_proof: None,
            status: ApplicationStatus::default(),
            created_at,
        })
    }
}

pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |value| value.trim().is_empty())
}

fn take(slot: &mut Option<String>) -> String {
    take_optional(slot).unwrap_or_default()
}

/// Trimmed, non-blank value; blank input counts as absent.
pub(crate) fn take_optional(slot: &mut Option<String>) -> Option<String> {
    slot.take()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn parse_full_name(raw: &str) -> Result<String, IntakeViolation> {
    let name = raw.trim();
    if name.chars().count() < MIN_FULL_NAME_CHARS {
        return Err(IntakeViolation::FullNameTooShort);
    }
    Ok(name.to_string())
}

pub(crate) fn parse_email(raw: &str) -> Result<String, IntakeViolation> {
    let email = raw.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(IntakeViolation::InvalidEmail);
    };

    let local_ok = !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..");
    let domain_ok = domain.contains('.')
        && domain.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
    let tld_ok = domain.rsplit('.').next().is_some_and(is_top_level_label);
    let charset_ok = !email.chars().any(|c| c.is_whitespace() || c.is_control());

    if local_ok && domain_ok && tld_ok && charset_ok && !domain.contains('@') {
        Ok(email.to_string())
    } else {
        Err(IntakeViolation::InvalidEmail)
    }
}

/// Top-level labels are alphabetic and at least two letters long, or punycode.
fn is_top_level_label(label: &str) -> bool {
    let alphabetic = label.len() >= 2 && label.chars().all(|c| c.is_ascii_alphabetic());
    let punycode = label.len() > 4 && label.to_ascii_lowercase().starts_with("xn--");
    alphabetic || punycode
}

pub(crate) fn parse_phone(raw: &str) -> Result<String, IntakeViolation> {
    let phone = raw.trim();
    let length = phone.chars().count();
    if length < MIN_PHONE_CHARS {
        Err(IntakeViolation::PhoneTooShort)
    } else if length > MAX_PHONE_CHARS {
        Err(IntakeViolation::PhoneTooLong)
    } else {
        Ok(phone.to_string())
    }
}

fn parse_bounded(label: &'static str, raw: &str, max: f32) -> Result<f32, IntakeViolation> {
    let value = raw
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or(IntakeViolation::NotANumber { label })?;

    if value < 0.0 {
        return Err(IntakeViolation::BelowMinimum { label, min: 0.0 });
    }
    if value > max {
        return Err(IntakeViolation::AboveMaximum { label, max });
    }
    Ok(value)
}

pub(crate) fn parse_cgpa(raw: &str) -> Result<f32, IntakeViolation> {
    parse_bounded("CGPA", raw, CGPA_SCALE)
}

pub(crate) fn parse_percentage(label: &'static str, raw: &str) -> Result<f32, IntakeViolation> {
    parse_bounded(label, raw, PERCENTAGE_SCALE)
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part kept).
pub(crate) fn parse_dob(raw: &str) -> Result<NaiveDate, IntakeViolation> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|timestamp| timestamp.date_naive()))
        .map_err(|_| IntakeViolation::InvalidDateOfBirth)
}

pub(crate) fn parse_gender(raw: &str) -> Result<Gender, IntakeViolation> {
    Gender::parse(raw).ok_or_else(|| IntakeViolation::InvalidGender {
        value: raw.trim().to_string(),
    })
}

pub(crate) fn parse_branch(raw: &str) -> Result<Branch, IntakeViolation> {
    Branch::parse(raw).ok_or_else(|| IntakeViolation::InvalidBranch {
        value: raw.trim().to_string(),
    })
}
