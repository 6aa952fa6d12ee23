use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for stored applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reviewer sign-off attached to a field or document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VerificationStatus {
    pub is_verified: bool,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
}

/// A submitted value together with its verification status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verified<T> {
    pub value: T,
    #[serde(default)]
    pub verification: VerificationStatus,
}

impl<T> Verified<T> {
    pub fn unverified(value: T) -> Self {
        Self {
            value,
            verification: VerificationStatus::default(),
        }
    }
}

/// A document held by the media host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub url: String,
    pub public_id: String,
    #[serde(default)]
    pub verification: VerificationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Engineering branches accepted by the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Branch {
    Electrical,
    Mechanical,
    #[serde(rename = "CSE")]
    Cse,
    Civil,
    Electronics,
}

impl Branch {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "electrical" => Some(Self::Electrical),
            "mechanical" => Some(Self::Mechanical),
            "cse" => Some(Self::Cse),
            "civil" => Some(Self::Civil),
            "electronics" => Some(Self::Electronics),
            _ => None,
        }
    }
}

/// Review outcome tracked on each application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

/// Named upload slots on the application form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentSlot {
    Resume,
    IdCard,
    CgpaProof,
    SscProof,
    HscProof,
}

impl DocumentSlot {
    pub const ALL: [DocumentSlot; 5] = [
        DocumentSlot::Resume,
        DocumentSlot::IdCard,
        DocumentSlot::CgpaProof,
        DocumentSlot::SscProof,
        DocumentSlot::HscProof,
    ];

    pub const fn field_name(self) -> &'static str {
        match self {
            DocumentSlot::Resume => "resume",
            DocumentSlot::IdCard => "idCard",
            DocumentSlot::CgpaProof => "cgpaProof",
            DocumentSlot::SscProof => "sscProof",
            DocumentSlot::HscProof => "hscProof",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.field_name() == name)
    }
}

impl fmt::Display for DocumentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Stored job application. Field names serialize in camelCase to match the intake form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: ApplicationId,

    pub reg: Verified<String>,
    pub full_name: Verified<String>,
    pub email: Verified<String>,
    pub phone: Verified<String>,
    pub cgpa: Verified<f32>,
    pub dob: Verified<NaiveDate>,
    pub gender: Verified<Gender>,
    pub ssc: Verified<f32>,
    pub hsc: Verified<f32>,
    pub projects: Verified<String>,
    pub internship: Verified<String>,
    pub branch: Verified<Branch>,
    pub address: Verified<String>,
    pub skills: Verified<String>,
    pub references: Verified<String>,

    pub caste: String,
    pub gap_years: String,
    pub career_plans: String,
    pub ssc_school: String,
    pub hsc_school: String,
    pub work_experience: String,
    pub elective_subjects: String,
    pub communication_languages: String,
    pub research: String,
    pub preferred_location: String,
    pub notice_period: String,
    pub expected_salary: String,
    pub current_salary: String,
    pub availability: String,
    pub hobbies: String,
    pub extra_curricular_activities: String,
    pub patents: String,
    pub professional_memberships: String,
    pub languages_known: String,
    pub marital_status: String,
    pub nationality: String,
    pub passport_number: String,
    pub visa_status: String,
    pub driving_license: String,
    pub disability: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certifications: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workshops: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awards: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<Proof>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_card: Option<Proof>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cgpa_proof: Option<Proof>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssc_proof: Option<Proof>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hsc_proof: Option<Proof>,

    #[serde(default)]
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

impl JobApplication {
    pub fn proof(&self, slot: DocumentSlot) -> Option<&Proof> {
        match slot {
            DocumentSlot::Resume => self.resume.as_ref(),
            DocumentSlot::IdCard => self.id_card.as_ref(),
            DocumentSlot::CgpaProof => self.cgpa_proof.as_ref(),
            DocumentSlot::SscProof => self.ssc_proof.as_ref(),
            DocumentSlot::HscProof => self.hsc_proof.as_ref(),
        }
    }

    pub fn proof_mut(&mut self, slot: DocumentSlot) -> &mut Option<Proof> {
        match slot {
            DocumentSlot::Resume => &mut self.resume,
            DocumentSlot::IdCard => &mut self.id_card,
            DocumentSlot::CgpaProof => &mut self.cgpa_proof,
            DocumentSlot::SscProof => &mut self.ssc_proof,
            DocumentSlot::HscProof => &mut self.hsc_proof,
        }
    }

    /// Stored documents in slot order.
    pub fn proofs(&self) -> impl Iterator<Item = (DocumentSlot, &Proof)> + '_ {
        DocumentSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.proof(slot).map(|proof| (slot, proof)))
    }

    /// Resolve a form field name to its verification record.
    ///
    /// Returns `None` for fields that carry no verification metadata and for empty document slots.
    pub fn verification_mut(&mut self, field: &str) -> Option<&mut VerificationStatus> {
        if let Some(slot) = DocumentSlot::from_field_name(field) {
            return self
                .proof_mut(slot)
                .as_mut()
                .map(|proof| &mut proof.verification);
        }

        let verification = match field {
            "reg" => &mut self.reg.verification,
            "fullName" => &mut self.full_name.verification,
            "email" => &mut self.email.verification,
            "phone" => &mut self.phone.verification,
            "cgpa" => &mut self.cgpa.verification,
            "dob" => &mut self.dob.verification,
            "gender" => &mut self.gender.verification,
            "ssc" => &mut self.ssc.verification,
            "hsc" => &mut self.hsc.verification,
            "projects" => &mut self.projects.verification,
            "internship" => &mut self.internship.verification,
            "branch" => &mut self.branch.verification,
            "address" => &mut self.address.verification,
            "skills" => &mut self.skills.verification,
            "references" => &mut self.references.verification,
            _ => return None,
        };
        Some(verification)
    }
}
