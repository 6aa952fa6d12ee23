use std::collections::BTreeMap;

use super::domain::{JobApplication, VerificationStatus};
use super::intake::{
    parse_branch, parse_cgpa, parse_dob, parse_email, parse_full_name, parse_gender,
    parse_percentage, parse_phone, take_optional, ApplicationForm, IntakeViolation,
};

/// Overlay the non-blank fields of `form` onto `application`.
///
/// Absent or blank fields keep their stored value. Replaced values pass through the same
/// constraints as intake; on error the record is left untouched. Verification metadata on
/// replaced fields is preserved, and `form.verification_updates` is ignored here.
pub fn apply_form(
    application: &mut JobApplication,
    mut form: ApplicationForm,
) -> Result<(), IntakeViolation> {
    let mut next = application.clone();

    if let Some(reg) = take_optional(&mut form.reg) {
        next.reg.value = reg;
    }
    if let Some(raw) = take_optional(&mut form.full_name) {
        next.full_name.value = parse_full_name(&raw)?;
    }
    if let Some(raw) = take_optional(&mut form.email) {
        next.email.value = parse_email(&raw)?;
    }
    if let Some(raw) = take_optional(&mut form.phone) {
        next.phone.value = parse_phone(&raw)?;
    }
    if let Some(raw) = take_optional(&mut form.cgpa) {
        next.cgpa.value = parse_cgpa(&raw)?;
    }
    if let Some(raw) = take_optional(&mut form.dob) {
        next.dob.value = parse_dob(&raw)?;
    }
    if let Some(raw) = take_optional(&mut form.gender) {
        next.gender.value = parse_gender(&raw)?;
    }
    if let Some(raw) = take_optional(&mut form.ssc) {
        next.ssc.value = parse_percentage("SSC Percentage", &raw)?;
    }
    if let Some(raw) = take_optional(&mut form.hsc) {
        next.hsc.value = parse_percentage("HSC Percentage", &raw)?;
    }
    if let Some(raw) = take_optional(&mut form.branch) {
        next.branch.value = parse_branch(&raw)?;
    }

    overlay(&mut next.projects.value, &mut form.projects);
    overlay(&mut next.internship.value, &mut form.internship);
    overlay(&mut next.address.value, &mut form.address);
    overlay(&mut next.skills.value, &mut form.skills);
    overlay(&mut next.references.value, &mut form.references);

    overlay(&mut next.caste, &mut form.caste);
    overlay(&mut next.gap_years, &mut form.gap_years);
    overlay(&mut next.career_plans, &mut form.career_plans);
    overlay(&mut next.ssc_school, &mut form.ssc_school);
    overlay(&mut next.hsc_school, &mut form.hsc_school);
    overlay(&mut next.work_experience, &mut form.work_experience);
    overlay(&mut next.elective_subjects, &mut form.elective_subjects);
    overlay(
        &mut next.communication_languages,
        &mut form.communication_languages,
    );
    overlay(&mut next.research, &mut form.research);
    overlay(&mut next.preferred_location, &mut form.preferred_location);
    overlay(&mut next.notice_period, &mut form.notice_period);
    overlay(&mut next.expected_salary, &mut form.expected_salary);
    overlay(&mut next.current_salary, &mut form.current_salary);
    overlay(&mut next.availability, &mut form.availability);
    overlay(&mut next.hobbies, &mut form.hobbies);
    overlay(
        &mut next.extra_curricular_activities,
        &mut form.extra_curricular_activities,
    );
    overlay(&mut next.patents, &mut form.patents);
    overlay(
        &mut next.professional_memberships,
        &mut form.professional_memberships,
    );
    overlay(&mut next.languages_known, &mut form.languages_known);
    overlay(&mut next.marital_status, &mut form.marital_status);
    overlay(&mut next.nationality, &mut form.nationality);
    overlay(&mut next.passport_number, &mut form.passport_number);
    overlay(&mut next.visa_status, &mut form.visa_status);
    overlay(&mut next.driving_license, &mut form.driving_license);
    overlay(&mut next.disability, &mut form.disability);

    overlay_optional(&mut next.linkedin_profile, &mut form.linkedin_profile);
    overlay_optional(&mut next.github_profile, &mut form.github_profile);
    overlay_optional(&mut next.portfolio, &mut form.portfolio);
    overlay_optional(&mut next.certifications, &mut form.certifications);
    overlay_optional(&mut next.workshops, &mut form.workshops);
    overlay_optional(&mut next.achievements, &mut form.achievements);
    overlay_optional(&mut next.awards, &mut form.awards);

    *application = next;
    Ok(())
}

fn overlay(target: &mut String, incoming: &mut Option<String>) {
    if let Some(value) = take_optional(incoming) {
        *target = value;
    }
}

fn overlay_optional(target: &mut Option<String>, incoming: &mut Option<String>) {
    if let Some(value) = take_optional(incoming) {
        *target = Some(value);
    }
}

/// Overwrite verification records named in `updates`.
///
/// Returns the names that were skipped because the field carries no verification metadata
/// (or names an empty document slot).
pub fn apply_verification_updates(
    application: &mut JobApplication,
    updates: BTreeMap<String, VerificationStatus>,
) -> Vec<String> {
    let mut skipped = Vec::new();
    for (field, update) in updates {
        match application.verification_mut(&field) {
            Some(verification) => *verification = update,
            None => skipped.push(field),
        }
    }
    skipped
}
