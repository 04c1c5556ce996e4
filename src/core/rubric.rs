/// Answer meaning "no preference" on preference questions
pub const NO_PREFERENCE: &str = "-1";
/// Field-of-study preference: pair within the same field
pub const WITHIN_FIELD: &str = "within";
/// Field-of-study preference: pair across different fields
pub const OUTSIDE_FIELD: &str = "outside";

/// How well two stated preferences agree with each other and with the facts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agreement {
    /// Both sides asked for it and the pair satisfies it
    Mutual,
    /// Neither side cares, or one side asked for it, the other doesn't care,
    /// and the pair satisfies it
    Partial,
    None,
}

/// True when one preference is `wanted` and the other is "no preference"
#[inline]
fn one_wants_other_indifferent(a: &str, b: &str, wanted: &str) -> bool {
    (a == wanted && b == NO_PREFERENCE) || (a == NO_PREFERENCE && b == wanted)
}

/// Agreement on field-of-study preferences
#[inline]
pub fn field_of_study_agreement(
    mentee_pref: &str,
    mentor_pref: &str,
    same_field: bool,
) -> Agreement {
    if mentee_pref == mentor_pref && mentee_pref == WITHIN_FIELD && same_field {
        Agreement::Mutual
    } else if mentee_pref == mentor_pref && mentee_pref == OUTSIDE_FIELD && !same_field {
        Agreement::Mutual
    } else if mentee_pref == NO_PREFERENCE && mentor_pref == NO_PREFERENCE {
        Agreement::Partial
    } else if one_wants_other_indifferent(mentee_pref, mentor_pref, WITHIN_FIELD) && same_field {
        Agreement::Partial
    } else if one_wants_other_indifferent(mentee_pref, mentor_pref, OUTSIDE_FIELD) && !same_field {
        Agreement::Partial
    } else {
        Agreement::None
    }
}

/// Agreement on gender preferences
///
/// A preference names the gender the respondent wants their counterpart to
/// have. It is satisfied when mentee and mentor both have that gender.
#[inline]
pub fn gender_agreement(
    mentee_pref: &str,
    mentor_pref: &str,
    mentee_gender: &str,
    mentor_gender: &str,
) -> Agreement {
    let same_gender = mentee_gender == mentor_gender;

    if mentee_pref == mentor_pref
        && mentee_pref != NO_PREFERENCE
        && same_gender
        && mentee_gender == mentee_pref
    {
        return Agreement::Mutual;
    }

    if mentee_pref == NO_PREFERENCE && mentor_pref == NO_PREFERENCE {
        return Agreement::Partial;
    }

    // Exactly one side stated a gender; it counts when both share it
    let stated = if mentee_pref == NO_PREFERENCE { mentor_pref } else { mentee_pref };
    if one_wants_other_indifferent(mentee_pref, mentor_pref, stated)
        && same_gender
        && mentee_gender == stated
    {
        return Agreement::Partial;
    }

    Agreement::None
}

/// The mentor can give at least as much time as the mentee wants
#[inline]
pub fn availability_satisfied(mentee_availability: i64, mentor_availability: i64) -> bool {
    mentor_availability >= mentee_availability
}

#[inline]
pub fn skill_qualifies(level: i64, threshold: i64) -> bool {
    level >= threshold
}

/// Interests both respondents ticked, sorted and de-duplicated
pub fn shared_interests(a: &[String], b: &[String]) -> Vec<String> {
    let mut shared: Vec<String> = a.iter().filter(|v| b.contains(v)).cloned().collect();
    shared.sort();
    shared.dedup();
    shared
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_of_study_mutual() {
        assert_eq!(field_of_study_agreement("within", "within", true), Agreement::Mutual);
        assert_eq!(field_of_study_agreement("outside", "outside", false), Agreement::Mutual);
    }

    #[test]
    fn test_field_of_study_unsatisfied_mutual_wish() {
        assert_eq!(field_of_study_agreement("within", "within", false), Agreement::None);
        assert_eq!(field_of_study_agreement("outside", "outside", true), Agreement::None);
    }

    #[test]
    fn test_field_of_study_partial() {
        assert_eq!(field_of_study_agreement("-1", "-1", true), Agreement::Partial);
        assert_eq!(field_of_study_agreement("-1", "-1", false), Agreement::Partial);
        assert_eq!(field_of_study_agreement("within", "-1", true), Agreement::Partial);
        assert_eq!(field_of_study_agreement("-1", "outside", false), Agreement::Partial);
        assert_eq!(field_of_study_agreement("-1", "within", false), Agreement::None);
        assert_eq!(field_of_study_agreement("within", "outside", true), Agreement::None);
    }

    #[test]
    fn test_gender_mutual() {
        assert_eq!(gender_agreement("male", "male", "male", "male"), Agreement::Mutual);
        assert_eq!(gender_agreement("female", "female", "female", "female"), Agreement::Mutual);
        assert_eq!(gender_agreement("female", "female", "female", "male"), Agreement::None);
    }

    #[test]
    fn test_gender_partial() {
        assert_eq!(gender_agreement("-1", "-1", "male", "female"), Agreement::Partial);
        assert_eq!(gender_agreement("-1", "female", "female", "female"), Agreement::Partial);
        assert_eq!(gender_agreement("male", "-1", "male", "male"), Agreement::Partial);
        assert_eq!(gender_agreement("male", "-1", "female", "female"), Agreement::None);
        assert_eq!(gender_agreement("male", "female", "male", "male"), Agreement::None);
    }

    #[test]
    fn test_availability() {
        assert!(availability_satisfied(2, 2));
        assert!(availability_satisfied(1, 4));
        assert!(!availability_satisfied(4, 1));
    }

    #[test]
    fn test_shared_interests() {
        let a = vec!["chess".to_string(), "hiking".to_string(), "chess".to_string()];
        let b = vec!["hiking".to_string(), "chess".to_string(), "music".to_string()];

        assert_eq!(shared_interests(&a, &b), vec!["chess", "hiking"]);
        assert!(shared_interests(&a, &[]).is_empty());
    }
}
