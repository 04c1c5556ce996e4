use crate::models::{Match, MatchRow, MatchStatus, MatchedMentee, MentorMatches};

impl MatchStatus {
    /// Derive the lifecycle stage from a match's timestamps
    pub fn of(pairing: &Match) -> Self {
        if pairing.completed_on.is_some() {
            MatchStatus::Completed
        } else if pairing.notified_on.is_some() {
            MatchStatus::Married
        } else {
            MatchStatus::Engaged
        }
    }
}

/// Which matches to show: a match is married once the pair was notified
/// and completed once the mentoring ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchFilter {
    pub married: bool,
    pub completed: bool,
}

impl MatchFilter {
    pub const ENGAGEMENTS: MatchFilter = MatchFilter { married: false, completed: false };
    pub const MARRIAGES: MatchFilter = MatchFilter { married: true, completed: false };
    pub const COMPLETIONS: MatchFilter = MatchFilter { married: true, completed: true };

    #[inline]
    pub fn accepts(&self, pairing: &Match) -> bool {
        pairing.notified_on.is_some() == self.married
            && pairing.completed_on.is_some() == self.completed
    }
}

/// Group matches under their mentor, in the order mentors first appear
pub fn group_by_mentor(rows: &[MatchRow], filter: MatchFilter) -> Vec<MentorMatches> {
    let mut groups: Vec<MentorMatches> = Vec::new();

    for row in rows.iter().filter(|row| filter.accepts(&row.pairing)) {
        let mentee = MatchedMentee {
            match_id: row.pairing.match_id,
            mentee_id: row.pairing.mentee_id,
            mentee_username: row.mentee_username.clone(),
            status: MatchStatus::of(&row.pairing),
            matched_on: row.pairing.matched_on,
            notified_on: row.pairing.notified_on,
            completed_on: row.pairing.completed_on,
        };

        match groups.iter_mut().find(|g| g.mentor_id == row.pairing.mentor_id) {
            Some(group) => group.mentees.push(mentee),
            None => groups.push(MentorMatches {
                mentor_id: row.pairing.mentor_id,
                mentor_username: row.mentor_username.clone(),
                mentees: vec![mentee],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(match_id: i64, mentor_id: i64, mentee_id: i64, married: bool, completed: bool) -> MatchRow {
        let now = Utc::now();
        MatchRow {
            pairing: Match {
                match_id,
                mentor_id,
                mentee_id,
                matched_on: now,
                notified_on: married.then_some(now),
                completed_on: completed.then_some(now),
            },
            mentor_username: format!("mentor{}", mentor_id),
            mentee_username: format!("mentee{}", mentee_id),
        }
    }

    #[test]
    fn test_status_from_timestamps() {
        assert_eq!(MatchStatus::of(&row(1, 1, 1, false, false).pairing), MatchStatus::Engaged);
        assert_eq!(MatchStatus::of(&row(1, 1, 1, true, false).pairing), MatchStatus::Married);
        assert_eq!(MatchStatus::of(&row(1, 1, 1, true, true).pairing), MatchStatus::Completed);
    }

    #[test]
    fn test_group_by_mentor_keeps_first_seen_order() {
        let rows = vec![
            row(1, 2, 10, false, false),
            row(2, 1, 11, false, false),
            row(3, 2, 12, false, false),
            row(4, 1, 13, true, false),
        ];

        let groups = group_by_mentor(&rows, MatchFilter::ENGAGEMENTS);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].mentor_id, 2);
        assert_eq!(groups[0].mentor_username, "mentor2");
        let mentees: Vec<i64> = groups[0].mentees.iter().map(|m| m.mentee_id).collect();
        assert_eq!(mentees, vec![10, 12]);
        assert_eq!(groups[1].mentees.len(), 1);
    }

    #[test]
    fn test_filters() {
        let rows = vec![
            row(1, 1, 10, false, false),
            row(2, 1, 11, true, false),
            row(3, 1, 12, true, true),
        ];

        let marriages = group_by_mentor(&rows, MatchFilter::MARRIAGES);
        let completions = group_by_mentor(&rows, MatchFilter::COMPLETIONS);

        assert_eq!(marriages[0].mentees[0].match_id, 2);
        assert_eq!(marriages[0].mentees[0].status, MatchStatus::Married);
        assert_eq!(completions[0].mentees.len(), 1);
        assert_eq!(completions[0].mentees[0].status, MatchStatus::Completed);
    }
}
