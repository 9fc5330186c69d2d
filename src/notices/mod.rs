//! School notices. A seeded catalog for now; the schools feed is a later
//! integration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub date: String,
    pub is_read: bool,
    pub full_message: String,
}

pub fn notices() -> Vec<Notice> {
    vec![
        Notice {
            id: "1".to_string(),
            title: "School Holiday Announcement".to_string(),
            preview: "The school will be closed from 16-24 December for the holiday break."
                .to_string(),
            date: "15/12/2025".to_string(),
            is_read: true,
            full_message: "Dear Parents and Guardians,\n\nWe are pleased to inform you that the school will be closed from 16th December 2025 to 24th December 2025 for the holiday break. Regular classes will resume on 5th January 2026.\n\nPlease ensure your child has completed all homework before the break.\n\nBest regards,\nSchool Management".to_string(),
        },
        Notice {
            id: "2".to_string(),
            title: "Fee Payment Reminder".to_string(),
            preview: "Please ensure all outstanding fees are paid by 30th December 2025."
                .to_string(),
            date: "14/12/2025".to_string(),
            is_read: false,
            full_message: "Dear Parents and Guardians,\n\nThis is a friendly reminder to ensure that all outstanding school fees are settled by 30th December 2025.\n\nPayment methods:\n- Online Portal\n- Bank Transfer\n- Direct Deposit\n\nFor any queries, please contact the Finance Department.\n\nThank you,\nFinance Department".to_string(),
        },
        Notice {
            id: "3".to_string(),
            title: "Sports Day Results".to_string(),
            preview: "Congratulations to all participants in our annual sports day held on 14th December.".to_string(),
            date: "14/12/2025".to_string(),
            is_read: true,
            full_message: "We are delighted to announce the results of our Annual Sports Day held on 14th December 2025. All participants showed excellent sportsmanship and dedication.\n\nTop performers have been awarded certificates and medals. Winners will be announced at the upcoming assembly.\n\nCongratulations to all!".to_string(),
        },
        Notice {
            id: "4".to_string(),
            title: "Parent-Teacher Conference".to_string(),
            preview: "Parent-Teacher Conference scheduled for 8th January 2026.".to_string(),
            date: "10/12/2025".to_string(),
            is_read: false,
            full_message: "Dear Parents and Guardians,\n\nWe are pleased to invite you to our Parent-Teacher Conference on 8th January 2026 from 14:00 to 17:00.\n\nThis is an opportunity to discuss your child's academic progress and address any concerns.\n\nSlots are available for 15-minute meetings. Please register through the school portal.\n\nWe look forward to seeing you!".to_string(),
        },
    ]
}

pub fn find_notice(id: &str) -> Option<Notice> {
    notices().into_iter().find(|n| n.id == id)
}

pub fn unread_count() -> usize {
    notices().iter().filter(|n| !n.is_read).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_seeded() {
        assert_eq!(notices().len(), 4);
        assert_eq!(unread_count(), 2);
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(find_notice("2").unwrap().title, "Fee Payment Reminder");
        assert!(find_notice("99").is_none());
    }
}
