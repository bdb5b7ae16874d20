use serde::Serialize;
use uuid::Uuid;

use crate::models::Friendship;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_ACCEPTED: &str = "accepted";

/// The relationship between the viewer and another user, as the client sees
/// it. Derived from the single pair row, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    None,
    Sent,
    Received,
    Friends,
}

/// Order a user pair into its canonical (lo, hi) storage form.
pub fn normalize_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a.as_bytes() <= b.as_bytes() {
        (a, b)
    } else {
        (b, a)
    }
}

/// Derive the viewer-relative relation from the pair row (if any).
pub fn derive_relation(viewer: Uuid, row: Option<&Friendship>) -> Relation {
    match row {
        None => Relation::None,
        Some(f) if f.status == STATUS_ACCEPTED => Relation::Friends,
        Some(f) if f.requested_by == viewer => Relation::Sent,
        Some(_) => Relation::Received,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(lo: Uuid, hi: Uuid, requested_by: Uuid, status: &str) -> Friendship {
        Friendship {
            id: Uuid::now_v7(),
            user_lo: lo,
            user_hi: hi,
            requested_by,
            status: status.to_string(),
            created_at: Utc::now(),
            responded_at: None,
        }
    }

    #[test]
    fn pair_normalization_is_order_independent() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        assert_eq!(normalize_pair(a, b), normalize_pair(b, a));

        let (lo, hi) = normalize_pair(a, b);
        assert!(lo.as_bytes() <= hi.as_bytes());
    }

    #[test]
    fn normalizing_identical_ids_is_stable() {
        let a = Uuid::now_v7();
        assert_eq!(normalize_pair(a, a), (a, a));
    }

    #[test]
    fn no_row_means_no_relation() {
        assert_eq!(derive_relation(Uuid::now_v7(), None), Relation::None);
    }

    #[test]
    fn pending_is_sent_for_requester_and_received_for_recipient() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let (lo, hi) = normalize_pair(a, b);
        let f = row(lo, hi, a, STATUS_PENDING);

        assert_eq!(derive_relation(a, Some(&f)), Relation::Sent);
        assert_eq!(derive_relation(b, Some(&f)), Relation::Received);
    }

    #[test]
    fn accepted_is_symmetric() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let (lo, hi) = normalize_pair(a, b);
        let f = row(lo, hi, a, STATUS_ACCEPTED);

        assert_eq!(derive_relation(a, Some(&f)), Relation::Friends);
        assert_eq!(derive_relation(b, Some(&f)), Relation::Friends);
    }
}
