use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use guest_seating::attendance::{resolve_count, resolve_status, AttendanceStatus, AttendanceSummary};
use guest_seating::models::{Guest, Honorific, ManualOverride, Rsvp};

fn guest(
    max_attendees: i32,
    manual: Option<(bool, Option<i32>)>,
    rsvp: Option<(Option<bool>, Option<i32>)>,
) -> Guest {
    let now = Utc::now();
    Guest {
        id: 1,
        event_id: 1,
        unique_id: Uuid::new_v4(),
        name: "Kowalski".to_string(),
        honorific: Honorific::Unspecified,
        email: None,
        phone_number: None,
        invitation_method: None,
        max_attendees,
        manual_override: manual.map(|(attending, count)| ManualOverride { attending, count }),
        rsvp: rsvp.map(|(attending, number_attending)| Rsvp {
            guest_id: 1,
            attending,
            number_attending,
            meal_preference: None,
            message: None,
            submitted_at: now,
            updated_at: now,
        }),
    }
}

fn manual_strategy() -> impl Strategy<Value = Option<(bool, Option<i32>)>> {
    proptest::option::of((any::<bool>(), proptest::option::of(-5i32..20)))
}

fn rsvp_strategy() -> impl Strategy<Value = Option<(Option<bool>, Option<i32>)>> {
    proptest::option::of((
        proptest::option::of(any::<bool>()),
        proptest::option::of(-5i32..20),
    ))
}

proptest! {
    #[test]
    fn resolved_count_stays_within_invitation(
        max in 1i32..12,
        manual in manual_strategy(),
        rsvp in rsvp_strategy(),
    ) {
        let g = guest(max, manual, rsvp);
        prop_assert!(resolve_count(&g) <= max as u32);
    }

    #[test]
    fn only_attending_guests_take_seats(
        max in 1i32..12,
        manual in manual_strategy(),
        rsvp in rsvp_strategy(),
    ) {
        let g = guest(max, manual, rsvp);
        if resolve_status(&g) != AttendanceStatus::Attending {
            prop_assert_eq!(resolve_count(&g), 0);
        }
    }

    #[test]
    fn manual_override_ignores_rsvp(
        max in 1i32..12,
        attending in any::<bool>(),
        count in proptest::option::of(0i32..12),
        first in rsvp_strategy(),
        second in rsvp_strategy(),
    ) {
        let a = guest(max, Some((attending, count)), first);
        let b = guest(max, Some((attending, count)), second);

        prop_assert_eq!(resolve_status(&a), resolve_status(&b));
        prop_assert_eq!(resolve_count(&a), resolve_count(&b));
        prop_assert_eq!(resolve_status(&a) == AttendanceStatus::Attending, attending);
    }

    #[test]
    fn summary_partitions_the_guest_list(
        inputs in proptest::collection::vec((1i32..6, manual_strategy(), rsvp_strategy()), 0..30),
    ) {
        let guests: Vec<Guest> = inputs
            .into_iter()
            .map(|(max, manual, rsvp)| guest(max, manual, rsvp))
            .collect();
        let summary = AttendanceSummary::from_guests(&guests);

        prop_assert_eq!(summary.total_guests, guests.len());
        prop_assert_eq!(
            summary.confirmed_guests + summary.declined_guests + summary.pending_guests,
            guests.len()
        );
        let total: u32 = guests.iter().map(resolve_count).sum();
        prop_assert_eq!(summary.total_attending, total);
    }
}
