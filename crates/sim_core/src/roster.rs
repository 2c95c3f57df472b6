//! Synthetic students for stop visits.
//!
//! The backend does not hand the driver a manifest, so each visit invents its
//! own ids. The action comes from the trip direction.

use rand::Rng;

use crate::model::{StudentEvent, TripDirection};

/// `count` boarding or alighting events for one stop visit.
pub fn student_events<R: Rng + ?Sized>(
    count: usize,
    direction: TripDirection,
    rng: &mut R,
) -> Vec<StudentEvent> {
    let action = direction.student_action();
    (0..count)
        .map(|i| StudentEvent {
            student_id: format!("student_{i}_{}", rng.gen_range(1000..=9999)),
            action,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::model::StudentAction;

    #[test]
    fn events_follow_direction() {
        let mut rng = StdRng::seed_from_u64(3);
        let outbound = student_events(4, TripDirection::Outbound, &mut rng);
        assert_eq!(outbound.len(), 4);
        assert!(outbound.iter().all(|e| e.action == StudentAction::Pickup));

        let inbound = student_events(2, TripDirection::Inbound, &mut rng);
        assert!(inbound.iter().all(|e| e.action == StudentAction::Dropoff));
    }

    #[test]
    fn ids_are_indexed_with_four_digit_suffix() {
        let mut rng = StdRng::seed_from_u64(11);
        for (i, event) in student_events(5, TripDirection::Outbound, &mut rng)
            .iter()
            .enumerate()
        {
            let prefix = format!("student_{i}_");
            let suffix = event
                .student_id
                .strip_prefix(&prefix)
                .expect("indexed prefix");
            let n: u32 = suffix.parse().expect("numeric suffix");
            assert!((1000..=9999).contains(&n));
        }
    }
}
