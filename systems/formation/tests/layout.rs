use glam::Vec2;
use mob_runner_system_formation::{
    ring_of, ring_size, slots_through_ring, FormationError, FormationLayout,
};

#[test]
fn ring_sizes_follow_hexagonal_growth() {
    assert_eq!(ring_size(0), 1);
    for ring in 1..20 {
        assert_eq!(ring_size(ring), 6 * ring as usize);
    }
}

#[test]
fn cumulative_slot_count_matches_closed_form() {
    let mut running = 0;
    for ring in 0..20u32 {
        running += ring_size(ring);
        let r = ring as usize;
        assert_eq!(slots_through_ring(ring), 1 + 3 * r * (r + 1));
        assert_eq!(slots_through_ring(ring), running);
    }
}

#[test]
fn table_size_covers_every_ring() {
    let layout = FormationLayout::new(9, 1.0);
    assert_eq!(layout.len(), slots_through_ring(9));
    assert_eq!(layout.rings(), 9);
    assert!(!layout.is_empty());
}

#[test]
fn every_slot_is_defined_and_unique() {
    let layout = FormationLayout::new(12, 1.0);
    let offsets: Vec<Vec2> = (0..layout.len())
        .map(|slot| layout.offset(slot).expect("slot inside table"))
        .collect();

    for (index, offset) in offsets.iter().enumerate() {
        for other in &offsets[index + 1..] {
            assert!(
                offset.distance(*other) > 0.5,
                "slot {index} duplicates another slot at {offset:?}"
            );
        }
    }
}

#[test]
fn slots_sit_on_their_ring() {
    let layout = FormationLayout::new(8, 1.0);
    for slot in 0..layout.len() {
        let ring = ring_of(slot) as f32;
        let distance = layout.offset(slot).expect("slot").length();
        // Hexagon edges sit between the inscribed and circumscribed radius.
        assert!(distance <= ring + 1e-4, "slot {slot} too far out");
        assert!(distance >= ring * 0.866 - 1e-4, "slot {slot} too close in");
    }
}

#[test]
fn spacing_scales_offsets() {
    let unit = FormationLayout::new(3, 1.0);
    let wide = FormationLayout::new(3, 2.5);
    for slot in 0..unit.len() {
        let expected = unit.offset(slot).expect("slot") * 2.5;
        assert!((wide.offset(slot).expect("slot") - expected).length() < 1e-4);
    }
}

#[test]
fn slots_beyond_the_table_are_configuration_errors() {
    let layout = FormationLayout::new(2, 1.0);
    assert_eq!(layout.offset(19), None);
    assert_eq!(
        layout.try_offset(19),
        Err(FormationError::SlotOutOfRange { slot: 19, len: 19 })
    );
    assert!(layout.ensure_fits(19).is_ok());
    assert_eq!(
        layout.ensure_fits(20),
        Err(FormationError::TooSmall {
            population: 20,
            len: 19
        })
    );
}
