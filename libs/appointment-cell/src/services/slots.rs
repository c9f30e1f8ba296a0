// libs/appointment-cell/src/services/slots.rs
use crate::models::TimeSlot;

pub const FIRST_HOUR: u32 = 8;
pub const LAST_HOUR: u32 = 16;
pub const SLOT_MINUTES: [u32; 2] = [0, 30];

/// The clinic's daily grid of half-hour booking marks.
pub struct SlotGrid;

impl SlotGrid {
    /// Every half hour from 08:00 through 16:00 inclusive, ascending. 16:30 is not bookable.
    pub fn canonical_slots() -> Vec<TimeSlot> {
        (FIRST_HOUR..=LAST_HOUR)
            .flat_map(|hour| SLOT_MINUTES.iter().map(move |&minute| (hour, minute)))
            .filter(|&(hour, minute)| !(hour == LAST_HOUR && minute == 30))
            .filter_map(|(hour, minute)| TimeSlot::new(hour, minute))
            .collect()
    }

    pub fn contains(slot: &TimeSlot) -> bool {
        slot.hour() >= FIRST_HOUR
            && slot.hour() <= LAST_HOUR
            && SLOT_MINUTES.contains(&slot.minute())
            && !(slot.hour() == LAST_HOUR && slot.minute() == 30)
    }
}
