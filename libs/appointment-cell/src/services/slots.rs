//! Free-slot enumeration over a professional's weekly windows.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use professional_cell::models::{AvailabilityBlock, DayOfWeek};
use shared_config::AppConfig;

use crate::models::Appointment;
use crate::services::conflict::intervals_overlap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGrid {
    pub step_minutes: i64,
    /// Used only for professionals that never published availability.
    pub default_window: (NaiveTime, NaiveTime),
    /// Drop candidates whose end falls after the window's closing time.
    pub clip_to_window: bool,
}

impl SlotGrid {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            step_minutes: config.slot_step_minutes.max(1),
            default_window: (config.default_opening_time, config.default_closing_time),
            clip_to_window: config.clip_slots_to_window,
        }
    }
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Opening windows that apply on `date`.
///
/// A professional with no blocks at all gets the default window; one with
/// blocks on other weekdays only is closed that day.
pub fn windows_for_date(
    blocks: &[AvailabilityBlock],
    date: NaiveDate,
    grid: &SlotGrid,
) -> Vec<(NaiveTime, NaiveTime)> {
    if blocks.is_empty() {
        return vec![grid.default_window];
    }

    let day = DayOfWeek::from(date.weekday());
    blocks
        .iter()
        .filter(|b| b.day_of_week == day)
        .map(AvailabilityBlock::window)
        .collect()
}

/// Start times on `date` at which `duration_minutes` fits without touching an
/// active appointment, ascending and de-duplicated across windows.
pub fn enumerate_slots(
    date: NaiveDate,
    windows: &[(NaiveTime, NaiveTime)],
    duration_minutes: i32,
    existing: &[Appointment],
    grid: &SlotGrid,
) -> Vec<NaiveTime> {
    if duration_minutes <= 0 || grid.step_minutes <= 0 {
        return Vec::new();
    }

    let duration = Duration::minutes(duration_minutes as i64);
    let step = Duration::minutes(grid.step_minutes);
    let active: Vec<&Appointment> = existing.iter().filter(|a| a.status.is_active()).collect();
    let mut slots = BTreeSet::new();

    for &(opening, closing) in windows {
        let close_at = date.and_time(closing);
        let mut candidate = date.and_time(opening);

        while candidate < close_at {
            // Past chrono's last representable instant nothing fits.
            let Some(candidate_end) = candidate.checked_add_signed(duration) else {
                break;
            };
            if grid.clip_to_window && candidate_end > close_at {
                break;
            }

            let start = Utc.from_utc_datetime(&candidate);
            let end = Utc.from_utc_datetime(&candidate_end);
            let free = !active
                .iter()
                .any(|a| intervals_overlap(start, end, a.start_time, a.end_time()));

            if free {
                slots.insert(candidate.time());
            }
            candidate = match candidate.checked_add_signed(step) {
                Some(next) => next,
                None => break,
            };
        }
    }

    slots.into_iter().collect()
}

pub fn format_slot(slot: NaiveTime) -> String {
    slot.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use chrono::{DateTime, Timelike};
    use uuid::Uuid;

    // 2030-01-07 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(&monday().and_time(t(h, m)))
    }

    fn booked(start: DateTime<Utc>, minutes: i32, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            start_time: start,
            duration_minutes: minutes,
            status,
            reason: None,
            notes: None,
            price: 0,
            created_at: start,
            updated_at: start,
        }
    }

    fn labels(slots: &[NaiveTime]) -> Vec<String> {
        slots.iter().copied().map(format_slot).collect()
    }

    fn unclipped() -> SlotGrid {
        SlotGrid { clip_to_window: false, ..SlotGrid::default() }
    }

    #[test]
    fn confirmed_ten_to_eleven_blocks_overlapping_candidates() {
        let existing = vec![booked(at(10, 0), 60, AppointmentStatus::Confirmed)];
        let grid = SlotGrid::default();
        let slots = labels(&enumerate_slots(monday(), &[grid.default_window], 60, &existing, &grid));

        for blocked in ["09:30", "10:00", "10:30"] {
            assert!(!slots.contains(&blocked.to_string()), "{} should be blocked", blocked);
        }
        for free in ["08:00", "08:30", "09:00", "11:00", "11:30"] {
            assert!(slots.contains(&free.to_string()), "{} should be free", free);
        }
    }

    #[test]
    fn every_candidate_is_kept_or_dropped_by_overlap_alone() {
        let existing = vec![
            booked(at(9, 15), 45, AppointmentStatus::Pending),
            booked(at(13, 0), 90, AppointmentStatus::Confirmed),
        ];
        let grid = unclipped();
        let slots = enumerate_slots(monday(), &[grid.default_window], 30, &existing, &grid);

        let mut candidate = t(8, 0);
        while candidate < t(18, 0) {
            let start = at(candidate.hour(), candidate.minute());
            let end = start + Duration::minutes(30);
            let overlaps = existing.iter().any(|a| intervals_overlap(start, end, a.start_time, a.end_time()));
            assert_eq!(slots.contains(&candidate), !overlaps, "candidate {}", candidate);
            candidate += Duration::minutes(30);
        }
    }

    #[test]
    fn terminal_appointments_do_not_block() {
        let existing = vec![
            booked(at(10, 0), 60, AppointmentStatus::Cancelled),
            booked(at(11, 0), 60, AppointmentStatus::Completed),
        ];
        let grid = unclipped();
        let slots = enumerate_slots(monday(), &[grid.default_window], 60, &existing, &grid);
        assert_eq!(slots.len(), 20);
    }

    #[test]
    fn clipping_drops_slots_that_run_past_closing() {
        let window = [(t(8, 0), t(10, 0))];

        let clipped = enumerate_slots(monday(), &window, 60, &[], &SlotGrid::default());
        assert_eq!(labels(&clipped), vec!["08:00", "08:30", "09:00"]);

        let open_ended = enumerate_slots(monday(), &window, 60, &[], &unclipped());
        assert_eq!(labels(&open_ended), vec!["08:00", "08:30", "09:00", "09:30"]);
    }

    #[test]
    fn overlapping_windows_are_merged_in_order() {
        let windows = [(t(14, 0), t(16, 0)), (t(8, 0), t(9, 0)), (t(15, 0), t(17, 0))];
        let slots = enumerate_slots(monday(), &windows, 30, &[], &SlotGrid::default());
        assert_eq!(
            labels(&slots),
            vec!["08:00", "08:30", "14:00", "14:30", "15:00", "15:30", "16:00", "16:30"]
        );
    }

    #[test]
    fn previous_day_booking_spilling_past_midnight_blocks_early_slots() {
        let late = Utc.from_utc_datetime(&NaiveDate::from_ymd_opt(2030, 1, 6).unwrap().and_time(t(23, 30)));
        let existing = vec![booked(late, 60, AppointmentStatus::Confirmed)];
        let window = [(t(0, 0), t(2, 0))];
        let slots = enumerate_slots(monday(), &window, 30, &existing, &SlotGrid::default());
        assert_eq!(labels(&slots), vec!["00:30", "01:00", "01:30"]);
    }

    #[test]
    fn fully_booked_day_is_empty() {
        let existing = vec![booked(at(8, 0), 600, AppointmentStatus::Confirmed)];
        let grid = SlotGrid::default();
        assert!(enumerate_slots(monday(), &[grid.default_window], 30, &existing, &grid).is_empty());
    }

    #[test]
    fn last_representable_date_stops_instead_of_overflowing() {
        let late = [(t(22, 0), t(23, 59))];

        let clipped = enumerate_slots(NaiveDate::MAX, &late, 240, &[], &SlotGrid::default());
        assert!(clipped.is_empty());

        let open_ended = enumerate_slots(NaiveDate::MAX, &late, 240, &[], &unclipped());
        assert!(open_ended.is_empty());

        let short = enumerate_slots(NaiveDate::MAX, &late, 30, &[], &SlotGrid::default());
        assert_eq!(labels(&short), vec!["22:00", "22:30", "23:00"]);
    }

    #[test]
    fn windows_come_from_blocks_for_that_weekday() {
        let pro = Uuid::new_v4();
        let grid = SlotGrid::default();
        let blocks = vec![
            AvailabilityBlock::new(pro, DayOfWeek::Monday, t(9, 0), t(12, 0)),
            AvailabilityBlock::new(pro, DayOfWeek::Tuesday, t(14, 0), t(18, 0)),
        ];

        assert_eq!(windows_for_date(&blocks, monday(), &grid), vec![(t(9, 0), t(12, 0))]);

        let wednesday = NaiveDate::from_ymd_opt(2030, 1, 9).unwrap();
        assert!(windows_for_date(&blocks, wednesday, &grid).is_empty());

        assert_eq!(windows_for_date(&[], monday(), &grid), vec![(t(8, 0), t(18, 0))]);
    }
}
