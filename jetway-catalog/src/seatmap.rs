use std::collections::HashSet;

use jetway_core::{Seat, SeatClass};

pub const DEFAULT_TOTAL_SEATS: i32 = 60;
pub const SEAT_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];
pub const BUSINESS_ROWS: u32 = 2;

/// Build the seat layout for `total_seats` seats.
///
/// Six seats per row (A-F), rows numbered from 1. Rows 1-2 are BUSINESS, the
/// rest ECONOMY. The last row is partial when `total_seats` is not a multiple
/// of six. Non-positive counts yield an empty map.
pub fn generate_seat_map(total_seats: i32) -> Vec<Seat> {
    let total = usize::try_from(total_seats).unwrap_or(0);
    let mut seat_map = Vec::with_capacity(total);

    let mut row: u32 = 1;
    while seat_map.len() < total {
        let class = if row <= BUSINESS_ROWS {
            SeatClass::Business
        } else {
            SeatClass::Economy
        };

        for letter in SEAT_LETTERS {
            if seat_map.len() >= total {
                break;
            }
            seat_map.push(Seat::new(format!("{}{}", row, letter), class));
        }
        row += 1;
    }

    seat_map
}

/// Check a caller-supplied seat map: exactly `total_seats` entries, unique
/// non-blank codes.
pub fn validate_seat_map(seat_map: &[Seat], total_seats: i32) -> Result<(), String> {
    if usize::try_from(total_seats).ok() != Some(seat_map.len()) {
        return Err(format!(
            "Seat map has {} seats but total_seats is {}",
            seat_map.len(),
            total_seats
        ));
    }

    let mut seen = HashSet::with_capacity(seat_map.len());
    for seat in seat_map {
        if seat.code.trim().is_empty() {
            return Err("Seat map contains a blank seat code".to_string());
        }
        if !seen.insert(seat.code.as_str()) {
            return Err(format!("Seat map contains duplicate seat {}", seat.code));
        }
    }

    Ok(())
}
