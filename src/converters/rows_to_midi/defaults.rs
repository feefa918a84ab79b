//! Default values for MIDI synthesis
//!
//! Provides defaults for resolution, velocity and channel assignment.

use crate::models::PERCUSSION_CHANNEL;

/// Default ticks per quarter note (MIDI resolution)
pub const DEFAULT_RESOLUTION: u16 = 120;

/// Velocity of every synthesized note-on
pub const DEFAULT_VELOCITY: u8 = 127;

/// Number of MIDI channels
pub const CHANNEL_COUNT: usize = 16;

/// Rows per quarter note; one row is a sixteenth note
pub const ROWS_PER_QUARTER: u64 = 4;

/// Lowest channel not yet in use
///
/// Channel 9 is reserved for drums and is never handed out here. Returns
/// `None` once every channel is taken.
pub fn next_free_channel(in_use: &[bool; CHANNEL_COUNT]) -> Option<u8> {
    (0..CHANNEL_COUNT as u8).find(|&channel| channel != PERCUSSION_CHANNEL && !in_use[channel as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_free_channel() {
        let mut in_use = [false; CHANNEL_COUNT];
        assert_eq!(next_free_channel(&in_use), Some(0));

        for channel in 0..9 {
            in_use[channel] = true;
        }
        // Skip channel 9 (drums)
        assert_eq!(next_free_channel(&in_use), Some(10));

        in_use = [true; CHANNEL_COUNT];
        in_use[9] = false;
        assert_eq!(next_free_channel(&in_use), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(DEFAULT_RESOLUTION, 120);
        assert_eq!(DEFAULT_VELOCITY, 127);
        assert_eq!(ROWS_PER_QUARTER, 4);
    }
}
