// Web-side constants for the audio glue.

// HTMLMediaElement.readyState at which duration and current data are known.
pub const HAVE_CURRENT_DATA: u16 = 2;

// Tolerance before re-applying a start offset after playback begins.
pub const SEEK_TOLERANCE_SEC: f64 = 0.01;
