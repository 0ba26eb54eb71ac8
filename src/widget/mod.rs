mod oscilloscope;
pub use oscilloscope::Oscilloscope;

mod piano_roll;
pub use piano_roll::PianoRoll;
