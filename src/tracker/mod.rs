pub mod correction;
pub mod derived;
pub mod frame;
pub mod interpolate;
pub mod sequencer;

pub use correction::{reinterpolate_pins, CorrectionEngine};
pub use derived::{DerivedPoints, MIN_CONFIDENCE};
pub use frame::{Biomechanics, FrameRecord, Provenance};
pub use interpolate::{fill_gaps, interpolate_between};
pub use sequencer::{process, SequencerOptions, TrackingRun};
