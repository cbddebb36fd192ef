//! Utility modules for vcd-detect

pub mod audio_decoder;
pub mod process;

pub use audio_decoder::{decode_audio_file, DecodedAudio};
