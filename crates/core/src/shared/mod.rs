pub mod constants;
pub mod timecode;
