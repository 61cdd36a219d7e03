pub mod cue;
pub mod srt_formatter;
pub mod srt_parser;
