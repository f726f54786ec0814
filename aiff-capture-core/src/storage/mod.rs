pub mod aiff_writer;
pub mod metadata;
