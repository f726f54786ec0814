pub mod aiff_format;
pub mod ring_buffer;
