pub mod device_stream;
