pub mod ffmpeg;
pub mod mux;

#[cfg(all(test, unix))]
pub(crate) mod testing;
