pub mod cpu;
pub mod history;
pub mod info;
pub mod memory;
pub mod sample;
pub mod sessions;
pub mod source;
