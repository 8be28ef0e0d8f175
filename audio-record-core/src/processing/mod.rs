pub mod constraints;
pub mod mp3_encoder;
pub mod pcm_buffer;
pub mod stage_chain;
