pub mod file;
pub mod normalizer;
pub mod process;

pub use file::{write_wav, AudioFile};
pub use normalizer::{
    filter_chain, AudioNormalizer, AudioSettings, FfmpegNormalizer, NativeNormalizer,
    NormalizeJob,
};
