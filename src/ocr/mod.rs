pub mod engine;
pub mod extract;
pub mod filter;
pub mod preprocess;
pub mod setup;

pub use engine::{FixedRecognizer, RecognizedText, Recognizer, TesseractEngine};
pub use extract::{parse, parse_text};
pub use filter::{filter, FilteredText};
pub use preprocess::{ImageProcessor, NormalizedImage, Normalizer, RawImage};
pub use setup::{engine_from_config, ensure_traineddata};
