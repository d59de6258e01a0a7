// Library root. The embedding service builds an `LlmClient` from its own
// configuration and hands it to the façades below.

pub mod analysis;
pub mod config;
pub mod diagnosis;
pub mod error;
pub mod generation;
pub mod llm;
pub mod logger;
pub mod prompts;
pub mod vision;

pub use analysis::{CognitiveLevel, DnaAnalyzer, DnaTag, ProblemDna, TagKind};
pub use config::Config;
pub use diagnosis::{CognitiveDiagnoser, DiagnosisResult, ErrorType, RubricEvaluation};
pub use error::CoreError;
pub use generation::{GeneratedProblem, ProblemGenerator};
pub use llm::{GenerateOptions, Generated, LlmClient, OutputFormat};
pub use vision::{ImageRef, LatexExtraction, Quality, TextExtraction, VisionFacade};
