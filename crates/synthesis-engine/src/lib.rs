//! Speech synthesis engine capability
//!
//! The cache layer only ever talks to a [`SynthesisEngine`]: something that
//! takes canonical synthesis parameters plus an output path and either writes
//! an audio file there or reports a typed [`EngineFailure`].
//!
//! Three variants are provided and selected through [`EngineKind`]:
//!
//! - [`RemoteEngine`] (`SERVICE`) - calls a speech provider service over HTTP
//! - [`CommandEngine`] (`LIBRARY`) - pipes text through a locally installed synthesizer
//! - [`DummyEngine`] (`DUMMY`) - deterministic double used by tests
//!
//! Synthesis libraries linked into the process plug in as a [`SpeechBackend`]
//! wrapped in a [`LibraryEngine`], which runs them on the blocking pool.
//!
//! # Example
//!
//! ```no_run
//! use synthesis_engine::{DummyEngine, SynthesisEngine, SynthesisParams};
//! use std::path::Path;
//!
//! # async fn example() {
//! let engine = DummyEngine::new();
//! let params = SynthesisParams::new("hello");
//! match engine.synthesize(&params, Path::new("/tmp/hello.ogg")).await {
//!     Ok(output) => println!("wrote {:?}", output.audio_file),
//!     Err(failure) => println!("engine failed: {}", failure),
//! }
//! # }
//! ```

mod dummy;
mod engine;
mod error;
mod library;
mod registry;
mod remote;
mod types;

pub use dummy::DummyEngine;
pub use engine::SynthesisEngine;
pub use error::{EngineError, EngineFailure, FailureCategory, Result};
pub use library::{CommandEngine, LibraryEngine, SpeechBackend, SynthesizedAudio};
pub use registry::{build_engine, EngineKind, EngineSettings};
pub use remote::RemoteEngine;
pub use types::{SynthesisOutput, SynthesisParams, TextType};
