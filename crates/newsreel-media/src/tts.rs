//! Narration synthesis.
//!
//! Speech synthesis is a pluggable capability: every engine is an
//! external CLI invocation that takes text and writes an audio file.
//! A primary voice profile is tried first; on any failure the
//! synthesizer waits a short interval and retries once with a
//! secondary profile. Output is validated by minimum file size only —
//! correctness of the speech itself is not verifiable at this layer.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// Minimum audio file size in bytes for a synthesis to count.
const DEFAULT_MIN_AUDIO_BYTES: u64 = 256;

/// Supported synthesis engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TtsEngine {
    /// Microsoft Edge neural voices via the `edge-tts` CLI.
    EdgeTts,
    /// Offline espeak-ng, the last-resort robotic fallback.
    EspeakNg,
    /// Site-local wrapper invoked as `<program> <text> <output>`.
    Command(String),
}

/// An engine plus voice selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceProfile {
    pub engine: TtsEngine,
    pub voice: String,
}

impl VoiceProfile {
    pub fn new(engine: TtsEngine, voice: impl Into<String>) -> Self {
        Self {
            engine,
            voice: voice.into(),
        }
    }

    /// Default male Spanish news-anchor voice.
    pub fn default_primary() -> Self {
        Self::new(TtsEngine::EdgeTts, "es-AR-TomasNeural")
    }

    /// Offline fallback voice.
    pub fn default_fallback() -> Self {
        Self::new(TtsEngine::EspeakNg, "es")
    }

    fn program(&self) -> &str {
        match &self.engine {
            TtsEngine::EdgeTts => "edge-tts",
            TtsEngine::EspeakNg => "espeak-ng",
            TtsEngine::Command(program) => program,
        }
    }

    /// Build `(program, args)` for one synthesis invocation.
    fn invocation(&self, text: &str, dest: &Path) -> (String, Vec<String>) {
        let dest = dest.to_string_lossy().to_string();
        match &self.engine {
            TtsEngine::EdgeTts => (
                self.program().to_string(),
                vec![
                    "--voice".to_string(),
                    self.voice.clone(),
                    "--text".to_string(),
                    text.to_string(),
                    "--write-media".to_string(),
                    dest,
                ],
            ),
            TtsEngine::EspeakNg => (
                self.program().to_string(),
                vec![
                    "-v".to_string(),
                    self.voice.clone(),
                    "-w".to_string(),
                    dest,
                    text.to_string(),
                ],
            ),
            TtsEngine::Command(program) => {
                (program.clone(), vec![text.to_string(), dest])
            }
        }
    }
}

/// Converts narration text into an audio artifact.
pub struct NarrationSynthesizer {
    primary: VoiceProfile,
    fallback: VoiceProfile,
    fallback_delay: Duration,
    min_bytes: u64,
}

impl Default for NarrationSynthesizer {
    fn default() -> Self {
        Self::new(VoiceProfile::default_primary(), VoiceProfile::default_fallback())
    }
}

impl NarrationSynthesizer {
    pub fn new(primary: VoiceProfile, fallback: VoiceProfile) -> Self {
        Self {
            primary,
            fallback,
            fallback_delay: Duration::from_secs(2),
            min_bytes: DEFAULT_MIN_AUDIO_BYTES,
        }
    }

    /// Override the wait before the fallback attempt.
    pub fn with_fallback_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay = delay;
        self
    }

    /// Override the minimum accepted output size.
    pub fn with_min_bytes(mut self, min_bytes: u64) -> Self {
        self.min_bytes = min_bytes;
        self
    }

    /// Synthesize `text` into `dest`.
    ///
    /// Tries the primary profile, then after a short wait the fallback
    /// profile. Either engine can block indefinitely on a hung
    /// process; no timeout is enforced here.
    pub async fn synthesize(&self, text: &str, dest: &Path) -> MediaResult<()> {
        info!(
            voice = %self.primary.voice,
            chars = text.len(),
            "Synthesizing narration"
        );

        let primary_error = match self.run_profile(&self.primary, text, dest).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        warn!(
            voice = %self.primary.voice,
            error = %primary_error,
            "Primary voice failed, retrying with fallback"
        );
        tokio::time::sleep(self.fallback_delay).await;

        match self.run_profile(&self.fallback, text, dest).await {
            Ok(()) => Ok(()),
            Err(fallback_error) => Err(MediaError::synthesis_failed(format!(
                "primary ({}): {}; fallback ({}): {}",
                self.primary.voice, primary_error, self.fallback.voice, fallback_error
            ))),
        }
    }

    async fn run_profile(
        &self,
        profile: &VoiceProfile,
        text: &str,
        dest: &Path,
    ) -> MediaResult<()> {
        which::which(profile.program())
            .map_err(|_| MediaError::TtsEngineNotFound(profile.program().to_string()))?;

        let (program, args) = profile.invocation(text, dest);
        debug!(program, voice = %profile.voice, "Running TTS engine");

        let output = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::synthesis_failed(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.lines().last().unwrap_or("unknown error")
            )));
        }

        self.validate(dest).await
    }

    async fn validate(&self, dest: &Path) -> MediaResult<()> {
        let metadata = fs::metadata(dest)
            .await
            .map_err(|_| MediaError::synthesis_failed("audio file not created"))?;
        if metadata.len() < self.min_bytes {
            return Err(MediaError::synthesis_failed(format!(
                "audio file too small: {} bytes (minimum {})",
                metadata.len(),
                self.min_bytes
            )));
        }
        Ok(())
    }
}
