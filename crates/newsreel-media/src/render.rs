//! FFmpeg compositing.
//!
//! Rendering is one opaque blocking call: still image + narration
//! audio + title in, video file out. The command is assembled through
//! a small builder so the argument order stays correct (per-input args
//! before each `-i`, output args before the output path). Rendering is
//! deterministic for identical inputs, so a failed render is never
//! retried.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};
use crate::text::prepare_title_overlay;

/// Minimum size for a render output to count as a real video.
const MIN_VIDEO_BYTES: u64 = 1000;

/// One FFmpeg input with its preceding arguments.
#[derive(Debug, Clone)]
struct Input {
    args: Vec<String>,
    path: PathBuf,
}

/// Builder for FFmpeg invocations.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<Input>,
    output: PathBuf,
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add a plain input.
    pub fn input(self, path: impl AsRef<Path>) -> Self {
        self.input_with_args::<[&str; 0], &str>([], path)
    }

    /// Add an input preceded by its own arguments (e.g. `-loop 1`).
    pub fn input_with_args<I, S>(mut self, args: I, path: impl AsRef<Path>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(Input {
            args: args.into_iter().map(Into::into).collect(),
            path: path.as_ref().to_path_buf(),
        });
        self
    }

    /// Add an output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set a filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Map a stream into the output.
    pub fn map(self, stream: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(stream)
    }

    /// Stop when the shortest input ends.
    pub fn shortest(self) -> Self {
        self.output_arg("-shortest")
    }

    /// Build the full argument list.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        for input in &self.inputs {
            args.extend(input.args.clone());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().to_string());
        }

        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().to_string());

        args
    }

    /// Input paths, for pre-flight existence checks.
    fn input_paths(&self) -> impl Iterator<Item = &Path> {
        self.inputs.iter().map(|i| i.path.as_path())
    }
}

/// Render parameters. Product configuration, not contract: only the
/// input/output shape of [`render_news_video`] is load-bearing.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub preset: String,
    pub font_file: PathBuf,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 24,
            // Tuned for small cloud instances.
            preset: "ultrafast".to_string(),
            font_file: PathBuf::from(
                "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
            ),
        }
    }
}

impl RenderSettings {
    fn font_argument(&self) -> String {
        if self.font_file.exists() {
            format!("fontfile='{}'", self.font_file.display())
        } else {
            // Fall back to fontconfig resolution.
            "font='Liberation Sans'".to_string()
        }
    }
}

/// Compose the news video: looped background image, lower-third title,
/// narration audio, stop at the shorter of the two.
pub async fn render_news_video(
    image: &Path,
    audio: &Path,
    title: &str,
    dest: &Path,
    settings: &RenderSettings,
) -> MediaResult<()> {
    let overlay = prepare_title_overlay(title);
    let cmd = build_render_command(image, audio, &overlay, dest, settings);
    run_ffmpeg(&cmd).await?;

    let metadata = fs::metadata(dest)
        .await
        .map_err(|_| MediaError::render_failed("output file not created", None))?;
    if metadata.len() < MIN_VIDEO_BYTES {
        return Err(MediaError::render_failed(
            format!("output file too small: {} bytes", metadata.len()),
            None,
        ));
    }

    info!(
        dest = %dest.display(),
        size_bytes = metadata.len(),
        "Rendered news video"
    );
    Ok(())
}

fn build_render_command(
    image: &Path,
    audio: &Path,
    overlay: &str,
    dest: &Path,
    settings: &RenderSettings,
) -> FfmpegCommand {
    let (w, h) = (settings.width, settings.height);

    let filter = format!(
        // Scale the image to cover the frame, center-crop, then draw
        // the lower third.
        "[0:v]scale={w}:-2,crop={w}:{h}:(iw-ow)/2:(ih-oh)/2[bg];\
         [bg]drawtext={font}:text='{overlay}':\
         fontcolor=white:fontsize=40:line_spacing=12:\
         shadowcolor=black@0.9:shadowx=3:shadowy=3:\
         box=1:boxcolor=black@0.5:boxborderw=10:\
         x=50:y=h-180[outv]",
        font = settings.font_argument(),
    );

    FfmpegCommand::new(dest)
        .input_with_args(["-loop", "1"], image)
        .input(audio)
        .filter_complex(filter)
        .map("[outv]")
        .map("1:a")
        .output_args(["-c:v", "libx264"])
        .output_args(["-preset", settings.preset.as_str()])
        .output_args(["-r", settings.fps.to_string().as_str()])
        .output_args(["-c:a", "aac"])
        .output_args(["-b:a", "128k"])
        .shortest()
}

/// Run one FFmpeg command to completion.
async fn run_ffmpeg(cmd: &FfmpegCommand) -> MediaResult<()> {
    for path in cmd.input_paths() {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
    }

    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let args = cmd.build_args();
    debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

    let output = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::render_failed(
            stderr.lines().last().unwrap_or("FFmpeg failed").to_string(),
            output.status.code(),
        ));
    }

    Ok(())
}
