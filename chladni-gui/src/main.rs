//! # ChladniSketch - Sound to Chladni Figure GUI
//!
//! This module contains the desktop front end. A sound is loaded from a WAV
//! file or recorded from the microphone, analysed for its dominant frequency,
//! and turned into the nodal-line figure of a vibrating square plate.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme
//! - **Capture Thread**: Owned by `chladni_core::audio::Recorder` while recording
//! - **Pipeline**: Runs synchronously on the GUI thread when "Run" is pressed
//! - **Updates**: A 10 Hz tick only while the microphone is recording

mod ui;
mod widgets;

use std::fmt;
use std::time::{Duration, Instant};

use chladni_core::audio::{self, Recorder, Waveform};
use chladni_core::{render, ChladniConfig, ChladniError, ReductionPolicy, ResultSlot};
use iced::{Element, Subscription, Theme};
use log::{error, info, warn};
use ui::main_display::create_main_view;

/// File the knob settings are saved to and loaded from.
const SETTINGS_PATH: &str = "chladni_settings.json";
/// File the rendered figure is exported to.
const IMAGE_PATH: &str = "chladni.png";
/// Side length of the exported figure in pixels.
const IMAGE_SIZE: u32 = 600;

/// Main entry point for the ChladniSketch application.
pub fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting ChladniSketch...");
    let result = iced::application("ChladniSketch", ChladniApp::update, ChladniApp::view)
        .subscription(ChladniApp::subscription)
        .theme(ChladniApp::theme)
        .run();
    info!("Application finished with result: {:?}", result);
    result
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    // Input selection
    InputModeSelected(InputMode),
    PathChanged(String),
    LoadFile,
    StartRecording,
    StopRecording,

    // Pattern settings
    NFftChanged(f32),
    HopLengthChanged(f32),
    MDivisorChanged(f32),
    NDivisorChanged(f32),
    PolicySelected(ReductionPolicy),

    // Actions
    Run,
    SaveImage,
    SaveSettings,
    LoadSettings,

    // Recording progress poll
    Tick,
}

/// Where the sound comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    File,
    Microphone,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::File => write!(f, "File upload"),
            InputMode::Microphone => write!(f, "Microphone"),
        }
    }
}

/// One line of feedback under the run button.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Info(String),
    Error(String),
}

/// UI-specific data needed for rendering the interface.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub config: ChladniConfig,
    pub input_mode: InputMode,
    pub wav_path: String,
    /// Short description of the waveform currently held, if any.
    pub input_summary: Option<String>,
    /// When the current recording started.
    pub recording_since: Option<Instant>,
    pub status: Status,
}

/// Main application state.
#[derive(Debug)]
struct ChladniApp {
    waveform: Option<Waveform>,
    recorder: Option<Recorder>,
    slot: ResultSlot,

    // Single source of truth for all display data
    display_data: AppDisplayData,
}

impl Default for ChladniApp {
    fn default() -> Self {
        let config = match ChladniConfig::load_settings(SETTINGS_PATH) {
            Ok(config) => {
                info!("Loaded settings from {}", SETTINGS_PATH);
                config
            }
            Err(ChladniError::Io(_)) => ChladniConfig::default(),
            Err(e) => {
                warn!("Ignoring {}: {}", SETTINGS_PATH, e);
                ChladniConfig::default()
            }
        };

        Self {
            waveform: None,
            recorder: None,
            slot: ResultSlot::new(),
            display_data: AppDisplayData {
                config,
                input_mode: InputMode::File,
                wav_path: String::new(),
                input_summary: None,
                recording_since: None,
                status: Status::Idle,
            },
        }
    }
}

impl ChladniApp {
    /// Handles application state updates based on incoming messages.
    fn update(&mut self, message: Message) {
        if !matches!(message, Message::Tick) {
            log::debug!("Received message: {:?}", message);
        }

        match message {
            Message::InputModeSelected(mode) => {
                if mode != self.display_data.input_mode {
                    self.cancel_recording();
                    self.set_waveform(None);
                    self.display_data.input_mode = mode;
                }
            }
            Message::PathChanged(path) => {
                self.display_data.wav_path = path;
            }
            Message::LoadFile => {
                let path = self.display_data.wav_path.trim().to_string();
                if path.is_empty() {
                    self.display_data.status = Status::Error("Enter the path of a WAV file.".into());
                    return;
                }
                match audio::load_wav(&path) {
                    Ok(waveform) => {
                        self.set_waveform(Some(waveform));
                        self.display_data.status = Status::Info(format!("Loaded {path}"));
                    }
                    Err(e) => {
                        error!("Could not load {}: {}", path, e);
                        self.set_waveform(None);
                        self.display_data.status = Status::Error(format!("Could not load {path}: {e}"));
                    }
                }
            }
            Message::StartRecording => {
                if self.recorder.is_none() {
                    self.set_waveform(None);
                    self.recorder = Some(Recorder::start());
                    self.display_data.recording_since = Some(Instant::now());
                    self.display_data.status = Status::Info("Recording...".into());
                }
            }
            Message::StopRecording => {
                if let Some(recorder) = self.recorder.take() {
                    self.display_data.recording_since = None;
                    match recorder.stop() {
                        Ok(waveform) if waveform.is_empty() => {
                            warn!("No samples recorded");
                            self.display_data.status = Status::Error("Nothing was recorded.".into());
                        }
                        Ok(waveform) => {
                            self.set_waveform(Some(waveform));
                            // Recordings are kept in memory only.
                            self.display_data.status = Status::Info("Recording ready (not saved to disk).".into());
                        }
                        Err(e) => {
                            self.display_data.status = Status::Error(e.to_string());
                        }
                    }
                }
            }
            Message::NFftChanged(value) => {
                self.display_data.config.analysis.n_fft = value as usize;
            }
            Message::HopLengthChanged(value) => {
                self.display_data.config.analysis.hop_length = value as usize;
            }
            Message::MDivisorChanged(value) => {
                self.display_data.config.mapping.m_divisor = value as f64;
            }
            Message::NDivisorChanged(value) => {
                self.display_data.config.mapping.n_divisor = value as f64;
            }
            Message::PolicySelected(policy) => {
                self.display_data.config.analysis.policy = policy;
            }
            Message::Run => {
                let started = Instant::now();
                match self.slot.run_and_store(self.waveform.as_ref(), &self.display_data.config) {
                    Ok(result) => {
                        info!(
                            "Figure for {} ({}) ready in {:?}",
                            result.display_frequency(),
                            result.modes,
                            started.elapsed()
                        );
                        self.display_data.status = Status::Idle;
                    }
                    Err(ChladniError::NoInput) => {
                        self.display_data.status =
                            Status::Error("No audio data. Load a file or record first.".into());
                    }
                    Err(e) => {
                        error!("Run failed: {}", e);
                        self.display_data.status = Status::Error(e.to_string());
                    }
                }
            }
            Message::SaveImage => match self.slot.current() {
                Some(result) => match render::save_png(&result.contour, IMAGE_PATH, IMAGE_SIZE) {
                    Ok(()) => {
                        info!("Figure saved to {}", IMAGE_PATH);
                        self.display_data.status = Status::Info(format!("Image saved to {IMAGE_PATH}"));
                    }
                    Err(e) => {
                        error!("Error saving image: {}", e);
                        self.display_data.status = Status::Error(e.to_string());
                    }
                },
                None => {
                    self.display_data.status = Status::Error("Run the analysis before saving an image.".into());
                }
            },
            Message::SaveSettings => match self.display_data.config.save_settings(SETTINGS_PATH) {
                Ok(()) => {
                    info!("Settings saved to {}", SETTINGS_PATH);
                    self.display_data.status = Status::Info(format!("Settings saved to {SETTINGS_PATH}"));
                }
                Err(e) => {
                    error!("Error saving settings: {}", e);
                    self.display_data.status = Status::Error(e.to_string());
                }
            },
            Message::LoadSettings => match ChladniConfig::load_settings(SETTINGS_PATH) {
                Ok(config) => {
                    info!("Settings loaded from {}", SETTINGS_PATH);
                    self.display_data.config = config;
                    self.display_data.status = Status::Info(format!("Settings loaded from {SETTINGS_PATH}"));
                }
                Err(e) => {
                    error!("Error loading settings: {}", e);
                    self.display_data.status = Status::Error(e.to_string());
                }
            },
            Message::Tick => {
                let failure = self.recorder.as_ref().and_then(Recorder::failure);
                if let Some(reason) = failure {
                    self.recorder = None;
                    self.display_data.recording_since = None;
                    self.display_data.status = Status::Error(format!("Microphone unavailable: {reason}"));
                }
            }
        }
    }

    /// Replaces the held waveform and refreshes its summary line.
    fn set_waveform(&mut self, waveform: Option<Waveform>) {
        self.display_data.input_summary = waveform.as_ref().map(|w| {
            format!("{} samples at {} Hz ({:.2}s)", w.samples.len(), w.sample_rate, w.duration_secs())
        });
        self.waveform = waveform;
    }

    fn cancel_recording(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            info!("Discarding recording in progress");
            let _ = recorder.stop();
            self.display_data.recording_since = None;
        }
    }

    /// Renders the main application interface.
    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data, self.slot.current())
    }

    /// Polls the recorder while the microphone is open.
    fn subscription(&self) -> Subscription<Message> {
        if self.recorder.is_some() {
            iced::time::every(Duration::from_millis(100)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}
