//! End-to-end runs of the pipeline from waveform to nodal lines.

use chladni_core::audio::{self, Waveform};
use chladni_core::contour::{extract_zero_contour, Contour};
use chladni_core::pattern::synthesize;
use chladni_core::pipeline::{run, run_with};
use chladni_core::{
    AnalysisConfig, ChladniConfig, ChladniError, MappingConfig, ModePair, PlateConfig,
    ReductionPolicy, Stages, StandardStages, DEFAULT_FREQUENCY,
};

fn sine(freq: f32, sample_rate: u32, secs: f32) -> Waveform {
    let len = (sample_rate as f32 * secs) as usize;
    let samples = (0..len)
        .map(|i| 0.6 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
        .collect();
    Waveform::new(samples, sample_rate)
}

/// Wraps the standard stages and records which ones ran.
#[derive(Default)]
struct CountingStages {
    inner: StandardStages,
    analyzed: usize,
    mapped: usize,
    synthesized: usize,
}

impl Stages for CountingStages {
    fn analyze(&mut self, waveform: &Waveform, config: &AnalysisConfig) -> f32 {
        self.analyzed += 1;
        self.inner.analyze(waveform, config)
    }

    fn map_modes(&mut self, frequency: f32, config: &MappingConfig) -> ModePair {
        self.mapped += 1;
        self.inner.map_modes(frequency, config)
    }

    fn synthesize(&mut self, modes: ModePair, plate: &PlateConfig) -> Contour {
        self.synthesized += 1;
        self.inner.synthesize(modes, plate)
    }
}

#[test]
fn a440_sine_maps_to_three_five() {
    let waveform = sine(440.0, 44100, 1.0);
    let bin_width = 44100.0 / 2048.0;

    for policy in ReductionPolicy::ALL {
        let mut config = ChladniConfig::default();
        config.analysis.policy = policy;

        let result = run(Some(&waveform), &config).unwrap();
        assert!(
            (result.dominant_frequency_hz - 440.0).abs() <= bin_width,
            "{policy}: got {} Hz",
            result.dominant_frequency_hz
        );
        assert_eq!(result.modes, ModePair::new(3, 5));
        assert!(!result.contour.is_empty());
    }
}

#[test]
fn missing_input_runs_no_stage() {
    let config = ChladniConfig::default();

    let mut stages = CountingStages::default();
    assert!(matches!(run_with(&mut stages, None, &config), Err(ChladniError::NoInput)));

    let empty = Waveform::new(Vec::new(), 44100);
    assert!(matches!(run_with(&mut stages, Some(&empty), &config), Err(ChladniError::NoInput)));

    assert_eq!((stages.analyzed, stages.mapped, stages.synthesized), (0, 0, 0));
}

#[test]
fn each_stage_runs_once_per_pass() {
    let mut config = ChladniConfig::default();
    config.plate.resolution = 50;

    let mut stages = CountingStages::default();
    run_with(&mut stages, Some(&sine(300.0, 8000, 0.25)), &config).unwrap();
    assert_eq!((stages.analyzed, stages.mapped, stages.synthesized), (1, 1, 1));
}

#[test]
fn silent_recording_falls_back_to_default_frequency() {
    let mut config = ChladniConfig::default();
    config.plate.resolution = 50;

    for len in [1, 511, 2048, 30000] {
        let waveform = Waveform::new(vec![0.0; len], 44100);
        let result = run(Some(&waveform), &config).unwrap();
        assert_eq!(result.dominant_frequency_hz, DEFAULT_FREQUENCY);
    }
}

#[test]
fn runs_are_deterministic() {
    let waveform = sine(523.25, 22050, 0.5);
    let config = ChladniConfig::default();
    assert_eq!(run(Some(&waveform), &config).unwrap(), run(Some(&waveform), &config).unwrap());
}

#[test]
fn wav_file_feeds_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for sample in sine(440.0, 44100, 1.0).samples {
        writer.write_sample((sample * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();

    let waveform = audio::load_wav(&path).unwrap();
    assert_eq!(waveform.sample_rate, 44100);
    assert_eq!(waveform.samples.len(), 44100);

    let result = run(Some(&waveform), &ChladniConfig::default()).unwrap();
    assert_eq!(result.modes, ModePair::new(3, 5));
}

/// Connected nodal lines of every pair of distinct modes up to 6, row by row
/// for `m = 1..=6` and `n = 1..=6` with the diagonal left out.
const NODAL_LINES: [[usize; 6]; 6] = [
    [0, 1, 1, 1, 2, 1],
    [1, 0, 3, 1, 3, 5],
    [1, 3, 0, 5, 6, 1],
    [1, 1, 5, 0, 7, 5],
    [2, 3, 6, 7, 0, 9],
    [1, 5, 1, 5, 9, 0],
];

#[test]
fn nodal_line_count_does_not_depend_on_resolution() {
    // Odd and even resolutions put the plate centre and the crossings of the
    // nodal lines on grid points and between them respectively.
    for m in 1..=6u8 {
        for n in (1..=6u8).filter(|&n| n != m) {
            let modes = ModePair::new(m, n);
            let expected = NODAL_LINES[m as usize - 1][n as usize - 1];
            for resolution in [150, 151, 300, 301] {
                let plate = PlateConfig { side_length: 1.0, resolution };
                let contour = extract_zero_contour(&synthesize(modes, &plate));
                assert_eq!(contour.component_count(), expected, "{modes} at {resolution}");
            }
        }
    }
}

#[test]
fn plate_side_length_scales_the_figure() {
    let unit = extract_zero_contour(&synthesize(ModePair::new(1, 3), &PlateConfig { side_length: 1.0, resolution: 120 }));
    let double = extract_zero_contour(&synthesize(ModePair::new(1, 3), &PlateConfig { side_length: 2.0, resolution: 120 }));

    assert_eq!(unit.component_count(), double.component_count());
    for (a, b) in unit.polylines.iter().flatten().zip(double.polylines.iter().flatten()) {
        assert!((2.0 * a.x - b.x).abs() < 1e-9);
        assert!((2.0 * a.y - b.y).abs() < 1e-9);
    }
}
