//! # Main Display Module
//!
//! This module contains the main display components and layout logic
//! for the ChladniSketch application.

use iced::widget::{
    button, column, container, horizontal_space, pick_list, radio, row, slider, text, text_input, Space,
};
use iced::{Alignment, Color, Element, Length};

use chladni_core::{ChladniResult, ReductionPolicy};

use crate::widgets::pattern_view::PatternView;
use crate::{AppDisplayData, InputMode, Message, Status};

static POLICIES: [ReductionPolicy; 2] = ReductionPolicy::ALL;

/// Configuration for a single button in the program section
#[derive(Debug, Clone)]
struct ButtonConfig {
    label: &'static str,
    message: Message,
}

const PROGRAM_BUTTONS: &[ButtonConfig] = &[
    ButtonConfig { label: "Save image", message: Message::SaveImage },
    ButtonConfig { label: "Save settings", message: Message::SaveSettings },
    ButtonConfig { label: "Load settings", message: Message::LoadSettings },
];

/// Creates the complete main application view
pub fn create_main_view<'a>(
    data: &'a AppDisplayData,
    result: Option<&'a ChladniResult>,
) -> Element<'a, Message> {
    let title = text("ChladniSketch").size(28);
    let subtitle = text("Turn a sound into the nodal pattern of a vibrating plate.").size(14);

    let run_button = button(text("Run").size(18).width(Length::Fill))
        .padding([10, 20])
        .width(Length::Fixed(160.0))
        .on_press(Message::Run);

    let main_column = column![
        title,
        subtitle,
        Space::with_height(10),
        row![run_button, Space::with_width(15), status_line(&data.status)].align_y(Alignment::Center),
        Space::with_height(10),
        create_result_panel(result),
    ]
    .width(Length::Fill)
    .spacing(5);

    let main_content = row![main_column, Space::with_width(10), create_sidebar(data)]
        .align_y(Alignment::Start)
        .padding(20);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn status_line(status: &Status) -> Element<'static, Message> {
    match status {
        Status::Idle => text("").into(),
        Status::Info(message) => text(message.clone()).size(14).into(),
        Status::Error(message) => text(message.clone())
            .size(14)
            .color(Color::from_rgb(0.9, 0.35, 0.35))
            .into(),
    }
}

/// Creates the result panel: frequency and modes above the figure.
fn create_result_panel(result: Option<&ChladniResult>) -> Element<'static, Message> {
    let (frequency, modes) = match result {
        Some(result) => (result.display_frequency(), result.modes.to_string()),
        None => ("--".to_string(), "--".to_string()),
    };

    let header = row![
        column![text("Dominant frequency").size(14), text(frequency).size(24)].spacing(2),
        horizontal_space(),
        column![text("Modes").size(14), text(modes).size(24)].spacing(2),
    ]
    .align_y(Alignment::End);

    let figure = container(PatternView::new(result.map(|r| &r.contour)).view())
        .width(Length::Fill)
        .height(Length::Fill);

    container(
        column![text("Chladni figure").size(18), Space::with_height(5), header, figure]
            .spacing(5)
            .padding(15),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}

/// Creates the settings sidebar.
///
/// Builds the right-side panel with the input source, the pattern settings
/// and the program actions (image export and settings persistence).
fn create_sidebar(data: &AppDisplayData) -> Element<'_, Message> {
    let sections = column![
        make_section("Input", create_input_section(data)),
        make_section("Pattern settings", create_settings_section(data)),
        make_section("Program", create_program_section()),
    ]
    .spacing(20)
    .padding(15);

    container(sections)
        .width(Length::Fixed(300.0))
        .height(Length::Fill)
        .into()
}

fn create_input_section(data: &AppDisplayData) -> Element<'_, Message> {
    let mode_picker = column![
        radio("File upload", InputMode::File, Some(data.input_mode), Message::InputModeSelected).size(16),
        radio("Microphone", InputMode::Microphone, Some(data.input_mode), Message::InputModeSelected)
            .size(16),
    ]
    .spacing(6);

    let source: Element<'_, Message> = match data.input_mode {
        InputMode::File => column![
            text_input("path/to/sound.wav", &data.wav_path)
                .on_input(Message::PathChanged)
                .on_submit(Message::LoadFile)
                .padding(6),
            button(text("Load").size(14).width(Length::Fill)).padding([6, 10]).on_press(Message::LoadFile),
        ]
        .spacing(8)
        .into(),
        InputMode::Microphone => {
            let control = match data.recording_since {
                Some(started) => column![
                    text(format!("Recording... {:.1}s", started.elapsed().as_secs_f32())).size(14),
                    button(text("Stop").size(14).width(Length::Fill))
                        .padding([6, 10])
                        .style(|_theme, _status| button::Style {
                            background: Some(iced::Background::Color(Color::from_rgb(0.8, 0.2, 0.2))),
                            text_color: Color::WHITE,
                            ..button::Style::default()
                        })
                        .on_press(Message::StopRecording),
                ],
                None => column![button(text("Record").size(14).width(Length::Fill))
                    .padding([6, 10])
                    .on_press(Message::StartRecording)],
            };
            control.spacing(8).into()
        }
    };

    let summary = text(data.input_summary.clone().unwrap_or_else(|| "No audio loaded".to_string())).size(12);

    column![mode_picker, source, summary].spacing(10).into()
}

fn create_settings_section(data: &AppDisplayData) -> Element<'_, Message> {
    let analysis = &data.config.analysis;
    let mapping = &data.config.mapping;

    column![
        labeled_slider(
            format!("nFFT: {}", analysis.n_fft),
            slider(256.0..=4096.0, analysis.n_fft as f32, Message::NFftChanged).step(256.0),
        ),
        labeled_slider(
            format!("Hop length: {}", analysis.hop_length),
            slider(64.0..=1024.0, analysis.hop_length as f32, Message::HopLengthChanged).step(64.0),
        ),
        labeled_slider(
            format!("m divisor: {:.0}", mapping.m_divisor),
            slider(50.0..=300.0, mapping.m_divisor as f32, Message::MDivisorChanged).step(1.0),
        ),
        labeled_slider(
            format!("n divisor: {:.0}", mapping.n_divisor),
            slider(50.0..=300.0, mapping.n_divisor as f32, Message::NDivisorChanged).step(1.0),
        ),
        column![
            text("Frequency reduction").size(14),
            pick_list(&POLICIES[..], Some(analysis.policy), Message::PolicySelected).width(Length::Fill),
        ]
        .spacing(4),
    ]
    .spacing(12)
    .into()
}

fn labeled_slider<'a>(
    label: String,
    slider: iced::widget::Slider<'a, f32, Message>,
) -> Element<'a, Message> {
    column![text(label).size(14), slider].spacing(4).into()
}

fn create_program_section() -> Element<'static, Message> {
    PROGRAM_BUTTONS
        .iter()
        .fold(column![].spacing(8), |col, config| {
            col.push(
                button(text(config.label).size(14).width(Length::Fill))
                    .padding([6, 10])
                    .on_press(config.message.clone()),
            )
        })
        .into()
}

/// Creates a sidebar section with a title above its content.
fn make_section<'a>(title: &'static str, content: Element<'a, Message>) -> Element<'a, Message> {
    column![text(title).size(18), Space::with_height(5), content]
        .spacing(5)
        .into()
}
