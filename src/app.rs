use crate::{
    audio::{self, ScopeFeed},
    config::{AspectRatio, Config},
    notes::{self, NoteEvent},
    playback::Clock,
    theme::{extractor, ThemePalette},
    widget::{Oscilloscope, PianoRoll},
};
use iced::{
    event, keyboard,
    widget::{
        button, canvas::Canvas, column, container, horizontal_space, image, pick_list, row,
        slider, text,
    },
    window::frames,
    Alignment::Center,
    Element, Event, Length, Subscription, Task, Theme,
};
use iced_aw::number_input;
use log::info;
use rfd::AsyncFileDialog;
use std::{path::PathBuf, sync::Arc};
use strum::VariantArray as _;

pub struct Rollscope {
    config: Config,
    palette: ThemePalette,
    /// bumped on every extraction request; stale results are dropped
    theme_generation: u64,
    notes: Arc<Vec<NoteEvent>>,
    clock: Clock,
    scope: Option<ScopeFeed>,
    /// snapshot of the live sample buffer, refreshed once per frame
    scope_samples: Arc<Vec<u8>>,
    cover: Option<image::Handle>,
    title: String,
}

impl std::fmt::Debug for Rollscope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rollscope")
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub enum Message {
    Tick,
    TogglePlay,
    Stop,
    OpenMidiButton,
    MidiPicked(Option<PathBuf>),
    NotesLoaded(Arc<Vec<NoteEvent>>),
    OpenImageButton,
    ImagePicked(Option<PathBuf>),
    ThemeExtracted(u64, ThemePalette),
    BrightnessChanged(u16),
    ContrastChanged(u16),
    AspectRatioChanged(AspectRatio),
    ScopeLineWidthChanged(f32),
    ImageZoomChanged(f32),
}

impl Rollscope {
    pub fn create() -> (Self, Task<Message>) {
        let config = Config::read();

        let scope = audio::start_capture();
        if scope.is_none() {
            info!("no audio input, oscilloscope will stay idle");
        }

        let cover = config
            .image_path
            .as_deref()
            .map(image::Handle::from_path);

        let mut app = Self {
            palette: ThemePalette::default(),
            theme_generation: 0,
            notes: Arc::new(notes::synthetic()),
            clock: Clock::default(),
            scope,
            scope_samples: Arc::new(Vec::new()),
            cover,
            title: "rollscope".to_owned(),
            config,
        };

        let mut tasks = vec![app.request_theme()];

        if let Some(path) = app.config.midi_path.clone() {
            app.title = title_of(&path);
            tasks.push(load_notes(path));
        }

        (app, Task::batch(tasks))
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                if let Some(scope) = &self.scope {
                    self.scope_samples = scope.snapshot();
                }
            }
            Message::TogglePlay => self.clock.toggle(),
            Message::Stop => self.clock.stop(),
            Message::OpenMidiButton => {
                return Task::perform(
                    async {
                        AsyncFileDialog::new()
                            .add_filter("MIDI File", &["mid", "midi"])
                            .pick_file()
                            .await
                            .map(|handle| handle.path().to_path_buf())
                    },
                    Message::MidiPicked,
                );
            }
            Message::MidiPicked(Some(path)) => {
                self.title = title_of(&path);
                self.config.midi_path = Some(path.clone());
                self.config.write();

                return load_notes(path);
            }
            Message::NotesLoaded(notes) => {
                info!("loaded {} notes", notes.len());
                self.notes = notes;
                self.clock.stop();
            }
            Message::OpenImageButton => {
                return Task::perform(
                    async {
                        AsyncFileDialog::new()
                            .add_filter("Image", &["png", "jpg", "jpeg", "webp"])
                            .pick_file()
                            .await
                            .map(|handle| handle.path().to_path_buf())
                    },
                    Message::ImagePicked,
                );
            }
            Message::ImagePicked(Some(path)) => {
                self.cover = Some(image::Handle::from_path(&path));
                self.config.image_path = Some(path);
                self.config.write();

                return self.request_theme();
            }
            Message::ThemeExtracted(generation, palette) => {
                // a newer request may have been issued in the meantime
                if generation == self.theme_generation {
                    self.palette = palette;
                }
            }
            Message::BrightnessChanged(brightness) => {
                self.config.theme_brightness = brightness.min(200);
                self.config.write();

                return self.request_theme();
            }
            Message::ContrastChanged(contrast) => {
                self.config.theme_contrast = contrast.min(200);
                self.config.write();

                return self.request_theme();
            }
            Message::AspectRatioChanged(aspect_ratio) => {
                self.config.aspect_ratio = aspect_ratio;
                self.config.write();
            }
            Message::ScopeLineWidthChanged(width) => {
                self.config.scope_line_width = width;
                self.config.write();
            }
            Message::ImageZoomChanged(zoom) => {
                self.config.image_zoom = zoom;
                self.config.write();
            }
            Message::MidiPicked(None) | Message::ImagePicked(None) => {}
        }

        Task::none()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let (width, height) = self.config.aspect_ratio.dimensions();

        let controls = row![
            button(if self.clock.is_playing() {
                "Pause"
            } else {
                "Play"
            })
            .on_press(Message::TogglePlay),
            button("Stop").on_press(Message::Stop),
            button("Load MIDI").on_press(Message::OpenMidiButton),
            button("Load Cover").on_press(Message::OpenImageButton),
            horizontal_space(),
            text("brightness"),
            number_input(self.config.theme_brightness, 0..=200, Message::BrightnessChanged)
                .ignore_buttons(true),
            text("contrast"),
            number_input(self.config.theme_contrast, 0..=200, Message::ContrastChanged)
                .ignore_buttons(true),
            pick_list(
                AspectRatio::VARIANTS,
                Some(self.config.aspect_ratio),
                Message::AspectRatioChanged
            ),
            slider(
                1.0..=8.0,
                self.config.scope_line_width,
                Message::ScopeLineWidthChanged
            )
            .step(0.5)
            .width(80.0),
            slider(0.25..=3.0, self.config.image_zoom, Message::ImageZoomChanged)
                .step(0.25)
                .width(80.0),
        ]
        .spacing(10)
        .align_y(Center);

        let piano_roll = container(PianoRoll {
            notes: self.notes.clone(),
            current_time: self.clock.current_time() as f32,
            palette: self.palette.clone(),
        })
        .width(width)
        .height(height * 0.75);

        let oscilloscope = Canvas::new(Oscilloscope {
            samples: self.scope.is_some().then(|| self.scope_samples.clone()),
            playing: self.clock.is_playing(),
            color: self.palette.scope_color(),
            background: self.palette.background_color(),
            line_width: self.config.scope_line_width,
        })
        .width(width)
        .height(height * 0.25);

        let mut content = column![
            controls,
            text(&self.title).color(self.palette.text_color()).size(20),
        ]
        .padding(20)
        .spacing(10);

        if let Some(cover) = &self.cover {
            content = content.push(
                image(cover.clone())
                    .width(Length::Fixed(160.0 * self.config.image_zoom))
                    .height(Length::Shrink),
            );
        }

        content.push(piano_roll).push(oscilloscope).into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let keys = event::listen_with(|e, _, _| match e {
            Event::Keyboard(keyboard::Event::KeyPressed {
                key: keyboard::Key::Named(keyboard::key::Named::Space),
                ..
            }) => Some(Message::TogglePlay),
            _ => None,
        });

        if self.clock.is_playing() {
            // the per-frame redraw loop; dropping it while paused is what
            // stops time publication
            Subscription::batch([keys, frames().map(|_| Message::Tick)])
        } else {
            keys
        }
    }

    pub fn theme(&self) -> Theme {
        self.palette.to_iced()
    }

    /// Kicks off asynchronous theme extraction; the newest request wins.
    fn request_theme(&mut self) -> Task<Message> {
        self.theme_generation += 1;

        let generation = self.theme_generation;
        let path = self.config.image_path.clone();
        let brightness = f32::from(self.config.theme_brightness);
        let contrast = f32::from(self.config.theme_contrast);

        Task::perform(
            smol::unblock(move || extractor::extract_theme(path.as_deref(), brightness, contrast)),
            move |palette| Message::ThemeExtracted(generation, palette),
        )
    }
}

fn load_notes(path: PathBuf) -> Task<Message> {
    Task::perform(
        smol::unblock(move || notes::load_or_synthetic(&path)),
        Message::NotesLoaded,
    )
}

fn title_of(path: &std::path::Path) -> String {
    path.file_stem()
        .map_or_else(|| "rollscope".to_owned(), |stem| {
            stem.to_string_lossy().into_owned()
        })
}
