use eframe::egui::{
    ColorImage, Image, Response, Sense, TextureHandle, TextureOptions, Ui, Vec2, Widget,
};
use flume::Sender;
use log::debug;

use morsescope_engine::transform::frequency_from_pixel_x;
use morsescope_messages::{Command, FrequencyWindow, WaterfallImage};

/// Waterfall display widget.
///
/// The engine renders the rows; this widget only uploads finished frames and
/// maps pointer positions back onto the frequency window. Hovering shows the
/// frequency under the pointer, a click retunes the window around it.
pub struct Waterfall {
    cmd_tx: Sender<Command>,
    image: Option<ColorImage>,
    needs_gpu_upload: bool,
    /// Cached texture handle to avoid re-uploading on every frame
    texture: Option<TextureHandle>,
    window: Option<FrequencyWindow>,
    /// Last size sent to the engine, in whole pixels
    requested_size: Option<[usize; 2]>,
}

impl Waterfall {
    pub fn new(cmd_tx: Sender<Command>) -> Self {
        Self {
            cmd_tx,
            image: None,
            needs_gpu_upload: false,
            texture: None,
            window: None,
            requested_size: None,
        }
    }

    pub fn set_window(&mut self, window: Option<FrequencyWindow>) {
        self.window = window;
    }

    pub fn set_frame(&mut self, frame: &WaterfallImage) {
        if frame.pixels.len() != frame.width * frame.height {
            return;
        }
        self.image = Some(ColorImage::from_rgb(
            [frame.width, frame.height],
            &frame.to_rgb_bytes(),
        ));
        self.needs_gpu_upload = true;
    }

    fn request_size(&mut self, available: Vec2) {
        let size = [available.x.max(1.0) as usize, available.y.max(1.0) as usize];
        if self.requested_size != Some(size) {
            debug!("Waterfall area is now {}x{}", size[0], size[1]);
            let _ = self.cmd_tx.send(Command::ResizeWaterfall {
                width: size[0],
                height: size[1],
            });
            self.requested_size = Some(size);
        }
    }
}

impl Widget for &mut Waterfall {
    fn ui(self, ui: &mut Ui) -> Response {
        let available = ui.available_size();
        self.request_size(available);

        if self.needs_gpu_upload {
            if let Some(image) = self.image.take() {
                match self.texture.as_mut() {
                    Some(texture) => texture.set(image, TextureOptions::NEAREST),
                    None => {
                        self.texture =
                            Some(ui.ctx().load_texture("waterfall", image, TextureOptions::NEAREST));
                    }
                }
            }
            self.needs_gpu_upload = false;
        }

        let Some(texture) = &self.texture else {
            ui.label("Waiting for waterfall data...");
            return ui.response();
        };

        let response = ui.add(
            Image::new(texture)
                .fit_to_exact_size(available)
                .sense(Sense::click()),
        );

        let Some(window) = self.window else {
            return response;
        };
        let width = response.rect.width();
        let hovered = response
            .hover_pos()
            .and_then(|pos| frequency_from_pixel_x(pos.x - response.rect.left(), &window, width));

        if response.clicked() {
            if let Some(freq) = hovered {
                let _ = self.cmd_tx.send(Command::Retune(freq.round()));
            }
        }

        match hovered {
            Some(freq) => response.on_hover_text_at_pointer(freq.round().to_string()),
            None => response,
        }
    }
}
