use serde::{Deserialize, Serialize};

use super::rendering::{Rgba, Surface, TextAlign};
use super::Bounds;

const CAPTION_PANEL_COLOR: Rgba = [8, 10, 14, 220];
const CAPTION_TEXT_COLOR: Rgba = [244, 240, 228, 255];
const DIALOGUE_PANEL_COLOR: Rgba = [18, 20, 30, 230];
const DIALOGUE_BORDER_COLOR: Rgba = [150, 128, 92, 255];
const DIALOGUE_TEXT_COLOR: Rgba = [236, 232, 220, 255];
const PANEL_MARGIN: f32 = 16.0;
const PANEL_HEIGHT: f32 = 56.0;
const TEXT_INSET: f32 = 20.0;

/// Full-surface picture with an optional caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CgPayload {
    pub image: String,
    #[serde(default)]
    pub text: Option<String>,
    /// Auto-dismiss delay. `None` keeps the CG up until dismissed.
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl CgPayload {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            text: None,
            duration_ms: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresentationId(pub u64);

#[derive(Debug, Clone)]
struct Presentation {
    id: PresentationId,
    payload: CgPayload,
}

/// Single-slot presentation gate: a request while something is showing is
/// dropped, never queued.
#[derive(Debug, Default)]
pub struct CgPresenter {
    current: Option<Presentation>,
    next_id: u64,
}

impl CgPresenter {
    pub fn present(&mut self, payload: CgPayload) -> Option<PresentationId> {
        if self.current.is_some() {
            return None;
        }
        let id = PresentationId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.current = Some(Presentation { id, payload });
        Some(id)
    }

    /// Clears the slot and hands back what was showing.
    pub fn dismiss(&mut self) -> Option<CgPayload> {
        self.current.take().map(|presentation| presentation.payload)
    }

    /// Dismisses only if `id` is still the presentation on screen.
    pub fn dismiss_if_current(&mut self, id: PresentationId) -> Option<CgPayload> {
        if self.current_id() != Some(id) {
            return None;
        }
        self.dismiss()
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&CgPayload> {
        self.current.as_ref().map(|presentation| &presentation.payload)
    }

    pub fn current_id(&self) -> Option<PresentationId> {
        self.current.as_ref().map(|presentation| presentation.id)
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        let Some(payload) = self.current() else {
            return;
        };
        let full = surface.full_rect();
        surface.draw_image(&payload.image, full);
        if let Some(text) = payload.text.as_deref() {
            let panel = caption_panel(full);
            surface.fill_rect(panel, CAPTION_PANEL_COLOR);
            surface.fill_text(
                text,
                panel.center().x,
                panel.y + TEXT_INSET,
                TextAlign::Center,
                CAPTION_TEXT_COLOR,
            );
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialogueId(pub u64);

/// Transient one-line dialogue. A new line replaces the current one.
#[derive(Debug, Default)]
pub struct DialogueBox {
    current: Option<(DialogueId, String)>,
    next_id: u64,
}

impl DialogueBox {
    pub fn show(&mut self, text: impl Into<String>) -> DialogueId {
        let id = DialogueId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.current = Some((id, text.into()));
        id
    }

    pub fn clear_if_current(&mut self, id: DialogueId) -> bool {
        if self.current_id() != Some(id) {
            return false;
        }
        self.current = None;
        true
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_ref().map(|(_, text)| text.as_str())
    }

    pub fn current_id(&self) -> Option<DialogueId> {
        self.current.as_ref().map(|(id, _)| *id)
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        let Some(text) = self.current() else {
            return;
        };
        let panel = caption_panel(surface.full_rect());
        surface.fill_rect(panel.inflate(2.0), DIALOGUE_BORDER_COLOR);
        surface.fill_rect(panel, DIALOGUE_PANEL_COLOR);
        surface.fill_text(
            text,
            panel.x + TEXT_INSET,
            panel.y + TEXT_INSET,
            TextAlign::Left,
            DIALOGUE_TEXT_COLOR,
        );
    }
}

fn caption_panel(full: Bounds) -> Bounds {
    Bounds::new(
        full.x + PANEL_MARGIN,
        full.bottom() - PANEL_HEIGHT - PANEL_MARGIN,
        full.w - PANEL_MARGIN * 2.0,
        PANEL_HEIGHT,
    )
}
