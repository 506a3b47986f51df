use crate::config::settings::{Settings, validate_rate};
use crate::foundation::error::{SlidereelError, SlidereelResult};

/// One narrated slide as written in the script.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SlideEntry {
    /// 0-based position in the script's slide list.
    pub index: usize,
    /// 1-based page number in the source document.
    pub page: u32,
    /// Narration text; may contain `[pause]` markers.
    pub text: String,
    /// Per-slide voice override.
    pub voice: Option<String>,
    /// Per-slide speech rate override.
    pub rate: Option<String>,
    /// Free-form note, never rendered.
    pub note: Option<String>,
}

impl SlideEntry {
    /// Voice used for this slide after falling back to the global setting.
    ///
    /// Empty overrides count as absent.
    pub fn effective_voice<'a>(&'a self, settings: &'a Settings) -> &'a str {
        non_empty(self.voice.as_deref()).unwrap_or(&settings.voice)
    }

    /// Speech rate used for this slide after falling back to the global setting.
    pub fn effective_rate<'a>(&'a self, settings: &'a Settings) -> &'a str {
        non_empty(self.rate.as_deref()).unwrap_or(&settings.rate)
    }

    /// Check the fields only this slide depends on.
    ///
    /// A bad slide fails on its own; it is not an error for the script as a whole.
    pub fn validate(&self) -> SlidereelResult<()> {
        if self.page == 0 {
            return Err(SlidereelError::validation(format!(
                "slide {}: page numbers are 1-based, got 0",
                self.index
            )));
        }
        if let Some(rate) = non_empty(self.rate.as_deref()) {
            validate_rate(rate).map_err(|e| match e {
                SlidereelError::Validation(msg) => {
                    SlidereelError::validation(format!("slide {}: {msg}", self.index))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

/// Parsed script: effective settings plus the ordered slide list.
#[derive(Clone, Debug, PartialEq)]
pub struct Script {
    /// Defaults overlaid with the script's `global_settings`.
    pub settings: Settings,
    /// Slides in sequence order; `slides[i].index == i`.
    pub slides: Vec<SlideEntry>,
}

impl Script {
    /// Validate the settings and the slide ordering.
    ///
    /// Per-slide fields are checked by [`SlideEntry::validate`] when that slide runs.
    pub fn validate(&self) -> SlidereelResult<()> {
        self.settings.validate()?;
        for (i, slide) in self.slides.iter().enumerate() {
            if slide.index != i {
                return Err(SlidereelError::validation(format!(
                    "slide at position {i} carries index {}",
                    slide.index
                )));
            }
        }
        Ok(())
    }
}
