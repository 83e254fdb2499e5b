use crate::{
    error::{Error, Result},
    store::{self, Storage},
    timer::Mode,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, rc::Rc};

pub const DEFAULT_FOCUS_COLOR: &str = "#b91c1c";
pub const DEFAULT_BREAK_COLOR: &str = "#34d399";
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub value: &'static str,
}

pub static PRESETS: [Preset; 14] = [
    Preset { name: "Keshi Red", value: "#b91c1c" },
    Preset { name: "Crimson", value: "#991b1b" },
    Preset { name: "Rose", value: "#be123c" },
    Preset { name: "Orange", value: "#c2410c" },
    Preset { name: "Amber", value: "#b45309" },
    Preset { name: "Keshi Green", value: "#34d399" },
    Preset { name: "Emerald", value: "#059669" },
    Preset { name: "Teal", value: "#0d9488" },
    Preset { name: "Cyan", value: "#0891b2" },
    Preset { name: "Sky", value: "#0284c7" },
    Preset { name: "Indigo", value: "#4338ca" },
    Preset { name: "Violet", value: "#7c3aed" },
    Preset { name: "Fuchsia", value: "#c026d3" },
    Preset { name: "Pink", value: "#db2777" },
];

/// Named preset matching `value`, if any.
pub fn preset_named(value: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.value.eq_ignore_ascii_case(value))
}

/// Preset `step` places away from `current`, wrapping. A custom color starts
/// from the first preset going forward or the last going back.
pub fn cycle_preset(current: &str, step: isize) -> &'static Preset {
    let len = PRESETS.len() as isize;
    let index = match PRESETS.iter().position(|p| p.value.eq_ignore_ascii_case(current)) {
        Some(i) => (i as isize + step).rem_euclid(len),
        None if step >= 0 => 0,
        None => len - 1,
    };
    &PRESETS[index as usize]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    pub focus: String,
    #[serde(rename = "break")]
    pub break_: String,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            focus: DEFAULT_FOCUS_COLOR.into(),
            break_: DEFAULT_BREAK_COLOR.into(),
        }
    }
}

impl ThemeColors {
    pub fn get(&self, mode: Mode) -> &str {
        match mode {
            Mode::Focus => &self.focus,
            Mode::Break => &self.break_,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn key(self) -> &'static str {
        match self {
            Self::Left => store::THEME_IMAGE_LEFT,
            Self::Right => store::THEME_IMAGE_RIGHT,
        }
    }
}

/// Parses `#rrggbb` into an RGB terminal color.
pub fn parse_hex(value: &str) -> Result<Color> {
    let invalid = || Error::InvalidColor(value.to_owned());
    let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn mime_for(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "gif" => Ok("image/gif"),
        "webp" => Ok("image/webp"),
        "svg" => Ok("image/svg+xml"),
        _ => Err(Error::Image(format!("unsupported image type: {}", path.display()))),
    }
}

/// Reads an image file into a `data:<mime>;base64,...` URL.
pub fn encode_image(path: &Path) -> Result<String> {
    let mime = mime_for(path)?;
    let bytes = fs::read(path)?;
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(Error::Image(format!(
            "{} is {} bytes, limit is {}",
            path.display(),
            bytes.len(),
            MAX_IMAGE_BYTES
        )));
    }
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

/// Approximate decoded size of a base64 data URL, for display.
pub fn image_size(data_url: &str) -> usize {
    data_url
        .split_once(',')
        .map(|(_, payload)| payload.len() / 4 * 3)
        .unwrap_or(0)
}

pub struct ThemeStore {
    colors: ThemeColors,
    left_image: Option<String>,
    right_image: Option<String>,
    storage: Rc<dyn Storage>,
}

impl ThemeStore {
    pub fn load(storage: Rc<dyn Storage>) -> Self {
        let colors = store::load::<ThemeColors>(storage.as_ref(), store::THEME_COLORS)
            .filter(|c| parse_hex(&c.focus).is_ok() && parse_hex(&c.break_).is_ok())
            .unwrap_or_default();
        let left_image = store::load(storage.as_ref(), store::THEME_IMAGE_LEFT);
        let right_image = store::load(storage.as_ref(), store::THEME_IMAGE_RIGHT);
        Self { colors, left_image, right_image, storage }
    }

    pub fn colors(&self) -> &ThemeColors {
        &self.colors
    }

    /// Accent for `mode`, as a terminal color.
    pub fn accent(&self, mode: Mode) -> Color {
        parse_hex(self.colors.get(mode)).unwrap_or(Color::Reset)
    }

    pub fn image(&self, side: Side) -> Option<&str> {
        match side {
            Side::Left => self.left_image.as_deref(),
            Side::Right => self.right_image.as_deref(),
        }
    }

    pub fn update_color(&mut self, mode: Mode, value: &str) -> Result<()> {
        parse_hex(value)?;
        let value = value.trim().to_ascii_lowercase();
        match mode {
            Mode::Focus => self.colors.focus = value,
            Mode::Break => self.colors.break_ = value,
        }
        store::persist(self.storage.as_ref(), store::THEME_COLORS, &self.colors);
        tracing::info!(?mode, color = self.colors.get(mode), "accent color updated");
        Ok(())
    }

    /// Moves the accent for `mode` one preset forward (`step > 0`) or back.
    pub fn cycle_color(&mut self, mode: Mode, step: isize) -> Result<&'static Preset> {
        let preset = cycle_preset(self.colors.get(mode), step);
        self.update_color(mode, preset.value)?;
        Ok(preset)
    }

    /// Stores already-encoded image data, or clears the side with `None`.
    pub fn update_image(&mut self, side: Side, image: Option<String>) {
        match &image {
            Some(data) => store::persist(self.storage.as_ref(), side.key(), data),
            None => store::forget(self.storage.as_ref(), side.key()),
        }
        tracing::info!(?side, set = image.is_some(), "decor image updated");
        match side {
            Side::Left => self.left_image = image,
            Side::Right => self.right_image = image,
        }
    }

    /// Reads `path` and stores it as the image for `side`.
    pub fn load_image(&mut self, side: Side, path: &Path) -> Result<()> {
        let data = encode_image(path)?;
        self.update_image(side, Some(data));
        Ok(())
    }

    pub fn reset(&mut self) {
        self.colors = ThemeColors::default();
        store::persist(self.storage.as_ref(), store::THEME_COLORS, &self.colors);
        self.update_image(Side::Left, None);
        self.update_image(Side::Right, None);
        tracing::info!("theme reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex("#b91c1c").unwrap(), Color::Rgb(0xb9, 0x1c, 0x1c));
        assert_eq!(parse_hex("#34D399").unwrap(), Color::Rgb(0x34, 0xd3, 0x99));
        assert!(parse_hex("b91c1c").is_err());
        assert!(parse_hex("#b91c1").is_err());
        assert!(parse_hex("#zzzzzz").is_err());
    }

    #[test]
    fn corrupt_colors_fall_back_to_defaults() {
        let storage: Rc<dyn Storage> = Rc::new(MemoryStorage::new());
        storage.write(store::THEME_COLORS, r#"{"focus":"red"}"#).unwrap();
        let theme = ThemeStore::load(storage);
        assert_eq!(theme.colors(), &ThemeColors::default());
    }

    #[test]
    fn color_updates_persist() {
        let storage: Rc<dyn Storage> = Rc::new(MemoryStorage::new());
        let mut theme = ThemeStore::load(storage.clone());
        theme.update_color(Mode::Break, "#123ABC").unwrap();
        assert!(theme.update_color(Mode::Focus, "blue").is_err());

        let reloaded = ThemeStore::load(storage);
        assert_eq!(reloaded.colors().break_, "#123abc");
        assert_eq!(reloaded.colors().focus, DEFAULT_FOCUS_COLOR);
        assert_eq!(reloaded.accent(Mode::Break), Color::Rgb(0x12, 0x3a, 0xbc));
    }

    #[test]
    fn presets_cycle_and_wrap() {
        assert_eq!(cycle_preset(DEFAULT_FOCUS_COLOR, 1).name, "Crimson");
        assert_eq!(cycle_preset(DEFAULT_FOCUS_COLOR, -1).name, "Pink");
        assert_eq!(cycle_preset("#DB2777", 1).name, "Keshi Red");
        assert_eq!(cycle_preset("#000000", 1).name, "Keshi Red");
        assert_eq!(cycle_preset("#000000", -1).name, "Pink");
        assert!(PRESETS.iter().all(|p| parse_hex(p.value).is_ok()));
        assert_eq!(preset_named(DEFAULT_BREAK_COLOR).map(|p| p.name), Some("Keshi Green"));
    }

    #[test]
    fn cycling_color_persists_the_preset() {
        let storage: Rc<dyn Storage> = Rc::new(MemoryStorage::new());
        let mut theme = ThemeStore::load(storage.clone());
        let preset = theme.cycle_color(Mode::Break, 1).unwrap();
        assert_eq!(preset.name, "Emerald");
        assert_eq!(ThemeStore::load(storage).colors().break_, "#059669");
    }

    #[test]
    fn colors_serialize_with_mode_names() {
        let json = serde_json::to_string(&ThemeColors::default()).unwrap();
        assert_eq!(json, r##"{"focus":"#b91c1c","break":"#34d399"}"##);
    }

    #[test]
    fn encodes_images_as_data_urls() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("left.PNG");
        fs::write(&png, [1u8, 2, 3]).unwrap();
        assert_eq!(encode_image(&png).unwrap(), "data:image/png;base64,AQID");
        assert_eq!(image_size("data:image/png;base64,AQID"), 3);

        let txt = dir.path().join("notes.txt");
        fs::write(&txt, "hi").unwrap();
        assert!(matches!(encode_image(&txt), Err(Error::Image(_))));
    }
}
