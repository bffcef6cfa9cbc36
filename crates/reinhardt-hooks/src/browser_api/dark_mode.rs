//! Dark mode preference: use_dark_mode
//!
//! Combines the OS colour-scheme preference with a user choice persisted in
//! local storage. The document element's class list and the
//! `<meta name="theme-color">` tags follow the effective mode.

use reinhardt_reactive::{Cleanup, Effect, Signal};
use serde::{Deserialize, Serialize};

use super::media_query::{MediaQuery, use_media_query};
use super::storage::{StorageSetter, StorageState, use_local_storage};
use crate::misc::{UpdateEffect, use_is_client, use_update_effect};
use crate::platform::{self, Platform};

/// Storage key of the user preference
pub const DARK_MODE_STORAGE_KEY: &str = "dark-mode";

/// Query reporting the OS dark preference
pub const DARK_SCHEME_QUERY: &str = "(prefers-color-scheme: dark)";

const LIGHT_SCHEME_QUERY: &str = "(prefers-color-scheme: light)";
const THEME_COLOR_SELECTOR: &str = "meta[name=\"theme-color\"]";

/// Options of [`use_dark_mode`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DarkModeOptions {
	/// Preference used when nothing is stored; defaults to the OS preference
	pub initial: Option<bool>,
	/// `(dark, light)` classes toggled on the document element
	pub doc_class_names: Option<(String, String)>,
}

impl DarkModeOptions {
	/// Set `initial`
	pub fn initial(mut self, initial: bool) -> Self {
		self.initial = Some(initial);
		self
	}

	/// Set the `(dark, light)` document classes
	pub fn doc_class_names(mut self, dark: impl Into<String>, light: impl Into<String>) -> Self {
		self.doc_class_names = Some((dark.into(), light.into()));
		self
	}
}

#[derive(Debug, Default, Clone)]
struct ThemeColors {
	light: Option<String>,
	dark: Option<String>,
}

impl ThemeColors {
	/// Light colours have no media or the light media; everything else is dark
	fn capture(platform: &dyn Platform) -> Self {
		let mut colors = Self::default();
		for meta in platform.query_selector_all(THEME_COLOR_SELECTOR) {
			let Some(color) = meta.attribute("content").filter(|color| !color.is_empty()) else {
				continue;
			};
			match meta.attribute("media").as_deref() {
				None | Some("") | Some(LIGHT_SCHEME_QUERY) => colors.light = Some(color),
				Some(_) => colors.dark = Some(color),
			}
		}
		colors
	}

	fn for_mode(&self, dark: bool) -> Option<&str> {
		if dark { self.dark.as_deref() } else { self.light.as_deref() }
	}
}

fn effective(stored: &Signal<Option<bool>>, os: &Signal<bool>) -> bool {
	stored.get().unwrap_or_else(|| os.get())
}

/// Handle returned by [`use_dark_mode`]
pub struct DarkMode {
	_theme_color: UpdateEffect,
	_classes: Effect,
	_follow_os: UpdateEffect,
	stored: StorageState<bool>,
	os: MediaQuery,
	is_client: Signal<bool>,
}

impl DarkMode {
	/// Effective mode: the stored preference, else the OS one; `false` off-client
	pub fn is_dark_mode(&self) -> bool {
		self.is_client.get() && effective(&self.stored.signal(), &self.os.signal())
	}

	/// OS preference; `false` off-client
	pub fn is_dark_os(&self) -> bool {
		self.is_client.get() && self.os.matches()
	}

	/// Flip the stored preference
	pub fn toggle_dark_mode(&self) {
		let os = self.os.signal().get_untracked();
		self.stored
			.update(|previous| Some(!previous.copied().unwrap_or(os)));
	}

	/// Store a dark preference
	pub fn enable_dark_mode(&self) {
		self.stored.set(Some(true));
	}

	/// Store a light preference
	pub fn disable_dark_mode(&self) {
		self.stored.set(Some(false));
	}
}

/// Tracks and controls the colour scheme.
///
/// An OS preference change after mount overwrites the stored preference.
/// `<meta name="theme-color">` contents are captured at mount and swapped on
/// later mode changes when a colour for the new mode exists.
///
/// # Example
///
/// ```ignore
/// use reinhardt_hooks::browser_api::{use_dark_mode, DarkModeOptions};
///
/// let dark_mode = use_dark_mode(DarkModeOptions::default().doc_class_names("dark", "light"));
/// dark_mode.toggle_dark_mode();
/// ```
pub fn use_dark_mode(options: DarkModeOptions) -> DarkMode {
	let platform = platform::current();
	let is_client = use_is_client();
	let os = use_media_query(DARK_SCHEME_QUERY);
	let os_signal = os.signal();

	let initial = options.initial.unwrap_or_else(|| os_signal.get_untracked());
	let stored = use_local_storage(DARK_MODE_STORAGE_KEY, Some(initial));
	let stored_signal = stored.signal();

	let follow_os = use_update_effect(
		{
			let os_signal = os_signal.clone();
			move || os_signal.get()
		},
		{
			let setter: StorageSetter<bool> = stored.setter();
			move |dark: &bool| {
				setter.set(Some(*dark));
				Cleanup::none()
			}
		},
	);

	let classes = Effect::new({
		let platform = platform.clone();
		let stored_signal = stored_signal.clone();
		let os_signal = os_signal.clone();
		move || {
			let dark = effective(&stored_signal, &os_signal);
			let Some((dark_class, light_class)) = &options.doc_class_names else {
				return;
			};
			let Some(root) = platform.document_element() else {
				return;
			};
			if !dark_class.is_empty() {
				root.toggle_class(dark_class, dark);
			}
			if !light_class.is_empty() {
				root.toggle_class(light_class, !dark);
			}
		}
	});

	let colors = ThemeColors::capture(platform.as_ref());
	let theme_color = use_update_effect(
		move || effective(&stored_signal, &os_signal),
		move |dark: &bool| {
			let Some(color) = colors.for_mode(*dark) else {
				return Cleanup::none();
			};
			for meta in platform.query_selector_all(THEME_COLOR_SELECTOR) {
				meta.set_attribute("content", color);
			}
			Cleanup::none()
		},
	);

	DarkMode {
		_theme_color: theme_color,
		_classes: classes,
		_follow_os: follow_os,
		stored,
		os,
		is_client,
	}
}
