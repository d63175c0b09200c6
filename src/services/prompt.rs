use crate::models::comic::{ComicStyle, GenerateComicRequest};

/// Upper bound accepted by the image provider for a single prompt.
const MAX_PROMPT_CHARS: usize = 4000;

const DEFAULT_TITLE: &str = "Daily Life";
const DEFAULT_MOOD: &str = "neutral";
const DEFAULT_WEATHER: &str = "sunny";
const DEFAULT_LOCATION: &str = "home";

/// Inputs to the prompt builder. Blank optional fields count as unset.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub style: ComicStyle,
    pub title: Option<&'a str>,
    pub content: &'a str,
    pub mood: Option<&'a str>,
    pub weather: Option<&'a str>,
    pub location: Option<&'a str>,
}

impl<'a> From<&'a GenerateComicRequest> for PromptInput<'a> {
    fn from(request: &'a GenerateComicRequest) -> Self {
        Self {
            style: request.style,
            title: request.title.as_deref(),
            content: &request.content,
            mood: request.mood.as_deref(),
            weather: request.weather.as_deref(),
            location: request.location.as_deref(),
        }
    }
}

fn or_default<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(default)
}

fn style_directive(style: ComicStyle) -> &'static str {
    match style {
        ComicStyle::Cute => {
            "A cute four-panel webtoon comic strip drawn in a soft pastel palette \
             with round, chibi-style characters and gentle outlines."
        }
        ComicStyle::Comic => {
            "A lively four-panel comic strip in a bold cartoon style with \
             exaggerated expressions, clean ink lines and bright flat colors."
        }
        ComicStyle::Emotional => {
            "A heartfelt four-panel comic strip in a warm watercolor style with \
             soft lighting and expressive, introspective characters."
        }
    }
}

/// Title used when the request leaves it unset.
pub fn resolve_title(title: Option<&str>) -> String {
    or_default(title, DEFAULT_TITLE).to_string()
}

/// Build the image generation prompt for a diary entry.
///
/// Identical inputs always yield identical prompts. The diary content is
/// truncated (by characters) so the full prompt fits the provider limit.
pub fn build_prompt(input: &PromptInput<'_>) -> String {
    let title = or_default(input.title, DEFAULT_TITLE);
    let mood = or_default(input.mood, DEFAULT_MOOD);
    let weather = or_default(input.weather, DEFAULT_WEATHER);
    let location = or_default(input.location, DEFAULT_LOCATION);

    let header = format!(
        "{}\nTitle: \"{}\"\nMood: {}\nWeather: {}\nLocation: {}\nDiary entry: ",
        style_directive(input.style),
        title,
        mood,
        weather,
        location,
    );
    let footer = "\nTell the diary entry as a story across four sequential panels \
                  arranged in a 2x2 grid. Keep the same main character in every panel. \
                  Do not draw any text, captions or speech bubbles.";

    let budget = MAX_PROMPT_CHARS
        .saturating_sub(header.chars().count())
        .saturating_sub(footer.chars().count());
    let content: String = input.content.trim().chars().take(budget).collect();

    format!("{header}{content}{footer}")
}
