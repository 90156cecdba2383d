//! Recipe page parsing.
//!
//! Detail pages are reduced to a [`RecipeDetail`]: the schema.org Recipe
//! JSON-LD node plus the few values chefkoch only renders as HTML. Every
//! attribute then has its own extraction function returning
//! `Result<T, FieldError>`; [`extract_attributes`] substitutes the field's
//! default whenever one of them fails.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use crate::error::{ExtractError, FieldError};
use crate::types::{RecipeAttributes, RecipeLink, RecipeStatus, TITLE_UNKNOWN};

/// Regex to find JSON-LD script tags (case-insensitive for type attribute)
static JSONLD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("Invalid JSON-LD regex")
});

/// ISO 8601 durations as used by schema.org, e.g. "PT45M" or "P0DT1H30M".
static ISO_DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$")
        .expect("Invalid duration regex")
});

/// German duration parts, e.g. "1 Std. 30 Min." or "12 Stunden".
static GERMAN_DURATION_PART_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(tage?|stunden?|std\.?|minuten|min\.?)")
        .expect("Invalid german duration regex")
});

static REST_TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)Ruhezeit\W*(?:ca\.?\s*)?((?:\d+\s*(?:tage?|stunden?|std\.?|minuten|min\.?)\s*)+)",
    )
    .expect("Invalid rest time regex")
});

static DIFFICULTY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(simpel|normal|pfiffig)\b").expect("Invalid difficulty regex")
});

static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("Invalid number regex"));

static RECIPE_PATH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/rezepte/\d+/").expect("Invalid recipe path regex"));

static JSONLD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script[type='application/ld+json']").expect("Invalid selector")
});
static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("Invalid selector"));
static DIFFICULTY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[class*="difficulty"]"#).expect("Invalid selector"));
static OG_IMAGE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:image"]"#).expect("Invalid selector")
});
static CANONICAL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"link[rel="canonical"]"#).expect("Invalid selector"));
static OG_URL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:url"]"#).expect("Invalid selector"));
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("Invalid selector"));

/// A parsed recipe detail page.
#[derive(Debug, Clone)]
pub struct RecipeDetail {
    url: String,
    /// The schema.org Recipe object.
    recipe: Value,
    difficulty: Option<String>,
    /// Raw rest time text, e.g. "12 Std.".
    rest_time: Option<String>,
    og_image: Option<String>,
}

impl RecipeDetail {
    /// Parse a detail page. Fails only when the page carries no Recipe at all.
    pub fn parse(html: &str, url: &str) -> Result<Self, ExtractError> {
        let document = Html::parse_document(html);

        let recipe = find_recipe_jsonld_fast(html)
            .or_else(|| find_recipe_jsonld_dom(&document))
            .ok_or(ExtractError::NoRecipe)?;

        let page_text = body_text(&document);

        Ok(Self {
            url: url.to_string(),
            recipe,
            difficulty: extract_difficulty(&document),
            rest_time: REST_TIME_REGEX
                .captures(&page_text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string()),
            og_image: first_attr(&document, &OG_IMAGE_SELECTOR, "content"),
        })
    }

    /// Build a detail from an already extracted Recipe object.
    pub fn from_json_ld(url: &str, recipe: Value) -> Self {
        Self {
            url: url.to_string(),
            recipe,
            difficulty: None,
            rest_time: None,
            og_image: None,
        }
    }

    pub fn with_difficulty(mut self, difficulty: &str) -> Self {
        self.difficulty = Some(difficulty.to_string());
        self
    }

    pub fn with_rest_time(mut self, rest_time: &str) -> Self {
        self.rest_time = Some(rest_time.to_string());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> Result<String, FieldError> {
        self.non_empty_str("name")
    }

    pub fn image_url(&self) -> Result<String, FieldError> {
        extract_image_urls(&self.recipe)
            .into_iter()
            .next()
            .or_else(|| self.og_image.clone())
            .ok_or(FieldError::Missing("image"))
    }

    pub fn total_time(&self) -> Result<u32, FieldError> {
        self.iso_minutes("totalTime")
    }

    pub fn prep_time(&self) -> Result<u32, FieldError> {
        self.iso_minutes("prepTime")
    }

    pub fn cook_time(&self) -> Result<u32, FieldError> {
        self.iso_minutes("cookTime")
    }

    pub fn rest_time(&self) -> Result<u32, FieldError> {
        let text = self
            .rest_time
            .as_deref()
            .ok_or(FieldError::Missing("restTime"))?;
        parse_german_duration(text).ok_or_else(|| FieldError::Invalid {
            field: "restTime",
            reason: format!("unparseable duration {:?}", text),
        })
    }

    pub fn calories(&self) -> Result<u32, FieldError> {
        let value = self
            .recipe
            .get("nutrition")
            .and_then(|n| n.get("calories"))
            .ok_or(FieldError::Missing("nutrition.calories"))?;
        json_number(value, "nutrition.calories").map(|n| n.round() as u32)
    }

    pub fn difficulty(&self) -> Result<String, FieldError> {
        self.difficulty
            .clone()
            .ok_or(FieldError::Missing("difficulty"))
    }

    pub fn ingredients(&self) -> Result<Vec<String>, FieldError> {
        let raw = self
            .field("recipeIngredient")?
            .as_array()
            .ok_or_else(|| FieldError::Invalid {
                field: "recipeIngredient",
                reason: "not an array".to_string(),
            })?;

        Ok(raw
            .iter()
            .filter_map(|v| v.as_str())
            .map(collapse_whitespace)
            .filter(|s| !s.is_empty())
            .collect())
    }

    pub fn instructions(&self) -> Result<String, FieldError> {
        match self.field("recipeInstructions")? {
            Value::String(s) => Ok(s.trim().to_string()),
            Value::Array(arr) => {
                let steps: Vec<String> = arr.iter().filter_map(instruction_text).collect();
                if steps.is_empty() {
                    return Err(FieldError::Invalid {
                        field: "recipeInstructions",
                        reason: "no steps".to_string(),
                    });
                }
                Ok(steps.join("\n\n"))
            }
            _ => Err(FieldError::Invalid {
                field: "recipeInstructions",
                reason: "not a string or array".to_string(),
            }),
        }
    }

    pub fn category(&self) -> Result<String, FieldError> {
        match self.field("recipeCategory")? {
            Value::String(s) => Ok(s.trim().to_string()),
            Value::Array(arr) => Ok(arr
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", ")),
            _ => Err(FieldError::Invalid {
                field: "recipeCategory",
                reason: "not a string or array".to_string(),
            }),
        }
    }

    pub fn servings(&self) -> Result<u32, FieldError> {
        let value = match self.field("recipeYield")? {
            Value::Array(arr) => arr.first().ok_or(FieldError::Missing("recipeYield"))?,
            other => other,
        };
        json_number(value, "recipeYield").map(|n| n as u32)
    }

    pub fn rating(&self) -> Result<f64, FieldError> {
        let value = self
            .recipe
            .get("aggregateRating")
            .and_then(|r| r.get("ratingValue"))
            .ok_or(FieldError::Missing("aggregateRating.ratingValue"))?;
        json_number(value, "aggregateRating.ratingValue")
    }

    pub fn rating_count(&self) -> Result<u32, FieldError> {
        let rating = self
            .recipe
            .get("aggregateRating")
            .ok_or(FieldError::Missing("aggregateRating"))?;
        let value = rating
            .get("ratingCount")
            .or_else(|| rating.get("reviewCount"))
            .ok_or(FieldError::Missing("aggregateRating.ratingCount"))?;
        json_number(value, "aggregateRating.ratingCount").map(|n| n as u32)
    }

    fn field(&self, name: &'static str) -> Result<&Value, FieldError> {
        match self.recipe.get(name) {
            None | Some(Value::Null) => Err(FieldError::Missing(name)),
            Some(value) => Ok(value),
        }
    }

    fn non_empty_str(&self, name: &'static str) -> Result<String, FieldError> {
        let value = self.field(name)?.as_str().ok_or_else(|| FieldError::Invalid {
            field: name,
            reason: "not a string".to_string(),
        })?;
        let value = collapse_whitespace(value);
        if value.is_empty() {
            return Err(FieldError::Missing(name));
        }
        Ok(value)
    }

    fn iso_minutes(&self, name: &'static str) -> Result<u32, FieldError> {
        let text = self.field(name)?.as_str().ok_or_else(|| FieldError::Invalid {
            field: name,
            reason: "not a string".to_string(),
        })?;
        parse_iso_duration(text).ok_or_else(|| FieldError::Invalid {
            field: name,
            reason: format!("unparseable duration {:?}", text),
        })
    }
}

/// Build the published attributes of a recipe.
///
/// Each field is read on its own; a failing field falls back to its default
/// and never affects the others.
pub fn extract_attributes(detail: &RecipeDetail) -> RecipeAttributes {
    RecipeAttributes {
        title: or_default(detail.title(), TITLE_UNKNOWN.to_string()),
        url: detail.url().to_string(),
        image_url: or_default(detail.image_url(), String::new()),
        total_time: or_default(detail.total_time(), 0),
        prep_time: or_default(detail.prep_time(), 0),
        cook_time: or_default(detail.cook_time(), 0),
        rest_time: or_default(detail.rest_time(), 0),
        calories: or_default(detail.calories().map(Some), None),
        difficulty: or_default(detail.difficulty(), String::new()),
        ingredients: or_default(detail.ingredients(), Vec::new()),
        instructions: or_default(detail.instructions(), String::new()),
        category: or_default(detail.category(), String::new()),
        servings: or_default(detail.servings(), 0),
        rating: or_default(detail.rating(), 0.0),
        rating_count: or_default(detail.rating_count(), 0),
        status: RecipeStatus::Success,
        error_message: None,
    }
}

fn or_default<T>(value: Result<T, FieldError>, default: T) -> T {
    value.unwrap_or_else(|e| {
        tracing::debug!(error = %e, "using default for recipe field");
        default
    })
}

/// Minutes in an ISO 8601 duration. Seconds are truncated.
pub fn parse_iso_duration(text: &str) -> Option<u32> {
    let caps = ISO_DURATION_REGEX.captures(text.trim())?;
    if (1..=4).all(|i| caps.get(i).is_none()) {
        return None;
    }

    let part = |i: usize| -> f64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };

    let minutes = part(1) * 1440.0 + part(2) * 60.0 + part(3) + part(4) / 60.0;
    Some(minutes.floor() as u32)
}

/// Minutes in a German duration such as "1 Std. 30 Min." or "2 Tage".
pub fn parse_german_duration(text: &str) -> Option<u32> {
    let mut total = 0u32;
    let mut matched = false;

    for caps in GERMAN_DURATION_PART_REGEX.captures_iter(text) {
        let amount: u32 = caps[1].parse().ok()?;
        let unit = caps[2].to_lowercase();
        let factor = if unit.starts_with("tag") {
            1440
        } else if unit.starts_with("st") {
            60
        } else {
            1
        };
        total = total.saturating_add(amount.saturating_mul(factor));
        matched = true;
    }

    matched.then_some(total)
}

/// Recipe links on a list page, absolute, deduplicated, in page order.
pub fn extract_recipe_links(html: &str, base: &Url) -> Vec<RecipeLink> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(mut url) = base.join(href) else {
            continue;
        };
        if !RECIPE_PATH_REGEX.is_match(url.path()) {
            continue;
        }
        url.set_query(None);
        url.set_fragment(None);

        if !seen.insert(url.to_string()) {
            continue;
        }

        let title = anchor
            .value()
            .attr("title")
            .map(collapse_whitespace)
            .or_else(|| Some(collapse_whitespace(&anchor.text().collect::<String>())))
            .filter(|t| !t.is_empty());

        links.push(RecipeLink {
            url: url.to_string(),
            title,
        });
    }

    links
}

/// The canonical url a page declares for itself.
pub fn extract_canonical_url(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    first_attr(&document, &CANONICAL_SELECTOR, "href")
        .or_else(|| first_attr(&document, &OG_URL_SELECTOR, "content"))
}

/// Whether `url` points at a recipe detail page.
pub fn is_recipe_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| RECIPE_PATH_REGEX.is_match(u.path()))
        .unwrap_or(false)
}

/// Fast JSON-LD extraction using regex to avoid walking the DOM.
fn find_recipe_jsonld_fast(html: &str) -> Option<Value> {
    JSONLD_REGEX
        .captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .find_map(|m| parse_recipe_json(m.as_str()))
}

/// DOM-based JSON-LD extraction for markup the regex misses.
fn find_recipe_jsonld_dom(document: &Html) -> Option<Value> {
    document
        .select(&JSONLD_SELECTOR)
        .find_map(|element| parse_recipe_json(&element.inner_html()))
}

fn parse_recipe_json(json_text: &str) -> Option<Value> {
    let json: Value = serde_json::from_str(&sanitize_json(json_text)).ok()?;
    find_recipe_in_json(&json).cloned()
}

/// Sanitize JSON-LD content to handle common malformed patterns.
/// Some sites include literal newlines/tabs inside JSON strings instead of escaped versions.
fn sanitize_json(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in json.chars() {
        if in_string {
            match c {
                _ if escaped => {
                    escaped = false;
                    result.push(c);
                }
                '\\' => {
                    escaped = true;
                    result.push(c);
                }
                '"' => {
                    in_string = false;
                    result.push(c);
                }
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '\t' => result.push_str("\\t"),
                c if c.is_control() => {}
                _ => result.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            result.push(c);
        }
    }

    result
}

/// Recursively search for a Recipe object in JSON-LD.
/// Handles @graph arrays and nested structures.
fn find_recipe_in_json(json: &Value) -> Option<&Value> {
    match json {
        Value::Object(obj) => {
            let is_recipe = match obj.get("@type") {
                Some(Value::String(s)) => s == "Recipe",
                Some(Value::Array(arr)) => arr.iter().any(|v| v == "Recipe"),
                _ => false,
            };
            if is_recipe {
                return Some(json);
            }
            obj.values().find_map(find_recipe_in_json)
        }
        Value::Array(arr) => arr.iter().find_map(find_recipe_in_json),
        _ => None,
    }
}

fn instruction_text(item: &Value) -> Option<String> {
    // HowToStep
    if let Some(text) = item.get("text").and_then(|v| v.as_str()) {
        return Some(text.trim().to_string());
    }
    if let Some(s) = item.as_str() {
        return Some(s.trim().to_string());
    }
    // HowToSection
    let section: Vec<String> = item
        .get("itemListElement")?
        .as_array()?
        .iter()
        .filter_map(|step| step.get("text").and_then(|v| v.as_str()))
        .map(|s| s.trim().to_string())
        .collect();
    (!section.is_empty()).then(|| section.join("\n"))
}

fn extract_image_urls(recipe: &Value) -> Vec<String> {
    let from_item = |item: &Value| -> Option<String> {
        match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj.get("url").and_then(|v| v.as_str()).map(String::from),
            _ => None,
        }
    };

    let urls: Vec<String> = match recipe.get("image") {
        Some(Value::Array(arr)) => arr.iter().filter_map(from_item).collect(),
        Some(item) => from_item(item).into_iter().collect(),
        None => Vec::new(),
    };

    urls.into_iter()
        .filter(|url| !url.trim().is_empty())
        .collect()
}

/// A number from a JSON number or the first number inside a string
/// ("4 Portionen", "520 kcal", "4,5").
fn json_number(value: &Value, field: &'static str) -> Result<f64, FieldError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| FieldError::Invalid {
            field,
            reason: format!("not representable: {}", n),
        }),
        Value::String(s) => NUMBER_REGEX
            .find(s)
            .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
            .ok_or_else(|| FieldError::Invalid {
                field,
                reason: format!("no number in {:?}", s),
            }),
        _ => Err(FieldError::Invalid {
            field,
            reason: "not a number or string".to_string(),
        }),
    }
}

fn extract_difficulty(document: &Html) -> Option<String> {
    document
        .select(&DIFFICULTY_SELECTOR)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find_map(|text| {
            DIFFICULTY_REGEX
                .captures(&text)
                .map(|c| c[1].to_lowercase())
        })
}

fn body_text(document: &Html) -> String {
    document
        .select(&BODY_SELECTOR)
        .next()
        .map(|body| collapse_whitespace(&body.text().collect::<Vec<_>>().join(" ")))
        .unwrap_or_default()
}

fn first_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DETAIL_HTML: &str = r#"<!DOCTYPE html>
<html><head>
<meta property="og:image" content="https://img.chefkoch-cdn.de/og.jpg">
<script type="application/ld+json">{"@context":"http://schema.org","@type":"BreadcrumbList","itemListElement":[]}</script>
<script type="application/ld+json">
{
  "@context": "http://schema.org",
  "@type": "Recipe",
  "name": "Kürbissuppe",
  "image": "https://img.chefkoch-cdn.de/kuerbis.jpg",
  "recipeYield": "4 Portionen",
  "prepTime": "P0DT0H20M",
  "cookTime": "P0DT0H25M",
  "totalTime": "P0DT0H45M",
  "recipeCategory": ["Suppe", "Herbst"],
  "recipeIngredient": ["1 kg  Hokkaido", "2 Zwiebeln", " "],
  "recipeInstructions": "Kürbis würfeln.
Alles kochen und pürieren.",
  "nutrition": {"@type": "NutritionInformation", "calories": "310 kcal"},
  "aggregateRating": {"@type": "AggregateRating", "ratingValue": 4.62, "ratingCount": 1234}
}
</script>
</head><body>
<span class="recipe-difficulty rds-recipe-meta__badge"><i class="icon"></i> simpel</span>
<p>Arbeitszeit ca. 20 Minuten Ruhezeit ca. 1 Std. 30 Min. Gesamtzeit ca. 2 Std.</p>
</body></html>"#;

    #[test]
    fn parses_full_detail_page() {
        let detail = RecipeDetail::parse(DETAIL_HTML, "https://www.chefkoch.de/rezepte/1/Kuerbissuppe.html")
            .unwrap();
        let attrs = extract_attributes(&detail);

        assert_eq!(attrs.title, "Kürbissuppe");
        assert_eq!(attrs.url, "https://www.chefkoch.de/rezepte/1/Kuerbissuppe.html");
        assert_eq!(attrs.image_url, "https://img.chefkoch-cdn.de/kuerbis.jpg");
        assert_eq!(attrs.total_time, 45);
        assert_eq!(attrs.prep_time, 20);
        assert_eq!(attrs.cook_time, 25);
        assert_eq!(attrs.rest_time, 90);
        assert_eq!(attrs.calories, Some(310));
        assert_eq!(attrs.difficulty, "simpel");
        assert_eq!(attrs.ingredients, vec!["1 kg Hokkaido", "2 Zwiebeln"]);
        assert_eq!(attrs.instructions, "Kürbis würfeln.\nAlles kochen und pürieren.");
        assert_eq!(attrs.category, "Suppe, Herbst");
        assert_eq!(attrs.servings, 4);
        assert!((attrs.rating - 4.62).abs() < f64::EPSILON);
        assert_eq!(attrs.rating_count, 1234);
        assert_eq!(attrs.status, RecipeStatus::Success);
    }

    #[test]
    fn page_without_recipe_fails_to_parse() {
        let html = r#"<html><head><script type="application/ld+json">{"@type":"WebSite"}</script></head></html>"#;
        assert!(matches!(
            RecipeDetail::parse(html, "https://www.chefkoch.de/"),
            Err(ExtractError::NoRecipe)
        ));
    }

    #[test]
    fn recipe_inside_graph_is_found() {
        let html = r#"<script type="application/ld+json">{"@graph":[{"@type":"WebPage"},{"@type":["Recipe"],"name":"Brot"}]}</script>"#;
        let detail = RecipeDetail::parse(html, "https://x/1").unwrap();
        assert_eq!(detail.title().unwrap(), "Brot");
    }

    #[test]
    fn broken_field_defaults_without_touching_others() {
        let detail = RecipeDetail::from_json_ld(
            "http://x/1",
            json!({
                "@type": "Recipe",
                "name": "Soup",
                "totalTime": "about an hour",
                "recipeIngredient": "not a list",
                "recipeYield": 2,
                "recipeCategory": "Suppe"
            }),
        );

        assert!(matches!(
            detail.total_time(),
            Err(FieldError::Invalid { field: "totalTime", .. })
        ));

        let attrs = extract_attributes(&detail);
        assert_eq!(attrs.total_time, 0);
        assert!(attrs.ingredients.is_empty());
        assert_eq!(attrs.title, "Soup");
        assert_eq!(attrs.servings, 2);
        assert_eq!(attrs.category, "Suppe");
        assert_eq!(attrs.calories, None);
        assert_eq!(attrs.image_url, "");
        assert_eq!(attrs.status, RecipeStatus::Success);
    }

    #[test]
    fn missing_title_defaults_to_unknown() {
        let detail = RecipeDetail::from_json_ld("http://x/1", json!({"@type": "Recipe"}));
        assert_eq!(detail.title(), Err(FieldError::Missing("name")));
        assert_eq!(extract_attributes(&detail).title, "Unknown");
    }

    #[test]
    fn instructions_from_steps_and_sections() {
        let detail = RecipeDetail::from_json_ld(
            "http://x/1",
            json!({
                "@type": "Recipe",
                "recipeInstructions": [
                    {"@type": "HowToStep", "text": " Teig kneten. "},
                    {"@type": "HowToSection", "itemListElement": [
                        {"text": "Formen."}, {"text": "Backen."}
                    ]}
                ]
            }),
        );
        assert_eq!(
            detail.instructions().unwrap(),
            "Teig kneten.\n\nFormen.\nBacken."
        );
    }

    #[test]
    fn rating_accepts_german_decimal_string() {
        let detail = RecipeDetail::from_json_ld(
            "http://x/1",
            json!({"@type": "Recipe", "aggregateRating": {"ratingValue": "4,5", "reviewCount": "12"}}),
        );
        assert!((detail.rating().unwrap() - 4.5).abs() < f64::EPSILON);
        assert_eq!(detail.rating_count().unwrap(), 12);
    }

    #[test]
    fn iso_durations() {
        assert_eq!(parse_iso_duration("PT45M"), Some(45));
        assert_eq!(parse_iso_duration("P0DT1H30M"), Some(90));
        assert_eq!(parse_iso_duration("P1D"), Some(1440));
        assert_eq!(parse_iso_duration("PT90S"), Some(1));
        assert_eq!(parse_iso_duration("P"), None);
        assert_eq!(parse_iso_duration("PT"), None);
        assert_eq!(parse_iso_duration("45 Minuten"), None);
    }

    #[test]
    fn german_durations() {
        assert_eq!(parse_german_duration("1 Std. 30 Min."), Some(90));
        assert_eq!(parse_german_duration("12 Stunden"), Some(720));
        assert_eq!(parse_german_duration("2 Tage"), Some(2880));
        assert_eq!(parse_german_duration("ca. 20 Minuten"), Some(20));
        assert_eq!(parse_german_duration("lange"), None);
    }

    #[test]
    fn rest_time_from_builder() {
        let detail = RecipeDetail::from_json_ld("http://x/1", json!({"@type": "Recipe"}))
            .with_rest_time("12 Std.")
            .with_difficulty("pfiffig");
        assert_eq!(detail.rest_time().unwrap(), 720);
        assert_eq!(detail.difficulty().unwrap(), "pfiffig");
    }

    #[test]
    fn og_image_used_when_recipe_has_none() {
        let html = r#"<html><head>
<meta property="og:image" content="https://img.example/og.jpg">
<script type="application/ld+json">{"@type":"Recipe","name":"Brot"}</script>
</head></html>"#;
        let detail = RecipeDetail::parse(html, "https://x/1").unwrap();
        assert_eq!(detail.image_url().unwrap(), "https://img.example/og.jpg");
    }

    #[test]
    fn list_links_are_absolute_unique_and_ordered() {
        let html = r#"<html><body>
<a href="/rezepte/123/Suppe.html?utm=x#top" title="Suppe">Suppe</a>
<a href="/rezepte/was-koche-ich-heute/">Heute</a>
<a href="https://www.chefkoch.de/rezepte/456/Kuchen.html"> Kuchen
</a>
<a href="/rezepte/123/Suppe.html">Suppe again</a>
<a href="https://www.chefkoch.de/magazin/artikel/1.html">Magazin</a>
</body></html>"#;
        let base = Url::parse("https://www.chefkoch.de/rezepte/was-koche-ich-heute/").unwrap();

        let links = extract_recipe_links(html, &base);

        assert_eq!(
            links,
            vec![
                RecipeLink {
                    url: "https://www.chefkoch.de/rezepte/123/Suppe.html".to_string(),
                    title: Some("Suppe".to_string()),
                },
                RecipeLink {
                    url: "https://www.chefkoch.de/rezepte/456/Kuchen.html".to_string(),
                    title: Some("Kuchen".to_string()),
                },
            ]
        );
    }

    #[test]
    fn canonical_url_prefers_link_then_og_url() {
        let with_link = r#"<head><link rel="canonical" href="https://www.chefkoch.de/rezepte/9/A.html"><meta property="og:url" content="https://other"></head>"#;
        assert_eq!(
            extract_canonical_url(with_link).as_deref(),
            Some("https://www.chefkoch.de/rezepte/9/A.html")
        );

        let og_only = r#"<head><meta property="og:url" content="https://www.chefkoch.de/rezepte/8/B.html"></head>"#;
        assert_eq!(
            extract_canonical_url(og_only).as_deref(),
            Some("https://www.chefkoch.de/rezepte/8/B.html")
        );

        assert!(is_recipe_url("https://www.chefkoch.de/rezepte/8/B.html"));
        assert!(!is_recipe_url("https://www.chefkoch.de/rezepte/zufallsrezept/"));
    }
}
