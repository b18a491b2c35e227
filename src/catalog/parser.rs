//! Guide page parser.
//!
//! Walks the page's headings and list items in document order:
//!
//! - `<h2>` opens a phase section (or an ignored section)
//! - `<h3>` opens a class subsection inside a phase
//! - `<h4>` / `<dt>` sets the item category inside a class
//! - `<li>` contributes its first item link under the current category
//!
//! Any structural surprise fails the whole parse.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::catalog::layout::{self, CONTENT_ANCHOR};
use crate::catalog::{Presets, html};
use crate::error::ParseError;
use crate::model::{ClassRole, ItemCategory, ItemReference, Phase};

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)<h2\b[^>]*>(?P<h2>.*?)</h2\s*>",
        r"|<h3\b[^>]*>(?P<h3>.*?)</h3\s*>",
        r"|<h4\b[^>]*>(?P<h4>.*?)</h4\s*>",
        r"|<dt\b[^>]*>(?P<dt>.*?)</dt\s*>",
        r"|<li\b[^>]*>(?P<li>.*?)</li\s*>",
    ))
    .expect("valid regex")
});

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)(<a\b[^>]*>)(.*?)</a\s*>").expect("valid regex"));

/// Parses guide page markup into [`Presets`].
#[derive(Debug, Clone)]
pub struct PageParser {
    base_url: String,
}

impl PageParser {
    /// Creates a parser resolving relative links against `base_url`
    /// (the wiki origin, e.g. `https://terraria.wiki.gg`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Parses a full page.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the content anchor, a phase section
    /// or a class subsection is missing or duplicated, or when a heading
    /// names an unknown phase, class or category.
    pub fn parse(&self, markup: &str) -> Result<Presets, ParseError> {
        let start = markup
            .find(CONTENT_ANCHOR)
            .ok_or(ParseError::MissingAnchor(CONTENT_ANCHOR))?;
        let body = &markup[start..];

        let mut builder = PresetBuilder::default();
        for caps in TOKEN_RE.captures_iter(body) {
            if let Some(m) = caps.name("h2") {
                builder.section(&html::heading_text(m.as_str()))?;
            } else if let Some(m) = caps.name("h3") {
                builder.subsection(&html::heading_text(m.as_str()))?;
            } else if let Some(m) = caps.name("h4").or_else(|| caps.name("dt")) {
                builder.category(&html::heading_text(m.as_str()))?;
            } else if let Some(m) = caps.name("li") {
                if let Some(target) = builder.item_target() {
                    self.list_item(m.as_str(), target, &mut builder)?;
                }
            }
        }

        let presets = builder.finish()?;
        debug!(items = presets.total_items(), "parsed guide page");
        Ok(presets)
    }

    fn list_item(
        &self,
        inner: &str,
        target: ItemTarget,
        builder: &mut PresetBuilder,
    ) -> Result<(), ParseError> {
        let Some(category) = target.category else {
            return Err(ParseError::ItemOutsideCategory {
                phase: target.phase,
                class: target.class,
                item: html::strip_tags(inner),
            });
        };
        match self.first_item_link(inner, category)? {
            Some(item) => builder.push(item),
            None => trace!(text = %html::strip_tags(inner), "list item without item link"),
        }
        Ok(())
    }

    fn first_item_link(
        &self,
        inner: &str,
        category: ItemCategory,
    ) -> Result<Option<ItemReference>, ParseError> {
        for caps in ANCHOR_RE.captures_iter(inner) {
            let open_tag = &caps[1];
            let Some(href) = html::attr(open_tag, "href") else {
                continue;
            };
            if !layout::is_item_link(&href) {
                continue;
            }
            let url = layout::resolve_link(&self.base_url, &href)
                .ok_or_else(|| ParseError::BadLink(href.clone()))?;

            let mut name = html::strip_tags(&caps[2]);
            if name.is_empty() {
                name = html::attr(open_tag, "title")
                    .map(|t| html::normalize_ws(&t))
                    .unwrap_or_default();
            }
            if name.is_empty() {
                return Err(ParseError::BadLink(href));
            }
            return Ok(Some(ItemReference {
                name,
                url,
                category,
            }));
        }
        Ok(None)
    }
}

/// Where the next list item would land.
#[derive(Debug, Clone, Copy)]
struct ItemTarget {
    phase: Phase,
    class: ClassRole,
    category: Option<ItemCategory>,
}

#[derive(Debug, Default)]
enum Cursor {
    /// Before the first section heading.
    #[default]
    Preamble,
    /// Inside a skipped section.
    Ignored,
    Phase {
        phase: Phase,
        class: Option<ClassRole>,
        category: Option<ItemCategory>,
    },
}

#[derive(Debug, Default)]
struct PresetBuilder {
    entries: BTreeMap<Phase, BTreeMap<ClassRole, Vec<ItemReference>>>,
    cursor: Cursor,
}

impl PresetBuilder {
    fn section(&mut self, heading: &str) -> Result<(), ParseError> {
        if let Some(phase) = layout::phase_for_heading(heading) {
            if self.entries.contains_key(&phase) {
                return Err(ParseError::DuplicatePhase(phase));
            }
            self.entries.insert(phase, BTreeMap::new());
            self.cursor = Cursor::Phase {
                phase,
                class: None,
                category: None,
            };
            Ok(())
        } else if layout::is_ignored_section(heading) {
            self.cursor = Cursor::Ignored;
            Ok(())
        } else {
            Err(ParseError::UnknownPhase(heading.to_string()))
        }
    }

    fn subsection(&mut self, heading: &str) -> Result<(), ParseError> {
        let Cursor::Phase {
            phase,
            class,
            category,
        } = &mut self.cursor
        else {
            return Ok(());
        };
        let found = layout::class_for_heading(heading).ok_or_else(|| ParseError::UnknownClass {
            phase: *phase,
            heading: heading.to_string(),
        })?;
        let classes = self.entries.entry(*phase).or_default();
        if classes.contains_key(&found) {
            return Err(ParseError::DuplicateClass {
                phase: *phase,
                class: found,
            });
        }
        classes.insert(found, Vec::new());
        *class = Some(found);
        *category = None;
        Ok(())
    }

    fn category(&mut self, heading: &str) -> Result<(), ParseError> {
        let Cursor::Phase {
            phase,
            class: Some(class),
            category,
        } = &mut self.cursor
        else {
            // phase introductions and skipped sections may use definition lists
            return Ok(());
        };
        let found =
            layout::category_for_heading(heading).ok_or_else(|| ParseError::UnknownCategory {
                phase: *phase,
                class: *class,
                heading: heading.to_string(),
            })?;
        *category = Some(found);
        Ok(())
    }

    const fn item_target(&self) -> Option<ItemTarget> {
        match self.cursor {
            Cursor::Phase {
                phase,
                class: Some(class),
                category,
            } => Some(ItemTarget {
                phase,
                class,
                category,
            }),
            _ => None,
        }
    }

    fn push(&mut self, item: ItemReference) {
        if let Cursor::Phase {
            phase,
            class: Some(class),
            ..
        } = self.cursor
        {
            self.entries
                .entry(phase)
                .or_default()
                .entry(class)
                .or_default()
                .push(item);
        }
    }

    fn finish(self) -> Result<Presets, ParseError> {
        for phase in Phase::ALL {
            let classes = self
                .entries
                .get(&phase)
                .ok_or(ParseError::MissingPhase(phase))?;
            for class in ClassRole::ALL {
                if !classes.contains_key(&class) {
                    return Err(ParseError::MissingClass { phase, class });
                }
            }
        }
        Ok(Presets::from_complete(self.entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://terraria.wiki.gg";

    /// Minimal valid page: every phase with every class, one Pre-Boss item.
    fn page_with(extra_in_pre_boss_melee: &str, trailer: &str) -> String {
        let mut page = String::from(r#"<div class="mw-parser-output">"#);
        for phase in Phase::ALL {
            page.push_str(&format!("<h2>{phase}</h2>"));
            for class in ["Ranged", "Magic", "Summoner", "Melee"] {
                page.push_str(&format!("<h3>{class}</h3>"));
                if phase == Phase::PreBoss && class == "Melee" {
                    page.push_str(extra_in_pre_boss_melee);
                }
            }
        }
        page.push_str(trailer);
        page.push_str("</div>");
        page
    }

    fn parse(page: &str) -> Result<Presets, ParseError> {
        PageParser::new(BASE).parse(page)
    }

    #[test]
    fn parses_minimal_page() {
        let page = page_with(
            r#"<dl><dt>Weapons</dt></dl><ul><li><a href="/wiki/Copper_Shortsword" title="Copper Shortsword">Copper Shortsword</a></li></ul>"#,
            "",
        );
        let presets = parse(&page).unwrap();
        let items = presets.items(Phase::PreBoss, ClassRole::Melee);
        assert_eq!(
            items,
            &[ItemReference {
                name: "Copper Shortsword".to_string(),
                url: "https://terraria.wiki.gg/wiki/Copper_Shortsword".to_string(),
                category: ItemCategory::Weapon,
            }]
        );
        assert!(presets.items(Phase::Endgame, ClassRole::Mage).is_empty());
        assert_eq!(presets.iter().count(), 20);
    }

    #[test]
    fn missing_anchor_fails() {
        let err = parse("<h2>Pre-Boss</h2>").unwrap_err();
        assert_eq!(err, ParseError::MissingAnchor(CONTENT_ANCHOR));
    }

    #[test]
    fn missing_phase_fails() {
        let page = page_with("", "").replace("<h2>Pre-Golem</h2>", "");
        // Pre-Golem classes now sit under Pre-Plantera and collide
        let err = parse(&page).unwrap_err();
        assert!(matches!(
            err,
            ParseError::DuplicateClass {
                phase: Phase::PrePlantera,
                ..
            }
        ));
    }

    #[test]
    fn missing_trailing_phase_fails() {
        let page = page_with("", "");
        let cut = page.find("<h2>Endgame</h2>").unwrap();
        let truncated = format!("{}</div>", &page[..cut]);
        assert_eq!(
            parse(&truncated).unwrap_err(),
            ParseError::MissingPhase(Phase::Endgame)
        );
    }

    #[test]
    fn missing_class_fails() {
        let page = page_with("", "").replacen("<h3>Summoner</h3>", "", 1);
        assert_eq!(
            parse(&page).unwrap_err(),
            ParseError::MissingClass {
                phase: Phase::PreBoss,
                class: ClassRole::Summoner,
            }
        );
    }

    #[test]
    fn duplicate_phase_fails() {
        let page = page_with("", "<h2>Endgame</h2>");
        assert_eq!(
            parse(&page).unwrap_err(),
            ParseError::DuplicatePhase(Phase::Endgame)
        );
    }

    #[test]
    fn unknown_phase_heading_fails() {
        let page = page_with("", "<h2>Post-Moon Lord</h2>");
        assert_eq!(
            parse(&page).unwrap_err(),
            ParseError::UnknownPhase("Post-Moon Lord".to_string())
        );
    }

    #[test]
    fn unknown_class_heading_fails() {
        let page = page_with("<h3>Throwing</h3>", "");
        assert!(matches!(
            parse(&page).unwrap_err(),
            ParseError::UnknownClass { phase: Phase::PreBoss, heading } if heading == "Throwing"
        ));
    }

    #[test]
    fn unknown_category_fails() {
        let page = page_with("<dl><dt>Mounts</dt></dl>", "");
        assert!(matches!(
            parse(&page).unwrap_err(),
            ParseError::UnknownCategory { class: ClassRole::Melee, heading, .. } if heading == "Mounts"
        ));
    }

    #[test]
    fn item_before_category_fails() {
        let page = page_with(r#"<ul><li><a href="/wiki/Zenith">Zenith</a></li></ul>"#, "");
        assert!(matches!(
            parse(&page).unwrap_err(),
            ParseError::ItemOutsideCategory { item, .. } if item == "Zenith"
        ));
    }

    #[test]
    fn ignored_sections_are_skipped() {
        let page = page_with(
            "",
            r#"<h2>See also</h2><h3>Anything</h3><dl><dt>Whatever</dt></dl><ul><li><a href="/wiki/Guide:Walkthrough">Walkthrough</a></li></ul>"#,
        );
        let presets = parse(&page).unwrap();
        assert_eq!(presets.total_items(), 0);
    }

    #[test]
    fn preamble_lists_are_skipped() {
        let page = page_with("", "").replacen(
            r#"<div class="mw-parser-output">"#,
            r#"<div class="mw-parser-output"><ul><li><a href="/wiki/Guide:Walkthrough">see</a></li></ul>"#,
            1,
        );
        assert_eq!(parse(&page).unwrap().total_items(), 0);
    }

    #[test]
    fn image_link_falls_back_to_title() {
        let page = page_with(
            r#"<h4>Accessories</h4><ul><li><a href="/wiki/File:Shackle.png" class="image"><img src="x"></a><a href="/wiki/Shackle" title="Shackle"><img src="y"></a></li></ul>"#,
            "",
        );
        let presets = parse(&page).unwrap();
        let items = presets.items(Phase::PreBoss, ClassRole::Melee);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Shackle");
        assert_eq!(items[0].url, "https://terraria.wiki.gg/wiki/Shackle");
        assert_eq!(items[0].category, ItemCategory::Accessory);
    }

    #[test]
    fn text_only_list_items_are_skipped() {
        let page = page_with(
            "<dl><dt>Buffs</dt></dl><ul><li>Any food</li><li><a href=\"/wiki/Ironskin_Potion\">Ironskin  Potion</a></li></ul>",
            "",
        );
        let presets = parse(&page).unwrap();
        let names: Vec<_> = presets
            .items(Phase::PreBoss, ClassRole::Melee)
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, ["Ironskin Potion"]);
    }

    #[test]
    fn unresolvable_link_fails() {
        let page = page_with(
            r#"<dl><dt>Weapons</dt></dl><ul><li><a href="javascript:void(0)">Zenith</a></li></ul>"#,
            "",
        );
        assert_eq!(
            parse(&page).unwrap_err(),
            ParseError::BadLink("javascript:void(0)".to_string())
        );
    }

    #[test]
    fn parse_is_deterministic() {
        let page = include_str!("../../tests/fixtures/class_setups.html");
        let parser = PageParser::new(BASE);
        let first = serde_json::to_string(&parser.parse(page).unwrap()).unwrap();
        let second = serde_json::to_string(&parser.parse(page).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
