//! HTML fragment editing on top of an HTML5 parser.
//!
//! Content is parsed the way a browser parses `innerHTML`, so every element
//! a browser would see is found here too (unquoted values, attributes with
//! no separating whitespace, mixed case, and so on). Edits are applied to
//! the parsed tree and the fragment is serialised back only when something
//! changed.

use html5ever::{Attribute, LocalName, Namespace, QualName};
use scraper::node::Element;
use scraper::{Html, Node};

/// Elements whose text content is never rewritten.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

fn is_raw_text_parent(parent: Option<&Node>) -> bool {
    parent
        .and_then(Node::as_element)
        .is_some_and(|e| RAW_TEXT_ELEMENTS.contains(&e.name()))
}

/// Owned copy of one element's attributes, edited and then written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementEdit {
    name: String,
    attributes: Vec<(String, String)>,
    changed: bool,
}

impl ElementEdit {
    fn from_element(element: &Element) -> Self {
        Self {
            name: element.name().to_string(),
            attributes: element.attrs().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            changed: false,
        }
    }

    fn into_element(self, name: QualName) -> Element {
        let attributes = self
            .attributes
            .into_iter()
            .map(|(name, value)| Attribute {
                name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                value: value.into(),
            })
            .collect();
        Element::new(name, attributes)
    }

    /// Lower-cased element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Decoded value of attribute `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace `name` in place, or append it. Setting the current value is a no-op.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            | Some((_, current)) if current == value => return,
            | Some((_, current)) => *current = value.to_string(),
            | None => self.attributes.push((name.to_ascii_lowercase(), value.to_string())),
        }
        self.changed = true;
    }

    /// Offer every attribute value to `rewrite`; a returned value replaces it.
    pub fn rewrite_values<F>(&mut self, mut rewrite: F)
    where
        F: FnMut(&str, &str) -> Option<String>,
    {
        for (name, value) in self.attributes.iter_mut() {
            if let Some(new_value) = rewrite(name, value) {
                if *value != new_value {
                    *value = new_value;
                    self.changed = true;
                }
            }
        }
    }
}

/// A parsed fragment.
#[derive(Debug, Clone)]
pub struct Fragment {
    html: Html,
    modified: bool,
}

impl Fragment {
    pub fn parse(input: &str) -> Self {
        Self {
            html: Html::parse_fragment(input),
            modified: false,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Elements named `name`, in document order.
    pub fn elements<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s Element> + 's {
        self.html
            .root_element()
            .descendants()
            .filter_map(|n| n.value().as_element())
            .filter(move |e| e.name() == name)
    }

    /// Decoded text nodes outside `<script>`/`<style>`, in document order.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.html
            .root_element()
            .descendants()
            .filter(|n| !is_raw_text_parent(n.parent().map(|p| p.value())))
            .filter_map(|n| n.value().as_text())
            .map(|t| &*t.text)
    }

    /// Decoded values of every attribute on every element.
    pub fn attribute_values(&self) -> impl Iterator<Item = &str> + '_ {
        self.html
            .root_element()
            .descendants()
            .filter_map(|n| n.value().as_element())
            .flat_map(|e| e.attrs().map(|(_, v)| v))
    }

    /// Edit each element named `name` in document order.
    pub fn edit_elements<F>(&mut self, name: &str, edit: F)
    where
        F: FnMut(&mut ElementEdit),
    {
        self.edit_matching(|e| e.name() == name, edit);
    }

    pub fn edit_all_elements<F>(&mut self, edit: F)
    where
        F: FnMut(&mut ElementEdit),
    {
        self.edit_matching(|_| true, edit);
    }

    fn edit_matching<P, F>(&mut self, matches: P, mut edit: F)
    where
        P: Fn(&Element) -> bool,
        F: FnMut(&mut ElementEdit),
    {
        let ids: Vec<_> = self
            .html
            .root_element()
            .descendants()
            .filter(|n| n.value().as_element().is_some_and(&matches))
            .map(|n| n.id())
            .collect();

        for id in ids {
            let Some(mut node) = self.html.tree.get_mut(id) else {
                continue;
            };
            let Node::Element(element) = node.value() else {
                continue;
            };
            let mut view = ElementEdit::from_element(element);
            edit(&mut view);
            if view.changed {
                let name = element.name.clone();
                *element = view.into_element(name);
                self.modified = true;
            }
        }
    }

    /// Offer each text node outside `<script>`/`<style>` to `rewrite`.
    pub fn rewrite_text<F>(&mut self, mut rewrite: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        let ids: Vec<_> = self
            .html
            .root_element()
            .descendants()
            .filter(|n| n.value().is_text() && !is_raw_text_parent(n.parent().map(|p| p.value())))
            .map(|n| n.id())
            .collect();

        for id in ids {
            let Some(mut node) = self.html.tree.get_mut(id) else {
                continue;
            };
            let Node::Text(text) = node.value() else {
                continue;
            };
            if let Some(replacement) = rewrite(&text.text) {
                text.text = replacement.into();
                self.modified = true;
            }
        }
    }

    pub fn to_html(&self) -> String {
        self.html.root_element().inner_html()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn srcs(fragment: &Fragment) -> Vec<Option<String>> {
        fragment.elements("img").map(|e| e.attr("src").map(str::to_string)).collect()
    }

    #[test]
    fn finds_images_a_browser_would_find() {
        let fragment = Fragment::parse(r#"<p>a</p><img src=data:image/png;base64,aGVsbG8=><IMG alt="x"src="b.png">"#);
        assert_eq!(
            srcs(&fragment),
            vec![Some("data:image/png;base64,aGVsbG8=".to_string()), Some("b.png".to_string())]
        );
    }

    #[test]
    fn comments_and_script_bodies_hold_no_elements() {
        let fragment = Fragment::parse(r#"<!-- <img src="x.png"> --><script>var s = "<img src='q'>";</script><img src="y.png">"#);
        assert_eq!(srcs(&fragment), vec![Some("y.png".to_string())]);
        assert!(fragment.texts().all(|t| !t.contains("img")));
    }

    #[test]
    fn reads_all_attribute_styles() {
        let fragment = Fragment::parse(r#"<input type=text value='a "b"' disabled data-x="1&amp;2">"#);
        let input = fragment.elements("input").next().unwrap();
        assert_eq!(input.attr("type"), Some("text"));
        assert_eq!(input.attr("value"), Some(r#"a "b""#));
        assert_eq!(input.attr("disabled"), Some(""));
        assert_eq!(input.attr("data-x"), Some("1&2"));
    }

    #[test]
    fn set_replaces_in_place_and_appends() {
        let mut fragment = Fragment::parse(r#"<p>x</p><img alt="pic" src="old.png" />"#);
        fragment.edit_elements("img", |img| {
            img.set("src", "https://cdn.example/a?x=1&y=2");
            img.set("data-image-id", "1");
        });
        assert!(fragment.is_modified());
        assert_eq!(
            fragment.to_html(),
            r#"<p>x</p><img alt="pic" src="https://cdn.example/a?x=1&amp;y=2" data-image-id="1">"#
        );
    }

    #[test]
    fn setting_same_value_changes_nothing() {
        let mut fragment = Fragment::parse(r#"<img src="a.png">"#);
        fragment.edit_elements("img", |img| {
            img.set("src", "a.png");
            assert!(!img.is_changed());
        });
        assert!(!fragment.is_modified());
    }

    #[test]
    fn text_is_decoded_and_re_escaped() {
        let mut fragment = Fragment::parse("<p>&#123;x&#125; &amp; y</p><style>p{}</style>");
        assert_eq!(fragment.texts().collect::<Vec<_>>(), vec!["{x} & y"]);

        fragment.rewrite_text(|t| Some(t.replace("{x}", "<b>")));
        assert_eq!(fragment.to_html(), "<p>&lt;b&gt; &amp; y</p><style>p{}</style>");
    }

    #[test]
    fn attribute_values_cover_every_element() {
        let fragment = Fragment::parse(r#"<a href="/x" title="t"><img src="s"></a>"#);
        let values: Vec<&str> = fragment.attribute_values().collect();
        assert_eq!(values, vec!["/x", "t", "s"]);
    }
}
