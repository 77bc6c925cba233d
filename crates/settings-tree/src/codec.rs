//! XML-like text form of a configuration tree
//!
//! Supports the subset settings files use: an optional declaration, comments,
//! a single root element, nested elements and text content. Attributes are
//! read and ignored. Rendering is deterministic so two trees can be compared
//! by their text.

use std::fmt::{self, Display, Formatter, Write as _};
use std::str::FromStr;

use crate::error::ParseError;
use crate::path::ConfigPath;
use crate::tree::{ConfigTree, NodeId};

/// Declaration emitted at the top of every rendered document
pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8" ?>"#;

const INDENT: &str = "    ";

/// Deepest element nesting accepted by the parser, root included
pub const MAX_DEPTH: usize = 256;

impl ConfigTree {
    /// Parse a document from its text form
    ///
    /// # Errors
    /// Returns error on malformed markup, mismatched tags, invalid element
    /// names or unknown entities
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Reader::new(text).read_document()
    }

    /// Render the canonical text form
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(64 * self.len());
        out.push_str(DECLARATION);
        out.push('\n');
        self.write_node(&mut out, self.root(), 0);
        out
    }

    fn write_node(&self, out: &mut String, id: NodeId, depth: usize) {
        let Some(node) = self.node(id) else {
            return;
        };
        let indent = INDENT.repeat(depth);
        let name = node.name();
        match (node.children().is_empty(), node.value()) {
            (true, None) => {
                let _ = writeln!(out, "{indent}<{name} />");
            }
            (true, Some(value)) => {
                let _ = writeln!(out, "{indent}<{name}>{}</{name}>", escape(value));
            }
            (false, value) => {
                let _ = writeln!(out, "{indent}<{name}>{}", escape(value.unwrap_or("")));
                for &child in node.children() {
                    self.write_node(out, child, depth + 1);
                }
                let _ = writeln!(out, "{indent}</{name}>");
            }
        }
    }
}

impl Display for ConfigTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for ConfigTree {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Cursor over the source text
struct Reader<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn eof(&self) -> ParseError {
        ParseError::UnexpectedEof { line: self.line }
    }

    fn advance(&mut self, bytes: usize) {
        let end = (self.pos + bytes).min(self.src.len());
        self.line += self.src[self.pos..end].matches('\n').count();
        self.pos = end;
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.advance(c.len_utf8());
        Some(c)
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(found) => Err(ParseError::UnexpectedChar {
                line: self.line,
                found,
            }),
            None => Err(self.eof()),
        }
    }

    /// Advance past the next occurrence of `terminator`
    fn skip_past(&mut self, terminator: &str) -> Result<(), ParseError> {
        match self.rest().find(terminator) {
            Some(offset) => {
                self.advance(offset + terminator.len());
                Ok(())
            }
            None => Err(self.eof()),
        }
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().len() - self.rest().trim_start().len();
        self.advance(trimmed);
    }

    /// Skip whitespace, declarations, comments and doctype
    fn skip_misc(&mut self) -> Result<(), ParseError> {
        loop {
            self.skip_whitespace();
            if self.starts_with("<?") {
                self.skip_past("?>")?;
            } else if self.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if self.starts_with("<!") {
                self.skip_past(">")?;
            } else {
                return Ok(());
            }
        }
    }

    fn read_document(mut self) -> Result<ConfigTree, ParseError> {
        self.skip_misc()?;
        if self.at_end() {
            return Err(ParseError::MissingRoot);
        }
        self.expect('<')?;
        let name = self.read_name()?;
        let mut tree = ConfigTree::new(name.clone());
        let root = tree.root();
        if self.read_tag_tail()? {
            self.read_content(&mut tree, root, &name, 1)?;
        }

        self.skip_misc()?;
        if !self.at_end() {
            return Err(ParseError::TrailingContent { line: self.line });
        }
        Ok(tree)
    }

    fn read_name(&mut self) -> Result<String, ParseError> {
        let len = self
            .rest()
            .find(|c: char| c.is_whitespace() || matches!(c, '/' | '>'))
            .ok_or_else(|| self.eof())?;
        let name = self.rest()[..len].to_string();
        if !ConfigPath::is_valid_name(&name) {
            return Err(ParseError::InvalidName {
                line: self.line,
                name,
            });
        }
        self.advance(len);
        Ok(name)
    }

    /// Consume attributes up to the end of a start tag
    ///
    /// Returns `true` if the element has content, `false` if self-closing.
    fn read_tag_tail(&mut self) -> Result<bool, ParseError> {
        let mut quote: Option<char> = None;
        loop {
            let c = self.bump().ok_or_else(|| self.eof())?;
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '>') => return Ok(true),
                (None, '/') => {
                    self.expect('>')?;
                    return Ok(false);
                }
                (None, _) => {}
            }
        }
    }

    fn read_content(
        &mut self,
        tree: &mut ConfigTree,
        id: NodeId,
        name: &str,
        depth: usize,
    ) -> Result<(), ParseError> {
        let mut text = String::new();
        loop {
            if self.at_end() {
                return Err(self.eof());
            }
            if self.starts_with("</") {
                self.advance(2);
                let closing = self.read_name()?;
                self.skip_whitespace();
                self.expect('>')?;
                if closing != name {
                    return Err(ParseError::MismatchedTag {
                        line: self.line,
                        expected: name.to_string(),
                        found: closing,
                    });
                }
                break;
            } else if self.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if self.starts_with("<![CDATA[") {
                self.advance("<![CDATA[".len());
                let end = self.rest().find("]]>").ok_or_else(|| self.eof())?;
                text.push_str(&self.rest()[..end]);
                self.advance(end + 3);
            } else if self.starts_with("<?") {
                self.skip_past("?>")?;
            } else if self.starts_with("<") {
                self.advance(1);
                let child_name = self.read_name()?;
                let child = tree
                    .append_child(id, &child_name)
                    .map_err(|_| ParseError::InvalidName {
                        line: self.line,
                        name: child_name.clone(),
                    })?;
                if depth >= MAX_DEPTH {
                    return Err(ParseError::TooDeep {
                        line: self.line,
                        limit: MAX_DEPTH,
                    });
                }
                if self.read_tag_tail()? {
                    self.read_content(tree, child, &child_name, depth + 1)?;
                }
            } else {
                let end = self.rest().find('<').unwrap_or(self.rest().len());
                let raw = &self.rest()[..end];
                text.push_str(&self.decode(raw)?);
                self.advance(end);
            }
        }

        // Leaf text is kept verbatim; container text loses its indentation.
        let value = if tree.children(id).is_empty() {
            Some(text.as_str())
        } else {
            Some(text.trim()).filter(|t| !t.is_empty())
        };
        if let Some(value) = value {
            // Cannot fail: `id` was created by this reader.
            let _ = tree.set_value(id, value);
        }
        Ok(())
    }

    fn decode(&self, raw: &str) -> Result<String, ParseError> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(start) = rest.find('&') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after.find(';').ok_or_else(|| ParseError::UnknownEntity {
                line: self.line,
                entity: after.chars().take(8).collect(),
            })?;
            let entity = &after[..end];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => decode_char_ref(entity),
            };
            match decoded {
                Some(c) => out.push(c),
                None => {
                    return Err(ParseError::UnknownEntity {
                        line: self.line,
                        entity: entity.to_string(),
                    })
                }
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn decode_char_ref(entity: &str) -> Option<char> {
    let body = entity.strip_prefix('#')?;
    let code = match body.strip_prefix('x').or_else(|| body.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => body.parse().ok()?,
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn path(s: &str) -> ConfigPath {
        s.parse().unwrap()
    }

    #[test]
    fn parse_leaf_values() {
        let tree = ConfigTree::parse(
            "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n\
             <config>\n    <value>2</value>\n    <name>hi there</name>\n</config>\n",
        )
        .unwrap();
        assert_eq!(tree.name(tree.root()), Some("config"));
        assert_eq!(tree.read_scalar(&path("value"), 0), 2);
        assert_eq!(tree.read_scalar(&path("name"), String::new()), "hi there");
    }

    #[test]
    fn parse_groups_keep_order() {
        let tree = ConfigTree::parse(
            "<config><values><value>2</value><value>3</value><value>4</value></values></config>",
        )
        .unwrap();
        let values: Vec<_> = tree
            .resolve(&path("values/value"))
            .into_iter()
            .map(|id| tree.value(id).unwrap().to_string())
            .collect();
        assert_eq!(values, vec!["2", "3", "4"]);
        assert_eq!(tree.value(tree.resolve_first(&path("values")).unwrap()), None);
    }

    #[test]
    fn render_is_indented_and_declared() {
        let mut tree = ConfigTree::new("config");
        tree.write_scalar(&path("sub/int"), 2).unwrap();
        tree.write_scalar(&path("version"), 1).unwrap();
        assert_eq!(
            tree.to_text(),
            "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n\
             <config>\n\
             \x20   <sub>\n\
             \x20       <int>2</int>\n\
             \x20   </sub>\n\
             \x20   <version>1</version>\n\
             </config>\n"
        );
    }

    #[test]
    fn render_empty_and_hollow_nodes() {
        let mut tree = ConfigTree::new("config");
        let root = tree.root();
        tree.append_child(root, "hollow").unwrap();
        let empty = tree.append_child(root, "empty").unwrap();
        tree.set_value(empty, "").unwrap();
        let text = tree.to_text();
        assert!(text.contains("    <hollow />\n"));
        assert!(text.contains("    <empty></empty>\n"));
        assert_eq!(ConfigTree::parse(&text).unwrap().to_text(), text);
    }

    #[test]
    fn text_is_escaped_and_decoded() {
        let mut tree = ConfigTree::new("config");
        tree.write_scalar(&path("filter"), "a < b && \"c\"").unwrap();
        let text = tree.to_text();
        assert!(text.contains("a &lt; b &amp;&amp; &quot;c&quot;"));
        let reparsed = ConfigTree::parse(&text).unwrap();
        assert_eq!(
            reparsed.read_scalar(&path("filter"), String::new()),
            "a < b && \"c\""
        );
    }

    #[test]
    fn numeric_char_refs_decode() {
        let tree = ConfigTree::parse("<config><c>&#65;&#x42;</c></config>").unwrap();
        assert_eq!(tree.read_scalar(&path("c"), String::new()), "AB");
    }

    #[test]
    fn comments_attributes_and_cdata() {
        let tree = ConfigTree::parse(
            "<!-- header --><config kind='app'><!-- note --><a x=\"1 > 0\">1</a>\
             <b><![CDATA[<raw>]]></b><c/></config>",
        )
        .unwrap();
        assert_eq!(tree.read_scalar(&path("a"), 0), 1);
        assert_eq!(tree.read_scalar(&path("b"), String::new()), "<raw>");
        let c = tree.resolve_first(&path("c")).unwrap();
        assert_eq!(tree.value(c), None);
    }

    #[test]
    fn mixed_content_round_trips() {
        let mut tree = ConfigTree::new("config");
        let group = tree.write_scalar(&path("group"), "label").unwrap();
        let child = tree.append_child(group, "item").unwrap();
        tree.set_value(child, "1").unwrap();
        let text = tree.to_text();
        assert_eq!(ConfigTree::parse(&text).unwrap().to_text(), text);
    }

    #[test]
    fn mismatched_tag_is_rejected() {
        let result = ConfigTree::parse("<config>\n<a>1</b>\n</config>");
        assert!(matches!(
            result,
            Err(ParseError::MismatchedTag { line: 2, .. })
        ));
    }

    #[test]
    fn truncated_document_is_rejected() {
        assert!(matches!(
            ConfigTree::parse("<config><a>1</a>"),
            Err(ParseError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn missing_root_and_trailing_content() {
        assert_eq!(
            ConfigTree::parse("<?xml version=\"1.0\"?>\n").unwrap_err(),
            ParseError::MissingRoot
        );
        assert!(matches!(
            ConfigTree::parse("<config /><other />"),
            Err(ParseError::TrailingContent { .. })
        ));
    }

    #[test]
    fn unknown_entity_is_rejected() {
        assert!(matches!(
            ConfigTree::parse("<config><a>&nbsp;</a></config>"),
            Err(ParseError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn leaf_whitespace_survives_round_trip() {
        let mut tree = ConfigTree::new("config");
        tree.write_scalar(&path("p"), " padded ").unwrap();
        tree.write_scalar(&path("n"), " 2 ").unwrap();

        let reparsed = ConfigTree::parse(&tree.to_text()).unwrap();
        assert_eq!(reparsed.read_scalar(&path("p"), String::new()), " padded ");
        assert_eq!(reparsed.read_scalar(&path("n"), 0), 2);
        assert_eq!(reparsed, tree);
    }

    #[test]
    fn container_indentation_is_not_a_value() {
        let tree = ConfigTree::parse(
            "<config>\n    <group>\n        <item> x </item>\n    </group>\n</config>\n",
        )
        .unwrap();
        let group = tree.resolve_first(&path("group")).unwrap();
        assert_eq!(tree.value(group), None);
        assert_eq!(tree.value(tree.root()), None);
        assert_eq!(tree.read_scalar(&path("group/item"), String::new()), " x ");
    }

    fn nested(depth: usize) -> String {
        let mut text = String::new();
        for _ in 0..depth {
            text.push_str("<n>");
        }
        for _ in 0..depth {
            text.push_str("</n>");
        }
        text
    }

    #[test]
    fn nesting_up_to_limit_is_accepted() {
        let tree = ConfigTree::parse(&nested(MAX_DEPTH)).unwrap();
        assert_eq!(tree.len(), MAX_DEPTH);
    }

    #[test]
    fn nesting_beyond_limit_is_rejected() {
        assert_eq!(
            ConfigTree::parse(&nested(MAX_DEPTH + 1)).unwrap_err(),
            ParseError::TooDeep {
                line: 1,
                limit: MAX_DEPTH,
            }
        );
        assert!(matches!(
            ConfigTree::parse(&nested(100_000)),
            Err(ParseError::TooDeep { .. })
        ));
    }

    #[test]
    fn display_and_from_str_agree() {
        let text = "<config><value>2</value></config>";
        let tree: ConfigTree = text.parse().unwrap();
        assert_eq!(tree.to_string(), tree.to_text());
    }
}
